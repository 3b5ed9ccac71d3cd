//! Benchmark parameter types.
//!
//! Each struct doubles as a Criterion parameter label through its
//! [`fmt::Display`] implementation.

use std::fmt;

/// Shape of the synthetic family fed to a poset benchmark.
#[derive(Clone, Copy, Debug)]
pub struct PosetBenchParams {
    /// Number of matrices in the family.
    pub matrix_count: usize,
    /// Order of every matrix.
    pub order: usize,
}

impl fmt::Display for PosetBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n={},order={}", self.matrix_count, self.order)
    }
}

/// Parameters for a cover search run.
#[derive(Clone, Copy, Debug)]
pub struct CoverBenchParams {
    /// Number of matrices in the family.
    pub matrix_count: usize,
    /// Share of entities the cover must reach.
    pub fraction: f64,
}

impl fmt::Display for CoverBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n={},fraction={}", self.matrix_count, self.fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PosetBenchParams { matrix_count: 64, order: 3 }.to_string(), "n=64,order=3")]
    #[case(CoverBenchParams { matrix_count: 32, fraction: 0.85 }.to_string(), "n=32,fraction=0.85")]
    fn labels_name_every_parameter(#[case] label: String, #[case] expected: &str) {
        assert_eq!(label, expected);
    }
}
