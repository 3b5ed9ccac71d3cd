//! Shared test utilities for `hasse-core`.

use hasse_test_support::ci::property_test_profile::ProptestRunProfile;
use proptest::test_runner::Config as ProptestConfig;

use crate::{MatrixFamily, PosetGraph, PosetGraphBuilder, RelationMatrix, TransitiveReducer};

/// Builds a standard proptest configuration from the shared CI profile.
///
/// This keeps property suites aligned on the same `PROGTEST_CASES` and
/// `HASSE_PBT_FORK` interpretation.
#[must_use]
pub(crate) fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    let profile = ProptestRunProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}

/// Builds a 3x3 matrix with ones at the listed `(row, col)` cells.
pub(crate) fn relation(pairs: &[(usize, usize)]) -> RelationMatrix {
    RelationMatrix::from_fn(3, |row, col| u32::from(pairs.contains(&(row, col))))
        .expect("order 3 is positive")
}

/// Wraps `matrices` in a named family.
pub(crate) fn family(name: &str, matrices: Vec<RelationMatrix>) -> MatrixFamily {
    MatrixFamily::try_new(name, matrices).expect("test matrices share an order")
}

/// Four matrices where 2 dominates 1 dominates 0 and 3 is incomparable to
/// all of them.
pub(crate) fn chain_with_outlier() -> MatrixFamily {
    family(
        "chain",
        vec![
            relation(&[(0, 1)]),
            relation(&[(0, 1), (0, 2)]),
            relation(&[(0, 1), (0, 2), (1, 2)]),
            relation(&[(1, 0), (2, 0)]),
        ],
    )
}

/// Builds and reduces the dominance graph of `source`.
pub(crate) fn reduced(source: &MatrixFamily) -> PosetGraph {
    let graph = PosetGraphBuilder::new()
        .build(source)
        .expect("test family builds");
    TransitiveReducer::new()
        .reduce(&graph)
        .expect("dominance graphs are acyclic")
}
