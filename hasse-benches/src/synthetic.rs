//! Seeded synthetic matrix families.
//!
//! Cells are drawn uniformly from `0..=max_cell`, so a small `max_cell`
//! yields dense dominance relations and a large one yields mostly
//! incomparable matrices.

use hasse_core::{DataSourceError, MatrixError, MatrixFamily, RelationMatrix};
use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Errors that may occur during synthetic family generation.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum SyntheticError {
    /// The requested matrix count was zero.
    #[error("matrix count must be greater than zero")]
    ZeroMatrices,
    /// The requested matrix order was zero.
    #[error("matrix order must be greater than zero")]
    ZeroOrder,
    /// A generated matrix was rejected.
    #[error("generated matrix was rejected: {0}")]
    Matrix(#[from] MatrixError),
    /// The generated matrices did not form a family.
    #[error("generated family was rejected: {0}")]
    Family(#[from] DataSourceError),
}

/// Configuration for synthetic family generation.
#[derive(Clone, Copy, Debug)]
pub struct SyntheticConfig {
    /// Number of matrices to generate.
    pub matrix_count: usize,
    /// Order of every matrix.
    pub order: usize,
    /// Largest cell value.
    pub max_cell: u32,
    /// RNG seed for reproducibility.
    pub seed: u64,
}

impl SyntheticConfig {
    /// Generates the family eagerly.
    ///
    /// # Errors
    ///
    /// Returns [`SyntheticError::ZeroMatrices`] if `matrix_count` is zero, or
    /// [`SyntheticError::ZeroOrder`] if `order` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use hasse_benches::synthetic::SyntheticConfig;
    /// use hasse_core::MatrixSource;
    ///
    /// let config = SyntheticConfig { matrix_count: 10, order: 3, max_cell: 2, seed: 42 };
    /// let family = config.generate().expect("valid config");
    /// assert_eq!(family.len(), 10);
    /// ```
    pub fn generate(&self) -> Result<MatrixFamily, SyntheticError> {
        if self.matrix_count == 0 {
            return Err(SyntheticError::ZeroMatrices);
        }
        if self.order == 0 {
            return Err(SyntheticError::ZeroOrder);
        }

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let matrices = (0..self.matrix_count)
            .map(|_| RelationMatrix::from_fn(self.order, |_, _| rng.gen_range(0..=self.max_cell)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MatrixFamily::try_new(
            format!("synthetic-{}x{}", self.matrix_count, self.order),
            matrices,
        )?)
    }
}
