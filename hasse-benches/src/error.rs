//! Benchmark setup error type.
//!
//! Aggregates the failures that may arise while preparing benchmark inputs so
//! setup functions can propagate them with `?` instead of using `.expect()`.

use crate::synthetic::SyntheticError;
use hasse_core::{DataSourceError, HasseError};

/// Errors that may occur during benchmark setup.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Synthetic family generation failed.
    #[error("synthetic family generation failed: {0}")]
    Synthetic(#[from] SyntheticError),
    /// Building, reducing or analysing the poset failed.
    #[error("hasse operation failed: {0}")]
    Core(#[from] HasseError),
    /// Reading the generated family failed.
    #[error("data source error: {0}")]
    DataSource(#[from] DataSourceError),
    /// A zero value was passed where a non-zero integer was required.
    #[error("expected a non-zero value for {context}")]
    ZeroValue {
        /// A description of the parameter that was unexpectedly zero.
        context: &'static str,
    },
}
