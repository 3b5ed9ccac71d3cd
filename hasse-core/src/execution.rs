//! Resolved execution mode shared by the pairwise kernels.
//!
//! Every kernel maps an index range to per-index results and collects them
//! in index order, so the parallel and sequential paths produce identical
//! output.

use std::ops::Range;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{builder::ExecutionStrategy, error::HasseError};

/// Concrete mode picked for one workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Parallelism {
    Sequential,
    #[cfg(feature = "parallel")]
    Parallel,
}

impl Parallelism {
    /// Resolves `strategy` for a workload of `items` independent rows.
    pub(crate) fn resolve(
        strategy: ExecutionStrategy,
        items: usize,
        threshold: usize,
    ) -> Result<Self, HasseError> {
        match strategy {
            ExecutionStrategy::Sequential => Ok(Self::Sequential),
            #[cfg(feature = "parallel")]
            ExecutionStrategy::Parallel => Ok(Self::Parallel),
            #[cfg(not(feature = "parallel"))]
            ExecutionStrategy::Parallel => Err(HasseError::BackendUnavailable {
                requested: ExecutionStrategy::Parallel,
            }),
            ExecutionStrategy::Auto => Ok(Self::auto(items, threshold)),
        }
    }

    /// Resolves [`ExecutionStrategy::Auto`], which never fails.
    pub(crate) fn auto(items: usize, threshold: usize) -> Self {
        #[cfg(feature = "parallel")]
        if items >= threshold {
            return Self::Parallel;
        }
        let _ = (items, threshold);
        Self::Sequential
    }

    /// Evaluates `job` for every index in `range`, preserving index order.
    pub(crate) fn map<T, F>(self, range: Range<usize>, job: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        match self {
            Self::Sequential => range.map(job).collect(),
            #[cfg(feature = "parallel")]
            Self::Parallel => range.into_par_iter().map(job).collect(),
        }
    }

    /// Stable label for span fields.
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            #[cfg(feature = "parallel")]
            Self::Parallel => "parallel",
        }
    }
}
