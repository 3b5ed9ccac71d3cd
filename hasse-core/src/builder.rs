//! Builder utilities for configuring [`Hasse`] pipelines.
//!
//! Exposes the execution strategy selection surface and the validation
//! performed before constructing [`Hasse`] instances.

use std::num::NonZeroUsize;

use crate::{Result, error::HasseError, hasse::Hasse, reach::CoverageRule};

/// Default number of independent rows above which [`ExecutionStrategy::Auto`]
/// switches to the thread pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 64;

/// Indicates how the pairwise kernels (dominance checks, shortest-path
/// sweeps, bridge evaluation, combination qualification) are scheduled.
///
/// `Auto` uses the rayon pool when the `parallel` feature is compiled in and
/// the workload is large enough, and runs sequentially otherwise. Results do
/// not depend on the mode.
///
/// # Examples
/// ```
/// use hasse_core::ExecutionStrategy;
///
/// let strategy = ExecutionStrategy::default();
/// assert_eq!(strategy, ExecutionStrategy::Auto);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ExecutionStrategy {
    /// Allow the library to pick a mode per workload.
    #[default]
    Auto,
    /// Run every kernel on the calling thread.
    Sequential,
    /// Always use the rayon pool. Requires the `parallel` feature.
    Parallel,
}

/// Configures and constructs [`Hasse`] instances.
///
/// # Examples
/// ```
/// use hasse_core::{CoverageRule, ExecutionStrategy, HasseBuilder};
///
/// let hasse = HasseBuilder::new()
///     .with_execution_strategy(ExecutionStrategy::Sequential)
///     .with_iteration_cap(Some(80))
///     .with_coverage_rule(CoverageRule::Ancestors)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(hasse.iteration_cap().map(|cap| cap.get()), Some(80));
/// assert_eq!(hasse.execution_strategy(), ExecutionStrategy::Sequential);
/// ```
#[derive(Debug, Clone)]
pub struct HasseBuilder {
    execution_strategy: ExecutionStrategy,
    iteration_cap: Option<usize>,
    coverage_rule: CoverageRule,
    parallel_threshold: usize,
}

impl Default for HasseBuilder {
    fn default() -> Self {
        Self {
            execution_strategy: ExecutionStrategy::Auto,
            iteration_cap: None,
            coverage_rule: CoverageRule::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl HasseBuilder {
    /// Creates a builder populated with default parameters.
    ///
    /// # Examples
    /// ```
    /// use hasse_core::{ExecutionStrategy, HasseBuilder};
    ///
    /// let builder = HasseBuilder::new();
    /// assert_eq!(builder.execution_strategy(), ExecutionStrategy::Auto);
    /// assert_eq!(builder.iteration_cap(), None);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the execution strategy used by every stage.
    #[must_use]
    pub fn with_execution_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.execution_strategy = strategy;
        self
    }

    /// Returns the currently configured execution strategy.
    #[rustfmt::skip]
    #[must_use]
    pub fn execution_strategy(&self) -> ExecutionStrategy { self.execution_strategy }

    /// Caps the number of merges performed by graph-distance clustering.
    ///
    /// `None` (the default) lets clustering run until one cluster remains or
    /// no pair can merge; a run over `k` entities then performs at most
    /// `k - 1` merges.
    #[must_use]
    pub fn with_iteration_cap(mut self, cap: Option<usize>) -> Self {
        self.iteration_cap = cap;
        self
    }

    /// Returns the configured iteration cap.
    #[rustfmt::skip]
    #[must_use]
    pub fn iteration_cap(&self) -> Option<usize> { self.iteration_cap }

    /// Chooses how entity coverage propagates through the graph.
    #[must_use]
    pub fn with_coverage_rule(mut self, rule: CoverageRule) -> Self {
        self.coverage_rule = rule;
        self
    }

    /// Returns the configured coverage rule.
    #[rustfmt::skip]
    #[must_use]
    pub fn coverage_rule(&self) -> CoverageRule { self.coverage_rule }

    /// Overrides the workload size at which `Auto` switches to the pool.
    #[must_use]
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Validates the configuration and constructs a [`Hasse`] instance.
    ///
    /// # Errors
    /// Returns [`HasseError::ZeroIterationCap`] when the iteration cap is
    /// `Some(0)` and [`HasseError::BackendUnavailable`] when
    /// [`ExecutionStrategy::Parallel`] is requested without the `parallel`
    /// feature.
    ///
    /// # Examples
    /// ```
    /// use hasse_core::{HasseBuilder, HasseError};
    ///
    /// let err = HasseBuilder::new()
    ///     .with_iteration_cap(Some(0))
    ///     .build()
    ///     .expect_err("a zero cap forbids every merge");
    /// assert!(matches!(err, HasseError::ZeroIterationCap));
    /// ```
    pub fn build(self) -> Result<Hasse> {
        let iteration_cap = match self.iteration_cap {
            None => None,
            Some(cap) => Some(NonZeroUsize::new(cap).ok_or(HasseError::ZeroIterationCap)?),
        };
        if cfg!(not(feature = "parallel"))
            && self.execution_strategy == ExecutionStrategy::Parallel
        {
            return Err(HasseError::BackendUnavailable {
                requested: ExecutionStrategy::Parallel,
            });
        }
        Ok(Hasse::new(
            self.execution_strategy,
            iteration_cap,
            self.coverage_rule,
            self.parallel_threshold,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::unbounded(None, None)]
    #[case::capped(Some(80), Some(80))]
    fn build_accepts_valid_caps(#[case] cap: Option<usize>, #[case] expected: Option<usize>) {
        let hasse = HasseBuilder::new()
            .with_iteration_cap(cap)
            .build()
            .expect("cap is valid");
        assert_eq!(hasse.iteration_cap().map(NonZeroUsize::get), expected);
    }

    #[test]
    fn build_rejects_zero_cap_with_stable_code() {
        let err = HasseBuilder::new()
            .with_iteration_cap(Some(0))
            .build()
            .expect_err("zero cap is invalid");
        assert_eq!(err.code().as_str(), "HASSE_ZERO_ITERATION_CAP");
    }

    #[test]
    fn builder_carries_coverage_rule() {
        let hasse = HasseBuilder::new()
            .with_coverage_rule(CoverageRule::Ancestors)
            .build()
            .expect("defaults are valid");
        assert_eq!(hasse.coverage_rule(), CoverageRule::Ancestors);
    }
}
