//! Search for node combinations whose reach sets cover a share of the
//! entity population.
//!
//! [`SetCoverSearcher::greedy`] builds one cover step by step;
//! [`SetCoverSearcher::exhaustive`] enumerates every small combination and
//! keeps the most general qualifying ones.

mod exhaustive;
mod greedy;

use std::{collections::BTreeSet, sync::Arc};

use crate::{
    Result,
    builder::{DEFAULT_PARALLEL_THRESHOLD, ExecutionStrategy},
    error::HasseError,
    poset::NodeId,
    reach::ReachabilityIndex,
};

pub use exhaustive::{ExhaustiveCover, ExhaustiveSearch};
pub use greedy::{GreedyCover, GreedyStep};

/// Required coverage: `floor(universe · fraction)` entities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageTarget {
    universe: usize,
    fraction: f64,
}

impl CoverageTarget {
    /// Creates a target over `universe` entities.
    ///
    /// # Errors
    /// Returns [`HasseError::InvalidCoverageFraction`] unless
    /// `0 ≤ fraction ≤ 1`.
    ///
    /// # Examples
    /// ```
    /// use hasse_core::CoverageTarget;
    ///
    /// let target = CoverageTarget::new(10, 0.8)?;
    /// assert_eq!(target.min_required(), 8);
    /// assert!(CoverageTarget::new(10, 1.5).is_err());
    /// # Ok::<(), hasse_core::HasseError>(())
    /// ```
    pub fn new(universe: usize, fraction: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(HasseError::InvalidCoverageFraction { got: fraction });
        }
        Ok(Self { universe, fraction })
    }

    /// Target over every entity attached to `index`.
    ///
    /// # Errors
    /// Same as [`CoverageTarget::new`].
    pub fn for_index(index: &ReachabilityIndex, fraction: f64) -> Result<Self> {
        Self::new(index.entity_count(), fraction)
    }

    /// Population size.
    #[rustfmt::skip]
    #[must_use]
    pub fn universe(&self) -> usize { self.universe }

    /// Requested share of the population.
    #[rustfmt::skip]
    #[must_use]
    pub fn fraction(&self) -> f64 { self.fraction }

    /// Smallest covered count that satisfies the target.
    #[must_use]
    pub fn min_required(&self) -> usize {
        let required = (usize_to_f64(self.universe) * self.fraction).floor();
        f64_to_usize(required).min(self.universe)
    }

    /// Share of the population that `covered` entities represent.
    #[must_use]
    pub fn share(&self, covered: usize) -> f64 {
        if self.universe == 0 {
            return 0.0;
        }
        usize_to_f64(covered) / usize_to_f64(self.universe)
    }
}

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverStatus {
    /// The target was met.
    Satisfied,
    /// Greedy search ran out of nodes that add coverage before the target.
    Exhausted,
    /// No enumerated combination met the target.
    NoQualifyingCombo,
}

impl CoverStatus {
    /// Stable machine-readable representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Satisfied => "SATISFIED",
            Self::Exhausted => "TARGET_NOT_REACHED",
            Self::NoQualifyingCombo => "NO_QUALIFYING_COMBO",
        }
    }
}

/// A set of nodes and the number of entities their reach sets cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageCombo {
    nodes: Vec<NodeId>,
    covered: usize,
}

impl CoverageCombo {
    pub(crate) fn new(mut nodes: Vec<NodeId>, covered: usize) -> Self {
        nodes.sort_unstable();
        nodes.dedup();
        Self { nodes, covered }
    }

    /// Member nodes, ascending.
    #[rustfmt::skip]
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] { &self.nodes }

    /// Number of distinct entities covered by the union of reach sets.
    #[rustfmt::skip]
    #[must_use]
    pub fn covered(&self) -> usize { self.covered }

    /// Whether no member reaches another member.
    #[must_use]
    pub fn is_antichain(&self, index: &ReachabilityIndex) -> bool {
        self.nodes.iter().all(|&a| {
            self.nodes
                .iter()
                .all(|&b| a == b || !index.reaches(a, b))
        })
    }

    /// Whether every member of `self` reaches some member of `other`.
    pub(crate) fn generalizes(&self, other: &Self, index: &ReachabilityIndex) -> bool {
        self.nodes
            .iter()
            .all(|&a| other.nodes.iter().any(|&b| index.reaches(a, b)))
    }

    pub(crate) fn is_proper_subset_of(&self, other: &Self) -> bool {
        self.nodes.len() < other.nodes.len()
            && self
                .nodes
                .iter()
                .all(|node| other.nodes.binary_search(node).is_ok())
    }
}

/// Greedy and exhaustive cover search over one reachability index.
///
/// # Examples
/// ```
/// use hasse_core::{CoverStatus, CoverageTarget, ReachabilityIndex, SetCoverSearcher};
/// # use hasse_core::{CoverageRule, MatrixFamily, PosetGraph, RelationMatrix};
/// # let m = |v: u32| RelationMatrix::from_rows(&[[0, v], [0, 0]]);
/// # let graph = PosetGraph::from_edges(vec![m(1)?, m(0)?], &[(0, 1)])?;
/// # let entities = MatrixFamily::try_new("e", vec![m(1)?, m(0)?, m(0)?])?;
/// # let index = ReachabilityIndex::with_entities(&graph, &entities, CoverageRule::Descendants)?;
///
/// let target = CoverageTarget::for_index(&index, 1.0)?;
/// let cover = SetCoverSearcher::new(target).greedy(&index)?;
/// assert_eq!(cover.status(), CoverStatus::Satisfied);
/// assert_eq!(cover.steps().len(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct SetCoverSearcher {
    target: CoverageTarget,
    excluded: BTreeSet<NodeId>,
    strategy: ExecutionStrategy,
    parallel_threshold: usize,
}

impl SetCoverSearcher {
    /// Creates a searcher for `target` over every node.
    #[must_use]
    pub fn new(target: CoverageTarget) -> Self {
        Self {
            target,
            excluded: BTreeSet::new(),
            strategy: ExecutionStrategy::Auto,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Removes `nodes` from the candidate pool, typically universal nodes
    /// that would trivially cover everything.
    #[must_use]
    pub fn with_excluded<I: IntoIterator<Item = NodeId>>(mut self, nodes: I) -> Self {
        self.excluded.extend(nodes);
        self
    }

    /// Sets the strategy used for candidate evaluation.
    #[must_use]
    pub fn with_execution_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Overrides the workload size at which `Auto` switches to the pool.
    #[must_use]
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// The coverage target.
    #[rustfmt::skip]
    #[must_use]
    pub fn target(&self) -> CoverageTarget { self.target }

    /// Candidate nodes in ascending order.
    #[must_use]
    pub fn candidates(&self, index: &ReachabilityIndex) -> Vec<NodeId> {
        (0..index.node_count())
            .map(NodeId::new)
            .filter(|node| !self.excluded.contains(node))
            .collect()
    }

    fn check_universe(&self, index: &ReachabilityIndex) -> Result<()> {
        if self.target.universe < index.entity_count() {
            return Err(HasseError::InvalidParameter {
                name: "universe",
                reason: Arc::from(format!(
                    "universe of {} is smaller than the {} attached entities",
                    self.target.universe,
                    index.entity_count()
                )),
            });
        }
        Ok(())
    }
}

fn usize_to_f64(value: usize) -> f64 {
    value as f64
}

/// Saturating conversion of a non-negative whole number.
fn f64_to_usize(value: f64) -> usize {
    value as usize
}
