//! End-to-end orchestration for the hasse library.
//!
//! Provides the [`Hasse`] entry point, which chains poset construction,
//! transitive reduction and reachability indexing, then runs clustering or
//! cover search on the result with one shared configuration.

use std::num::NonZeroUsize;

use tracing::{info, instrument};

use crate::{
    Result,
    builder::ExecutionStrategy,
    cluster::{GraphClustering, GraphDistanceClusterer},
    cover::{CoverageTarget, ExhaustiveCover, ExhaustiveSearch, GreedyCover, SetCoverSearcher},
    datasource::MatrixSource,
    execution::Parallelism,
    poset::{GraphView, NodeId, PosetGraph, PosetGraphBuilder, ShortestPaths, TransitiveReducer},
    reach::{CoverageRule, ReachabilityIndex},
};

/// Entry point for running the analysis pipeline.
///
/// # Examples
/// ```
/// use hasse_core::{ClusteringStatus, HasseBuilder, MatrixFamily, RelationMatrix};
///
/// let m = |v: u32| RelationMatrix::from_rows(&[[0, v], [0, 0]]);
/// let universe = MatrixFamily::try_new("universe", vec![m(0)?, m(1)?, m(2)?])?;
/// let entities = MatrixFamily::try_new("episodes", vec![m(2)?, m(1)?])?;
///
/// let hasse = HasseBuilder::new().build()?;
/// let analysis = hasse.analyze_with_entities(&universe, &entities)?;
/// assert_eq!(analysis.reduced().edge_count(), 2);
///
/// let clustering = hasse.cluster(&analysis, None)?;
/// assert_eq!(clustering.status(), ClusteringStatus::Complete);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Hasse {
    execution_strategy: ExecutionStrategy,
    iteration_cap: Option<NonZeroUsize>,
    coverage_rule: CoverageRule,
    parallel_threshold: usize,
}

impl Hasse {
    pub(crate) fn new(
        execution_strategy: ExecutionStrategy,
        iteration_cap: Option<NonZeroUsize>,
        coverage_rule: CoverageRule,
        parallel_threshold: usize,
    ) -> Self {
        Self {
            execution_strategy,
            iteration_cap,
            coverage_rule,
            parallel_threshold,
        }
    }

    /// Returns the execution strategy used by every stage.
    #[must_use]
    pub fn execution_strategy(&self) -> ExecutionStrategy {
        self.execution_strategy
    }

    /// Returns the merge cap applied by [`Self::cluster`].
    #[must_use]
    pub fn iteration_cap(&self) -> Option<NonZeroUsize> {
        self.iteration_cap
    }

    /// Returns the rule used to attach entities to nodes.
    #[must_use]
    pub fn coverage_rule(&self) -> CoverageRule {
        self.coverage_rule
    }

    /// Workload size at which `Auto` switches to the thread pool.
    #[must_use]
    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    /// Builds and reduces the poset of `universe` without entities.
    ///
    /// # Errors
    /// Propagates [`PosetGraphBuilder::build`] and
    /// [`TransitiveReducer::reduce`] errors, and
    /// [`crate::HasseError::BackendUnavailable`] for an unsupported strategy.
    pub fn analyze<U: MatrixSource + ?Sized>(&self, universe: &U) -> Result<PosetAnalysis> {
        let (dominance, reduced) = self.reduce(universe)?;
        let parallelism = self.parallelism(reduced.node_count())?;
        let index = ReachabilityIndex::closed_over(&reduced, parallelism);
        Ok(PosetAnalysis {
            dominance,
            reduced,
            index,
            parallelism,
        })
    }

    /// Builds and reduces the poset of `universe`, then attaches every
    /// matrix of `entities` to its equal node.
    ///
    /// # Errors
    /// Propagates construction and reduction errors plus
    /// [`ReachabilityIndex::with_entities`] errors, notably
    /// [`crate::HasseError::UnmatchedEntity`].
    #[instrument(
        name = "core.analyze",
        err,
        skip(self, universe, entities),
        fields(universe = %universe.name(), entities = %entities.name()),
    )]
    pub fn analyze_with_entities<U, E>(&self, universe: &U, entities: &E) -> Result<PosetAnalysis>
    where
        U: MatrixSource + ?Sized,
        E: MatrixSource + ?Sized,
    {
        let (dominance, reduced) = self.reduce(universe)?;
        let parallelism = self.parallelism(reduced.node_count())?;
        let index =
            ReachabilityIndex::attach(&reduced, entities, self.coverage_rule, parallelism)?;
        info!(
            nodes = reduced.node_count(),
            dominance_edges = dominance.edge_count(),
            reduced_edges = reduced.edge_count(),
            entities = index.entity_count(),
            "poset analysis ready"
        );
        Ok(PosetAnalysis {
            dominance,
            reduced,
            index,
            parallelism,
        })
    }

    fn parallelism(&self, nodes: usize) -> Result<Parallelism> {
        Parallelism::resolve(self.execution_strategy, nodes, self.parallel_threshold)
    }

    fn reduce<U: MatrixSource + ?Sized>(&self, universe: &U) -> Result<(PosetGraph, PosetGraph)> {
        let dominance = PosetGraphBuilder::new()
            .with_execution_strategy(self.execution_strategy)
            .with_parallel_threshold(self.parallel_threshold)
            .build(universe)?;
        let reduced = TransitiveReducer::new()
            .with_execution_strategy(self.execution_strategy)
            .with_parallel_threshold(self.parallel_threshold)
            .reduce(&dominance)?;
        Ok((dominance, reduced))
    }

    /// Clusters the attached entities. Without `paths`, directed shortest
    /// paths over the reduced graph are computed first.
    ///
    /// # Errors
    /// Propagates [`GraphDistanceClusterer::cluster`] errors.
    pub fn cluster(
        &self,
        analysis: &PosetAnalysis,
        paths: Option<&ShortestPaths>,
    ) -> Result<GraphClustering> {
        let computed;
        let paths = match paths {
            Some(paths) => paths,
            None => {
                computed = analysis.shortest_paths(GraphView::Directed);
                &computed
            }
        };
        GraphDistanceClusterer::new()
            .with_iteration_cap(self.iteration_cap)
            .with_execution_strategy(self.execution_strategy)
            .with_parallel_threshold(self.parallel_threshold)
            .cluster(&analysis.index, paths)
    }

    fn searcher(
        &self,
        analysis: &PosetAnalysis,
        fraction: f64,
        excluded: &[NodeId],
    ) -> Result<SetCoverSearcher> {
        let target = CoverageTarget::for_index(&analysis.index, fraction)?;
        Ok(SetCoverSearcher::new(target)
            .with_excluded(excluded.iter().copied())
            .with_execution_strategy(self.execution_strategy)
            .with_parallel_threshold(self.parallel_threshold))
    }

    /// Greedy cover of `fraction` of the attached entities, skipping
    /// `excluded` nodes.
    ///
    /// # Errors
    /// Returns [`crate::HasseError::InvalidCoverageFraction`] for a fraction
    /// outside `[0, 1]` and propagates [`SetCoverSearcher::greedy`] errors.
    pub fn greedy_cover(
        &self,
        analysis: &PosetAnalysis,
        fraction: f64,
        excluded: &[NodeId],
    ) -> Result<GreedyCover> {
        self.searcher(analysis, fraction, excluded)?
            .greedy(&analysis.index)
    }

    /// Exhaustive cover of `fraction` of the attached entities, skipping
    /// `excluded` nodes.
    ///
    /// # Errors
    /// Returns [`crate::HasseError::InvalidCoverageFraction`] for a fraction
    /// outside `[0, 1]` and propagates [`SetCoverSearcher::exhaustive`]
    /// errors.
    pub fn exhaustive_cover(
        &self,
        analysis: &PosetAnalysis,
        fraction: f64,
        excluded: &[NodeId],
        search: &ExhaustiveSearch,
    ) -> Result<ExhaustiveCover> {
        self.searcher(analysis, fraction, excluded)?
            .exhaustive(&analysis.index, search)
    }
}

/// Dominance graph, its Hasse diagram and the reachability index over it.
#[derive(Debug, Clone)]
pub struct PosetAnalysis {
    dominance: PosetGraph,
    reduced: PosetGraph,
    index: ReachabilityIndex,
    parallelism: Parallelism,
}

impl PosetAnalysis {
    /// Full dominance graph.
    #[rustfmt::skip]
    #[must_use]
    pub fn dominance(&self) -> &PosetGraph { &self.dominance }

    /// Transitively reduced graph.
    #[rustfmt::skip]
    #[must_use]
    pub fn reduced(&self) -> &PosetGraph { &self.reduced }

    /// Reachability and coverage over the reduced graph.
    #[rustfmt::skip]
    #[must_use]
    pub fn index(&self) -> &ReachabilityIndex { &self.index }

    /// Shortest paths over the reduced graph, computed in the mode the
    /// analysis was built with.
    #[must_use]
    pub fn shortest_paths(&self, view: GraphView) -> ShortestPaths {
        ShortestPaths::compute_in(&self.reduced, view, self.parallelism)
    }

    /// Mode resolved from the builder's strategy and parallel threshold.
    pub(crate) fn parallelism(&self) -> Parallelism {
        self.parallelism
    }

}
