//! Transitive reduction of dominance graphs.

use petgraph::{
    Direction,
    algo::toposort,
    graph::{DiGraph, NodeIndex},
};
use tracing::{info, instrument, warn};

use crate::{
    Result,
    builder::{DEFAULT_PARALLEL_THRESHOLD, ExecutionStrategy},
    error::HasseError,
    execution::Parallelism,
};

use super::{GraphForm, PosetGraph, node_set::NodeSet};

/// Computes Hasse diagrams.
///
/// The reduction keeps `u -> v` only when no other successor `w` of `u`
/// reaches `v`. Node identifiers, matrices and the input-to-node mapping are
/// carried over unchanged, and reducing a reduced graph returns the same
/// edge set.
///
/// # Examples
/// ```
/// use hasse_core::{GraphForm, NodeId, PosetGraph, RelationMatrix, TransitiveReducer};
///
/// let m = |v: u32| RelationMatrix::from_rows(&[[0, v], [0, 0]]);
/// let graph = PosetGraph::from_edges(vec![m(2)?, m(1)?, m(0)?], &[(0, 1), (1, 2), (0, 2)])?;
/// let reduced = TransitiveReducer::new().reduce(&graph)?;
/// assert_eq!(reduced.form(), GraphForm::Reduced);
/// assert_eq!(
///     reduced.edges(),
///     vec![(NodeId::new(0), NodeId::new(1)), (NodeId::new(1), NodeId::new(2))]
/// );
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TransitiveReducer {
    strategy: ExecutionStrategy,
    parallel_threshold: usize,
}

impl Default for TransitiveReducer {
    fn default() -> Self {
        Self {
            strategy: ExecutionStrategy::Auto,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl TransitiveReducer {
    /// Creates a reducer using [`ExecutionStrategy::Auto`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the strategy used for the per-node redundancy checks.
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

    /// Returns the transitive reduction of `graph`.
    ///
    /// # Errors
    /// Returns [`HasseError::CyclicGraph`] when `graph` contains a cycle and
    /// [`HasseError::BackendUnavailable`] for an unsupported strategy.
    #[instrument(
        name = "core.reduce",
        err,
        skip(self, graph),
        fields(nodes = graph.node_count(), edges = graph.edge_count()),
    )]
    pub fn reduce(&self, graph: &PosetGraph) -> Result<PosetGraph> {
        let inner = graph.inner();
        let order = toposort(inner, None).map_err(|cycle| {
            let node = cycle.node_id().index();
            warn!(node, "cycle detected, graph cannot be reduced");
            HasseError::CyclicGraph { node }
        })?;

        let descendants = strict_descendants(inner, &order);
        let mode =
            Parallelism::resolve(self.strategy, inner.node_count(), self.parallel_threshold)?;
        let kept = mode.map(0..inner.node_count(), |u| {
            irredundant_successors(inner, &descendants, NodeIndex::new(u))
        });

        let mut reduced = DiGraph::with_capacity(inner.node_count(), inner.node_count());
        for matrix in inner.node_weights() {
            reduced.add_node(matrix.clone());
        }
        for (u, successors) in kept.into_iter().enumerate() {
            for v in successors {
                reduced.add_edge(NodeIndex::new(u), NodeIndex::new(v), ());
            }
        }

        info!(
            edges_before = inner.edge_count(),
            edges_after = reduced.edge_count(),
            "transitive reduction completed"
        );
        Ok(PosetGraph::from_graph(
            reduced,
            GraphForm::Reduced,
            graph.input_nodes().to_vec(),
        ))
    }
}

/// Strict (non-reflexive) descendant sets, filled in reverse topological
/// order so every successor's set is final before it is merged.
fn strict_descendants<N, E>(graph: &DiGraph<N, E>, order: &[NodeIndex]) -> Vec<NodeSet> {
    let n = graph.node_count();
    let mut sets = vec![NodeSet::new(n); n];
    for &node in order.iter().rev() {
        let mut acc = NodeSet::new(n);
        for succ in graph.neighbors_directed(node, Direction::Outgoing) {
            acc.insert(succ.index());
            if let Some(below) = sets.get(succ.index()) {
                acc.union_with(below);
            }
        }
        if let Some(slot) = sets.get_mut(node.index()) {
            *slot = acc;
        }
    }
    sets
}

/// Successors of `node` not reachable through any other successor, ascending.
fn irredundant_successors<N, E>(
    graph: &DiGraph<N, E>,
    descendants: &[NodeSet],
    node: NodeIndex,
) -> Vec<usize> {
    let mut successors: Vec<usize> = graph
        .neighbors_directed(node, Direction::Outgoing)
        .map(NodeIndex::index)
        .collect();
    successors.sort_unstable();
    successors.dedup();
    successors
        .iter()
        .copied()
        .filter(|&v| {
            !successors.iter().any(|&w| {
                w != v
                    && descendants
                        .get(w)
                        .is_some_and(|below| below.contains(v))
            })
        })
        .collect()
}
