//! Construction of the full dominance graph.

use std::{collections::HashMap, sync::Arc};

use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{info, instrument, warn};

use crate::{
    Result,
    builder::{DEFAULT_PARALLEL_THRESHOLD, ExecutionStrategy},
    datasource::MatrixSource,
    error::HasseError,
    execution::Parallelism,
    matrix::RelationMatrix,
};

use super::{GraphForm, NodeId, PosetGraph};

/// Builds the dominance graph over a family of matrices.
///
/// Equal matrices collapse into one node (the first occurrence wins) before
/// any edge is added, so the result never contains a 2-cycle. For every pair
/// of distinct nodes, an edge runs from the dominating matrix to the
/// dominated one.
///
/// # Examples
/// ```
/// use hasse_core::{MatrixFamily, NodeId, PosetGraphBuilder, RelationMatrix};
///
/// let family = MatrixFamily::try_new(
///     "three",
///     vec![
///         RelationMatrix::from_rows(&[[0_u32, 0], [0, 0]])?,
///         RelationMatrix::from_rows(&[[0_u32, 1], [0, 0]])?,
///         RelationMatrix::from_rows(&[[0_u32, 1], [0, 0]])?,
///     ],
/// )?;
/// let graph = PosetGraphBuilder::new().build(&family)?;
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.node_for_input(2), Some(NodeId::new(1)));
/// assert!(graph.has_edge(NodeId::new(1), NodeId::new(0)));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PosetGraphBuilder {
    strategy: ExecutionStrategy,
    parallel_threshold: usize,
}

impl Default for PosetGraphBuilder {
    fn default() -> Self {
        Self {
            strategy: ExecutionStrategy::Auto,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl PosetGraphBuilder {
    /// Creates a builder using [`ExecutionStrategy::Auto`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the strategy used for the pairwise dominance checks.
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

    /// Builds the dominance graph for every matrix in `source`.
    ///
    /// # Errors
    /// Returns [`HasseError::EmptySource`] for an empty source,
    /// [`HasseError::DimensionMismatch`] when the matrices differ in order,
    /// [`HasseError::DataSource`] when the source fails and
    /// [`HasseError::BackendUnavailable`] for an unsupported strategy.
    #[instrument(
        name = "core.build_poset",
        err,
        skip(self, source),
        fields(data_source = %source.name(), matrices = source.len(), strategy = ?self.strategy),
    )]
    pub fn build<S: MatrixSource + ?Sized>(&self, source: &S) -> Result<PosetGraph> {
        if source.is_empty() {
            warn!(
                data_source = source.name(),
                "data source is empty, returning error"
            );
            return Err(HasseError::EmptySource {
                data_source: Arc::from(source.name()),
            });
        }
        let matrices = source
            .matrices()
            .map_err(|error| HasseError::data_source(source.name(), error))?;
        check_uniform_order(&matrices)?;

        let (distinct, inputs) = collapse_duplicates(&matrices);
        let mode = Parallelism::resolve(self.strategy, distinct.len(), self.parallel_threshold)?;
        let edges = dominance_edges(&distinct, mode);

        let mut graph = DiGraph::with_capacity(distinct.len(), edges.len());
        for matrix in distinct {
            graph.add_node(matrix.clone());
        }
        for (from, to) in &edges {
            graph.add_edge(NodeIndex::new(*from), NodeIndex::new(*to), ());
        }

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            duplicates = matrices.len() - graph.node_count(),
            mode = mode.as_str(),
            "dominance graph built"
        );
        Ok(PosetGraph::from_graph(graph, GraphForm::Dominance, inputs))
    }
}

fn check_uniform_order(matrices: &[&RelationMatrix]) -> Result<()> {
    let Some(first) = matrices.first() else {
        return Ok(());
    };
    let expected = first.order();
    match matrices.iter().find(|matrix| matrix.order() != expected) {
        Some(odd) => {
            warn!(expected, actual = odd.order(), "matrix order mismatch");
            Err(HasseError::DimensionMismatch {
                expected,
                actual: odd.order(),
            })
        }
        None => Ok(()),
    }
}

/// Keeps the first occurrence of every distinct matrix and maps each input
/// position to the node of its first occurrence.
fn collapse_duplicates<'a>(
    matrices: &[&'a RelationMatrix],
) -> (Vec<&'a RelationMatrix>, Vec<NodeId>) {
    let mut seen: HashMap<&RelationMatrix, NodeId> = HashMap::with_capacity(matrices.len());
    let mut distinct = Vec::with_capacity(matrices.len());
    let inputs = matrices
        .iter()
        .map(|&matrix| {
            *seen.entry(matrix).or_insert_with(|| {
                distinct.push(matrix);
                NodeId::new(distinct.len() - 1)
            })
        })
        .collect();
    (distinct, inputs)
}

/// Returns `(from, to)` for every pair where `from` dominates `to`, sorted
/// by `from` then `to`.
fn dominance_edges(matrices: &[&RelationMatrix], mode: Parallelism) -> Vec<(usize, usize)> {
    let rows = mode.map(0..matrices.len(), |i| {
        let Some(left) = matrices.get(i) else {
            return Vec::new();
        };
        matrices
            .iter()
            .enumerate()
            .filter(|&(j, right)| j != i && left.dominates(right))
            .map(|(j, _)| (i, j))
            .collect::<Vec<_>>()
    });
    rows.into_iter().flatten().collect()
}
