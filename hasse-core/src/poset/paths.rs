//! All-pairs hop distances over a [`PosetGraph`].

use std::collections::VecDeque;

use petgraph::{Direction, graph::NodeIndex};
use tracing::{info, instrument, warn};

use crate::{
    Result,
    builder::{DEFAULT_PARALLEL_THRESHOLD, ExecutionStrategy},
    error::HasseError,
    execution::Parallelism,
};

use super::{NodeId, PosetGraph};

/// Whether edges are followed in their own direction or both ways.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GraphView {
    /// Follow edges from dominating to dominated matrices only.
    #[default]
    Directed,
    /// Treat every edge as bidirectional.
    Undirected,
}

/// Dense table of shortest-path lengths in hops.
///
/// # Examples
/// ```
/// use hasse_core::{GraphView, NodeId, PosetGraph, RelationMatrix, ShortestPaths};
///
/// let m = |v: u32| RelationMatrix::from_rows(&[[0, v], [0, 0]]);
/// let graph = PosetGraph::from_edges(vec![m(2)?, m(1)?, m(0)?], &[(0, 1), (1, 2)])?;
/// let paths = ShortestPaths::compute(&graph, GraphView::Directed)?;
/// assert_eq!(paths.distance(NodeId::new(0), NodeId::new(2)), Some(2));
/// assert_eq!(paths.distance(NodeId::new(2), NodeId::new(0)), None);
///
/// let undirected = ShortestPaths::compute(&graph, GraphView::Undirected)?;
/// assert_eq!(undirected.distance(NodeId::new(2), NodeId::new(0)), Some(2));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortestPaths {
    node_count: usize,
    table: Vec<Option<u32>>,
}

impl ShortestPaths {
    /// Runs one breadth-first sweep per node using [`ExecutionStrategy::Auto`].
    ///
    /// # Errors
    /// Propagates [`Self::compute_with`] failures.
    pub fn compute(graph: &PosetGraph, view: GraphView) -> Result<Self> {
        Self::compute_with(graph, view, ExecutionStrategy::Auto)
    }

    /// Runs one breadth-first sweep per node under `strategy`.
    ///
    /// # Errors
    /// Returns [`HasseError::BackendUnavailable`] for an unsupported strategy.
    pub fn compute_with(
        graph: &PosetGraph,
        view: GraphView,
        strategy: ExecutionStrategy,
    ) -> Result<Self> {
        let mode = Parallelism::resolve(strategy, graph.node_count(), DEFAULT_PARALLEL_THRESHOLD)?;
        Ok(Self::compute_in(graph, view, mode))
    }

    #[instrument(
        name = "core.shortest_paths",
        skip(graph, mode),
        fields(nodes = graph.node_count(), mode = mode.as_str()),
    )]
    pub(crate) fn compute_in(graph: &PosetGraph, view: GraphView, mode: Parallelism) -> Self {
        let node_count = graph.node_count();
        let rows = mode.map(0..node_count, |source| bfs_row(graph, view, source));
        let table: Vec<Option<u32>> = rows.into_iter().flatten().collect();
        info!(
            reachable_pairs = table.iter().filter(|cell| cell.is_some()).count(),
            "shortest paths computed"
        );
        Self { node_count, table }
    }

    /// Wraps a precomputed table where `rows[a][b]` is the hop count from
    /// `a` to `b`, or `None` when `b` is unreachable.
    ///
    /// # Errors
    /// Returns [`HasseError::PathTableShape`] unless the table is square with
    /// one row per node of `graph`.
    pub fn from_table(graph: &PosetGraph, rows: Vec<Vec<Option<u32>>>) -> Result<Self> {
        let node_count = graph.node_count();
        let bad_width = rows.iter().map(Vec::len).find(|&len| len != node_count);
        if rows.len() != node_count || bad_width.is_some() {
            let cols = bad_width.unwrap_or(node_count);
            warn!(rows = rows.len(), cols, node_count, "path table shape mismatch");
            return Err(HasseError::PathTableShape {
                rows: rows.len(),
                cols,
                node_count,
            });
        }
        Ok(Self {
            node_count,
            table: rows.into_iter().flatten().collect(),
        })
    }

    /// Number of nodes covered by the table.
    #[rustfmt::skip]
    #[must_use]
    pub fn node_count(&self) -> usize { self.node_count }

    /// Hop count from `from` to `to`, or `None` when unreachable or out of
    /// range.
    #[must_use]
    pub fn distance(&self, from: NodeId, to: NodeId) -> Option<u32> {
        if from.get() >= self.node_count || to.get() >= self.node_count {
            return None;
        }
        self.table
            .get(from.get() * self.node_count + to.get())
            .copied()
            .flatten()
    }

    /// Dense reachability matrix of the view the table was computed over.
    /// Every node reaches itself.
    #[must_use]
    pub fn reachability_matrix(&self) -> Vec<Vec<bool>> {
        self.to_rows()
            .into_iter()
            .map(|row| row.into_iter().map(|cell| cell.is_some()).collect())
            .collect()
    }

    /// Copies the table into nested rows.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<Option<u32>>> {
        if self.node_count == 0 {
            return Vec::new();
        }
        self.table
            .chunks_exact(self.node_count)
            .map(<[Option<u32>]>::to_vec)
            .collect()
    }
}

fn bfs_row(graph: &PosetGraph, view: GraphView, source: usize) -> Vec<Option<u32>> {
    let inner = graph.inner();
    let mut row = vec![None; inner.node_count()];
    let Some(start) = row.get_mut(source) else {
        return row;
    };
    *start = Some(0);
    let mut queue = VecDeque::from([(NodeIndex::new(source), 0_u32)]);
    while let Some((node, hops)) = queue.pop_front() {
        let neighbours: Box<dyn Iterator<Item = NodeIndex> + '_> = match view {
            GraphView::Directed => Box::new(inner.neighbors_directed(node, Direction::Outgoing)),
            GraphView::Undirected => Box::new(inner.neighbors_undirected(node)),
        };
        for next in neighbours {
            if let Some(cell) = row.get_mut(next.index()) {
                if cell.is_none() {
                    *cell = Some(hops + 1);
                    queue.push_back((next, hops + 1));
                }
            }
        }
    }
    row
}
