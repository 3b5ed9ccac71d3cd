//! Dominance graphs over relation matrices and their Hasse diagrams.
//!
//! A [`PosetGraph`] owns one [`RelationMatrix`] per distinct input matrix and
//! a directed edge `u -> v` whenever `u`'s matrix dominates `v`'s cell by
//! cell. [`PosetGraphBuilder`] produces the full dominance graph,
//! [`TransitiveReducer`] strips every edge implied by composition and
//! [`ShortestPaths`] measures hop counts over either form.

mod builder;
pub(crate) mod node_set;
mod paths;
#[cfg(test)]
pub(crate) mod property;
mod reduce;

use std::fmt;

use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
};

use crate::{
    Result,
    error::HasseError,
    matrix::RelationMatrix,
};

pub use self::{
    builder::PosetGraphBuilder,
    paths::{GraphView, ShortestPaths},
    reduce::TransitiveReducer,
};

/// Identifier of a node in a [`PosetGraph`].
///
/// Node identifiers are dense: a graph with `n` nodes uses `0..n`.
///
/// # Examples
/// ```
/// use hasse_core::NodeId;
///
/// let node = NodeId::new(3);
/// assert_eq!(node.get(), 3);
/// assert_eq!(node.to_string(), "3");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Creates a node identifier.
    #[rustfmt::skip]
    #[must_use]
    pub const fn new(id: usize) -> Self { Self(id) }

    /// Returns the underlying index.
    #[rustfmt::skip]
    #[must_use]
    pub const fn get(self) -> usize { self.0 }

    pub(crate) fn index(self) -> NodeIndex {
        NodeIndex::new(self.0)
    }
}

impl From<NodeIndex> for NodeId {
    fn from(index: NodeIndex) -> Self {
        Self(index.index())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which edge set a [`PosetGraph`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphForm {
    /// Every dominance edge, including those implied by composition.
    Dominance,
    /// The Hasse diagram: no edge is implied by two others.
    Reduced,
}

/// Directed graph whose nodes carry distinct relation matrices.
///
/// Edges point from the dominating matrix to the dominated one, so every
/// descendant of a node relates fewer element pairs.
#[derive(Debug, Clone)]
pub struct PosetGraph {
    graph: DiGraph<RelationMatrix, ()>,
    form: GraphForm,
    inputs: Vec<NodeId>,
}

impl PosetGraph {
    pub(crate) fn from_graph(
        graph: DiGraph<RelationMatrix, ()>,
        form: GraphForm,
        inputs: Vec<NodeId>,
    ) -> Self {
        Self {
            graph,
            form,
            inputs,
        }
    }

    /// Rebuilds a graph from persisted nodes and edges.
    ///
    /// Node `i` carries `matrices[i]` and every input index maps to its own
    /// node. The edges are taken as given; no dominance check is performed,
    /// so the result may be cyclic.
    ///
    /// # Errors
    /// Returns [`HasseError::UnknownNode`] when an edge names a node outside
    /// `0..matrices.len()` and [`HasseError::DimensionMismatch`] when the
    /// matrices do not share one order.
    ///
    /// # Examples
    /// ```
    /// use hasse_core::{GraphForm, NodeId, PosetGraph, RelationMatrix};
    ///
    /// let top = RelationMatrix::from_rows(&[[0_u32, 1], [0, 0]])?;
    /// let bottom = RelationMatrix::from_rows(&[[0_u32, 0], [0, 0]])?;
    /// let graph = PosetGraph::from_edges(vec![top, bottom], &[(0, 1)])?;
    /// assert_eq!(graph.form(), GraphForm::Dominance);
    /// assert!(graph.has_edge(NodeId::new(0), NodeId::new(1)));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_edges(matrices: Vec<RelationMatrix>, edges: &[(usize, usize)]) -> Result<Self> {
        let node_count = matrices.len();
        if let Some(first) = matrices.first() {
            let expected = first.order();
            if let Some(odd) = matrices.iter().find(|matrix| matrix.order() != expected) {
                return Err(HasseError::DimensionMismatch {
                    expected,
                    actual: odd.order(),
                });
            }
        }
        let mut graph = DiGraph::with_capacity(node_count, edges.len());
        for matrix in matrices {
            graph.add_node(matrix);
        }
        for &(from, to) in edges {
            let bad = [from, to].into_iter().find(|&node| node >= node_count);
            if let Some(node) = bad {
                return Err(HasseError::UnknownNode { node, node_count });
            }
            graph.update_edge(NodeIndex::new(from), NodeIndex::new(to), ());
        }
        Ok(Self::from_graph(
            graph,
            GraphForm::Dominance,
            (0..node_count).map(NodeId::new).collect(),
        ))
    }

    /// Number of distinct matrices (nodes).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of directed edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether this graph is the full dominance graph or its reduction.
    #[rustfmt::skip]
    #[must_use]
    pub fn form(&self) -> GraphForm { self.form }

    /// Iterates over every node identifier in ascending order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = NodeId> + '_ {
        self.graph.node_indices().map(NodeId::from)
    }

    /// Borrows the matrix carried by `node`.
    #[must_use]
    pub fn matrix(&self, node: NodeId) -> Option<&RelationMatrix> {
        self.graph.node_weight(node.index())
    }

    /// Order of the matrices carried by the nodes, if any.
    #[must_use]
    pub fn matrix_order(&self) -> Option<usize> {
        self.graph
            .node_weights()
            .next()
            .map(RelationMatrix::order)
    }

    /// Node that input matrix `input` was collapsed into.
    #[must_use]
    pub fn node_for_input(&self, input: usize) -> Option<NodeId> {
        self.inputs.get(input).copied()
    }

    /// Canonical node for every input matrix, in input order.
    #[rustfmt::skip]
    #[must_use]
    pub fn input_nodes(&self) -> &[NodeId] { &self.inputs }

    /// Finds the node whose matrix equals `matrix` exactly.
    #[must_use]
    pub fn find(&self, matrix: &RelationMatrix) -> Option<NodeId> {
        self.graph
            .node_indices()
            .find(|&index| self.graph[index] == *matrix)
            .map(NodeId::from)
    }

    /// Whether the edge `from -> to` exists.
    #[must_use]
    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.graph.contains_edge(from.index(), to.index())
    }

    /// Direct successors of `node` (the matrices it covers), ascending.
    #[must_use]
    pub fn successors(&self, node: NodeId) -> Vec<NodeId> {
        self.neighbours(node, Direction::Outgoing)
    }

    /// Direct predecessors of `node`, ascending.
    #[must_use]
    pub fn predecessors(&self, node: NodeId) -> Vec<NodeId> {
        self.neighbours(node, Direction::Incoming)
    }

    fn neighbours(&self, node: NodeId, direction: Direction) -> Vec<NodeId> {
        if node.get() >= self.node_count() {
            return Vec::new();
        }
        let mut out: Vec<NodeId> = self
            .graph
            .neighbors_directed(node.index(), direction)
            .map(NodeId::from)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Nodes without predecessors (maximal matrices), ascending.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|&node| {
                self.graph
                    .neighbors_directed(node.index(), Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect()
    }

    /// Every edge as `(from, to)`, sorted.
    #[must_use]
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        let mut edges: Vec<(NodeId, NodeId)> = self
            .graph
            .edge_indices()
            .filter_map(|edge| self.graph.edge_endpoints(edge))
            .map(|(from, to)| (NodeId::from(from), NodeId::from(to)))
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Dense adjacency matrix: `rows[u][v]` is true when `u -> v` exists.
    #[must_use]
    pub fn adjacency_matrix(&self) -> Vec<Vec<bool>> {
        let n = self.node_count();
        let mut rows = vec![vec![false; n]; n];
        for (from, to) in self.edges() {
            if let Some(cell) = rows.get_mut(from.get()).and_then(|row| row.get_mut(to.get())) {
                *cell = true;
            }
        }
        rows
    }

    pub(crate) fn inner(&self) -> &DiGraph<RelationMatrix, ()> {
        &self.graph
    }
}
