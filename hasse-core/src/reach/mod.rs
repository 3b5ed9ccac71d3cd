//! Reachability closure and entity coverage over a [`PosetGraph`].
//!
//! [`ReachabilityIndex`] records, for every node, the nodes it reaches
//! (itself included) and the external entities it represents. Entities are
//! attached to the node whose matrix equals theirs exactly and then
//! propagated along the graph according to a [`CoverageRule`].


use std::{
    collections::{BTreeSet, HashMap},
    fmt,
    sync::Arc,
};

use petgraph::{graph::NodeIndex, visit::Dfs};
use tracing::{info, instrument, warn};

use crate::{
    Result,
    builder::{DEFAULT_PARALLEL_THRESHOLD, ExecutionStrategy},
    datasource::MatrixSource,
    error::HasseError,
    execution::Parallelism,
    matrix::RelationMatrix,
    poset::{NodeId, PosetGraph, node_set::NodeSet},
};

/// Identifier of an external entity (an episode, sample or patient), equal
/// to its position in the entity source.
///
/// # Examples
/// ```
/// use hasse_core::EntityId;
///
/// assert_eq!(EntityId::new(5).get(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(usize);

impl EntityId {
    /// Creates an entity identifier.
    #[rustfmt::skip]
    #[must_use]
    pub const fn new(id: usize) -> Self { Self(id) }

    /// Returns the underlying index.
    #[rustfmt::skip]
    #[must_use]
    pub const fn get(self) -> usize { self.0 }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How an entity attached to node `H` propagates to other nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CoverageRule {
    /// A node covers the entities attached to itself or to any node it
    /// reaches. Coverage grows towards the maximal matrices.
    #[default]
    Descendants,
    /// A node covers the entities attached to itself or to any node that
    /// reaches it, so an entity at `H` is represented by `H` and every node
    /// below `H`. Coverage grows towards the minimal matrices.
    Ancestors,
}

/// Coverage statistics for a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeStats {
    /// The node described.
    pub node: NodeId,
    /// Entities whose matrix equals this node's matrix.
    pub direct: usize,
    /// Entities covered under the active [`CoverageRule`].
    pub covered: usize,
    /// Nodes strictly below this one.
    pub descendants: usize,
}

/// Per-node reflexive descendant sets and entity coverage.
///
/// # Examples
/// ```
/// use hasse_core::{
///     CoverageRule, EntityId, MatrixFamily, NodeId, PosetGraph, ReachabilityIndex,
///     RelationMatrix,
/// };
///
/// let m = |v: u32| RelationMatrix::from_rows(&[[0, v], [0, 0]]);
/// let graph = PosetGraph::from_edges(vec![m(2)?, m(1)?, m(0)?], &[(0, 1), (1, 2)])?;
/// let entities = MatrixFamily::try_new("episodes", vec![m(1)?, m(0)?])?;
/// let index = ReachabilityIndex::with_entities(&graph, &entities, CoverageRule::Descendants)?;
///
/// assert!(index.reaches(NodeId::new(0), NodeId::new(2)));
/// assert_eq!(index.entity_node(EntityId::new(0)), Some(NodeId::new(1)));
/// let top: Vec<_> = index.reach(NodeId::new(0)).into_iter().flatten().collect();
/// assert_eq!(top, vec![&EntityId::new(0), &EntityId::new(1)]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct ReachabilityIndex {
    closure: Vec<NodeSet>,
    entity_nodes: Vec<NodeId>,
    direct: Vec<Vec<EntityId>>,
    covered: Vec<BTreeSet<EntityId>>,
    rule: CoverageRule,
}

impl ReachabilityIndex {
    /// Computes the reflexive closure of `graph` without attaching entities.
    #[must_use]
    pub fn new(graph: &PosetGraph) -> Self {
        Self::closed_over(
            graph,
            Parallelism::auto(graph.node_count(), DEFAULT_PARALLEL_THRESHOLD),
        )
    }

    pub(crate) fn closed_over(graph: &PosetGraph, mode: Parallelism) -> Self {
        let closure = closure(graph, mode);
        let node_count = closure.len();
        Self {
            closure,
            entity_nodes: Vec::new(),
            direct: vec![Vec::new(); node_count],
            covered: vec![BTreeSet::new(); node_count],
            rule: CoverageRule::default(),
        }
    }

    /// Computes the closure of `graph` and attaches every entity in
    /// `entities`, using [`ExecutionStrategy::Auto`].
    ///
    /// # Errors
    /// See [`Self::with_entities_using`].
    pub fn with_entities<S: MatrixSource + ?Sized>(
        graph: &PosetGraph,
        entities: &S,
        rule: CoverageRule,
    ) -> Result<Self> {
        Self::with_entities_using(graph, entities, rule, ExecutionStrategy::Auto)
    }

    /// Computes the closure of `graph` under `strategy` and attaches every
    /// entity in `entities`.
    ///
    /// # Errors
    /// Returns [`HasseError::UnmatchedEntity`] for the first entity whose
    /// matrix equals no node's matrix, [`HasseError::DimensionMismatch`] when
    /// an entity's order differs from the graph's, [`HasseError::DataSource`]
    /// when the source fails and [`HasseError::BackendUnavailable`] for an
    /// unsupported strategy.
    pub fn with_entities_using<S: MatrixSource + ?Sized>(
        graph: &PosetGraph,
        entities: &S,
        rule: CoverageRule,
        strategy: ExecutionStrategy,
    ) -> Result<Self> {
        let mode = Parallelism::resolve(strategy, graph.node_count(), DEFAULT_PARALLEL_THRESHOLD)?;
        Self::attach(graph, entities, rule, mode)
    }

    #[instrument(
        name = "core.reachability",
        err,
        skip(graph, entities, mode),
        fields(
            nodes = graph.node_count(),
            data_source = %entities.name(),
            entities = entities.len(),
            mode = mode.as_str(),
        ),
    )]
    pub(crate) fn attach<S: MatrixSource + ?Sized>(
        graph: &PosetGraph,
        entities: &S,
        rule: CoverageRule,
        mode: Parallelism,
    ) -> Result<Self> {
        let entity_nodes = match_entities(graph, entities)?;
        let closure = closure(graph, mode);

        let mut direct = vec![Vec::new(); graph.node_count()];
        for (entity, node) in entity_nodes.iter().enumerate() {
            if let Some(slot) = direct.get_mut(node.get()) {
                slot.push(EntityId::new(entity));
            }
        }
        let covered = match rule {
            CoverageRule::Descendants => mode.map(0..closure.len(), |node| {
                closure.get(node).map_or_else(BTreeSet::new, |below| {
                    below
                        .iter()
                        .filter_map(|d| direct.get(d))
                        .flatten()
                        .copied()
                        .collect()
                })
            }),
            CoverageRule::Ancestors => {
                let mut covered = vec![BTreeSet::new(); closure.len()];
                for (home, attached) in direct.iter().enumerate() {
                    let Some(below) = closure.get(home) else {
                        continue;
                    };
                    for node in below.iter() {
                        if let Some(set) = covered.get_mut(node) {
                            set.extend(attached.iter().copied());
                        }
                    }
                }
                covered
            }
        };

        let index = Self {
            closure,
            entity_nodes,
            direct,
            covered,
            rule,
        };
        info!(
            matched_nodes = index.direct.iter().filter(|d| !d.is_empty()).count(),
            universal_nodes = index.universal_nodes().len(),
            rule = ?rule,
            "reachability index built"
        );
        Ok(index)
    }

    /// Number of nodes indexed.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.closure.len()
    }

    /// Number of attached entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entity_nodes.len()
    }

    /// Propagation rule used for [`Self::reach`].
    #[rustfmt::skip]
    #[must_use]
    pub fn rule(&self) -> CoverageRule { self.rule }

    /// Whether `to` is reachable from `from`; every node reaches itself.
    #[must_use]
    pub fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        self.closure
            .get(from.get())
            .is_some_and(|below| below.contains(to.get()))
    }

    /// Nodes reachable from `node`, including `node`, ascending.
    #[must_use]
    pub fn closed_descendants(&self, node: NodeId) -> Vec<NodeId> {
        self.closure
            .get(node.get())
            .map(|below| below.iter().map(NodeId::new).collect())
            .unwrap_or_default()
    }

    /// Nodes strictly below `node`, ascending.
    #[must_use]
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = self.closed_descendants(node);
        out.retain(|&other| other != node);
        out
    }

    /// Nodes reachable from both `a` and `b` (each closed with itself),
    /// ascending.
    pub fn common_descendants(&self, a: NodeId, b: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let left = self.closure.get(a.get());
        let right = self.closure.get(b.get());
        left.zip(right)
            .into_iter()
            .flat_map(|(l, r)| l.intersection(r))
            .map(NodeId::new)
    }

    /// Entities covered by `node`, in ascending order. `None` for unknown
    /// nodes.
    #[must_use]
    pub fn reach(&self, node: NodeId) -> Option<&BTreeSet<EntityId>> {
        self.covered.get(node.get())
    }

    /// Node the entity was matched to.
    #[must_use]
    pub fn entity_node(&self, entity: EntityId) -> Option<NodeId> {
        self.entity_nodes.get(entity.get()).copied()
    }

    /// Entities whose matrix equals `node`'s matrix.
    #[must_use]
    pub fn direct_entities(&self, node: NodeId) -> &[EntityId] {
        self.direct.get(node.get()).map_or(&[], Vec::as_slice)
    }

    /// Covered entities for every node as sorted lists.
    #[must_use]
    pub fn reach_table(&self) -> Vec<(NodeId, Vec<EntityId>)> {
        self.covered
            .iter()
            .enumerate()
            .map(|(node, set)| (NodeId::new(node), set.iter().copied().collect()))
            .collect()
    }

    /// Dense directed reachability matrix with a filled diagonal.
    #[must_use]
    pub fn reachability_matrix(&self) -> Vec<Vec<bool>> {
        let n = self.node_count();
        self.closure
            .iter()
            .map(|below| (0..n).map(|to| below.contains(to)).collect())
            .collect()
    }

    /// Union of the coverage of `nodes`.
    #[must_use]
    pub fn covered_by(&self, nodes: &[NodeId]) -> BTreeSet<EntityId> {
        nodes
            .iter()
            .filter_map(|&node| self.reach(node))
            .flatten()
            .copied()
            .collect()
    }

    /// Nodes covering every attached entity. Empty when no entity is
    /// attached.
    #[must_use]
    pub fn universal_nodes(&self) -> Vec<NodeId> {
        let total = self.entity_count();
        if total == 0 {
            return Vec::new();
        }
        self.covered
            .iter()
            .enumerate()
            .filter(|(_, set)| set.len() == total)
            .map(|(node, _)| NodeId::new(node))
            .collect()
    }

    /// Direct, covered and descendant counts for every node.
    #[must_use]
    pub fn node_stats(&self) -> Vec<NodeStats> {
        (0..self.node_count())
            .map(NodeId::new)
            .map(|node| NodeStats {
                node,
                direct: self.direct_entities(node).len(),
                covered: self.reach(node).map_or(0, BTreeSet::len),
                descendants: self
                    .closure
                    .get(node.get())
                    .map_or(0, |below| below.len().saturating_sub(1)),
            })
            .collect()
    }
}

/// Reflexive descendant set of every node.
fn closure(graph: &PosetGraph, mode: Parallelism) -> Vec<NodeSet> {
    let inner = graph.inner();
    let n = inner.node_count();
    mode.map(0..n, |start| {
        let mut set = NodeSet::new(n);
        let mut dfs = Dfs::new(inner, NodeIndex::new(start));
        while let Some(node) = dfs.next(inner) {
            set.insert(node.index());
        }
        set
    })
}

fn match_entities<S: MatrixSource + ?Sized>(
    graph: &PosetGraph,
    entities: &S,
) -> Result<Vec<NodeId>> {
    let mut lookup: HashMap<&RelationMatrix, NodeId> = HashMap::with_capacity(graph.node_count());
    for node in graph.nodes() {
        if let Some(matrix) = graph.matrix(node) {
            lookup.entry(matrix).or_insert(node);
        }
    }
    let expected = graph.matrix_order();
    (0..entities.len())
        .map(|entity| {
            let matrix = entities
                .matrix(entity)
                .map_err(|error| HasseError::data_source(entities.name(), error))?;
            if let Some(expected) = expected.filter(|&order| order != matrix.order()) {
                warn!(entity, expected, actual = matrix.order(), "entity order mismatch");
                return Err(HasseError::DimensionMismatch {
                    expected,
                    actual: matrix.order(),
                });
            }
            lookup.get(matrix).copied().ok_or_else(|| {
                warn!(
                    entity,
                    data_source = entities.name(),
                    "entity matches no node of the poset"
                );
                HasseError::UnmatchedEntity {
                    entity,
                    data_source: Arc::from(entities.name()),
                }
            })
        })
        .collect()
}
