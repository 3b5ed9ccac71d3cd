//! Agglomerative clustering with a graph-topological pair distance.
//!
//! Two clusters are as close as the cheapest node reachable from both of
//! their representatives, measured as the sum of the two hop counts. The
//! merged cluster is represented by that bridging node, not by either input.

use std::{collections::BTreeMap, num::NonZeroUsize};

use tracing::{debug, info, instrument, warn};

use crate::{
    Result,
    builder::{DEFAULT_PARALLEL_THRESHOLD, ExecutionStrategy},
    error::HasseError,
    execution::Parallelism,
    poset::{NodeId, ShortestPaths},
    reach::{EntityId, ReachabilityIndex},
    result::{ClusterId, ClusteringResult},
};

use super::bridge_cache::BridgeCache;

/// Cheapest node reachable from two representatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bridge {
    /// The common descendant minimising the summed hop count.
    pub node: NodeId,
    /// `sp(a, node) + sp(b, node)`.
    pub distance: u32,
}

/// Finds the bridge between `a` and `b`.
///
/// Candidates are the nodes reachable from both (each closed with itself).
/// Candidates missing from `paths` are skipped, and ties go to the lowest
/// node identifier. Returns `None` when no candidate remains.
#[must_use]
pub fn bridge(
    index: &ReachabilityIndex,
    paths: &ShortestPaths,
    a: NodeId,
    b: NodeId,
) -> Option<Bridge> {
    let mut best: Option<Bridge> = None;
    for node in index.common_descendants(a, b) {
        let (Some(left), Some(right)) = (paths.distance(a, node), paths.distance(b, node)) else {
            continue;
        };
        let distance = left.saturating_add(right);
        if best.is_none_or(|current| distance < current.distance) {
            best = Some(Bridge { node, distance });
        }
    }
    best
}

/// One entry of the cluster arena.
///
/// Records are never removed; merging marks both inputs inactive and
/// appends a new record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterRecord {
    id: ClusterId,
    representative: NodeId,
    members: Vec<EntityId>,
    size: usize,
    active: bool,
    merged_from: Option<(ClusterId, ClusterId)>,
}

impl ClusterRecord {
    /// Arena identifier.
    #[rustfmt::skip]
    #[must_use]
    pub fn id(&self) -> ClusterId { self.id }

    /// Node whose coverage stands for the cluster.
    #[rustfmt::skip]
    #[must_use]
    pub fn representative(&self) -> NodeId { self.representative }

    /// Member entities in merge order.
    #[rustfmt::skip]
    #[must_use]
    pub fn members(&self) -> &[EntityId] { &self.members }

    /// Number of member entities.
    #[rustfmt::skip]
    #[must_use]
    pub fn size(&self) -> usize { self.size }

    /// Whether the cluster has not been merged into another.
    #[rustfmt::skip]
    #[must_use]
    pub fn is_active(&self) -> bool { self.active }

    /// The two clusters this one was merged from, if any.
    #[rustfmt::skip]
    #[must_use]
    pub fn merged_from(&self) -> Option<(ClusterId, ClusterId)> { self.merged_from }
}

/// One merge step, in the layout of a hierarchical-clustering linkage table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkageRecord {
    /// Lower arena identifier of the merged pair.
    pub left: ClusterId,
    /// Higher arena identifier of the merged pair.
    pub right: ClusterId,
    /// Bridge distance at which the pair merged.
    pub distance: u32,
    /// Size of the merged cluster.
    pub size: usize,
    /// Bridging node that represents the merged cluster.
    pub representative: NodeId,
}

/// Why the merge loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusteringStatus {
    /// A single cluster remains (or there was nothing to merge).
    Complete,
    /// Every remaining pair lacks a common reachable node.
    Disconnected,
    /// The iteration cap was reached first.
    Truncated,
}

impl ClusteringStatus {
    /// Stable machine-readable representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "COMPLETE",
            Self::Disconnected => "NO_MERGEABLE_CLUSTERS",
            Self::Truncated => "ITERATION_CAP_REACHED",
        }
    }
}

/// Outcome of [`GraphDistanceClusterer::cluster`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphClustering {
    records: Vec<ClusterRecord>,
    linkage: Vec<LinkageRecord>,
    status: ClusteringStatus,
    entity_count: usize,
}

impl GraphClustering {
    /// Every cluster ever created, indexed by [`ClusterId`].
    #[rustfmt::skip]
    #[must_use]
    pub fn records(&self) -> &[ClusterRecord] { &self.records }

    /// Looks up one arena record.
    #[must_use]
    pub fn record(&self, id: ClusterId) -> Option<&ClusterRecord> {
        usize::try_from(id.get())
            .ok()
            .and_then(|index| self.records.get(index))
    }

    /// Merge history in merge order.
    #[rustfmt::skip]
    #[must_use]
    pub fn linkage(&self) -> &[LinkageRecord] { &self.linkage }

    /// Why the merge loop stopped.
    #[rustfmt::skip]
    #[must_use]
    pub fn status(&self) -> ClusteringStatus { self.status }

    /// Clusters left when the loop stopped, in arena order.
    pub fn active(&self) -> impl Iterator<Item = &ClusterRecord> + '_ {
        self.records.iter().filter(|record| record.active)
    }

    /// Final membership: every active cluster with its sorted members.
    #[must_use]
    pub fn membership(&self) -> Vec<(ClusterId, Vec<EntityId>)> {
        self.active()
            .map(|record| {
                let mut members = record.members.clone();
                members.sort_unstable();
                (record.id, members)
            })
            .collect()
    }

    /// Flat assignment of every entity to its final cluster.
    #[must_use]
    pub fn assignments(&self) -> ClusteringResult {
        let mut owner = vec![ClusterId::new(0); self.entity_count];
        for record in self.active() {
            for member in &record.members {
                if let Some(slot) = owner.get_mut(member.get()) {
                    *slot = record.id;
                }
            }
        }
        ClusteringResult::from_labels(owner)
    }
}

/// Merges entity clusters through common reachable nodes.
///
/// # Examples
/// ```
/// use hasse_core::{
///     ClusteringStatus, CoverageRule, GraphDistanceClusterer, GraphView, MatrixFamily,
///     PosetGraph, ReachabilityIndex, RelationMatrix, ShortestPaths,
/// };
///
/// let m = |v: u32| RelationMatrix::from_rows(&[[0, v], [0, 0]]);
/// // 0 covers 1 and 2, which cover 3.
/// let graph = PosetGraph::from_edges(
///     vec![m(3)?, m(2)?, m(1)?, m(0)?],
///     &[(0, 1), (0, 2), (1, 3), (2, 3)],
/// )?;
/// let entities = MatrixFamily::try_new("episodes", vec![m(2)?, m(1)?])?;
/// let index = ReachabilityIndex::with_entities(&graph, &entities, CoverageRule::Descendants)?;
/// let paths = ShortestPaths::compute(&graph, GraphView::Directed)?;
///
/// let clustering = GraphDistanceClusterer::new().cluster(&index, &paths)?;
/// assert_eq!(clustering.status(), ClusteringStatus::Complete);
/// assert_eq!(clustering.linkage()[0].distance, 2);
/// assert_eq!(clustering.linkage()[0].representative.get(), 3);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GraphDistanceClusterer {
    iteration_cap: Option<NonZeroUsize>,
    strategy: ExecutionStrategy,
    parallel_threshold: usize,
}

impl Default for GraphDistanceClusterer {
    fn default() -> Self {
        Self {
            iteration_cap: None,
            strategy: ExecutionStrategy::Auto,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

type PairKey = (ClusterId, ClusterId);

impl GraphDistanceClusterer {
    /// Creates a clusterer without an iteration cap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops after `cap` merges. `None` runs until one cluster remains or no
    /// pair can merge.
    #[must_use]
    pub fn with_iteration_cap(mut self, cap: Option<NonZeroUsize>) -> Self {
        self.iteration_cap = cap;
        self
    }

    /// Sets the strategy used for pair evaluation.
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

    /// Clusters every entity attached to `index`, starting from singletons
    /// in entity order.
    ///
    /// Each step merges the pair with the smallest bridge distance; ties go
    /// to the first pair in ascending `(left, right)` identifier order.
    ///
    /// # Errors
    /// Returns [`HasseError::PathTableShape`] when `paths` does not cover the
    /// same nodes as `index` and [`HasseError::BackendUnavailable`] for an
    /// unsupported strategy.
    #[instrument(
        name = "core.cluster",
        err,
        skip(self, index, paths),
        fields(
            entities = index.entity_count(),
            iteration_cap = ?self.iteration_cap,
            merges = tracing::field::Empty,
            status = tracing::field::Empty,
        ),
    )]
    pub fn cluster(
        &self,
        index: &ReachabilityIndex,
        paths: &ShortestPaths,
    ) -> Result<GraphClustering> {
        if paths.node_count() != index.node_count() {
            warn!(
                paths = paths.node_count(),
                nodes = index.node_count(),
                "path table does not match the reachability index"
            );
            return Err(HasseError::PathTableShape {
                rows: paths.node_count(),
                cols: paths.node_count(),
                node_count: index.node_count(),
            });
        }
        let entity_count = index.entity_count();
        let mode = Parallelism::resolve(self.strategy, entity_count, self.parallel_threshold)?;
        let cache = BridgeCache::new();
        let mut records: Vec<ClusterRecord> = (0..entity_count)
            .filter_map(|entity| {
                let id = EntityId::new(entity);
                index.entity_node(id).map(|node| ClusterRecord {
                    id: ClusterId::new(entity as u64),
                    representative: node,
                    members: vec![id],
                    size: 1,
                    active: true,
                    merged_from: None,
                })
            })
            .collect();

        let evaluate = |a: &ClusterRecord, b: &ClusterRecord| {
            cache.get_or_compute(a.representative, b.representative, || {
                bridge(index, paths, a.representative, b.representative)
            })
        };
        let mut pairs: BTreeMap<PairKey, Option<Bridge>> = mode
            .map(0..records.len(), |i| {
                let Some(left) = records.get(i) else {
                    return Vec::new();
                };
                records
                    .iter()
                    .skip(i + 1)
                    .map(|right| ((left.id, right.id), evaluate(left, right)))
                    .collect()
            })
            .into_iter()
            .flatten()
            .collect();

        let mut linkage = Vec::new();
        let mut active = records.len();
        let status = loop {
            if active <= 1 {
                break ClusteringStatus::Complete;
            }
            if self
                .iteration_cap
                .is_some_and(|cap| linkage.len() >= cap.get())
            {
                break ClusteringStatus::Truncated;
            }
            let Some(((left, right), best)) = closest_pair(&pairs) else {
                warn!(active, "no remaining pair shares a reachable node");
                break ClusteringStatus::Disconnected;
            };

            let merged = merge(&mut records, left, right, best);
            debug!(
                left = left.get(),
                right = right.get(),
                distance = best.distance,
                representative = best.node.get(),
                size = merged.size,
                "clusters merged"
            );
            linkage.push(LinkageRecord {
                left,
                right,
                distance: best.distance,
                size: merged.size,
                representative: best.node,
            });
            active -= 1;

            pairs.retain(|&(a, b), _| ![a, b].iter().any(|id| *id == left || *id == right));
            let live: Vec<&ClusterRecord> = records.iter().filter(|r| r.active).collect();
            let fresh = mode.map(0..live.len(), |i| {
                live.get(i)
                    .filter(|other| other.id != merged.id)
                    .map(|other| ((other.id, merged.id), evaluate(other, &merged)))
            });
            pairs.extend(fresh.into_iter().flatten());
        };

        let span = tracing::Span::current();
        span.record("merges", linkage.len());
        span.record("status", status.as_str());
        info!(
            merges = linkage.len(),
            remaining = active,
            cached_bridges = cache.len(),
            status = status.as_str(),
            "graph-distance clustering finished"
        );
        Ok(GraphClustering {
            records,
            linkage,
            status,
            entity_count,
        })
    }
}

/// First pair with the strictly smallest bridge distance, in key order.
fn closest_pair(pairs: &BTreeMap<PairKey, Option<Bridge>>) -> Option<(PairKey, Bridge)> {
    let mut best: Option<(PairKey, Bridge)> = None;
    for (&key, candidate) in pairs {
        let Some(candidate) = *candidate else {
            continue;
        };
        if best.is_none_or(|(_, current)| candidate.distance < current.distance) {
            best = Some((key, candidate));
        }
    }
    best
}

/// Appends the merged record and deactivates both inputs.
fn merge(
    records: &mut Vec<ClusterRecord>,
    left: ClusterId,
    right: ClusterId,
    bridge: Bridge,
) -> ClusterRecord {
    let mut members = Vec::new();
    let mut size = 0;
    for id in [left, right] {
        if let Some(record) = usize::try_from(id.get())
            .ok()
            .and_then(|index| records.get_mut(index))
        {
            record.active = false;
            members.extend_from_slice(&record.members);
            size += record.size;
        }
    }
    let merged = ClusterRecord {
        id: ClusterId::new(records.len() as u64),
        representative: bridge.node,
        members,
        size,
        active: true,
        merged_from: Some((left, right)),
    };
    records.push(merged.clone());
    merged
}
