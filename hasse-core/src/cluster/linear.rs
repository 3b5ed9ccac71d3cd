//! Baseline clusterers over flattened relation matrices.
//!
//! Both treat each matrix as a point in `n²`-dimensional space under the L1
//! metric and ignore the poset entirely, which makes them a useful yardstick
//! for [`super::GraphDistanceClusterer`].

use std::{collections::VecDeque, num::NonZeroUsize, sync::Arc};

use tracing::{info, instrument, warn};

use crate::{
    Result,
    builder::{DEFAULT_PARALLEL_THRESHOLD, ExecutionStrategy},
    datasource::MatrixSource,
    error::HasseError,
    execution::Parallelism,
    matrix::RelationMatrix,
    reach::EntityId,
    result::{ClusterId, ClusteringResult},
};

use super::union_find::DisjointSet;

/// Radius used by the command-line baseline when none is given.
pub const DEFAULT_EPS: f64 = 2.0;
/// Cut height used by the command-line baseline when none is given.
pub const DEFAULT_CUT_HEIGHT: f64 = 3.0;

/// Density-based clustering with an L1 neighbourhood.
///
/// A point whose closed neighbourhood (itself included) holds at least
/// `min_samples` points is a core point. Clusters grow from core points in
/// entity order; border points join the first cluster that reaches them and
/// everything else is noise.
///
/// # Examples
/// ```
/// use std::num::NonZeroUsize;
/// use hasse_core::{DensityClusterer, MatrixFamily, RelationMatrix};
///
/// let m = |v: u32| RelationMatrix::from_rows(&[[0, v], [0, 0]]);
/// let family = MatrixFamily::try_new("points", vec![m(0)?, m(1)?, m(9)?])?;
/// let min_samples = NonZeroUsize::new(2).ok_or("zero")?;
/// let clustering = DensityClusterer::new(1.0, min_samples)?.cluster(&family)?;
///
/// assert_eq!(clustering.cluster_count(), 1);
/// assert_eq!(clustering.noise().len(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DensityClusterer {
    eps: f64,
    min_samples: NonZeroUsize,
    strategy: ExecutionStrategy,
    parallel_threshold: usize,
}

impl DensityClusterer {
    /// Creates a clusterer with neighbourhood radius `eps`.
    ///
    /// # Errors
    /// Returns [`HasseError::InvalidParameter`] when `eps` is negative or not
    /// finite.
    pub fn new(eps: f64, min_samples: NonZeroUsize) -> Result<Self> {
        if !eps.is_finite() || eps < 0.0 {
            return Err(HasseError::InvalidParameter {
                name: "eps",
                reason: Arc::from(format!("must be a finite non-negative radius, got {eps}")),
            });
        }
        Ok(Self {
            eps,
            min_samples,
            strategy: ExecutionStrategy::Auto,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        })
    }

    /// Sets the strategy used for the neighbourhood queries.
    #[must_use]
    pub fn with_execution_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Neighbourhood radius.
    #[rustfmt::skip]
    #[must_use]
    pub fn eps(&self) -> f64 { self.eps }

    /// Minimum closed-neighbourhood size of a core point.
    #[rustfmt::skip]
    #[must_use]
    pub fn min_samples(&self) -> NonZeroUsize { self.min_samples }

    /// Clusters every matrix in `source`.
    ///
    /// # Errors
    /// Returns [`HasseError::EmptySource`], [`HasseError::DimensionMismatch`]
    /// or [`HasseError::DataSource`] when the points cannot be read, and
    /// [`HasseError::BackendUnavailable`] for an unsupported strategy.
    #[instrument(
        name = "core.density_clusters",
        err,
        skip(self, source),
        fields(data_source = %source.name(), eps = self.eps, min_samples = self.min_samples.get()),
    )]
    pub fn cluster<S: MatrixSource + ?Sized>(&self, source: &S) -> Result<DensityClustering> {
        let points = load_points(source)?;
        let mode = Parallelism::resolve(self.strategy, points.len(), self.parallel_threshold)?;
        let neighbourhoods: Vec<Vec<usize>> = mode.map(0..points.len(), |i| {
            let Some(centre) = points.get(i) else {
                return Vec::new();
            };
            points
                .iter()
                .enumerate()
                .filter(|(_, other)| within(centre, other, self.eps))
                .map(|(j, _)| j)
                .collect()
        });
        let core: Vec<bool> = neighbourhoods
            .iter()
            .map(|neighbours| neighbours.len() >= self.min_samples.get())
            .collect();

        let mut labels: Vec<Option<ClusterId>> = vec![None; points.len()];
        let mut next = 0_usize;
        for seed in 0..points.len() {
            let labelled = labels.get(seed).is_some_and(Option::is_some);
            if labelled || !core.get(seed).copied().unwrap_or(false) {
                continue;
            }
            let id = ClusterId::new(next as u64);
            next += 1;
            expand_cluster(seed, id, &neighbourhoods, &core, &mut labels);
        }

        let clustering = DensityClustering {
            labels,
            core,
            cluster_count: next,
        };
        info!(
            clusters = clustering.cluster_count,
            noise = clustering.noise().len(),
            mode = mode.as_str(),
            "density clustering finished"
        );
        Ok(clustering)
    }
}

fn within(a: &RelationMatrix, b: &RelationMatrix, eps: f64) -> bool {
    a.manhattan_distance(b)
        .is_some_and(|distance| u64_to_f64(distance) <= eps)
}

/// Breadth-first growth from a core point; only core points extend the
/// frontier.
fn expand_cluster(
    seed: usize,
    id: ClusterId,
    neighbourhoods: &[Vec<usize>],
    core: &[bool],
    labels: &mut [Option<ClusterId>],
) {
    let mut frontier = VecDeque::from([seed]);
    if let Some(slot) = labels.get_mut(seed) {
        *slot = Some(id);
    }
    while let Some(point) = frontier.pop_front() {
        if !core.get(point).copied().unwrap_or(false) {
            continue;
        }
        for &neighbour in neighbourhoods.get(point).map_or(&[][..], Vec::as_slice) {
            let Some(slot) = labels.get_mut(neighbour) else {
                continue;
            };
            if slot.is_none() {
                *slot = Some(id);
                frontier.push_back(neighbour);
            }
        }
    }
}

/// Outcome of [`DensityClusterer::cluster`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DensityClustering {
    labels: Vec<Option<ClusterId>>,
    core: Vec<bool>,
    cluster_count: usize,
}

impl DensityClustering {
    /// Cluster of every point in input order; `None` marks noise.
    #[rustfmt::skip]
    #[must_use]
    pub fn labels(&self) -> &[Option<ClusterId>] { &self.labels }

    /// Number of clusters found, noise excluded.
    #[rustfmt::skip]
    #[must_use]
    pub fn cluster_count(&self) -> usize { self.cluster_count }

    /// Whether `entity` is a core point.
    #[must_use]
    pub fn is_core(&self, entity: EntityId) -> bool {
        self.core.get(entity.get()).copied().unwrap_or(false)
    }

    /// Points assigned to no cluster.
    #[must_use]
    pub fn noise(&self) -> Vec<EntityId> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, label)| label.is_none())
            .map(|(entity, _)| EntityId::new(entity))
            .collect()
    }

    /// Members of `cluster`, ascending.
    #[must_use]
    pub fn members(&self, cluster: ClusterId) -> Vec<EntityId> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, label)| **label == Some(cluster))
            .map(|(entity, _)| EntityId::new(entity))
            .collect()
    }
}

/// Average-linkage (UPGMA) agglomeration over the L1 distance matrix.
///
/// Ties between equally close pairs go to the pair with the lowest slot
/// indices, so the dendrogram is deterministic.
#[derive(Debug, Clone, Copy)]
pub struct AverageLinkage {
    strategy: ExecutionStrategy,
    parallel_threshold: usize,
}

impl Default for AverageLinkage {
    fn default() -> Self {
        Self {
            strategy: ExecutionStrategy::Auto,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl AverageLinkage {
    /// Creates an agglomerator with the automatic strategy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the strategy used for the pairwise distance matrix.
    #[must_use]
    pub fn with_execution_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Builds the full dendrogram of `source`.
    ///
    /// # Errors
    /// Returns [`HasseError::EmptySource`], [`HasseError::DimensionMismatch`]
    /// or [`HasseError::DataSource`] when the points cannot be read, and
    /// [`HasseError::BackendUnavailable`] for an unsupported strategy.
    #[instrument(
        name = "core.average_linkage",
        err,
        skip(self, source),
        fields(data_source = %source.name(), points = source.len()),
    )]
    pub fn linkage<S: MatrixSource + ?Sized>(&self, source: &S) -> Result<Dendrogram> {
        let points = load_points(source)?;
        let n = points.len();
        let mode = Parallelism::resolve(self.strategy, n, self.parallel_threshold)?;
        let mut distances: Vec<Vec<f64>> = mode.map(0..n, |i| {
            let Some(row) = points.get(i) else {
                return Vec::new();
            };
            points
                .iter()
                .map(|other| row.manhattan_distance(other).map_or(f64::INFINITY, u64_to_f64))
                .collect()
        });

        // Slot `i` holds the live cluster that absorbed point `i`.
        let mut slots: Vec<Option<(usize, usize)>> = (0..n).map(|i| Some((i, 1))).collect();
        let mut steps = Vec::with_capacity(n.saturating_sub(1));
        while let Some((a, b, height)) = closest_slots(&slots, &distances) {
            let (Some((id_a, size_a)), Some((id_b, size_b))) = (slot(&slots, a), slot(&slots, b))
            else {
                break;
            };
            let size = size_a + size_b;
            steps.push(LinkageStep {
                left: id_a.min(id_b),
                right: id_a.max(id_b),
                height,
                size,
            });
            average_into(&mut distances, &slots, (a, size_a), (b, size_b));
            if let Some(entry) = slots.get_mut(a) {
                *entry = Some((n + steps.len() - 1, size));
            }
            if let Some(entry) = slots.get_mut(b) {
                *entry = None;
            }
        }

        info!(points = n, merges = steps.len(), "average linkage finished");
        Ok(Dendrogram {
            observations: n,
            steps,
        })
    }
}

fn slot(slots: &[Option<(usize, usize)>], index: usize) -> Option<(usize, usize)> {
    slots.get(index).copied().flatten()
}

/// First live slot pair `(a, b)`, `a < b`, with the strictly smallest distance.
fn closest_slots(
    slots: &[Option<(usize, usize)>],
    distances: &[Vec<f64>],
) -> Option<(usize, usize, f64)> {
    let live: Vec<usize> = (0..slots.len()).filter(|&i| slot(slots, i).is_some()).collect();
    let mut best: Option<(usize, usize, f64)> = None;
    for (position, &a) in live.iter().enumerate() {
        for &b in live.iter().skip(position + 1) {
            let Some(&distance) = distances.get(a).and_then(|row| row.get(b)) else {
                continue;
            };
            if best.is_none_or(|(_, _, current)| distance < current) {
                best = Some((a, b, distance));
            }
        }
    }
    best
}

/// Rewrites row and column `a` with the size-weighted mean of `a` and `b`.
fn average_into(
    distances: &mut [Vec<f64>],
    slots: &[Option<(usize, usize)>],
    (a, size_a): (usize, usize),
    (b, size_b): (usize, usize),
) {
    let total = usize_to_f64(size_a + size_b);
    let weight_a = usize_to_f64(size_a) / total;
    let weight_b = usize_to_f64(size_b) / total;
    for other in 0..slots.len() {
        if other == a || other == b || slot(slots, other).is_none() {
            continue;
        }
        let to_a = distances.get(a).and_then(|row| row.get(other)).copied();
        let to_b = distances.get(b).and_then(|row| row.get(other)).copied();
        let (Some(to_a), Some(to_b)) = (to_a, to_b) else {
            continue;
        };
        let merged = weight_a * to_a + weight_b * to_b;
        if let Some(cell) = distances.get_mut(a).and_then(|row| row.get_mut(other)) {
            *cell = merged;
        }
        if let Some(cell) = distances.get_mut(other).and_then(|row| row.get_mut(a)) {
            *cell = merged;
        }
    }
}

/// One agglomeration step.
///
/// Identifiers below the observation count are points; identifier
/// `observations + k` is the cluster created by step `k`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkageStep {
    /// Lower identifier of the merged pair.
    pub left: usize,
    /// Higher identifier of the merged pair.
    pub right: usize,
    /// Average L1 distance between the two clusters.
    pub height: f64,
    /// Number of points in the merged cluster.
    pub size: usize,
}

/// Merge history produced by [`AverageLinkage::linkage`].
#[derive(Debug, Clone, PartialEq)]
pub struct Dendrogram {
    observations: usize,
    steps: Vec<LinkageStep>,
}

impl Dendrogram {
    /// Number of clustered points.
    #[rustfmt::skip]
    #[must_use]
    pub fn observations(&self) -> usize { self.observations }

    /// Steps in merge order; heights never decrease.
    #[rustfmt::skip]
    #[must_use]
    pub fn steps(&self) -> &[LinkageStep] { &self.steps }

    /// Flat clusters whose cophenetic distance is at most `height`.
    ///
    /// # Errors
    /// Returns [`HasseError::InvalidParameter`] when `height` is NaN.
    pub fn cut(&self, height: f64) -> Result<ClusteringResult> {
        if height.is_nan() {
            warn!("cut height is NaN");
            return Err(HasseError::InvalidParameter {
                name: "height",
                reason: Arc::from("must be a number"),
            });
        }
        let mut set = DisjointSet::new(self.observations);
        let mut leaf_of: Vec<usize> = (0..self.observations).collect();
        for step in &self.steps {
            let left = leaf_of.get(step.left).copied().unwrap_or(step.left);
            let right = leaf_of.get(step.right).copied().unwrap_or(step.right);
            leaf_of.push(left);
            if step.height <= height {
                set.union(left, right);
            }
        }
        Ok(ClusteringResult::from_labels(
            (0..self.observations).map(|point| set.find(point)),
        ))
    }
}

/// Reads every point of `source`, rejecting empty or ragged families.
fn load_points<S: MatrixSource + ?Sized>(source: &S) -> Result<Vec<&RelationMatrix>> {
    if source.is_empty() {
        warn!(data_source = source.name(), "data source is empty, returning error");
        return Err(HasseError::EmptySource {
            data_source: Arc::from(source.name()),
        });
    }
    let points = source
        .matrices()
        .map_err(|error| HasseError::data_source(source.name(), error))?;
    let expected = points.first().map_or(0, |first| first.order());
    if let Some(odd) = points.iter().find(|point| point.order() != expected) {
        warn!(expected, actual = odd.order(), "matrix order mismatch");
        return Err(HasseError::DimensionMismatch {
            expected,
            actual: odd.order(),
        });
    }
    Ok(points)
}

fn u64_to_f64(value: u64) -> f64 {
    value as f64
}

fn usize_to_f64(value: usize) -> f64 {
    value as f64
}
