//! Flat cluster assignments shared by every clusterer.
//!
//! Provides the per-entity assignment vector reported once clustering stops,
//! relabelled so identifiers are contiguous from zero.

use std::collections::HashMap;

use crate::reach::EntityId;

/// Flat clustering of entities: one [`ClusterId`] per entity, in entity
/// order, with identifiers contiguous from zero.
///
/// # Examples
/// ```
/// use hasse_core::{ClusterId, ClusteringResult, EntityId};
///
/// let result = ClusteringResult::from_labels([7, 7, 3]);
/// assert_eq!(result.assignments(), &[ClusterId::new(0), ClusterId::new(0), ClusterId::new(1)]);
/// assert_eq!(result.cluster_count(), 2);
/// assert_eq!(result.members(ClusterId::new(1)), vec![EntityId::new(2)]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusteringResult {
    assignments: Vec<ClusterId>,
    cluster_count: usize,
}

impl ClusteringResult {
    /// Relabels arbitrary labels to contiguous identifiers in order of first
    /// appearance.
    pub fn from_labels<L, I>(labels: I) -> Self
    where
        L: Eq + std::hash::Hash,
        I: IntoIterator<Item = L>,
    {
        let mut relabel: HashMap<L, ClusterId> = HashMap::new();
        let assignments: Vec<ClusterId> = labels
            .into_iter()
            .map(|label| {
                let next = ClusterId::new(relabel.len() as u64);
                *relabel.entry(label).or_insert(next)
            })
            .collect();
        Self {
            cluster_count: relabel.len(),
            assignments,
        }
    }

    /// Returns the assignments in entity order.
    #[must_use]
    pub fn assignments(&self) -> &[ClusterId] {
        &self.assignments
    }

    /// Counts how many distinct clusters exist within the assignments.
    #[rustfmt::skip]
    #[must_use]
    pub fn cluster_count(&self) -> usize { self.cluster_count }

    /// Entities assigned to `cluster`, ascending.
    #[must_use]
    pub fn members(&self, cluster: ClusterId) -> Vec<EntityId> {
        self.assignments
            .iter()
            .enumerate()
            .filter(|(_, id)| **id == cluster)
            .map(|(entity, _)| EntityId::new(entity))
            .collect()
    }
}

/// Identifier assigned to a cluster.
///
/// # Examples
/// ```
/// use hasse_core::ClusterId;
///
/// let id = ClusterId::new(4);
/// assert_eq!(id.get(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(u64);

impl ClusterId {
    /// Creates a new cluster identifier.
    #[rustfmt::skip]
    #[must_use]
    pub const fn new(id: u64) -> Self { Self(id) }

    /// Returns the underlying numeric identifier.
    #[rustfmt::skip]
    #[must_use]
    pub const fn get(self) -> u64 { self.0 }
}

impl std::fmt::Display for ClusterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_labels_relabels_in_first_appearance_order() {
        let result = ClusteringResult::from_labels(["b", "a", "b", "c"]);
        let raw: Vec<u64> = result.assignments().iter().map(|id| id.get()).collect();
        assert_eq!(raw, vec![0, 1, 0, 2]);
        assert_eq!(result.cluster_count(), 3);
    }

    #[test]
    fn sparse_labels_become_contiguous_from_zero() {
        let result = ClusteringResult::from_labels([40_u64, 7, 40, 1_000]);
        let max = result.assignments().iter().map(|id| id.get()).max();
        assert_eq!(max, Some(2));
        assert_eq!(result.cluster_count(), 3);
        assert_eq!(result.members(ClusterId::new(0)), vec![EntityId::new(0), EntityId::new(2)]);
    }

    #[test]
    fn empty_labels_yield_no_clusters() {
        let result = ClusteringResult::from_labels(Vec::<u64>::new());
        assert!(result.assignments().is_empty());
        assert_eq!(result.cluster_count(), 0);
    }
}
