//! Clustering of entities over the reduced poset, plus L1 baselines over the
//! raw matrices.

mod bridge_cache;
mod graph_distance;
mod linear;
#[cfg(test)]
mod property;
mod union_find;

pub use graph_distance::{
    Bridge, ClusterRecord, ClusteringStatus, GraphClustering, GraphDistanceClusterer,
    LinkageRecord, bridge,
};
pub use linear::{
    AverageLinkage, DEFAULT_CUT_HEIGHT, DEFAULT_EPS, Dendrogram, DensityClusterer,
    DensityClustering, LinkageStep,
};
