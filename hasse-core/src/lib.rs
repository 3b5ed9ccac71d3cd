//! Hasse core library.
//!
//! Builds dominance posets over square relation matrices, reduces them to
//! their Hasse diagrams and analyses the result: reachability coverage,
//! agglomerative clustering by graph distance, set-cover search and flat
//! baselines over matrix cells.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod cluster;
mod cover;
mod datasource;
mod episode;
mod error;
mod execution;
mod hasse;
mod matrix;
mod poset;
mod reach;
mod result;
#[cfg(test)]
mod test_utils;

pub use crate::{
    builder::{DEFAULT_PARALLEL_THRESHOLD, ExecutionStrategy, HasseBuilder},
    cluster::{
        AverageLinkage, Bridge, ClusterRecord, ClusteringStatus, DEFAULT_CUT_HEIGHT, DEFAULT_EPS,
        Dendrogram, DensityClusterer, DensityClustering, GraphClustering, GraphDistanceClusterer,
        LinkageRecord, LinkageStep, bridge,
    },
    cover::{
        CoverStatus, CoverageCombo, CoverageTarget, ExhaustiveCover, ExhaustiveSearch,
        GreedyCover, GreedyStep, SetCoverSearcher,
    },
    datasource::{MatrixFamily, MatrixSource},
    episode::{Episode, EpisodeFamily, EventOrder, consensus_matrix},
    error::{
        DataSourceError, DataSourceErrorCode, HasseError, HasseErrorCode, MatrixError,
        MatrixErrorCode, Result,
    },
    hasse::{Hasse, PosetAnalysis},
    matrix::RelationMatrix,
    poset::{
        GraphForm, GraphView, NodeId, PosetGraph, PosetGraphBuilder, ShortestPaths,
        TransitiveReducer,
    },
    reach::{CoverageRule, EntityId, NodeStats, ReachabilityIndex},
    result::{ClusterId, ClusteringResult},
};
