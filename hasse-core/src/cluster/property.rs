//! Property tests for the merge loop and the L1 baselines.
//!
//! Every generated family doubles as its own entity set, so each entity
//! matches a node of the reduced graph.

use proptest::{prelude::*, test_runner::TestCaseError};
use rand::{SeedableRng, rngs::SmallRng};
use rstest::rstest;

use crate::{
    CoverageRule, ExecutionStrategy, GraphView, MatrixFamily, ReachabilityIndex, ShortestPaths,
    poset::property::{
        strategies::{generate_fixture, poset_fixture_strategy},
        types::{FamilyShape, PosetFixture},
    },
    test_utils::{reduced, suite_proptest_config},
};

use super::{AverageLinkage, ClusteringStatus, GraphDistanceClusterer};

fn run_merge_invariants(fixture: &PosetFixture) -> Result<(), TestCaseError> {
    let entities = MatrixFamily::try_new("fixture", fixture.matrices.clone())
        .map_err(|err| TestCaseError::fail(err.to_string()))?;
    let graph = reduced(&entities);
    let index = ReachabilityIndex::with_entities(&graph, &entities, CoverageRule::Descendants)
        .map_err(|err| TestCaseError::fail(err.to_string()))?;
    let paths = ShortestPaths::compute(&graph, GraphView::Directed)
        .map_err(|err| TestCaseError::fail(err.to_string()))?;
    let clustering = GraphDistanceClusterer::new()
        .with_execution_strategy(ExecutionStrategy::Sequential)
        .cluster(&index, &paths)
        .map_err(|err| TestCaseError::fail(err.to_string()))?;

    let n = entities.as_slice().len();
    prop_assert!(clustering.linkage().len() < n.max(1));
    let remaining: usize = clustering.active().map(|record| record.size()).sum();
    prop_assert_eq!(remaining, n, "active clusters must partition the entities");

    for step in clustering.linkage() {
        let merged = clustering
            .records()
            .iter()
            .find(|record| record.merged_from() == Some((step.left, step.right)))
            .ok_or_else(|| TestCaseError::fail("linkage step without arena record"))?;
        prop_assert_eq!(merged.size(), step.size);
        for input in [step.left, step.right] {
            let record = clustering
                .record(input)
                .ok_or_else(|| TestCaseError::fail("merged input missing"))?;
            prop_assert!(!record.is_active());
            prop_assert!(
                index.reaches(record.representative(), step.representative),
                "bridge {} is not below representative {}",
                step.representative,
                record.representative()
            );
        }
    }
    if clustering.status() == ClusteringStatus::Complete && n > 1 {
        prop_assert_eq!(clustering.linkage().last().map(|step| step.size), Some(n));
    }
    Ok(())
}

fn run_dendrogram_invariants(fixture: &PosetFixture) -> Result<(), TestCaseError> {
    let points = MatrixFamily::try_new("fixture", fixture.matrices.clone())
        .map_err(|err| TestCaseError::fail(err.to_string()))?;
    let dendrogram = AverageLinkage::new()
        .linkage(&points)
        .map_err(|err| TestCaseError::fail(err.to_string()))?;
    let n = points.as_slice().len();
    prop_assert_eq!(dendrogram.steps().len(), n - 1);
    for pair in dendrogram.steps().windows(2) {
        prop_assert!(pair[1].height + 1e-9 >= pair[0].height, "heights must not decrease");
    }
    let everything = dendrogram
        .cut(f64::INFINITY)
        .map_err(|err| TestCaseError::fail(err.to_string()))?;
    prop_assert_eq!(everything.cluster_count(), 1);
    Ok(())
}

proptest! {
    #![proptest_config(suite_proptest_config(64))]

    #[test]
    fn merge_loop_invariants(fixture in poset_fixture_strategy()) {
        run_merge_invariants(&fixture)?;
    }

    #[test]
    fn average_linkage_is_monotone(fixture in poset_fixture_strategy()) {
        run_dendrogram_invariants(&fixture)?;
    }
}

#[rstest]
#[case::duplicated_42(FamilyShape::Duplicated, 42)]
#[case::chains_7777(FamilyShape::Chains, 7777)]
#[case::weighted_999(FamilyShape::Weighted, 999)]
fn merge_invariants_hold_for_seeded_families(#[case] shape: FamilyShape, #[case] seed: u64) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let fixture = generate_fixture(shape, &mut rng);
    run_merge_invariants(&fixture).expect("merge invariants must hold");
}
