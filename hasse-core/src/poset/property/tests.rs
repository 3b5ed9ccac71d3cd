//! Property-test runners for poset construction and reduction.

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rstest::rstest;

use crate::test_utils::suite_proptest_config;

use super::strategies::{generate_fixture, poset_fixture_strategy};
use super::structural::{run_strategy_agreement_property, run_structural_property};
use super::types::FamilyShape;

proptest! {
    #![proptest_config(suite_proptest_config(128))]

    #[test]
    fn poset_structural_invariants(fixture in poset_fixture_strategy()) {
        run_structural_property(&fixture)?;
    }

    #[test]
    fn poset_strategy_agreement(fixture in poset_fixture_strategy()) {
        run_strategy_agreement_property(&fixture)?;
    }
}

#[rstest]
#[case::random_42(FamilyShape::Random, 42)]
#[case::duplicated_42(FamilyShape::Duplicated, 42)]
#[case::duplicated_999(FamilyShape::Duplicated, 999)]
#[case::chains_42(FamilyShape::Chains, 42)]
#[case::chains_7777(FamilyShape::Chains, 7777)]
#[case::weighted_999(FamilyShape::Weighted, 999)]
fn structural_invariants_hold_for_seeded_families(#[case] shape: FamilyShape, #[case] seed: u64) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let fixture = generate_fixture(shape, &mut rng);
    run_structural_property(&fixture).expect("structural invariants must hold");
}
