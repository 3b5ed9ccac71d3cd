//! Strategy builders for poset property tests.
//!
//! Each generator draws a family of square matrices from a seeded
//! [`SmallRng`] so failing cases can be replayed from the shape and seed.

use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::RelationMatrix;

use super::types::{FamilyShape, PosetFixture};

/// Matrix order used by every generated family.
const MIN_ORDER: usize = 2;
const MAX_ORDER: usize = 4;
/// Family size bounds.
const MIN_MATRICES: usize = 2;
const MAX_MATRICES: usize = 24;

pub(crate) fn poset_fixture_strategy() -> impl Strategy<Value = PosetFixture> {
    (any::<FamilyShape>(), any::<u64>()).prop_map(|(shape, seed)| {
        let mut rng = SmallRng::seed_from_u64(seed);
        generate_fixture(shape, &mut rng)
    })
}

/// Generates a fixture for an explicit shape, for targeted rstest cases.
pub(crate) fn generate_fixture(shape: FamilyShape, rng: &mut SmallRng) -> PosetFixture {
    let order = rng.gen_range(MIN_ORDER..=MAX_ORDER);
    let count = rng.gen_range(MIN_MATRICES..=MAX_MATRICES);
    let matrices = match shape {
        FamilyShape::Random => (0..count).map(|_| random_matrix(rng, order, 1)).collect(),
        FamilyShape::Weighted => (0..count).map(|_| random_matrix(rng, order, 3)).collect(),
        FamilyShape::Duplicated => {
            let pool: Vec<RelationMatrix> = (0..count.div_ceil(3))
                .map(|_| random_matrix(rng, order, 1))
                .collect();
            (0..count)
                .map(|_| pool[rng.gen_range(0..pool.len())].clone())
                .collect()
        }
        FamilyShape::Chains => chains(rng, order, count),
    };
    PosetFixture { matrices, shape }
}

fn random_matrix(rng: &mut SmallRng, order: usize, max_cell: u32) -> RelationMatrix {
    RelationMatrix::from_fn(order, |_, _| rng.gen_range(0..=max_cell)).expect("order >= 2")
}

/// Grows matrices by switching on one extra cell at a time, restarting from
/// a fresh random base now and then.
fn chains(rng: &mut SmallRng, order: usize, count: usize) -> Vec<RelationMatrix> {
    let mut out = Vec::with_capacity(count);
    let mut cells = vec![0_u32; order * order];
    for _ in 0..count {
        if rng.gen_bool(0.2) {
            cells.iter_mut().for_each(|cell| *cell = u32::from(rng.gen_bool(0.3)));
        } else {
            let slot = rng.gen_range(0..cells.len());
            cells[slot] = 1;
        }
        out.push(RelationMatrix::new(order, cells.clone()).expect("cells are square"));
    }
    out
}
