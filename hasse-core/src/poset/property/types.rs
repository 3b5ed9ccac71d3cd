//! Fixture types for poset property tests.

use test_strategy::Arbitrary;

use crate::RelationMatrix;

/// Shape of the generated matrix family.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Arbitrary)]
pub(crate) enum FamilyShape {
    /// Independent random 0/1 matrices.
    Random,
    /// Random matrices with many exact duplicates.
    Duplicated,
    /// Nested matrices forming long chains.
    Chains,
    /// Small-integer cells instead of 0/1.
    Weighted,
}

/// Generated family plus the context needed to diagnose failures.
#[derive(Clone, Debug)]
pub(crate) struct PosetFixture {
    /// Matrices fed to the builder.
    pub matrices: Vec<RelationMatrix>,
    /// Shape used during generation.
    pub shape: FamilyShape,
}
