//! Property-based tests for dominance graphs and transitive reduction.
//!
//! Random matrix families are built into dominance graphs and checked for
//! antisymmetry after deduplication, reduction idempotence, reachability
//! preservation under reduction and reflexive closure.

pub(crate) mod strategies;
mod structural;
mod tests;
pub(crate) mod types;
