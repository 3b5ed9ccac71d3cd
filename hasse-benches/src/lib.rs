//! Benchmark support crate for hasse.
//!
//! Provides seeded synthetic matrix families and parameter types used by the
//! Criterion benchmarks for poset construction, transitive reduction,
//! clustering and cover search.

pub mod error;
pub mod params;
pub mod synthetic;
