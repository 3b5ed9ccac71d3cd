//! Shared test utilities used across the hasse crates.
//!
//! [`tracing::RecordingLayer`] captures spans and events so suites can
//! assert instrumentation, and [`ci`] sizes the property suites.

pub mod ci;
pub mod tracing;
