//! Support library for the `hasse` binary.
//!
//! Exposes argument parsing, command execution and report rendering so tests
//! can drive the commands without spawning a subprocess.

pub mod cli;
pub mod logging;
