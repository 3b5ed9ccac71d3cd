//! Small helpers shared across CLI tests.
//!
//! The tests write JSON inputs into a temporary directory and drive the
//! commands through the same argument parser the binary uses.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use tempfile::TempDir;

use super::{Cli, CliError, ExecutionSummary, Report, run_cli};

/// Diamond `0 > {1, 2} > 3` over order 3, plus the unrelated node 4.
pub(super) const DIAMOND: &str = r"[
    [[0, 1, 1], [0, 0, 1], [0, 0, 0]],
    [[0, 1, 1], [0, 0, 0], [0, 0, 0]],
    [[0, 1, 0], [0, 0, 1], [0, 0, 0]],
    [[0, 1, 0], [0, 0, 0], [0, 0, 0]],
    [[0, 0, 0], [0, 0, 0], [1, 0, 0]]
]";

/// Two episodes matching nodes 0 and 1 of [`DIAMOND`].
pub(super) const EPISODES: &str = r#"[
    { "M_c": [[0, 1, 1], [0, 0, 1], [0, 0, 0]], "P": { "a": [1], "b": [2], "c": [3] } },
    { "M_c": [[0, 1, 1], [0, 0, 0], [0, 0, 0]], "P": { "a": [1], "b": [2], "c": [2] } }
]"#;

pub(super) fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

pub(super) fn create_file(dir: &TempDir, name: &str, contents: &str) -> io::Result<PathBuf> {
    let path = dir.path().join(name);
    fs::write(&path, contents)?;
    Ok(path)
}

pub(super) fn arg(path: &Path) -> String {
    path.display().to_string()
}

pub(super) fn parse(args: &[&str]) -> Cli {
    let argv = std::iter::once("hasse").chain(args.iter().copied());
    match Cli::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(err) => panic!("arguments must parse: {err}"),
    }
}

pub(super) fn run(args: &[&str]) -> Result<ExecutionSummary, CliError> {
    run_cli(parse(args))
}

pub(super) fn run_expecting_error(args: &[&str], panic_msg: &str) -> CliError {
    match run(args) {
        Ok(_) => panic!("{panic_msg}"),
        Err(err) => err,
    }
}

pub(super) fn report(args: &[&str]) -> Report {
    match run(args) {
        Ok(summary) => summary.report,
        Err(err) => panic!("command must succeed: {err}"),
    }
}
