//! Unit tests for the JSON loaders.

mod episodes;

use std::io::Write;

use tempfile::NamedTempFile;

/// Writes `contents` to a temporary `.json` file kept alive by the handle.
pub(crate) fn json_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("hasse-")
        .suffix(".json")
        .tempfile()
        .expect("temporary file");
    file.write_all(contents.as_bytes()).expect("write fixture");
    file
}
