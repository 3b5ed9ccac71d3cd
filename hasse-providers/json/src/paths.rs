//! Precomputed shortest-path tables.

use std::{fs::File, io::BufReader, io::Read, path::Path};

use hasse_core::{PosetGraph, ShortestPaths};

use crate::errors::JsonProviderError;

type Table = Vec<Vec<Option<u32>>>;

/// Parses a table for `graph` from a JSON string.
///
/// `rows[a][b]` is the hop count from node `a` to node `b`, or `null` when
/// `b` is unreachable.
///
/// # Errors
/// Returns [`JsonProviderError::Json`] for malformed documents and
/// [`JsonProviderError::Core`] when the table is not `n × n` for the `n`
/// nodes of `graph`.
///
/// # Examples
/// ```
/// use hasse_core::{NodeId, PosetGraph, RelationMatrix};
/// use hasse_providers_json::path_table_from_str;
///
/// let m = |v: u32| RelationMatrix::from_rows(&[[0, v], [0, 0]]);
/// let graph = PosetGraph::from_edges(vec![m(1)?, m(0)?], &[(0, 1)])?;
/// let paths = path_table_from_str(&graph, "[[0, 1], [null, 0]]")?;
/// assert_eq!(paths.distance(NodeId::new(0), NodeId::new(1)), Some(1));
/// assert_eq!(paths.distance(NodeId::new(1), NodeId::new(0)), None);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn path_table_from_str(
    graph: &PosetGraph,
    json: &str,
) -> Result<ShortestPaths, JsonProviderError> {
    let table: Table = serde_json::from_str(json)?;
    Ok(ShortestPaths::from_table(graph, table)?)
}

/// Parses a table for `graph` from a reader.
///
/// # Errors
/// See [`path_table_from_str`].
pub fn path_table_from_reader<R: Read>(
    graph: &PosetGraph,
    reader: R,
) -> Result<ShortestPaths, JsonProviderError> {
    let table: Table = serde_json::from_reader(reader)?;
    Ok(ShortestPaths::from_table(graph, table)?)
}

/// Loads a table file for `graph`.
///
/// # Errors
/// Returns [`JsonProviderError::Io`] when the file cannot be opened, plus
/// every error of [`path_table_from_str`].
pub fn load_path_table(
    graph: &PosetGraph,
    path: impl AsRef<Path>,
) -> Result<ShortestPaths, JsonProviderError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| JsonProviderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    path_table_from_reader(graph, BufReader::new(file))
}
