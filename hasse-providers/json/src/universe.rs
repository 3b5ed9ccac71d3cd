//! Poset universe documents.

use std::{collections::BTreeMap, fs::File, io::BufReader, io::Read, path::Path};

use hasse_core::{MatrixFamily, RelationMatrix};
use serde::Deserialize;

use crate::errors::JsonProviderError;

type Rows = Vec<Vec<u32>>;

#[derive(Deserialize)]
#[serde(untagged)]
enum UniverseDocument {
    Flat(Vec<Rows>),
    Grouped(BTreeMap<String, Vec<Rows>>),
}

impl UniverseDocument {
    /// Matrices in file order; groups are visited by ascending relation
    /// count.
    fn into_rows(self) -> Result<Vec<Rows>, JsonProviderError> {
        match self {
            Self::Flat(matrices) => Ok(matrices),
            Self::Grouped(groups) => {
                let mut keyed = groups
                    .into_iter()
                    .map(|(key, matrices)| match key.trim().parse::<u64>() {
                        Ok(count) => Ok((count, matrices)),
                        Err(_) => Err(JsonProviderError::InvalidGroupKey { key }),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                keyed.sort_by_key(|(count, _)| *count);
                Ok(keyed.into_iter().flat_map(|(_, matrices)| matrices).collect())
            }
        }
    }
}

pub(crate) fn to_matrix(
    index: usize,
    rows: &[Vec<u32>],
) -> Result<RelationMatrix, JsonProviderError> {
    RelationMatrix::from_rows(rows).map_err(|source| JsonProviderError::Matrix { index, source })
}

/// Parses a universe from a JSON string.
///
/// # Errors
/// Returns [`JsonProviderError::Json`] for malformed documents,
/// [`JsonProviderError::InvalidGroupKey`] for non-numeric group keys,
/// [`JsonProviderError::Matrix`] for non-square matrices,
/// [`JsonProviderError::Family`] when orders differ and
/// [`JsonProviderError::Empty`] when no matrix is present.
///
/// # Examples
/// ```
/// use hasse_core::MatrixSource;
/// use hasse_providers_json::universe_from_str;
///
/// let grouped = r#"{ "1": [[[0, 1], [0, 0]]], "0": [[[0, 0], [0, 0]]] }"#;
/// let universe = universe_from_str("posets", grouped)?;
/// assert_eq!(universe.len(), 2);
/// assert_eq!(universe.matrix(0)?.relation_count(), 0);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn universe_from_str(name: &str, json: &str) -> Result<MatrixFamily, JsonProviderError> {
    build(name, serde_json::from_str(json)?)
}

/// Parses a universe from a reader.
///
/// # Errors
/// See [`universe_from_str`].
pub fn universe_from_reader<R: Read>(
    name: &str,
    reader: R,
) -> Result<MatrixFamily, JsonProviderError> {
    build(name, serde_json::from_reader(reader)?)
}

/// Loads a universe file, naming the family after the file stem.
///
/// # Errors
/// Returns [`JsonProviderError::Io`] when the file cannot be opened, plus
/// every error of [`universe_from_str`].
pub fn load_universe(path: impl AsRef<Path>) -> Result<MatrixFamily, JsonProviderError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| JsonProviderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    universe_from_reader(&source_name(path), BufReader::new(file))
}

pub(crate) fn source_name(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| path.display().to_string(), |stem| stem.to_string_lossy().into_owned())
}

fn build(name: &str, document: UniverseDocument) -> Result<MatrixFamily, JsonProviderError> {
    let rows = document.into_rows()?;
    if rows.is_empty() {
        return Err(JsonProviderError::Empty);
    }
    let matrices = rows
        .iter()
        .enumerate()
        .map(|(index, matrix)| to_matrix(index, matrix))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(MatrixFamily::try_new(name, matrices)?)
}
