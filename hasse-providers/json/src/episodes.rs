//! Episode documents: stored relation matrices plus per-event positions.

use std::{collections::BTreeSet, fs::File, io::BufReader, io::Read, path::Path};

use hasse_core::{Episode, EpisodeFamily, EventOrder};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
    errors::JsonProviderError,
    universe::{source_name, to_matrix},
};

#[derive(Deserialize)]
struct EpisodeRecord {
    #[serde(rename = "M_c")]
    matrix: Vec<Vec<u32>>,
    #[serde(rename = "P")]
    positions: Map<String, Value>,
}

/// How stored episode matrices are post-processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EpisodeOptions {
    strip_diagonal: bool,
}

impl EpisodeOptions {
    /// Default options: matrices are kept as stored.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            strip_diagonal: false,
        }
    }

    /// Zeroes every stored diagonal so files written with a unit diagonal
    /// match universes without one.
    #[must_use]
    pub const fn with_strip_diagonal(mut self, enabled: bool) -> Self {
        self.strip_diagonal = enabled;
        self
    }

    /// Whether diagonals are stripped.
    #[must_use]
    pub const fn strip_diagonal(&self) -> bool {
        self.strip_diagonal
    }
}

/// Parses an episode family from a JSON string.
///
/// # Errors
/// Returns [`JsonProviderError::Json`] for malformed documents,
/// [`JsonProviderError::Empty`] for an empty list,
/// [`JsonProviderError::EventMismatch`] when a record tracks different
/// events than the first, [`JsonProviderError::InvalidPositions`] for
/// position lists that are not positive integers,
/// [`JsonProviderError::Matrix`] for malformed matrices and
/// [`JsonProviderError::Core`] when a matrix order differs from the event
/// count.
///
/// # Examples
/// ```
/// use hasse_core::MatrixSource;
/// use hasse_providers_json::{EpisodeOptions, episodes_from_str};
///
/// let json = r#"[
///     { "M_c": [[1, 1], [0, 1]], "P": { "a": [1], "b": [2] } },
///     { "M_c": [[1, 0], [0, 1]], "P": { "a": [], "b": [1] } }
/// ]"#;
/// let options = EpisodeOptions::new().with_strip_diagonal(true);
/// let family = episodes_from_str("sessions", json, options)?;
/// assert_eq!(family.len(), 2);
/// assert_eq!(family.events().events()[1].as_ref(), "b");
/// assert_eq!(family.matrix(0)?.relation_count(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn episodes_from_str(
    name: &str,
    json: &str,
    options: EpisodeOptions,
) -> Result<EpisodeFamily, JsonProviderError> {
    build(name, serde_json::from_str(json)?, options)
}

/// Parses an episode family from a reader.
///
/// # Errors
/// See [`episodes_from_str`].
pub fn episodes_from_reader<R: Read>(
    name: &str,
    reader: R,
    options: EpisodeOptions,
) -> Result<EpisodeFamily, JsonProviderError> {
    build(name, serde_json::from_reader(reader)?, options)
}

/// Loads an episode file, naming the family after the file stem.
///
/// # Errors
/// Returns [`JsonProviderError::Io`] when the file cannot be opened, plus
/// every error of [`episodes_from_str`].
pub fn load_episodes(
    path: impl AsRef<Path>,
    options: EpisodeOptions,
) -> Result<EpisodeFamily, JsonProviderError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| JsonProviderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    episodes_from_reader(&source_name(path), BufReader::new(file), options)
}

fn build(
    name: &str,
    records: Vec<EpisodeRecord>,
    options: EpisodeOptions,
) -> Result<EpisodeFamily, JsonProviderError> {
    let Some(first) = records.first() else {
        return Err(JsonProviderError::Empty);
    };
    let events = EventOrder::try_new(first.positions.keys())?;
    let episodes = records
        .iter()
        .enumerate()
        .map(|(index, record)| decode(index, record, &events))
        .collect::<Result<Vec<_>, _>>()?;
    let family = EpisodeFamily::try_new(name, events, episodes)?;
    Ok(if options.strip_diagonal {
        family.without_diagonal()
    } else {
        family
    })
}

fn decode(
    index: usize,
    record: &EpisodeRecord,
    events: &EventOrder,
) -> Result<Episode, JsonProviderError> {
    if record.positions.len() != events.len() {
        return Err(JsonProviderError::EventMismatch { index });
    }
    let mut positions = vec![BTreeSet::new(); events.len()];
    for (event, value) in &record.positions {
        let slot = events
            .position(event)
            .and_then(|row| positions.get_mut(row))
            .ok_or(JsonProviderError::EventMismatch { index })?;
        *slot = term_indices(value).ok_or_else(|| JsonProviderError::InvalidPositions {
            index,
            event: event.clone(),
        })?;
    }
    let matrix = to_matrix(index, &record.matrix)?;
    Ok(Episode::from_parts(matrix, positions)?)
}

/// 1-based term indices; `None` unless every entry is a positive integer.
fn term_indices(value: &Value) -> Option<BTreeSet<usize>> {
    value
        .as_array()?
        .iter()
        .map(|entry| {
            entry
                .as_u64()
                .filter(|&term| term > 0)
                .and_then(|term| usize::try_from(term).ok())
        })
        .collect()
}
