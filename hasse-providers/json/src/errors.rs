use std::{io, path::PathBuf};

use hasse_core::{DataSourceError, HasseError, MatrixError};
use thiserror::Error;

/// Failures raised while reading JSON inputs.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum JsonProviderError {
    /// The file could not be opened or read.
    #[error("failed to read `{path}`: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The document is not valid JSON or does not fit the expected layout.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A relation-count key of a grouped universe is not an integer.
    #[error("universe key `{key}` is not a relation count")]
    InvalidGroupKey {
        /// The offending key.
        key: String,
    },
    /// A matrix was not square or was empty.
    #[error("matrix {index} is malformed: {source}")]
    Matrix {
        /// Position of the matrix in the document.
        index: usize,
        /// Why the matrix was rejected.
        #[source]
        source: MatrixError,
    },
    /// The matrices of one document do not share an order.
    #[error(transparent)]
    Family(#[from] DataSourceError),
    /// An episode record disagrees with the event order of the file.
    #[error("episode {index} does not track the same events as the first episode")]
    EventMismatch {
        /// Position of the record.
        index: usize,
    },
    /// An episode position list is not a list of 1-based term indices.
    #[error("episode {index} has positions for `{event}` that are not term indices")]
    InvalidPositions {
        /// Position of the record.
        index: usize,
        /// Event whose positions were rejected.
        event: String,
    },
    /// The document contained no entries.
    #[error("document contains no entries")]
    Empty,
    /// The core library rejected the decoded data.
    #[error(transparent)]
    Core(#[from] HasseError),
}
