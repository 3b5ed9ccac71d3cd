//! Error types for the hasse core library.
//!
//! Structural and input failures surface as [`HasseError`]; algorithmic dead
//! ends (no mergeable pair, no qualifying combination) are reported through
//! status values on the result types instead.

use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::builder::ExecutionStrategy;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident
                    $( { $($pattern:tt)* } )? $( ( $($tuple:tt)* ) )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(
                        Self::$ErrVariant $( { $($pattern)* } )? $( ( $($tuple)* ) )?
                            => $CodeTy::$CodeVariant,
                    )+
                }
            }
        }
    };
}

/// Problems detected while constructing a [`crate::RelationMatrix`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum MatrixError {
    /// Matrices must describe at least one element.
    #[error("relation matrices must have at least one row")]
    Empty,
    /// A row did not have as many cells as the matrix has rows.
    #[error("row {row} has {len} cells but the matrix order is {order}")]
    NotSquare {
        /// Zero-based row index that failed the check.
        row: usize,
        /// Number of cells found in the row.
        len: usize,
        /// Expected number of cells per row.
        order: usize,
    },
    /// The flat cell buffer length was not `order * order`.
    #[error("expected {expected} cells for order {order}, got {actual}")]
    CellCount {
        /// Matrix order requested by the caller.
        order: usize,
        /// Number of cells required for a square matrix of that order.
        expected: usize,
        /// Number of cells supplied.
        actual: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`MatrixError`] variants.
    enum MatrixErrorCode for MatrixError {
        /// Matrices must describe at least one element.
        Empty => Empty => "MATRIX_EMPTY",
        /// A row did not have as many cells as the matrix has rows.
        NotSquare => NotSquare { .. } => "MATRIX_NOT_SQUARE",
        /// The flat cell buffer length was not `order * order`.
        CellCount => CellCount { .. } => "MATRIX_CELL_COUNT",
    }
}

/// An error produced by [`crate::MatrixSource`] operations.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum DataSourceError {
    /// Requested index was outside the source's bounds.
    #[error("index {index} is out of bounds")]
    OutOfBounds {
        /// The requested matrix index that exceeded the source bounds.
        index: usize,
    },
    /// Two matrices in the same family had different orders.
    #[error("matrix {index} has order {actual} but the family uses order {expected}")]
    DimensionMismatch {
        /// Position of the offending matrix.
        index: usize,
        /// Order shared by the rest of the family.
        expected: usize,
        /// Order of the offending matrix.
        actual: usize,
    },
    /// Data source contained no matrices.
    #[error("data source contains no matrices")]
    EmptyData,
}

define_error_codes! {
    /// Stable codes describing [`DataSourceError`] variants.
    enum DataSourceErrorCode for DataSourceError {
        /// Requested index was outside the source's bounds.
        OutOfBounds => OutOfBounds { .. } => "DATA_SOURCE_OUT_OF_BOUNDS",
        /// Two matrices in the same family had different orders.
        DimensionMismatch => DimensionMismatch { .. } => "DATA_SOURCE_DIMENSION_MISMATCH",
        /// Data source contained no matrices.
        EmptyData => EmptyData => "DATA_SOURCE_EMPTY",
    }
}

/// Error type produced when building or analysing a poset.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum HasseError {
    /// The supplied [`crate::MatrixSource`] contained no matrices.
    #[error("data source `{data_source}` contains no matrices")]
    EmptySource {
        /// Identifier for the empty data source.
        data_source: Arc<str>,
    },
    /// A matrix could not be constructed.
    #[error(transparent)]
    Matrix(#[from] MatrixError),
    /// Matrices compared within one run had different orders.
    #[error("matrix order mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Order of the poset universe.
        expected: usize,
        /// Order of the offending matrix.
        actual: usize,
    },
    /// An entity matrix has no equal counterpart in the poset universe.
    #[error("entity {entity} from `{data_source}` matches no node of the poset")]
    UnmatchedEntity {
        /// Position of the entity within its source.
        entity: usize,
        /// Identifier for the entity source.
        data_source: Arc<str>,
    },
    /// Transitive reduction was invoked on a graph containing a cycle.
    #[error("graph contains a cycle through node {node}")]
    CyclicGraph {
        /// A node that lies on the detected cycle.
        node: usize,
    },
    /// A node identifier did not belong to the graph.
    #[error("node {node} does not exist in a graph of {node_count} nodes")]
    UnknownNode {
        /// The offending node identifier.
        node: usize,
        /// Number of nodes in the graph.
        node_count: usize,
    },
    /// A precomputed shortest-path table did not match the graph.
    #[error("path table is {rows}x{cols} but the graph has {node_count} nodes")]
    PathTableShape {
        /// Number of rows supplied.
        rows: usize,
        /// Length of the first row whose width disagreed with the node count.
        cols: usize,
        /// Number of nodes in the graph.
        node_count: usize,
    },
    /// Coverage fractions must lie within `[0, 1]`.
    #[error("coverage fraction must be within [0, 1] (got {got})")]
    InvalidCoverageFraction {
        /// The rejected fraction.
        got: f64,
    },
    /// Exhaustive search needs a positive maximum combination size.
    #[error("maximum combination size must be at least 1")]
    ZeroComboSize,
    /// The iteration cap must allow at least one merge.
    #[error("iteration cap must be at least 1 when set")]
    ZeroIterationCap,
    /// Exhaustive search would enumerate more combinations than permitted.
    #[error("exhaustive search would enumerate {combinations} combinations (limit {limit})")]
    SearchSpaceTooLarge {
        /// Number of combinations the search would visit.
        combinations: u128,
        /// Configured upper bound.
        limit: u128,
    },
    /// Baseline clustering parameters were out of range.
    #[error("invalid clustering parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        reason: Arc<str>,
    },
    /// The requested execution strategy is unavailable in the current build.
    #[error("the requested execution strategy {requested:?} is not available in this build")]
    BackendUnavailable {
        /// Strategy that could not be satisfied by the current build.
        requested: ExecutionStrategy,
    },
    /// A [`crate::MatrixSource`] operation failed.
    #[error("data source `{data_source}` failed: {error}")]
    DataSource {
        /// Identifier for the data source that produced the error.
        data_source: Arc<str>,
        #[source]
        /// Underlying data source error.
        error: DataSourceError,
    },
}

define_error_codes! {
    /// Stable codes describing [`HasseError`] variants.
    enum HasseErrorCode for HasseError {
        /// The supplied [`crate::MatrixSource`] contained no matrices.
        EmptySource => EmptySource { .. } => "HASSE_EMPTY_SOURCE",
        /// A matrix could not be constructed.
        InvalidMatrix => Matrix(..) => "HASSE_INVALID_MATRIX",
        /// Matrices compared within one run had different orders.
        DimensionMismatch => DimensionMismatch { .. } => "HASSE_DIMENSION_MISMATCH",
        /// An entity matrix has no equal counterpart in the poset universe.
        UnmatchedEntity => UnmatchedEntity { .. } => "HASSE_UNMATCHED_ENTITY",
        /// Transitive reduction was invoked on a graph containing a cycle.
        CyclicGraph => CyclicGraph { .. } => "HASSE_CYCLIC_GRAPH",
        /// A node identifier did not belong to the graph.
        UnknownNode => UnknownNode { .. } => "HASSE_UNKNOWN_NODE",
        /// A precomputed shortest-path table did not match the graph.
        PathTableShape => PathTableShape { .. } => "HASSE_PATH_TABLE_SHAPE",
        /// Coverage fractions must lie within `[0, 1]`.
        InvalidCoverageFraction => InvalidCoverageFraction { .. }
            => "HASSE_INVALID_COVERAGE_FRACTION",
        /// Exhaustive search needs a positive maximum combination size.
        ZeroComboSize => ZeroComboSize => "HASSE_ZERO_COMBO_SIZE",
        /// The iteration cap must allow at least one merge.
        ZeroIterationCap => ZeroIterationCap => "HASSE_ZERO_ITERATION_CAP",
        /// Exhaustive search would enumerate more combinations than permitted.
        SearchSpaceTooLarge => SearchSpaceTooLarge { .. } => "HASSE_SEARCH_SPACE_TOO_LARGE",
        /// Baseline clustering parameters were out of range.
        InvalidParameter => InvalidParameter { .. } => "HASSE_INVALID_PARAMETER",
        /// The requested execution strategy is unavailable in the current build.
        BackendUnavailable => BackendUnavailable { .. } => "HASSE_BACKEND_UNAVAILABLE",
        /// A [`crate::MatrixSource`] operation failed.
        DataSourceFailure => DataSource { .. } => "HASSE_DATA_SOURCE_FAILURE",
    }
}

impl HasseError {
    /// Retrieve the inner [`DataSourceErrorCode`] when the error originated in
    /// a [`crate::MatrixSource`].
    #[must_use]
    pub const fn data_source_code(&self) -> Option<DataSourceErrorCode> {
        match self {
            Self::DataSource { error, .. } => Some(error.code()),
            _ => None,
        }
    }

    pub(crate) fn data_source(data_source: &str, error: DataSourceError) -> Self {
        Self::DataSource {
            data_source: Arc::from(data_source),
            error,
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, HasseError>;
