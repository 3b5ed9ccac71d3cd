//! Matrix source abstractions consumed by the poset pipeline.

use std::sync::Arc;

use crate::{error::DataSourceError, matrix::RelationMatrix};

/// Abstraction over an ordered collection of relation matrices.
///
/// The poset universe and the entities being clustered are both read through
/// this trait so callers can plug in their own loaders.
///
/// # Examples
/// ```
/// use hasse_core::{DataSourceError, MatrixSource, RelationMatrix};
///
/// struct Single(RelationMatrix);
///
/// impl MatrixSource for Single {
///     fn len(&self) -> usize { 1 }
///     fn name(&self) -> &str { "single" }
///     fn matrix(&self, index: usize) -> Result<&RelationMatrix, DataSourceError> {
///         (index == 0).then_some(&self.0).ok_or(DataSourceError::OutOfBounds { index })
///     }
/// }
///
/// let source = Single(RelationMatrix::from_rows(&[[0_u32, 1], [0, 0]])?);
/// assert_eq!(source.order()?, 2);
/// assert!(source.matrix(1).is_err());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub trait MatrixSource {
    /// Returns the number of matrices in the source.
    fn len(&self) -> usize;

    /// Returns whether the source contains no matrices.
    #[must_use]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a human-readable name.
    fn name(&self) -> &str;

    /// Borrows the matrix at `index`.
    ///
    /// # Errors
    /// Implementations must return [`DataSourceError::OutOfBounds`] for
    /// indices at or beyond [`Self::len`].
    fn matrix(&self, index: usize) -> Result<&RelationMatrix, DataSourceError>;

    /// Order shared by the matrices of this source.
    ///
    /// # Errors
    /// Returns [`DataSourceError::EmptyData`] for an empty source.
    fn order(&self) -> Result<usize, DataSourceError> {
        if self.is_empty() {
            return Err(DataSourceError::EmptyData);
        }
        self.matrix(0).map(RelationMatrix::order)
    }

    /// Borrows every matrix in source order.
    ///
    /// # Errors
    /// Propagates the first error returned by [`Self::matrix`].
    fn matrices(&self) -> Result<Vec<&RelationMatrix>, DataSourceError> {
        (0..self.len()).map(|index| self.matrix(index)).collect()
    }
}

/// In-memory family of matrices sharing a single order.
///
/// # Examples
/// ```
/// use hasse_core::{MatrixFamily, MatrixSource, RelationMatrix};
///
/// let family = MatrixFamily::try_new(
///     "pair",
///     vec![
///         RelationMatrix::from_rows(&[[0_u32, 0], [0, 0]])?,
///         RelationMatrix::from_rows(&[[0_u32, 1], [0, 0]])?,
///     ],
/// )?;
/// assert_eq!(family.len(), 2);
/// assert_eq!(family.name(), "pair");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatrixFamily {
    name: Arc<str>,
    matrices: Vec<RelationMatrix>,
}

impl MatrixFamily {
    /// Wraps `matrices`, checking that they all share the first matrix's
    /// order. Empty families are accepted.
    ///
    /// # Errors
    /// Returns [`DataSourceError::DimensionMismatch`] naming the first matrix
    /// whose order differs.
    pub fn try_new(
        name: impl Into<Arc<str>>,
        matrices: Vec<RelationMatrix>,
    ) -> Result<Self, DataSourceError> {
        if let Some(first) = matrices.first() {
            let expected = first.order();
            if let Some((index, odd)) = matrices
                .iter()
                .enumerate()
                .find(|(_, matrix)| matrix.order() != expected)
            {
                return Err(DataSourceError::DimensionMismatch {
                    index,
                    expected,
                    actual: odd.order(),
                });
            }
        }
        Ok(Self {
            name: name.into(),
            matrices,
        })
    }

    /// Borrows the underlying matrices.
    #[rustfmt::skip]
    #[must_use]
    pub fn as_slice(&self) -> &[RelationMatrix] { &self.matrices }

    /// Consumes the family, returning its matrices.
    #[must_use]
    pub fn into_matrices(self) -> Vec<RelationMatrix> {
        self.matrices
    }
}

impl MatrixSource for MatrixFamily {
    fn len(&self) -> usize {
        self.matrices.len()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn matrix(&self, index: usize) -> Result<&RelationMatrix, DataSourceError> {
        self.matrices
            .get(index)
            .ok_or(DataSourceError::OutOfBounds { index })
    }
}
