//! Square relation matrices over a fixed ordered element set.

use std::{fmt, num::NonZeroUsize};

use crate::error::MatrixError;

/// A square grid of non-negative integers describing a binary relation.
///
/// Cell `(i, j)` counts how strongly element `i` relates to element `j`; in
/// the common 0/1 case it records whether the relation holds at all. Cells are
/// stored row-major.
///
/// # Examples
/// ```
/// use hasse_core::RelationMatrix;
///
/// let before = RelationMatrix::from_rows(&[[0_u32, 1], [0, 0]])?;
/// let none = RelationMatrix::from_rows(&[[0_u32, 0], [0, 0]])?;
/// assert!(before.dominates(&none));
/// assert!(!none.dominates(&before));
/// assert_eq!(before.relation_count(), 1);
/// # Ok::<(), hasse_core::MatrixError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RelationMatrix {
    order: usize,
    cells: Vec<u32>,
}

impl RelationMatrix {
    /// Builds a matrix of the given order from row-major cells.
    ///
    /// # Errors
    /// Returns [`MatrixError::Empty`] when `order` is zero and
    /// [`MatrixError::CellCount`] when `cells.len() != order * order`.
    pub fn new(order: usize, cells: Vec<u32>) -> Result<Self, MatrixError> {
        if order == 0 {
            return Err(MatrixError::Empty);
        }
        let expected = order.saturating_mul(order);
        if cells.len() != expected {
            return Err(MatrixError::CellCount {
                order,
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self { order, cells })
    }

    /// Builds a matrix from nested rows.
    ///
    /// # Errors
    /// Returns [`MatrixError::Empty`] for zero rows and
    /// [`MatrixError::NotSquare`] when any row length differs from the row
    /// count.
    pub fn from_rows<R: AsRef<[u32]>>(rows: &[R]) -> Result<Self, MatrixError> {
        let order = rows.len();
        if order == 0 {
            return Err(MatrixError::Empty);
        }
        let mut cells = Vec::with_capacity(order * order);
        for (row, values) in rows.iter().enumerate() {
            let values = values.as_ref();
            if values.len() != order {
                return Err(MatrixError::NotSquare {
                    row,
                    len: values.len(),
                    order,
                });
            }
            cells.extend_from_slice(values);
        }
        Ok(Self { order, cells })
    }

    /// Builds a matrix by evaluating `cell(row, col)` for every position.
    ///
    /// # Errors
    /// Returns [`MatrixError::Empty`] when `order` is zero.
    pub fn from_fn(
        order: usize,
        cell: impl FnMut(usize, usize) -> u32,
    ) -> Result<Self, MatrixError> {
        let order = NonZeroUsize::new(order).ok_or(MatrixError::Empty)?;
        Ok(Self::tabulate(order, cell))
    }

    pub(crate) fn tabulate(order: NonZeroUsize, mut cell: impl FnMut(usize, usize) -> u32) -> Self {
        let order = order.get();
        let cells = (0..order)
            .flat_map(|row| (0..order).map(move |col| (row, col)))
            .map(|(row, col)| cell(row, col))
            .collect();
        Self { order, cells }
    }

    /// Order as a non-zero count; construction rejects order zero.
    pub(crate) fn dimension(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.order).unwrap_or(NonZeroUsize::MIN)
    }

    /// Number of rows (and columns).
    #[rustfmt::skip]
    #[must_use]
    pub fn order(&self) -> usize { self.order }

    /// Row-major cell values, i.e. the flattened matrix.
    #[rustfmt::skip]
    #[must_use]
    pub fn cells(&self) -> &[u32] { &self.cells }

    /// Returns the value at `(row, col)`, or `None` when out of range.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        if row >= self.order || col >= self.order {
            return None;
        }
        self.cells.get(row * self.order + col).copied()
    }

    /// Iterates over the rows of the matrix.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[u32]> + '_ {
        self.cells.chunks_exact(self.order)
    }

    /// Whether every cell of `self` is at least the matching cell of `other`.
    ///
    /// Matrices of different order never dominate each other.
    #[must_use]
    pub fn dominates(&self, other: &Self) -> bool {
        self.order == other.order
            && self
                .cells
                .iter()
                .zip(&other.cells)
                .all(|(mine, theirs)| mine >= theirs)
    }

    /// Sum of all cells; for 0/1 matrices, the number of related pairs.
    #[must_use]
    pub fn relation_count(&self) -> u64 {
        self.cells.iter().map(|&cell| u64::from(cell)).sum()
    }

    /// Returns a copy with every diagonal cell cleared.
    #[must_use]
    pub fn without_diagonal(&self) -> Self {
        self.with_diagonal(0)
    }

    /// Returns a copy with every diagonal cell set to one.
    #[must_use]
    pub fn with_unit_diagonal(&self) -> Self {
        self.with_diagonal(1)
    }

    fn with_diagonal(&self, value: u32) -> Self {
        let mut cells = self.cells.clone();
        for cell in cells.iter_mut().step_by(self.order + 1) {
            *cell = value;
        }
        Self {
            order: self.order,
            cells,
        }
    }

    /// L1 distance between the flattened matrices.
    ///
    /// Returns `None` when the orders differ.
    #[must_use]
    pub fn manhattan_distance(&self, other: &Self) -> Option<u64> {
        (self.order == other.order).then(|| {
            self.cells
                .iter()
                .zip(&other.cells)
                .map(|(&a, &b)| u64::from(a.abs_diff(b)))
                .sum()
        })
    }
}

impl fmt::Display for RelationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, row) in self.rows().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            let mut first = true;
            for cell in row {
                if !first {
                    f.write_str(" ")?;
                }
                write!(f, "{cell}")?;
                first = false;
            }
        }
        Ok(())
    }
}
