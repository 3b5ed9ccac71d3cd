use hasse_core::{DataSourceError, MatrixSource, RelationMatrix};

/// Matrix source built from `(row, col)` pair lists over a fixed order.
#[derive(Clone, Debug)]
pub struct Pairs {
    name: &'static str,
    matrices: Vec<RelationMatrix>,
}

impl Pairs {
    #[must_use]
    pub fn new(name: &'static str, order: usize, matrices: &[&[(usize, usize)]]) -> Self {
        let matrices = matrices
            .iter()
            .map(|pairs| {
                RelationMatrix::from_fn(order, |row, col| u32::from(pairs.contains(&(row, col))))
                    .expect("order is positive")
            })
            .collect();
        Self { name, matrices }
    }

    #[must_use]
    pub fn empty(name: &'static str) -> Self {
        Self {
            name,
            matrices: Vec::new(),
        }
    }
}

impl MatrixSource for Pairs {
    fn len(&self) -> usize {
        self.matrices.len()
    }

    fn name(&self) -> &str {
        self.name
    }

    fn matrix(&self, index: usize) -> Result<&RelationMatrix, DataSourceError> {
        self.matrices
            .get(index)
            .ok_or(DataSourceError::OutOfBounds { index })
    }
}

/// Diamond `top > {left, right} > bottom` plus an unrelated matrix.
#[must_use]
pub fn diamond() -> Pairs {
    Pairs::new(
        "diamond",
        3,
        &[
            &[(0, 1), (0, 2), (1, 2)],
            &[(0, 1), (0, 2)],
            &[(0, 1), (1, 2)],
            &[(0, 1)],
            &[(2, 0)],
        ],
    )
}
