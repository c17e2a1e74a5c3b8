use crate::error::{Error, Result};
use crate::solution::CostScalar;

/// Read-only 2-D view of assignment costs.
///
/// Entries may be positive infinity to mark forbidden edges. NaN and negative
/// infinity are rejected at the solver boundary.
pub trait CostMatrix<T: CostScalar> {
    fn nrows(&self) -> usize;
    fn ncols(&self) -> usize;
    fn cost(&self, row: usize, col: usize) -> T;

    #[inline]
    fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }
}

/// Borrowed dense row-major cost matrix.
#[derive(Debug, Clone, Copy)]
pub struct DenseCostMatrix<'a, T: CostScalar> {
    values: &'a [T],
    num_rows: usize,
    num_cols: usize,
}

impl<'a, T: CostScalar> DenseCostMatrix<'a, T> {
    /// Wraps a row-major buffer of `num_rows * num_cols` values.
    pub fn new(values: &'a [T], num_rows: usize, num_cols: usize) -> Result<Self> {
        if num_rows == 0 || num_cols == 0 {
            return Err(Error::Shape {
                nrows: num_rows,
                ncols: num_cols,
                reason: "the cost matrix must have at least one row and one column",
            });
        }
        let expected = num_rows.checked_mul(num_cols);
        if expected != Some(values.len()) {
            return Err(Error::Shape {
                nrows: num_rows,
                ncols: num_cols,
                reason: "the buffer length does not match the requested shape",
            });
        }
        Ok(DenseCostMatrix {
            values,
            num_rows,
            num_cols,
        })
    }

    /// Costs of a single row as a contiguous slice.
    #[inline]
    pub fn row(&self, row: usize) -> &'a [T] {
        &self.values[row * self.num_cols..(row + 1) * self.num_cols]
    }
}

impl<'a, T: CostScalar> CostMatrix<T> for DenseCostMatrix<'a, T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.num_rows
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.num_cols
    }

    #[inline]
    fn cost(&self, row: usize, col: usize) -> T {
        debug_assert!(row < self.num_rows && col < self.num_cols);
        self.values[row * self.num_cols + col]
    }
}

/// Adapter presenting another cost matrix with rows and columns swapped.
///
/// The solver itself never reorients its input. Wrapping a matrix in
/// `Transposed` is the explicit way to solve the problem on the other side.
#[derive(Debug, Clone, Copy)]
pub struct Transposed<'a, M> {
    inner: &'a M,
}

impl<'a, M> Transposed<'a, M> {
    pub fn new(inner: &'a M) -> Self {
        Transposed { inner }
    }
}

impl<'a, T: CostScalar, M: CostMatrix<T>> CostMatrix<T> for Transposed<'a, M> {
    #[inline]
    fn nrows(&self) -> usize {
        self.inner.ncols()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.inner.nrows()
    }

    #[inline]
    fn cost(&self, row: usize, col: usize) -> T {
        self.inner.cost(col, row)
    }
}

#[cfg(test)]
mod tests {
    use super::{CostMatrix, DenseCostMatrix, Transposed};
    use crate::error::Error;

    #[test]
    fn test_dense_layout_is_row_major() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let costs = DenseCostMatrix::new(&values, 2, 3).unwrap();
        assert_eq!(costs.shape(), (2, 3));
        assert_eq!(costs.cost(0, 2), 3.0);
        assert_eq!(costs.cost(1, 0), 4.0);
        assert_eq!(costs.row(1), [4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_dense_rejects_empty_and_mismatched_shapes() {
        let values = [1.0f64, 2.0, 3.0];
        assert!(matches!(
            DenseCostMatrix::new(&values, 0, 3),
            Err(Error::Shape { .. })
        ));
        assert!(matches!(
            DenseCostMatrix::new(&values, 3, 0),
            Err(Error::Shape { .. })
        ));
        assert!(matches!(
            DenseCostMatrix::new(&values, 2, 2),
            Err(Error::Shape { .. })
        ));
    }

    #[test]
    fn test_transposed_swaps_axes() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let costs = DenseCostMatrix::new(&values, 2, 3).unwrap();
        let transposed = Transposed::new(&costs);
        assert_eq!(transposed.shape(), (3, 2));
        assert_eq!(transposed.cost(2, 0), costs.cost(0, 2));
        assert_eq!(transposed.cost(1, 1), costs.cost(1, 1));
    }
}
