use num_traits::{AsPrimitive, Float, FromPrimitive, NumAssign, PrimInt, Signed};
use std::fmt::{Debug, Display};

use crate::matrix::CostMatrix;

/// Signed primitive integer used for row and column indices.
///
/// The sentinel for "unassigned" is -1, so the type must be signed and wide
/// enough to hold the number of cost matrix entries. `i64` is the safe
/// default.
pub trait AssignmentIndex:
    PrimInt
    + Signed
    + Display
    + Debug
    + AsPrimitive<usize>
    + AsPrimitive<i64>
    + FromPrimitive
    + NumAssign
{
    /// Sentinel marking a row or column without an assigned partner.
    #[inline]
    fn unassigned() -> Self {
        Self::zero() - Self::one()
    }
}

impl<I> AssignmentIndex for I where
    I: PrimInt
        + Signed
        + Display
        + Debug
        + AsPrimitive<usize>
        + AsPrimitive<i64>
        + FromPrimitive
        + NumAssign
{
}

/// Floating point scalar used for costs and dual variables.
///
/// Requires ordered comparison, addition, subtraction and a representable
/// positive infinity, which marks forbidden edges.
pub trait CostScalar: Float + NumAssign + Display + Debug + 'static {}

impl<T> CostScalar for T where T: Float + NumAssign + Display + Debug + 'static {}

///
/// State of a (possibly partial) solution of the assignment problem.
///
/// `col4row` and `row4col` hold the matching from both sides, `u` and `v` the
/// dual prices for rows and columns. Between augment steps the matching is a
/// partial injection and the duals are feasible: the reduced cost
/// `C[i, j] - u[i] - v[j]` is zero on matched pairs and non-negative on every
/// edge leaving an assigned row.
///
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentSolution<I: AssignmentIndex, T: CostScalar> {
    /// index i gives the column assigned to row i, -1 if row i is free
    pub col4row: Vec<I>,
    /// index j gives the row assigned to column j, -1 if column j is free
    pub row4col: Vec<I>,
    /// dual prices of rows
    pub u: Vec<T>,
    /// dual prices of columns
    pub v: Vec<T>,
}

impl<I: AssignmentIndex, T: CostScalar> AssignmentSolution<I, T> {
    pub fn new(row_capacity: usize, column_capacity: usize) -> AssignmentSolution<I, T> {
        AssignmentSolution {
            col4row: Vec::with_capacity(row_capacity),
            row4col: Vec::with_capacity(column_capacity),
            u: Vec::with_capacity(row_capacity),
            v: Vec::with_capacity(column_capacity),
        }
    }

    /// Resets to the empty matching with zeroed duals for a new solve.
    pub fn reset(&mut self, num_rows: usize, num_cols: usize) {
        self.col4row.clear();
        self.col4row.resize(num_rows, I::unassigned());
        self.row4col.clear();
        self.row4col.resize(num_cols, I::unassigned());
        self.u.clear();
        self.u.resize(num_rows, T::zero());
        self.v.clear();
        self.v.resize(num_cols, T::zero());
    }

    /// Number of rows currently matched to a column.
    pub fn num_assigned(&self) -> usize {
        self.col4row
            .iter()
            .filter(|&&col| col != I::unassigned())
            .count()
    }

    /// Total cost of the matched pairs.
    pub fn objective<M: CostMatrix<T>>(&self, costs: &M) -> T {
        let mut total = T::zero();
        for (row, &col) in self.col4row.iter().enumerate() {
            if col != I::unassigned() {
                let col_usize: usize = col.as_();
                total += costs.cost(row, col_usize);
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::AssignmentSolution;
    use crate::matrix::DenseCostMatrix;

    #[test]
    fn test_reset_sizes_and_sentinels() {
        let mut solution = AssignmentSolution::<i64, f64>::new(2, 3);
        solution.reset(2, 3);
        assert_eq!(solution.col4row, [-1, -1]);
        assert_eq!(solution.row4col, [-1, -1, -1]);
        assert_eq!(solution.u, [0.0, 0.0]);
        assert_eq!(solution.v, [0.0, 0.0, 0.0]);
        assert_eq!(solution.num_assigned(), 0);
    }

    #[test]
    fn test_objective_skips_free_rows() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let costs = DenseCostMatrix::new(&values, 2, 3).unwrap();
        let mut solution = AssignmentSolution::<i64, f64>::new(2, 3);
        solution.reset(2, 3);
        solution.col4row[0] = 2;
        solution.row4col[2] = 0;
        assert_eq!(solution.objective(&costs), 3.0);
        assert_eq!(solution.num_assigned(), 1);
    }
}
