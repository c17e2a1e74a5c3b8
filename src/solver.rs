use tracing::trace;

use crate::error::{Error, Result};
use crate::matrix::{CostMatrix, DenseCostMatrix, Transposed};
use crate::solution::{AssignmentIndex, AssignmentSolution, CostScalar};

/// Shortest augmenting path solver for the rectangular assignment problem.
///
/// Finds an injective assignment of rows to columns of minimum total cost for
/// a cost matrix with at least as many columns as rows. The matching is grown
/// one row at a time by a Dijkstra style search on reduced costs, keeping the
/// dual prices feasible after every step.
///
/// The per-search scratch buffers live on the solver so repeated solves and
/// augment calls reuse their allocations.
#[derive(Clone)]
pub struct SapSolver<I: AssignmentIndex, T: CostScalar> {
    // row predecessor of each column in the shortest path tree
    path: Vec<I>,
    // best reduced path cost found for each column so far
    shortest_path_costs: Vec<T>,
    // rows and columns committed during the current search
    scanned_rows: Vec<bool>,
    scanned_cols: Vec<bool>,
    // columns not yet finalized, compacted by swap removal
    remaining: Vec<I>,
}

impl<I: AssignmentIndex, T: CostScalar> SapSolver<I, T> {
    pub fn new(row_capacity: usize, column_capacity: usize) -> (Self, AssignmentSolution<I, T>) {
        (
            Self {
                path: Vec::with_capacity(column_capacity),
                shortest_path_costs: Vec::with_capacity(column_capacity),
                scanned_rows: Vec::with_capacity(row_capacity),
                scanned_cols: Vec::with_capacity(column_capacity),
                remaining: Vec::with_capacity(column_capacity),
            },
            AssignmentSolution::new(row_capacity, column_capacity),
        )
    }

    /// Solves the full problem from scratch.
    ///
    /// Resets `solution`, then augments every row in ascending order so the
    /// output is deterministic under cost ties. On [`Error::Infeasible`] the
    /// contents of `solution` are unspecified.
    pub fn solve<M: CostMatrix<T>>(
        &mut self,
        costs: &M,
        solution: &mut AssignmentSolution<I, T>,
    ) -> Result<()> {
        let (num_rows_idx, num_cols_idx) = checked_shape::<I, T, M>(costs)?;
        validate_entries(costs)?;

        let num_rows: usize = num_rows_idx.as_();
        let num_cols: usize = num_cols_idx.as_();
        solution.reset(num_rows, num_cols);
        trace!("solving {}x{} assignment problem", num_rows, num_cols);

        for cur_row in num_iter::range(I::zero(), num_rows_idx) {
            self.augment_row(costs, cur_row, num_cols_idx, solution)?;
        }
        trace!("objective: {}", solution.objective(costs));
        Ok(())
    }

    /// Runs a single shortest augmenting path step for `free_row`.
    ///
    /// The supplied solution must satisfy the matching and dual feasibility
    /// invariants; the call extends the matching with an assignment for
    /// `free_row` and re-establishes the invariants. A row whose current
    /// assignment is still consistent is left untouched. On
    /// [`Error::Infeasible`] the contents of `solution` are unspecified.
    pub fn augment<M: CostMatrix<T>>(
        &mut self,
        costs: &M,
        free_row: I,
        solution: &mut AssignmentSolution<I, T>,
    ) -> Result<()> {
        let (num_rows_idx, num_cols_idx) = validate_state(costs, solution)?;
        validate_entries(costs)?;
        if free_row < I::zero() || free_row >= num_rows_idx {
            return Err(Error::IndexOutOfRange {
                name: "free row",
                index: free_row.as_(),
                len: num_rows_idx.as_(),
            });
        }

        let row: usize = free_row.as_();
        let col = solution.col4row[row];
        if col != I::unassigned() {
            let col_usize: usize = col.as_();
            if solution.row4col[col_usize] == free_row {
                trace!("row {} is already assigned to column {}", free_row, col);
                return Ok(());
            }
        }
        self.augment_row(costs, free_row, num_cols_idx, solution)
    }

    /// The search itself. Callers have validated the state already.
    fn augment_row<M: CostMatrix<T>>(
        &mut self,
        costs: &M,
        cur_row: I,
        num_cols_idx: I,
        solution: &mut AssignmentSolution<I, T>,
    ) -> Result<()> {
        let num_rows = solution.col4row.len();
        let num_cols = solution.row4col.len();
        self.reset_scratch(num_rows, num_cols_idx);

        let unassigned = I::unassigned();
        let mut min_val = T::zero();
        let mut row_idx = cur_row;
        let mut sink = unassigned;

        while sink == unassigned {
            let row: usize = row_idx.as_();
            self.scanned_rows[row] = true;
            let u_row = solution.u[row];

            // Relax every open column through the row under scan, tracking the
            // frontier minimum in the same pass.
            let mut lowest = T::infinity();
            let mut selected: Option<usize> = None;
            for it in 0..self.remaining.len() {
                let col_idx = self.remaining[it];
                let col: usize = col_idx.as_();
                let r = min_val + costs.cost(row, col) - u_row - solution.v[col];
                if r < self.shortest_path_costs[col] {
                    self.path[col] = row_idx;
                    self.shortest_path_costs[col] = r;
                }

                // Ties are broken toward a column that completes the path, but
                // never between two tied free columns, so the lowest index
                // wins. Equality is bit exact on purpose.
                let d = self.shortest_path_costs[col];
                if d < lowest {
                    lowest = d;
                    selected = Some(it);
                } else if d == lowest && solution.row4col[col] == unassigned {
                    match selected {
                        Some(sel) => {
                            let sel_col: usize = self.remaining[sel].as_();
                            if solution.row4col[sel_col] != unassigned {
                                selected = Some(it);
                            }
                        }
                        None => selected = Some(it),
                    }
                }
            }

            min_val = lowest;
            let it_min = match selected {
                Some(it) if min_val < T::infinity() => it,
                _ => {
                    trace!("no finite augmenting path from row {}", cur_row);
                    return Err(Error::Infeasible);
                }
            };

            let col_min = self.remaining.swap_remove(it_min);
            let col: usize = col_min.as_();
            self.scanned_cols[col] = true;
            if solution.row4col[col] == unassigned {
                sink = col_min;
            } else {
                row_idx = solution.row4col[col];
            }
        }

        // Raise the prices of scanned rows and lower those of scanned columns
        // so every edge on the augmenting path becomes tight.
        let cur: usize = cur_row.as_();
        for row in 0..num_rows {
            if !self.scanned_rows[row] {
                continue;
            }
            if row == cur {
                solution.u[row] += min_val;
            } else {
                let col: usize = solution.col4row[row].as_();
                solution.u[row] += min_val - self.shortest_path_costs[col];
            }
        }
        for col in 0..num_cols {
            if self.scanned_cols[col] {
                solution.v[col] -= min_val - self.shortest_path_costs[col];
            }
        }

        // Rewire the matching along the path, from the sink back to cur_row.
        let mut col_idx = sink;
        loop {
            let col: usize = col_idx.as_();
            let prev_row = self.path[col];
            let row: usize = prev_row.as_();
            solution.row4col[col] = prev_row;
            let next_col = solution.col4row[row];
            solution.col4row[row] = col_idx;
            if prev_row == cur_row {
                break;
            }
            col_idx = next_col;
        }

        trace!("augmented row {} via sink {}", cur_row, sink);
        trace!("col4row: {:?}", solution.col4row);
        trace!("v: {:?}", solution.v);
        Ok(())
    }

    fn reset_scratch(&mut self, num_rows: usize, num_cols_idx: I) {
        let num_cols: usize = num_cols_idx.as_();
        self.path.clear();
        self.path.resize(num_cols, I::unassigned());
        self.shortest_path_costs.clear();
        self.shortest_path_costs.resize(num_cols, T::infinity());
        self.scanned_rows.clear();
        self.scanned_rows.resize(num_rows, false);
        self.scanned_cols.clear();
        self.scanned_cols.resize(num_cols, false);
        self.remaining.clear();
        self.remaining
            .extend(num_iter::range(I::zero(), num_cols_idx));
    }
}

/// Solves the assignment problem with a freshly allocated solver.
pub fn solve<I, T, M>(costs: &M) -> Result<AssignmentSolution<I, T>>
where
    I: AssignmentIndex,
    T: CostScalar,
    M: CostMatrix<T>,
{
    let (num_rows, num_cols) = costs.shape();
    let (mut solver, mut solution) = SapSolver::new(num_rows, num_cols);
    solver.solve(costs, &mut solution)?;
    Ok(solution)
}

/// Returns the optimal assignment as sorted `(row_ind, col_ind)` pairs.
///
/// Unlike [`SapSolver::solve`] this entry point accepts matrices with more
/// rows than columns by explicitly solving the transposed problem, and it can
/// maximize the total cost by negating every entry first. NaN and negative
/// infinity entries (after negation) are rejected.
pub fn linear_sum_assignment<I, T, M>(costs: &M, maximize: bool) -> Result<(Vec<I>, Vec<I>)>
where
    I: AssignmentIndex,
    T: CostScalar,
    M: CostMatrix<T>,
{
    let (num_rows, num_cols) = costs.shape();
    if num_rows == 0 || num_cols == 0 {
        return Ok((Vec::new(), Vec::new()));
    }

    let mut values = Vec::with_capacity(num_rows * num_cols);
    for row in 0..num_rows {
        for col in 0..num_cols {
            let cost = costs.cost(row, col);
            let cost = if maximize { -cost } else { cost };
            if cost.is_nan() || cost == T::neg_infinity() {
                return Err(Error::InvalidEntry {
                    row,
                    col,
                    value: cost.to_f64().unwrap_or(f64::NAN),
                });
            }
            values.push(cost);
        }
    }
    let dense = DenseCostMatrix::new(&values, num_rows, num_cols)?;

    if num_cols < num_rows {
        let transposed = Transposed::new(&dense);
        let solution: AssignmentSolution<I, T> = solve(&transposed)?;

        // col4row of the transposed problem maps each original column to its
        // original row; report the pairs ordered by row index.
        let mut pairs = Vec::with_capacity(solution.col4row.len());
        let mut col_idx = I::zero();
        for &row_idx in solution.col4row.iter() {
            pairs.push((row_idx, col_idx));
            col_idx += I::one();
        }
        pairs.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        Ok(pairs.into_iter().unzip())
    } else {
        let solution: AssignmentSolution<I, T> = solve(&dense)?;
        let mut row_ind = Vec::with_capacity(num_rows);
        let mut row_idx = I::zero();
        for _ in 0..num_rows {
            row_ind.push(row_idx);
            row_idx += I::one();
        }
        Ok((row_ind, solution.col4row))
    }
}

/// Validates the matrix dimensions and converts them to the index type.
pub(crate) fn checked_shape<I, T, M>(costs: &M) -> Result<(I, I)>
where
    I: AssignmentIndex,
    T: CostScalar,
    M: CostMatrix<T>,
{
    let (num_rows, num_cols) = costs.shape();
    if num_rows == 0 || num_cols == 0 {
        return Err(Error::Shape {
            nrows: num_rows,
            ncols: num_cols,
            reason: "the cost matrix must have at least one row and one column",
        });
    }
    if num_cols < num_rows {
        return Err(Error::Shape {
            nrows: num_rows,
            ncols: num_cols,
            reason: "more rows than columns; transpose the cost matrix first",
        });
    }
    let entries = num_rows.checked_mul(num_cols).and_then(I::from_usize);
    let num_rows_idx = I::from_usize(num_rows);
    let num_cols_idx = I::from_usize(num_cols);
    match (entries, num_rows_idx, num_cols_idx) {
        (Some(_), Some(nr), Some(nc)) => Ok((nr, nc)),
        _ => Err(Error::Shape {
            nrows: num_rows,
            ncols: num_cols,
            reason: "the index type is too narrow for this shape",
        }),
    }
}

/// Rejects NaN and negative infinity entries before any state is touched.
pub(crate) fn validate_entries<T, M>(costs: &M) -> Result<()>
where
    T: CostScalar,
    M: CostMatrix<T>,
{
    let (num_rows, num_cols) = costs.shape();
    for row in 0..num_rows {
        for col in 0..num_cols {
            let value = costs.cost(row, col);
            if value.is_nan() || value == T::neg_infinity() {
                return Err(Error::InvalidEntry {
                    row,
                    col,
                    value: value.to_f64().unwrap_or(f64::NAN),
                });
            }
        }
    }
    Ok(())
}

/// Checks that caller supplied solution buffers match the matrix shape and
/// hold indices in `{-1} ∪ [0, len)`.
pub(crate) fn validate_state<I, T, M>(
    costs: &M,
    solution: &AssignmentSolution<I, T>,
) -> Result<(I, I)>
where
    I: AssignmentIndex,
    T: CostScalar,
    M: CostMatrix<T>,
{
    let (num_rows_idx, num_cols_idx) = checked_shape::<I, T, M>(costs)?;
    let num_rows: usize = num_rows_idx.as_();
    let num_cols: usize = num_cols_idx.as_();
    if solution.col4row.len() != num_rows
        || solution.row4col.len() != num_cols
        || solution.u.len() != num_rows
        || solution.v.len() != num_cols
    {
        return Err(Error::Shape {
            nrows: num_rows,
            ncols: num_cols,
            reason: "the solution buffers do not match the cost matrix shape",
        });
    }
    for &col in solution.col4row.iter() {
        if col != I::unassigned() && (col < I::zero() || col >= num_cols_idx) {
            return Err(Error::IndexOutOfRange {
                name: "col4row entry",
                index: col.as_(),
                len: num_cols,
            });
        }
    }
    for &row in solution.row4col.iter() {
        if row != I::unassigned() && (row < I::zero() || row >= num_rows_idx) {
            return Err(Error::IndexOutOfRange {
                name: "row4col entry",
                index: row.as_(),
                len: num_rows,
            });
        }
    }
    Ok((num_rows_idx, num_cols_idx))
}


#[cfg(test)]
#[generic_tests::define]
mod scenarios {
    use super::solve;
    use crate::error::Error;
    use crate::matrix::DenseCostMatrix;
    use crate::solution::{AssignmentSolution, CostScalar};

    fn costs_of<T: CostScalar>(values: &[f64]) -> Vec<T> {
        values.iter().map(|&value| T::from(value).unwrap()).collect()
    }

    #[test]
    fn test_constant_matrix<T: CostScalar>() {
        let values = costs_of::<T>(&[5.0; 9]);
        let costs = DenseCostMatrix::new(&values, 3, 3).unwrap();
        let solution: AssignmentSolution<i64, T> = solve(&costs).unwrap();
        assert_eq!(solution.col4row, [0, 1, 2]);
        assert_eq!(solution.objective(&costs), T::from(15.0).unwrap());
    }

    #[test]
    fn test_rectangular_ties<T: CostScalar>() {
        let values = costs_of::<T>(&[0.0, 0.0, 1.0, 1.0, 0.0, 2.0]);
        let costs = DenseCostMatrix::new(&values, 2, 3).unwrap();
        let solution: AssignmentSolution<i64, T> = solve(&costs).unwrap();
        assert_eq!(solution.col4row, [0, 1]);
    }

    #[test]
    fn test_classic_3x3<T: CostScalar>() {
        let values = costs_of::<T>(&[4.0, 1.0, 3.0, 2.0, 0.0, 5.0, 3.0, 2.0, 2.0]);
        let costs = DenseCostMatrix::new(&values, 3, 3).unwrap();
        let solution: AssignmentSolution<i64, T> = solve(&costs).unwrap();
        assert_eq!(solution.col4row, [1, 0, 2]);
        assert_eq!(solution.objective(&costs), T::from(5.0).unwrap());
    }

    #[test]
    fn test_infeasible<T: CostScalar>() {
        let inf = T::infinity();
        let one = T::one();
        let values = [inf, inf, one, one + one];
        let costs = DenseCostMatrix::new(&values, 2, 2).unwrap();
        assert!(matches!(
            solve::<i64, T, _>(&costs),
            Err(Error::Infeasible)
        ));
    }

    #[instantiate_tests(<f32>)]
    mod f32 {}

    #[instantiate_tests(<f64>)]
    mod f64 {}
}
