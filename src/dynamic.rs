//! Reoptimization of a solved instance after removing a row or a column.
//!
//! Both operations patch the existing matching and duals with a single
//! augmenting step instead of solving the whole problem again, so they run in
//! one Dijkstra search instead of `nr` of them.

use tracing::trace;

use crate::error::{Error, Result};
use crate::matrix::{CostMatrix, DenseCostMatrix};
use crate::solution::{AssignmentIndex, AssignmentSolution, CostScalar};
use crate::solver::{validate_state, SapSolver};

impl<I: AssignmentIndex, T: CostScalar> SapSolver<I, T> {
    /// Reoptimizes the matching as if `removed_row` had been deleted.
    ///
    /// The removed row keeps a formal assignment with its costs treated as
    /// uniformly zero, so the other rows end up optimally assigned for the
    /// matrix without that row. The cost matrix itself is not modified; the
    /// duals are updated in place to stay feasible for the re-priced row.
    ///
    /// Requires a fully assigned solution, as produced by
    /// [`SapSolver::solve`].
    pub fn solve_with_removed_row<M: CostMatrix<T>>(
        &mut self,
        costs: &M,
        removed_row: I,
        solution: &mut AssignmentSolution<I, T>,
    ) -> Result<()> {
        let (num_rows_idx, _) = validate_state(costs, solution)?;
        let num_rows: usize = num_rows_idx.as_();
        if removed_row < I::zero() || removed_row >= num_rows_idx {
            return Err(Error::IndexOutOfRange {
                name: "removed row",
                index: removed_row.as_(),
                len: num_rows,
            });
        }
        let assigned_cols = complete_assignment(solution)?;
        let row: usize = removed_row.as_();
        trace!("removing row {} from a {} row assignment", removed_row, num_rows);

        // With the removed row re-priced to zero cost everywhere, its dual
        // becomes the smallest reduced cost it can still offer.
        let mut lowest = T::infinity();
        for &value in solution.v.iter() {
            if -value < lowest {
                lowest = -value;
            }
        }
        solution.u[row] = lowest;

        // Square subproblem on the currently assigned columns. Inside it the
        // removed row and the column it frees share the same index.
        let mut sub_values = Vec::with_capacity(num_rows * num_rows);
        for i in 0..num_rows {
            for &col in assigned_cols.iter() {
                sub_values.push(if i == row { T::zero() } else { costs.cost(i, col) });
            }
        }
        let sub_costs = DenseCostMatrix::new(&sub_values, num_rows, num_rows)?;

        let mut sub = AssignmentSolution::<I, T>::new(num_rows, num_rows);
        sub.reset(num_rows, num_rows);
        let mut idx = I::zero();
        for k in 0..num_rows {
            sub.col4row[k] = idx;
            sub.row4col[k] = idx;
            idx += I::one();
        }
        sub.col4row[row] = I::unassigned();
        sub.row4col[row] = I::unassigned();
        sub.u.copy_from_slice(&solution.u);
        for (k, &col) in assigned_cols.iter().enumerate() {
            sub.v[k] = solution.v[col];
        }

        self.augment(&sub_costs, removed_row, &mut sub)?;

        // Map the subproblem solution back onto the full index space.
        for (k, &col) in assigned_cols.iter().enumerate() {
            solution.row4col[col] = sub.row4col[k];
            solution.v[col] = sub.v[k];
        }
        solution.u.copy_from_slice(&sub.u);
        let old_col4row = solution.col4row.clone();
        for i in 0..num_rows {
            let k: usize = sub.col4row[i].as_();
            solution.col4row[i] = old_col4row[k];
        }
        Ok(())
    }

    /// Reoptimizes the matching as if `removed_col` had been forbidden.
    ///
    /// A column nobody uses is removed for free. Otherwise the row it served
    /// is freed and re-augmented against a copy of the costs with the column
    /// priced at positive infinity. Returns [`Error::Infeasible`] when no
    /// replacement column exists, such as for a square instance.
    pub fn solve_with_removed_col<M: CostMatrix<T>>(
        &mut self,
        costs: &M,
        removed_col: I,
        solution: &mut AssignmentSolution<I, T>,
    ) -> Result<()> {
        let (num_rows_idx, num_cols_idx) = validate_state(costs, solution)?;
        if removed_col < I::zero() || removed_col >= num_cols_idx {
            return Err(Error::IndexOutOfRange {
                name: "removed column",
                index: removed_col.as_(),
                len: num_cols_idx.as_(),
            });
        }

        let col: usize = removed_col.as_();
        let freed_row = solution.row4col[col];
        if freed_row == I::unassigned() {
            trace!("column {} is unassigned, nothing to reoptimize", removed_col);
            return Ok(());
        }

        let num_rows: usize = num_rows_idx.as_();
        let num_cols: usize = num_cols_idx.as_();
        let mut values = Vec::with_capacity(num_rows * num_cols);
        for i in 0..num_rows {
            for j in 0..num_cols {
                values.push(if j == col { T::infinity() } else { costs.cost(i, j) });
            }
        }
        let forbidden = DenseCostMatrix::new(&values, num_rows, num_cols)?;

        let freed: usize = freed_row.as_();
        solution.col4row[freed] = I::unassigned();
        solution.row4col[col] = I::unassigned();
        trace!("column {} freed row {}, re-augmenting", removed_col, freed_row);
        self.augment(&forbidden, freed_row, solution)
    }
}

/// Columns assigned to each row, in row order. Errors if any row is free.
fn complete_assignment<I: AssignmentIndex, T: CostScalar>(
    solution: &AssignmentSolution<I, T>,
) -> Result<Vec<usize>> {
    let mut cols = Vec::with_capacity(solution.col4row.len());
    for &col in solution.col4row.iter() {
        if col == I::unassigned() {
            return Err(Error::IndexOutOfRange {
                name: "assigned column for row",
                index: -1,
                len: solution.row4col.len(),
            });
        }
        cols.push(col.as_());
    }
    Ok(cols)
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::matrix::DenseCostMatrix;
    use crate::solution::AssignmentSolution;
    use crate::solver::{solve, SapSolver};
    use rand::distributions::{Distribution, Uniform};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_integer_costs(rng: &mut ChaCha8Rng, num_rows: usize, num_cols: usize) -> Vec<f64> {
        let between = Uniform::from(0..10);
        (0..num_rows * num_cols)
            .map(|_| between.sample(rng) as f64)
            .collect()
    }

    /// Cost of the rows other than `skipped` in the current matching.
    fn surviving_cost(
        values: &[f64],
        num_cols: usize,
        solution: &AssignmentSolution<i64, f64>,
        skipped: usize,
    ) -> f64 {
        solution
            .col4row
            .iter()
            .enumerate()
            .filter(|(row, _)| *row != skipped)
            .map(|(row, &col)| values[row * num_cols + col as usize])
            .sum()
    }

    #[test]
    fn test_removed_row_matches_fresh_subproblem_solve() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..100 {
            let num_rows = rng.gen_range(2..=6);
            let num_cols = rng.gen_range(num_rows..=10);
            let values = random_integer_costs(&mut rng, num_rows, num_cols);
            let removed = rng.gen_range(0..num_rows);

            let costs = DenseCostMatrix::new(&values, num_rows, num_cols).unwrap();
            let (mut solver, mut solution) = SapSolver::<i64, f64>::new(num_rows, num_cols);
            solver.solve(&costs, &mut solution).unwrap();

            solver
                .solve_with_removed_row(&costs, removed as i64, &mut solution)
                .unwrap();

            // The surviving rows must be as cheap as a from-scratch solve of
            // the submatrix without the removed row.
            let sub_values: Vec<f64> = (0..num_rows)
                .filter(|&row| row != removed)
                .flat_map(|row| values[row * num_cols..(row + 1) * num_cols].iter().copied())
                .collect();
            let sub_costs = DenseCostMatrix::new(&sub_values, num_rows - 1, num_cols).unwrap();
            let fresh: AssignmentSolution<i64, f64> = solve(&sub_costs).unwrap();

            assert_eq!(
                surviving_cost(&values, num_cols, &solution, removed),
                fresh.objective(&sub_costs)
            );

            // The patched state is still a valid matching on the full matrix.
            let mut seen = vec![false; num_cols];
            for (row, &col) in solution.col4row.iter().enumerate() {
                assert!(col >= 0 && (col as usize) < num_cols);
                assert!(!seen[col as usize]);
                seen[col as usize] = true;
                assert_eq!(solution.row4col[col as usize], row as i64);
            }
        }
    }

    #[test]
    fn test_removed_row_requires_a_complete_assignment() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let costs = DenseCostMatrix::new(&values, 2, 3).unwrap();
        let (mut solver, mut solution) = SapSolver::<i64, f64>::new(2, 3);
        solution.reset(2, 3);
        assert!(matches!(
            solver.solve_with_removed_row(&costs, 0, &mut solution),
            Err(Error::IndexOutOfRange { .. })
        ));

        solver.solve(&costs, &mut solution).unwrap();
        assert!(matches!(
            solver.solve_with_removed_row(&costs, 5, &mut solution),
            Err(Error::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_removed_col_matches_fresh_forbidden_solve() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..100 {
            let num_rows = rng.gen_range(2..=5);
            let num_cols = rng.gen_range(num_rows + 1..=8);
            let values = random_integer_costs(&mut rng, num_rows, num_cols);

            let costs = DenseCostMatrix::new(&values, num_rows, num_cols).unwrap();
            let (mut solver, mut solution) = SapSolver::<i64, f64>::new(num_rows, num_cols);
            solver.solve(&costs, &mut solution).unwrap();

            // Remove a column that participates in the current matching.
            let removed = solution.col4row[rng.gen_range(0..num_rows)];
            solver
                .solve_with_removed_col(&costs, removed, &mut solution)
                .unwrap();

            let forbidden: Vec<f64> = values
                .iter()
                .enumerate()
                .map(|(idx, &value)| {
                    if idx % num_cols == removed as usize {
                        f64::INFINITY
                    } else {
                        value
                    }
                })
                .collect();
            let forbidden_costs = DenseCostMatrix::new(&forbidden, num_rows, num_cols).unwrap();
            let fresh: AssignmentSolution<i64, f64> = solve(&forbidden_costs).unwrap();

            assert_eq!(solution.row4col[removed as usize], -1);
            assert_eq!(
                solution.objective(&costs),
                fresh.objective(&forbidden_costs)
            );
        }
    }

    #[test]
    fn test_removed_col_ignores_unassigned_columns() {
        let values = [1.0, 2.0, 9.0, 4.0, 5.0, 9.0];
        let costs = DenseCostMatrix::new(&values, 2, 3).unwrap();
        let (mut solver, mut solution) = SapSolver::<i64, f64>::new(2, 3);
        solver.solve(&costs, &mut solution).unwrap();
        let before = solution.clone();

        // Column 2 is too expensive for either row, so it is unassigned.
        solver
            .solve_with_removed_col(&costs, 2, &mut solution)
            .unwrap();
        assert_eq!(solution, before);
    }

    #[test]
    fn test_removed_col_on_square_instance_is_infeasible() {
        let values = [5.0, 1.0, 2.0, 3.0];
        let costs = DenseCostMatrix::new(&values, 2, 2).unwrap();
        let (mut solver, mut solution) = SapSolver::<i64, f64>::new(2, 2);
        solver.solve(&costs, &mut solution).unwrap();

        let removed = solution.col4row[0];
        assert!(matches!(
            solver.solve_with_removed_col(&costs, removed, &mut solution),
            Err(Error::Infeasible)
        ));
    }
}
