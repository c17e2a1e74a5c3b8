//! # rectangular-lsap
//!
//! Solver for the rectangular linear assignment problem: given a cost matrix
//! with `nr` rows and `nc >= nr` columns, find the injective assignment of
//! rows to columns with minimum total cost.
//!
//! The solver implements the shortest augmenting path algorithm of Crouse
//! (2016): it grows the matching one row at a time with a Dijkstra style
//! search on reduced costs while keeping row and column dual prices feasible.
//! Positive infinity entries mark forbidden edges. Besides the one-shot
//! solve, the single augmenting step is exposed so callers can extend or
//! repair a partial assignment incrementally, and the `dynamic` module
//! reoptimizes a solved instance after a row or column removal.
//!
//! ## Example
//!
//! ```
//! use rectangular_lsap::{solve, AssignmentSolution, DenseCostMatrix};
//!
//! # fn main() -> rectangular_lsap::Result<()> {
//! let values = [4.0, 1.0, 3.0, 2.0, 0.0, 5.0, 3.0, 2.0, 2.0];
//! let costs = DenseCostMatrix::new(&values, 3, 3)?;
//! let solution: AssignmentSolution<i64, f64> = solve(&costs)?;
//! assert_eq!(solution.col4row, vec![1, 0, 2]);
//! assert_eq!(solution.objective(&costs), 5.0);
//! # Ok(())
//! # }
//! ```

pub mod dynamic;
pub mod matrix;
pub mod solution;
pub mod solver;

pub use matrix::{CostMatrix, DenseCostMatrix, Transposed};
pub use solution::{AssignmentIndex, AssignmentSolution, CostScalar};
pub use solver::{linear_sum_assignment, solve, SapSolver};

pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    /// Errors reported by the assignment solver.
    ///
    /// All errors are surfaced synchronously and nothing is recovered
    /// internally. Shape and entry problems are detected before any caller
    /// visible state is touched; [`Error::Infeasible`] can interrupt a
    /// search, in which case the mutated buffers are unspecified.
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("invalid cost matrix shape {nrows}x{ncols}: {reason}")]
        Shape {
            nrows: usize,
            ncols: usize,
            reason: &'static str,
        },

        #[error("cost matrix entry ({row}, {col}) is {value}; entries must not be NaN or negative infinity")]
        InvalidEntry { row: usize, col: usize, value: f64 },

        #[error("{name} {index} is out of range for length {len}")]
        IndexOutOfRange {
            name: &'static str,
            index: i64,
            len: usize,
        },

        #[error("cost matrix is infeasible")]
        Infeasible,
    }

    /// Result type for solver operations.
    pub type Result<T> = std::result::Result<T, Error>;
}
