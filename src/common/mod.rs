//! Common utilities and types for the rover core

/// Common types and utilities used across the codebase
pub mod types {
    use serde::{Deserialize, Serialize};
    use std::fmt;

    /// A grid cell addressed as (row, column).
    ///
    /// Columns grow to the vehicle's right, so a waypoint with a larger
    /// column than the current cell lies to the right.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct Cell {
        pub row: usize,
        pub col: usize,
    }

    impl Cell {
        pub const fn new(row: usize, col: usize) -> Self {
            Cell { row, col }
        }

        /// Manhattan distance to another cell
        pub fn manhattan(&self, other: &Cell) -> usize {
            self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
        }

        /// Euclidean distance to another cell, in cells
        pub fn distance(&self, other: &Cell) -> f64 {
            let dr = self.row as f64 - other.row as f64;
            let dc = self.col as f64 - other.col as f64;
            dr.hypot(dc)
        }
    }

    impl From<(usize, usize)> for Cell {
        fn from((row, col): (usize, usize)) -> Self {
            Cell::new(row, col)
        }
    }

    impl fmt::Display for Cell {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "({}, {})", self.row, self.col)
        }
    }

    /// An ordered waypoint sequence from start to goal, both inclusive
    pub type Path = Vec<Cell>;
}

/// Clamp `value` to `[-limit, limit]`.
pub fn clip(value: f64, limit: f64) -> f64 {
    value.clamp(-limit, limit)
}
