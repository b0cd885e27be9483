//! Occupancy grid for global planning
//!
//! A static grid of free (0) and blocked (nonzero) cells supplied by the
//! host. The planner only ever reads it; hosts that need to change the map
//! build a new grid and swap it in.

use std::fmt;
use std::str::FromStr;

use nalgebra::DMatrix;

use crate::common::types::Cell;
use crate::error::{Error, Result};

/// Value of a free cell
pub const FREE: u8 = 0;

/// Value written for blocked cells by the builders in this module
pub const BLOCKED: u8 = 1;

/// 4-connected neighbor offsets as (row, col) deltas
const NEIGHBOR_OFFSETS: [(isize, isize); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

/// A fixed occupancy grid indexed by (row, col)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    cells: DMatrix<u8>,
}

impl OccupancyGrid {
    /// An all-free grid
    pub fn free(rows: usize, cols: usize) -> Self {
        OccupancyGrid {
            cells: DMatrix::from_element(rows, cols, FREE),
        }
    }

    /// Build a grid from row vectors, rejecting ragged input
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self> {
        let width = rows.first().map_or(0, Vec::len);
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(Error::RaggedGrid {
                row,
                expected: width,
                actual: r.len(),
            });
        }
        let data: Vec<u8> = rows.iter().flatten().copied().collect();
        Ok(OccupancyGrid {
            cells: DMatrix::from_row_slice(rows.len(), width, &data),
        })
    }

    /// Return a copy with the given cells blocked; out-of-bounds cells are ignored
    pub fn with_blocked<I>(mut self, blocked: I) -> Self
    where
        I: IntoIterator<Item = Cell>,
    {
        for cell in blocked {
            if let Some(v) = self.cells.get_mut((cell.row, cell.col)) {
                *v = BLOCKED;
            }
        }
        self
    }

    pub fn rows(&self) -> usize {
        self.cells.nrows()
    }

    pub fn cols(&self) -> usize {
        self.cells.ncols()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows() && cell.col < self.cols()
    }

    /// Raw cell value, `None` outside the grid
    pub fn value(&self, cell: Cell) -> Option<u8> {
        self.cells.get((cell.row, cell.col)).copied()
    }

    /// In bounds and marked free
    pub fn is_free(&self, cell: Cell) -> bool {
        self.value(cell) == Some(FREE)
    }

    /// Free 4-connected neighbors in a fixed order: right, left, down, up
    pub fn free_neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
        NEIGHBOR_OFFSETS.iter().filter_map(move |&(dr, dc)| {
            let row = cell.row.checked_add_signed(dr)?;
            let col = cell.col.checked_add_signed(dc)?;
            let next = Cell::new(row, col);
            self.is_free(next).then_some(next)
        })
    }
}

/// Parses a text map: `.` or `0` free, `#` or `1` blocked, one line per row
impl FromStr for OccupancyGrid {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let mut rows = Vec::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let row = line
                .chars()
                .map(|c| match c {
                    '.' | '0' => Ok(FREE),
                    '#' | '1' => Ok(BLOCKED),
                    other => Err(Error::invalid_config(format!(
                        "unexpected grid character {other:?}"
                    ))),
                })
                .collect::<Result<Vec<u8>>>()?;
            rows.push(row);
        }
        OccupancyGrid::from_rows(&rows)
    }
}

impl fmt::Display for OccupancyGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows() {
            for col in 0..self.cols() {
                let c = if self.cells[(row, col)] == FREE { '.' } else { '#' };
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
