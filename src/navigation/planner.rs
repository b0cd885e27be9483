//! Global path planning over the occupancy grid

use pathfinding::prelude::astar;
use tracing::debug;

use super::occupancy::OccupancyGrid;
use crate::common::types::{Cell, Path};
use crate::error::{Error, Result};

/// Trait for path planning algorithms
pub trait PathPlanner: Send + Sync {
    /// Get the name of this planner
    fn name(&self) -> &str;

    /// Plan a path from start to goal, both inclusive.
    ///
    /// `Ok(None)` means the query was valid but no route exists. Endpoints
    /// outside the grid and a blocked start are rejected with an error.
    fn find_path(&self, grid: &OccupancyGrid, start: Cell, goal: Cell) -> Result<Option<Path>>;
}

/// 4-connected A* with unit step cost and a Manhattan heuristic
#[derive(Debug, Clone, Copy, Default)]
pub struct AStarPlanner;

impl AStarPlanner {
    pub fn new() -> Self {
        AStarPlanner
    }
}

impl PathPlanner for AStarPlanner {
    fn name(&self) -> &str {
        "AStarPlanner"
    }

    fn find_path(&self, grid: &OccupancyGrid, start: Cell, goal: Cell) -> Result<Option<Path>> {
        for cell in [start, goal] {
            if !grid.contains(cell) {
                return Err(Error::CellOutOfBounds(cell));
            }
        }
        if !grid.is_free(start) {
            return Err(Error::StartBlocked(start));
        }
        if !grid.is_free(goal) {
            debug!("Goal {} is blocked, no path", goal);
            return Ok(None);
        }

        let result = astar(
            &start,
            |&cell| {
                grid.free_neighbors(cell)
                    .map(|next| (next, 1u32))
                    .collect::<Vec<_>>()
            },
            |cell| cell.manhattan(&goal) as u32,
            |&cell| cell == goal,
        );

        match result {
            Some((path, cost)) => {
                debug!("Planned {} -> {} in {} steps", start, goal, cost);
                Ok(Some(path))
            }
            None => {
                debug!("No path from {} to {}", start, goal);
                Ok(None)
            }
        }
    }
}
