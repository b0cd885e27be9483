//! Navigation module for the rover core
pub mod occupancy;
pub mod path_follower;
pub mod planner;

use std::sync::Arc;

use tracing::{debug, info, warn};

use self::occupancy::OccupancyGrid;
use self::path_follower::{FollowOutcome, PathFollower, VehicleCell};
use self::planner::{AStarPlanner, PathPlanner};
use crate::common::types::{Cell, Path};
use crate::config::FollowerConfig;
use crate::error::Result;

/// Global planning plus waypoint following over a shared grid.
///
/// Owns the current path and the index of the waypoint being driven to.
/// The grid is shared read-only; swapping it never touches the old one.
pub struct Navigator {
    grid: Arc<OccupancyGrid>,
    planner: Box<dyn PathPlanner>,
    path_follower: Box<dyn PathFollower>,
    path: Option<Path>,
    path_index: usize,
}

impl Navigator {
    /// Create a navigator with the A* planner and the follower named in `config`
    pub fn new(grid: Arc<OccupancyGrid>, config: &FollowerConfig) -> Self {
        Navigator {
            grid,
            planner: Box::new(AStarPlanner::new()),
            path_follower: path_follower::from_config(config),
            path: None,
            path_index: 0,
        }
    }

    /// Create a navigator with a specific path follower
    pub fn with_path_follower<T: PathFollower + 'static>(
        grid: Arc<OccupancyGrid>,
        path_follower: T,
    ) -> Self {
        Navigator {
            grid,
            planner: Box::new(AStarPlanner::new()),
            path_follower: Box::new(path_follower),
            path: None,
            path_index: 0,
        }
    }

    pub fn set_path_follower<T: PathFollower + 'static>(&mut self, path_follower: T) {
        self.path_follower = Box::new(path_follower);
    }

    pub fn set_planner<T: PathPlanner + 'static>(&mut self, planner: T) {
        self.planner = Box::new(planner);
    }

    /// Plan a fresh path and reset the waypoint index.
    ///
    /// Returns `Ok(false)` when no route exists. The previous path is
    /// dropped in every case.
    pub fn plan(&mut self, start: Cell, goal: Cell) -> Result<bool> {
        self.clear();
        match self.planner.find_path(&self.grid, start, goal)? {
            Some(path) => {
                info!(
                    "Planned path {} -> {} with {} cells using {}",
                    start,
                    goal,
                    path.len(),
                    self.planner.name()
                );
                self.path = Some(path);
                Ok(true)
            }
            None => {
                warn!("No path from {} to {}", start, goal);
                Ok(false)
            }
        }
    }

    /// Run the follower for one cycle and store the advanced index.
    ///
    /// `None` when there is no path to follow.
    pub fn follow(&mut self, vfh_heading: f64, vehicle: VehicleCell) -> Option<FollowOutcome> {
        let path = self.path.as_deref()?;
        let outcome = self
            .path_follower
            .follow(path, self.path_index, vfh_heading, vehicle);
        if outcome.path_index != self.path_index {
            debug!("Waypoint index {} -> {}", self.path_index, outcome.path_index);
        }
        self.path_index = outcome.path_index.max(self.path_index);
        Some(outcome)
    }

    /// Drop the current path
    pub fn clear(&mut self) {
        self.path = None;
        self.path_index = 0;
    }

    pub fn path(&self) -> Option<&[Cell]> {
        self.path.as_deref()
    }

    pub fn path_index(&self) -> usize {
        self.path_index
    }

    pub fn grid(&self) -> Arc<OccupancyGrid> {
        Arc::clone(&self.grid)
    }

    /// Swap in a new grid. The current path is kept until the next plan.
    pub fn set_grid(&mut self, grid: Arc<OccupancyGrid>) {
        debug!("Occupancy grid replaced ({}x{})", grid.rows(), grid.cols());
        self.grid = grid;
    }

    pub fn planner_name(&self) -> &str {
        self.planner.name()
    }

    /// Get the name of the current path follower
    pub fn path_follower_name(&self) -> &str {
        self.path_follower.name()
    }
}

impl std::fmt::Debug for Navigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("planner", &self.planner.name())
            .field("path_follower", &self.path_follower)
            .field("path", &self.path)
            .field("path_index", &self.path_index)
            .finish()
    }
}
