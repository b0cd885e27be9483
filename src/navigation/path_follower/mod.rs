//! Path following module with multiple steering laws
//!
//! A follower turns the current waypoint of a planned path, the VFH
//! heading and the vehicle's cell into a drive command. Local avoidance
//! wins over the path whenever the VFH heading is a significant turn.

use std::fmt::Debug;

use crate::common::types::Cell;
use crate::config::{FollowerConfig, FollowerKind};
use crate::control::DriveCommand;
use crate::error::Result;

pub mod proportional;
pub mod sign_bias;

pub use proportional::ProportionalFollower;
pub use sign_bias::SignBiasFollower;

/// Where the vehicle is believed to be this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleCell {
    /// Reported by a localization source
    Localized(Cell),
    /// Assumed without a position estimate; never used to judge arrival
    Assumed(Cell),
}

impl VehicleCell {
    pub fn from_estimate(position: Option<Cell>, fallback: Cell) -> Self {
        position.map_or(VehicleCell::Assumed(fallback), VehicleCell::Localized)
    }

    pub fn cell(&self) -> Cell {
        match *self {
            VehicleCell::Localized(cell) | VehicleCell::Assumed(cell) => cell,
        }
    }

    pub fn localized(&self) -> Option<Cell> {
        match *self {
            VehicleCell::Localized(cell) => Some(cell),
            VehicleCell::Assumed(_) => None,
        }
    }
}

/// Result of one follow step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowOutcome {
    pub command: DriveCommand,
    /// Index of the waypoint being driven to, `path.len()` once exhausted
    pub path_index: usize,
    /// The final waypoint has been reached
    pub finished: bool,
}

/// Trait for path following algorithms
pub trait PathFollower: Debug + Send + Sync {
    /// Get the name of this path follower
    fn name(&self) -> &str;

    fn config(&self) -> &FollowerConfig;

    /// Replace the follower parameters
    fn configure(&mut self, config: FollowerConfig) -> Result<()>;

    /// Steering toward `waypoint` from `current` when no avoidance turn is active
    fn lateral_steering(&self, current: Cell, waypoint: Cell) -> f64;

    /// Advance along `path` from `path_index` and compute this cycle's command.
    ///
    /// The index moves by at most one per call, and only on a localized
    /// arrival.
    fn follow(
        &self,
        path: &[Cell],
        path_index: usize,
        vfh_heading: f64,
        vehicle: VehicleCell,
    ) -> FollowOutcome {
        let config = self.config();
        let mut index = path_index;

        if let (Some(position), Some(target)) = (vehicle.localized(), path.get(index)) {
            if position.distance(target) < config.arrival_radius {
                index += 1;
            }
        }

        let Some(&target) = path.get(index) else {
            return FollowOutcome {
                command: DriveCommand::STOP,
                path_index: index,
                finished: true,
            };
        };

        let steering = if vfh_heading.abs() > config.turn_threshold {
            vfh_heading
        } else {
            self.lateral_steering(vehicle.cell(), target)
        };

        FollowOutcome {
            command: DriveCommand::new(config.cruise_throttle, steering)
                .clamped(config.steering_limit),
            path_index: index,
            finished: false,
        }
    }
}

/// Build the follower named by `config.kind`
pub fn from_config(config: &FollowerConfig) -> Box<dyn PathFollower> {
    match config.kind {
        FollowerKind::SignBias => Box::new(SignBiasFollower::new(config.clone())),
        FollowerKind::Proportional => Box::new(ProportionalFollower::new(config.clone())),
    }
}

/// Default implementation
pub use sign_bias::SignBiasFollower as DefaultPathFollower;
