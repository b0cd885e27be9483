//! Behavior arbitration core for an autonomous ground vehicle.
//!
//! Each control cycle the host captures a [`SensorSnapshot`], passes it to
//! [`Agent::step`] along with any pending operator [`Command`], and forwards
//! the resulting [`CommandOutput`] to the drive. The core is synchronous and
//! owns no I/O; sensor drivers, actuation and the description service live
//! in the host.
//!
//! ```no_run
//! use std::sync::Arc;
//! use rover_arbiter::{Agent, ArbiterConfig, Command, OccupancyGrid, SensorSnapshot};
//!
//! # fn main() -> rover_arbiter::Result<()> {
//! let mut agent = Agent::new(ArbiterConfig::from_env()?, Arc::new(OccupancyGrid::free(10, 10)));
//! agent.start()?;
//! let output = agent.step(Some(Command::Explore), &SensorSnapshot::default())?;
//! println!("throttle={} steering={}", output.drive.throttle, output.drive.steering);
//! # Ok(())
//! # }
//! ```

pub mod behaviors;
pub mod common;
pub mod config;
pub mod control;
pub mod error;
pub mod lifecycle;
pub mod navigation;
pub mod perception;

pub use crate::behaviors::{Agent, Command, Mode, Telemetry};
pub use crate::common::types::{Cell, Path};
pub use crate::config::ArbiterConfig;
pub use crate::control::{CommandOutput, DriveCommand, GamepadState};
pub use crate::error::{Error, Result};
pub use crate::lifecycle::{LifecycleNode, State};
pub use crate::navigation::occupancy::OccupancyGrid;
pub use crate::perception::arbiter::PerceptionSignal;
pub use crate::perception::sensors::{DepthFrame, LidarScan, SensorSnapshot, SnapshotSource};
