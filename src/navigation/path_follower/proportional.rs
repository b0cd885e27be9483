//! Proportional lateral-offset path follower

use super::PathFollower;
use crate::common::clip;
use crate::common::types::Cell;
use crate::config::FollowerConfig;
use crate::error::Result;

/// Steering proportional to the column offset of the next waypoint
#[derive(Debug, Clone, Default)]
pub struct ProportionalFollower {
    config: FollowerConfig,
}

impl ProportionalFollower {
    pub fn new(config: FollowerConfig) -> Self {
        ProportionalFollower { config }
    }
}

impl PathFollower for ProportionalFollower {
    fn name(&self) -> &str {
        "ProportionalFollower"
    }

    fn config(&self) -> &FollowerConfig {
        &self.config
    }

    fn configure(&mut self, config: FollowerConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    fn lateral_steering(&self, current: Cell, waypoint: Cell) -> f64 {
        let offset = waypoint.col as f64 - current.col as f64;
        clip(self.config.lateral_gain * offset, self.config.steering_limit)
    }
}
