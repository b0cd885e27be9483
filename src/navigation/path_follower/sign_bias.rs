//! Sign-bias path follower implementation

use std::cmp::Ordering;

use super::PathFollower;
use crate::common::types::Cell;
use crate::config::FollowerConfig;
use crate::error::Result;

/// Steers a fixed amount toward the side the next waypoint lies on
#[derive(Debug, Clone, Default)]
pub struct SignBiasFollower {
    config: FollowerConfig,
}

impl SignBiasFollower {
    pub fn new(config: FollowerConfig) -> Self {
        SignBiasFollower { config }
    }
}

impl PathFollower for SignBiasFollower {
    fn name(&self) -> &str {
        "SignBiasFollower"
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
        match waypoint.col.cmp(&current.col) {
            Ordering::Greater => self.config.waypoint_bias,
            Ordering::Less => -self.config.waypoint_bias,
            Ordering::Equal => 0.0,
        }
    }
}
