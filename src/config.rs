//! Runtime configuration for the arbitration core.
//!
//! Every section has a `Default` matching the vehicle's stock tuning, so a
//! TOML file only needs to list the values it overrides:
//!
//! ```toml
//! [vfh]
//! num_sectors = 72
//!
//! [agent]
//! default_goal = { row = 4, col = 7 }
//! ```

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::common::types::Cell;
use crate::error::{Error, Result};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "./config/arbiter.toml";

/// Complete configuration for the arbitration core
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    pub depth_gate: DepthGateConfig,
    pub vfh: VfhConfig,
    pub follower: FollowerConfig,
    pub perception: PerceptionConfig,
    pub agent: AgentConfig,
}

impl ArbiterConfig {
    /// Parse a configuration from TOML text and validate it
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ArbiterConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        info!("Loaded arbiter configuration from {}", path.display());
        Ok(config)
    }

    /// Load from `CONFIG_PATH` (or the default path), falling back to the
    /// built-in defaults when no file exists there.
    pub fn from_env() -> Result<Self> {
        let config_path =
            env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        if Path::new(&config_path).exists() {
            Self::load(&config_path)
        } else {
            warn!("No config at {}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Check every section
    pub fn validate(&self) -> Result<()> {
        self.depth_gate.validate()?;
        self.vfh.validate()?;
        self.follower.validate()?;
        self.perception.validate()?;
        self.agent.validate()
    }
}

fn require_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::invalid_config(format!("{name} must be positive, got {value}")))
    }
}

fn require_non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::invalid_config(format!("{name} must be non-negative, got {value}")))
    }
}

/// Depth obstacle gate parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthGateConfig {
    /// Stop when anything in the scan box is closer than this (meters)
    pub obstacle_threshold: f32,
    pub scan_box_width: usize,
    pub scan_box_height: usize,
}

impl Default for DepthGateConfig {
    fn default() -> Self {
        DepthGateConfig {
            obstacle_threshold: 0.25,
            scan_box_width: 120,
            scan_box_height: 80,
        }
    }
}

impl DepthGateConfig {
    pub fn validate(&self) -> Result<()> {
        require_positive("depth_gate.obstacle_threshold", f64::from(self.obstacle_threshold))?;
        if self.scan_box_width == 0 || self.scan_box_height == 0 {
            return Err(Error::invalid_config("depth_gate scan box must be non-empty"));
        }
        Ok(())
    }
}

/// Vector field histogram parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VfhConfig {
    pub num_sectors: usize,
    /// Samples closer than this count toward their sector (meters)
    pub min_distance: f64,
    /// Any sample closer than this triggers the evasive stop (meters)
    pub stop_distance: f64,
}

impl Default for VfhConfig {
    fn default() -> Self {
        VfhConfig {
            num_sectors: 36,
            min_distance: 0.5,
            stop_distance: 0.25,
        }
    }
}

impl VfhConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_sectors == 0 {
            return Err(Error::invalid_config("vfh.num_sectors must be positive"));
        }
        require_positive("vfh.min_distance", self.min_distance)?;
        require_positive("vfh.stop_distance", self.stop_distance)
    }
}

/// Which waypoint steering law the navigator uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowerKind {
    #[default]
    SignBias,
    Proportional,
}

/// Path follower parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowerConfig {
    pub kind: FollowerKind,
    /// VFH headings larger than this override the path bias (radians)
    pub turn_threshold: f64,
    pub cruise_throttle: f64,
    /// Steering magnitude of the sign-bias follower
    pub waypoint_bias: f64,
    /// Steering per column of lateral offset for the proportional follower
    pub lateral_gain: f64,
    /// Distance (cells) at which a waypoint counts as reached
    pub arrival_radius: f64,
    pub steering_limit: f64,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        FollowerConfig {
            kind: FollowerKind::SignBias,
            turn_threshold: 0.1,
            cruise_throttle: 0.2,
            waypoint_bias: 0.1,
            lateral_gain: 0.05,
            arrival_radius: 0.5,
            steering_limit: 0.5,
        }
    }
}

impl FollowerConfig {
    pub fn validate(&self) -> Result<()> {
        require_non_negative("follower.turn_threshold", self.turn_threshold)?;
        require_non_negative("follower.waypoint_bias", self.waypoint_bias)?;
        require_non_negative("follower.lateral_gain", self.lateral_gain)?;
        require_positive("follower.arrival_radius", self.arrival_radius)?;
        require_positive("follower.steering_limit", self.steering_limit)
    }
}

/// Perception arbiter parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    /// Camera frame width in pixels
    pub frame_width: f64,
    /// Colour blobs must be larger than this (px²) to count as a target
    pub min_target_area: f64,
    /// Image row at which the lane line is sampled
    pub lane_scan_row: f64,
    pub target_gain: f64,
    pub lane_gain: f64,
    pub deadband_px: f64,
    pub steering_limit: f64,
    /// Weight of the newest lane steering sample, 1.0 disables smoothing
    pub lane_smoothing: f64,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        PerceptionConfig {
            frame_width: 640.0,
            min_target_area: 300.0,
            lane_scan_row: 96.0,
            target_gain: 0.01,
            lane_gain: 0.005,
            deadband_px: 0.0,
            steering_limit: 0.5,
            lane_smoothing: 1.0,
        }
    }
}

impl PerceptionConfig {
    pub fn validate(&self) -> Result<()> {
        require_positive("perception.frame_width", self.frame_width)?;
        require_non_negative("perception.min_target_area", self.min_target_area)?;
        require_non_negative("perception.deadband_px", self.deadband_px)?;
        require_positive("perception.steering_limit", self.steering_limit)?;
        if !(self.lane_smoothing > 0.0 && self.lane_smoothing <= 1.0) {
            return Err(Error::invalid_config(format!(
                "perception.lane_smoothing must be in (0, 1], got {}",
                self.lane_smoothing
            )));
        }
        Ok(())
    }
}

/// Behavior-level parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Assumed vehicle cell when no position estimate is available
    pub home_cell: Cell,
    /// Goal used by a navigate command that names none
    pub default_goal: Cell,
    pub explore_throttle: f64,
    pub search_throttle: f64,
    pub track_throttle: f64,
    pub face_throttle: f64,
    pub lane_throttle: f64,
    pub evasive_throttle: f64,
    pub evasive_steering: f64,
    pub steering_limit: f64,
    /// When false, teleop is a full manual override and skips the obstacle gate
    pub teleop_respects_gate: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            home_cell: Cell::new(0, 0),
            default_goal: Cell::new(9, 9),
            explore_throttle: 0.2,
            search_throttle: 0.2,
            track_throttle: 0.2,
            face_throttle: 0.1,
            lane_throttle: 0.1,
            evasive_throttle: -0.2,
            evasive_steering: 0.5,
            steering_limit: 0.5,
            teleop_respects_gate: false,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        require_positive("agent.steering_limit", self.steering_limit)?;
        if self.evasive_throttle >= 0.0 {
            return Err(Error::invalid_config(
                "agent.evasive_throttle must be negative (reverse)",
            ));
        }
        Ok(())
    }
}
