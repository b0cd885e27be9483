//! Error types for the arbitration core.

use std::path::PathBuf;

use thiserror::Error;

use crate::common::types::Cell;

/// Errors raised by the arbitration core.
///
/// Invalid input is always reported here rather than degraded into a
/// default "no obstacle" answer. A planner that finds no route is not an
/// error and returns `Ok(None)` instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Lidar distance and angle arrays differ in length.
    #[error("lidar scan mismatch: {distances} distances but {angles} angles")]
    LidarLengthMismatch {
        /// Number of distance samples.
        distances: usize,
        /// Number of angle samples.
        angles: usize,
    },

    /// Depth buffer does not match the declared frame size.
    #[error("depth buffer size mismatch: expected {expected}, got {actual}")]
    DepthBufferMismatch {
        /// Expected number of samples (width × height).
        expected: usize,
        /// Actual number of samples.
        actual: usize,
    },

    /// Depth frame cannot contain the scan box.
    #[error(
        "depth frame {width}x{height} is smaller than the {box_width}x{box_height} scan box"
    )]
    DepthFrameTooSmall {
        /// Frame width in pixels.
        width: usize,
        /// Frame height in pixels.
        height: usize,
        /// Scan box width in pixels.
        box_width: usize,
        /// Scan box height in pixels.
        box_height: usize,
    },

    /// Occupancy rows of unequal width.
    #[error("ragged occupancy grid: row {row} has {actual} cells, expected {expected}")]
    RaggedGrid {
        /// Offending row index.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        actual: usize,
    },

    /// A planning endpoint lies outside the grid.
    #[error("cell {0} is outside the occupancy grid")]
    CellOutOfBounds(Cell),

    /// The planning start cell is occupied.
    #[error("start cell {0} is blocked")]
    StartBlocked(Cell),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`crate::config::ArbiterConfig`].
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Command text that no command source recognizes.
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    /// Lifecycle transition requested from the wrong state.
    #[error("lifecycle error: {0}")]
    Lifecycle(String),
}

impl Error {
    /// Creates an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// True for errors caused by a malformed per-cycle input rather than
    /// by configuration or lifecycle misuse.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::LidarLengthMismatch { .. }
                | Self::DepthBufferMismatch { .. }
                | Self::DepthFrameTooSmall { .. }
                | Self::RaggedGrid { .. }
                | Self::CellOutOfBounds(_)
                | Self::StartBlocked(_)
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lidar_mismatch_display() {
        let err = Error::LidarLengthMismatch {
            distances: 360,
            angles: 359,
        };
        let msg = err.to_string();
        assert!(msg.contains("360"));
        assert!(msg.contains("359"));
        assert!(err.is_invalid_input());
    }

    #[test]
    fn blocked_start_mentions_cell() {
        let err = Error::StartBlocked(Cell::new(2, 3));
        assert!(err.to_string().contains("(2, 3)"));
    }

    #[test]
    fn config_errors_are_not_input_errors() {
        assert!(!Error::invalid_config("num_sectors must be positive").is_invalid_input());
        assert!(!Error::UnknownCommand("dance".into()).is_invalid_input());
    }
}
