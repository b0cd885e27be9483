//! Perception arbiter
//!
//! The vision detectors each report a different shape (colour centroid,
//! face box, lane line). The arbiter reduces whichever one is present to a
//! "target present" flag and a signed horizontal offset from frame center,
//! positive when the target is left of center.

use serde::{Deserialize, Serialize};

use crate::config::PerceptionConfig;

/// Output of the external vision detectors for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PerceptionSignal {
    #[default]
    None,
    /// Colour or object centroid with blob area in px²
    Point { x: f64, y: f64, area: f64 },
    /// Face bounding box, top-left corner plus size
    BoundingBox { x: f64, y: f64, w: f64, h: f64 },
    /// Lane line fitted as `row = slope * col + intercept`
    LaneLine { slope: f64, intercept: f64 },
}

/// Which detector a behavior listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Colour,
    Face,
    Lane,
}

/// Normalized view of a perception signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetObservation {
    pub present: bool,
    /// Pixels from frame center to the target reference point
    pub offset: f64,
}

impl TargetObservation {
    pub const ABSENT: TargetObservation = TargetObservation {
        present: false,
        offset: 0.0,
    };

    fn at(offset: f64) -> Self {
        TargetObservation {
            present: true,
            offset,
        }
    }
}

/// Maps heterogeneous detector output to [`TargetObservation`]
#[derive(Debug, Clone)]
pub struct PerceptionArbiter {
    config: PerceptionConfig,
}

impl PerceptionArbiter {
    pub fn new(config: PerceptionConfig) -> Self {
        PerceptionArbiter { config }
    }

    pub fn config(&self) -> &PerceptionConfig {
        &self.config
    }

    fn center_x(&self) -> f64 {
        self.config.frame_width / 2.0
    }

    /// Observe `signal` as seen by a behavior that tracks `kind`.
    ///
    /// A signal of another kind counts as absent.
    pub fn observe(&self, signal: &PerceptionSignal, kind: TargetKind) -> TargetObservation {
        match (kind, *signal) {
            (TargetKind::Colour, PerceptionSignal::Point { x, area, .. }) => {
                if x.is_finite() && area > self.config.min_target_area {
                    TargetObservation::at(self.center_x() - x)
                } else {
                    TargetObservation::ABSENT
                }
            }
            (TargetKind::Face, PerceptionSignal::BoundingBox { x, w, .. }) => {
                if x.is_finite() && w.is_finite() {
                    TargetObservation::at(self.center_x() - (x + w / 2.0))
                } else {
                    TargetObservation::ABSENT
                }
            }
            (TargetKind::Lane, PerceptionSignal::LaneLine { slope, intercept }) => {
                if !slope.is_finite() || !intercept.is_finite() {
                    return TargetObservation::ABSENT;
                }
                let lane_x = if slope != 0.0 {
                    (self.config.lane_scan_row - intercept) / slope
                } else {
                    self.center_x()
                };
                TargetObservation::at(self.center_x() - lane_x)
            }
            _ => TargetObservation::ABSENT,
        }
    }

    /// True when `signal` carries an acceptable target of `kind`
    pub fn is_acquired(&self, signal: &PerceptionSignal, kind: TargetKind) -> bool {
        self.observe(signal, kind).present
    }
}

impl Default for PerceptionArbiter {
    fn default() -> Self {
        PerceptionArbiter::new(PerceptionConfig::default())
    }
}
