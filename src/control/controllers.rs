//! Controllers for the rover

use crate::common::clip;

/// Proportional steering on a pixel offset with deadband and saturation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProportionalSteering {
    gain: f64,
    deadband: f64,
    limit: f64,
}

impl ProportionalSteering {
    /// Create a new controller
    pub fn new(gain: f64, deadband: f64, limit: f64) -> Self {
        ProportionalSteering {
            gain,
            deadband: deadband.abs(),
            limit: limit.abs(),
        }
    }

    /// Steering command for a signed offset from frame center
    pub fn steer(&self, offset: f64) -> f64 {
        if !offset.is_finite() || offset.abs() <= self.deadband {
            return 0.0;
        }
        clip(self.gain * offset, self.limit)
    }
}
