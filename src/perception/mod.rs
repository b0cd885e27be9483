//! Perception module for the rover core
pub mod arbiter;
pub mod depth_gate;
pub mod filters;
pub mod sensors;
pub mod vfh;

use self::arbiter::{PerceptionArbiter, PerceptionSignal, TargetKind, TargetObservation};
use self::depth_gate::DepthGate;
use self::sensors::SensorSnapshot;
use self::vfh::Vfh;
use crate::config::ArbiterConfig;
use crate::error::Result;

/// Perception stack for the rover: obstacle checks, local heading and
/// target observation over one sensor snapshot.
#[derive(Debug, Clone)]
pub struct PerceptionStack {
    depth_gate: DepthGate,
    vfh: Vfh,
    arbiter: PerceptionArbiter,
}

impl PerceptionStack {
    /// Create a new perception stack
    pub fn new(config: &ArbiterConfig) -> Self {
        PerceptionStack {
            depth_gate: DepthGate::new(config.depth_gate.clone()),
            vfh: Vfh::new(config.vfh.clone()),
            arbiter: PerceptionArbiter::new(config.perception.clone()),
        }
    }

    /// True when either the depth gate or the lidar proximity check fires.
    ///
    /// Missing sensors contribute nothing. The depth frame is checked first,
    /// so a frame too small for the scan box is an error even when the lidar
    /// alone would fire.
    pub fn obstacle_detected(&self, snapshot: &SensorSnapshot) -> Result<bool> {
        let depth_blocked = match &snapshot.depth {
            Some(frame) => self.depth_gate.is_obstacle(frame)?,
            None => false,
        };
        Ok(depth_blocked || self.vfh.is_obstacle_present(snapshot.lidar.as_ref()))
    }

    /// VFH heading for this snapshot
    pub fn vfh_heading(&self, snapshot: &SensorSnapshot) -> f64 {
        self.vfh.steering_heading(snapshot.lidar.as_ref())
    }

    pub fn observe(&self, signal: &PerceptionSignal, kind: TargetKind) -> TargetObservation {
        self.arbiter.observe(signal, kind)
    }

    pub fn depth_gate(&self) -> &DepthGate {
        &self.depth_gate
    }

    pub fn vfh(&self) -> &Vfh {
        &self.vfh
    }

    pub fn arbiter(&self) -> &PerceptionArbiter {
        &self.arbiter
    }
}
