//! Sensor snapshots consumed once per control cycle

use nalgebra::DMatrix;

use crate::common::types::Cell;
use crate::control::GamepadState;
use crate::error::{Error, Result};
use crate::perception::arbiter::PerceptionSignal;

/// A planar lidar scan as parallel distance/angle arrays.
///
/// Distances are meters and may be NaN or infinite for no-return samples.
/// Angles are radians in any reference; they are normalized before use.
#[derive(Debug, Clone, PartialEq)]
pub struct LidarScan {
    distances: Vec<f64>,
    angles: Vec<f64>,
}

impl LidarScan {
    /// Build a scan, rejecting arrays of unequal length
    pub fn new(distances: Vec<f64>, angles: Vec<f64>) -> Result<Self> {
        if distances.len() != angles.len() {
            return Err(Error::LidarLengthMismatch {
                distances: distances.len(),
                angles: angles.len(),
            });
        }
        Ok(LidarScan { distances, angles })
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    pub fn angles(&self) -> &[f64] {
        &self.angles
    }

    /// Iterate over (distance, angle) samples
    pub fn samples(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.distances.iter().copied().zip(self.angles.iter().copied())
    }
}

/// A depth image in meters, stored as a `height × width` matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthFrame {
    depths: DMatrix<f32>,
}

impl DepthFrame {
    /// Build a frame from row-major samples (`data[y * width + x]`)
    pub fn from_row_slice(width: usize, height: usize, data: &[f32]) -> Result<Self> {
        let expected = width * height;
        if data.len() != expected {
            return Err(Error::DepthBufferMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(DepthFrame {
            depths: DMatrix::from_row_slice(height, width, data),
        })
    }

    /// A frame with every pixel set to `depth`
    pub fn filled(width: usize, height: usize, depth: f32) -> Self {
        DepthFrame {
            depths: DMatrix::from_element(height, width, depth),
        }
    }

    pub fn width(&self) -> usize {
        self.depths.ncols()
    }

    pub fn height(&self) -> usize {
        self.depths.nrows()
    }

    /// Depth at pixel (x, y), `None` when out of bounds
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        self.depths.get((y, x)).copied()
    }

    /// Overwrite the pixel at (x, y); out-of-bounds writes are ignored
    pub fn set(&mut self, x: usize, y: usize, depth: f32) {
        if let Some(px) = self.depths.get_mut((y, x)) {
            *px = depth;
        }
    }

    pub fn matrix(&self) -> &DMatrix<f32> {
        &self.depths
    }
}

/// Everything the arbiter reads in one cycle, captured atomically.
///
/// Absent sensors are `None` and are treated as "nothing detected".
#[derive(Debug, Clone, Default)]
pub struct SensorSnapshot {
    pub lidar: Option<LidarScan>,
    pub depth: Option<DepthFrame>,
    pub signal: PerceptionSignal,
    pub gamepad: GamepadState,
    /// Vehicle cell from an external localizer, if one is running
    pub position: Option<Cell>,
}

impl SensorSnapshot {
    pub fn with_lidar(mut self, scan: LidarScan) -> Self {
        self.lidar = Some(scan);
        self
    }

    pub fn with_depth(mut self, frame: DepthFrame) -> Self {
        self.depth = Some(frame);
        self
    }

    pub fn with_signal(mut self, signal: PerceptionSignal) -> Self {
        self.signal = signal;
        self
    }

    pub fn with_gamepad(mut self, gamepad: GamepadState) -> Self {
        self.gamepad = gamepad;
        self
    }

    pub fn with_position(mut self, cell: Cell) -> Self {
        self.position = Some(cell);
        self
    }
}

/// A source of per-cycle snapshots (hardware drivers, simulators, log replay)
pub trait SnapshotSource {
    /// Get the source name
    fn name(&self) -> &str;

    /// Capture a consistent snapshot of every sensor
    fn capture(&mut self) -> Result<SensorSnapshot>;
}
