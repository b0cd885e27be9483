//! Hard-stop gate over a centered region of the depth image

use tracing::debug;

use crate::config::DepthGateConfig;
use crate::error::{Error, Result};
use crate::perception::sensors::DepthFrame;

/// Flags an obstacle when anything inside the centered scan box is closer
/// than the threshold.
///
/// NaN and infinite samples are ignored. A box with no finite sample reports
/// no obstacle: the gate fails open so that a blinded depth camera does not
/// freeze the vehicle, and the lidar proximity check still applies.
#[derive(Debug, Clone)]
pub struct DepthGate {
    config: DepthGateConfig,
}

impl DepthGate {
    pub fn new(config: DepthGateConfig) -> Self {
        DepthGate { config }
    }

    pub fn config(&self) -> &DepthGateConfig {
        &self.config
    }

    /// Pixel origin (x, y) of the scan box inside `frame`
    fn scan_origin(&self, frame: &DepthFrame) -> Result<(usize, usize)> {
        let (width, height) = (frame.width(), frame.height());
        let (box_width, box_height) = (self.config.scan_box_width, self.config.scan_box_height);
        if width < box_width || height < box_height {
            return Err(Error::DepthFrameTooSmall {
                width,
                height,
                box_width,
                box_height,
            });
        }
        Ok((width / 2 - box_width / 2, height / 2 - box_height / 2))
    }

    /// Smallest finite depth inside the scan box
    pub fn nearest(&self, frame: &DepthFrame) -> Result<Option<f32>> {
        let (x, y) = self.scan_origin(frame)?;
        let region = frame.matrix().view(
            (y, x),
            (self.config.scan_box_height, self.config.scan_box_width),
        );
        Ok(region
            .iter()
            .copied()
            .filter(|d| d.is_finite())
            .fold(None, |nearest: Option<f32>, d| {
                Some(nearest.map_or(d, |n| n.min(d)))
            }))
    }

    /// True iff the nearest finite depth in the scan box is below the threshold
    pub fn is_obstacle(&self, frame: &DepthFrame) -> Result<bool> {
        let blocked = matches!(
            self.nearest(frame)?,
            Some(d) if d < self.config.obstacle_threshold
        );
        if blocked {
            debug!("Depth gate triggered");
        }
        Ok(blocked)
    }
}

impl Default for DepthGate {
    fn default() -> Self {
        DepthGate::new(DepthGateConfig::default())
    }
}
