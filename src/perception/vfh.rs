//! Vector field histogram local avoidance
//!
//! Nearby lidar returns are binned into equal angular sectors over
//! `[0, 2π)`. The emptiest sector wins, lowest index first, and the heading
//! is its signed offset from the sector facing straight ahead.

use std::f64::consts::TAU;

use tracing::debug;

use crate::config::VfhConfig;
use crate::perception::sensors::LidarScan;

/// Histogram-based heading selector
#[derive(Debug, Clone)]
pub struct Vfh {
    config: VfhConfig,
}

impl Vfh {
    pub fn new(config: VfhConfig) -> Self {
        Vfh { config }
    }

    pub fn config(&self) -> &VfhConfig {
        &self.config
    }

    /// Angular width of one sector (radians)
    pub fn sector_width(&self) -> f64 {
        TAU / self.config.num_sectors as f64
    }

    /// Sector index for an angle in any reference.
    ///
    /// Angles are wrapped into `[0, 2π)` first, so lidars that report
    /// `[-π, π)` index the same sectors as those reporting `[0, 2π)`.
    /// Non-finite angles have no sector, and neither does anything when the
    /// histogram has no sectors.
    pub fn sector_of(&self, angle: f64) -> Option<usize> {
        if !angle.is_finite() || self.config.num_sectors == 0 {
            return None;
        }
        let normalized = angle.rem_euclid(TAU);
        let sector = (normalized / self.sector_width()).floor() as usize;
        Some(sector % self.config.num_sectors)
    }

    /// Count of near samples per sector
    pub fn histogram(&self, scan: &LidarScan) -> Vec<u32> {
        let mut histogram = vec![0u32; self.config.num_sectors];
        for (distance, angle) in scan.samples() {
            if distance.is_finite() && distance < self.config.min_distance {
                if let Some(sector) = self.sector_of(angle) {
                    histogram[sector] += 1;
                }
            }
        }
        histogram
    }

    /// Signed heading (radians) toward the most open sector.
    ///
    /// Returns `0.0` when no scan is available or there are no sectors.
    pub fn steering_heading(&self, scan: Option<&LidarScan>) -> f64 {
        let Some(scan) = scan else {
            return 0.0;
        };
        if self.config.num_sectors == 0 {
            return 0.0;
        }
        let histogram = self.histogram(scan);
        // min_by_key keeps the first of equal minima
        let best = histogram
            .iter()
            .enumerate()
            .min_by_key(|(_, count)| **count)
            .map(|(sector, _)| sector)
            .unwrap_or(0);
        let half = self.config.num_sectors as f64 / 2.0;
        (best as f64 - half) * self.sector_width()
    }

    /// True iff any finite return is closer than the stop distance
    pub fn is_obstacle_present(&self, scan: Option<&LidarScan>) -> bool {
        let Some(scan) = scan else {
            return false;
        };
        let nearest = scan
            .distances()
            .iter()
            .copied()
            .filter(|d| d.is_finite() && *d < self.config.stop_distance)
            .fold(f64::INFINITY, f64::min);
        if nearest.is_finite() {
            debug!("Lidar return at {:.2} m inside stop distance", nearest);
            true
        } else {
            false
        }
    }
}

impl Default for Vfh {
    fn default() -> Self {
        Vfh::new(VfhConfig::default())
    }
}
