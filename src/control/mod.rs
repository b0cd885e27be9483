//! Control module for the rover core
pub mod controllers;

use serde::{Deserialize, Serialize};

/// Throttle/steering pair sent to the actuation sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveCommand {
    pub throttle: f64,
    pub steering: f64,
}

impl DriveCommand {
    pub const STOP: DriveCommand = DriveCommand {
        throttle: 0.0,
        steering: 0.0,
    };

    pub const fn new(throttle: f64, steering: f64) -> Self {
        DriveCommand { throttle, steering }
    }

    /// Throttle clamped to [-1, 1] and steering to [-steering_limit, steering_limit].
    /// NaN components become 0.
    pub fn clamped(self, steering_limit: f64) -> Self {
        let sanitize = |v: f64| if v.is_nan() { 0.0 } else { v };
        DriveCommand {
            throttle: sanitize(self.throttle).clamp(-1.0, 1.0),
            steering: sanitize(self.steering).clamp(-steering_limit, steering_limit),
        }
    }

    pub fn is_stop(&self) -> bool {
        self.throttle == 0.0 && self.steering == 0.0
    }
}

/// Result of one arbitration cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub drive: DriveCommand,
    /// Ask the host to run the image-description service out of band
    pub request_description: bool,
}

impl CommandOutput {
    pub fn drive(drive: DriveCommand) -> Self {
        CommandOutput {
            drive,
            request_description: false,
        }
    }
}

/// Raw gamepad axes for teleoperation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GamepadState {
    /// True when the driver delivered a fresh sample this cycle
    pub new_read: bool,
    /// Left stick vertical axis, negative when pushed forward
    pub left_stick_y: f64,
    pub right_stick_x: f64,
}

impl GamepadState {
    pub fn new(left_stick_y: f64, right_stick_x: f64) -> Self {
        GamepadState {
            new_read: true,
            left_stick_y,
            right_stick_x,
        }
    }

    /// Direct passthrough; a stale read commands a stop
    pub fn drive(&self) -> DriveCommand {
        if self.new_read {
            DriveCommand::new(-self.left_stick_y, self.right_stick_x)
        } else {
            DriveCommand::STOP
        }
    }
}
