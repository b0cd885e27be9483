//! Behaviors module for the rover
//!
//! [`Mode`] is the behavior currently driving the vehicle and [`Command`]
//! is an operator request to change it. The transition rules live here as
//! pure functions; [`agent::Agent`] applies them once per control cycle.

pub mod agent;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::types::Cell;
use crate::error::{Error, Result};
use crate::perception::arbiter::TargetKind;

pub use agent::{Agent, Telemetry};

/// Active behavior. Exactly one at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Stopped,
    Navigating,
    Exploring,
    Teleop,
    Searching,
    Tracking,
    FaceTracking,
    LaneFollowing,
}

impl Mode {
    /// Mode selected by an operator command
    pub fn apply(self, command: &Command) -> Mode {
        match command {
            Command::Navigate { .. } => Mode::Navigating,
            Command::Explore => Mode::Exploring,
            Command::Teleop => Mode::Teleop,
            Command::Search => Mode::Searching,
            Command::Track => Mode::Tracking,
            Command::FaceTrack => Mode::FaceTracking,
            Command::LaneFollow => Mode::LaneFollowing,
            Command::Stop => Mode::Stopped,
        }
    }

    /// Mode after the perception target was (or was not) seen this cycle
    pub fn on_target(self, acquired: bool) -> Mode {
        match (self, acquired) {
            (Mode::Exploring, true) => Mode::Stopped,
            (Mode::Searching, true) => Mode::Tracking,
            (Mode::Tracking, false) => Mode::Searching,
            (mode, _) => mode,
        }
    }

    /// Detector this mode listens to, if any
    pub fn target_kind(self) -> Option<TargetKind> {
        match self {
            Mode::Exploring | Mode::Searching | Mode::Tracking => Some(TargetKind::Colour),
            Mode::FaceTracking => Some(TargetKind::Face),
            Mode::LaneFollowing => Some(TargetKind::Lane),
            Mode::Stopped | Mode::Navigating | Mode::Teleop => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Stopped => "stopped",
            Mode::Navigating => "navigating",
            Mode::Exploring => "exploring",
            Mode::Teleop => "teleop",
            Mode::Searching => "searching",
            Mode::Tracking => "tracking",
            Mode::FaceTracking => "face_tracking",
            Mode::LaneFollowing => "lane_following",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator request from the keyboard, voice or web front ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Plan to `goal`, or to the configured default goal
    Navigate { goal: Option<Cell> },
    Explore,
    Teleop,
    Search,
    Track,
    FaceTrack,
    LaneFollow,
    Stop,
}

impl Command {
    /// Keyboard binding
    pub fn from_key(key: char) -> Option<Command> {
        match key.to_ascii_lowercase() {
            'n' => Some(Command::Navigate { goal: None }),
            'e' => Some(Command::Explore),
            'g' => Some(Command::Teleop),
            's' => Some(Command::Search),
            't' => Some(Command::Track),
            'f' => Some(Command::FaceTrack),
            'l' => Some(Command::LaneFollow),
            ' ' => Some(Command::Stop),
            _ => None,
        }
    }
}

/// Accepts `explore`, `face track`, `Lane-Follow`, `navigate 4 7` and the like
impl FromStr for Command {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let unknown = || Error::UnknownCommand(text.to_string());
        let lowered = text.trim().to_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();

        if tokens.first() == Some(&"navigate") {
            return match tokens[1..] {
                [] => Ok(Command::Navigate { goal: None }),
                [row, col] => {
                    let row = row.parse().map_err(|_| unknown())?;
                    let col = col.parse().map_err(|_| unknown())?;
                    Ok(Command::Navigate {
                        goal: Some(Cell::new(row, col)),
                    })
                }
                _ => Err(unknown()),
            };
        }

        match tokens.join("_").replace('-', "_").as_str() {
            "explore" => Ok(Command::Explore),
            "teleop" => Ok(Command::Teleop),
            "search" => Ok(Command::Search),
            "track" => Ok(Command::Track),
            "face_track" => Ok(Command::FaceTrack),
            "lane_follow" => Ok(Command::LaneFollow),
            "stop" => Ok(Command::Stop),
            _ => Err(unknown()),
        }
    }
}
