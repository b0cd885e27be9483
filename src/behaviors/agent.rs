//! Behavior arbitration agent
//!
//! One [`Agent::step`] per control cycle, in strict priority order:
//!
//! 1. apply the pending operator command,
//! 2. run the obstacle gate and, if it fires, return the evasive command,
//! 3. compute the VFH heading,
//! 4. apply perception-driven transitions, then dispatch on the resulting
//!    mode. The cycle that loses a tracked target holds still.
//!
//! Teleop skips step 2 unless `agent.teleop_respects_gate` is set: the
//! operator is in full manual control and owns the vehicle's safety.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Command, Mode};
use crate::common::types::{Cell, Path};
use crate::config::ArbiterConfig;
use crate::control::controllers::ProportionalSteering;
use crate::control::{CommandOutput, DriveCommand};
use crate::error::Result;
use crate::lifecycle::{LifecycleNode, LifecycleNodeBase, State};
use crate::navigation::occupancy::OccupancyGrid;
use crate::navigation::path_follower::VehicleCell;
use crate::navigation::Navigator;
use crate::perception::arbiter::TargetKind;
use crate::perception::filters::{Filter, LowPassFilter};
use crate::perception::sensors::SensorSnapshot;
use crate::perception::PerceptionStack;

/// Read-only view of the agent for dashboards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub mode: Mode,
    pub path: Option<Path>,
    pub path_index: usize,
    pub last_command: DriveCommand,
}

/// The behavior state machine
#[derive(Debug)]
pub struct Agent {
    base: LifecycleNodeBase,
    config: ArbiterConfig,
    perception: PerceptionStack,
    navigator: Navigator,
    target_steering: ProportionalSteering,
    lane_steering: ProportionalSteering,
    lane_filter: LowPassFilter,
    mode: Mode,
    last_command: DriveCommand,
}

impl Agent {
    /// Create an unconfigured agent over `grid`
    pub fn new(config: ArbiterConfig, grid: Arc<OccupancyGrid>) -> Self {
        let perception_cfg = &config.perception;
        Agent {
            base: LifecycleNodeBase::new("arbiter_agent"),
            perception: PerceptionStack::new(&config),
            navigator: Navigator::new(grid, &config.follower),
            target_steering: ProportionalSteering::new(
                perception_cfg.target_gain,
                perception_cfg.deadband_px,
                perception_cfg.steering_limit,
            ),
            lane_steering: ProportionalSteering::new(
                perception_cfg.lane_gain,
                perception_cfg.deadband_px,
                perception_cfg.steering_limit,
            ),
            lane_filter: LowPassFilter::new(perception_cfg.lane_smoothing),
            mode: Mode::Stopped,
            last_command: DriveCommand::STOP,
            config,
        }
    }

    /// Configure and activate in one go
    pub fn start(&mut self) -> Result<()> {
        self.on_configure()?;
        self.on_activate()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn path(&self) -> Option<&[Cell]> {
        self.navigator.path()
    }

    pub fn path_index(&self) -> usize {
        self.navigator.path_index()
    }

    pub fn config(&self) -> &ArbiterConfig {
        &self.config
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut Navigator {
        &mut self.navigator
    }

    /// Swap in a new occupancy grid; the next navigate command plans on it
    pub fn set_grid(&mut self, grid: Arc<OccupancyGrid>) {
        self.navigator.set_grid(grid);
    }

    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            mode: self.mode,
            path: self.navigator.path().map(<[Cell]>::to_vec),
            path_index: self.navigator.path_index(),
            last_command: self.last_command,
        }
    }

    /// Run one control cycle.
    ///
    /// A malformed snapshot (undersized depth frame) or an invalid navigate
    /// query is returned as an error; the caller skips the cycle. Mode
    /// changes made before the error stand.
    pub fn step(&mut self, command: Option<Command>, snapshot: &SensorSnapshot) -> Result<CommandOutput> {
        if !self.base.is_active() {
            return Ok(CommandOutput::default());
        }

        if let Some(command) = command {
            self.apply_command(command, snapshot)?;
        }

        let output = self.arbitrate(snapshot)?;
        let drive = output.drive.clamped(self.config.agent.steering_limit);
        self.last_command = drive;
        Ok(CommandOutput { drive, ..output })
    }

    fn vehicle(&self, snapshot: &SensorSnapshot) -> VehicleCell {
        VehicleCell::from_estimate(snapshot.position, self.config.agent.home_cell)
    }

    fn apply_command(&mut self, command: Command, snapshot: &SensorSnapshot) -> Result<()> {
        debug!("Command {:?} in mode {}", command, self.mode);
        let next = self.mode.apply(&command);

        let Command::Navigate { goal } = command else {
            if command == Command::LaneFollow {
                self.lane_filter.reset();
            }
            self.transition(next);
            return Ok(());
        };

        let goal = goal.unwrap_or(self.config.agent.default_goal);
        let start = self.vehicle(snapshot).cell();
        match self.navigator.plan(start, goal) {
            Ok(true) => {
                self.transition(Mode::Navigating);
                Ok(())
            }
            Ok(false) => {
                warn!("Goal {} unreachable, stopping", goal);
                self.transition(Mode::Stopped);
                Ok(())
            }
            Err(e) => {
                warn!("Rejected navigate to {}: {}", goal, e);
                self.transition(Mode::Stopped);
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: Mode) {
        if self.mode == Mode::Navigating && next != Mode::Navigating {
            self.navigator.clear();
        }
        if next != self.mode {
            info!("Mode {} -> {}", self.mode, next);
            self.mode = next;
        }
    }

    fn arbitrate(&mut self, snapshot: &SensorSnapshot) -> Result<CommandOutput> {
        let agent_cfg = &self.config.agent;

        if self.mode == Mode::Teleop && !agent_cfg.teleop_respects_gate {
            return Ok(CommandOutput::drive(snapshot.gamepad.drive()));
        }

        if self.perception.obstacle_detected(snapshot)? {
            debug!("Obstacle gate fired in mode {}", self.mode);
            return Ok(CommandOutput::drive(DriveCommand::new(
                agent_cfg.evasive_throttle,
                agent_cfg.evasive_steering,
            )));
        }

        let heading = self.perception.vfh_heading(snapshot);

        let mut request_description = false;
        if let Some(kind) = self.mode.target_kind() {
            let acquired = self.perception.arbiter().is_acquired(&snapshot.signal, kind);
            let next = self.mode.on_target(acquired);
            if self.mode == Mode::Exploring && next == Mode::Stopped {
                info!("Target found while exploring, requesting description");
                request_description = true;
            }
            let lost_track = self.mode == Mode::Tracking && next == Mode::Searching;
            self.transition(next);
            // searching resumes next cycle
            if lost_track {
                return Ok(CommandOutput::drive(DriveCommand::STOP));
            }
        }

        let drive = self.act(heading, snapshot);
        Ok(CommandOutput {
            drive,
            request_description,
        })
    }

    /// Mode-specific drive command for a cycle the gate let through
    fn act(&mut self, heading: f64, snapshot: &SensorSnapshot) -> DriveCommand {
        let agent_cfg = &self.config.agent;
        match self.mode {
            Mode::Stopped => DriveCommand::STOP,
            Mode::Teleop => snapshot.gamepad.drive(),
            Mode::Exploring => DriveCommand::new(agent_cfg.explore_throttle, heading),
            Mode::Searching => DriveCommand::new(agent_cfg.search_throttle, heading),
            Mode::Tracking => {
                let target = self.perception.observe(&snapshot.signal, TargetKind::Colour);
                DriveCommand::new(agent_cfg.track_throttle, self.target_steering.steer(target.offset))
            }
            Mode::FaceTracking => {
                let face = self.perception.observe(&snapshot.signal, TargetKind::Face);
                if face.present {
                    DriveCommand::new(agent_cfg.face_throttle, self.target_steering.steer(face.offset))
                } else {
                    DriveCommand::STOP
                }
            }
            Mode::LaneFollowing => {
                let lane = self.perception.observe(&snapshot.signal, TargetKind::Lane);
                if lane.present {
                    let steering = self.lane_filter.filter(self.lane_steering.steer(lane.offset));
                    DriveCommand::new(agent_cfg.lane_throttle, steering)
                } else {
                    DriveCommand::STOP
                }
            }
            Mode::Navigating => self.navigate(heading, snapshot),
        }
    }

    fn navigate(&mut self, heading: f64, snapshot: &SensorSnapshot) -> DriveCommand {
        let vehicle = self.vehicle(snapshot);
        match self.navigator.follow(heading, vehicle) {
            Some(outcome) if outcome.finished => {
                info!("Reached final waypoint");
                self.transition(Mode::Stopped);
                DriveCommand::STOP
            }
            Some(outcome) => outcome.command,
            None => {
                warn!("Navigating without a path, stopping");
                self.transition(Mode::Stopped);
                DriveCommand::STOP
            }
        }
    }
}

impl LifecycleNode for Agent {
    fn on_configure(&mut self) -> Result<()> {
        self.config.validate()?;
        self.base.transition(State::Unconfigured, State::Inactive)
    }

    fn on_activate(&mut self) -> Result<()> {
        self.base.transition(State::Inactive, State::Active)
    }

    fn on_deactivate(&mut self) -> Result<()> {
        self.base.transition(State::Active, State::Inactive)?;
        self.transition(Mode::Stopped);
        self.navigator.clear();
        self.last_command = DriveCommand::STOP;
        Ok(())
    }

    fn on_cleanup(&mut self) -> Result<()> {
        self.base.transition(State::Inactive, State::Unconfigured)
    }

    fn on_shutdown(&mut self) -> Result<()> {
        self.transition(Mode::Stopped);
        self.navigator.clear();
        self.base.finalize();
        Ok(())
    }

    fn state(&self) -> State {
        self.base.get_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::GamepadState;
    use crate::error::Error;
    use crate::perception::arbiter::PerceptionSignal;
    use crate::perception::sensors::{DepthFrame, LidarScan};

    fn agent() -> Agent {
        let mut agent = Agent::new(ArbiterConfig::default(), Arc::new(OccupancyGrid::free(10, 10)));
        agent.start().unwrap();
        agent
    }

    fn blocking_depth() -> DepthFrame {
        DepthFrame::filled(640, 480, 0.1)
    }

    fn colour(x: f64) -> PerceptionSignal {
        PerceptionSignal::Point {
            x,
            y: 240.0,
            area: 1000.0,
        }
    }

    #[test]
    fn starts_stopped_and_idle() {
        let mut agent = agent();
        let out = agent.step(None, &SensorSnapshot::default()).unwrap();
        assert_eq!(agent.mode(), Mode::Stopped);
        assert!(out.drive.is_stop());
        assert!(!out.request_description);
    }

    #[test]
    fn inactive_agent_ignores_commands() {
        let mut agent = Agent::new(ArbiterConfig::default(), Arc::new(OccupancyGrid::free(3, 3)));
        let out = agent.step(Some(Command::Explore), &SensorSnapshot::default()).unwrap();
        assert!(out.drive.is_stop());
        assert_eq!(agent.mode(), Mode::Stopped);
    }

    #[test]
    fn searching_acquires_into_tracking() {
        let mut agent = agent();
        agent.step(Some(Command::Search), &SensorSnapshot::default()).unwrap();
        let snapshot = SensorSnapshot::default().with_signal(colour(300.0));
        let out = agent.step(None, &snapshot).unwrap();
        assert_eq!(agent.mode(), Mode::Tracking);
        assert_eq!(out.drive.throttle, 0.2);
        assert!((out.drive.steering - 0.2).abs() < 1e-9);
    }

    #[test]
    fn tracking_loss_returns_to_searching() {
        let mut agent = agent();
        let out = agent.step(Some(Command::Track), &SensorSnapshot::default()).unwrap();
        assert_eq!(agent.mode(), Mode::Searching);
        assert!(out.drive.is_stop());
    }

    #[test]
    fn lane_filter_survives_steady_lane_following() {
        let mut config = ArbiterConfig::default();
        config.perception.lane_smoothing = 0.5;
        config.perception.lane_gain = 0.001;
        let mut agent = Agent::new(config, Arc::new(OccupancyGrid::free(3, 3)));
        agent.start().unwrap();
        let off_center = SensorSnapshot::default().with_signal(PerceptionSignal::LaneLine {
            slope: 1.0,
            intercept: 0.0,
        });
        let centered = SensorSnapshot::default().with_signal(PerceptionSignal::LaneLine {
            slope: 1.0,
            intercept: 96.0 - 320.0,
        });

        let first = agent.step(Some(Command::LaneFollow), &off_center).unwrap();
        assert!((first.drive.steering - 0.224).abs() < 1e-9);
        let second = agent.step(None, &centered).unwrap();
        assert!((second.drive.steering - 0.112).abs() < 1e-9);
        let third = agent.step(None, &centered).unwrap();
        assert!((third.drive.steering - 0.056).abs() < 1e-9);
    }

    #[test]
    fn follower_swapped_through_navigator() {
        let mut agent = agent();
        agent
            .navigator_mut()
            .set_path_follower(crate::navigation::path_follower::ProportionalFollower::default());
        agent
            .step(Some(Command::Navigate { goal: Some(Cell::new(0, 4)) }), &SensorSnapshot::default())
            .unwrap();
        let out = agent
            .step(None, &SensorSnapshot::default().with_position(Cell::new(0, 0)))
            .unwrap();
        assert_eq!(agent.navigator().path_follower_name(), "ProportionalFollower");
        assert!((out.drive.steering - 0.05).abs() < 1e-9);
    }

    #[test]
    fn small_blob_is_not_a_target() {
        let mut agent = agent();
        let snapshot = SensorSnapshot::default().with_signal(PerceptionSignal::Point {
            x: 100.0,
            y: 100.0,
            area: 50.0,
        });
        agent.step(Some(Command::Search), &snapshot).unwrap();
        assert_eq!(agent.mode(), Mode::Searching);
    }

    #[test]
    fn exploring_target_requests_description() {
        let mut agent = agent();
        agent.step(Some(Command::Explore), &SensorSnapshot::default()).unwrap();
        let out = agent
            .step(None, &SensorSnapshot::default().with_signal(colour(320.0)))
            .unwrap();
        assert_eq!(agent.mode(), Mode::Stopped);
        assert!(out.request_description);
        assert!(out.drive.is_stop());
    }

    #[test]
    fn evasive_output_in_every_autonomous_mode() {
        for command in [
            Command::Navigate { goal: None },
            Command::Explore,
            Command::Track,
            Command::LaneFollow,
        ] {
            let mut agent = agent();
            let snapshot = SensorSnapshot::default()
                .with_depth(blocking_depth())
                .with_signal(colour(320.0));
            let out = agent.step(Some(command), &snapshot).unwrap();
            assert_eq!(out.drive, DriveCommand::new(-0.2, 0.5), "{command:?}");
            assert!(!out.request_description);
        }
    }

    #[test]
    fn lidar_proximity_triggers_evasive() {
        let mut agent = agent();
        let scan = LidarScan::new(vec![2.0, 0.2], vec![0.0, 1.0]).unwrap();
        let out = agent
            .step(Some(Command::Explore), &SensorSnapshot::default().with_lidar(scan))
            .unwrap();
        assert_eq!(out.drive, DriveCommand::new(-0.2, 0.5));
    }

    #[test]
    fn teleop_bypasses_gate_by_default() {
        let mut agent = agent();
        let snapshot = SensorSnapshot::default()
            .with_depth(blocking_depth())
            .with_gamepad(GamepadState::new(-0.5, 0.25));
        let out = agent.step(Some(Command::Teleop), &snapshot).unwrap();
        assert_eq!(out.drive, DriveCommand::new(0.5, 0.25));
    }

    #[test]
    fn teleop_can_respect_gate() {
        let mut config = ArbiterConfig::default();
        config.agent.teleop_respects_gate = true;
        let mut agent = Agent::new(config, Arc::new(OccupancyGrid::free(3, 3)));
        agent.start().unwrap();
        let snapshot = SensorSnapshot::default()
            .with_depth(blocking_depth())
            .with_gamepad(GamepadState::new(-0.5, 0.25));
        let out = agent.step(Some(Command::Teleop), &snapshot).unwrap();
        assert_eq!(out.drive, DriveCommand::new(-0.2, 0.5));
    }

    #[test]
    fn navigate_plans_and_cruises() {
        let mut agent = agent();
        let out = agent
            .step(Some(Command::Navigate { goal: Some(Cell::new(0, 4)) }), &SensorSnapshot::default())
            .unwrap();
        assert_eq!(agent.mode(), Mode::Navigating);
        assert_eq!(agent.path().map(<[Cell]>::len), Some(5));
        assert_eq!(agent.path_index(), 0);
        assert_eq!(out.drive, DriveCommand::new(0.2, 0.0));
    }

    #[test]
    fn final_waypoint_stops() {
        let mut agent = agent();
        let goal = Cell::new(0, 1);
        agent
            .step(Some(Command::Navigate { goal: Some(goal) }), &SensorSnapshot::default())
            .unwrap();
        let out = agent
            .step(None, &SensorSnapshot::default().with_position(Cell::new(0, 0)))
            .unwrap();
        assert_eq!(agent.mode(), Mode::Navigating);
        assert_eq!(agent.path_index(), 1);
        assert_eq!(out.drive, DriveCommand::new(0.2, 0.1));

        let out = agent
            .step(None, &SensorSnapshot::default().with_position(goal))
            .unwrap();
        assert_eq!(agent.mode(), Mode::Stopped);
        assert!(out.drive.is_stop());
    }

    #[test]
    fn unreachable_goal_stops() {
        let grid = OccupancyGrid::free(4, 4).with_blocked([Cell::new(3, 3)]);
        let mut agent = Agent::new(ArbiterConfig::default(), Arc::new(grid));
        agent.start().unwrap();
        let out = agent
            .step(Some(Command::Navigate { goal: Some(Cell::new(3, 3)) }), &SensorSnapshot::default())
            .unwrap();
        assert_eq!(agent.mode(), Mode::Stopped);
        assert!(agent.path().is_none());
        assert!(out.drive.is_stop());
    }

    #[test]
    fn out_of_bounds_goal_is_an_error() {
        let mut agent = Agent::new(ArbiterConfig::default(), Arc::new(OccupancyGrid::free(4, 4)));
        agent.start().unwrap();
        let err = agent
            .step(Some(Command::Navigate { goal: None }), &SensorSnapshot::default())
            .unwrap_err();
        assert!(matches!(err, Error::CellOutOfBounds(_)));
        assert_eq!(agent.mode(), Mode::Stopped);
    }

    #[test]
    fn face_lost_holds_still() {
        let mut agent = agent();
        let out = agent.step(Some(Command::FaceTrack), &SensorSnapshot::default()).unwrap();
        assert_eq!(agent.mode(), Mode::FaceTracking);
        assert!(out.drive.is_stop());

        let face = PerceptionSignal::BoundingBox {
            x: 400.0,
            y: 100.0,
            w: 80.0,
            h: 80.0,
        };
        let out = agent.step(None, &SensorSnapshot::default().with_signal(face)).unwrap();
        assert_eq!(out.drive.throttle, 0.1);
        assert!((out.drive.steering + 0.5).abs() < 1e-9);
    }

    #[test]
    fn lane_following_steers_toward_line() {
        let mut agent = agent();
        let lane = PerceptionSignal::LaneLine {
            slope: 1.0,
            intercept: 0.0,
        };
        let out = agent
            .step(Some(Command::LaneFollow), &SensorSnapshot::default().with_signal(lane))
            .unwrap();
        // lane_x = 96, offset = 224
        assert_eq!(out.drive.throttle, 0.1);
        assert!((out.drive.steering - 0.5).abs() < 1e-9);
    }

    #[test]
    fn undersized_depth_frame_is_an_error() {
        let mut agent = agent();
        let snapshot = SensorSnapshot::default().with_depth(DepthFrame::filled(32, 32, 1.0));
        let err = agent.step(Some(Command::Explore), &snapshot).unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(agent.mode(), Mode::Exploring);
    }

    #[test]
    fn deactivate_forces_stop() {
        let mut agent = agent();
        agent
            .step(Some(Command::Navigate { goal: Some(Cell::new(2, 2)) }), &SensorSnapshot::default())
            .unwrap();
        agent.on_deactivate().unwrap();
        assert_eq!(agent.mode(), Mode::Stopped);
        assert!(agent.path().is_none());
        assert_eq!(agent.state(), State::Inactive);
        assert!(agent.on_deactivate().is_err());
    }

    #[test]
    fn telemetry_reflects_state() {
        let mut agent = agent();
        agent
            .step(Some(Command::Navigate { goal: Some(Cell::new(1, 0)) }), &SensorSnapshot::default())
            .unwrap();
        let telemetry = agent.telemetry();
        assert_eq!(telemetry.mode, Mode::Navigating);
        assert_eq!(telemetry.path, Some(vec![Cell::new(0, 0), Cell::new(1, 0)]));
        assert_eq!(telemetry.last_command, DriveCommand::new(0.2, 0.0));
    }
}
