//! Full control cycles through the public API

use std::f64::consts::TAU;
use std::sync::Arc;

use rover_arbiter::{
    Agent, ArbiterConfig, Cell, Command, DepthFrame, DriveCommand, GamepadState, LidarScan,
    LifecycleNode, Mode, OccupancyGrid, PerceptionSignal, SensorSnapshot, State,
};

const MAP: &str = "
.....
.###.
.....
";

fn started(config: ArbiterConfig, map: &str) -> Agent {
    let grid: OccupancyGrid = map.parse().unwrap();
    let mut agent = Agent::new(config, Arc::new(grid));
    agent.start().unwrap();
    agent
}

fn ring_scan(distance: f64) -> LidarScan {
    let angles: Vec<f64> = (0..72).map(|i| i as f64 * TAU / 72.0).collect();
    LidarScan::new(vec![distance; 72], angles).unwrap()
}

fn command(text: &str) -> Option<Command> {
    Some(text.parse().unwrap())
}

#[test]
fn drives_a_planned_route_to_completion() {
    let mut agent = started(ArbiterConfig::default(), MAP);
    let base = SensorSnapshot::default()
        .with_lidar(ring_scan(3.0))
        .with_depth(DepthFrame::filled(640, 480, 2.0));

    agent.step(command("navigate 2 4"), &base).unwrap();
    assert_eq!(agent.mode(), Mode::Navigating);
    let path = agent.path().unwrap().to_vec();
    assert_eq!(path.len(), 7);
    assert!(path.iter().all(|c| !(c.row == 1 && (1..=3).contains(&c.col))));

    for (i, &cell) in path.iter().enumerate() {
        let out = agent.step(None, &base.clone().with_position(cell)).unwrap();
        if i + 1 < path.len() {
            assert_eq!(agent.mode(), Mode::Navigating);
            assert_eq!(agent.path_index(), i + 1);
            assert_eq!(out.drive.throttle, 0.2);
        } else {
            assert_eq!(agent.mode(), Mode::Stopped);
            assert_eq!(out.drive, DriveCommand::STOP);
        }
    }
}

#[test]
fn index_never_moves_without_a_position() {
    let mut agent = started(ArbiterConfig::default(), MAP);
    agent.step(command("navigate 0 4"), &SensorSnapshot::default()).unwrap();
    for _ in 0..20 {
        agent.step(None, &SensorSnapshot::default()).unwrap();
    }
    assert_eq!(agent.mode(), Mode::Navigating);
    assert_eq!(agent.path_index(), 0);
}

#[test]
fn gate_preempts_and_releases() {
    let mut agent = started(ArbiterConfig::default(), MAP);
    let mut frame = DepthFrame::filled(640, 480, f32::NAN);
    frame.set(320, 240, 0.1);

    let out = agent
        .step(command("explore"), &SensorSnapshot::default().with_depth(frame.clone()))
        .unwrap();
    assert_eq!(out.drive, DriveCommand::new(-0.2, 0.5));
    assert_eq!(agent.mode(), Mode::Exploring);

    frame.set(320, 240, 0.5);
    let out = agent
        .step(None, &SensorSnapshot::default().with_depth(frame))
        .unwrap();
    assert_eq!(out.drive, DriveCommand::new(0.2, 0.0));
}

#[test]
fn exploring_uses_vfh_heading() {
    let mut agent = started(ArbiterConfig::default(), MAP);
    // everything near except the sector straight behind
    let angles: Vec<f64> = (0..36).map(|i| (i as f64 + 0.5) * TAU / 36.0).collect();
    let distances: Vec<f64> = (0..36).map(|i| if i == 18 { 5.0 } else { 0.4 }).collect();
    let scan = LidarScan::new(distances, angles).unwrap();

    let out = agent
        .step(command("explore"), &SensorSnapshot::default().with_lidar(scan))
        .unwrap();
    // sector 18 -> heading 0, the clamp keeps it there
    assert_eq!(out.drive, DriveCommand::new(0.2, 0.0));
}

#[test]
fn search_track_lose_cycle() {
    let mut agent = started(ArbiterConfig::default(), MAP);
    let target = PerceptionSignal::Point {
        x: 220.0,
        y: 240.0,
        area: 600.0,
    };

    agent.step(command("search"), &SensorSnapshot::default()).unwrap();
    assert_eq!(agent.mode(), Mode::Searching);

    let out = agent.step(None, &SensorSnapshot::default().with_signal(target)).unwrap();
    assert_eq!(agent.mode(), Mode::Tracking);
    assert!((out.drive.steering - 0.5).abs() < 1e-9);

    let out = agent.step(None, &SensorSnapshot::default()).unwrap();
    assert_eq!(agent.mode(), Mode::Searching);
    assert_eq!(out.drive, DriveCommand::STOP);

    let out = agent.step(None, &SensorSnapshot::default()).unwrap();
    assert_eq!(agent.mode(), Mode::Searching);
    assert_eq!(out.drive, DriveCommand::new(0.2, 0.0));
}

#[test]
fn keyboard_and_text_commands_agree() {
    let mut agent = started(ArbiterConfig::default(), MAP);
    for (key, text, mode) in [
        ('e', "explore", Mode::Exploring),
        ('g', "teleop", Mode::Teleop),
        ('f', "face_track", Mode::FaceTracking),
        ('l', "lane follow", Mode::LaneFollowing),
        (' ', "stop", Mode::Stopped),
    ] {
        assert_eq!(Command::from_key(key), command(text));
        agent.step(Command::from_key(key), &SensorSnapshot::default()).unwrap();
        assert_eq!(agent.mode(), mode);
    }
}

#[test]
fn stale_gamepad_stops_teleop() {
    let mut agent = started(ArbiterConfig::default(), MAP);
    let out = agent
        .step(command("teleop"), &SensorSnapshot::default().with_gamepad(GamepadState::new(-1.0, 0.9)))
        .unwrap();
    assert_eq!(out.drive, DriveCommand::new(1.0, 0.5));

    let out = agent.step(None, &SensorSnapshot::default()).unwrap();
    assert!(out.drive.is_stop());
}

#[test]
fn lane_smoothing_from_config() {
    let config = ArbiterConfig::from_toml_str(
        r#"
        [perception]
        lane_smoothing = 0.5
        lane_gain = 0.001
        "#,
    )
    .unwrap();
    let mut agent = started(config, MAP);
    // lane_x = (96 - 0) / 1 = 96, offset 224 -> raw steering 0.224
    let lane = SensorSnapshot::default().with_signal(PerceptionSignal::LaneLine {
        slope: 1.0,
        intercept: 0.0,
    });
    // centered lane -> raw steering 0
    let centered = SensorSnapshot::default().with_signal(PerceptionSignal::LaneLine {
        slope: 1.0,
        intercept: 96.0 - 320.0,
    });

    let first = agent.step(command("lane_follow"), &lane).unwrap();
    assert!((first.drive.steering - 0.224).abs() < 1e-9);
    let second = agent.step(None, &centered).unwrap();
    assert!((second.drive.steering - 0.112).abs() < 1e-9);

    // re-entering resets the filter
    agent.step(command("lane_follow"), &centered).unwrap();
    let out = agent.step(None, &centered).unwrap();
    assert!(out.drive.steering.abs() < 1e-9);
}

#[test]
fn proportional_follower_selected_by_config() {
    let config = ArbiterConfig::from_toml_str(
        r#"
        [follower]
        kind = "proportional"
        lateral_gain = 0.05
        "#,
    )
    .unwrap();
    let mut agent = started(config, MAP);
    assert_eq!(agent.navigator().path_follower_name(), "ProportionalFollower");

    agent.step(command("navigate 0 4"), &SensorSnapshot::default()).unwrap();
    let out = agent
        .step(None, &SensorSnapshot::default().with_position(Cell::new(0, 0)))
        .unwrap();
    assert!((out.drive.steering - 0.05).abs() < 1e-9);
}

#[test]
fn swapped_grid_applies_to_next_plan() {
    let mut agent = started(ArbiterConfig::default(), MAP);
    agent.step(command("navigate 2 2"), &SensorSnapshot::default()).unwrap();
    assert_eq!(agent.mode(), Mode::Navigating);

    let walled: OccupancyGrid = ".....\n#####\n.....\n".parse().unwrap();
    agent.set_grid(Arc::new(walled));
    assert!(agent.path().is_some());

    agent.step(command("navigate 2 2"), &SensorSnapshot::default()).unwrap();
    assert_eq!(agent.mode(), Mode::Stopped);
    assert!(agent.path().is_none());
}

#[test]
fn mismatched_lidar_rejected_at_construction() {
    let err = LidarScan::new(vec![1.0, 2.0], vec![0.0]).unwrap_err();
    assert!(err.is_invalid_input());
}

#[test]
fn lifecycle_round_trip() {
    let mut agent = started(ArbiterConfig::default(), MAP);
    agent.step(command("explore"), &SensorSnapshot::default()).unwrap();
    agent.on_deactivate().unwrap();
    assert_eq!(agent.mode(), Mode::Stopped);

    let out = agent.step(command("explore"), &SensorSnapshot::default()).unwrap();
    assert!(out.drive.is_stop());
    assert_eq!(agent.mode(), Mode::Stopped);

    agent.on_cleanup().unwrap();
    agent.start().unwrap();
    assert_eq!(agent.state(), State::Active);
    agent.on_shutdown().unwrap();
    assert_eq!(agent.state(), State::Finalized);
}
