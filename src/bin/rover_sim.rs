use std::f64::consts::TAU;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info, warn};

use rover_arbiter::{
    Agent, ArbiterConfig, Cell, Command, DepthFrame, GamepadState, LidarScan, LifecycleNode,
    Mode, OccupancyGrid, PerceptionSignal, SensorSnapshot, SnapshotSource, Telemetry,
};

const CYCLE: Duration = Duration::from_millis(50);
const SIM_TICKS: u64 = 400;
/// Ticks the simulated vehicle needs to cross one cell
const CELL_TICKS: u64 = 6;
const LIDAR_SAMPLES: usize = 72;

const MAP: &str = "
..........
..##......
..##..#...
......#...
......#...
..........
.####.....
..........
.......##.
..........
";

/// Operator script: (tick, command text)
const SCRIPT: &[(u64, &str)] = &[
    (5, "navigate 9 9"),
    (150, "explore"),
    (190, "search"),
    (280, "lane follow"),
    (320, "teleop"),
    (360, "stop"),
];

/// Scripted world that plays back obstacles and detections over time
struct SimWorld {
    tick: u64,
    position: Cell,
    last_move: u64,
}

impl SimWorld {
    fn new(start: Cell) -> Self {
        SimWorld {
            tick: 0,
            position: start,
            last_move: 0,
        }
    }

    fn lidar(&self) -> Result<LidarScan, rover_arbiter::Error> {
        let angles: Vec<f64> = (0..LIDAR_SAMPLES)
            .map(|i| i as f64 * TAU / LIDAR_SAMPLES as f64)
            .collect();
        let mut distances = vec![3.0; LIDAR_SAMPLES];
        // a pedestrian steps in front of the rover
        if (120..128).contains(&self.tick) {
            distances[0] = 0.2;
        }
        // a wall on the left while exploring
        if (150..170).contains(&self.tick) {
            for d in &mut distances[10..20] {
                *d = 0.4;
            }
        }
        LidarScan::new(distances, angles)
    }

    fn signal(&self) -> PerceptionSignal {
        match self.tick {
            170..=259 => PerceptionSignal::Point {
                x: 320.0 + 80.0 * (self.tick as f64 / 15.0).sin(),
                y: 240.0,
                area: 900.0,
            },
            280..=319 => PerceptionSignal::LaneLine {
                slope: 0.8,
                intercept: -150.0,
            },
            _ => PerceptionSignal::None,
        }
    }

    fn gamepad(&self) -> GamepadState {
        if (320..360).contains(&self.tick) {
            GamepadState::new(-0.4, 0.3 * (self.tick as f64 / 10.0).sin())
        } else {
            GamepadState::default()
        }
    }

    /// Move one waypoint along the planned path every few ticks
    fn advance(&mut self, telemetry: &Telemetry) {
        self.tick += 1;
        if telemetry.mode != Mode::Navigating || telemetry.last_command.throttle <= 0.0 {
            return;
        }
        if self.tick - self.last_move < CELL_TICKS {
            return;
        }
        let next = telemetry
            .path
            .as_ref()
            .and_then(|path| path.get(telemetry.path_index));
        if let Some(&next) = next {
            if next != self.position {
                debug!("Rover moved {} -> {}", self.position, next);
                self.position = next;
                self.last_move = self.tick;
            }
        }
    }
}

impl SnapshotSource for SimWorld {
    fn name(&self) -> &str {
        "sim_world"
    }

    fn capture(&mut self) -> Result<SensorSnapshot, rover_arbiter::Error> {
        Ok(SensorSnapshot::default()
            .with_lidar(self.lidar()?)
            .with_depth(DepthFrame::filled(640, 480, 2.0))
            .with_signal(self.signal())
            .with_gamepad(self.gamepad())
            .with_position(self.position))
    }
}

fn load_grid() -> Result<OccupancyGrid> {
    match std::env::args().nth(1) {
        Some(path) => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read grid file {}", path))?;
            text.parse().with_context(|| format!("Invalid grid in {}", path))
        }
        None => MAP.parse().context("Invalid built-in map"),
    }
}

/// Out-of-band scene description; runs off the control loop
async fn describer(mut requests: mpsc::Receiver<u64>) {
    while let Some(tick) = requests.recv().await {
        info!("Describing scene captured at tick {}", tick);
        sleep(Duration::from_millis(400)).await;
        info!("Description for tick {} ready", tick);
    }
}

/// Feeds the operator script into the command channel
async fn operator(commands: mpsc::Sender<Command>) {
    let mut elapsed = 0;
    for &(tick, text) in SCRIPT {
        sleep(CYCLE * (tick - elapsed) as u32).await;
        elapsed = tick;
        match text.parse::<Command>() {
            Ok(command) => {
                info!("Operator: {}", text);
                if commands.send(command).await.is_err() {
                    return;
                }
            }
            Err(e) => warn!("Operator: {}", e),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ArbiterConfig::from_env().context("Failed to load arbiter configuration")?;
    let grid = Arc::new(load_grid()?);
    info!("Map {}x{}:\n{}", grid.rows(), grid.cols(), grid);

    let mut world = SimWorld::new(config.agent.home_cell);
    let mut agent = Agent::new(config, grid);
    agent.start().context("Failed to start agent")?;
    info!(
        "Agent active, following with {}, snapshots from {}",
        agent.navigator().path_follower_name(),
        world.name()
    );

    let (command_tx, mut command_rx) = mpsc::channel::<Command>(8);
    let (describe_tx, describe_rx) = mpsc::channel::<u64>(4);
    tokio::spawn(operator(command_tx));
    let describer_handle = tokio::spawn(describer(describe_rx));

    let mut ticker = interval(CYCLE);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    while world.tick < SIM_TICKS {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }

        let command = command_rx.try_recv().ok();
        let snapshot = match world.capture() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Skipping cycle {}: {}", world.tick, e);
                world.tick += 1;
                continue;
            }
        };

        match agent.step(command, &snapshot) {
            Ok(output) => {
                if output.request_description && describe_tx.try_send(world.tick).is_err() {
                    warn!("Describer busy, dropping request");
                }
                debug!(
                    "tick {} mode {} throttle {:.2} steering {:.2}",
                    world.tick,
                    agent.mode(),
                    output.drive.throttle,
                    output.drive.steering
                );
            }
            Err(e) if e.is_invalid_input() => warn!("Skipping cycle {}: {}", world.tick, e),
            Err(e) => return Err(e).context("Control cycle failed"),
        }

        world.advance(&agent.telemetry());
    }

    agent.on_deactivate().context("Failed to deactivate agent")?;
    agent.on_shutdown()?;
    info!("Final state: {:?}", agent.telemetry());

    drop(describe_tx);
    describer_handle.await.context("Describer task panicked")?;
    Ok(())
}
