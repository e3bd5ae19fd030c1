//! Runs the simulator without a window: drives the robot around a square on the worker thread
//! and logs what it senses. Takes an optional TOML configuration path as its only argument and
//! falls back to the demo scene.
//!
//! Log verbosity follows `RUST_LOG` and defaults to `info`.

use std::{
    env, thread,
    time::{Duration, Instant},
};

use tracing::info;
use tracing_subscriber::EnvFilter;

use smartbot_sim::{Command, SimConfig, SimError, SimHandle};

/// (linear m/s, angular rad/s, seconds) legs of the route. Turns left first, away from the demo
/// box straight ahead of the start pose.
const ROUTE: [(f64, f64, f64); 8] = [
    (0.0, 1.0, 1.571),
    (0.5, 0.0, 2.0),
    (0.0, 1.0, 1.571),
    (0.5, 0.0, 2.0),
    (0.0, 1.0, 1.571),
    (0.5, 0.0, 2.0),
    (0.0, 1.0, 1.571),
    (0.5, 0.0, 2.0),
];

/// Interval between two log lines while a leg is driven.
const REPORT_PERIOD: Duration = Duration::from_millis(500);

fn main() -> Result<(), SimError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match env::args().nth(1) {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::demo()?,
    };
    let sim = SimHandle::spawn(config)?;

    sim.write(Command::gripper(true))?;
    for (leg, (linear, angular, seconds)) in ROUTE.into_iter().enumerate() {
        sim.write(Command::velocity(linear, angular))?;
        let deadline = Instant::now() + Duration::from_secs_f64(seconds);
        while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
            if remaining.is_zero() {
                break;
            }
            thread::sleep(remaining.min(REPORT_PERIOD));
            if let Some(data) = sim.latest() {
                info!(
                    leg,
                    time = data.time,
                    x = data.odom.x,
                    y = data.odom.y,
                    yaw = data.odom.yaw,
                    hits = data.scan.hits().count(),
                    markers = ?data.marker_ids(),
                    gripper = %data.gripper_state,
                    "sensor snapshot"
                );
            }
        }
    }
    sim.write(Command::velocity(0.0, 0.0))?;
    sim.shutdown()
}
