use std::time::Duration;

use approx::assert_abs_diff_eq;
use pretty_assertions::assert_eq;

use smartbot_sim::{Command, SimConfig, SimEngine, SimHandle};

const CONFIG: &str = r#"
random_seed = 7
obstacles = [[1.0, 2.0, -0.5, 0.5]]

[arena]
x_min = -4.0
x_max = 4.0
y_min = -4.0
y_max = 4.0

[markers]
initial = [[0.0, 2.0]]
"#;

fn config() -> SimConfig {
    SimConfig::from_toml_str(CONFIG).unwrap()
}

fn drive(engine: &mut SimEngine, command: Command, steps: usize) {
    engine.apply_command(&command);
    for _ in 0..steps {
        engine.step(0.01);
    }
}

#[test]
fn test_same_seed_same_run() {
    let mut a = SimEngine::new(config()).unwrap();
    let mut b = SimEngine::new(config()).unwrap();
    for engine in [&mut a, &mut b] {
        drive(engine, Command::velocity(0.3, 0.5), 50);
        drive(engine, Command::wheels(-0.2, 0.4), 50);
    }
    assert_eq!(a.read_all(), b.read_all());
}

#[test]
fn test_robot_stops_in_front_of_obstacle() {
    let mut engine = SimEngine::new(config()).unwrap();
    drive(&mut engine, Command::velocity(1.0, 0.0), 200);

    let data = engine.read_all();
    assert!(data.odom.x <= 0.7 + 1e-9, "x = {}", data.odom.x);
    assert!(data.odom.x > 0.6, "x = {}", data.odom.x);
    assert_eq!(data.odom.y, 0.0);
    assert_eq!(data.odom.vx, 0.0);

    // Ray 36 points straight ahead.
    assert_abs_diff_eq!(data.scan.angle(36), 0.0, epsilon = 1e-12);
    let ahead = data.scan.ranges[36];
    assert!(ahead > 0.0 && ahead <= 1.0 - data.odom.x + 0.05 + 1e-9);
}

#[test]
fn test_turn_towards_initial_marker() {
    let mut engine = SimEngine::new(config()).unwrap();
    let data = engine.step(0.01);
    assert!(data.markers.is_empty());

    // Quarter turn to the left puts the marker straight ahead.
    drive(
        &mut engine,
        Command::velocity(0.0, 0.5 * std::f64::consts::PI),
        100,
    );
    let data = engine.read_all();
    assert_eq!(data.marker_ids().len(), 1);
    let detection = data.markers[0];
    assert_abs_diff_eq!(detection.distance(), 2.0, epsilon = 1e-6);
    assert_abs_diff_eq!(detection.bearing(), 0.0, epsilon = 1e-6);
}

#[test]
fn test_handle_applies_commands_in_background() {
    let mut config = config();
    config.runner.sim_rate_hz = 500.0;
    config.runner.publish_rate_hz = 50.0;
    let sim = SimHandle::spawn(config).unwrap();

    sim.write(Command::gripper(true)).unwrap();
    sim.write(Command::preset("READY")).unwrap();
    let data = (0..100)
        .filter_map(|_| sim.read_timeout(Duration::from_millis(50)))
        .find(|d| d.gripper_state == "CLOSED" && d.manipulator_preset == "READY");
    assert!(data.is_some());

    sim.shutdown().unwrap();
}

#[test]
fn test_demo_scene_starts_clear() {
    let mut engine = SimEngine::new(SimConfig::demo().unwrap()).unwrap();
    assert_eq!(engine.markers().len(), 1);
    assert_eq!(engine.environment().obstacles().len(), 3);

    let data = engine.step(0.01);
    assert_eq!(data.odom.x, 0.0);
    // The first box sits 0.5 m ahead of the start pose.
    assert!(data.scan.ranges[36] <= 0.5 + 0.05 + 1e-9);
}
