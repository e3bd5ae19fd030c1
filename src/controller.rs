//! Keyboard controller steering the robot.
//!
//! Arrow keys drive, `G` toggles the gripper, `P` cycles the manipulator presets, `M` drops a
//! marker at a random free spot and `R` resets the simulation. A velocity command is only sent
//! when the requested velocity changes.

use bevy::prelude::*;
use tracing::{info, warn};

use smartbot_sim::{domain::GripperState, Command};

use crate::resource::{EngineRes, SnapshotRes};

const LINEAR_VELOCITY: f64 = 0.5;
const ANGULAR_VELOCITY: f64 = 1.5;
const PRESETS: [&str; 3] = ["STOW", "READY", "PICK"];

pub struct Controller;

impl Plugin for Controller {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (drive, actuate, manage_scene));
    }
}

/// Velocity requested by the arrow keys.
fn requested_velocity(keys: &ButtonInput<KeyCode>) -> (f64, f64) {
    let axis = |positive: KeyCode, negative: KeyCode| {
        f64::from(i8::from(keys.pressed(positive)) - i8::from(keys.pressed(negative)))
    };
    (
        LINEAR_VELOCITY * axis(KeyCode::ArrowUp, KeyCode::ArrowDown),
        ANGULAR_VELOCITY * axis(KeyCode::ArrowLeft, KeyCode::ArrowRight),
    )
}

fn drive(
    keys: Res<ButtonInput<KeyCode>>,
    mut engine: ResMut<EngineRes>,
    mut last: Local<(f64, f64)>,
) {
    let velocity = requested_velocity(&keys);
    if velocity != *last {
        engine.apply_command(&Command::velocity(velocity.0, velocity.1));
        *last = velocity;
    }
}

fn actuate(
    keys: Res<ButtonInput<KeyCode>>,
    snapshot: Res<SnapshotRes>,
    mut engine: ResMut<EngineRes>,
) {
    if keys.just_pressed(KeyCode::KeyG) {
        let closed = snapshot.gripper_state == GripperState::Closed.as_str();
        engine.apply_command(&Command::gripper(!closed));
    }

    if keys.just_pressed(KeyCode::KeyP) {
        let current = PRESETS
            .iter()
            .position(|preset| *preset == snapshot.manipulator_preset)
            .unwrap_or(0);
        engine.apply_command(&Command::preset(PRESETS[(current + 1) % PRESETS.len()]));
    }
}

fn manage_scene(keys: Res<ButtonInput<KeyCode>>, mut engine: ResMut<EngineRes>) {
    if keys.just_pressed(KeyCode::KeyM) {
        match engine.place_marker(None) {
            Ok(id) => info!(id = id.0, "marker placed"),
            Err(err) => warn!(%err, "marker not placed"),
        }
    }

    if keys.just_pressed(KeyCode::KeyR) {
        if let Err(err) = engine.reset() {
            warn!(%err, "reset failed");
        }
    }
}
