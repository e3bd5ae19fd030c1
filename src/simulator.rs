//! Steps the engine once per frame by the elapsed frame time and keeps the latest snapshot for
//! the visualizer.

use bevy::prelude::*;

use crate::resource::{EngineRes, SnapshotRes};

/// Upper bound of a single step, so a stalled frame does not tunnel the robot through walls.
const MAX_STEP: f64 = 0.05;

pub struct Simulator;

impl Plugin for Simulator {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, simulate);
    }
}

fn simulate(time: Res<Time>, mut engine: ResMut<EngineRes>, mut snapshot: ResMut<SnapshotRes>) {
    let dt = time.delta_seconds_f64().min(MAX_STEP);
    if dt <= 0.0 {
        return;
    }
    *snapshot = engine.step(dt).into();
}
