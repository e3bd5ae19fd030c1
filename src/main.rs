//! Interactive SmartBot simulator. Takes an optional TOML configuration path as its only
//! argument and falls back to the demo scene.

use std::env;

use bevy::prelude::*;

use smartbot_sim::{SimConfig, SimEngine, SimError};

mod controller;
mod resource;
mod simulator;
mod visualizer;

use resource::{EngineRes, SnapshotRes};

fn main() -> Result<(), SimError> {
    let config = match env::args().nth(1) {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::demo()?,
    };
    let engine = SimEngine::new(config)?;
    let snapshot = engine.read_all();

    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins(controller::Controller)
        .add_plugins(visualizer::Visualizer)
        .add_plugins(simulator::Simulator)
        .insert_resource(EngineRes::from(engine))
        .insert_resource(SnapshotRes::from(snapshot))
        .run();

    Ok(())
}
