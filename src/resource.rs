//! Wraps the simulation engine and its latest snapshot as Bevy resources.

use std::ops::{Deref, DerefMut};

use bevy::ecs::system::Resource;

use smartbot_sim::{SensorData, SimEngine};

#[derive(Resource)]
pub struct EngineRes(SimEngine);

impl Deref for EngineRes {
    type Target = SimEngine;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for EngineRes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<SimEngine> for EngineRes {
    fn from(value: SimEngine) -> Self {
        Self(value)
    }
}

/// Sensor snapshot of the most recent step.
#[derive(Resource, Default)]
pub struct SnapshotRes(SensorData);

impl Deref for SnapshotRes {
    type Target = SensorData;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for SnapshotRes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<SensorData> for SnapshotRes {
    fn from(value: SensorData) -> Self {
        Self(value)
    }
}
