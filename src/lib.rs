//! A 2D simulator for a differential-drive teaching robot.
//!
//! The robot lives in a rectangular arena with axis-aligned obstacles and fiducial markers. Each
//! step integrates its kinematics, rejects colliding moves and synthesizes lidar, IMU, encoder
//! and marker-camera readings. [`engine::SimEngine`] is the synchronous entry point,
//! [`runner::SimHandle`] runs the same engine on a worker thread behind channels.

#[cfg(test)]
mod tests;

pub mod config;
pub mod domain;
pub mod ecs;
pub mod engine;
pub mod error;
pub mod noise;
pub mod runner;
pub mod systems;

pub use config::SimConfig;
pub use domain::{Command, SensorData};
pub use engine::SimEngine;
pub use error::{PlacementError, SimError};
pub use runner::{CommandPolicy, SimHandle};
