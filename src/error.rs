//! Error types shared across the simulator.

use std::time::Duration;

use thiserror::Error;

use crate::ecs::{ComponentKind, Entity};

#[derive(Error, Debug)]
pub enum SimError {
    #[error("obstacle needs 4 coordinates (xmin, xmax, ymin, ymax), got {count}")]
    InvalidObstacle { count: usize },
    #[error("obstacle bounds [{x_min}, {x_max}] x [{y_min}, {y_max}] are empty or not finite")]
    InvalidObstacleBounds {
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    },
    #[error("entity would own {0:?} twice")]
    DuplicateComponent(ComponentKind),
    #[error("unknown entity {0:?}")]
    UnknownEntity(Entity),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to read configuration")]
    ConfigIo(#[from] std::io::Error),
    #[error("failed to parse configuration")]
    ConfigParse(#[from] toml::de::Error),
    #[error("failed to spawn simulation worker")]
    WorkerSpawn(#[source] std::io::Error),
    #[error("simulation worker did not stop within {0:?}")]
    ShutdownTimeout(Duration),
    #[error("simulation worker panicked")]
    WorkerPanicked,
    #[error("simulation worker is no longer running")]
    WorkerStopped,
}

/// Reasons a marker could not be placed. Marker state is left untouched in every case.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum PlacementError {
    #[error("({x}, {y}) is not a finite position")]
    NotFinite { x: f64, y: f64 },
    #[error("({x:.2}, {y:.2}) is inside or too close to an obstacle")]
    InsideObstacle { x: f64, y: f64 },
    #[error("({x:.2}, {y:.2}) is too close to the arena walls")]
    NearWall { x: f64, y: f64 },
    #[error("no free location found after {attempts} attempts")]
    Exhausted { attempts: usize },
}
