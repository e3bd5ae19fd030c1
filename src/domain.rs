//! The domain module holds the simulator's world model: geometry, the arena and its obstacles,
//! markers, the command a caller sends and the snapshot it reads back.
//!
//! Nothing in here knows about entities, systems or threads, so every rule can be tested in
//! isolation.

mod basis;
mod collision;
mod command;
mod environment;
mod marker;
mod sensor_data;

pub use basis::{Angle, Pose, Position};
pub use collision::{HasCollision, Shape};
pub use command::{
    forward_kinematics, inverse_kinematics, Actuators, Command, GripperState, DEFAULT_PRESET,
};
pub use environment::{Arena, Environment, Obstacle};
pub use marker::{Marker, MarkerBoard, MarkerId, PlacementRules};
pub use sensor_data::{
    ImuReading, JointState, LaserScan, MarkerDetection, Odometry, SensorData, LEFT_WHEEL,
    RIGHT_WHEEL,
};
