//! Per-step update rules run by the engine's world, listed here in the order they are
//! registered: input, kinematics, encoders, integration with collision, IMU, lidar and marker
//! visibility. Sensor systems run last so they observe the pose committed in the same step.

mod encoder;
mod imu;
mod input;
mod integrate;
mod kinematics;
mod lidar;
mod markers;

pub use encoder::EncoderSystem;
pub use imu::ImuSystem;
pub use input::{apply_command, GetInput};
pub use integrate::IntegrateAndCollide;
pub use kinematics::DiffDriveKinematics;
pub use lidar::LidarSystem;
pub use markers::MarkerVisibility;
