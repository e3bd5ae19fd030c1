//! Snapshot of everything the robot can sense, produced by value on every read.

use super::{Angle, Marker, MarkerId, Pose, Position};

pub const LEFT_WHEEL: &str = "left_wheel";
pub const RIGHT_WHEEL: &str = "right_wheel";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Odometry {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
    /// World-frame velocity.
    pub vx: f64,
    pub vy: f64,
    pub yaw_rate: f64,
}

impl Odometry {
    pub fn pose(&self) -> Pose {
        Pose::new(Position::new(self.x, self.y), Angle::new(self.yaw))
    }
}

/// Planar laser scan. Ray `i` points at `angle_min + i * angle_increment` in the body frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LaserScan {
    pub ranges: Vec<f64>,
    pub angle_min: f64,
    pub angle_max: f64,
    pub angle_increment: f64,
    pub range_max: f64,
}

impl LaserScan {
    pub fn angle(&self, index: usize) -> f64 {
        self.angle_min + index as f64 * self.angle_increment
    }

    /// Ranges that are real returns. Non-finite, non-positive and "no hit" values are skipped.
    pub fn hits(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.ranges
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_finite() && **r > 0.0 && **r < self.range_max)
            .map(|(i, r)| (self.angle(i), *r))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct JointState {
    pub names: [&'static str; 2],
    pub positions: [f64; 2],
    pub velocities: [f64; 2],
}

impl Default for JointState {
    fn default() -> Self {
        Self {
            names: [LEFT_WHEEL, RIGHT_WHEEL],
            positions: [0.0; 2],
            velocities: [0.0; 2],
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ImuReading {
    pub yaw_rate: f64,
    pub forward_accel: f64,
    pub lateral_accel: f64,
}

/// A detected marker expressed in the robot's body frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerDetection {
    pub id: MarkerId,
    pub relative: Pose,
}

impl MarkerDetection {
    pub fn distance(&self) -> f64 {
        self.relative.position.norm()
    }

    pub fn bearing(&self) -> f64 {
        self.relative.position.y().atan2(self.relative.position.x())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SensorData {
    pub time: f64,
    pub odom: Odometry,
    pub scan: LaserScan,
    pub joints: JointState,
    pub imu: ImuReading,
    /// Visible markers in registration order.
    pub markers: Vec<MarkerDetection>,
    pub gripper_state: String,
    pub manipulator_preset: String,
}

impl SensorData {
    pub fn marker_ids(&self) -> Vec<MarkerId> {
        self.markers.iter().map(|m| m.id).collect()
    }

    pub fn is_visible(&self, marker: &Marker) -> bool {
        self.markers.iter().any(|m| m.id == marker.id)
    }
}
