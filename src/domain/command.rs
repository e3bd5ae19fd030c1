//! Control input for the robot and the actuator state it echoes back.

use std::fmt;

use nalgebra::{Matrix2, Vector2};

/// Caller supplied control input. Every field is optional; `None` leaves that axis unchanged.
///
/// When `linear_vel` or `angular_vel` is present the pair takes priority over the explicit wheel
/// velocities and is converted with the differential-drive inverse kinematics (a missing half
/// of the pair counts as zero).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Command {
    pub wheel_vel_left: Option<f64>,
    pub wheel_vel_right: Option<f64>,
    pub linear_vel: Option<f64>,
    pub angular_vel: Option<f64>,
    pub gripper_closed: Option<bool>,
    pub manipulator_preset: Option<String>,
}

impl Command {
    pub fn velocity(linear_vel: f64, angular_vel: f64) -> Self {
        Self {
            linear_vel: Some(linear_vel),
            angular_vel: Some(angular_vel),
            ..Default::default()
        }
    }

    pub fn wheels(left: f64, right: f64) -> Self {
        Self {
            wheel_vel_left: Some(left),
            wheel_vel_right: Some(right),
            ..Default::default()
        }
    }

    pub fn gripper(closed: bool) -> Self {
        Self {
            gripper_closed: Some(closed),
            ..Default::default()
        }
    }

    pub fn preset(name: impl Into<String>) -> Self {
        Self {
            manipulator_preset: Some(name.into()),
            ..Default::default()
        }
    }

    /// Target wheel angular velocities `(left, right)` this command asks for, falling back to
    /// `current` for any wheel it leaves untouched. Non-finite values count as absent.
    pub fn wheel_targets(
        &self,
        current: (f64, f64),
        wheel_radius: f64,
        wheel_base: f64,
    ) -> (f64, f64) {
        let linear_vel = finite(self.linear_vel);
        let angular_vel = finite(self.angular_vel);
        if linear_vel.is_some() || angular_vel.is_some() {
            return inverse_kinematics(
                linear_vel.unwrap_or(0.0),
                angular_vel.unwrap_or(0.0),
                wheel_radius,
                wheel_base,
            );
        }
        (
            finite(self.wheel_vel_left).unwrap_or(current.0),
            finite(self.wheel_vel_right).unwrap_or(current.1),
        )
    }

    /// Whether any velocity field carries a NaN or infinite value.
    pub fn has_non_finite_velocity(&self) -> bool {
        [
            self.wheel_vel_left,
            self.wheel_vel_right,
            self.linear_vel,
            self.angular_vel,
        ]
        .into_iter()
        .flatten()
        .any(|v| !v.is_finite())
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Body velocities `(v, ω)` from wheel angular velocities.
pub fn forward_kinematics(
    w_left: f64,
    w_right: f64,
    wheel_radius: f64,
    wheel_base: f64,
) -> (f64, f64) {
    let j = wheel_radius * Matrix2::new(0.5, 0.5, -1.0 / wheel_base, 1.0 / wheel_base);
    let q = j * Vector2::new(w_left, w_right);
    (q[0], q[1])
}

/// Wheel angular velocities `(w_left, w_right)` producing body velocities `(v, ω)`.
pub fn inverse_kinematics(
    linear_vel: f64,
    angular_vel: f64,
    wheel_radius: f64,
    wheel_base: f64,
) -> (f64, f64) {
    (
        (linear_vel - 0.5 * wheel_base * angular_vel) / wheel_radius,
        (linear_vel + 0.5 * wheel_base * angular_vel) / wheel_radius,
    )
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum GripperState {
    #[default]
    Open,
    Closed,
}

impl GripperState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GripperState::Open => "OPEN",
            GripperState::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for GripperState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DEFAULT_PRESET: &str = "STOW";

/// Gripper and manipulator state echoed in every snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct Actuators {
    pub gripper: GripperState,
    pub manipulator_preset: String,
}

impl Default for Actuators {
    fn default() -> Self {
        Self {
            gripper: GripperState::Open,
            manipulator_preset: DEFAULT_PRESET.to_string(),
        }
    }
}

impl Actuators {
    pub fn apply(&mut self, command: &Command) {
        if let Some(closed) = command.gripper_closed {
            self.gripper = if closed {
                GripperState::Closed
            } else {
                GripperState::Open
            };
        }
        if let Some(preset) = &command.manipulator_preset {
            self.manipulator_preset.clone_from(preset);
        }
    }
}
