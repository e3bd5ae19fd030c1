//! Basic building blocks: positions, angles, poses and the frame transforms between the world
//! frame and the robot's body frame.

use std::{
    f64::consts::{PI, TAU},
    ops::{Add, Neg, Sub},
};

use nalgebra::{Isometry2, Point2, Vector2};
use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Deserialize)]
pub struct Position {
    x: f64,
    y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn distance(&self, position: Self) -> f64 {
        (self.x - position.x).hypot(self.y - position.y)
    }

    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn rotate_vector(&self, angle: Angle) -> Position {
        Position::new(
            self.x * angle.0.cos() - self.y * angle.0.sin(),
            self.x * angle.0.sin() + self.y * angle.0.cos(),
        )
    }

    /// Point at `distance` along `heading`, starting from `self`.
    pub fn offset(&self, heading: Angle, distance: f64) -> Position {
        Position::new(
            self.x + distance * heading.0.cos(),
            self.y + distance * heading.0.sin(),
        )
    }

    /// Linear interpolation, `t = 0` yields `self` and `t = 1` yields `other`.
    pub fn lerp(&self, other: Position, t: f64) -> Position {
        Position::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<Position> for (f32, f32) {
    fn from(value: Position) -> Self {
        (value.x as f32, value.y as f32)
    }
}

impl From<Position> for (f64, f64) {
    fn from(value: Position) -> Self {
        (value.x, value.y)
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// Planar angle in radians.
///
/// Headings are kept in the canonical range `(-π, π]` by calling [`Angle::normalized`] right
/// after every mutation.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub const fn new(radians: f64) -> Self {
        Self(radians)
    }

    pub fn from_deg(degree: f64) -> Self {
        Self(degree * PI / 180.0)
    }

    pub fn radians(self) -> f64 {
        self.0
    }

    pub fn to_deg(self) -> f64 {
        (self.0 * (180.0 / PI) + 360.0) % 360.0
    }

    /// Wraps the angle into `(-π, π]`. Non-finite angles are returned unchanged.
    pub fn normalized(self) -> Self {
        if !self.0.is_finite() || (self.0 > -PI && self.0 <= PI) {
            return self;
        }
        let mut wrapped = (self.0 + PI).rem_euclid(TAU) - PI;
        if wrapped <= -PI {
            wrapped += TAU;
        }
        Self(wrapped)
    }
}

impl Neg for Angle {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Angle(-self.0)
    }
}

impl Add for Angle {
    type Output = Angle;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Angle {
    type Output = Angle;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl From<Angle> for f64 {
    fn from(value: Angle) -> Self {
        value.0
    }
}

impl From<Angle> for f32 {
    fn from(value: Angle) -> Self {
        value.0 as f32
    }
}

/// Position and heading of a rigid body in the world frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Pose {
    pub position: Position,
    pub heading: Angle,
}

impl Pose {
    pub const fn new(position: Position, heading: Angle) -> Self {
        Self { position, heading }
    }

    fn isometry(&self) -> Isometry2<f64> {
        Isometry2::new(
            Vector2::new(self.position.x(), self.position.y()),
            self.heading.radians(),
        )
    }

    /// Expresses a world-frame point in this pose's body frame (x forward, y left).
    pub fn to_body_frame(&self, world: Position) -> Position {
        let local = self
            .isometry()
            .inverse_transform_point(&Point2::new(world.x(), world.y()));
        Position::new(local.x, local.y)
    }

    /// Expresses a body-frame point in the world frame.
    pub fn to_world_frame(&self, body: Position) -> Position {
        let world = self.isometry() * Point2::new(body.x(), body.y());
        Position::new(world.x, world.y)
    }
}
