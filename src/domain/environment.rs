//! Environment with an arena boundary and axis-aligned obstacles.

use serde::Deserialize;

use super::{Angle, HasCollision, Position, Shape};
use crate::error::SimError;

/// Rectangular arena the robot lives in. Its boundary behaves like a wall.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct Arena {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Arena {
    pub const fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Square arena centered on the origin.
    pub const fn square(half_extent: f64) -> Self {
        Self::new(-half_extent, half_extent, -half_extent, half_extent)
    }

    /// Strict containment, points on the boundary are outside.
    pub fn contains(&self, position: Position) -> bool {
        position.x() > self.x_min
            && position.x() < self.x_max
            && position.y() > self.y_min
            && position.y() < self.y_max
    }

    pub fn contains_circle(&self, position: Position, radius: f64) -> bool {
        position.x() - radius >= self.x_min
            && position.x() + radius <= self.x_max
            && position.y() - radius >= self.y_min
            && position.y() + radius <= self.y_max
    }

    /// Distance from `position` to the nearest wall, negative when outside.
    pub fn clearance(&self, position: Position) -> f64 {
        (position.x() - self.x_min)
            .min(self.x_max - position.x())
            .min(position.y() - self.y_min)
            .min(self.y_max - position.y())
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn center(&self) -> Position {
        Position::new(
            0.5 * (self.x_min + self.x_max),
            0.5 * (self.y_min + self.y_max),
        )
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::square(8.0)
    }
}

/// Axis-aligned rectangular obstacle. Immutable once created.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Deserialize)]
#[serde(try_from = "Vec<f64>")]
pub struct Obstacle {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Obstacle {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Result<Self, SimError> {
        let finite = [x_min, x_max, y_min, y_max].iter().all(|v| v.is_finite());
        if !finite || x_min > x_max || y_min > y_max {
            return Err(SimError::InvalidObstacleBounds {
                x_min,
                x_max,
                y_min,
                y_max,
            });
        }
        Ok(Self {
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }

    /// Obstacle of the given size centered at `center`.
    pub fn centered(center: Position, x_length: f64, y_length: f64) -> Result<Self, SimError> {
        Self::new(
            center.x() - x_length / 2.0,
            center.x() + x_length / 2.0,
            center.y() - y_length / 2.0,
            center.y() + y_length / 2.0,
        )
    }

    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    pub fn x_length(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn y_length(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn center(&self) -> Position {
        Position::new(
            0.5 * (self.x_min + self.x_max),
            0.5 * (self.y_min + self.y_max),
        )
    }

    pub fn bottom_left_corner(&self) -> Position {
        Position::new(self.x_min, self.y_min)
    }

    pub fn top_right_corner(&self) -> Position {
        Position::new(self.x_max, self.y_max)
    }

    /// Inclusive containment.
    pub fn contains(&self, position: Position) -> bool {
        self.contains_inflated(position, 0.0)
    }

    pub fn contains_inflated(&self, position: Position, margin: f64) -> bool {
        position.x() >= self.x_min - margin
            && position.x() <= self.x_max + margin
            && position.y() >= self.y_min - margin
            && position.y() <= self.y_max + margin
    }
}

impl TryFrom<&[f64]> for Obstacle {
    type Error = SimError;

    fn try_from(value: &[f64]) -> Result<Self, Self::Error> {
        match *value {
            [x_min, x_max, y_min, y_max] => Obstacle::new(x_min, x_max, y_min, y_max),
            _ => Err(SimError::InvalidObstacle { count: value.len() }),
        }
    }
}

impl TryFrom<Vec<f64>> for Obstacle {
    type Error = SimError;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        Obstacle::try_from(value.as_slice())
    }
}

impl HasCollision for Obstacle {
    fn shape(&self) -> Shape {
        Shape::Rectangle {
            x_min: self.x_min,
            x_max: self.x_max,
            y_min: self.y_min,
            y_max: self.y_max,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Environment {
    arena: Arena,
    obstacles: Vec<Obstacle>,
}

impl Environment {
    pub fn new(arena: Arena, obstacles: Vec<Obstacle>) -> Self {
        Self { arena, obstacles }
    }

    /// Four wall obstacles of the given thickness hugging the inside of `arena`.
    pub fn walls(arena: Arena, thickness: f64) -> Result<Vec<Obstacle>, SimError> {
        Ok(vec![
            Obstacle::new(arena.x_min, arena.x_min + thickness, arena.y_min, arena.y_max)?,
            Obstacle::new(arena.x_min, arena.x_max, arena.y_min, arena.y_min + thickness)?,
            Obstacle::new(arena.x_max - thickness, arena.x_max, arena.y_min, arena.y_max)?,
            Obstacle::new(arena.x_min, arena.x_max, arena.y_max - thickness, arena.y_max)?,
        ])
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    pub fn is_occupied(&self, position: Position) -> bool {
        self.obstacles.iter().any(|o| o.contains(position))
    }

    pub fn has_collision(&self, object: &dyn HasCollision) -> bool {
        self.obstacles().iter().any(|o| o.has_collision(object))
    }

    pub fn contains(&self, object: &dyn HasCollision) -> bool {
        match object.shape() {
            Shape::Circle { position, radius } => self.arena.contains_circle(position, radius),
            Shape::Rectangle {
                x_min,
                x_max,
                y_min,
                y_max,
            } => {
                x_min >= self.arena.x_min
                    && x_max <= self.arena.x_max
                    && y_min >= self.arena.y_min
                    && y_max <= self.arena.y_max
            }
        }
    }

    /// Whether a circle of `radius` centered at `position` fits: inside the arena and outside
    /// every obstacle inflated by `radius`.
    pub fn is_free(&self, position: Position, radius: f64) -> bool {
        let footprint = Shape::Circle { position, radius };
        self.contains(&footprint) && !self.has_collision(&footprint)
    }

    /// Marches a ray from `origin` along `heading` and returns the distance of the first sample
    /// that lies inside an obstacle or on/outside the arena boundary, or `max_range` when nothing
    /// is hit. The march starts one step away from the origin, so the result is always positive.
    ///
    /// `jitter` is added to every increment; increments never drop below half a step.
    pub fn cast_ray(
        &self,
        origin: Position,
        heading: Angle,
        max_range: f64,
        step: f64,
        mut jitter: impl FnMut() -> f64,
    ) -> f64 {
        let mut range = step;
        while range < max_range {
            let sample = origin.offset(heading, range);
            if !self.arena.contains(sample) || self.is_occupied(sample) {
                return range;
            }
            range += (step + jitter()).max(0.5 * step);
        }
        max_range
    }

    /// Samples the segment between `from` and `to` every `resolution` (at least once) and returns
    /// `false` as soon as a sample falls inside an obstacle.
    pub fn line_of_sight(&self, from: Position, to: Position, resolution: f64) -> bool {
        let samples = ((from.distance(to) / resolution).ceil() as usize).max(1);
        (1..=samples)
            .map(|i| from.lerp(to, i as f64 / samples as f64))
            .all(|p| !self.is_occupied(p))
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::tests::plot_occupancy;

    const STEP: f64 = 0.05;

    fn unit_obstacle() -> Obstacle {
        Obstacle::new(0.0, 1.0, 0.0, 1.0).unwrap()
    }

    #[rstest]
    #[case::too_few(vec![1.0, 2.0, 3.0], 3)]
    #[case::too_many(vec![1.0, 2.0, 3.0, 4.0, 5.0], 5)]
    #[case::empty(vec![], 0)]
    fn test_obstacle_wrong_coordinate_count(#[case] coordinates: Vec<f64>, #[case] count: usize) {
        match Obstacle::try_from(coordinates) {
            Err(SimError::InvalidObstacle { count: c }) => assert_eq!(c, count),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[rstest]
    #[case::inverted_x(1.0, 0.0, 0.0, 1.0)]
    #[case::inverted_y(0.0, 1.0, 1.0, 0.0)]
    #[case::nan(0.0, f64::NAN, 0.0, 1.0)]
    fn test_obstacle_invalid_bounds(
        #[case] x_min: f64,
        #[case] x_max: f64,
        #[case] y_min: f64,
        #[case] y_max: f64,
    ) {
        assert!(matches!(
            Obstacle::new(x_min, x_max, y_min, y_max),
            Err(SimError::InvalidObstacleBounds { .. })
        ));
    }

    #[test]
    fn test_obstacle_centered() {
        let obstacle = Obstacle::centered(Position::new(1.0, 0.0), 1.0, 0.5).unwrap();
        assert_eq!(obstacle, Obstacle::new(0.5, 1.5, -0.25, 0.25).unwrap());
        assert_abs_diff_eq!(obstacle.x_length(), 1.0);
        assert_abs_diff_eq!(obstacle.y_length(), 0.5);
    }

    #[rstest]
    #[case::inside(Position::new(0.5, 0.5), 0.0, true)]
    #[case::edge(Position::new(1.0, 0.5), 0.0, true)]
    #[case::outside(Position::new(1.1, 0.5), 0.0, false)]
    #[case::inflated(Position::new(1.1, 0.5), 0.2, true)]
    fn test_obstacle_contains(#[case] position: Position, #[case] margin: f64, #[case] expected: bool) {
        assert_eq!(unit_obstacle().contains_inflated(position, margin), expected);
    }

    #[test]
    fn test_environment_is_free() {
        let environment = Environment::new(Arena::square(2.0), vec![unit_obstacle()]);
        assert!(environment.is_free(Position::new(-1.0, -1.0), 0.2));
        assert!(!environment.is_free(Position::new(-0.1, 0.5), 0.2));
        assert!(!environment.is_free(Position::new(-1.9, 0.0), 0.2));
        assert!(!environment.is_free(Position::new(5.0, 0.0), 0.2));
    }

    #[test]
    fn test_environment_contains_shapes() {
        let environment = Environment::new(Arena::square(2.0), vec![unit_obstacle()]);
        assert!(environment.contains(&unit_obstacle()));
        assert!(!environment.contains(&Obstacle::new(1.5, 2.5, 0.0, 1.0).unwrap()));
        assert!(environment.has_collision(&Obstacle::new(0.5, 1.5, 0.5, 1.5).unwrap()));
        assert!(!environment.has_collision(&Obstacle::new(1.5, 1.9, 0.0, 1.0).unwrap()));
    }

    #[rstest]
    #[case::east(0.0, 2.0)]
    #[case::north(0.5 * PI, 2.0)]
    #[case::west(PI, 2.0)]
    #[case::south(-0.5 * PI, 2.0)]
    #[case::diagonal(0.25 * PI, 2.0 * f64::sqrt(2.0))]
    fn test_cast_ray_arena_boundary(#[case] heading: f64, #[case] expected: f64) {
        let environment = Environment::new(Arena::square(2.0), vec![]);
        let range = environment.cast_ray(Position::default(), Angle::new(heading), 4.0, STEP, || 0.0);
        assert_abs_diff_eq!(range, expected, epsilon = STEP + 1e-9);
    }

    #[test]
    fn test_cast_ray_hits_obstacle_before_boundary() {
        let environment = Environment::new(
            Arena::square(8.0),
            vec![Obstacle::new(1.0, 2.0, -1.0, 1.0).unwrap()],
        );
        let range = environment.cast_ray(Position::default(), Angle::new(0.0), 4.0, STEP, || 0.0);
        assert_abs_diff_eq!(range, 1.0, epsilon = STEP + 1e-9);
        let range = environment.cast_ray(Position::default(), Angle::new(PI), 4.0, STEP, || 0.0);
        assert_abs_diff_eq!(range, 4.0);
    }

    #[test]
    fn test_cast_ray_is_positive_and_bounded_with_jitter() {
        let environment = Environment::new(Arena::square(1.0), vec![]);
        let mut flip = 1.0;
        for i in 0..36 {
            let range = environment.cast_ray(
                Position::default(),
                Angle::from_deg(i as f64 * 10.0),
                4.0,
                STEP,
                || {
                    flip = -flip;
                    flip * 0.2
                },
            );
            assert!(range > 0.0 && range <= 4.0, "range {range}");
        }
    }

    #[test]
    fn test_line_of_sight() {
        let environment = Environment::new(Arena::square(8.0), vec![unit_obstacle()]);
        assert!(!environment.line_of_sight(
            Position::new(-1.0, 0.5),
            Position::new(2.0, 0.5),
            0.05
        ));
        assert!(environment.line_of_sight(
            Position::new(-1.0, 2.0),
            Position::new(2.0, 2.0),
            0.05
        ));
        // Coarse resolution still takes one sample at the target.
        assert!(environment.line_of_sight(
            Position::new(-1.0, -1.0),
            Position::new(-1.0, -1.0),
            0.05
        ));
    }

    #[test]
    fn test_environment_walls() {
        let arena = Arena::square(2.0);
        let environment = Environment::new(arena, Environment::walls(arena, 1.0).unwrap());
        insta::assert_snapshot!(plot_occupancy(&environment, 1.0), @r"
        ####
        #..#
        #..#
        ####
        ");
    }

    #[test]
    fn test_environment_obstacles() {
        let environment = Environment::new(
            Arena::square(2.0),
            vec![
                Obstacle::new(-1.9, -1.1, 1.1, 1.9).unwrap(),
                Obstacle::new(0.1, 1.9, -1.9, -1.1).unwrap(),
            ],
        );
        insta::assert_snapshot!(plot_occupancy(&environment, 1.0), @r"
        #...
        ....
        ....
        ..##
        ");
    }
}
