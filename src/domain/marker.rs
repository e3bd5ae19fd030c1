//! Fiducial markers placed in the world and the rules for placing them.

use serde::Deserialize;
use tracing::{info, warn};

use super::{Environment, Position};
use crate::{error::PlacementError, noise::NoiseGenerator};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MarkerId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    pub position: Position,
}

/// Constraints applied when placing markers.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlacementRules {
    /// Minimum distance to any obstacle and to the arena walls.
    pub margin: f64,
    /// Keeps randomly sampled candidates this far inside the arena.
    pub buffer: f64,
    pub max_attempts: usize,
    /// Randomly placed markers keep at least this distance to the robot.
    pub min_robot_distance: f64,
}

impl Default for PlacementRules {
    fn default() -> Self {
        Self {
            margin: 1.0,
            buffer: 0.3,
            max_attempts: 50,
            min_robot_distance: 0.5,
        }
    }
}

impl PlacementRules {
    fn check(&self, environment: &Environment, position: Position) -> Result<(), PlacementError> {
        let (x, y) = position.into();
        if !position.is_finite() {
            return Err(PlacementError::NotFinite { x, y });
        }
        if environment
            .obstacles()
            .iter()
            .any(|o| o.contains_inflated(position, self.margin))
        {
            return Err(PlacementError::InsideObstacle { x, y });
        }
        if environment.arena().clearance(position) < self.margin {
            return Err(PlacementError::NearWall { x, y });
        }
        Ok(())
    }
}

/// Registration-ordered marker list. Ids increase strictly and are never reused, even across
/// [`MarkerBoard::clear`].
#[derive(Clone, Debug, Default)]
pub struct MarkerBoard {
    markers: Vec<Marker>,
    next_id: u32,
}

impl MarkerBoard {
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    /// Places a marker at `position` after validating it against the obstacle and wall margins.
    pub fn place_at(
        &mut self,
        environment: &Environment,
        rules: &PlacementRules,
        position: Position,
    ) -> Result<MarkerId, PlacementError> {
        if let Err(err) = rules.check(environment, position) {
            warn!(%err, "marker placement rejected");
            return Err(err);
        }
        Ok(self.push(position))
    }

    /// Samples free positions uniformly inside the arena until one satisfies the rules and keeps
    /// its distance to `robot`, giving up after `rules.max_attempts`.
    pub fn place_random(
        &mut self,
        environment: &Environment,
        rules: &PlacementRules,
        robot: Position,
        noise: &mut NoiseGenerator,
    ) -> Result<MarkerId, PlacementError> {
        let arena = environment.arena();
        for attempt in 1..=rules.max_attempts {
            let candidate = Position::new(
                noise.uniform(arena.x_min + rules.buffer, arena.x_max - rules.buffer),
                noise.uniform(arena.y_min + rules.buffer, arena.y_max - rules.buffer),
            );
            if candidate.distance(robot) < rules.min_robot_distance
                || rules.check(environment, candidate).is_err()
            {
                continue;
            }
            let id = self.push(candidate);
            info!(
                id = id.0,
                x = candidate.x(),
                y = candidate.y(),
                attempt,
                "placed random marker"
            );
            return Ok(id);
        }
        let err = PlacementError::Exhausted {
            attempts: rules.max_attempts,
        };
        warn!(%err, "marker placement failed");
        Err(err)
    }

    fn push(&mut self, position: Position) -> MarkerId {
        let id = MarkerId(self.next_id);
        self.next_id += 1;
        self.markers.push(Marker { id, position });
        id
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::domain::{Arena, Obstacle};

    fn environment() -> Environment {
        Environment::new(
            Arena::square(8.0),
            vec![Obstacle::new(0.0, 1.0, 0.0, 1.0).unwrap()],
        )
    }

    #[rstest]
    #[case::far_outside(Position::new(100.0, 100.0), PlacementError::NearWall { x: 100.0, y: 100.0 })]
    #[case::near_wall(Position::new(7.5, 0.0), PlacementError::NearWall { x: 7.5, y: 0.0 })]
    #[case::inside_obstacle(Position::new(0.5, 0.5), PlacementError::InsideObstacle { x: 0.5, y: 0.5 })]
    #[case::within_margin(Position::new(1.8, 0.5), PlacementError::InsideObstacle { x: 1.8, y: 0.5 })]
    fn test_place_at_rejected(#[case] position: Position, #[case] expected: PlacementError) {
        let mut board = MarkerBoard::default();
        let result = board.place_at(&environment(), &PlacementRules::default(), position);
        assert_eq!(result, Err(expected));
        assert!(board.is_empty());
    }

    #[test]
    fn test_place_at_rejects_nan() {
        let mut board = MarkerBoard::default();
        let result = board.place_at(
            &environment(),
            &PlacementRules::default(),
            Position::new(f64::NAN, 0.0),
        );
        assert!(matches!(result, Err(PlacementError::NotFinite { .. })));
        assert!(board.is_empty());
    }

    #[test]
    fn test_place_at_ids_increase() {
        let mut board = MarkerBoard::default();
        let rules = PlacementRules::default();
        let a = board.place_at(&environment(), &rules, Position::new(-3.0, -3.0)).unwrap();
        let b = board.place_at(&environment(), &rules, Position::new(3.0, -3.0)).unwrap();
        board.clear();
        let c = board.place_at(&environment(), &rules, Position::new(-3.0, 3.0)).unwrap();
        assert!(a < b && b < c);
        assert_eq!(board.markers().len(), 1);
        assert_eq!(board.markers()[0].id, c);
    }

    #[test]
    fn test_place_random_respects_rules() {
        let mut board = MarkerBoard::default();
        let rules = PlacementRules::default();
        let mut noise = NoiseGenerator::new(5);
        let environment = environment();
        for _ in 0..20 {
            board
                .place_random(&environment, &rules, Position::default(), &mut noise)
                .unwrap();
        }
        for marker in board.markers() {
            assert!(environment.arena().clearance(marker.position) >= rules.margin);
            assert!(marker.position.distance(Position::default()) >= rules.min_robot_distance);
            assert!(!environment.obstacles()[0].contains_inflated(marker.position, rules.margin));
        }
    }

    #[test]
    fn test_place_random_exhausted() {
        // Every position in a 2 x 2 arena is within the 1.0 wall margin.
        let environment = Environment::new(Arena::square(1.0), vec![]);
        let mut board = MarkerBoard::default();
        let mut noise = NoiseGenerator::new(9);
        let result = board.place_random(
            &environment,
            &PlacementRules::default(),
            Position::new(5.0, 5.0),
            &mut noise,
        );
        assert_eq!(result, Err(PlacementError::Exhausted { attempts: 50 }));
        assert!(board.is_empty());
    }
}
