//! Collision detection based on basic shapes.
//!
//! The robot is a circle, obstacles are axis-aligned rectangles. A circle collides with a
//! rectangle when its center lies inside the rectangle inflated by the circle's radius.

use super::Position;

pub trait HasCollision {
    fn has_collision(&self, other: &dyn HasCollision) -> bool {
        self.shape().has_intersection(&other.shape())
    }

    fn shape(&self) -> Shape;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Rectangle {
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    },
    Circle {
        position: Position,
        radius: f64,
    },
}

impl HasCollision for Shape {
    fn shape(&self) -> Shape {
        *self
    }
}

impl Shape {
    pub fn has_intersection(&self, other: &Shape) -> bool {
        match (self, other) {
            (
                Shape::Circle { position, radius },
                Shape::Circle {
                    position: other_position,
                    radius: other_radius,
                },
            ) => position.distance(*other_position) < radius + other_radius,
            (
                Shape::Circle { position, radius },
                Shape::Rectangle {
                    x_min,
                    x_max,
                    y_min,
                    y_max,
                },
            )
            | (
                Shape::Rectangle {
                    x_min,
                    x_max,
                    y_min,
                    y_max,
                },
                Shape::Circle { position, radius },
            ) => {
                position.x() >= x_min - radius
                    && position.x() <= x_max + radius
                    && position.y() >= y_min - radius
                    && position.y() <= y_max + radius
            }
            (
                Shape::Rectangle {
                    x_min,
                    x_max,
                    y_min,
                    y_max,
                },
                Shape::Rectangle {
                    x_min: other_x_min,
                    x_max: other_x_max,
                    y_min: other_y_min,
                    y_max: other_y_max,
                },
            ) => {
                x_min <= other_x_max
                    && other_x_min <= x_max
                    && y_min <= other_y_max
                    && other_y_min <= y_max
            }
        }
    }
}
