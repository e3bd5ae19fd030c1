use tracing::warn;

use crate::{
    domain::{Angle, Pose, Position},
    ecs::{ComponentKind, EntityMut, Signature, System, SystemContext},
    engine::Scene,
};

/// Forward-Euler pose integration with collision rejection.
///
/// A candidate position that would put the robot's circle into an obstacle or across the arena
/// boundary is dropped: the robot keeps its position, still turns, and all body and wheel
/// velocities are zeroed so nothing drifts into the next step.
pub struct IntegrateAndCollide;

impl System<Scene> for IntegrateAndCollide {
    fn name(&self) -> &'static str {
        "integrate_and_collide"
    }

    fn signature(&self) -> Signature {
        Signature::of(&[ComponentKind::Body])
    }

    fn update(&mut self, entity: EntityMut<'_>, ctx: &mut SystemContext<'_, Scene>, dt: f64) {
        let Some(body) = entity.body else {
            return;
        };
        let candidate = body.pose.position + Position::new(body.vx * dt, body.vy * dt);
        let heading = Angle::new(body.pose.heading.radians() + body.wz * dt).normalized();

        if ctx.resources.environment.is_free(candidate, body.radius) {
            body.pose = Pose::new(candidate, heading);
            body.colliding = false;
            return;
        }

        if !body.colliding {
            warn!(
                x = body.pose.position.x(),
                y = body.pose.position.y(),
                time = ctx.time,
                "collision, translation rejected"
            );
        }
        body.colliding = true;
        body.pose.heading = heading;
        body.v = 0.0;
        body.vx = 0.0;
        body.vy = 0.0;
        body.wz = 0.0;
        if let Some(wheels) = entity.wheels {
            wheels.stop();
        }
    }
}
