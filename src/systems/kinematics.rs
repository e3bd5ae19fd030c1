use crate::{
    domain::forward_kinematics,
    ecs::{ComponentKind, EntityMut, Signature, System, SystemContext},
};

/// Zero-slip differential drive: turns wheel speeds into body velocities and advances the true
/// wheel angles.
pub struct DiffDriveKinematics;

impl<R> System<R> for DiffDriveKinematics {
    fn name(&self) -> &'static str {
        "diff_drive_kinematics"
    }

    fn signature(&self) -> Signature {
        Signature::of(&[ComponentKind::Body, ComponentKind::DiffDriveWheels])
    }

    fn update(&mut self, entity: EntityMut<'_>, _ctx: &mut SystemContext<'_, R>, dt: f64) {
        let (Some(body), Some(wheels)) = (entity.body, entity.wheels) else {
            return;
        };
        let (v, omega) = forward_kinematics(
            wheels.left,
            wheels.right,
            wheels.wheel_radius,
            wheels.wheel_base,
        );
        let heading = body.pose.heading.radians();
        body.v = v;
        body.vx = v * heading.cos();
        body.vy = v * heading.sin();
        body.wz = omega;
        wheels.left_angle += wheels.left * dt;
        wheels.right_angle += wheels.right * dt;
    }
}
