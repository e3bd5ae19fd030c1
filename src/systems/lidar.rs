use crate::{
    domain::Angle,
    ecs::{ComponentKind, EntityMut, Signature, System, SystemContext},
    engine::Scene,
};

/// Ray-marching lidar. A ray that hits nothing reports the lidar's `max_range`.
pub struct LidarSystem;

impl System<Scene> for LidarSystem {
    fn name(&self) -> &'static str {
        "lidar"
    }

    fn signature(&self) -> Signature {
        Signature::of(&[ComponentKind::Body, ComponentKind::Lidar])
    }

    fn update(&mut self, entity: EntityMut<'_>, ctx: &mut SystemContext<'_, Scene>, _dt: f64) {
        let (Some(body), Some(lidar)) = (entity.body, entity.lidar) else {
            return;
        };
        let Scene {
            environment, noise, ..
        } = &mut *ctx.resources;
        let origin = body.pose.position;
        let ranges = (0..lidar.num_rays)
            .map(|i| {
                environment.cast_ray(
                    origin,
                    body.pose.heading + Angle::new(lidar.ray_angle(i)),
                    lidar.max_range,
                    lidar.step,
                    || noise.gaussian(lidar.step_jitter),
                )
            })
            .collect();
        lidar.ranges = ranges;
    }
}
