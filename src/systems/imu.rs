use crate::{
    ecs::{ComponentKind, EntityMut, Signature, System, SystemContext},
    engine::Scene,
};

/// Synthetic IMU. New noise is drawn once per step and the noisy values are kept on the
/// component, so reading twice between steps yields the same numbers.
pub struct ImuSystem {
    noise_stddev: f64,
    dt_epsilon: f64,
}

impl ImuSystem {
    pub fn new(noise_stddev: f64, dt_epsilon: f64) -> Self {
        Self {
            noise_stddev,
            dt_epsilon,
        }
    }
}

impl System<Scene> for ImuSystem {
    fn name(&self) -> &'static str {
        "imu"
    }

    fn signature(&self) -> Signature {
        Signature::of(&[ComponentKind::Body, ComponentKind::Imu])
    }

    fn update(&mut self, entity: EntityMut<'_>, ctx: &mut SystemContext<'_, Scene>, dt: f64) {
        let (Some(body), Some(imu)) = (entity.body, entity.imu) else {
            return;
        };
        let forward_vel = body.v;
        let forward_accel = if dt.is_finite() && dt >= self.dt_epsilon {
            (forward_vel - imu.prev_forward_vel) / dt
        } else {
            0.0
        };
        imu.prev_forward_vel = forward_vel;

        let noise = &mut ctx.resources.noise;
        imu.yaw_rate = body.wz + noise.gaussian(self.noise_stddev);
        imu.forward_accel = forward_accel + noise.gaussian(self.noise_stddev);
        imu.lateral_accel = forward_vel * body.wz + noise.gaussian(self.noise_stddev);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    use super::*;
    use crate::{
        domain::{Angle, Position},
        ecs::{Body, Entity, Imu, World},
        tests::open_scene,
    };

    const EPSILON: f64 = 1e-9;

    fn world(noise_stddev: f64) -> (World<Scene>, Entity) {
        let mut world = World::new(open_scene());
        let entity = world
            .create_entity([
                Body::new(Position::default(), Angle::new(0.25), 0.3).into(),
                Imu::default().into(),
            ])
            .unwrap();
        world.add_system(ImuSystem::new(noise_stddev, 1e-6));
        (world, entity)
    }

    fn set_velocity(world: &mut World<Scene>, entity: Entity, v: f64, wz: f64) {
        let body = world.get_mut::<Body>(entity).unwrap();
        let heading = body.pose.heading.radians();
        body.v = v;
        body.vx = v * heading.cos();
        body.vy = v * heading.sin();
        body.wz = wz;
    }

    #[rstest]
    #[case::accelerate(0.0, 1.0, 0.0, 10.0, 0.0)]
    #[case::brake(2.0, 1.0, 0.0, -10.0, 0.0)]
    #[case::turn(1.0, 1.0, 0.5, 0.0, 0.5)]
    fn test_noise_free_imu(
        #[case] v_before: f64,
        #[case] v_after: f64,
        #[case] wz: f64,
        #[case] forward_accel: f64,
        #[case] lateral_accel: f64,
    ) {
        let (mut world, entity) = world(0.0);
        set_velocity(&mut world, entity, v_before, wz);
        world.step(0.1);
        set_velocity(&mut world, entity, v_after, wz);
        world.step(0.1);

        let imu = world.get::<Imu>(entity).unwrap();
        assert_abs_diff_eq!(imu.yaw_rate, wz, epsilon = EPSILON);
        assert_abs_diff_eq!(imu.forward_accel, forward_accel, epsilon = EPSILON);
        assert_abs_diff_eq!(imu.lateral_accel, lateral_accel, epsilon = EPSILON);
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::tiny(1e-9)]
    #[case::nan(f64::NAN)]
    fn test_degenerate_dt_gives_zero_accel(#[case] dt: f64) {
        let (mut world, entity) = world(0.0);
        set_velocity(&mut world, entity, 3.0, 0.0);
        world.step(dt);
        let imu = world.get::<Imu>(entity).unwrap();
        assert_eq!(imu.forward_accel, 0.0);
    }

    #[test]
    fn test_noise_is_per_step() {
        let (mut world, entity) = world(0.02);
        world.step(0.1);
        let first = world.get::<Imu>(entity).unwrap().clone();
        assert_eq!(world.get::<Imu>(entity), Some(&first));
        world.step(0.1);
        let second = world.get::<Imu>(entity).unwrap();
        assert_ne!(first.yaw_rate, second.yaw_rate);
        assert_ne!(first.forward_accel, second.forward_accel);
        assert_ne!(first.lateral_accel, second.lateral_accel);
        assert!(second.yaw_rate.abs() < 0.2);
    }
}
