use crate::{
    ecs::{ComponentKind, EntityMut, Signature, System, SystemContext},
    engine::Scene,
};

/// Wheel encoders: true wheel speed plus Gaussian noise, integrated into per-wheel angles.
pub struct EncoderSystem {
    noise_stddev: f64,
}

impl EncoderSystem {
    pub fn new(noise_stddev: f64) -> Self {
        Self { noise_stddev }
    }
}

impl System<Scene> for EncoderSystem {
    fn name(&self) -> &'static str {
        "encoders"
    }

    fn signature(&self) -> Signature {
        Signature::of(&[
            ComponentKind::DiffDriveWheels,
            ComponentKind::DiffDriveWheelsEncoders,
        ])
    }

    fn update(&mut self, entity: EntityMut<'_>, ctx: &mut SystemContext<'_, Scene>, dt: f64) {
        let (Some(wheels), Some(encoders)) = (entity.wheels, entity.encoders) else {
            return;
        };
        let noise = &mut ctx.resources.noise;
        encoders.left = wheels.left + noise.gaussian(self.noise_stddev);
        encoders.right = wheels.right + noise.gaussian(self.noise_stddev);
        encoders.left_angle += encoders.left * dt;
        encoders.right_angle += encoders.right * dt;
    }
}
