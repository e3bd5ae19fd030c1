use crate::{
    domain::{MarkerDetection, Pose},
    ecs::{ComponentKind, EntityMut, Signature, System, SystemContext},
    engine::Scene,
};

/// Marker camera: keeps the markers that are within range, inside the field of view and not
/// hidden behind an obstacle. Detections keep the markers' registration order.
pub struct MarkerVisibility;

impl System<Scene> for MarkerVisibility {
    fn name(&self) -> &'static str {
        "marker_visibility"
    }

    fn signature(&self) -> Signature {
        Signature::of(&[ComponentKind::Body, ComponentKind::Camera])
    }

    fn update(&mut self, entity: EntityMut<'_>, ctx: &mut SystemContext<'_, Scene>, _dt: f64) {
        let (Some(body), Some(camera)) = (entity.body, entity.camera) else {
            return;
        };
        let scene = &*ctx.resources;
        let pose = body.pose;
        let half_fov = 0.5 * camera.fov.radians();
        let (range, resolution) = (camera.range, camera.occlusion_resolution);

        camera.detections = scene
            .markers
            .markers()
            .iter()
            .filter_map(|marker| {
                let relative = pose.to_body_frame(marker.position);
                if relative.norm() > range {
                    return None;
                }
                if relative.y().atan2(relative.x()).abs() > half_fov {
                    return None;
                }
                if !scene
                    .environment
                    .line_of_sight(pose.position, marker.position, resolution)
                {
                    return None;
                }
                Some(MarkerDetection {
                    id: marker.id,
                    relative: Pose::new(relative, (-pose.heading).normalized()),
                })
            })
            .collect();
    }
}
