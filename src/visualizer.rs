//! 2D top-down visualization drawn with gizmos.
//!
//! Left click drops a marker at the pointer, right click adds a box obstacle there and `T`
//! toggles the status line.

use bevy::prelude::*;
use tracing::{info, warn};

use smartbot_sim::{
    domain::{Angle, HasCollision, Obstacle, Position},
    ecs::Body,
};

use crate::resource::{EngineRes, SnapshotRes};

/// Pixels per meter.
const SCALE: f32 = 40.0;
/// Edge length of obstacles added with the mouse, in meters.
const OBSTACLE_SIZE: f64 = 0.5;
const MARKER_RADIUS: f32 = 0.1;

const ARENA_COLOR: Color = Color::rgb(0.6, 0.6, 0.6);
const OBSTACLE_COLOR: Color = Color::rgb(0.8, 0.45, 0.2);
const ROBOT_COLOR: Color = Color::rgb(0.2, 0.6, 1.0);
const COLLISION_COLOR: Color = Color::rgb(1.0, 0.2, 0.2);
const LIDAR_COLOR: Color = Color::rgba(0.2, 1.0, 0.4, 0.35);
const MARKER_COLOR: Color = Color::rgb(0.5, 0.5, 0.0);
const VISIBLE_MARKER_COLOR: Color = Color::rgb(1.0, 1.0, 0.2);

pub struct Visualizer;

impl Plugin for Visualizer {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, set_up)
            .add_systems(
                Update,
                (
                    draw_environment,
                    draw_robot,
                    draw_markers,
                    update_text,
                    handle_keyboard_input,
                    handle_mouse_input,
                ),
            )
            .insert_resource(ClearColor(Color::rgb(0.08, 0.08, 0.1)))
            .init_resource::<Overlay>();
    }
}

#[derive(Resource)]
struct Overlay {
    show_text: bool,
}

impl Default for Overlay {
    fn default() -> Self {
        Self { show_text: true }
    }
}

#[derive(Component)]
struct StatusText;

fn set_up(mut commands: Commands, engine: Res<EngineRes>) {
    let center = to_bevy_position(engine.environment().arena().center());
    let mut camera = Camera2dBundle::default();
    camera.transform.translation.x = center.x;
    camera.transform.translation.y = center.y;
    commands.spawn(camera);
    create_text(&mut commands);
}

fn create_text(commands: &mut Commands) {
    let text_style = TextStyle {
        font_size: 20.0,
        ..default()
    };
    commands.spawn((
        TextBundle::from_sections(vec![TextSection::new("", text_style.clone())]).with_style(
            Style {
                position_type: PositionType::Absolute,
                bottom: Val::Px(12.0),
                left: Val::Px(12.0),
                ..default()
            },
        ),
        StatusText,
    ));
}

fn draw_environment(engine: Res<EngineRes>, mut gizmos: Gizmos) {
    let environment = engine.environment();
    let arena = environment.arena();
    gizmos.rect_2d(
        to_bevy_position(arena.center()),
        0.0,
        to_bevy_size(arena.width(), arena.height()),
        ARENA_COLOR,
    );
    for obstacle in environment.obstacles() {
        gizmos.rect_2d(
            to_bevy_position(obstacle.center()),
            0.0,
            to_bevy_size(obstacle.x_length(), obstacle.y_length()),
            OBSTACLE_COLOR,
        );
    }
}

fn draw_robot(engine: Res<EngineRes>, snapshot: Res<SnapshotRes>, mut gizmos: Gizmos) {
    let pose = engine.robot_pose();
    let radius = engine.robot_radius();
    let center = to_bevy_position(pose.position);
    let colliding = engine
        .world()
        .get::<Body>(engine.robot())
        .is_some_and(|body| body.colliding);

    gizmos.circle_2d(
        center,
        radius as f32 * SCALE,
        if colliding { COLLISION_COLOR } else { ROBOT_COLOR },
    );
    gizmos.line_2d(
        center,
        to_bevy_position(pose.position.offset(pose.heading, radius)),
        ROBOT_COLOR,
    );

    for (angle, range) in snapshot.scan.hits() {
        let hit = pose
            .position
            .offset(Angle::new(snapshot.odom.yaw + angle), range);
        gizmos.line_2d(center, to_bevy_position(hit), LIDAR_COLOR);
    }
}

fn draw_markers(engine: Res<EngineRes>, snapshot: Res<SnapshotRes>, mut gizmos: Gizmos) {
    for marker in engine.markers() {
        let color = if snapshot.is_visible(marker) {
            VISIBLE_MARKER_COLOR
        } else {
            MARKER_COLOR
        };
        gizmos.circle_2d(
            to_bevy_position(marker.position),
            MARKER_RADIUS * SCALE,
            color,
        );
    }
}

fn update_text(
    mut text: Query<&mut Text, With<StatusText>>,
    overlay: Res<Overlay>,
    snapshot: Res<SnapshotRes>,
) {
    let mut text = text.single_mut();
    if overlay.show_text {
        let odom = &snapshot.odom;
        let yaw = Angle::new(odom.yaw).to_deg();
        let [left, right] = snapshot.joints.velocities;
        let ids: Vec<String> = snapshot
            .marker_ids()
            .iter()
            .map(|id| id.0.to_string())
            .collect();
        text.sections[0].value = format!(
            "T: {:6.2} s   POS: {:5.2} {:5.2} m {yaw:4.0} deg   WHEELS: {left:5.2} {right:5.2} rad/s   \
             GRIPPER: {}   PRESET: {}   MARKERS: [{}]",
            snapshot.time,
            odom.x,
            odom.y,
            snapshot.gripper_state,
            snapshot.manipulator_preset,
            ids.join(", "),
        );
    } else {
        text.sections[0].value = String::new();
    }
}

fn handle_keyboard_input(keys: Res<ButtonInput<KeyCode>>, mut overlay: ResMut<Overlay>) {
    if keys.just_pressed(KeyCode::KeyT) {
        overlay.show_text = !overlay.show_text;
    }
}

fn handle_mouse_input(
    cameras: Query<(&Camera, &GlobalTransform)>,
    windows: Query<&Window>,
    buttons: Res<ButtonInput<MouseButton>>,
    mut engine: ResMut<EngineRes>,
) {
    let (left, right) = (
        buttons.just_pressed(MouseButton::Left),
        buttons.just_pressed(MouseButton::Right),
    );
    if !left && !right {
        return;
    }
    let Some(pointer) = get_pointer_position(&cameras, &windows) else {
        return;
    };

    if left {
        match engine.place_marker(Some(pointer)) {
            Ok(id) => info!(id = id.0, x = pointer.x(), y = pointer.y(), "marker placed"),
            Err(err) => warn!(%err, "marker not placed"),
        }
    }

    if right {
        match Obstacle::centered(pointer, OBSTACLE_SIZE, OBSTACLE_SIZE) {
            Ok(obstacle) => {
                let blocks_robot = engine
                    .world()
                    .get::<Body>(engine.robot())
                    .is_some_and(|body| obstacle.has_collision(body));
                if blocks_robot {
                    warn!(?obstacle, "obstacle would overlap the robot");
                } else {
                    engine.add_obstacle(obstacle);
                }
            }
            Err(err) => warn!(%err, "obstacle not added"),
        }
    }
}

fn get_pointer_position(
    cameras: &Query<(&Camera, &GlobalTransform)>,
    windows: &Query<&Window>,
) -> Option<Position> {
    let (camera, camera_transform) = cameras.get_single().ok()?;
    let cursor_position = windows.get_single().ok()?.cursor_position()?;
    let point = camera.viewport_to_world_2d(camera_transform, cursor_position)?;
    Some(to_domain_position(point))
}

fn to_domain_position(position: Vec2) -> Position {
    Position::new((position.x / SCALE) as f64, (position.y / SCALE) as f64)
}

fn to_bevy_position(position: Position) -> Vec2 {
    Vec2::new(position.x() as f32, position.y() as f32) * SCALE
}

fn to_bevy_size(x_length: f64, y_length: f64) -> Vec2 {
    Vec2::new(x_length as f32, y_length as f32) * SCALE
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_position_conversion() {
        let position = Position::new(1.5, -2.25);
        let converted = to_domain_position(to_bevy_position(position));
        assert_abs_diff_eq!(converted.x(), 1.5, epsilon = 1e-6);
        assert_abs_diff_eq!(converted.y(), -2.25, epsilon = 1e-6);
        assert_eq!(to_bevy_size(1.0, 0.5), Vec2::new(SCALE, 0.5 * SCALE));
    }
}
