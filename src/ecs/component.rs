//! Component records and the typed columns they are stored in.

use std::collections::BTreeMap;

use crate::domain::{Angle, HasCollision, MarkerDetection, Pose, Position, Shape};

use super::Entity;

/// Rigid body of the robot. `vx` and `vy` are world-frame velocities, `v` is the forward speed
/// in the body frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Body {
    pub pose: Pose,
    pub v: f64,
    pub vx: f64,
    pub vy: f64,
    pub wz: f64,
    pub radius: f64,
    /// Set while the last integration step was rejected by a collision.
    pub colliding: bool,
}

impl Body {
    pub fn new(position: Position, heading: Angle, radius: f64) -> Self {
        Self {
            pose: Pose::new(position, heading.normalized()),
            radius,
            ..Default::default()
        }
    }
}

impl HasCollision for Body {
    fn shape(&self) -> Shape {
        Shape::Circle {
            position: self.pose.position,
            radius: self.radius,
        }
    }
}

/// Wheel actuation: angular velocities in rad/s and the true accumulated wheel angles.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiffDriveWheels {
    pub left: f64,
    pub right: f64,
    pub left_angle: f64,
    pub right_angle: f64,
    pub wheel_radius: f64,
    pub wheel_base: f64,
}

impl DiffDriveWheels {
    pub fn new(wheel_radius: f64, wheel_base: f64) -> Self {
        Self {
            wheel_radius,
            wheel_base,
            ..Default::default()
        }
    }

    pub fn stop(&mut self) {
        self.left = 0.0;
        self.right = 0.0;
    }
}

/// What the wheel encoders report, a possibly noisy mirror of [`DiffDriveWheels`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiffDriveWheelsEncoders {
    pub left: f64,
    pub right: f64,
    pub left_angle: f64,
    pub right_angle: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Imu {
    pub yaw_rate: f64,
    pub forward_accel: f64,
    pub lateral_accel: f64,
    pub prev_forward_vel: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Lidar {
    pub num_rays: usize,
    pub angle_min: f64,
    pub angle_max: f64,
    pub max_range: f64,
    pub step: f64,
    /// Standard deviation of the noise added to every march increment.
    pub step_jitter: f64,
    pub ranges: Vec<f64>,
}

impl Lidar {
    /// Ranges start out at `max_range`, i.e. "no return".
    pub fn new(
        num_rays: usize,
        angle_min: f64,
        angle_max: f64,
        max_range: f64,
        step: f64,
        step_jitter: f64,
    ) -> Self {
        Self {
            num_rays,
            angle_min,
            angle_max,
            max_range,
            step,
            step_jitter,
            ranges: vec![max_range; num_rays],
        }
    }

    pub fn angle_increment(&self) -> f64 {
        if self.num_rays == 0 {
            return 0.0;
        }
        (self.angle_max - self.angle_min) / self.num_rays as f64
    }

    pub fn ray_angle(&self, index: usize) -> f64 {
        self.angle_min + index as f64 * self.angle_increment()
    }
}

/// Marker camera with the detections of the last step.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub fov: Angle,
    pub range: f64,
    pub occlusion_resolution: f64,
    pub detections: Vec<MarkerDetection>,
}

impl Camera {
    pub fn new(fov: Angle, range: f64, occlusion_resolution: f64) -> Self {
        Self {
            fov,
            range,
            occlusion_resolution,
            detections: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Body,
    DiffDriveWheels,
    DiffDriveWheelsEncoders,
    Imu,
    Lidar,
    Camera,
}

impl ComponentKind {
    pub const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Set of component kinds, used both as an entity's component set and a system's requirement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Signature(u8);

impl Signature {
    pub const EMPTY: Signature = Signature(0);

    pub const fn of(kinds: &[ComponentKind]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < kinds.len() {
            bits |= kinds[i].bit();
            i += 1;
        }
        Signature(bits)
    }

    pub const fn has(self, kind: ComponentKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Whether every kind in `required` is also in `self`.
    pub const fn contains(self, required: Signature) -> bool {
        self.0 & required.0 == required.0
    }

    pub const fn with(self, kind: ComponentKind) -> Self {
        Signature(self.0 | kind.bit())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Component {
    Body(Body),
    DiffDriveWheels(DiffDriveWheels),
    DiffDriveWheelsEncoders(DiffDriveWheelsEncoders),
    Imu(Imu),
    Lidar(Lidar),
    Camera(Camera),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Body(_) => ComponentKind::Body,
            Component::DiffDriveWheels(_) => ComponentKind::DiffDriveWheels,
            Component::DiffDriveWheelsEncoders(_) => ComponentKind::DiffDriveWheelsEncoders,
            Component::Imu(_) => ComponentKind::Imu,
            Component::Lidar(_) => ComponentKind::Lidar,
            Component::Camera(_) => ComponentKind::Camera,
        }
    }
}

/// One column per component kind. Keys are entity ids, so iteration follows creation order.
#[derive(Debug, Default)]
pub struct ComponentStore {
    bodies: BTreeMap<Entity, Body>,
    wheels: BTreeMap<Entity, DiffDriveWheels>,
    encoders: BTreeMap<Entity, DiffDriveWheelsEncoders>,
    imus: BTreeMap<Entity, Imu>,
    lidars: BTreeMap<Entity, Lidar>,
    cameras: BTreeMap<Entity, Camera>,
}

impl ComponentStore {
    pub(super) fn insert(&mut self, entity: Entity, component: Component) {
        match component {
            Component::Body(c) => {
                self.bodies.insert(entity, c);
            }
            Component::DiffDriveWheels(c) => {
                self.wheels.insert(entity, c);
            }
            Component::DiffDriveWheelsEncoders(c) => {
                self.encoders.insert(entity, c);
            }
            Component::Imu(c) => {
                self.imus.insert(entity, c);
            }
            Component::Lidar(c) => {
                self.lidars.insert(entity, c);
            }
            Component::Camera(c) => {
                self.cameras.insert(entity, c);
            }
        }
    }

    /// Split borrow of every column at `entity`.
    pub(super) fn entity_mut(&mut self, entity: Entity) -> EntityMut<'_> {
        EntityMut {
            id: entity,
            body: self.bodies.get_mut(&entity),
            wheels: self.wheels.get_mut(&entity),
            encoders: self.encoders.get_mut(&entity),
            imu: self.imus.get_mut(&entity),
            lidar: self.lidars.get_mut(&entity),
            camera: self.cameras.get_mut(&entity),
        }
    }
}

/// Mutable view of one entity's components handed to systems. Every component listed in the
/// system's signature is guaranteed to be `Some`.
#[derive(Debug)]
pub struct EntityMut<'a> {
    pub id: Entity,
    pub body: Option<&'a mut Body>,
    pub wheels: Option<&'a mut DiffDriveWheels>,
    pub encoders: Option<&'a mut DiffDriveWheelsEncoders>,
    pub imu: Option<&'a mut Imu>,
    pub lidar: Option<&'a mut Lidar>,
    pub camera: Option<&'a mut Camera>,
}

/// Typed access to the column of a component kind.
pub trait ComponentData: Sized + Into<Component> {
    fn column(store: &ComponentStore) -> &BTreeMap<Entity, Self>;

    fn column_mut(store: &mut ComponentStore) -> &mut BTreeMap<Entity, Self>;
}

macro_rules! component_data {
    ($ty:ident, $field:ident) => {
        impl ComponentData for $ty {
            fn column(store: &ComponentStore) -> &BTreeMap<Entity, Self> {
                &store.$field
            }

            fn column_mut(store: &mut ComponentStore) -> &mut BTreeMap<Entity, Self> {
                &mut store.$field
            }
        }

        impl From<$ty> for Component {
            fn from(value: $ty) -> Self {
                Component::$ty(value)
            }
        }
    };
}

component_data!(Body, bodies);
component_data!(DiffDriveWheels, wheels);
component_data!(DiffDriveWheelsEncoders, encoders);
component_data!(Imu, imus);
component_data!(Lidar, lidars);
component_data!(Camera, cameras);
