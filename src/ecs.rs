//! A small entity-component store.
//!
//! Components are a closed set of plain records kept in one typed column per kind. Systems
//! declare the component kinds they need as a [`Signature`] and are only handed entities whose
//! own signature covers it.

mod component;
mod world;

pub use component::{
    Body, Camera, Component, ComponentData, ComponentKind, ComponentStore, DiffDriveWheels,
    DiffDriveWheelsEncoders, EntityMut, Imu, Lidar, Signature,
};
pub use world::{Entity, System, SystemContext, World};
