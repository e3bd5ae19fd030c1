use std::{
    thread,
    time::{Duration, Instant},
};

use tracing::trace;

use super::{Component, ComponentData, ComponentStore, EntityMut, Signature};
use crate::error::SimError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity(u32);

impl Entity {
    pub fn id(&self) -> u32 {
        self.0
    }
}

/// Shared state a system may read or mutate besides the entity it is updating.
pub struct SystemContext<'a, R> {
    /// World clock, already advanced for the current step.
    pub time: f64,
    pub resources: &'a mut R,
}

/// Per-step update rule over every entity whose components cover [`System::signature`].
pub trait System<R>: Send + Sync {
    fn name(&self) -> &'static str;

    fn signature(&self) -> Signature;

    fn update(&mut self, entity: EntityMut<'_>, ctx: &mut SystemContext<'_, R>, dt: f64);
}

/// Entities, their components, the ordered list of systems and the resources `R` they share.
///
/// Stepping is single threaded and deterministic: systems run in registration order, and each
/// system visits matching entities in creation order.
pub struct World<R> {
    time: f64,
    next_entity: u32,
    entities: Vec<(Entity, Signature)>,
    store: ComponentStore,
    systems: Vec<Box<dyn System<R>>>,
    resources: R,
}

impl<R> World<R> {
    pub fn new(resources: R) -> Self {
        Self {
            time: 0.0,
            next_entity: 0,
            entities: Vec::new(),
            store: ComponentStore::default(),
            systems: Vec::new(),
            resources,
        }
    }

    /// Creates an entity owning `components`. Nothing is registered if two components share a
    /// kind.
    pub fn create_entity(
        &mut self,
        components: impl IntoIterator<Item = Component>,
    ) -> Result<Entity, SimError> {
        let components: Vec<Component> = components.into_iter().collect();
        let mut signature = Signature::EMPTY;
        for component in &components {
            let kind = component.kind();
            if signature.has(kind) {
                return Err(SimError::DuplicateComponent(kind));
            }
            signature = signature.with(kind);
        }

        let entity = Entity(self.next_entity);
        self.next_entity += 1;
        for component in components {
            self.store.insert(entity, component);
        }
        self.entities.push((entity, signature));
        Ok(entity)
    }

    pub fn add_system(&mut self, system: impl System<R> + 'static) {
        self.systems.push(Box::new(system));
    }

    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().map(|(e, _)| *e)
    }

    pub fn signature(&self, entity: Entity) -> Option<Signature> {
        self.entities
            .iter()
            .find(|(e, _)| *e == entity)
            .map(|(_, s)| *s)
    }

    pub fn get<T: ComponentData>(&self, entity: Entity) -> Option<&T> {
        T::column(&self.store).get(&entity)
    }

    pub fn get_mut<T: ComponentData>(&mut self, entity: Entity) -> Option<&mut T> {
        T::column_mut(&mut self.store).get_mut(&entity)
    }

    /// Mutable access to one component together with the shared resources.
    pub fn split_mut<T: ComponentData>(&mut self, entity: Entity) -> (Option<&mut T>, &mut R) {
        (
            T::column_mut(&mut self.store).get_mut(&entity),
            &mut self.resources,
        )
    }

    /// Replaces a component the entity already owns, or attaches a new one.
    pub fn insert(
        &mut self,
        entity: Entity,
        component: impl Into<Component>,
    ) -> Result<(), SimError> {
        let component = component.into();
        let slot = self
            .entities
            .iter_mut()
            .find(|(e, _)| *e == entity)
            .ok_or(SimError::UnknownEntity(entity))?;
        slot.1 = slot.1.with(component.kind());
        self.store.insert(entity, component);
        Ok(())
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn reset_time(&mut self) {
        self.time = 0.0;
    }

    pub fn resources(&self) -> &R {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut R {
        &mut self.resources
    }

    /// Advances the clock by `dt`, then runs every system over every matching entity.
    pub fn step(&mut self, dt: f64) {
        self.time += dt;
        let Self {
            time,
            entities,
            store,
            systems,
            resources,
            ..
        } = self;
        for system in systems.iter_mut() {
            let required = system.signature();
            for (entity, signature) in entities.iter() {
                if !signature.contains(required) {
                    continue;
                }
                let mut ctx = SystemContext {
                    time: *time,
                    resources: &mut *resources,
                };
                system.update(store.entity_mut(*entity), &mut ctx, dt);
            }
        }
    }

    /// Steps by `target` and sleeps whatever is left of it. An overrun is not compensated: the
    /// next step simply starts late. Returns the time spent stepping.
    pub fn step_realtime(&mut self, target: Duration) -> Duration {
        let start = Instant::now();
        self.step(target.as_secs_f64());
        let elapsed = start.elapsed();
        match target.checked_sub(elapsed) {
            Some(remaining) if !remaining.is_zero() => thread::sleep(remaining),
            _ => trace!(?elapsed, ?target, "step overran its period"),
        }
        elapsed
    }
}
