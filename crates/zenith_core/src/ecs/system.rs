// system.rs - The behavior-unit contract
//
// A system owns one component kind across every entity that carries it.
// The world drives the lifecycle; implementors only override the hooks they
// need.

use crate::ecs::{Component, ComponentError, EntityRef};
use serde_json::Value;
use std::any::Any;

/// Downcasting support for registered systems.
///
/// Blanket-implemented for every `'static` type, so systems never write it
/// by hand.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Lifecycle hooks for one component kind.
///
/// Call order for a single entity:
/// `create_component` → (distribution) → `setup_component` →
/// `update_entity` once per frame → `destroy_component`.
/// `init` runs when the system becomes active and `dispose` when it stops
/// being active, each exactly once per activation.
pub trait System: AsAny {
    /// Names of systems that must be active, and whose components must be on
    /// the entity, before this system operates on it.
    fn dependencies(&self) -> &[&'static str] {
        &[]
    }

    fn init(&mut self, _state: &mut SystemState) {}

    fn dispose(&mut self, _state: &mut SystemState) {}

    /// Build this system's component for `entity`.
    ///
    /// The entity has no id yet and its sibling components are not installed;
    /// keep a `downgrade()`d handle if the component needs to reach it later.
    fn create_component(
        &mut self,
        options: &Value,
        entity: &EntityRef,
    ) -> Result<Component, ComponentError>;

    /// Cross-component wiring, run once all of the entity's systems hold it.
    fn setup_component(&mut self, _entity: &EntityRef) {}

    /// Release a component. The component has already been taken off the
    /// entity.
    fn destroy_component(&mut self, _component: Component, _entity: &EntityRef) {}

    /// Per-frame pass over the system's entities in insertion order.
    fn update(&mut self, entities: &[EntityRef], delta: f32, time: f64) {
        for entity in entities {
            self.update_entity(entity, delta, time);
        }
    }

    fn update_entity(&mut self, _entity: &EntityRef, _delta: f32, _time: f64) {}
}

/// Coordinator-side bookkeeping for a registered system.
#[derive(Debug)]
pub struct SystemState {
    name: String,
    entities: Vec<EntityRef>,
    updates_enabled: bool,
}

impl SystemState {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            entities: Vec::new(),
            updates_enabled: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entities carrying this system's component, in insertion order.
    pub fn entities(&self) -> &[EntityRef] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, entity: &EntityRef) -> bool {
        self.entities.iter().any(|held| held.ptr_eq(entity))
    }

    pub(crate) fn add_entity(&mut self, entity: EntityRef) {
        self.entities.push(entity);
    }

    pub(crate) fn remove_entity(&mut self, entity: &EntityRef) -> bool {
        let before = self.entities.len();
        self.entities.retain(|held| !held.ptr_eq(entity));
        self.entities.len() != before
    }

    pub(crate) fn take_entities(&mut self) -> Vec<EntityRef> {
        std::mem::take(&mut self.entities)
    }

    #[inline]
    pub fn updates_enabled(&self) -> bool {
        self.updates_enabled
    }

    pub fn enable_updates(&mut self) {
        self.updates_enabled = true;
    }

    pub fn disable_updates(&mut self) {
        self.updates_enabled = false;
    }
}
