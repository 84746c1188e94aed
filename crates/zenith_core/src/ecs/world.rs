// world.rs - Entity-component-system coordinator
//
// Owns the system registry, decides which systems are live, creates entities
// and drives the per-frame update. Entity removal is always deferred to the
// end of `update` so no system ever sees its entity list shrink mid-pass.

use crate::ecs::{
    AsAny, Component, ComponentError, ComponentManifest, ComponentMap, EntityId, EntityRef, IdGenerator,
    SequentialIds, System, SystemHandle, SystemRegistrationError, SystemRegistry,
};
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, trace, warn};
use zenith_metrics::{Counter, SystemProfiler};

/// Why `World::create_entity` refused to create an entity.
#[derive(Debug, Error)]
pub enum CreateEntityError {
    #[error("no system is registered for component '{name}'")]
    UnknownSystem { name: String },

    #[error("system '{system}' is missing required dependencies: {}", .missing.join(", "))]
    MissingDependency { system: String, missing: Vec<String> },

    #[error("dependency cycle: {}", .path.join(" -> "))]
    DependencyCycle { path: Vec<String> },

    #[error("system '{system}' could not create its component: {source}")]
    Component {
        system: String,
        #[source]
        source: ComponentError,
    },
}

/// Why `World::remove_system` refused to deactivate a system.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RemoveSystemError {
    #[error("system '{name}' is not active")]
    NotActive { name: String },

    #[error("system '{name}' is required by active systems: {}", .dependents.join(", "))]
    HasDependents { name: String, dependents: Vec<String> },
}

/// Per-frame counters exposed to hosts and diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    pub frame: u64,
    pub active_systems: usize,
    pub live_entities: usize,
    pub removed_last_flush: usize,
    pub pending_removals: usize,
}

#[derive(Default)]
struct RemovalQueue {
    entities: Vec<EntityRef>,
}

impl RemovalQueue {
    fn push(&mut self, entity: &EntityRef) {
        if !self.entities.iter().any(|queued| queued.ptr_eq(entity)) {
            self.entities.push(entity.clone());
        }
    }
}

/// The coordinator.
///
/// Single-threaded: entity handles are reference counted, so a world can only
/// be driven from the thread that built it. Hosts that need to reach it from
/// several threads must serialize every call themselves.
pub struct World {
    registry: SystemRegistry,
    active: Vec<SystemHandle>,
    ids: Box<dyn IdGenerator>,
    removals: Rc<RefCell<RemovalQueue>>,
    profiler: SystemProfiler,
    counters: Counter,
    frame: u64,
    removed_last_flush: usize,
}

impl World {
    /// Create a world with an empty registry.
    pub fn new() -> Self {
        Self::with_registry(SystemRegistry::new())
    }

    /// Create a world around a registry built at startup.
    pub fn with_registry(registry: SystemRegistry) -> Self {
        Self {
            registry,
            active: Vec::new(),
            ids: Box::new(SequentialIds::new()),
            removals: Rc::new(RefCell::new(RemovalQueue::default())),
            profiler: SystemProfiler::new(),
            counters: Counter::new(),
            frame: 0,
            removed_last_flush: 0,
        }
    }

    /// Replace the id generator. Only ids issued afterwards are affected.
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Add a system to the registry. It stays dormant until an entity needs it.
    pub fn register_system(
        &mut self,
        name: impl Into<String>,
        system: impl System,
    ) -> Result<SystemHandle, SystemRegistrationError> {
        self.registry.register(name, Box::new(system))
    }

    /// Every registered system, active or dormant.
    pub fn registry(&self) -> &SystemRegistry {
        &self.registry
    }

    /// Create an entity from a manifest.
    ///
    /// Systems the manifest needs are activated first (dependencies before
    /// dependents). On error no entity exists afterwards; systems that were
    /// activated along the way stay active, with no entities, until the next
    /// flush releases them.
    pub fn create_entity(
        &mut self,
        manifest: impl Into<ComponentManifest>,
    ) -> Result<EntityRef, CreateEntityError> {
        let manifest = manifest.into();
        let result = self.build_entity(&manifest);
        match &result {
            Ok(entity) => {
                self.counters.increment("entities.created", 1);
                debug!(id = ?entity.id(), components = manifest.len(), "entity created");
            }
            Err(err) => warn!(error = %err, "entity creation rejected"),
        }
        result
    }

    fn build_entity(&mut self, manifest: &ComponentManifest) -> Result<EntityRef, CreateEntityError> {
        let mut handles = Vec::with_capacity(manifest.len());
        for name in manifest.names_iter() {
            let mut path = Vec::new();
            handles.push(self.ensure_active(name, &mut path)?);
        }

        self.validate_dependencies(manifest, &handles)?;

        let entity = EntityRef::new();
        let components = self.create_components(manifest, &handles, &entity)?;

        let id = self.ids.next_id();
        {
            let mut inner = entity.borrow_mut();
            inner.setup(id);
            inner.set_components(components);
        }

        let carriers: Vec<SystemHandle> = self
            .active
            .iter()
            .copied()
            .filter(|&handle| entity.has_component(self.registry.slot(handle).name()))
            .collect();
        for &handle in &carriers {
            self.registry.slot_mut(handle).state.add_entity(entity.clone());
        }
        for &handle in &carriers {
            self.registry.slot_mut(handle).behavior.setup_component(&entity);
        }

        let removals = Rc::downgrade(&self.removals);
        entity.on_destroy(move |destroyed| {
            if let Some(queue) = removals.upgrade() {
                queue.borrow_mut().push(destroyed);
            }
        });

        Ok(entity)
    }

    /// Activate `name` and, before it, every dependency it needs.
    fn ensure_active(
        &mut self,
        name: &str,
        path: &mut Vec<SystemHandle>,
    ) -> Result<SystemHandle, CreateEntityError> {
        let handle = self
            .registry
            .handle(name)
            .ok_or_else(|| CreateEntityError::UnknownSystem {
                name: name.to_string(),
            })?;

        if self.registry.slot(handle).active {
            return Ok(handle);
        }

        if path.contains(&handle) {
            let mut cycle: Vec<String> = path
                .iter()
                .skip_while(|&&visited| visited != handle)
                .map(|&visited| self.registry.slot(visited).name().to_string())
                .collect();
            cycle.push(name.to_string());
            return Err(CreateEntityError::DependencyCycle { path: cycle });
        }

        path.push(handle);
        let dependencies = self.registry.slot(handle).dependencies.clone();
        for dependency in &dependencies {
            self.ensure_active(dependency, path)?;
        }
        path.pop();

        self.activate(handle);
        Ok(handle)
    }

    /// Every requested system must find its dependencies active and carried by
    /// the same entity, and the active set as a whole must stay closed under
    /// dependencies.
    fn validate_dependencies(
        &self,
        manifest: &ComponentManifest,
        handles: &[SystemHandle],
    ) -> Result<(), CreateEntityError> {
        for &handle in handles {
            let system = self.registry.slot(handle);
            let missing: Vec<String> = system
                .dependencies
                .iter()
                .filter(|dependency| !manifest.contains(dependency) || !self.is_active(dependency))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(CreateEntityError::MissingDependency {
                    system: system.name().to_string(),
                    missing,
                });
            }
        }

        for &handle in &self.active {
            let system = self.registry.slot(handle);
            let missing: Vec<String> = system
                .dependencies
                .iter()
                .filter(|dependency| !self.is_active(dependency))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(CreateEntityError::MissingDependency {
                    system: system.name().to_string(),
                    missing,
                });
            }
        }

        Ok(())
    }

    /// Run `create_component` in manifest order. If one system refuses, the
    /// components created so far go back to their systems.
    fn create_components(
        &mut self,
        manifest: &ComponentManifest,
        handles: &[SystemHandle],
        entity: &EntityRef,
    ) -> Result<ComponentMap, CreateEntityError> {
        let mut created: Vec<(SystemHandle, Component)> = Vec::with_capacity(handles.len());

        for ((name, options), &handle) in manifest.entries().iter().zip(handles) {
            match self.create_component(handle, options, entity) {
                Ok(component) => created.push((handle, component)),
                Err(source) => {
                    for (handle, component) in created.into_iter().rev() {
                        self.registry
                            .slot_mut(handle)
                            .behavior
                            .destroy_component(component, entity);
                    }
                    return Err(CreateEntityError::Component {
                        system: name.clone(),
                        source,
                    });
                }
            }
        }

        let mut components = ComponentMap::with_capacity(created.len());
        for (handle, component) in created {
            components.insert(self.registry.slot(handle).name(), component);
        }
        Ok(components)
    }

    fn create_component(
        &mut self,
        handle: SystemHandle,
        options: &Value,
        entity: &EntityRef,
    ) -> Result<Component, ComponentError> {
        self.registry
            .slot_mut(handle)
            .behavior
            .create_component(options, entity)
    }

    fn activate(&mut self, handle: SystemHandle) {
        let system = self.registry.slot_mut(handle);
        system.active = true;
        system.behavior.init(&mut system.state);
        self.active.push(handle);
        debug!(system = system.state.name(), "system activated");
    }

    fn deactivate(&mut self, handle: SystemHandle) {
        let system = self.registry.slot_mut(handle);
        if !system.active {
            return;
        }
        system.active = false;
        system.behavior.dispose(&mut system.state);
        self.active.retain(|&active| active != handle);
        self.profiler.forget(system.state.name());
        self.counters.increment("systems.disposed", 1);
        debug!(system = system.state.name(), "system deactivated");
    }

    /// Run one frame: every active system with updates enabled, in activation
    /// order, then the deferred removals.
    pub fn update(&mut self, delta: f32, time: f64) {
        self.frame += 1;
        trace!(frame = self.frame, delta, time, "frame update");

        for &handle in &self.active {
            let system = self.registry.slot_mut(handle);
            if !system.state.updates_enabled() {
                continue;
            }
            let state = &system.state;
            let behavior = &mut system.behavior;
            self.profiler
                .time_system(state.name(), || behavior.update(state.entities(), delta, time));
        }

        self.flush_removed_entities();
    }

    /// Queue an entity for removal at the next flush. Queuing twice is a no-op.
    pub fn mark_entity_for_removal(&self, entity: &EntityRef) {
        self.removals.borrow_mut().push(entity);
    }

    /// Apply the queued removals. Returns how many entities were removed.
    ///
    /// Each entity leaves its systems dependents-first. Entities destroyed by
    /// a `destroy_component` hook are removed in the same flush. Entities no
    /// system holds any more (already detached) are dropped from the queue
    /// without being counted. Idle systems are released afterwards.
    pub fn flush_removed_entities(&mut self) -> usize {
        let mut removed = 0;

        loop {
            let queued = std::mem::take(&mut self.removals.borrow_mut().entities);
            if queued.is_empty() {
                break;
            }

            for entity in &queued {
                let holders: Vec<SystemHandle> = self
                    .active
                    .iter()
                    .rev()
                    .copied()
                    .filter(|&handle| self.registry.slot(handle).state.contains(entity))
                    .collect();
                if holders.is_empty() {
                    continue;
                }

                for handle in holders {
                    let system = self.registry.slot_mut(handle);
                    system.state.remove_entity(entity);
                    let component = entity.borrow_mut().take_component(system.state.name());
                    if let Some(component) = component {
                        system.behavior.destroy_component(component, entity);
                    }
                }

                removed += 1;
            }
        }

        if removed > 0 {
            self.counters.increment("entities.removed", removed);
            debug!(removed, "flushed removed entities");
        }
        self.removed_last_flush = removed;
        self.release_idle_systems();
        removed
    }

    /// Dispose every active system that holds no entities and that no active
    /// system depends on, dependents first, until none is left.
    ///
    /// A dependency whose dependents are still busy stays active; it is
    /// released by the flush that empties the last of them. Systems left
    /// empty by a failed `create_entity` are released here too.
    fn release_idle_systems(&mut self) {
        loop {
            let idle = self.active.iter().rev().copied().find(|&handle| {
                let system = self.registry.slot(handle);
                system.state.is_empty() && self.active_dependents(system.name()).is_empty()
            });
            match idle {
                Some(handle) => self.deactivate(handle),
                None => break,
            }
        }
    }

    /// Names of active systems that declare `name` as a dependency.
    fn active_dependents(&self, name: &str) -> Vec<String> {
        self.active
            .iter()
            .map(|&active| self.registry.slot(active))
            .filter(|system| system.depends_on(name))
            .map(|system| system.name().to_string())
            .collect()
    }

    /// Deactivate an active system by name.
    ///
    /// Its entities lose the system's component (handed to
    /// `destroy_component`) but otherwise stay alive. Refused while another
    /// active system depends on it.
    pub fn remove_system(&mut self, name: &str) -> Result<(), RemoveSystemError> {
        let handle = self
            .registry
            .handle(name)
            .filter(|&handle| self.registry.slot(handle).active)
            .ok_or_else(|| RemoveSystemError::NotActive {
                name: name.to_string(),
            })?;

        let dependents = self.active_dependents(name);
        if !dependents.is_empty() {
            return Err(RemoveSystemError::HasDependents {
                name: name.to_string(),
                dependents,
            });
        }

        let system = self.registry.slot_mut(handle);
        for entity in system.state.take_entities() {
            let component = entity.borrow_mut().take_component(name);
            if let Some(component) = component {
                system.behavior.destroy_component(component, &entity);
            }
        }
        self.deactivate(handle);
        Ok(())
    }

    /// Tear everything down: destroy every entity, flush, then dispose any
    /// system still active (dependents first).
    pub fn dispose(&mut self) {
        let mut seen: HashSet<EntityId> = HashSet::new();
        let mut known: Vec<EntityRef> = Vec::new();
        for &handle in &self.active {
            for entity in self.registry.slot(handle).state.entities() {
                let fresh = entity.id().map_or(true, |id| seen.insert(id));
                if fresh {
                    known.push(entity.clone());
                }
            }
        }

        for entity in &known {
            entity.destroy();
            self.mark_entity_for_removal(entity);
        }
        self.flush_removed_entities();

        while let Some(&handle) = self.active.last() {
            self.deactivate(handle);
        }
        debug!(entities = known.len(), "world disposed");
    }

    /// Resume `update` calls for a system. Returns `false` for unknown names.
    pub fn enable_updates(&mut self, name: &str) -> bool {
        self.registry
            .by_name_mut(name)
            .map(|system| system.state.enable_updates())
            .is_some()
    }

    /// Skip a system during `update`; its entities still come and go.
    /// Returns `false` for unknown names.
    pub fn disable_updates(&mut self, name: &str) -> bool {
        self.registry
            .by_name_mut(name)
            .map(|system| system.state.disable_updates())
            .is_some()
    }

    /// `false` for unknown names as well as for disabled systems.
    pub fn updates_enabled(&self, name: &str) -> bool {
        self.registry
            .by_name(name)
            .is_some_and(|system| system.state.updates_enabled())
    }

    /// Whether the system is in the activation set.
    pub fn is_active(&self, name: &str) -> bool {
        self.registry.by_name(name).is_some_and(|system| system.active)
    }

    /// Active system names in activation order.
    pub fn active_systems(&self) -> impl Iterator<Item = &str> {
        self.active
            .iter()
            .map(|&handle| self.registry.slot(handle).name())
    }

    /// Entities held by a system. Empty for dormant or unknown systems.
    pub fn entities_of(&self, name: &str) -> &[EntityRef] {
        self.registry
            .by_name(name)
            .map(|system| system.state.entities())
            .unwrap_or(&[])
    }

    /// Typed access to a registered system.
    pub fn system<T: System>(&self, name: &str) -> Option<&T> {
        let system = self.registry.by_name(name)?;
        AsAny::as_any(system.behavior.as_ref()).downcast_ref::<T>()
    }

    /// Mutable counterpart of [`World::system`].
    pub fn system_mut<T: System>(&mut self, name: &str) -> Option<&mut T> {
        let system = self.registry.by_name_mut(name)?;
        AsAny::as_any_mut(system.behavior.as_mut()).downcast_mut::<T>()
    }

    /// Entities queued for the next flush.
    pub fn pending_removals(&self) -> usize {
        self.removals.borrow().entities.len()
    }

    /// Number of `update` calls so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Snapshot of the per-frame counters. Entities held by several systems
    /// count once.
    pub fn stats(&self) -> FrameStats {
        let mut seen: HashSet<EntityId> = HashSet::new();
        for &handle in &self.active {
            seen.extend(
                self.registry
                    .slot(handle)
                    .state
                    .entities()
                    .iter()
                    .filter_map(EntityRef::id),
            );
        }

        FrameStats {
            frame: self.frame,
            active_systems: self.active.len(),
            live_entities: seen.len(),
            removed_last_flush: self.removed_last_flush,
            pending_removals: self.pending_removals(),
        }
    }

    /// Update timings per active system.
    pub fn profiler(&self) -> &SystemProfiler {
        &self.profiler
    }

    /// `entities.created`, `entities.removed` and `systems.disposed`.
    pub fn counters(&self) -> &Counter {
        &self.counters
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::{Transform, TransformSystem, VelocitySystem, TRANSFORM, VELOCITY};
    use glam::Vec3;
    use serde_json::json;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Records every lifecycle hook into a shared log.
    struct Recorder {
        label: &'static str,
        deps: &'static [&'static str],
        log: Log,
        reject: bool,
        on_update: Option<Box<dyn FnMut(&[EntityRef])>>,
        cascade: Rc<RefCell<Vec<EntityRef>>>,
    }

    impl Recorder {
        fn new(label: &'static str, log: &Log) -> Self {
            Self {
                label,
                deps: &[],
                log: log.clone(),
                reject: false,
                on_update: None,
                cascade: Rc::default(),
            }
        }

        fn depends_on(mut self, deps: &'static [&'static str]) -> Self {
            self.deps = deps;
            self
        }

        fn rejecting(mut self) -> Self {
            self.reject = true;
            self
        }

        fn on_update(mut self, hook: impl FnMut(&[EntityRef]) + 'static) -> Self {
            self.on_update = Some(Box::new(hook));
            self
        }

        fn cascading(mut self, targets: Rc<RefCell<Vec<EntityRef>>>) -> Self {
            self.cascade = targets;
            self
        }

        fn record(&self, event: &str) {
            self.log.borrow_mut().push(format!("{event}:{}", self.label));
        }
    }

    impl System for Recorder {
        fn dependencies(&self) -> &[&'static str] {
            self.deps
        }

        fn init(&mut self, _state: &mut crate::ecs::SystemState) {
            self.record("init");
        }

        fn dispose(&mut self, _state: &mut crate::ecs::SystemState) {
            self.record("dispose");
        }

        fn create_component(
            &mut self,
            options: &Value,
            _entity: &EntityRef,
        ) -> Result<Component, ComponentError> {
            if self.reject {
                return Err(ComponentError::rejected("recorder refused"));
            }
            self.record("create");
            Ok(Box::new(options.clone()))
        }

        fn setup_component(&mut self, entity: &EntityRef) {
            let siblings = entity.borrow().component_count();
            self.record(&format!("setup[{siblings}]"));
        }

        fn destroy_component(&mut self, _component: Component, _entity: &EntityRef) {
            self.record("destroy");
            let targets: Vec<EntityRef> = self.cascade.borrow_mut().drain(..).collect();
            for target in targets {
                target.destroy();
            }
        }

        fn update(&mut self, entities: &[EntityRef], _delta: f32, _time: f64) {
            self.record("update");
            if let Some(hook) = &mut self.on_update {
                hook(entities);
            }
        }
    }

    fn log() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn events(log: &Log, kind: &str) -> Vec<String> {
        log.borrow()
            .iter()
            .filter(|event| event.starts_with(kind))
            .cloned()
            .collect()
    }

    fn count(log: &Log, event: &str) -> usize {
        log.borrow().iter().filter(|logged| *logged == event).count()
    }

    fn builtins() -> World {
        let mut world = World::new();
        world.register_system(TRANSFORM, TransformSystem).unwrap();
        world.register_system(VELOCITY, VelocitySystem).unwrap();
        world
    }

    #[test]
    fn velocity_moves_transform() {
        let mut world = builtins();
        let entity = world
            .create_entity(
                ComponentManifest::new()
                    .with(TRANSFORM, json!({}))
                    .with(VELOCITY, json!({ "x": 10, "y": 0 })),
            )
            .unwrap();

        world.update(1.0, 1000.0);

        let position = entity.borrow().component::<Transform>(TRANSFORM).unwrap().position;
        assert_eq!(position, Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn dependency_must_be_carried_by_the_entity() {
        let mut world = builtins();
        let err = world.create_entity([VELOCITY]).unwrap_err();

        match err {
            CreateEntityError::MissingDependency { system, missing } => {
                assert_eq!(system, VELOCITY);
                assert_eq!(missing, [TRANSFORM]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(world.stats().live_entities, 0);
        assert!(world.entities_of(VELOCITY).is_empty());
    }

    #[test]
    fn destroyed_entity_stays_listed_until_the_flush() {
        let log = log();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut world = World::new();
        let lengths = seen.clone();
        world
            .register_system(
                "a",
                Recorder::new("a", &log).on_update(move |entities| lengths.borrow_mut().push(entities.len())),
            )
            .unwrap();

        let entity = world.create_entity(["a"]).unwrap();
        entity.destroy();
        assert!(entity.is_destroyed());
        assert_eq!(world.pending_removals(), 1);
        assert_eq!(world.entities_of("a").len(), 1);

        world.update(0.016, 16.0);

        assert_eq!(*seen.borrow(), [1]);
        assert!(world.entities_of("a").is_empty());
        assert_eq!(world.pending_removals(), 0);
        assert_eq!(world.stats().removed_last_flush, 1);
    }

    #[test]
    fn system_is_disposed_once_its_last_entity_leaves() {
        let log = log();
        let mut world = World::new();
        world.register_system("s", Recorder::new("s", &log)).unwrap();

        let first = world.create_entity(["s"]).unwrap();
        let second = world.create_entity(["s"]).unwrap();
        assert_eq!(count(&log, "init:s"), 1);

        first.destroy();
        world.update(0.016, 16.0);
        assert!(world.is_active("s"));
        assert_eq!(count(&log, "dispose:s"), 0);

        second.destroy();
        world.update(0.016, 32.0);
        assert!(!world.is_active("s"));
        assert_eq!(count(&log, "dispose:s"), 1);
        assert_eq!(world.active_systems().count(), 0);

        world.update(0.016, 48.0);
        assert_eq!(count(&log, "dispose:s"), 1);

        world.create_entity(["s"]).unwrap();
        assert!(world.is_active("s"));
        assert_eq!(count(&log, "init:s"), 2);
    }

    #[test]
    fn unknown_component_leaves_the_world_untouched() {
        let mut world = builtins();
        let err = world.create_entity([TRANSFORM, "foo"]).unwrap_err();

        assert!(matches!(err, CreateEntityError::UnknownSystem { ref name } if name == "foo"));
        assert_eq!(world.registry().len(), 2);
        assert!(!world.registry().contains("foo"));
        assert_eq!(world.stats().live_entities, 0);
    }

    #[test]
    fn dependencies_activate_first() {
        let log = log();
        let mut world = World::new();
        world.register_system("c", Recorder::new("c", &log).depends_on(&["b"])).unwrap();
        world.register_system("b", Recorder::new("b", &log).depends_on(&["a"])).unwrap();
        world.register_system("a", Recorder::new("a", &log)).unwrap();

        world.create_entity(["c", "b", "a"]).unwrap();

        assert_eq!(world.active_systems().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(events(&log, "init"), ["init:a", "init:b", "init:c"]);
    }

    #[test]
    fn dependencies_update_before_dependents_every_frame() {
        let log = log();
        let mut world = World::new();
        world.register_system("b", Recorder::new("b", &log).depends_on(&["a"])).unwrap();
        world.register_system("a", Recorder::new("a", &log)).unwrap();
        world.create_entity(["b", "a"]).unwrap();

        world.update(0.016, 16.0);
        world.update(0.016, 32.0);

        assert_eq!(
            events(&log, "update"),
            ["update:a", "update:b", "update:a", "update:b"]
        );
        assert_eq!(world.frame(), 2);
    }

    #[test]
    fn destroying_during_update_does_not_shrink_later_lists() {
        let log = log();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut world = World::new();
        world
            .register_system(
                "a",
                Recorder::new("a", &log).on_update(|entities| {
                    for entity in entities {
                        entity.destroy();
                    }
                }),
            )
            .unwrap();
        let lengths = seen.clone();
        world
            .register_system(
                "b",
                Recorder::new("b", &log)
                    .depends_on(&["a"])
                    .on_update(move |entities| lengths.borrow_mut().push(entities.len())),
            )
            .unwrap();

        for _ in 0..3 {
            world.create_entity(["a", "b"]).unwrap();
        }
        world.update(0.016, 16.0);

        assert_eq!(*seen.borrow(), [3]);
        assert!(world.entities_of("a").is_empty());
        assert!(world.entities_of("b").is_empty());
        assert_eq!(events(&log, "dispose"), ["dispose:b", "dispose:a"]);
    }

    #[test]
    fn entity_has_exactly_the_requested_components() {
        let log = log();
        let mut world = World::new();
        for label in ["a", "b", "c"] {
            world.register_system(label, Recorder::new(label, &log)).unwrap();
        }

        let entity = world
            .create_entity(
                ComponentManifest::new()
                    .with("a", json!({ "speed": 3 }))
                    .with("b", Value::Null),
            )
            .unwrap();

        assert!(entity.has_component("a"));
        assert!(entity.has_component("b"));
        assert!(!entity.has_component("c"));
        assert_eq!(entity.borrow().component_count(), 2);
        assert_eq!(
            entity.borrow().component::<Value>("a"),
            Some(&json!({ "speed": 3 }))
        );
        assert!(!world.is_active("c"));
    }

    #[test]
    fn setup_runs_after_every_component_exists() {
        let log = log();
        let mut world = World::new();
        world.register_system("a", Recorder::new("a", &log)).unwrap();
        world.register_system("b", Recorder::new("b", &log)).unwrap();

        let entity = world.create_entity(["a", "b"]).unwrap();

        let lifecycle: Vec<String> = log
            .borrow()
            .iter()
            .filter(|event| !event.starts_with("init"))
            .cloned()
            .collect();
        assert_eq!(lifecycle, ["create:a", "create:b", "setup[2]:a", "setup[2]:b"]);
        assert_eq!(entity.id(), Some(1));
    }

    #[test]
    fn dependency_cycle_is_reported() {
        let log = log();
        let mut world = World::new();
        world.register_system("x", Recorder::new("x", &log).depends_on(&["y"])).unwrap();
        world.register_system("y", Recorder::new("y", &log).depends_on(&["x"])).unwrap();

        let err = world.create_entity(["x", "y"]).unwrap_err();
        match err {
            CreateEntityError::DependencyCycle { path } => assert_eq!(path, ["x", "y", "x"]),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(world.active_systems().count(), 0);
    }

    #[test]
    fn rejected_component_rolls_back_earlier_ones() {
        let log = log();
        let mut world = World::new();
        world.register_system("a", Recorder::new("a", &log)).unwrap();
        world.register_system("b", Recorder::new("b", &log).rejecting()).unwrap();

        let err = world.create_entity(["a", "b"]).unwrap_err();

        assert!(matches!(
            err,
            CreateEntityError::Component { ref system, source: ComponentError::Rejected { .. } } if system == "b"
        ));
        assert_eq!(count(&log, "create:a"), 1);
        assert_eq!(count(&log, "destroy:a"), 1);
        assert!(world.entities_of("a").is_empty());
        assert_eq!(world.stats().live_entities, 0);
    }

    #[test]
    fn destroy_is_idempotent() {
        let log = log();
        let mut world = World::new();
        world.register_system("a", Recorder::new("a", &log)).unwrap();
        let keep = world.create_entity(["a"]).unwrap();
        let entity = world.create_entity(["a"]).unwrap();

        entity.destroy();
        entity.destroy();
        world.mark_entity_for_removal(&entity);
        assert_eq!(world.pending_removals(), 1);

        assert_eq!(world.flush_removed_entities(), 1);
        assert_eq!(count(&log, "destroy:a"), 1);
        assert_eq!(world.entities_of("a"), [keep]);
    }

    #[test]
    fn marking_without_destroying_detaches_the_entity() {
        let log = log();
        let mut world = World::new();
        world.register_system("a", Recorder::new("a", &log)).unwrap();
        let entity = world.create_entity(["a"]).unwrap();

        world.mark_entity_for_removal(&entity);
        world.flush_removed_entities();

        assert!(!entity.is_destroyed());
        assert!(!entity.has_component("a"));
        assert!(!world.is_active("a"));
    }

    #[test]
    fn destroy_hooks_can_remove_more_entities_in_the_same_flush() {
        let log = log();
        let targets = Rc::new(RefCell::new(Vec::new()));
        let mut world = World::new();
        world
            .register_system("a", Recorder::new("a", &log).cascading(targets.clone()))
            .unwrap();

        let owner = world.create_entity(["a"]).unwrap();
        let child = world.create_entity(["a"]).unwrap();
        targets.borrow_mut().push(child.clone());

        owner.destroy();
        assert_eq!(world.flush_removed_entities(), 2);
        assert!(child.is_destroyed());
        assert!(!world.is_active("a"));
    }

    #[test]
    fn remove_system_detaches_its_components() {
        let log = log();
        let mut world = World::new();
        world.register_system("a", Recorder::new("a", &log)).unwrap();
        world.register_system("b", Recorder::new("b", &log).depends_on(&["a"])).unwrap();
        world.register_system("c", Recorder::new("c", &log)).unwrap();

        assert_eq!(
            world.remove_system("c"),
            Err(RemoveSystemError::NotActive { name: "c".into() })
        );

        let entity = world.create_entity(["a", "b"]).unwrap();
        assert_eq!(
            world.remove_system("a"),
            Err(RemoveSystemError::HasDependents {
                name: "a".into(),
                dependents: vec!["b".into()],
            })
        );

        world.remove_system("b").unwrap();
        assert!(!world.is_active("b"));
        assert!(!entity.has_component("b"));
        assert!(entity.has_component("a"));
        assert_eq!(world.entities_of("a").len(), 1);
        assert_eq!(events(&log, "destroy"), ["destroy:b"]);
        assert_eq!(events(&log, "dispose"), ["dispose:b"]);
    }

    #[test]
    fn dispose_tears_everything_down() {
        let log = log();
        let mut world = World::new();
        world.register_system("a", Recorder::new("a", &log)).unwrap();
        world.register_system("b", Recorder::new("b", &log).depends_on(&["a"])).unwrap();
        let first = world.create_entity(["a", "b"]).unwrap();
        let second = world.create_entity(["a"]).unwrap();

        world.dispose();

        assert!(first.is_destroyed());
        assert!(second.is_destroyed());
        assert_eq!(world.active_systems().count(), 0);
        assert_eq!(count(&log, "dispose:a"), 1);
        assert_eq!(count(&log, "dispose:b"), 1);
        assert_eq!(count(&log, "destroy:a"), 2);
    }

    #[test]
    fn disabled_systems_are_skipped() {
        let log = log();
        let mut world = World::new();
        world.register_system("a", Recorder::new("a", &log)).unwrap();
        world.create_entity(["a"]).unwrap();

        assert!(world.disable_updates("a"));
        assert!(!world.updates_enabled("a"));
        world.update(0.016, 16.0);
        assert!(events(&log, "update").is_empty());

        world.enable_updates("a");
        world.update(0.016, 32.0);
        assert_eq!(events(&log, "update"), ["update:a"]);
        assert!(!world.disable_updates("missing"));
    }

    #[test]
    fn typed_access_to_registered_systems() {
        let log = log();
        let mut world = World::new();
        world.register_system("a", Recorder::new("a", &log)).unwrap();

        assert_eq!(world.system::<Recorder>("a").map(|recorder| recorder.label), Some("a"));
        assert!(world.system::<TransformSystem>("a").is_none());
        assert!(world.system::<Recorder>("missing").is_none());

        world.system_mut::<Recorder>("a").unwrap().reject = true;
        assert!(world.create_entity(["a"]).is_err());
    }

    #[test]
    fn custom_id_generator_and_stats() {
        let log = log();
        let mut next: EntityId = 100;
        let mut world = World::new().with_id_generator(move || {
            next += 1;
            next
        });
        world.register_system("a", Recorder::new("a", &log)).unwrap();

        let first = world.create_entity(["a"]).unwrap();
        let second = world.create_entity(["a"]).unwrap();
        assert_eq!(first.id(), Some(101));
        assert_eq!(second.id(), Some(102));

        let stats = world.stats();
        assert_eq!(stats.active_systems, 1);
        assert_eq!(stats.live_entities, 2);
        if zenith_metrics::ENABLED {
            assert_eq!(world.counters().get("entities.created"), 2);
        }
    }

    fn assert_dependency_closed(world: &World) {
        for &handle in &world.active {
            let system = world.registry.slot(handle);
            for dependency in &system.dependencies {
                assert!(
                    world.is_active(dependency),
                    "'{}' is active without '{dependency}'",
                    system.name()
                );
            }
        }
    }

    #[test]
    fn emptied_dependency_is_released_after_its_dependents() {
        let log = log();
        let mut world = builtins();
        world.register_system("c", Recorder::new("c", &log)).unwrap();

        assert!(world.create_entity([VELOCITY]).is_err());
        assert!(world.is_active(VELOCITY));

        let entity = world.create_entity([TRANSFORM]).unwrap();
        entity.destroy();
        world.update(0.016, 16.0);

        assert_eq!(world.active_systems().count(), 0);
        assert_dependency_closed(&world);
        assert!(world.create_entity(["c"]).is_ok());
    }

    #[test]
    fn failed_creation_then_removals_keep_the_active_set_closed() {
        let log = log();
        let mut world = World::new();
        world.register_system("a", Recorder::new("a", &log)).unwrap();
        world.register_system("b", Recorder::new("b", &log).depends_on(&["a"])).unwrap();

        assert!(matches!(
            world.create_entity(["b"]),
            Err(CreateEntityError::MissingDependency { .. })
        ));
        assert_dependency_closed(&world);

        let entity = world.create_entity(["a"]).unwrap();
        assert_dependency_closed(&world);

        entity.destroy();
        world.update(0.016, 16.0);

        assert_dependency_closed(&world);
        assert_eq!(events(&log, "dispose"), ["dispose:b", "dispose:a"]);
        assert_eq!(world.active_systems().count(), 0);
    }

    #[test]
    fn idle_systems_from_a_failed_creation_go_at_the_next_flush() {
        let log = log();
        let mut world = World::new();
        world.register_system("a", Recorder::new("a", &log)).unwrap();
        world.register_system("b", Recorder::new("b", &log).depends_on(&["a"])).unwrap();
        world.create_entity(["a"]).unwrap();

        assert!(world.create_entity(["b"]).is_err());
        assert!(world.is_active("b"));

        world.update(0.016, 16.0);

        assert!(!world.is_active("b"));
        assert!(world.is_active("a"));
        assert_eq!(events(&log, "dispose"), ["dispose:b"]);
        assert_dependency_closed(&world);
    }

    #[test]
    fn detached_entities_are_counted_once() {
        let log = log();
        let mut world = World::new();
        world.register_system("a", Recorder::new("a", &log)).unwrap();
        world.create_entity(["a"]).unwrap();
        let entity = world.create_entity(["a"]).unwrap();

        world.mark_entity_for_removal(&entity);
        assert_eq!(world.flush_removed_entities(), 1);

        entity.destroy();
        assert_eq!(world.pending_removals(), 1);
        assert_eq!(world.flush_removed_entities(), 0);
        assert_eq!(world.stats().removed_last_flush, 0);
        assert_eq!(count(&log, "destroy:a"), 1);
        if zenith_metrics::ENABLED {
            assert_eq!(world.counters().get("entities.removed"), 1);
        }
    }
}
