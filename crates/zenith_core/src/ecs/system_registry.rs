use crate::ecs::{System, SystemHandle, SystemRegistrationError, SystemState};
use std::collections::HashMap;

/// Every system known to the engine, active or not, keyed by name.
pub struct SystemRegistry {
    systems: Vec<RegisteredSystem>,
    name_lookup: HashMap<String, SystemHandle>,
}

impl SystemRegistry {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            name_lookup: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        system: Box<dyn System>,
    ) -> Result<SystemHandle, SystemRegistrationError> {
        let name = name.into();
        if !is_kebab_case(&name) {
            return Err(SystemRegistrationError::InvalidName { name });
        }
        if self.name_lookup.contains_key(&name) {
            return Err(SystemRegistrationError::DuplicateName { name });
        }

        let handle = SystemHandle::new(self.systems.len());
        let dependencies = system
            .dependencies()
            .iter()
            .map(|dependency| dependency.to_string())
            .collect();

        self.name_lookup.insert(name.clone(), handle);
        self.systems.push(RegisteredSystem {
            state: SystemState::new(name),
            behavior: system,
            dependencies,
            active: false,
        });

        Ok(handle)
    }

    /// Builder-style `register`.
    pub fn with_system(
        mut self,
        name: impl Into<String>,
        system: Box<dyn System>,
    ) -> Result<Self, SystemRegistrationError> {
        self.register(name, system)?;
        Ok(self)
    }

    pub fn handle(&self, name: &str) -> Option<SystemHandle> {
        self.name_lookup.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.name_lookup.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.systems.iter().map(|system| system.state.name())
    }

    /// Handles only come from this registry, so indexing cannot miss.
    pub(crate) fn slot(&self, handle: SystemHandle) -> &RegisteredSystem {
        &self.systems[handle.index()]
    }

    pub(crate) fn slot_mut(&mut self, handle: SystemHandle) -> &mut RegisteredSystem {
        &mut self.systems[handle.index()]
    }

    pub(crate) fn get(&self, handle: SystemHandle) -> Option<&RegisteredSystem> {
        self.systems.get(handle.index())
    }

    pub(crate) fn get_mut(&mut self, handle: SystemHandle) -> Option<&mut RegisteredSystem> {
        self.systems.get_mut(handle.index())
    }

    pub(crate) fn by_name(&self, name: &str) -> Option<&RegisteredSystem> {
        self.handle(name).and_then(|handle| self.get(handle))
    }

    pub(crate) fn by_name_mut(&mut self, name: &str) -> Option<&mut RegisteredSystem> {
        let handle = self.handle(name)?;
        self.get_mut(handle)
    }
}

impl Default for SystemRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct RegisteredSystem {
    pub(crate) state: SystemState,
    pub(crate) behavior: Box<dyn System>,
    pub(crate) dependencies: Vec<String>,
    pub(crate) active: bool,
}

impl RegisteredSystem {
    pub(crate) fn name(&self) -> &str {
        self.state.name()
    }

    pub(crate) fn depends_on(&self, name: &str) -> bool {
        self.dependencies.iter().any(|dependency| dependency == name)
    }
}

/// `transform`, `sprite-sheet`, `a2`; not `Sprite`, `-x`, `a--b`.
fn is_kebab_case(name: &str) -> bool {
    !name.is_empty()
        && name
            .split('-')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()))
}
