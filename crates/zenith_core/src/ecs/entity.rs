//! Entities and shared entity handles
//!
//! An entity is an identity plus the components its systems created for it.
//! Every system that owns one of those components keeps a handle to the same
//! entity, so handles are reference counted (`EntityRef`) and borrowed on
//! access. Everything here is single-threaded by construction.

use crate::ecs::component::{Component, ComponentMap};
use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

/// Identifier handed out by the world's id generator.
pub type EntityId = u64;

type DestroyObserver = Box<dyn FnOnce(&EntityRef)>;

/// Identity and component bag. No behavior of its own.
pub struct Entity {
    id: Option<EntityId>,
    active: bool,
    destroyed: bool,
    components: ComponentMap,
    observers: Vec<DestroyObserver>,
}

impl Entity {
    fn new() -> Self {
        Self {
            id: None,
            active: false,
            destroyed: false,
            components: ComponentMap::new(),
            observers: Vec::new(),
        }
    }

    /// Assign identity and reset the lifecycle flags.
    pub(crate) fn setup(&mut self, id: EntityId) {
        self.id = Some(id);
        self.active = true;
        self.destroyed = false;
    }

    /// Install the component map built during creation.
    pub(crate) fn set_components(&mut self, components: ComponentMap) {
        self.components = components;
    }

    pub(crate) fn take_component(&mut self, name: &str) -> Option<Component> {
        self.components.remove(name)
    }

    /// `None` until the world finished creating the entity.
    #[inline]
    pub fn id(&self) -> Option<EntityId> {
        self.id
    }

    /// Host-controlled flag; the world itself never reads it.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    #[inline]
    pub fn has_component(&self, name: &str) -> bool {
        self.components.contains(name)
    }

    /// Typed read access to a component. `None` if the entity does not carry
    /// `name` or the data is not a `T`.
    pub fn component<T: Any>(&self, name: &str) -> Option<&T> {
        self.components.get(name)?.downcast_ref::<T>()
    }

    pub fn component_mut<T: Any>(&mut self, name: &str) -> Option<&mut T> {
        self.components.get_mut(name)?.downcast_mut::<T>()
    }

    /// Component names in the order they were requested.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.names()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("active", &self.active)
            .field("destroyed", &self.destroyed)
            .field("components", &self.components.names().collect::<Vec<_>>())
            .finish()
    }
}

/// Shared handle to an entity.
///
/// Equality is identity: two handles are equal when they point at the same
/// entity.
#[derive(Clone)]
pub struct EntityRef(Rc<RefCell<Entity>>);

impl EntityRef {
    pub(crate) fn new() -> Self {
        Self(Rc::new(RefCell::new(Entity::new())))
    }

    /// Borrow the entity.
    ///
    /// # Panics
    /// Panics if the entity is currently mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, Entity> {
        self.0.borrow()
    }

    /// Mutably borrow the entity.
    ///
    /// # Panics
    /// Panics if the entity is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, Entity> {
        self.0.borrow_mut()
    }

    pub fn id(&self) -> Option<EntityId> {
        self.0.borrow().id
    }

    pub fn has_component(&self, name: &str) -> bool {
        self.0.borrow().has_component(name)
    }

    pub fn is_destroyed(&self) -> bool {
        self.0.borrow().destroyed
    }

    /// Mark the entity destroyed and notify its observers once.
    ///
    /// The entity is not detached from its systems here; the world removes it
    /// at the end of the current frame. Repeated calls do nothing.
    ///
    /// # Panics
    /// Panics if the entity is borrowed at the time of the call, so a system
    /// must release its own borrow before destroying the entity it updates.
    pub fn destroy(&self) {
        let observers = {
            let mut entity = self.0.borrow_mut();
            if entity.destroyed {
                return;
            }
            entity.destroyed = true;
            std::mem::take(&mut entity.observers)
        };

        for observer in observers {
            observer(self);
        }
    }

    /// Register a one-shot observer fired by `destroy`.
    pub fn on_destroy<F>(&self, observer: F)
    where
        F: FnOnce(&EntityRef) + 'static,
    {
        self.0.borrow_mut().observers.push(Box::new(observer));
    }

    pub fn downgrade(&self) -> WeakEntityRef {
        WeakEntityRef(Rc::downgrade(&self.0))
    }

    #[inline]
    pub fn ptr_eq(&self, other: &EntityRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for EntityRef {}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(entity) => fmt::Debug::fmt(&*entity, f),
            Err(_) => f.write_str("Entity(<borrowed>)"),
        }
    }
}

/// Non-owning back-reference, e.g. for components that need to reach their
/// entity after creation.
#[derive(Clone, Debug, Default)]
pub struct WeakEntityRef(Weak<RefCell<Entity>>);

impl WeakEntityRef {
    pub fn upgrade(&self) -> Option<EntityRef> {
        self.0.upgrade().map(EntityRef)
    }
}
