//! Entity Component System coordinator.
//!
//! Entities are bags of named components; each component kind is owned by
//! the system registered under the same name. Systems are dormant until an
//! entity needs them and are disposed again once their last entity leaves.
//! `World` ties the pieces together: activation, entity creation, the
//! per-frame update and deferred removal.

mod component;
mod entity;
mod id;
mod system;
mod system_handle;
mod system_registration_error;
mod system_registry;
mod world;

pub use component::{
    parse_options, Component, ComponentError, ComponentManifest, ComponentMap, InvalidManifest,
};
pub use entity::{Entity, EntityId, EntityRef, WeakEntityRef};
pub use id::{IdGenerator, SequentialIds};
pub use system::{AsAny, System, SystemState};
pub use system_handle::SystemHandle;
pub use system_registration_error::SystemRegistrationError;
pub use system_registry::SystemRegistry;
pub use world::{CreateEntityError, FrameStats, RemoveSystemError, World};
