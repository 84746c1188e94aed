//! Zenith Engine Core
//!
//! Contains the simulation side of the engine:
//! - Entity Component System coordinator (ECS)
//! - Built-in systems (transform, velocity, sprite, bounds, color, quadtree)
//! - Scene-graph boundary and a headless scene
//! - Engine configuration and process-wide diagnostics
//! - Frame clock and math

pub mod config;
pub mod diagnostics;
pub mod ecs;
pub mod math;
pub mod observable;
pub mod scene;
pub mod systems;
pub mod time;

pub use glam;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
