//! Built-in systems
//!
//! Each system lives in its own module and is registered under the name of
//! the component it owns. `bootstrap` turns the `systems` list of an
//! `EngineConfig` into a ready registry.

pub mod bounds;
pub mod color;
pub mod force;
pub mod quadtree;
pub mod sprite;
pub mod transform;
pub mod velocity;

pub use bounds::{Bounds, BoundsMode, BoundsSystem};
pub use color::{Color, ColorSystem};
pub use force::{Force, ForceSystem};
pub use quadtree::{Quadtree, QuadtreeSystem};
pub use sprite::{Sprite, SpriteSystem};
pub use transform::{Rotation, Transform, TransformSystem};
pub use velocity::{Velocity, VelocitySystem};

use crate::config::{ConfigError, EngineConfig};
use crate::ecs::{System, SystemRegistry};
use crate::math::Rect;
use crate::scene::SharedScene;
use tracing::debug;

pub const TRANSFORM: &str = "transform";
pub const VELOCITY: &str = "velocity";
pub const SPRITE: &str = "sprite";
pub const BOUNDS: &str = "bounds";
pub const COLOR: &str = "color";
pub const QUADTREE: &str = "quadtree";
pub const FORCE: &str = "force";

/// Every built-in, dependencies first.
pub const BUILTINS: [&str; 7] = [TRANSFORM, VELOCITY, SPRITE, BOUNDS, COLOR, QUADTREE, FORCE];

/// Instantiate the built-in registered as `name`.
pub fn builtin_system(
    name: &str,
    config: &EngineConfig,
    scene: &SharedScene,
) -> Option<Box<dyn System>> {
    let viewport = scene.borrow().viewport();
    let screen = Rect::from_size(viewport.width, viewport.height);

    let system: Box<dyn System> = match name {
        TRANSFORM => Box::new(TransformSystem),
        VELOCITY => Box::new(VelocitySystem),
        SPRITE => Box::new(SpriteSystem::new(scene.clone())),
        BOUNDS => Box::new(BoundsSystem::new(screen, config.bounds.mode)),
        COLOR => Box::new(ColorSystem),
        QUADTREE => Box::new(QuadtreeSystem::new(
            screen,
            config.quadtree.capacity,
            config.quadtree.max_depth,
        )),
        FORCE => Box::new(ForceSystem::new(config.force)),
        _ => return None,
    };
    Some(system)
}

/// Build a registry holding the configured built-ins, in list order.
pub fn bootstrap(config: &EngineConfig, scene: SharedScene) -> Result<SystemRegistry, ConfigError> {
    let mut registry = SystemRegistry::new();
    for name in &config.systems {
        let system = builtin_system(name, config, &scene).ok_or_else(|| ConfigError::UnknownBuiltin {
            name: name.clone(),
        })?;
        registry.register(name.as_str(), system)?;
    }
    debug!(systems = registry.len(), "registry bootstrapped");
    Ok(registry)
}
