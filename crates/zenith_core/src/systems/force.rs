//! `force` - pairwise attraction and repulsion between particles
//!
//! Every entity in the system pushes away neighbours that come too close and
//! pulls (or pushes) the rest of its neighbourhood according to an attraction
//! table keyed by the neighbour's color label. The result is written to the
//! entity's velocity after friction.
//!
//! Neighbours are read from the system's own entity list, so an entity
//! destroyed earlier in the frame still takes part until the flush.

use super::transform::Transform;
use super::velocity::Velocity;
use super::{FORCE, TRANSFORM, VELOCITY};
use crate::config::ForceSettings;
use crate::ecs::{parse_options, Component, ComponentError, EntityRef, System};
use glam::Vec2;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Relative distance below which neighbours always repel.
const REPULSION_RANGE: f32 = 0.2;
/// Relative distance at which repulsion would fade out; the attraction curve
/// starts from here.
const REPULSION_FALLOFF: f32 = 0.25;

/// Attraction table plus the label other particles look this one up by.
#[derive(Clone, Debug, PartialEq)]
pub struct Force {
    pub attractions: HashMap<String, f32>,
    pub color: String,
}

#[derive(Deserialize)]
#[serde(default)]
struct ForceOptions {
    attractions: HashMap<String, f32>,
    color: String,
}

impl Default for ForceOptions {
    fn default() -> Self {
        Self {
            attractions: HashMap::new(),
            color: "#ffffff".to_string(),
        }
    }
}

/// Tent function peaking at `x = 0.5`.
fn linear_peak(x: f32) -> f32 {
    if x < 0.5 {
        2.0 * x
    } else {
        2.0 * (1.0 - x)
    }
}

#[derive(Debug, Default)]
pub struct ForceSystem {
    settings: ForceSettings,
}

impl ForceSystem {
    pub fn new(settings: ForceSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ForceSettings {
        &self.settings
    }

    /// Sum of the forces `neighbours` exert on `entity`.
    fn pull_on(&self, entity: &EntityRef, neighbours: &[EntityRef]) -> Vec2 {
        let me = entity.borrow();
        let (Some(transform), Some(force)) = (
            me.component::<Transform>(TRANSFORM),
            me.component::<Force>(FORCE),
        ) else {
            return Vec2::ZERO;
        };

        let radius = self.settings.radius;
        let origin = transform.position.truncate();
        let mut pull = Vec2::ZERO;

        for neighbour in neighbours {
            if neighbour.ptr_eq(entity) {
                continue;
            }
            let neighbour = neighbour.borrow();
            let (Some(other), Some(other_force)) = (
                neighbour.component::<Transform>(TRANSFORM),
                neighbour.component::<Force>(FORCE),
            ) else {
                continue;
            };

            let offset = other.position.truncate() - origin;
            let distance_squared = offset.length_squared();
            if distance_squared == 0.0 || distance_squared > radius * radius {
                continue;
            }

            let distance = distance_squared.sqrt();
            let relative = distance / radius;
            let magnitude = if relative < REPULSION_RANGE {
                -self.settings.repulsion * (1.0 - relative / REPULSION_FALLOFF)
            } else {
                let attraction = force
                    .attractions
                    .get(&other_force.color)
                    .copied()
                    .unwrap_or(0.0);
                attraction * (radius / distance) * 2.0 * linear_peak(relative - REPULSION_FALLOFF)
            };

            pull += offset / distance * magnitude * self.settings.strength;
        }

        pull
    }
}

impl System for ForceSystem {
    fn dependencies(&self) -> &[&'static str] {
        &[TRANSFORM, VELOCITY]
    }

    fn create_component(
        &mut self,
        options: &Value,
        _entity: &EntityRef,
    ) -> Result<Component, ComponentError> {
        let options: ForceOptions = parse_options(options)?;
        Ok(Box::new(Force {
            attractions: options.attractions,
            color: options.color,
        }))
    }

    fn update(&mut self, entities: &[EntityRef], delta: f32, _time: f64) {
        for entity in entities {
            let pull = self.pull_on(entity, entities);

            let mut entity = entity.borrow_mut();
            if let Some(Velocity(velocity)) = entity.component_mut::<Velocity>(VELOCITY) {
                velocity.x = velocity.x * self.settings.friction + pull.x * delta;
                velocity.y = velocity.y * self.settings.friction + pull.y * delta;
            }
        }
    }
}
