//! `velocity` - integrates position from a linear velocity

use super::transform::{Point, Transform};
use super::{TRANSFORM, VELOCITY};
use crate::ecs::{parse_options, Component, ComponentError, EntityRef, System};
use glam::Vec3;
use serde_json::Value;

/// Units per second.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Velocity(pub Vec3);

#[derive(Debug, Default)]
pub struct VelocitySystem;

impl System for VelocitySystem {
    fn dependencies(&self) -> &[&'static str] {
        &[TRANSFORM]
    }

    fn create_component(
        &mut self,
        options: &Value,
        _entity: &EntityRef,
    ) -> Result<Component, ComponentError> {
        let velocity: Point = parse_options(options)?;
        Ok(Box::new(Velocity(velocity.into())))
    }

    fn update_entity(&mut self, entity: &EntityRef, delta: f32, _time: f64) {
        let mut entity = entity.borrow_mut();
        let Some(Velocity(velocity)) = entity.component::<Velocity>(VELOCITY).copied() else {
            return;
        };
        let Some(transform) = entity.component_mut::<Transform>(TRANSFORM) else {
            return;
        };

        let position = &mut transform.position;
        position.x += velocity.x * delta;
        position.y += velocity.y * delta;

        // A flat position means a 2D entity; leave z alone.
        if position.z != 0.0 {
            position.z += velocity.z * delta;
        }
    }
}
