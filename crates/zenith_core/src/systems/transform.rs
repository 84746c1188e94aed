//! `transform` - position, rotation and scale
//!
//! Pure data: other systems read and write it, the system itself never
//! updates.

use crate::ecs::{parse_options, Component, ComponentError, EntityRef, System, SystemState};
use glam::Vec3;
use serde::Deserialize;
use serde_json::Value;

/// Rotation is a single angle for 2D scenes or Euler angles for 3D ones.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Rotation {
    Planar(f32),
    Euler(Vec3),
}

impl Rotation {
    /// Angle around the view axis (z for Euler rotations).
    pub fn planar(&self) -> f32 {
        match self {
            Rotation::Planar(angle) => *angle,
            Rotation::Euler(euler) => euler.z,
        }
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Rotation::Planar(0.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Rotation,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Rotation::default(),
            scale: Vec3::ONE,
        }
    }
}

/// `{x, y}` with an optional `z`.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub(crate) struct Point {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl From<Point> for Vec3 {
    fn from(point: Point) -> Self {
        Vec3::new(point.x, point.y, point.z)
    }
}

#[derive(Deserialize)]
struct Scale {
    #[serde(default = "unit")]
    x: f32,
    #[serde(default = "unit")]
    y: f32,
    #[serde(default = "unit")]
    z: f32,
}

fn unit() -> f32 {
    1.0
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RotationOptions {
    Planar(f32),
    Euler(Point),
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct TransformOptions {
    position: Option<Point>,
    rotation: Option<RotationOptions>,
    scale: Option<Scale>,
}

#[derive(Debug, Default)]
pub struct TransformSystem;

impl System for TransformSystem {
    fn init(&mut self, state: &mut SystemState) {
        state.disable_updates();
    }

    fn create_component(
        &mut self,
        options: &Value,
        _entity: &EntityRef,
    ) -> Result<Component, ComponentError> {
        let options: TransformOptions = parse_options(options)?;
        let mut transform = Transform::default();

        if let Some(position) = options.position {
            transform.position = position.into();
        }
        if let Some(rotation) = options.rotation {
            transform.rotation = match rotation {
                RotationOptions::Planar(angle) => Rotation::Planar(angle),
                RotationOptions::Euler(euler) => Rotation::Euler(euler.into()),
            };
        }
        if let Some(scale) = options.scale {
            transform.scale = Vec3::new(scale.x, scale.y, scale.z);
        }

        Ok(Box::new(transform))
    }
}
