//! `bounds` - keeps positions inside a rectangle
//!
//! `wrap` teleports an entity that leaves one edge to the opposite edge.
//! `clamp` pins it to the edge it crossed and, with `reflect`, turns its
//! velocity back inwards.

use super::transform::Transform;
use super::velocity::Velocity;
use super::{BOUNDS, TRANSFORM, VELOCITY};
use crate::ecs::{parse_options, Component, ComponentError, EntityRef, System};
use crate::math::Rect;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundsMode {
    #[default]
    Wrap,
    Clamp,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub rect: Rect,
    pub mode: BoundsMode,
    pub reflect: bool,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct BoundsOptions {
    top: Option<f32>,
    left: Option<f32>,
    bottom: Option<f32>,
    right: Option<f32>,
    mode: Option<BoundsMode>,
    reflect: bool,
}

/// Edges crossed during one step, as the sign of the inward direction.
#[derive(Default)]
struct Hit {
    x: Option<f32>,
    y: Option<f32>,
}

#[derive(Debug)]
pub struct BoundsSystem {
    default_rect: Rect,
    default_mode: BoundsMode,
}

impl BoundsSystem {
    /// `default_rect` applies to every edge the options leave out, usually the
    /// viewport.
    pub fn new(default_rect: Rect, default_mode: BoundsMode) -> Self {
        Self {
            default_rect,
            default_mode,
        }
    }
}

fn wrap(value: &mut f32, low: f32, high: f32) {
    if *value < low {
        *value = high;
    } else if *value > high {
        *value = low;
    }
}

fn clamp(value: &mut f32, low: f32, high: f32) -> Option<f32> {
    if *value < low {
        *value = low;
        Some(1.0)
    } else if *value > high {
        *value = high;
        Some(-1.0)
    } else {
        None
    }
}

impl System for BoundsSystem {
    fn dependencies(&self) -> &[&'static str] {
        &[TRANSFORM]
    }

    fn create_component(
        &mut self,
        options: &Value,
        _entity: &EntityRef,
    ) -> Result<Component, ComponentError> {
        let options: BoundsOptions = parse_options(options)?;
        let rect = Rect::new(
            options.left.unwrap_or(self.default_rect.left),
            options.top.unwrap_or(self.default_rect.top),
            options.right.unwrap_or(self.default_rect.right),
            options.bottom.unwrap_or(self.default_rect.bottom),
        );
        if rect.width() < 0.0 || rect.height() < 0.0 {
            return Err(ComponentError::rejected(format!(
                "inverted bounds {rect:?}"
            )));
        }

        Ok(Box::new(Bounds {
            rect,
            mode: options.mode.unwrap_or(self.default_mode),
            reflect: options.reflect,
        }))
    }

    fn update_entity(&mut self, entity: &EntityRef, _delta: f32, _time: f64) {
        let mut entity = entity.borrow_mut();
        let Some(bounds) = entity.component::<Bounds>(BOUNDS).copied() else {
            return;
        };
        let Some(transform) = entity.component_mut::<Transform>(TRANSFORM) else {
            return;
        };

        let rect = bounds.rect;
        let position = &mut transform.position;
        let hit = match bounds.mode {
            BoundsMode::Wrap => {
                wrap(&mut position.x, rect.left, rect.right);
                wrap(&mut position.y, rect.top, rect.bottom);
                return;
            }
            BoundsMode::Clamp => Hit {
                x: clamp(&mut position.x, rect.left, rect.right),
                y: clamp(&mut position.y, rect.top, rect.bottom),
            },
        };

        if !bounds.reflect {
            return;
        }
        if let Some(Velocity(velocity)) = entity.component_mut::<Velocity>(VELOCITY) {
            if let Some(inward) = hit.x {
                velocity.x = velocity.x.abs() * inward;
            }
            if let Some(inward) = hit.y {
                velocity.y = velocity.y.abs() * inward;
            }
        }
    }
}
