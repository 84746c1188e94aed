//! `sprite` - mirrors an entity's transform onto a scene-graph primitive

use super::color::Color;
use super::transform::Transform;
use super::{COLOR, SPRITE, TRANSFORM};
use crate::ecs::{parse_options, Component, ComponentError, EntityRef, System};
use crate::scene::{Primitive, PrimitiveId, Rgba, SharedScene};
use glam::Vec2;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Handle to the primitive drawn for an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sprite {
    pub primitive: PrimitiveId,
    color_version: Option<u64>,
}

#[derive(Deserialize)]
#[serde(default)]
struct SpriteOptions {
    texture: String,
    anchor: Option<[f32; 2]>,
    tint: Option<String>,
    visible: bool,
}

impl Default for SpriteOptions {
    fn default() -> Self {
        Self {
            texture: String::new(),
            anchor: None,
            tint: None,
            visible: true,
        }
    }
}

pub struct SpriteSystem {
    scene: SharedScene,
}

impl SpriteSystem {
    pub fn new(scene: SharedScene) -> Self {
        Self { scene }
    }

    /// Copy transform (and color, when it changed) onto the primitive.
    fn sync(&self, entity: &EntityRef) {
        let mut entity = entity.borrow_mut();
        let Some(transform) = entity.component::<Transform>(TRANSFORM).copied() else {
            return;
        };
        let color = entity
            .component::<Color>(COLOR)
            .map(|color| (*color.get(), color.version()));
        let Some(sprite) = entity.component_mut::<Sprite>(SPRITE) else {
            return;
        };

        let mut scene = self.scene.borrow_mut();
        let Some(primitive) = scene.primitive_mut(sprite.primitive) else {
            return;
        };

        primitive.position = transform.position.truncate();
        primitive.rotation = transform.rotation.planar();
        primitive.scale = transform.scale.truncate();

        if let Some((tint, version)) = color {
            if sprite.color_version != Some(version) {
                primitive.tint = tint;
                sprite.color_version = Some(version);
            }
        }
    }
}

impl System for SpriteSystem {
    fn dependencies(&self) -> &[&'static str] {
        &[TRANSFORM]
    }

    fn create_component(
        &mut self,
        options: &Value,
        _entity: &EntityRef,
    ) -> Result<Component, ComponentError> {
        let options: SpriteOptions = parse_options(options)?;

        let mut primitive = Primitive::new(options.texture);
        primitive.visible = options.visible;
        if let Some([x, y]) = options.anchor {
            primitive.anchor = Vec2::new(x, y);
        }
        if let Some(tint) = options.tint {
            primitive.tint = Rgba::from_hex(&tint)
                .ok_or_else(|| ComponentError::rejected(format!("invalid tint '{tint}'")))?;
        }

        let primitive = self.scene.borrow_mut().add_primitive(primitive);
        Ok(Box::new(Sprite {
            primitive,
            color_version: None,
        }))
    }

    /// Sibling components exist only now, so the first placement happens here
    /// rather than at creation.
    fn setup_component(&mut self, entity: &EntityRef) {
        self.sync(entity);
    }

    fn destroy_component(&mut self, component: Component, entity: &EntityRef) {
        if let Ok(sprite) = component.downcast::<Sprite>() {
            if self.scene.borrow_mut().remove_primitive(sprite.primitive).is_none() {
                debug!(entity = ?entity.id(), primitive = sprite.primitive, "sprite primitive already gone");
            }
        }
    }

    fn update_entity(&mut self, entity: &EntityRef, _delta: f32, _time: f64) {
        self.sync(entity);
    }
}
