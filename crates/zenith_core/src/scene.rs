//! Scene-graph boundary used by rendering systems
//!
//! The ECS core never talks to a renderer. Systems that draw (sprite) go
//! through this narrow trait; `HeadlessScene` keeps primitives in memory for
//! tests and the headless runtime.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

pub type PrimitiveId = u64;

/// Canvas size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Straight RGBA, each channel in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if !matches!(digits.len(), 6 | 8) || !digits.is_ascii() {
            return None;
        }
        let channel = |at: usize| {
            u8::from_str_radix(&digits[at..at + 2], 16)
                .ok()
                .map(|v| f32::from(v) / 255.0)
        };
        let alpha = if digits.len() == 8 { channel(6)? } else { 1.0 };
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?, alpha))
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

/// A drawable node as the scene graph sees it.
#[derive(Clone, Debug, PartialEq)]
pub struct Primitive {
    pub texture: String,
    pub position: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
    pub anchor: Vec2,
    pub tint: Rgba,
    pub visible: bool,
}

impl Primitive {
    pub fn new(texture: impl Into<String>) -> Self {
        Self {
            texture: texture.into(),
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
            anchor: Vec2::splat(0.5),
            tint: Rgba::WHITE,
            visible: true,
        }
    }
}

pub trait SceneGraph {
    fn add_primitive(&mut self, primitive: Primitive) -> PrimitiveId;

    fn remove_primitive(&mut self, id: PrimitiveId) -> Option<Primitive>;

    fn primitive(&self, id: PrimitiveId) -> Option<&Primitive>;

    fn primitive_mut(&mut self, id: PrimitiveId) -> Option<&mut Primitive>;

    fn viewport(&self) -> Viewport;
}

/// Scene graph handle shared by the systems that draw.
pub type SharedScene = Rc<RefCell<dyn SceneGraph>>;

/// In-memory scene graph.
#[derive(Debug, Default)]
pub struct HeadlessScene {
    viewport: Viewport,
    next_id: PrimitiveId,
    primitives: BTreeMap<PrimitiveId, Primitive>,
}

impl HeadlessScene {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            next_id: 1,
            primitives: BTreeMap::new(),
        }
    }

    /// Wrap into the shared handle systems take.
    pub fn shared(self) -> Rc<RefCell<HeadlessScene>> {
        Rc::new(RefCell::new(self))
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PrimitiveId, &Primitive)> {
        self.primitives.iter().map(|(id, primitive)| (*id, primitive))
    }
}

impl SceneGraph for HeadlessScene {
    fn add_primitive(&mut self, primitive: Primitive) -> PrimitiveId {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.primitives.insert(id, primitive);
        id
    }

    fn remove_primitive(&mut self, id: PrimitiveId) -> Option<Primitive> {
        self.primitives.remove(&id)
    }

    fn primitive(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.primitives.get(&id)
    }

    fn primitive_mut(&mut self, id: PrimitiveId) -> Option<&mut Primitive> {
        self.primitives.get_mut(&id)
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }
}
