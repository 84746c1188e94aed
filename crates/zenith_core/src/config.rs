//! Engine configuration
//!
//! Everything has a default, so an empty JSON object (or no file at all) is a
//! working setup.

use crate::ecs::SystemRegistrationError;
use crate::scene::Viewport;
use crate::systems::quadtree::{DEFAULT_MAX_DEPTH, DEFAULT_NODE_CAPACITY};
use crate::systems::{BoundsMode, BUILTINS};
use crate::time::{DEFAULT_MAX_DELTA, DEFAULT_TICK_RATE_HZ};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no built-in system named '{name}'")]
    UnknownBuiltin { name: String },

    #[error(transparent)]
    Registration(#[from] SystemRegistrationError),
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub viewport: Viewport,
    pub frame: FrameSettings,
    pub bounds: BoundsSettings,
    pub quadtree: QuadtreeSettings,
    pub force: ForceSettings,
    /// Built-ins to register, in registration order.
    pub systems: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSettings {
    pub tick_rate_hz: u32,
    /// Seconds.
    pub max_delta: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsSettings {
    pub mode: BoundsMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadtreeSettings {
    pub capacity: usize,
    pub max_depth: usize,
}

/// Tuning for the `force` system. Distances are in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceSettings {
    /// Scales every pull before it reaches velocity.
    pub strength: f32,
    pub repulsion: f32,
    /// Neighbours further away are ignored.
    pub radius: f32,
    /// Fraction of velocity kept each update.
    pub friction: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            frame: FrameSettings::default(),
            bounds: BoundsSettings::default(),
            quadtree: QuadtreeSettings::default(),
            force: ForceSettings::default(),
            systems: BUILTINS.iter().map(|name| name.to_string()).collect(),
        }
    }
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            max_delta: DEFAULT_MAX_DELTA,
        }
    }
}

impl Default for QuadtreeSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_NODE_CAPACITY,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Default for ForceSettings {
    fn default() -> Self {
        Self {
            strength: 100.0,
            repulsion: 1.5,
            radius: 120.0,
            friction: 0.75,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_the_default() {
        assert_eq!(EngineConfig::from_json_str("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{
                "viewport": { "width": 640, "height": 480 },
                "frame": { "tick_rate_hz": 30 },
                "bounds": { "mode": "clamp" },
                "force": { "radius": 60 },
                "systems": ["transform", "velocity"]
            }"#,
        )
        .unwrap();

        assert_eq!(config.viewport, Viewport { width: 640.0, height: 480.0 });
        assert_eq!(config.frame.tick_rate_hz, 30);
        assert_eq!(config.frame.max_delta, DEFAULT_MAX_DELTA);
        assert_eq!(config.bounds.mode, BoundsMode::Clamp);
        assert_eq!(config.quadtree, QuadtreeSettings::default());
        assert_eq!(config.force.radius, 60.0);
        assert_eq!(config.force.friction, ForceSettings::default().friction);
        assert_eq!(config.systems, ["transform", "velocity"]);
    }

    #[test]
    fn malformed_json_and_missing_files_are_reported() {
        assert!(matches!(
            EngineConfig::from_json_str("{ \"frame\": 3 }"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EngineConfig::load("/definitely/not/here/zenith.json"),
            Err(ConfigError::Io { .. })
        ));
    }
}
