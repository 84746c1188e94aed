// diagnostics.rs - Process-wide frame diagnostics
//
// Hosts install the slot once at startup and shut it down on exit. Worlds
// never depend on it; the frame driver publishes `FrameStats` into it so
// tooling can read the latest numbers without a handle to the world.

use crate::ecs::FrameStats;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

/// What the slot has collected since `install`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub frames_published: u64,
    pub peak_entities: usize,
    pub total_removed: usize,
    pub latest: Option<FrameStats>,
}

static SLOT: Lazy<RwLock<Option<Diagnostics>>> = Lazy::new(|| RwLock::new(None));

/// Install an empty slot. Returns `false` if one is already installed.
pub fn install() -> bool {
    let mut slot = SLOT.write().unwrap_or_else(PoisonError::into_inner);
    if slot.is_some() {
        return false;
    }
    *slot = Some(Diagnostics::default());
    debug!("diagnostics installed");
    true
}

pub fn is_installed() -> bool {
    SLOT.read().unwrap_or_else(PoisonError::into_inner).is_some()
}

/// Record one frame. A no-op while nothing is installed.
pub fn publish(stats: &FrameStats) {
    let mut slot = SLOT.write().unwrap_or_else(PoisonError::into_inner);
    let Some(diagnostics) = slot.as_mut() else {
        return;
    };
    diagnostics.frames_published += 1;
    diagnostics.peak_entities = diagnostics.peak_entities.max(stats.live_entities);
    diagnostics.total_removed += stats.removed_last_flush;
    diagnostics.latest = Some(stats.clone());
}

pub fn snapshot() -> Option<Diagnostics> {
    SLOT.read().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Remove the slot, returning what it had collected.
pub fn shutdown() -> Option<Diagnostics> {
    let collected = SLOT.write().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(diagnostics) = &collected {
        info!(
            frames = diagnostics.frames_published,
            peak_entities = diagnostics.peak_entities,
            removed = diagnostics.total_removed,
            "diagnostics shut down"
        );
    }
    collected
}
