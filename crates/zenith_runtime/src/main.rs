//! Zenith Engine Runtime
//!
//! Headless driver: boots the built-in systems against an in-memory scene,
//! scatters a batch of particles and runs a fixed number of frames.
//!
//! ```text
//! zenith [config.json] [frames]
//! ```

use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;
use zenith_core::config::EngineConfig;
use zenith_core::diagnostics;
use zenith_core::ecs::{ComponentManifest, EntityRef, World};
use zenith_core::math::{DeterministicRng, Rect};
use zenith_core::scene::HeadlessScene;
use zenith_core::systems::{self, QuadtreeSystem, BOUNDS, COLOR, FORCE, QUADTREE, SPRITE, TRANSFORM, VELOCITY};
use zenith_core::time::{fixed_step, FrameClock};
use zenith_metrics::FrameTimer;

const DEFAULT_FRAMES: u64 = 600;
const PARTICLES: usize = 256;
const SEED: u64 = 0x5EED;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Zenith Engine v{}", zenith_core::VERSION);

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => EngineConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => EngineConfig::default(),
    };
    let frames = match args.next() {
        Some(frames) => frames
            .parse::<u64>()
            .with_context(|| format!("invalid frame count '{frames}'"))?,
        None => DEFAULT_FRAMES,
    };

    let scene = HeadlessScene::new(config.viewport).shared();
    let registry = systems::bootstrap(&config, scene.clone()).context("building system registry")?;
    let mut world = World::with_registry(registry);
    diagnostics::install();

    let particles = spawn_particles(&mut world, &config).context("spawning particles")?;
    info!(
        particles = particles.len(),
        primitives = scene.borrow().len(),
        systems = ?world.active_systems().collect::<Vec<_>>(),
        "scene ready"
    );

    let step_ms = fixed_step(config.frame.tick_rate_hz).as_secs_f64() * 1000.0;
    let mut clock = FrameClock::new(config.frame.max_delta);
    let mut timer = FrameTimer::new(120);
    let mut timestamp = 0.0;

    for frame in 0..frames {
        // Halfway through, retire every other particle.
        if frame == frames / 2 {
            for particle in particles.iter().step_by(2) {
                particle.destroy();
            }
            info!(pending = world.pending_removals(), "retiring particles");
        }

        timer.begin();
        let tick = clock.tick(timestamp);
        world.update(tick.delta, tick.time);
        timer.end();

        diagnostics::publish(&world.stats());
        timestamp += step_ms;
    }

    let stats = world.stats();
    info!(
        frames = stats.frame,
        live_entities = stats.live_entities,
        primitives = scene.borrow().len(),
        fps = timer.fps(),
        frame_ms = timer.frame_time_ms(),
        "simulation finished"
    );
    if let Some(quadtree) = world.system::<QuadtreeSystem>(QUADTREE) {
        let [top_left, ..] = Rect::from_size(config.viewport.width, config.viewport.height).quadrants();
        info!(indexed = quadtree.tree().len(), top_left = quadtree.query(&top_left).len(), "spatial index");
    }
    for name in world.active_systems() {
        let timing = world.profiler().timing(name);
        info!(system = name, calls = timing.calls, total = ?timing.total, "system timing");
    }

    world.dispose();
    diagnostics::shutdown();
    Ok(())
}

fn spawn_particles(world: &mut World, config: &EngineConfig) -> Result<Vec<EntityRef>> {
    let mut rng = DeterministicRng::new(SEED);
    let (width, height) = (config.viewport.width, config.viewport.height);
    let palette = ["#ff6b6b", "#feca57", "#48dbfb", "#1dd1a1"];
    // Row `i` is how strongly palette color `i` is drawn to each color.
    let attractions: Vec<serde_json::Map<String, serde_json::Value>> = palette
        .iter()
        .map(|_| {
            palette
                .iter()
                .map(|color| (color.to_string(), json!(rng.range(-1.0, 1.0))))
                .collect()
        })
        .collect();

    let mut particles = Vec::with_capacity(PARTICLES);
    for i in 0..PARTICLES {
        let mut manifest = ComponentManifest::new()
            .with(
                TRANSFORM,
                json!({
                    "position": { "x": rng.range(0.0, width), "y": rng.range(0.0, height) },
                    "rotation": rng.range(0.0, std::f32::consts::TAU),
                }),
            )
            .with(
                VELOCITY,
                json!({ "x": rng.range(-120.0, 120.0), "y": rng.range(-120.0, 120.0) }),
            );

        // Optional built-ins join only when the config registered them.
        let extras = [
            (BOUNDS, json!({})),
            (SPRITE, json!({ "texture": "particle.png" })),
            (COLOR, json!({ "color": palette[i % palette.len()] })),
            (
                FORCE,
                json!({
                    "color": palette[i % palette.len()],
                    "attractions": attractions[i % palette.len()],
                }),
            ),
            (QUADTREE, json!({})),
        ];
        for (name, options) in extras {
            if world.registry().contains(name) {
                manifest.push(name, options);
            }
        }

        particles.push(world.create_entity(manifest)?);
    }
    Ok(particles)
}
