//! Nebulite Core - headless frame-loop driver.
//!
//! Usage: `nebulite-core [scene.json] [--frames N] [--config engine.toml]`
//!
//! Loads a scene (a JSON array of entity documents), steps the frame loop
//! a fixed number of times with no input and no camera movement, and
//! prints the final object count. Real embedding applications link
//! against the library crate directly and drive `FrameLoop::step`
//! themselves; this binary exists for quick smoke-testing a ruleset.

use std::panic;
use std::path::PathBuf;

use nebulite_core::document::Document;
use nebulite_core::environment::{Environment, FrameLoop, Layer, TileCoord, TimeKeeper, LAYERS};
use nebulite_core::object::{CommandRegistry, RenderObject};
use nebulite_core::EngineConfig;

struct Args {
    scene: Option<PathBuf>,
    config: PathBuf,
    frames: u32,
}

fn parse_args() -> Args {
    let mut scene = None;
    let mut config = PathBuf::from("engine.toml");
    let mut frames = 1;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--frames" => {
                if let Some(v) = iter.next() {
                    frames = v.parse().unwrap_or(frames);
                }
            }
            "--config" => {
                if let Some(v) = iter.next() {
                    config = PathBuf::from(v);
                }
            }
            other => scene = Some(PathBuf::from(other)),
        }
    }

    Args {
        scene,
        config,
        frames,
    }
}

fn main() -> anyhow::Result<()> {
    panic::set_hook(Box::new(|panic_info| {
        eprintln!("Nebulite Core fatal error:");
        eprintln!("{}", panic_info);
        if let Some(location) = panic_info.location() {
            eprintln!(
                "Location: {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            );
        }
    }));

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    log::info!("Nebulite Core v{}", nebulite_core::VERSION);

    let args = parse_args();
    let config = EngineConfig::load_or_default(&args.config);
    log::debug!("engine config: {:?}", config);

    let mut environment = Environment::new(
        config.tile_size,
        config.cache_eviction_chance,
        config.cache_idle_hits_threshold,
    );

    if let Some(scene_path) = &args.scene {
        let text = std::fs::read_to_string(scene_path)?;
        let docs: Vec<serde_json::Value> = serde_json::from_str(&text)?;
        for value in docs {
            environment.append(Layer::General, RenderObject::new(Document::from_value(value)));
        }
        log::info!("loaded {} objects from {}", environment.object_count(), scene_path.display());
    }

    let clock = TimeKeeper::fixed_step(1.0 / 60.0);
    let mut frame_loop = FrameLoop::new(environment, clock);
    frame_loop.clock.start();

    let registry = CommandRegistry::builder().build();
    let camera = TileCoord { x: 0, y: 0 };

    for frame in 0..args.frames {
        frame_loop.step(&[], camera, &LAYERS, &registry, &[]);
        log::debug!("frame {frame} complete, {} objects live", frame_loop.environment.object_count());
    }

    log::info!(
        "ran {} frame(s), {} objects remain",
        args.frames,
        frame_loop.environment.object_count()
    );

    Ok(())
}
