//! Headless demo: stream chunks around a drifting observer and report
//! simulation metrics.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use lode::{World, WorldConfig};
use lode_blocks::BlockRegistry;
use lode_geom::Vec3;
use lode_structures::TemplateRegistry;

#[derive(Parser, Debug)]
#[command(name = "lode", about = "streaming voxel world simulation core")]
struct Args {
    /// TOML config file; missing keys fall back to defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the world seed (0 rolls a random one).
    #[arg(long)]
    seed: Option<u32>,
    /// Override the activation radius, in blocks.
    #[arg(long)]
    radius: Option<f32>,
    /// Override the save directory.
    #[arg(long)]
    save_dir: Option<PathBuf>,
    /// Simulation steps to run.
    #[arg(long, default_value_t = 600)]
    steps: u32,
    /// Observer drift speed in blocks per second.
    #[arg(long, default_value_t = 4.0)]
    speed: f32,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut cfg = match args.config.as_ref().map(WorldConfig::load_from_path) {
        Some(Ok(cfg)) => cfg,
        Some(Err(err)) => {
            log::error!("failed to load config: {err}");
            std::process::exit(1);
        }
        None => WorldConfig::default(),
    };
    if let Some(seed) = args.seed {
        cfg.world_seed = seed;
    }
    if let Some(radius) = args.radius {
        cfg.activation_radius = radius;
    }
    if let Some(dir) = args.save_dir {
        cfg.save_root = dir;
    }

    let reg = Arc::new(BlockRegistry::builtin());
    let templates = Arc::new(TemplateRegistry::builtin(&reg));
    let mut world = World::new(&cfg, reg, templates);

    let dt = 1.0 / 60.0;
    let mut observer = Vec3::new(8.0, 8.0, 90.0);
    for step in 0..args.steps {
        observer += Vec3::EAST * (args.speed * dt);
        world.step(observer, dt);
        if step % 60 == 0 {
            let m = world.metrics();
            log::info!(
                "step {step}: {} active, {} pending, {} vertices, {} lit blocks, {} us",
                m.active_chunks,
                m.pending_chunks,
                m.rendered_vertices,
                m.lighting_blocks,
                m.step_micros
            );
        }
        std::thread::sleep(Duration::from_secs_f32(dt));
    }

    let sky = world.sky_state();
    let m = world.metrics();
    log::info!(
        "done: {} active chunks, {} vertices, time of day {:.3}",
        m.active_chunks,
        m.rendered_vertices,
        sky.time_of_day
    );
}
