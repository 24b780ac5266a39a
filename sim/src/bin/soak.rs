//! Randomized tilt soak test.
//!
//! Drives every level in a catalog with seeded random tilt input and checks
//! that balls stay near the speed clamp after stepping and how often they escape.
//!
//! Usage: cargo run --bin soak -- [OPTIONS]
//!
//! Options:
//!   --levels DIR   Directory holding catalog.json and <id>.json files (default: assets/levels)
//!   --frames N     Frames per level at 60 Hz (default: 3600)
//!   --seed S       RNG seed (default: 42)

use std::path::PathBuf;

use maze_shared::{LevelCatalog, TiltSignal};
use maze_sim::config::SimConfig;
use maze_sim::driver::Driver;
use maze_sim::input::{InputSource, TiltInput};
use maze_sim::level::{read_catalog, Level};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

const FRAME_DT: f32 = 1.0 / 60.0;
/// Frames between new random stick positions.
const HOLD_FRAMES: u32 = 30;

#[derive(Default)]
struct LevelStats {
    frames: u32,
    resets: usize,
    max_speed: f32,
    won_at: Option<u32>,
}

fn soak_level(level: &mut Level, frames: u32, rng: &mut ChaCha8Rng) -> LevelStats {
    let mut input = TiltInput::default();
    input.set_source(InputSource::Joystick);
    let mut driver = Driver::new();
    let mut stats = LevelStats::default();

    for frame in 0..frames {
        if frame % HOLD_FRAMES == 0 {
            input.set_joystick(TiltSignal::new(rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0..=1.0)));
        }
        let report = driver.frame(level, &mut input, FRAME_DT);
        stats.frames += 1;
        stats.resets += report.resets.len();
        stats.max_speed = stats.max_speed.max(report.max_step_speed);
        if report.won.is_some() {
            stats.won_at = Some(frame);
            break;
        }
    }
    stats
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut levels_dir = PathBuf::from("assets/levels");
    let mut frames: u32 = 3600;
    let mut seed: u64 = 42;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--levels" => {
                i += 1;
                levels_dir = args.get(i).map(PathBuf::from).unwrap_or(levels_dir);
            }
            "--frames" => {
                i += 1;
                frames = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(3600);
            }
            "--seed" => {
                i += 1;
                seed = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(42);
            }
            _ => {}
        }
        i += 1;
    }

    let catalog: LevelCatalog = match read_catalog(levels_dir.join("catalog.json")).await {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let sim = SimConfig::default();
    // clamp plus what gravity can add over one frame's sub-steps
    let speed_limit = sim.max_ball_speed + sim.gravity.abs() * sim.fixed_dt * sim.max_substeps as f32 + 1e-3;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut failures = 0;

    println!("Soaking {} levels, {} frames each, seed {}", catalog.levels.len(), frames, seed);
    for id in &catalog.levels {
        let path = levels_dir.join(format!("{id}.json"));
        let mut level = match Level::load(&path, sim.clone(), &catalog).await {
            Ok(level) => level,
            Err(e) => {
                eprintln!("{}: {}", id, e);
                failures += 1;
                continue;
            }
        };

        let stats = soak_level(&mut level, frames, &mut rng);
        let over_limit = stats.max_speed > speed_limit;
        if over_limit {
            failures += 1;
        }
        println!(
            "{:<16} frames={:<6} resets={:<4} max_speed={:.3}{} {}",
            id,
            stats.frames,
            stats.resets,
            stats.max_speed,
            if over_limit { " (OVER LIMIT)" } else { "" },
            stats
                .won_at
                .map(|f| format!("won at frame {f}"))
                .unwrap_or_default()
        );
        level.unload();
    }

    if failures > 0 {
        eprintln!("{} level(s) failed", failures);
        std::process::exit(1);
    }
}
