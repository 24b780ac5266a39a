//! Headless level runner.
//!
//! Usage: cargo run --bin maze-sim -- <level.json> [OPTIONS]
//!
//! Options:
//!   --frames N      Frames to simulate at 60 Hz (default: 600)
//!   --tilt X Y      Constant tilt signal in [-1, 1] (default: 0 0)
//!   --config PATH   Simulation tuning overrides (JSON)

use std::path::{Path, PathBuf};

use maze_shared::TiltSignal;
use maze_sim::config::SimConfig;
use maze_sim::driver::Driver;
use maze_sim::input::TiltInput;
use maze_sim::level::{read_catalog, Level};
use tracing_subscriber::EnvFilter;

const FRAME_DT: f32 = 1.0 / 60.0;

struct Args {
    level: PathBuf,
    frames: u32,
    tilt: TiltSignal,
    config: Option<PathBuf>,
}

fn parse_args() -> Option<Args> {
    let args: Vec<String> = std::env::args().collect();
    let mut level = None;
    let mut frames: u32 = 600;
    let mut tilt = TiltSignal::NEUTRAL;
    let mut config = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--frames" => {
                i += 1;
                frames = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(600);
            }
            "--tilt" => {
                let x = args.get(i + 1).and_then(|s| s.parse().ok()).unwrap_or(0.0);
                let y = args.get(i + 2).and_then(|s| s.parse().ok()).unwrap_or(0.0);
                tilt = TiltSignal::new(x, y);
                i += 2;
            }
            "--config" => {
                i += 1;
                config = args.get(i).map(PathBuf::from);
            }
            other if !other.starts_with("--") && level.is_none() => {
                level = Some(PathBuf::from(other));
            }
            other => {
                eprintln!("Ignoring unknown argument {}", other);
            }
        }
        i += 1;
    }

    Some(Args {
        level: level?,
        frames,
        tilt,
        config,
    })
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let Some(args) = parse_args() else {
        eprintln!("Usage: maze-sim <level.json> [--frames N] [--tilt X Y] [--config PATH]");
        std::process::exit(2);
    };

    let sim = match &args.config {
        Some(path) => match SimConfig::load(path).await {
            Ok(sim) => sim,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        },
        None => SimConfig::default(),
    };

    let level_dir = args.level.parent().unwrap_or_else(|| Path::new("."));
    let catalog = read_catalog(level_dir.join("catalog.json"))
        .await
        .unwrap_or_default();

    let mut level = match Level::load(&args.level, sim, &catalog).await {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Failed to load level: {}", e);
            std::process::exit(1);
        }
    };

    let mut input = TiltInput::default();
    input.set_mouse(args.tilt);
    let mut driver = Driver::new();

    let mut frames_run = 0;
    let mut resets = 0;
    let mut substeps = 0;
    let mut won = None;
    for frame in 0..args.frames {
        let report = driver.frame(&mut level, &mut input, FRAME_DT);
        frames_run += 1;
        substeps += report.substeps;
        resets += report.resets.len();
        for event in &report.zone_events {
            tracing::info!(
                "frame {}: zone {} {:?} ({}/{})",
                frame,
                event.zone,
                event.transition,
                report.occupied,
                report.total_zones
            );
        }
        if let Some(signal) = report.won {
            won = Some(signal);
            break;
        }
    }

    println!("=== {} ===", level.id());
    println!("Frames: {} ({} physics steps)", frames_run, substeps);
    println!("Shapes: {} of {} sub-meshes", level.maze.shape_count(), level.maze.sub_mesh_count());
    println!("Zones occupied: {} / {}", level.zones.occupied_count(), level.zones.len());
    println!("Out-of-bounds resets: {}", resets);
    for (i, ball) in level.balls.iter().enumerate() {
        let p = ball.position();
        println!("Ball {}: ({:.3}, {:.3}, {:.3})", i, p.x, p.y, p.z);
    }
    match won {
        Some(signal) => println!(
            "Won! Next level: {}",
            signal.next_level.as_deref().unwrap_or("none")
        ),
        None => println!("Not won"),
    }

    let released = level.unload();
    println!(
        "Released {} bodies, {} colliders",
        released.bodies, released.colliders
    );
}
