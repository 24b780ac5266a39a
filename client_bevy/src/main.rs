mod constants;
mod coord;
mod game;

use std::path::PathBuf;

use bevy::prelude::*;
use bevy::window::{PresentMode, WindowResolution};

use constants::DEFAULT_LEVELS_DIR;
use game::{CorePlugin, HudPlugin, InputPlugin, LevelPlugin, SimPlugin};

fn main() {
    let levels_dir = std::env::var("MAZE_LEVELS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_LEVELS_DIR));
    let start_level = std::env::var("MAZE_LEVEL").ok();
    let sim_config = std::env::var("MAZE_SIM_CONFIG").ok().map(PathBuf::from);

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Tilt Maze".to_string(),
                resolution: WindowResolution::new(960, 720),
                present_mode: PresentMode::AutoVsync,
                resizable: true,
                ..default()
            }),
            ..default()
        }))
        .add_plugins(CorePlugin)
        .add_plugins(LevelPlugin {
            levels_dir,
            start_level,
            sim_config,
        })
        .add_plugins(InputPlugin)
        .add_plugins(SimPlugin)
        .add_plugins(HudPlugin)
        .run();
}
