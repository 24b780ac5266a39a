//! Runs the core driver on the fixed schedule and mirrors its poses.

use bevy::prelude::*;

use crate::constants::{color_from_hex, ZONE_ALPHA};
use crate::coord::{to_quat, to_transform, to_vec3};

use super::input::TiltControl;
use super::level::{ActiveLevel, BallVisual, MazeVisual, ZoneVisual};
use super::{FixedSet, UpdateSet};

pub struct SimPlugin;

/// Raised once when the active level is won.
#[derive(Message, Clone, Debug)]
pub(crate) struct LevelWonMessage {
    pub(crate) level: String,
    pub(crate) next_level: Option<String>,
}

impl Plugin for SimPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<LevelWonMessage>()
            .configure_sets(FixedUpdate, FixedSet::Simulate)
            .add_systems(FixedUpdate, step_level.in_set(FixedSet::Simulate))
            .add_systems(Update, toggle_pause.in_set(UpdateSet::Input))
            .add_systems(
                Update,
                (sync_maze, sync_zones, sync_balls, log_wins).in_set(UpdateSet::Visuals),
            );
    }
}

fn toggle_pause(keys: Res<ButtonInput<KeyCode>>, mut active: ResMut<ActiveLevel>) {
    if keys.just_pressed(KeyCode::KeyP) {
        let paused = !active.driver.is_paused();
        active.driver.set_paused(paused);
    }
}

fn step_level(
    time: Res<Time>,
    mut active: ResMut<ActiveLevel>,
    mut control: ResMut<TiltControl>,
    mut won_writer: MessageWriter<LevelWonMessage>,
) {
    let ActiveLevel {
        level,
        driver,
        report,
        ..
    } = &mut *active;
    let Some(level) = level.as_mut() else {
        return;
    };

    let frame = driver.frame(level, &mut control.input, time.delta_secs());
    if let Some(won) = &frame.won {
        won_writer.write(LevelWonMessage {
            level: level.id().to_string(),
            next_level: won.next_level.clone(),
        });
    }

    // Keep transitions from earlier ticks until the visuals have seen them.
    let mut zone_events = std::mem::take(&mut report.zone_events);
    zone_events.extend(frame.zone_events.iter().copied());
    *report = frame;
    report.zone_events = zone_events;
}

fn sync_maze(active: Res<ActiveLevel>, mut q_maze: Query<&mut Transform, With<MazeVisual>>) {
    let Some(level) = &active.level else {
        return;
    };
    let Some(body) = level.maze.body_handle().and_then(|h| level.world.bodies.get(h)) else {
        return;
    };
    for mut transform in &mut q_maze {
        *transform = to_transform(body.next_position());
    }
}

fn sync_zones(
    mut active: ResMut<ActiveLevel>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut q_zones: Query<(&ZoneVisual, &mut Transform, &MeshMaterial3d<StandardMaterial>)>,
) {
    let events = std::mem::take(&mut active.report.zone_events);
    let Some(level) = &active.level else {
        return;
    };
    let zones: Vec<_> = level.zones.iter().collect();

    for (visual, mut transform, material) in &mut q_zones {
        let Some(zone) = zones.get(visual.index) else {
            continue;
        };
        *transform = to_transform(&zone.pose());

        if events.iter().any(|e| e.zone == visual.index) {
            if let Some(mat) = materials.get_mut(&material.0) {
                mat.base_color = color_from_hex(zone.tint()).with_alpha(ZONE_ALPHA);
            }
        }
    }
}

fn sync_balls(active: Res<ActiveLevel>, mut q_balls: Query<(&BallVisual, &mut Transform)>) {
    let Some(level) = &active.level else {
        return;
    };
    for (visual, mut transform) in &mut q_balls {
        if let Some(ball) = level.balls.get(visual.index) {
            transform.translation = to_vec3(&ball.position());
            transform.rotation = to_quat(&ball.rotation());
        }
    }
}

fn log_wins(mut reader: MessageReader<LevelWonMessage>) {
    for msg in reader.read() {
        match &msg.next_level {
            Some(next) => info!("Level '{}' won, next up '{}'", msg.level, next),
            None => info!("Level '{}' won, no levels left", msg.level),
        }
    }
}
