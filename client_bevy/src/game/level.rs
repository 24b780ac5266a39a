//! Level lifetime on the client: requesting loads, swapping the active level,
//! and spawning the meshes that mirror it.

use std::path::PathBuf;

use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::render_resource::PrimitiveTopology;
use maze_sim::collision::ShapePart;
use maze_sim::driver::{Driver, FrameReport};
use maze_sim::input::{Gyroscope, TiltInput, DEFAULT_GYRO_RANGE_DEG};
use maze_sim::level::Level;

use crate::constants::{color_from_hex, Colors, BALL_SEGMENTS, ZONE_ALPHA};
use crate::coord::{to_transform, to_vec3};

use super::core::{camera_transform, MainCamera};
use super::input::TiltControl;
use super::loader::{LevelLoader, LoaderEvent};
use super::UpdateSet;

pub struct LevelPlugin {
    pub levels_dir: PathBuf,
    pub start_level: Option<String>,
    pub sim_config: Option<PathBuf>,
}

/// The level being played, the driver advancing it, and the last frame's report.
#[derive(Resource, Default)]
pub(crate) struct ActiveLevel {
    pub(crate) level: Option<Level>,
    pub(crate) driver: Driver,
    pub(crate) report: FrameReport,
    pub(crate) error: Option<String>,
}

#[derive(Component)]
pub(crate) struct LevelVisual;

#[derive(Component)]
pub(crate) struct MazeVisual;

#[derive(Component)]
pub(crate) struct ZoneVisual {
    pub(crate) index: usize,
}

#[derive(Component)]
pub(crate) struct BallVisual {
    pub(crate) index: usize,
}

impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        // No orientation sensor on desktop; the source still exists so it can
        // be selected and reports itself unavailable.
        let (gyro_handle, gyro) = Gyroscope::channel(false, DEFAULT_GYRO_RANGE_DEG);
        let mut loader = LevelLoader::new(self.levels_dir.clone(), self.sim_config.clone(), gyro_handle);
        loader.load(self.start_level.clone());

        app.insert_resource(loader)
            .insert_resource(TiltControl::new(TiltInput::new(gyro)))
            .init_resource::<ActiveLevel>()
            .add_systems(
                Update,
                (request_level_change, receive_levels)
                    .chain()
                    .in_set(UpdateSet::Levels),
            );
    }
}

/// Enter advances to the next level once won; R restarts the current one.
fn request_level_change(
    keys: Res<ButtonInput<KeyCode>>,
    active: Res<ActiveLevel>,
    mut loader: ResMut<LevelLoader>,
) {
    if loader.is_pending() {
        return;
    }
    let Some(level) = &active.level else {
        return;
    };

    if keys.just_pressed(KeyCode::Enter) && level.win.is_won() {
        if let Some(next) = level.next_level() {
            info!("Advancing to level '{}'", next);
            loader.load(Some(next.to_string()));
        }
    } else if keys.just_pressed(KeyCode::KeyR) {
        info!("Restarting level '{}'", level.id());
        loader.load(Some(level.id().to_string()));
    }
}

#[allow(clippy::too_many_arguments)]
fn receive_levels(
    mut commands: Commands,
    mut loader: ResMut<LevelLoader>,
    mut active: ResMut<ActiveLevel>,
    mut control: ResMut<TiltControl>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    q_visuals: Query<Entity, With<LevelVisual>>,
    mut q_camera: Query<&mut Transform, With<MainCamera>>,
) {
    for event in loader.poll_events() {
        match event {
            LoaderEvent::Loaded(level) => {
                for entity in &q_visuals {
                    commands.entity(entity).despawn();
                }
                if let Some(old) = active.level.take() {
                    old.unload();
                }

                spawn_level_visuals(&mut commands, &mut meshes, &mut materials, &level);
                if let Ok(mut camera) = q_camera.single_mut() {
                    *camera = camera_transform(level.config.boundary.wall_distance);
                }
                control.input.reset();

                info!("Playing level '{}'", level.id());
                active.driver = Driver::new();
                active.report = FrameReport {
                    total_zones: level.zones.len(),
                    ..default()
                };
                active.error = None;
                active.level = Some(*level);
            }
            LoaderEvent::Failed { id, error } => {
                warn!("Level '{}' failed to load: {}", id, error);
                active.error = Some(error);
            }
        }
    }
}

fn spawn_level_visuals(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    level: &Level,
) {
    let maze_material = materials.add(StandardMaterial {
        base_color: color_from_hex(Colors::MAZE),
        perceptual_roughness: 0.8,
        ..default()
    });
    let maze_pose = level
        .maze
        .body_handle()
        .and_then(|h| level.world.bodies.get(h))
        .map(|body| to_transform(body.next_position()))
        .unwrap_or_default();

    commands
        .spawn((maze_pose, Visibility::default(), LevelVisual, MazeVisual))
        .with_children(|parent| {
            for part in level.maze.parts() {
                parent.spawn((
                    Mesh3d(meshes.add(part_mesh(part))),
                    MeshMaterial3d(maze_material.clone()),
                    to_transform(&part.local_pose()),
                    Name::new(part.name.clone()),
                ));
            }
        });

    for (index, zone) in level.zones.iter().enumerate() {
        let size = to_vec3(&zone.half_extents) * 2.0;
        commands.spawn((
            Mesh3d(meshes.add(Cuboid::from_size(size))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: color_from_hex(zone.tint()).with_alpha(ZONE_ALPHA),
                alpha_mode: AlphaMode::Blend,
                unlit: true,
                ..default()
            })),
            to_transform(&zone.pose()),
            LevelVisual,
            ZoneVisual { index },
        ));
    }

    for (index, ball) in level.balls.iter().enumerate() {
        commands.spawn((
            Mesh3d(meshes.add(Sphere::new(ball.radius).mesh().uv(BALL_SEGMENTS, BALL_SEGMENTS / 2))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: color_from_hex(ball.color),
                metallic: 0.3,
                perceptual_roughness: 0.3,
                ..default()
            })),
            Transform::from_translation(to_vec3(&ball.position())),
            LevelVisual,
            BallVisual { index },
        ));
    }
}

/// Render mesh for one collision part, in the part's own frame. Faces are
/// split so every triangle gets a flat normal.
pub(crate) fn part_mesh(part: &ShapePart) -> Mesh {
    let positions: Vec<[f32; 3]> = part
        .triangles
        .iter()
        .flat_map(|tri| tri.iter())
        .filter_map(|&i| part.vertices.get(i as usize))
        .map(|p| [p.x, p.y, p.z])
        .collect();

    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_computed_flat_normals()
}
