use bevy::prelude::*;

use crate::constants::{
    color_from_hex, Colors, CAMERA_DISTANCE_FACTOR, CAMERA_PITCH, FIXED_HZ,
};

#[derive(SystemSet, Debug, Hash, Eq, PartialEq, Clone)]
pub(crate) enum UpdateSet {
    Input,
    Levels,
    Visuals,
}

#[derive(SystemSet, Debug, Hash, Eq, PartialEq, Clone)]
pub(crate) enum FixedSet {
    Simulate,
}

pub struct CorePlugin;

#[derive(Component)]
pub(crate) struct MainCamera;

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(color_from_hex(Colors::BACKGROUND)))
            .insert_resource(AmbientLight {
                brightness: 350.0,
                ..default()
            })
            .insert_resource(Time::<Fixed>::from_hz(FIXED_HZ))
            .configure_sets(
                Update,
                (UpdateSet::Input, UpdateSet::Levels, UpdateSet::Visuals).chain(),
            )
            .add_systems(Startup, (setup_camera, setup_light));
    }
}

fn setup_camera(mut commands: Commands) {
    commands.spawn((Camera3d::default(), camera_transform(14.0), MainCamera));
}

fn setup_light(mut commands: Commands) {
    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(6.0, 20.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

/// View from the south, elevated, far enough back to keep the whole fence
/// of a level with the given wall distance in frame.
pub(crate) fn camera_transform(wall_distance: f32) -> Transform {
    let distance = wall_distance.max(1.0) * CAMERA_DISTANCE_FACTOR;
    let eye = Vec3::new(
        0.0,
        distance * CAMERA_PITCH.sin(),
        distance * CAMERA_PITCH.cos(),
    );
    Transform::from_translation(eye).looking_at(Vec3::ZERO, Vec3::Y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_looks_at_the_maze_center() {
        let t = camera_transform(14.0);
        let to_center = (-t.translation).normalize();
        assert!(t.forward().dot(to_center) > 0.9999);
        assert!(t.translation.y > 0.0 && t.translation.z > 0.0);
        assert!((t.translation.length() - 28.0).abs() < 1e-3);
    }

    #[test]
    fn tiny_levels_keep_a_minimum_distance() {
        let t = camera_transform(0.0);
        assert!((t.translation.length() - CAMERA_DISTANCE_FACTOR).abs() < 1e-4);
    }
}
