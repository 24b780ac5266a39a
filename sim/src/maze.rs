//! The maze: a pivot-wrapped scene plus the kinematic compound body that
//! mirrors its pose.

use std::path::Path;

use maze_shared::MazePlacement;
use rapier3d::na::{UnitQuaternion, Vector3};
use rapier3d::prelude::{ColliderHandle, RigidBodyBuilder, RigidBodyHandle};

use crate::collision::{collect_shapes, ShapePart};
use crate::error::LoadError;
use crate::math::{euler_xyz_from_quat, isometry, quat_from_euler_xyz, vec3};
use crate::physics::{PhysicsWorld, Released};
use crate::scene::MazeAsset;

struct Loaded {
    asset: MazeAsset,
    parts: Vec<ShapePart>,
    body: RigidBodyHandle,
    colliders: Vec<ColliderHandle>,
}

pub struct MazeEntity {
    loaded: Option<Loaded>,
    position: Vector3<f32>,
    rotation: UnitQuaternion<f32>,
    euler: [f32; 3],
}

impl Default for MazeEntity {
    fn default() -> Self {
        Self {
            loaded: None,
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            euler: [0.0; 3],
        }
    }
}

impl MazeEntity {
    /// Fetch the scene file, then scale, re-center and convert it.
    pub async fn load(
        path: impl AsRef<Path>,
        placement: &MazePlacement,
        world: &mut PhysicsWorld,
    ) -> Result<Self, LoadError> {
        let asset = MazeAsset::load(path, placement.scale, placement.recenter).await?;
        Ok(Self::from_asset(asset, placement, world))
    }

    /// Build the compound body for an already loaded asset.
    pub fn from_asset(asset: MazeAsset, placement: &MazePlacement, world: &mut PhysicsWorld) -> Self {
        let [x, y, z] = placement.rotation;
        let rotation = quat_from_euler_xyz(x, y, z);
        let position = vec3(placement.position);

        let parts = match collect_shapes(asset.root()) {
            Ok(parts) => parts,
            Err(e) => {
                tracing::warn!("Maze scene could not be converted: {}", e);
                Vec::new()
            }
        };

        let body = world.insert_body(
            RigidBodyBuilder::kinematic_position_based().position(isometry(position, rotation)),
        );
        let mut colliders = Vec::with_capacity(parts.len());
        for part in &parts {
            match part.collider() {
                Ok(collider) => colliders.push(world.attach(collider, body)),
                Err(e) => tracing::warn!("Skipping sub-mesh '{}': {}", part.name, e),
            }
        }

        tracing::info!(
            "Maze body built with {} shapes from {} sub-meshes",
            colliders.len(),
            asset.mesh_count()
        );

        Self {
            loaded: Some(Loaded {
                asset,
                parts,
                body,
                colliders,
            }),
            position,
            rotation,
            euler: [x, y, z],
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Set the orientation from XYZ Euler angles and push the resulting pose
    /// to the physics body. Does nothing before load.
    pub fn set_rotation(&mut self, x: f32, y: f32, z: f32, world: &mut PhysicsWorld) {
        let Some(loaded) = &self.loaded else {
            return;
        };
        self.euler = [x, y, z];
        self.rotation = quat_from_euler_xyz(x, y, z);
        if let Some(body) = world.bodies.get_mut(loaded.body) {
            body.set_next_kinematic_position(isometry(self.position, self.rotation));
        }
    }

    /// Euler angles as last set.
    pub fn euler(&self) -> [f32; 3] {
        self.euler
    }

    /// Euler angles recovered from the visual orientation.
    pub fn read_tilt(&self) -> [f32; 3] {
        euler_xyz_from_quat(&self.rotation)
    }

    pub fn rotation(&self) -> UnitQuaternion<f32> {
        self.rotation
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    /// Orientation the physics body will have after the next step.
    pub fn body_rotation(&self, world: &PhysicsWorld) -> Option<UnitQuaternion<f32>> {
        let loaded = self.loaded.as_ref()?;
        world
            .bodies
            .get(loaded.body)
            .map(|b| b.next_position().rotation)
    }

    pub fn body_handle(&self) -> Option<RigidBodyHandle> {
        self.loaded.as_ref().map(|l| l.body)
    }

    pub fn shape_count(&self) -> usize {
        self.loaded.as_ref().map_or(0, |l| l.colliders.len())
    }

    pub fn sub_mesh_count(&self) -> usize {
        self.loaded.as_ref().map_or(0, |l| l.asset.mesh_count())
    }

    /// Converted parts, in maze-body space. Useful for drawing the maze.
    pub fn parts(&self) -> &[ShapePart] {
        match &self.loaded {
            Some(loaded) => &loaded.parts,
            None => &[],
        }
    }

    pub fn unload(&mut self, world: &mut PhysicsWorld) -> Released {
        match self.loaded.take() {
            Some(loaded) => Released {
                bodies: 1,
                colliders: world.remove_body(loaded.body),
            },
            None => Released::default(),
        }
    }
}
