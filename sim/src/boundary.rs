//! Outer fence: a ground plane and four walls around the world origin.
//!
//! The planes rotate with the maze tilt but never translate with the maze
//! position. Each plane's local +Y is its normal and faces the play area.

use std::f32::consts::FRAC_PI_2;

use maze_shared::BoundarySpec;
use rapier3d::na::{Isometry3, UnitQuaternion, Vector3};
use rapier3d::prelude::{ColliderBuilder, RigidBodyBuilder, RigidBodyHandle};

use crate::math::rotate_about_origin;
use crate::physics::{PhysicsWorld, Released};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneKind {
    Ground,
    North,
    South,
    East,
    West,
}

#[derive(Debug, Clone)]
pub struct BoundaryPlane {
    pub kind: PlaneKind,
    pub reference_position: Vector3<f32>,
    pub reference_rotation: UnitQuaternion<f32>,
    /// Half width, half height and half thickness for debug drawing.
    pub extents: [f32; 3],
    body: RigidBodyHandle,
    live: Isometry3<f32>,
}

impl BoundaryPlane {
    pub fn pose(&self) -> Isometry3<f32> {
        self.live
    }

    pub fn normal(&self) -> Vector3<f32> {
        self.live.rotation * Vector3::y()
    }

    pub fn body_handle(&self) -> RigidBodyHandle {
        self.body
    }
}

pub struct Boundary {
    planes: Vec<BoundaryPlane>,
}

fn reference_poses(spec: &BoundarySpec) -> [(PlaneKind, Vector3<f32>, UnitQuaternion<f32>); 5] {
    let d = spec.wall_distance;
    let wall_y = spec.ground_height + spec.wall_height * 0.5;
    let about_x = |angle| UnitQuaternion::from_axis_angle(&Vector3::x_axis(), angle);
    let about_z = |angle| UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle);
    [
        (
            PlaneKind::Ground,
            Vector3::new(0.0, spec.ground_height, 0.0),
            UnitQuaternion::identity(),
        ),
        (PlaneKind::North, Vector3::new(0.0, wall_y, -d), about_x(FRAC_PI_2)),
        (PlaneKind::South, Vector3::new(0.0, wall_y, d), about_x(-FRAC_PI_2)),
        (PlaneKind::East, Vector3::new(d, wall_y, 0.0), about_z(FRAC_PI_2)),
        (PlaneKind::West, Vector3::new(-d, wall_y, 0.0), about_z(-FRAC_PI_2)),
    ]
}

impl Boundary {
    pub fn create(spec: &BoundarySpec, world: &mut PhysicsWorld) -> Self {
        let half_t = spec.thickness * 0.5;
        let planes = reference_poses(spec)
            .into_iter()
            .map(|(kind, reference_position, reference_rotation)| {
                let live = rotate_about_origin(
                    &UnitQuaternion::identity(),
                    &reference_position,
                    &reference_rotation,
                );
                let body = world.insert_body(RigidBodyBuilder::kinematic_position_based().position(live));
                world.attach(ColliderBuilder::halfspace(Vector3::y_axis()), body);
                let extents = match kind {
                    PlaneKind::Ground => [spec.wall_distance, spec.wall_distance, half_t],
                    _ => [spec.wall_distance, spec.wall_height * 0.5, half_t],
                };
                BoundaryPlane {
                    kind,
                    reference_position,
                    reference_rotation,
                    extents,
                    body,
                    live,
                }
            })
            .collect();
        Self { planes }
    }

    /// Re-derive every plane pose from the maze orientation.
    pub fn sync(&mut self, maze_rotation: &UnitQuaternion<f32>, world: &mut PhysicsWorld) {
        for plane in &mut self.planes {
            plane.live = rotate_about_origin(
                maze_rotation,
                &plane.reference_position,
                &plane.reference_rotation,
            );
            if let Some(body) = world.bodies.get_mut(plane.body) {
                body.set_next_kinematic_position(plane.live);
            }
        }
    }

    pub fn planes(&self) -> &[BoundaryPlane] {
        &self.planes
    }

    pub fn plane(&self, kind: PlaneKind) -> Option<&BoundaryPlane> {
        self.planes.iter().find(|p| p.kind == kind)
    }

    pub fn remove(self, world: &mut PhysicsWorld) -> Released {
        let mut released = Released::default();
        for plane in self.planes {
            released += Released {
                bodies: 1,
                colliders: world.remove_body(plane.body),
            };
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::math::quat_from_euler_xyz;

    fn spec() -> BoundarySpec {
        BoundarySpec {
            wall_distance: 14.0,
            wall_height: 6.0,
            ground_height: 0.0,
            thickness: 1.0,
        }
    }

    fn setup() -> (PhysicsWorld, Boundary) {
        let mut world = PhysicsWorld::new(&SimConfig::default());
        let boundary = Boundary::create(&spec(), &mut world);
        (world, boundary)
    }

    #[test]
    fn creates_ground_and_four_walls() {
        let (world, boundary) = setup();
        assert_eq!(boundary.planes().len(), 5);
        assert_eq!(world.body_count(), 5);
        assert_eq!(world.collider_count(), 5);
    }

    #[test]
    fn normals_face_inward() {
        let (_, boundary) = setup();
        for plane in boundary.planes() {
            let n = plane.normal();
            match plane.kind {
                PlaneKind::Ground => assert!((n - Vector3::y()).norm() < 1e-6),
                _ => {
                    // Pointing from the wall back toward the vertical axis.
                    let outward = Vector3::new(plane.reference_position.x, 0.0, plane.reference_position.z).normalize();
                    assert!((n.dot(&outward) + 1.0).abs() < 1e-6, "{:?}: {n:?}", plane.kind);
                }
            }
        }
    }

    #[test]
    fn tilt_preserves_distance_from_origin() {
        let (mut world, mut boundary) = setup();
        for (x, y, z) in [(0.3, 0.0, -0.3), (-0.1, 1.0, 0.2), (0.35, -2.0, 0.35)] {
            boundary.sync(&quat_from_euler_xyz(x, y, z), &mut world);
            for plane in boundary.planes() {
                let live = plane.pose().translation.vector.norm();
                assert!((live - plane.reference_position.norm()).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn sync_composes_maze_before_reference() {
        let (mut world, mut boundary) = setup();
        let maze = quat_from_euler_xyz(0.3, 0.0, 0.0);
        boundary.sync(&maze, &mut world);
        let north = boundary.plane(PlaneKind::North).unwrap();
        let expected = maze * north.reference_rotation;
        assert!(north.pose().rotation.angle_to(&expected) < 1e-5);
        let expected_normal = maze * Vector3::z();
        assert!((north.normal() - expected_normal).norm() < 1e-5);
    }

    #[test]
    fn sync_moves_kinematic_bodies() {
        let (mut world, mut boundary) = setup();
        let maze = quat_from_euler_xyz(0.0, 0.0, 0.2);
        boundary.sync(&maze, &mut world);
        for plane in boundary.planes() {
            let next = world.bodies[plane.body_handle()].next_position();
            assert!(next.rotation.angle_to(&plane.pose().rotation) < 1e-6);
        }
    }

    #[test]
    fn remove_releases_all_planes() {
        let (mut world, boundary) = setup();
        let released = boundary.remove(&mut world);
        assert_eq!(released, Released { bodies: 5, colliders: 5 });
        assert_eq!(world.body_count(), 0);
    }
}
