//! Target zones: sensor boxes that ride with the maze.

use maze_shared::ZoneSpec;
use rapier3d::na::{Isometry3, Point3, UnitQuaternion, Vector3};
use rapier3d::parry::bounding_volume::{Aabb, BoundingVolume};
use rapier3d::prelude::{ColliderBuilder, RigidBodyBuilder, RigidBodyHandle};

use crate::math::{rotate_about_origin, vec3};
use crate::physics::{PhysicsWorld, Released};

/// A ball as seen by the overlap test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallProbe {
    pub center: Vector3<f32>,
    pub radius: f32,
}

impl BallProbe {
    pub fn aabb(&self) -> Aabb {
        Aabb::from_half_extents(Point3::from(self.center), Vector3::repeat(self.radius))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneTransition {
    Entered,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneEvent {
    pub zone: usize,
    pub transition: ZoneTransition,
}

#[derive(Debug, Clone)]
pub struct TriggerZone {
    pub reference_position: Vector3<f32>,
    pub half_extents: Vector3<f32>,
    pub color: u32,
    pub occupied_color: u32,
    occupied: bool,
    tint: u32,
    body: RigidBodyHandle,
    live: Isometry3<f32>,
}

impl TriggerZone {
    pub fn occupied(&self) -> bool {
        self.occupied
    }

    /// Current visual color; changes only on occupancy edges.
    pub fn tint(&self) -> u32 {
        self.tint
    }

    pub fn pose(&self) -> Isometry3<f32> {
        self.live
    }

    pub fn center(&self) -> Vector3<f32> {
        self.live.translation.vector
    }

    /// Axis-aligned box around the live center, ignoring the zone's rotation.
    pub fn aabb(&self) -> Aabb {
        Aabb::from_half_extents(Point3::from(self.center()), self.half_extents)
    }

    pub fn overlaps(&self, ball: &BallProbe) -> bool {
        self.aabb().intersects(&ball.aabb())
    }

    pub fn body_handle(&self) -> RigidBodyHandle {
        self.body
    }
}

#[derive(Default)]
pub struct Zones {
    zones: Vec<TriggerZone>,
}

impl Zones {
    pub fn create(specs: &[ZoneSpec], world: &mut PhysicsWorld) -> Self {
        let zones = specs
            .iter()
            .map(|spec| {
                let reference_position = vec3(spec.position);
                let half_extents = vec3(spec.half_extents);
                let live = rotate_about_origin(
                    &UnitQuaternion::identity(),
                    &reference_position,
                    &UnitQuaternion::identity(),
                );
                let body = world.insert_body(RigidBodyBuilder::kinematic_position_based().position(live));
                world.attach(
                    ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z).sensor(true),
                    body,
                );
                TriggerZone {
                    reference_position,
                    half_extents,
                    color: spec.color,
                    occupied_color: spec.occupied_color,
                    occupied: false,
                    tint: spec.color,
                    body,
                    live,
                }
            })
            .collect();
        Self { zones }
    }

    /// Zones follow the maze rotation; they have no tilt of their own.
    pub fn sync(&mut self, maze_rotation: &UnitQuaternion<f32>, world: &mut PhysicsWorld) {
        for zone in &mut self.zones {
            zone.live = rotate_about_origin(
                maze_rotation,
                &zone.reference_position,
                &UnitQuaternion::identity(),
            );
            if let Some(body) = world.bodies.get_mut(zone.body) {
                body.set_next_kinematic_position(zone.live);
            }
        }
    }

    /// Update occupancy against every ball and return the edges.
    pub fn evaluate_overlap(&mut self, balls: &[BallProbe]) -> Vec<ZoneEvent> {
        let mut events = Vec::new();
        for (index, zone) in self.zones.iter_mut().enumerate() {
            let occupied = balls.iter().any(|ball| zone.overlaps(ball));
            if occupied == zone.occupied {
                continue;
            }
            zone.occupied = occupied;
            let transition = if occupied {
                zone.tint = zone.occupied_color;
                ZoneTransition::Entered
            } else {
                zone.tint = zone.color;
                ZoneTransition::Left
            };
            tracing::debug!("Zone {} {:?}", index, transition);
            events.push(ZoneEvent {
                zone: index,
                transition,
            });
        }
        events
    }

    pub fn occupied_count(&self) -> usize {
        self.zones.iter().filter(|z| z.occupied).count()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TriggerZone> {
        self.zones.iter()
    }

    pub fn remove(self, world: &mut PhysicsWorld) -> Released {
        let mut released = Released::default();
        for zone in self.zones {
            released += Released {
                bodies: 1,
                colliders: world.remove_body(zone.body),
            };
        }
        released
    }
}
