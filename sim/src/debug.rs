//! Read-only view of live collision transforms for wireframe overlays.

use rapier3d::na::{Isometry3, Vector3};

use crate::boundary::PlaneKind;
use crate::level::Level;

#[derive(Debug, Clone, PartialEq)]
pub enum DebugShape {
    MazeBody {
        pose: Isometry3<f32>,
        shapes: usize,
    },
    Plane {
        kind: PlaneKind,
        pose: Isometry3<f32>,
        /// Half width, half height, half thickness of the drawn slab.
        extents: [f32; 3],
    },
    Zone {
        pose: Isometry3<f32>,
        half_extents: Vector3<f32>,
        occupied: bool,
    },
    Ball {
        pose: Isometry3<f32>,
        radius: f32,
    },
}

pub fn snapshot(level: &Level) -> Vec<DebugShape> {
    let mut shapes = Vec::new();

    if let Some(body) = level
        .maze
        .body_handle()
        .and_then(|h| level.world.bodies.get(h))
    {
        shapes.push(DebugShape::MazeBody {
            pose: *body.next_position(),
            shapes: level.maze.shape_count(),
        });
    }

    shapes.extend(level.boundary.planes().iter().map(|plane| DebugShape::Plane {
        kind: plane.kind,
        pose: plane.pose(),
        extents: plane.extents,
    }));

    shapes.extend(level.zones.iter().map(|zone| DebugShape::Zone {
        pose: zone.pose(),
        half_extents: zone.half_extents,
        occupied: zone.occupied(),
    }));

    shapes.extend(level.balls.iter().map(|ball| DebugShape::Ball {
        pose: crate::math::isometry(ball.position(), ball.rotation()),
        radius: ball.radius,
    }));

    shapes
}
