//! Mesh to collision shape conversion.
//!
//! [`collect_shapes`] walks any [`SceneNode`] tree and returns one
//! [`ShapePart`] per sub-mesh: scaled vertices, triangles, and the fixed
//! offset/orientation the part keeps relative to the root for the lifetime of
//! the maze. Building colliders from the parts is left to the caller.

use rapier3d::na::{Point3, UnitQuaternion, Vector3};
use rapier3d::prelude::{ColliderBuilder, Isometry};

use crate::error::ShapeError;
use crate::math::isometry;
use crate::scene::SceneNode;

/// One triangle surface, already scaled, with its placement relative to the root.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapePart {
    pub name: String,
    pub vertices: Vec<Point3<f32>>,
    pub triangles: Vec<[u32; 3]>,
    /// Sub-mesh world position minus root world position.
    pub offset: Vector3<f32>,
    /// Sub-mesh world orientation.
    pub rotation: UnitQuaternion<f32>,
}

impl ShapePart {
    pub fn local_pose(&self) -> Isometry<f32> {
        isometry(self.offset, self.rotation)
    }

    /// Triangle-mesh collider placed at this part's offset on its parent body.
    pub fn collider(&self) -> Result<ColliderBuilder, ShapeError> {
        ColliderBuilder::trimesh(self.vertices.clone(), self.triangles.clone())
            .map(|builder| builder.position(self.local_pose()))
            .map_err(|e| ShapeError::Trimesh(format!("{e:?}")))
    }
}

/// Convert every sub-mesh under `root`. Sub-meshes that fail are logged and
/// skipped; only a root without flushed transforms is an error.
pub fn collect_shapes<N: SceneNode>(root: &N) -> Result<Vec<ShapePart>, ShapeError> {
    let root_translation = root
        .world_transform()
        .ok_or(ShapeError::MissingWorldTransform)?
        .translation;

    let mut parts = Vec::new();
    visit(root, &root_translation, &mut parts);
    Ok(parts)
}

fn visit<N: SceneNode>(node: &N, root_translation: &Vector3<f32>, parts: &mut Vec<ShapePart>) {
    if node.geometry().is_some() {
        match shape_part(node, root_translation) {
            Ok(part) => parts.push(part),
            Err(e) => {
                tracing::warn!("Skipping sub-mesh '{}': {}", node.name(), e);
            }
        }
    }
    for child in node.children() {
        visit(child, root_translation, parts);
    }
}

fn shape_part<N: SceneNode>(node: &N, root_translation: &Vector3<f32>) -> Result<ShapePart, ShapeError> {
    let geometry = node.geometry().ok_or(ShapeError::EmptyGeometry)?;
    let world = node.world_transform().ok_or(ShapeError::MissingWorldTransform)?;
    let triangles = geometry.triangles()?;

    let vertices = geometry
        .positions
        .iter()
        .map(|p| {
            Point3::new(
                p[0] * world.scale.x,
                p[1] * world.scale.y,
                p[2] * world.scale.z,
            )
        })
        .collect::<Vec<_>>();
    if vertices.iter().any(|v| !v.coords.iter().all(|c| c.is_finite())) {
        return Err(ShapeError::NonFiniteVertex);
    }

    Ok(ShapePart {
        name: node.name().to_string(),
        vertices,
        triangles,
        offset: world.translation - root_translation,
        rotation: world.rotation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{AssetNode, Geometry, NodeTransform, WorldTransform};

    fn flushed(mut root: AssetNode) -> AssetNode {
        root.update_world_transforms(&WorldTransform::identity());
        root
    }

    fn wall(name: &str, at: [f32; 3]) -> AssetNode {
        AssetNode::mesh(name, NodeTransform::from_translation(at), Geometry::cuboid([2.0, 1.0, 0.1]))
    }

    #[test]
    fn unflushed_root_is_rejected() {
        let root = AssetNode::group("maze", vec![wall("a", [0.0; 3])]);
        assert_eq!(collect_shapes(&root), Err(ShapeError::MissingWorldTransform));
    }

    #[test]
    fn one_part_per_valid_sub_mesh() {
        let root = flushed(AssetNode::group(
            "maze",
            vec![
                wall("a", [1.0, 0.0, 0.0]),
                AssetNode::group("nested", vec![wall("b", [0.0, 0.0, 3.0]), wall("c", [0.0, 2.0, 0.0])]),
            ],
        ));
        let parts = collect_shapes(&root).unwrap();
        assert_eq!(parts.len(), root.mesh_count());
        let names: Vec<_> = parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn malformed_sub_mesh_is_skipped() {
        let broken = AssetNode::mesh(
            "broken",
            NodeTransform::default(),
            Geometry {
                positions: vec![[0.0; 3]; 5],
                indices: None,
            },
        );
        let empty = AssetNode::mesh("empty", NodeTransform::default(), Geometry::default());
        let root = flushed(AssetNode::group("maze", vec![wall("ok", [0.0; 3]), broken, empty]));
        let parts = collect_shapes(&root).unwrap();
        assert_eq!(parts.len(), 1);
        assert!(parts.len() < root.mesh_count());
        assert_eq!(parts[0].name, "ok");
    }

    #[test]
    fn world_scale_is_baked_into_vertices() {
        let mut node = wall("a", [0.0; 3]);
        node.transform.scale = [2.0, 3.0, 4.0];
        let root = flushed(AssetNode::group("maze", vec![node]));
        let part = &collect_shapes(&root).unwrap()[0];
        let max_x = part.vertices.iter().map(|v| v.x).fold(f32::MIN, f32::max);
        let max_y = part.vertices.iter().map(|v| v.y).fold(f32::MIN, f32::max);
        let max_z = part.vertices.iter().map(|v| v.z).fold(f32::MIN, f32::max);
        assert!((max_x - 4.0).abs() < 1e-6);
        assert!((max_y - 3.0).abs() < 1e-6);
        assert!((max_z - 0.4).abs() < 1e-6);
    }

    #[test]
    fn offset_is_relative_to_root() {
        let mut root = AssetNode::group("maze", vec![wall("a", [1.0, 2.0, 3.0])]);
        root.transform.translation = [10.0, 0.0, -5.0];
        let root = flushed(root);
        let part = &collect_shapes(&root).unwrap()[0];
        assert!((part.offset - Vector3::new(1.0, 2.0, 3.0)).norm() < 1e-6);
    }

    #[test]
    fn orientation_is_world_orientation() {
        let rot = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.5);
        let mut node = wall("a", [0.0; 3]);
        node.transform.rotation = [rot.i, rot.j, rot.k, rot.w];
        let mut root = AssetNode::group("maze", vec![node]);
        let parent = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.25);
        root.transform.rotation = [parent.i, parent.j, parent.k, parent.w];
        let root = flushed(root);
        let part = &collect_shapes(&root).unwrap()[0];
        assert!(part.rotation.angle_to(&(parent * rot)) < 1e-5);
    }

    #[test]
    fn unindexed_geometry_gets_sequential_triangles() {
        let node = AssetNode::mesh("soup", NodeTransform::default(), Geometry::cuboid_unindexed([1.0; 3]));
        let root = flushed(AssetNode::group("maze", vec![node]));
        let part = &collect_shapes(&root).unwrap()[0];
        assert_eq!(part.triangles.len(), 12);
        assert_eq!(part.vertices.len(), 36);
    }

    #[test]
    fn parts_build_trimesh_colliders() {
        let root = flushed(AssetNode::group("maze", vec![wall("a", [0.0; 3])]));
        let part = &collect_shapes(&root).unwrap()[0];
        assert!(part.collider().is_ok());
    }

    #[test]
    fn conversion_does_not_touch_the_scene() {
        let root = flushed(AssetNode::group("maze", vec![wall("a", [1.0, 0.0, 0.0])]));
        let before = format!("{root:?}");
        let _ = collect_shapes(&root);
        assert_eq!(before, format!("{root:?}"));
    }
}
