//! Maze scene graph: a hierarchy of nodes, some carrying triangle geometry.
//!
//! Scenes are stored as JSON documents. World transforms are cached on each
//! node and only refreshed by an explicit [`AssetNode::update_world_transforms`]
//! flush; anything reading world-space data must flush first.

use std::path::Path;

use rapier3d::na::{Point3, Quaternion, UnitQuaternion, Vector3};
use rapier3d::parry::bounding_volume::{Aabb, BoundingVolume};
use serde::{Deserialize, Serialize};

use crate::error::{LoadError, ShapeError};
use crate::math::vec3;

/// Anything the collision converter can walk: a node with optional geometry,
/// a flushed world transform and child nodes.
pub trait SceneNode {
    type Children<'a>: Iterator<Item = &'a Self>
    where
        Self: 'a;

    fn name(&self) -> &str;
    fn geometry(&self) -> Option<&Geometry>;
    /// `None` until transforms have been flushed.
    fn world_transform(&self) -> Option<&WorldTransform>;
    fn children(&self) -> Self::Children<'_>;
}

/// Local transform relative to the parent node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeTransform {
    pub translation: [f32; 3],
    /// Quaternion as `[x, y, z, w]`.
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
        }
    }
}

impl NodeTransform {
    pub fn from_translation(translation: [f32; 3]) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    pub fn rotation_quat(&self) -> UnitQuaternion<f32> {
        let [x, y, z, w] = self.rotation;
        UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z))
    }
}

/// Flattened translation / rotation / per-axis scale in world (or wrapper) space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTransform {
    pub translation: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
}

impl WorldTransform {
    pub fn identity() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::repeat(1.0),
        }
    }

    pub fn compose(&self, local: &NodeTransform) -> Self {
        let local_translation = vec3(local.translation);
        Self {
            translation: self.translation
                + self.rotation * self.scale.component_mul(&local_translation),
            rotation: self.rotation * local.rotation_quat(),
            scale: self.scale.component_mul(&vec3(local.scale)),
        }
    }

    pub fn transform_point(&self, p: &Vector3<f32>) -> Vector3<f32> {
        self.translation + self.rotation * self.scale.component_mul(p)
    }
}

/// Vertex buffer plus optional index buffer, as found in the scene file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub positions: Vec<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<Vec<u32>>,
}

impl Geometry {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Axis-aligned box centered on the node origin, indexed.
    pub fn cuboid(half_extents: [f32; 3]) -> Self {
        let [hx, hy, hz] = half_extents;
        let positions = vec![
            [-hx, -hy, -hz],
            [hx, -hy, -hz],
            [hx, hy, -hz],
            [-hx, hy, -hz],
            [-hx, -hy, hz],
            [hx, -hy, hz],
            [hx, hy, hz],
            [-hx, hy, hz],
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 0, 3, 2, // -z
            4, 5, 6, 4, 6, 7, // +z
            0, 1, 5, 0, 5, 4, // -y
            3, 7, 6, 3, 6, 2, // +y
            0, 4, 7, 0, 7, 3, // -x
            1, 2, 6, 1, 6, 5, // +x
        ];
        Self {
            positions,
            indices: Some(indices),
        }
    }

    /// Same box as [`Geometry::cuboid`] but as a plain triangle soup.
    pub fn cuboid_unindexed(half_extents: [f32; 3]) -> Self {
        let indexed = Self::cuboid(half_extents);
        let positions = indexed
            .indices
            .iter()
            .flatten()
            .map(|&i| indexed.positions[i as usize])
            .collect();
        Self {
            positions,
            indices: None,
        }
    }

    /// Triangle list, synthesizing `0..n` when there is no index buffer.
    pub fn triangles(&self) -> Result<Vec<[u32; 3]>, ShapeError> {
        let vertex_count = self.positions.len();
        if vertex_count == 0 {
            return Err(ShapeError::EmptyGeometry);
        }

        let flat: Vec<u32> = match &self.indices {
            Some(indices) => {
                if indices.len() % 3 != 0 || indices.is_empty() {
                    return Err(ShapeError::IndexCountNotTriangles(indices.len()));
                }
                if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                    return Err(ShapeError::IndexOutOfRange {
                        index: bad,
                        vertex_count,
                    });
                }
                indices.clone()
            }
            None => {
                if vertex_count % 3 != 0 {
                    return Err(ShapeError::VertexCountNotTriangles(vertex_count));
                }
                (0..vertex_count as u32).collect()
            }
        };

        Ok(flat.chunks_exact(3).map(|t| [t[0], t[1], t[2]]).collect())
    }
}

/// One node of a maze scene file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetNode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub transform: NodeTransform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AssetNode>,
    #[serde(skip)]
    world: Option<WorldTransform>,
}

impl AssetNode {
    pub fn group(name: impl Into<String>, children: Vec<AssetNode>) -> Self {
        Self {
            name: name.into(),
            children,
            ..Default::default()
        }
    }

    pub fn mesh(name: impl Into<String>, transform: NodeTransform, geometry: Geometry) -> Self {
        Self {
            name: name.into(),
            transform,
            geometry: Some(geometry),
            ..Default::default()
        }
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Read and parse a scene file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json(&text).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Recompute cached world transforms for this subtree.
    pub fn update_world_transforms(&mut self, parent: &WorldTransform) {
        let world = parent.compose(&self.transform);
        for child in &mut self.children {
            child.update_world_transforms(&world);
        }
        self.world = Some(world);
    }

    /// Nodes in this subtree that carry geometry, including empty geometry.
    pub fn mesh_count(&self) -> usize {
        let own = usize::from(self.geometry.is_some());
        own + self.children.iter().map(AssetNode::mesh_count).sum::<usize>()
    }

    /// Bounds of all flushed, non-empty geometry in this subtree.
    pub fn world_bounds(&self) -> Option<Aabb> {
        let mut bounds: Option<Aabb> = None;
        if let (Some(geometry), Some(world)) = (&self.geometry, &self.world) {
            for p in &geometry.positions {
                let w = world.transform_point(&vec3(*p));
                let point_box = Aabb::new(Point3::from(w), Point3::from(w));
                bounds = Some(match bounds {
                    Some(b) => b.merged(&point_box),
                    None => point_box,
                });
            }
        }
        for child in &self.children {
            if let Some(child_bounds) = child.world_bounds() {
                bounds = Some(match bounds {
                    Some(b) => b.merged(&child_bounds),
                    None => child_bounds,
                });
            }
        }
        bounds
    }
}

impl SceneNode for AssetNode {
    type Children<'a> = std::slice::Iter<'a, AssetNode>;

    fn name(&self) -> &str {
        &self.name
    }

    fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    fn world_transform(&self) -> Option<&WorldTransform> {
        self.world.as_ref()
    }

    fn children(&self) -> Self::Children<'_> {
        self.children.iter()
    }
}

/// A loaded maze scene inside a pivot wrapper.
///
/// The wrapper sits at the origin of the maze frame. When re-centered, the
/// loaded scene is shifted inside it so the wrapper origin lands on the
/// base-center of the scaled bounds, which makes tilting rotate the maze in
/// place.
#[derive(Debug, Clone)]
pub struct MazeAsset {
    wrapper: AssetNode,
    pivot: Vector3<f32>,
}

impl MazeAsset {
    pub fn new(mut scene: AssetNode, scale: [f32; 3], recenter: bool) -> Self {
        let s = vec3(scene.transform.scale).component_mul(&vec3(scale));
        scene.transform.scale = [s.x, s.y, s.z];

        let mut wrapper = AssetNode::group("maze-pivot", vec![scene]);
        wrapper.update_world_transforms(&WorldTransform::identity());

        let mut pivot = Vector3::zeros();
        if recenter {
            if let Some(bounds) = wrapper.world_bounds() {
                let center = bounds.center();
                pivot = Vector3::new(center.x, bounds.mins.y, center.z);
                let inner = &mut wrapper.children[0].transform.translation;
                inner[0] -= pivot.x;
                inner[1] -= pivot.y;
                inner[2] -= pivot.z;
                wrapper.update_world_transforms(&WorldTransform::identity());
            }
        }

        Self { wrapper, pivot }
    }

    /// Load a scene file and wrap it. Rejects when the file is missing or malformed.
    pub async fn load(path: impl AsRef<Path>, scale: [f32; 3], recenter: bool) -> Result<Self, LoadError> {
        let scene = AssetNode::load(path).await?;
        Ok(Self::new(scene, scale, recenter))
    }

    /// The wrapper node; its world transforms are already flushed.
    pub fn root(&self) -> &AssetNode {
        &self.wrapper
    }

    /// Where the original scene origin was moved from, in scaled units.
    pub fn pivot(&self) -> Vector3<f32> {
        self.pivot
    }

    pub fn mesh_count(&self) -> usize {
        self.wrapper.mesh_count()
    }

    /// Bounds in the maze frame (wrapper space).
    pub fn bounds(&self) -> Option<Aabb> {
        self.wrapper.world_bounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset_box(name: &str, at: [f32; 3], half: [f32; 3]) -> AssetNode {
        AssetNode::mesh(name, NodeTransform::from_translation(at), Geometry::cuboid(half))
    }

    #[test]
    fn cuboid_has_twelve_triangles() {
        let g = Geometry::cuboid([1.0, 2.0, 3.0]);
        assert_eq!(g.triangles().unwrap().len(), 12);
    }

    #[test]
    fn unindexed_geometry_synthesizes_sequential_indices() {
        let g = Geometry::cuboid_unindexed([1.0, 1.0, 1.0]);
        let tris = g.triangles().unwrap();
        assert_eq!(tris.len(), 12);
        assert_eq!(tris[0], [0, 1, 2]);
        assert_eq!(tris[11], [33, 34, 35]);
    }

    #[test]
    fn dangling_vertices_are_rejected() {
        let g = Geometry {
            positions: vec![[0.0; 3]; 4],
            indices: None,
        };
        assert_eq!(g.triangles(), Err(ShapeError::VertexCountNotTriangles(4)));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let g = Geometry {
            positions: vec![[0.0; 3]; 3],
            indices: Some(vec![0, 1, 7]),
        };
        assert_eq!(
            g.triangles(),
            Err(ShapeError::IndexOutOfRange {
                index: 7,
                vertex_count: 3
            })
        );
    }

    #[test]
    fn world_transform_composes_scale_rotation_translation() {
        let mut root = AssetNode::group(
            "root",
            vec![offset_box("child", [1.0, 0.0, 0.0], [0.5, 0.5, 0.5])],
        );
        root.transform.scale = [2.0, 2.0, 2.0];
        root.transform.translation = [0.0, 5.0, 0.0];
        root.update_world_transforms(&WorldTransform::identity());

        let child = root.children().next().unwrap();
        let world = child.world_transform().unwrap();
        assert!((world.translation - Vector3::new(2.0, 5.0, 0.0)).norm() < 1e-6);
        assert!((world.scale - Vector3::repeat(2.0)).norm() < 1e-6);
    }

    #[test]
    fn transforms_are_absent_until_flushed() {
        let node = offset_box("wall", [0.0; 3], [1.0; 3]);
        assert!(node.world_transform().is_none());
        assert!(node.world_bounds().is_none());
    }

    #[test]
    fn mesh_count_counts_geometry_nodes() {
        let root = AssetNode::group(
            "root",
            vec![
                offset_box("a", [0.0; 3], [1.0; 3]),
                AssetNode::group("g", vec![offset_box("b", [3.0, 0.0, 0.0], [1.0; 3])]),
            ],
        );
        assert_eq!(root.mesh_count(), 2);
    }

    #[test]
    fn recenter_moves_pivot_to_base_center() {
        let scene = AssetNode::group(
            "maze",
            vec![
                offset_box("floor", [10.0, 1.0, 4.0], [5.0, 0.5, 5.0]),
                offset_box("post", [12.0, 3.0, 6.0], [0.5, 2.0, 0.5]),
            ],
        );
        let asset = MazeAsset::new(scene, [1.0, 1.0, 1.0], true);
        let bounds = asset.bounds().unwrap();
        let center = bounds.center();
        assert!(center.x.abs() < 1e-5);
        assert!(center.z.abs() < 1e-5);
        assert!(bounds.mins.y.abs() < 1e-5);
        assert!((asset.pivot() - Vector3::new(10.0, 0.5, 4.0)).norm() < 1e-5);
    }

    #[test]
    fn recenter_disabled_keeps_modeling_origin() {
        let scene = AssetNode::group("maze", vec![offset_box("floor", [10.0, 1.0, 4.0], [5.0, 0.5, 5.0])]);
        let asset = MazeAsset::new(scene, [1.0, 1.0, 1.0], false);
        assert_eq!(asset.pivot(), Vector3::zeros());
        let center = asset.bounds().unwrap().center();
        assert!((center.x - 10.0).abs() < 1e-5);
    }

    #[test]
    fn scale_is_applied_before_recentering() {
        let scene = AssetNode::group("maze", vec![offset_box("floor", [0.0; 3], [1.0, 1.0, 1.0])]);
        let asset = MazeAsset::new(scene, [3.0, 2.0, 3.0], true);
        let bounds = asset.bounds().unwrap();
        assert!((bounds.maxs.x - bounds.mins.x - 6.0).abs() < 1e-5);
        assert!((bounds.maxs.y - 4.0).abs() < 1e-5);
    }

    #[test]
    fn scene_json_roundtrips_defaults() {
        let json = r#"{
            "name": "maze",
            "children": [
                { "name": "wall", "transform": { "translation": [1, 0, 0] },
                  "geometry": { "positions": [[0,0,0],[1,0,0],[0,1,0]] } }
            ]
        }"#;
        let node = AssetNode::from_json(json).unwrap();
        let wall = &node.children[0];
        assert_eq!(wall.transform.scale, [1.0, 1.0, 1.0]);
        assert_eq!(wall.transform.rotation, [0.0, 0.0, 0.0, 1.0]);
        assert!(wall.geometry.as_ref().unwrap().indices.is_none());
    }

    #[tokio::test]
    async fn load_missing_file_is_an_io_error() {
        let err = AssetNode::load("/definitely/not/here.json").await.unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
