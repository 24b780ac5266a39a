use std::path::PathBuf;

use thiserror::Error;

/// Why a level (or the maze it references) could not be brought up.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid level: {0}")]
    InvalidLevel(String),
    #[error("invalid simulation config: {0}")]
    InvalidConfig(String),
}

/// Why one sub-mesh could not become a collision shape. Never fatal for a load.
#[derive(Debug, Error, PartialEq)]
pub enum ShapeError {
    #[error("geometry has no vertices")]
    EmptyGeometry,
    #[error("{0} unindexed vertices do not form whole triangles")]
    VertexCountNotTriangles(usize),
    #[error("{0} indices do not form whole triangles")]
    IndexCountNotTriangles(usize),
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("geometry contains a non-finite vertex")]
    NonFiniteVertex,
    #[error("world transforms were not flushed before conversion")]
    MissingWorldTransform,
    #[error("triangle mesh rejected: {0}")]
    Trimesh(String),
}
