//! Level aggregate: everything one level instance owns, from load to unload.

use std::path::{Path, PathBuf};

use maze_shared::{LevelCatalog, LevelConfig};

use crate::ball::Ball;
use crate::boundary::Boundary;
use crate::config::SimConfig;
use crate::error::LoadError;
use crate::maze::MazeEntity;
use crate::physics::{PhysicsWorld, Released};
use crate::scene::MazeAsset;
use crate::win::WinDetector;
use crate::zones::{BallProbe, Zones};

pub struct Level {
    pub config: LevelConfig,
    pub sim: SimConfig,
    pub world: PhysicsWorld,
    pub maze: MazeEntity,
    pub boundary: Boundary,
    pub zones: Zones,
    pub balls: Vec<Ball>,
    pub win: WinDetector,
    next_level: Option<String>,
}

/// Read and validate a level file.
pub async fn read_level_config(path: impl AsRef<Path>) -> Result<LevelConfig, LoadError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let config = LevelConfig::from_json(&text).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate().map_err(LoadError::InvalidLevel)?;
    Ok(config)
}

/// Read a level catalog (`{ "levels": [...] }`).
pub async fn read_catalog(path: impl AsRef<Path>) -> Result<LevelCatalog, LoadError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&text).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Maze asset path for a level, relative to the directory the level lives in.
pub fn resolve_asset_path(level_dir: &Path, asset: &str) -> PathBuf {
    let asset = Path::new(asset);
    if asset.is_absolute() {
        asset.to_path_buf()
    } else {
        level_dir.join(asset)
    }
}

impl Level {
    /// Load a level file and the maze it references.
    pub async fn load(
        path: impl AsRef<Path>,
        sim: SimConfig,
        catalog: &LevelCatalog,
    ) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let config = read_level_config(path).await?;
        let level_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let next_level = catalog.resolve_next(&config);
        Self::from_config(config, level_dir, sim, next_level).await
    }

    /// Bring up a level from an in-memory record. The maze asset path is
    /// resolved against `asset_dir`.
    pub async fn from_config(
        config: LevelConfig,
        asset_dir: &Path,
        sim: SimConfig,
        next_level: Option<String>,
    ) -> Result<Self, LoadError> {
        config.validate().map_err(LoadError::InvalidLevel)?;
        sim.validate().map_err(LoadError::InvalidConfig)?;

        let asset_path = resolve_asset_path(asset_dir, &config.maze.asset);
        tracing::info!("Loading level '{}' from {}", config.id, asset_path.display());
        let mut world = PhysicsWorld::new(&sim);
        let maze = MazeEntity::load(&asset_path, &config.maze, &mut world).await?;
        Ok(Self::assemble(config, sim, world, maze, next_level))
    }

    /// Build every entity for an already loaded maze asset. A `next_level`
    /// named by the level record itself takes precedence over the argument.
    pub fn from_asset(
        config: LevelConfig,
        asset: MazeAsset,
        sim: SimConfig,
        next_level: Option<String>,
    ) -> Result<Self, LoadError> {
        config.validate().map_err(LoadError::InvalidLevel)?;
        sim.validate().map_err(LoadError::InvalidConfig)?;

        let mut world = PhysicsWorld::new(&sim);
        let maze = MazeEntity::from_asset(asset, &config.maze, &mut world);
        Ok(Self::assemble(config, sim, world, maze, next_level))
    }

    /// Add boundary, zones and balls around a placed maze and bring every
    /// dependent pose in line with the maze body.
    fn assemble(
        config: LevelConfig,
        sim: SimConfig,
        mut world: PhysicsWorld,
        maze: MazeEntity,
        next_level: Option<String>,
    ) -> Self {
        let config_next = config.next_level.clone();
        let mut boundary = Boundary::create(&config.boundary, &mut world);
        let mut zones = Zones::create(&config.zones, &mut world);
        let mut balls: Vec<Ball> = config
            .balls
            .iter()
            .map(|spec| Ball::create(spec, &sim, &mut world))
            .collect();

        if let Some(rotation) = maze.body_rotation(&world) {
            boundary.sync(&rotation, &mut world);
            zones.sync(&rotation, &mut world);
        }
        for ball in &mut balls {
            ball.read_back(&world);
        }

        if zones.is_empty() {
            tracing::warn!("Level '{}' has no target zones and cannot be won", config.id);
        }
        tracing::info!(
            "Level '{}' ready: {} of {} sub-meshes as shapes, {} zones, {} balls",
            config.id,
            maze.shape_count(),
            maze.sub_mesh_count(),
            zones.len(),
            balls.len()
        );

        Self {
            config,
            sim,
            world,
            maze,
            boundary,
            zones,
            balls,
            win: WinDetector::default(),
            next_level: config_next.or(next_level),
        }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn next_level(&self) -> Option<&str> {
        self.next_level.as_deref()
    }

    /// Yaw from the level placement; tilt input never changes it.
    pub fn base_yaw(&self) -> f32 {
        self.config.maze.rotation[1]
    }

    pub fn ball_probes(&self) -> Vec<BallProbe> {
        self.balls.iter().map(Ball::probe).collect()
    }

    /// Release every body and collider this level put into its world.
    pub fn unload(self) -> Released {
        let Level {
            config,
            mut world,
            mut maze,
            boundary,
            zones,
            balls,
            ..
        } = self;

        let mut released = maze.unload(&mut world);
        released += boundary.remove(&mut world);
        released += zones.remove(&mut world);
        for ball in balls {
            released += ball.remove(&mut world);
        }

        tracing::info!(
            "Level '{}' unloaded: released {} bodies and {} colliders",
            config.id,
            released.bodies,
            released.colliders
        );
        released
    }
}
