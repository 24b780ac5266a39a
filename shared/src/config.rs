use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const DEFAULT_BALL_COLOR: u32 = 0xd94f4f;
pub const DEFAULT_ZONE_COLOR: u32 = 0x3d6fd9;
pub const DEFAULT_ZONE_OCCUPIED_COLOR: u32 = 0x44ff88;

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_true() -> bool {
    true
}

fn default_thickness() -> f32 {
    1.0
}

fn default_ball_color() -> u32 {
    DEFAULT_BALL_COLOR
}

fn default_zone_color() -> u32 {
    DEFAULT_ZONE_COLOR
}

fn default_zone_occupied_color() -> u32 {
    DEFAULT_ZONE_OCCUPIED_COLOR
}

/// Maze asset reference and its initial placement in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/")]
#[serde(rename_all = "camelCase")]
pub struct MazePlacement {
    /// Scene file path, relative to the level file.
    pub asset: String,
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
    #[serde(default)]
    pub position: [f32; 3],
    /// Euler angles in radians (XYZ order). Only the Y component survives
    /// once tilt input starts driving X and Z.
    #[serde(default)]
    pub rotation: [f32; 3],
    /// Move the rotation pivot to the base-center of the scaled bounds.
    #[serde(default = "default_true")]
    pub recenter: bool,
}

/// Outer fence: ground plane plus four walls around the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/")]
#[serde(rename_all = "camelCase")]
pub struct BoundarySpec {
    /// Distance of each wall from the origin along X or Z.
    pub wall_distance: f32,
    pub wall_height: f32,
    /// Height of the ground plane.
    #[serde(default)]
    pub ground_height: f32,
    /// Only used to size debug drawings; the planes themselves are infinite.
    #[serde(default = "default_thickness")]
    pub thickness: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/")]
#[serde(rename_all = "camelCase")]
pub struct BallSpec {
    pub position: [f32; 3],
    #[serde(default = "default_ball_color")]
    pub color: u32,
    pub radius: f32,
}

/// Target box a ball has to reach. Position is relative to the maze center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/")]
#[serde(rename_all = "camelCase")]
pub struct ZoneSpec {
    pub position: [f32; 3],
    pub half_extents: [f32; 3],
    #[serde(default = "default_zone_color")]
    pub color: u32,
    #[serde(default = "default_zone_occupied_color")]
    pub occupied_color: u32,
}

impl ZoneSpec {
    /// Build a zone from its full box size rather than half-extents.
    pub fn from_size(position: [f32; 3], size: [f32; 3]) -> Self {
        Self {
            position,
            half_extents: [size[0] * 0.5, size[1] * 0.5, size[2] * 0.5],
            color: DEFAULT_ZONE_COLOR,
            occupied_color: DEFAULT_ZONE_OCCUPIED_COLOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/")]
#[serde(rename_all = "camelCase")]
pub struct LevelConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub maze: MazePlacement,
    pub boundary: BoundarySpec,
    pub balls: Vec<BallSpec>,
    #[serde(default)]
    pub zones: Vec<ZoneSpec>,
    /// Level to offer once this one is won. Falls back to the catalog order.
    #[serde(default)]
    pub next_level: Option<String>,
}

fn finite3(v: [f32; 3]) -> bool {
    v.iter().all(|c| c.is_finite())
}

impl LevelConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("level id must not be empty".to_string());
        }
        if self.maze.asset.is_empty() {
            return Err("maze asset path must not be empty".to_string());
        }
        if !finite3(self.maze.scale) || self.maze.scale.iter().any(|s| *s <= 0.0) {
            return Err("maze scale must be finite and > 0 on every axis".to_string());
        }
        if !finite3(self.maze.position) || !finite3(self.maze.rotation) {
            return Err("maze position and rotation must be finite".to_string());
        }

        let b = &self.boundary;
        if !b.wall_distance.is_finite() || b.wall_distance <= 0.0 {
            return Err("wall_distance must be finite and > 0".to_string());
        }
        if !b.wall_height.is_finite() || b.wall_height <= 0.0 {
            return Err("wall_height must be finite and > 0".to_string());
        }
        if !b.ground_height.is_finite() {
            return Err("ground_height must be finite".to_string());
        }
        if !b.thickness.is_finite() || b.thickness <= 0.0 {
            return Err("thickness must be finite and > 0".to_string());
        }

        if self.balls.is_empty() {
            return Err("a level needs at least one ball".to_string());
        }
        for (i, ball) in self.balls.iter().enumerate() {
            if !finite3(ball.position) {
                return Err(format!("ball {i} position must be finite"));
            }
            if !ball.radius.is_finite() || ball.radius <= 0.0 {
                return Err(format!("ball {i} radius must be finite and > 0"));
            }
        }

        for (i, zone) in self.zones.iter().enumerate() {
            if !finite3(zone.position) {
                return Err(format!("zone {i} position must be finite"));
            }
            if !finite3(zone.half_extents) || zone.half_extents.iter().any(|h| *h <= 0.0) {
                return Err(format!("zone {i} half extents must be finite and > 0"));
            }
        }
        Ok(())
    }
}

/// Ordered list of level ids, used to find the level that follows a won one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/")]
pub struct LevelCatalog {
    pub levels: Vec<String>,
}

impl LevelCatalog {
    pub fn next_after(&self, id: &str) -> Option<&str> {
        let idx = self.levels.iter().position(|l| l == id)?;
        self.levels.get(idx + 1).map(String::as_str)
    }

    /// Explicit `next_level` wins over catalog order.
    pub fn resolve_next(&self, level: &LevelConfig) -> Option<String> {
        level
            .next_level
            .clone()
            .or_else(|| self.next_after(&level.id).map(str::to_string))
    }
}
