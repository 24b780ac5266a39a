use std::path::Path;

use crate::error::LoadError;

/// Simulation tuning shared by every level.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimConfig {
    /// Vertical gravity (m/s², negative is down)
    pub gravity: f32,
    /// Fixed physics step (seconds)
    pub fixed_dt: f32,
    /// Cap on fixed steps per frame; leftover time is dropped
    pub max_substeps: u32,
    pub solver_iterations: usize,
    /// Largest tilt on X and Z (radians)
    pub max_tilt: f32,
    /// Ball speed is clamped to this before every frame's physics step (m/s)
    pub max_ball_speed: f32,
    /// CCD is switched on for a ball once its speed reaches this (m/s)
    pub ccd_speed_threshold: f32,
    /// Maximum CCD sub-steps the engine may take per step
    pub ccd_iterations: usize,
    pub ball_mass: f32,
    pub ball_linear_damping: f32,
    pub ball_angular_damping: f32,
    pub ball_friction: f32,
    pub ball_restitution: f32,
    /// Balls below this height are reset to their spawn
    pub out_of_bounds_floor: f32,
    /// Balls further than this from the vertical axis are reset to their spawn
    pub out_of_bounds_radius: f32,
    /// Strip rebound velocity off balls after each sub-step
    pub rebound_correction: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: -9.82,
            fixed_dt: 1.0 / 120.0,
            max_substeps: 8,
            solver_iterations: 10,
            max_tilt: 0.35, // ~20 degrees
            max_ball_speed: 12.0,
            ccd_speed_threshold: 0.05,
            ccd_iterations: 10,
            ball_mass: 1.0,
            ball_linear_damping: 0.05,
            ball_angular_damping: 0.05,
            ball_friction: 0.3,
            ball_restitution: 0.0,
            out_of_bounds_floor: -10.0,
            out_of_bounds_radius: 40.0,
            rebound_correction: true,
        }
    }
}

impl SimConfig {
    /// Read overrides from a JSON file; missing fields keep their defaults.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate().map_err(LoadError::InvalidConfig)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.gravity.is_finite() {
            return Err("gravity must be finite".to_string());
        }
        if !self.fixed_dt.is_finite() || self.fixed_dt <= 0.0 {
            return Err("fixed_dt must be finite and > 0".to_string());
        }
        if self.max_substeps == 0 {
            return Err("max_substeps must be > 0".to_string());
        }
        if self.solver_iterations == 0 {
            return Err("solver_iterations must be > 0".to_string());
        }
        if !self.max_tilt.is_finite() || self.max_tilt < 0.0 {
            return Err("max_tilt must be finite and >= 0".to_string());
        }
        if self.max_tilt >= std::f32::consts::FRAC_PI_2 {
            return Err("max_tilt must be < PI/2".to_string());
        }
        if !self.max_ball_speed.is_finite() || self.max_ball_speed <= 0.0 {
            return Err("max_ball_speed must be finite and > 0".to_string());
        }
        if !self.ccd_speed_threshold.is_finite() || self.ccd_speed_threshold < 0.0 {
            return Err("ccd_speed_threshold must be finite and >= 0".to_string());
        }
        if !self.ball_mass.is_finite() || self.ball_mass <= 0.0 {
            return Err("ball_mass must be finite and > 0".to_string());
        }
        if self.ball_linear_damping < 0.0 || self.ball_angular_damping < 0.0 {
            return Err("ball damping must be >= 0".to_string());
        }
        if !self.out_of_bounds_floor.is_finite() {
            return Err("out_of_bounds_floor must be finite".to_string());
        }
        if !self.out_of_bounds_radius.is_finite() || self.out_of_bounds_radius <= 0.0 {
            return Err("out_of_bounds_radius must be finite and > 0".to_string());
        }
        Ok(())
    }
}
