//! Data shared between the simulation core and its front ends.
//!
//! Level records and tilt signals are exported to TypeScript so the browser
//! UI reads the same shapes the core consumes.

pub mod config;
pub mod input;

pub use config::{BallSpec, BoundarySpec, LevelCatalog, LevelConfig, MazePlacement, ZoneSpec};
pub use input::TiltSignal;
