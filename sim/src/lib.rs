//! Tilt-maze simulation core.
//!
//! A level is loaded into a [`level::Level`] aggregate; a [`driver::Driver`]
//! then advances it one display frame at a time.

pub mod ball;
pub mod boundary;
pub mod collision;
pub mod config;
pub mod debug;
pub mod driver;
pub mod error;
pub mod input;
pub mod level;
pub mod math;
pub mod maze;
pub mod physics;
pub mod scene;
pub mod win;
pub mod zones;

pub use rapier3d;
