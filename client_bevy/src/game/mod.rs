mod core;
mod hud;
mod input;
mod level;
mod loader;
mod sim;

pub use core::CorePlugin;
pub(crate) use core::{FixedSet, UpdateSet};
pub use hud::HudPlugin;
pub use input::InputPlugin;
pub use level::LevelPlugin;
pub use sim::SimPlugin;
