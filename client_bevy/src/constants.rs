pub const DEFAULT_LEVELS_DIR: &str = "assets/levels";

/// The driver runs once per fixed tick; it sub-steps physics internally.
pub const FIXED_HZ: f64 = 60.0;

/// Camera distance from the maze center, in multiples of the wall distance.
pub const CAMERA_DISTANCE_FACTOR: f32 = 2.0;
/// Camera elevation above the horizon, radians.
pub const CAMERA_PITCH: f32 = 0.95;

pub const ZONE_ALPHA: f32 = 0.35;
pub const BALL_SEGMENTS: u32 = 24;

#[derive(Clone, Copy)]
pub struct Colors;

impl Colors {
    pub const BACKGROUND: u32 = 0x10141c;
    pub const MAZE: u32 = 0xb8a98c;
    pub const HUD_TEXT: u32 = 0xe6e6e6;
    pub const HUD_DIM: u32 = 0x8a93a6;
    pub const BANNER: u32 = 0x44ff88;
    pub const ERROR: u32 = 0xff6b6b;
}

pub fn color_from_hex(rgb: u32) -> bevy::prelude::Color {
    let r = ((rgb >> 16) & 0xff) as f32 / 255.0;
    let g = ((rgb >> 8) & 0xff) as f32 / 255.0;
    let b = (rgb & 0xff) as f32 / 255.0;
    bevy::prelude::Color::srgb(r, g, b)
}
