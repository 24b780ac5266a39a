use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Two-axis tilt request in `[-1, 1]` per axis, whatever device produced it.
/// `x` is left/right, `y` is toward/away from the viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/")]
pub struct TiltSignal {
    pub x: f32,
    pub y: f32,
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

impl TiltSignal {
    pub const NEUTRAL: Self = Self { x: 0.0, y: 0.0 };

    /// Clamps each axis to `[-1, 1]`; non-finite input reads as neutral.
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: clamp_unit(x),
            y: clamp_unit(y),
        }
    }

    pub fn is_neutral(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// Cursor position (pixels, origin top-left) relative to the viewport center.
pub fn mouse_signal(cursor: [f32; 2], viewport: [f32; 2]) -> TiltSignal {
    if viewport[0] <= 0.0 || viewport[1] <= 0.0 {
        return TiltSignal::NEUTRAL;
    }
    let half_w = viewport[0] * 0.5;
    let half_h = viewport[1] * 0.5;
    TiltSignal::new((cursor[0] - half_w) / half_w, (cursor[1] - half_h) / half_h)
}

/// Knob offset from the pad center, limited to the unit disc.
pub fn joystick_signal(offset: [f32; 2], radius: f32) -> TiltSignal {
    if radius <= 0.0 {
        return TiltSignal::NEUTRAL;
    }
    let mut x = offset[0] / radius;
    let mut y = offset[1] / radius;
    let len = (x * x + y * y).sqrt();
    if len > 1.0 {
        x /= len;
        y /= len;
    }
    TiltSignal::new(x, y)
}

/// Device orientation angles in degrees: `gamma` is left/right roll,
/// `beta` front/back pitch. `range_deg` maps to full deflection.
pub fn gyro_signal(beta_deg: f32, gamma_deg: f32, range_deg: f32) -> TiltSignal {
    if range_deg <= 0.0 {
        return TiltSignal::NEUTRAL;
    }
    TiltSignal::new(gamma_deg / range_deg, beta_deg / range_deg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clamps_each_axis() {
        let s = TiltSignal::new(3.0, -7.5);
        assert_eq!(s, TiltSignal { x: 1.0, y: -1.0 });
    }

    #[test]
    fn non_finite_reads_as_neutral() {
        let s = TiltSignal::new(f32::NAN, f32::INFINITY);
        assert!(s.is_neutral());
    }

    #[test]
    fn mouse_center_is_neutral() {
        let s = mouse_signal([400.0, 300.0], [800.0, 600.0]);
        assert!(s.is_neutral());
    }

    #[test]
    fn mouse_corners_reach_full_deflection() {
        let s = mouse_signal([0.0, 600.0], [800.0, 600.0]);
        assert!((s.x + 1.0).abs() < 1e-6);
        assert!((s.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn mouse_outside_viewport_is_clamped() {
        let s = mouse_signal([2000.0, -50.0], [800.0, 600.0]);
        assert_eq!(s.x, 1.0);
        assert_eq!(s.y, -1.0);
    }

    #[test]
    fn mouse_zero_viewport_is_neutral() {
        assert!(mouse_signal([10.0, 10.0], [0.0, 600.0]).is_neutral());
    }

    #[test]
    fn joystick_is_limited_to_unit_disc() {
        let s = joystick_signal([100.0, 100.0], 50.0);
        let len = (s.x * s.x + s.y * s.y).sqrt();
        assert!((len - 1.0).abs() < 1e-5);
        assert!((s.x - s.y).abs() < 1e-6);
    }

    #[test]
    fn joystick_inside_pad_is_proportional() {
        let s = joystick_signal([25.0, -10.0], 50.0);
        assert!((s.x - 0.5).abs() < 1e-6);
        assert!((s.y + 0.2).abs() < 1e-6);
    }

    #[test]
    fn gyro_maps_degrees_to_signal() {
        let s = gyro_signal(-15.0, 45.0, 30.0);
        assert_eq!(s.x, 1.0);
        assert!((s.y + 0.5).abs() < 1e-6);
    }
}
