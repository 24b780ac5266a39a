//! Rotation helpers on top of nalgebra.
//!
//! Euler angles follow the XYZ convention used by the level files: the
//! orientation is `Rx(x) * Ry(y) * Rz(z)`.

use rapier3d::na::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};

pub fn vec3(v: [f32; 3]) -> Vector3<f32> {
    Vector3::new(v[0], v[1], v[2])
}

pub fn point3(v: [f32; 3]) -> Point3<f32> {
    Point3::new(v[0], v[1], v[2])
}

pub fn quat_from_euler_xyz(x: f32, y: f32, z: f32) -> UnitQuaternion<f32> {
    let rx = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), x);
    let ry = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), y);
    let rz = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), z);
    rx * ry * rz
}

/// Inverse of [`quat_from_euler_xyz`] for `|y| < PI/2`.
pub fn euler_xyz_from_quat(q: &UnitQuaternion<f32>) -> [f32; 3] {
    let rot = q.to_rotation_matrix();
    let m = rot.matrix();
    let m13 = m[(0, 2)].clamp(-1.0, 1.0);
    let y = m13.asin();
    if m13.abs() < 0.999_999_9 {
        let x = (-m[(1, 2)]).atan2(m[(2, 2)]);
        let z = (-m[(0, 1)]).atan2(m[(0, 0)]);
        [x, y, z]
    } else {
        // Gimbal lock: fold Z into X.
        let x = m[(2, 1)].atan2(m[(1, 1)]);
        [x, y, 0.0]
    }
}

pub fn isometry(translation: Vector3<f32>, rotation: UnitQuaternion<f32>) -> Isometry3<f32> {
    Isometry3::from_parts(Translation3::from(translation), rotation)
}

/// Pose of something fixed to the maze frame: the reference offset is rotated
/// by the maze orientation, the maze translation is not applied.
pub fn rotate_about_origin(
    maze_rotation: &UnitQuaternion<f32>,
    reference_position: &Vector3<f32>,
    reference_rotation: &UnitQuaternion<f32>,
) -> Isometry3<f32> {
    isometry(
        maze_rotation * reference_position,
        maze_rotation * reference_rotation,
    )
}

/// Rescale `v` to at most `max_len`, keeping its direction.
pub fn clamp_length(v: Vector3<f32>, max_len: f32) -> Vector3<f32> {
    let len = v.norm();
    if len > max_len && len > 0.0 {
        v * (max_len / len)
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn euler_roundtrip_for_tilt_range() {
        for (x, y, z) in [
            (0.0, 0.0, 0.0),
            (0.3, 0.0, -0.2),
            (-0.35, 1.2, 0.35),
            (0.1, -0.7, 0.05),
        ] {
            let q = quat_from_euler_xyz(x, y, z);
            let [rx, ry, rz] = euler_xyz_from_quat(&q);
            assert!((rx - x).abs() < 1e-5, "x: {rx} vs {x}");
            assert!((ry - y).abs() < 1e-5, "y: {ry} vs {y}");
            assert!((rz - z).abs() < 1e-5, "z: {rz} vs {z}");
        }
    }

    #[test]
    fn euler_order_is_x_then_y_then_z() {
        let q = quat_from_euler_xyz(0.4, 0.5, 0.6);
        let expected = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.4)
            * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.5)
            * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.6);
        assert!(q.angle_to(&expected) < 1e-5);
    }

    #[test]
    fn gimbal_lock_does_not_produce_nan() {
        let q = quat_from_euler_xyz(0.2, FRAC_PI_2, 0.1);
        let e = euler_xyz_from_quat(&q);
        assert!(e.iter().all(|c| c.is_finite()));
        assert!((e[1] - FRAC_PI_2).abs() < 1e-3);
    }

    #[test]
    fn rotate_about_origin_preserves_distance() {
        let maze = quat_from_euler_xyz(0.3, 0.8, -0.25);
        let offset = Vector3::new(0.0, 3.0, -14.0);
        let pose = rotate_about_origin(&maze, &offset, &UnitQuaternion::identity());
        assert!((pose.translation.vector.norm() - offset.norm()).abs() < 1e-4);
    }

    #[test]
    fn rotate_about_origin_applies_maze_first() {
        let maze = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.3);
        let reference = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2);
        let pose = rotate_about_origin(&maze, &Vector3::zeros(), &reference);
        // Reference maps +Y to +Z; the maze roll about Z leaves +Z alone.
        let normal = pose.rotation * Vector3::y();
        assert!((normal - Vector3::z()).norm() < 1e-5);
    }

    #[test]
    fn clamp_length_keeps_direction() {
        let v = Vector3::new(3.0, -4.0, 12.0);
        let max = v.norm() / 2.0;
        let clamped = clamp_length(v, max);
        assert!((clamped.norm() - max).abs() < 1e-4);
        assert!((clamped.normalize().dot(&v.normalize()) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn clamp_length_leaves_slow_vectors() {
        let v = Vector3::new(0.1, 0.2, 0.3);
        assert_eq!(clamp_length(v, 5.0), v);
    }
}
