//! Conversions from the physics core's nalgebra types to Bevy's glam types.

use bevy::prelude::{Quat, Transform, Vec3};
use maze_sim::rapier3d::na::{Isometry3, UnitQuaternion, Vector3};

pub fn to_vec3(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub fn to_quat(q: &UnitQuaternion<f32>) -> Quat {
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

pub fn to_transform(pose: &Isometry3<f32>) -> Transform {
    Transform {
        translation: to_vec3(&pose.translation.vector),
        rotation: to_quat(&pose.rotation),
        scale: Vec3::ONE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_sim::rapier3d::na::Translation3;

    #[test]
    fn rotations_agree() {
        let q = UnitQuaternion::from_euler_angles(0.3, -0.2, 0.7);
        let p = Vector3::new(1.0, 2.0, 3.0);
        let expected = q * p;
        let got = to_quat(&q) * to_vec3(&p);
        assert!((got - to_vec3(&expected)).length() < 1e-5);
    }

    #[test]
    fn pose_maps_translation_and_rotation() {
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.5);
        let pose = Isometry3::from_parts(Translation3::new(4.0, -1.0, 2.5), rotation);
        let t = to_transform(&pose);
        assert_eq!(t.translation, Vec3::new(4.0, -1.0, 2.5));
        assert!(t.rotation.angle_between(Quat::from_rotation_y(0.5)) < 1e-5);
        assert_eq!(t.scale, Vec3::ONE);
    }
}
