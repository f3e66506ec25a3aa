//! Pose type and orientation error metric

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position and orientation of a rigid body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Pose {
    /// Origin with identity orientation
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    /// Create a new pose
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Distance between the two positions
    pub fn position_error(&self, other: &Pose) -> f32 {
        (self.position - other.position).length()
    }

    /// Angular deviation between the two orientations, see [`quat_error`]
    pub fn orientation_error(&self, other: &Pose) -> f32 {
        quat_error(self.orientation, other.orientation)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Angular deviation between two unit quaternions
///
/// Returns `1 - |dot(a, b)|` after flipping both into the `w >= 0`
/// hemisphere, so `q` and `-q` compare as identical. Results below
/// `f32::EPSILON` (including tiny negatives from rounding) are reported as 0.
pub fn quat_error(a: Quat, b: Quat) -> f32 {
    let a = if a.w < 0.0 { -a } else { a };
    let b = if b.w < 0.0 { -b } else { b };
    let error = 1.0 - a.dot(b).abs();
    if error < f32::EPSILON {
        0.0
    } else {
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_quaternions() {
        let q = Quat::from_rotation_y(0.7);
        assert_eq!(quat_error(q, q), 0.0);
    }

    #[test]
    fn test_sign_ambiguity() {
        let q = Quat::from_rotation_x(1.2);
        assert_eq!(quat_error(q, -q), 0.0);
    }

    #[test]
    fn test_small_rotation_is_small() {
        let a = Quat::IDENTITY;
        let b = Quat::from_rotation_z(0.01);
        let error = quat_error(a, b);
        assert!(error > 0.0);
        assert!(error < 1e-4);
    }

    #[test]
    fn test_large_rotation_exceeds_tolerance() {
        // Half-angle of 60 degrees: 1 - cos(60deg) = 0.5
        let a = Quat::IDENTITY;
        let b = Quat::from_rotation_y(std::f32::consts::FRAC_PI_3 * 2.0);
        let error = quat_error(a, b);
        assert!((error - 0.5).abs() < 1e-4);
        assert!(error > 0.1);
    }

    #[test]
    fn test_symmetric() {
        let a = Quat::from_rotation_x(0.4);
        let b = Quat::from_rotation_y(-0.9);
        assert_eq!(quat_error(a, b), quat_error(b, a));
    }

    #[test]
    fn test_pose_errors() {
        let a = Pose::new(Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY);
        let b = Pose::new(Vec3::new(6.0, 0.0, 0.0), Quat::IDENTITY);
        assert!((a.position_error(&b) - 5.0).abs() < 1e-6);
        assert_eq!(a.orientation_error(&b), 0.0);
        assert_eq!(Pose::default(), Pose::IDENTITY);
    }
}
