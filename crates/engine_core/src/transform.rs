//! Transform component and utilities for spatial positioning.

use glam::{Mat4, Quat, Vec3};

/// A 3D transform representing position, rotation, and scale.
///
/// Tracking poses are plain transforms with unit scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform at the given position.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a new transform with position and rotation.
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Pure translation in the local frame of whatever it is composed onto.
    pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
        Self::from_position(Vec3::new(x, y, z))
    }

    /// Create the model matrix for this transform.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Compose `local` into this transform's frame (`self * local`).
    ///
    /// The result is expressed in the parent frame of `self`: a local offset of
    /// `-Z` lands in front of a viewer whose pose is `self`.
    pub fn compose(&self, local: &Transform) -> Transform {
        Transform {
            position: self.transform_point(local.position),
            rotation: (self.rotation * local.rotation).normalize(),
            scale: self.scale * local.scale,
        }
    }

    /// Map a point from this transform's local frame into the parent frame.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * (self.scale * point)
    }

    /// Approximate equality, used when comparing poses produced by float math.
    pub fn abs_diff_eq(&self, other: &Transform, max_abs_diff: f32) -> bool {
        self.position.abs_diff_eq(other.position, max_abs_diff)
            && self.scale.abs_diff_eq(other.scale, max_abs_diff)
            && (self.rotation.abs_diff_eq(other.rotation, max_abs_diff)
                || self.rotation.abs_diff_eq(-other.rotation, max_abs_diff))
    }
}
