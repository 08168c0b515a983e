//! Transform component
//!
//! Every entity in a level is a root entity, so a single local transform is
//! also its world transform.

use serde::{Serialize, Deserialize};
use crate::math::{Vec3, Mat4, mat4_mul, mat4_rotation, mat4_scale, mat4_translation};

/// Position, euler rotation (degrees) and non-uniform scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    /// Rotation in euler angles (degrees)
    pub rotation: Vec3,
    /// Per-axis scale (death animation frames squash sprites)
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform (origin, no rotation, scale 1)
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    /// Create transform at a position
    pub fn from_position(position: Vec3) -> Self {
        Self { position, ..Self::IDENTITY }
    }

    /// Create transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Vec3) -> Self {
        Self { position, rotation, ..Self::IDENTITY }
    }

    /// translation * rotation * scale
    pub fn to_matrix(&self) -> Mat4 {
        let rs = mat4_mul(&mat4_rotation(self.rotation), &mat4_scale(self.scale));
        mat4_mul(&mat4_translation(self.position), &rs)
    }

    /// Translate by an offset
    pub fn translate(&mut self, offset: Vec3) {
        self.position = self.position + offset;
    }

    /// Turn to face `target` around the vertical axis (sprite billboarding)
    pub fn face_towards(&mut self, target: Vec3) {
        let dir = target - self.position;
        self.rotation.y = crate::math::billboard_yaw(Vec3::new(dir.x, 0.0, dir.z));
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
