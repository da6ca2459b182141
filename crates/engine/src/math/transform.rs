use super::{Matrix4, Vec3};

/// Position, rotation (radians per axis; 2D content rotates about `z`) and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// T * R * S.
    pub fn local_matrix(&self) -> Matrix4 {
        let translation = Matrix4::translation(self.position);
        let rotation = Matrix4::rotation_xyz(self.rotation.x, self.rotation.y, self.rotation.z);
        let scale = Matrix4::scale(self.scale);
        translation.multiply(&rotation).multiply(&scale)
    }
}
