mod matrix4;
mod transform;
mod vector;

pub use matrix4::Matrix4;
pub use transform::Transform;
pub use vector::{Vec2, Vec3};
