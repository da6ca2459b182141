use tracing::trace;

use crate::math::{Matrix4, Vec3};

/// Texture-space rectangle in `[0, 1]` coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub u_min: f32,
    pub v_min: f32,
    pub u_max: f32,
    pub v_max: f32,
}

impl UvRect {
    pub const FULL: UvRect = UvRect {
        u_min: 0.0,
        v_min: 0.0,
        u_max: 1.0,
        v_max: 1.0,
    };
}

impl Default for UvRect {
    fn default() -> Self {
        Self::FULL
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteDraw<'a> {
    pub material: &'a str,
    pub width: f32,
    pub height: f32,
    /// Pivot as a fraction of the sprite size.
    pub origin: Vec3,
    pub uv: UvRect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextDraw<'a> {
    pub font: &'a str,
    pub text: &'a str,
    pub origin: Vec3,
}

/// Drawing boundary. The scene forwards draw requests with the owner's world matrix.
pub trait Renderer {
    fn draw_sprite(&mut self, sprite: &SpriteDraw<'_>, world: &Matrix4);
    fn draw_text(&mut self, text: &TextDraw<'_>, world: &Matrix4);
}

#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw_sprite(&mut self, sprite: &SpriteDraw<'_>, _world: &Matrix4) {
        trace!(material = sprite.material, "null_draw_sprite");
    }

    fn draw_text(&mut self, text: &TextDraw<'_>, _world: &Matrix4) {
        trace!(font = text.font, "null_draw_text");
    }
}
