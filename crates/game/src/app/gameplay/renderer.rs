use engine::math::Matrix4;
use engine::render::{Renderer, SpriteDraw, TextDraw};
use tracing::{debug, trace};

/// Headless renderer: counts draw calls and traces them.
#[derive(Debug, Default)]
pub(crate) struct TracingRenderer {
    sprites_drawn: u64,
    texts_drawn: u64,
    last_text: Option<String>,
}

impl TracingRenderer {
    pub(crate) fn sprites_drawn(&self) -> u64 {
        self.sprites_drawn
    }

    pub(crate) fn texts_drawn(&self) -> u64 {
        self.texts_drawn
    }
}

impl Renderer for TracingRenderer {
    fn draw_sprite(&mut self, sprite: &SpriteDraw<'_>, world: &Matrix4) {
        self.sprites_drawn = self.sprites_drawn.saturating_add(1);
        let position = world.translation_part();
        trace!(
            material = sprite.material,
            x = position.x,
            y = position.y,
            u_min = sprite.uv.u_min,
            "draw_sprite"
        );
    }

    fn draw_text(&mut self, text: &TextDraw<'_>, _world: &Matrix4) {
        self.texts_drawn = self.texts_drawn.saturating_add(1);
        // Text rarely changes; only log transitions.
        if self.last_text.as_deref() != Some(text.text) {
            debug!(font = text.font, text = text.text, "draw_text");
            self.last_text = Some(text.text.to_string());
        }
    }
}
