use std::any::Any;

use serde::Deserialize;
use serde_json::Value;

use super::Component;
use crate::content::{parse_record, BuildError};
use crate::math::Vec3;
use crate::render::{Renderer, TextDraw};
use crate::world::EntityCore;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BitmapTextRecord {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    font_name: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    origin: Vec3,
}

#[derive(Debug, Clone)]
pub struct BitmapTextComponent {
    name: String,
    font: String,
    text: String,
    origin: Vec3,
}

impl BitmapTextComponent {
    pub fn new(name: impl Into<String>, font: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            font: font.into(),
            text: text.into(),
            origin: Vec3::ZERO,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn font(&self) -> &str {
        &self.font
    }
}

impl Component for BitmapTextComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, owner: &EntityCore, renderer: &mut dyn Renderer) {
        renderer.draw_text(
            &TextDraw {
                font: &self.font,
                text: &self.text,
                origin: self.origin,
            },
            owner.world_matrix(),
        );
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub(super) fn build(record: &Value) -> Result<Box<dyn Component>, BuildError> {
    let record: BitmapTextRecord = parse_record("bitmapText", record)?;
    let mut component = BitmapTextComponent::new(
        record.name.unwrap_or_else(|| "bitmapText".to_string()),
        record.font_name.unwrap_or_default(),
        record.text.unwrap_or_default(),
    );
    component.origin = record.origin;
    Ok(Box::new(component))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::app::InputSnapshot;
    use crate::collision::CollisionManager;
    use crate::math::{Matrix4, Transform};
    use crate::message::MessageBus;
    use crate::render::SpriteDraw;
    use crate::world::{Entity, EntityId, SceneContext};

    #[derive(Default)]
    struct TextRecorder {
        texts: Vec<(String, String, Vec3, Vec3)>,
    }

    impl Renderer for TextRecorder {
        fn draw_sprite(&mut self, _sprite: &SpriteDraw<'_>, _world: &Matrix4) {}

        fn draw_text(&mut self, text: &TextDraw<'_>, world: &Matrix4) {
            self.texts.push((
                text.font.to_string(),
                text.text.to_string(),
                text.origin,
                world.translation_part(),
            ));
        }
    }

    #[test]
    fn builder_fills_in_name_font_and_text_defaults() {
        let text = build(&json!({ "type": "bitmapText" })).expect("bitmap text");
        let text = text
            .as_any()
            .downcast_ref::<BitmapTextComponent>()
            .expect("bitmap text type");
        assert_eq!(text.name(), "bitmapText");
        assert_eq!(text.font(), "");
        assert_eq!(text.text(), "");
        assert_eq!(text.origin, Vec3::ZERO);
    }

    #[test]
    fn renders_one_text_at_the_owner_world_matrix() {
        let mut bus = MessageBus::new();
        let mut collisions = CollisionManager::new();
        let input = InputSnapshot::empty();
        let mut entity = Entity::new(EntityId(1), "title").with_transform(Transform {
            position: Vec3::new(40.0, 12.0, 0.0),
            ..Transform::default()
        });
        let component = build(&json!({
            "type": "bitmapText",
            "name": "titleText",
            "fontName": "skyhopFont",
            "text": "SKYHOP",
            "origin": { "x": 0.5 }
        }))
        .expect("bitmap text");
        entity.add_component(component);
        entity.update(0.0, None, &mut SceneContext::new(&mut bus, &mut collisions, &input));

        let mut recorder = TextRecorder::default();
        entity.render(&mut recorder);

        assert_eq!(
            recorder.texts,
            vec![(
                "skyhopFont".to_string(),
                "SKYHOP".to_string(),
                Vec3::new(0.5, 0.0, 0.0),
                Vec3::new(40.0, 12.0, 0.0),
            )]
        );
    }
}
