use std::any::Any;

use serde::Deserialize;
use serde_json::Value;

use super::Component;
use crate::content::{parse_record, BuildError};
use crate::math::Vec3;
use crate::render::{Renderer, SpriteDraw, UvRect};
use crate::world::EntityCore;

pub(crate) const DEFAULT_SPRITE_SIZE: f32 = 100.0;

fn default_size() -> f32 {
    DEFAULT_SPRITE_SIZE
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpriteRecord {
    name: String,
    material_name: String,
    #[serde(default = "default_size")]
    width: f32,
    #[serde(default = "default_size")]
    height: f32,
    #[serde(default)]
    origin: Vec3,
}

/// Static textured quad drawn at the owner's world matrix.
#[derive(Debug, Clone)]
pub struct SpriteComponent {
    name: String,
    material: String,
    width: f32,
    height: f32,
    origin: Vec3,
}

impl SpriteComponent {
    pub fn new(name: impl Into<String>, material: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            material: material.into(),
            width: DEFAULT_SPRITE_SIZE,
            height: DEFAULT_SPRITE_SIZE,
            origin: Vec3::ZERO,
        }
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_origin(mut self, origin: Vec3) -> Self {
        self.origin = origin;
        self
    }

    pub fn material(&self) -> &str {
        &self.material
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }
}

impl Component for SpriteComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, owner: &EntityCore, renderer: &mut dyn Renderer) {
        renderer.draw_sprite(
            &SpriteDraw {
                material: &self.material,
                width: self.width,
                height: self.height,
                origin: self.origin,
                uv: UvRect::FULL,
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
    let record: SpriteRecord = parse_record("sprite", record)?;
    Ok(Box::new(
        SpriteComponent::new(record.name, record.material_name)
            .with_size(record.width, record.height)
            .with_origin(record.origin),
    ))
}
