use std::any::Any;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::sprite::DEFAULT_SPRITE_SIZE;
use super::Component;
use crate::assets::{asset_loaded_code, AssetKind, AssetLoaded};
use crate::content::{parse_record, BuildError};
use crate::math::Vec3;
use crate::message::{HandlerId, Message, MessageBus};
use crate::render::{Renderer, SpriteDraw, UvRect};
use crate::world::{EntityCore, SceneContext, SceneError};

pub const DEFAULT_FRAME_TIME_SECONDS: f32 = 0.333;

fn default_frame_time() -> f32 {
    DEFAULT_FRAME_TIME_SECONDS
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnimatedSpriteRecord {
    name: String,
    material_name: String,
    #[serde(default)]
    texture_name: Option<String>,
    #[serde(default)]
    width: Option<f32>,
    #[serde(default)]
    height: Option<f32>,
    #[serde(default)]
    origin: Vec3,
    frame_width: f32,
    frame_height: f32,
    frame_count: usize,
    frame_sequence: Vec<usize>,
    #[serde(default = "default_frame_time")]
    frame_time: f32,
}

/// Sprite-sheet animation. Frames are laid out left to right, top to bottom.
///
/// Nothing animates until the texture's asset-loaded notification arrives; the
/// sheet size it carries determines every frame's UVs.
#[derive(Debug, Clone)]
pub struct AnimatedSpriteComponent {
    name: String,
    material: String,
    texture: String,
    width: f32,
    height: f32,
    origin: Vec3,
    frame_width: f32,
    frame_height: f32,
    frame_count: usize,
    frame_sequence: Vec<usize>,
    frame_time: f32,
    frame_uvs: Vec<UvRect>,
    current_frame: usize,
    elapsed: f32,
    texture_loaded: bool,
    playing: bool,
}

impl AnimatedSpriteComponent {
    pub fn new(
        name: impl Into<String>,
        material: impl Into<String>,
        frame_size: (f32, f32),
        frame_count: usize,
        frame_sequence: Vec<usize>,
    ) -> Self {
        let material = material.into();
        Self {
            name: name.into(),
            texture: material.clone(),
            material,
            width: frame_size.0,
            height: frame_size.1,
            origin: Vec3::ZERO,
            frame_width: frame_size.0,
            frame_height: frame_size.1,
            frame_count,
            frame_sequence,
            frame_time: DEFAULT_FRAME_TIME_SECONDS,
            frame_uvs: Vec::new(),
            current_frame: 0,
            elapsed: 0.0,
            texture_loaded: false,
            playing: true,
        }
    }

    pub fn with_texture(mut self, texture: impl Into<String>) -> Self {
        self.texture = texture.into();
        self
    }

    pub fn with_frame_time(mut self, frame_time_seconds: f32) -> Self {
        self.frame_time = frame_time_seconds;
        self
    }

    pub fn texture(&self) -> &str {
        &self.texture
    }

    pub fn is_texture_loaded(&self) -> bool {
        self.texture_loaded
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn set_frame(&mut self, frame: usize) -> Result<(), SceneError> {
        if frame >= self.frame_count {
            return Err(SceneError::FrameOutOfRange {
                component: self.name.clone(),
                frame,
                frame_count: self.frame_count,
            });
        }
        self.current_frame = frame;
        Ok(())
    }

    pub fn frame_uvs(&self) -> &[UvRect] {
        &self.frame_uvs
    }

    /// UVs of the sequence entry currently shown; the whole texture until the sheet is known.
    pub fn current_uv(&self) -> UvRect {
        self.frame_sequence
            .get(self.current_frame)
            .and_then(|frame| self.frame_uvs.get(*frame))
            .copied()
            .unwrap_or(UvRect::FULL)
    }

    pub fn on_texture_loaded(&mut self, sheet_width: u32, sheet_height: u32) {
        let sheet_width = sheet_width.max(1) as f32;
        let sheet_height = sheet_height.max(1) as f32;
        let columns = ((sheet_width / self.frame_width.max(1.0)).floor() as usize).max(1);
        self.frame_uvs = (0..self.frame_count)
            .map(|index| {
                let left = (index % columns) as f32 * self.frame_width;
                let top = (index / columns) as f32 * self.frame_height;
                UvRect {
                    u_min: left / sheet_width,
                    v_min: top / sheet_height,
                    u_max: (left + self.frame_width) / sheet_width,
                    v_max: (top + self.frame_height) / sheet_height,
                }
            })
            .collect();
        self.texture_loaded = true;
        debug!(
            component = %self.name,
            texture = %self.texture,
            frames = self.frame_uvs.len(),
            "animated_sprite_ready"
        );
    }
}

impl Component for AnimatedSpriteComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(
        &mut self,
        handler: HandlerId,
        _owner: &EntityCore,
        ctx: &mut SceneContext<'_>,
    ) -> Result<(), SceneError> {
        ctx.bus.subscribe(asset_loaded_code(&self.texture), handler);
        Ok(())
    }

    fn update(&mut self, dt_seconds: f32, _owner: &EntityCore, _ctx: &mut SceneContext<'_>) {
        if !self.texture_loaded || !self.playing {
            return;
        }
        self.elapsed += dt_seconds;
        if self.elapsed > self.frame_time {
            self.elapsed = 0.0;
            self.current_frame += 1;
            if self.current_frame >= self.frame_sequence.len() {
                self.current_frame = 0;
            }
        }
    }

    fn render(&self, owner: &EntityCore, renderer: &mut dyn Renderer) {
        renderer.draw_sprite(
            &SpriteDraw {
                material: &self.material,
                width: self.width,
                height: self.height,
                origin: self.origin,
                uv: self.current_uv(),
            },
            owner.world_matrix(),
        );
    }

    fn on_message(&mut self, message: &Message, _owner: &EntityCore, _bus: &mut MessageBus) {
        if message.code() != asset_loaded_code(&self.texture) {
            return;
        }
        if let Some(AssetLoaded {
            kind: AssetKind::Image { width, height },
            ..
        }) = message.context::<AssetLoaded>()
        {
            self.on_texture_loaded(*width, *height);
        }
    }

    fn unload(&mut self, handler: HandlerId, ctx: &mut SceneContext<'_>) {
        ctx.bus.unsubscribe(&asset_loaded_code(&self.texture), handler);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub(super) fn build(record: &Value) -> Result<Box<dyn Component>, BuildError> {
    let record: AnimatedSpriteRecord = parse_record("animatedSprite", record)?;
    let mut component = AnimatedSpriteComponent::new(
        record.name,
        record.material_name,
        (record.frame_width, record.frame_height),
        record.frame_count,
        record.frame_sequence,
    )
    .with_frame_time(record.frame_time);
    if let Some(texture) = record.texture_name {
        component = component.with_texture(texture);
    }
    component.width = record.width.unwrap_or(record.frame_width);
    component.height = record.height.unwrap_or(record.frame_height);
    if component.width <= 0.0 {
        component.width = DEFAULT_SPRITE_SIZE;
    }
    if component.height <= 0.0 {
        component.height = DEFAULT_SPRITE_SIZE;
    }
    component.origin = record.origin;
    Ok(Box::new(component))
}
