use tracing::{debug, info, warn};

use super::{Entity, LevelError, Scene, SceneContext, SceneId};
use crate::collision::{CollidableInfo, CollisionPhase, CollisionSink};
use crate::content::{BuildError, Builders, EntityRecord, LevelData};
use crate::message::{HandlerId, Message, MessageBus, MessageSink};
use crate::render::Renderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelState {
    Uninitialized,
    Loading,
    Updating,
    Unloaded,
}

/// One scene plus its lifecycle state. `update` and `render` only run while `Updating`.
#[derive(Debug)]
pub struct Level {
    id: u32,
    name: String,
    description: Option<String>,
    state: LevelState,
    scene: Scene,
}

impl Level {
    pub fn new(id: u32, name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description,
            state: LevelState::Uninitialized,
            scene: Scene::new(SceneId(id)),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn state(&self) -> LevelState {
        self.state
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Builds every entity record before touching the scene, so a failed build
    /// leaves the level empty and `Uninitialized`.
    pub fn initialize(&mut self, data: &LevelData, builders: &Builders) -> Result<(), LevelError> {
        if self.state != LevelState::Uninitialized {
            warn!(level = %self.name, state = ?self.state, "initialize_after_load_ignored");
            return Ok(());
        }
        let entities = data
            .entities
            .iter()
            .map(|record| build_entity(&mut self.scene, record, builders))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| LevelError::Build {
                level: self.name.clone(),
                source,
            })?;
        for entity in entities {
            self.scene.add_entity(entity);
        }
        debug!(
            level = %self.name,
            entities = self.scene.entity_count(),
            "level_initialized"
        );
        Ok(())
    }

    /// `Uninitialized -> Loading -> Updating`. A failure leaves the level in `Loading`.
    pub fn load(&mut self, ctx: &mut SceneContext<'_>) -> Result<(), LevelError> {
        if self.state != LevelState::Uninitialized {
            warn!(level = %self.name, state = ?self.state, "level_load_ignored");
            return Ok(());
        }
        self.state = LevelState::Loading;
        let loaded = self
            .scene
            .load(ctx)
            .and_then(|()| self.scene.update_ready(ctx));
        if let Err(source) = loaded {
            return Err(LevelError::Scene {
                level: self.name.clone(),
                source,
            });
        }
        self.state = LevelState::Updating;
        info!(level = %self.name, id = self.id, "level_loaded");
        Ok(())
    }

    pub fn update(&mut self, dt_seconds: f32, ctx: &mut SceneContext<'_>) {
        if self.state == LevelState::Updating {
            self.scene.update(dt_seconds, ctx);
        }
    }

    pub fn render(&self, renderer: &mut dyn Renderer) {
        if self.state == LevelState::Updating {
            self.scene.render(renderer);
        }
    }

    pub fn unload(&mut self, ctx: &mut SceneContext<'_>) {
        if self.state == LevelState::Unloaded {
            return;
        }
        self.scene.unload(ctx);
        self.state = LevelState::Unloaded;
        info!(level = %self.name, id = self.id, "level_unloaded");
    }
}

fn build_entity(
    scene: &mut Scene,
    record: &EntityRecord,
    builders: &Builders,
) -> Result<Entity, BuildError> {
    let mut entity = scene.create_entity(record.name.clone().unwrap_or_default());
    if let Some(transform) = &record.transform {
        *entity.transform_mut() = transform.to_transform();
    }
    for component in &record.components {
        entity.add_component(builders.components.build(component)?);
    }
    for behavior in &record.behaviors {
        entity.add_behavior(builders.behaviors.build(behavior)?);
    }
    for child in &record.children {
        let child = build_entity(scene, child, builders)?;
        entity.add_child(child);
    }
    Ok(entity)
}

impl MessageSink for Level {
    fn deliver(&mut self, handler: HandlerId, message: &Message, bus: &mut MessageBus) -> bool {
        self.scene.deliver(handler, message, bus)
    }
}

impl CollisionSink for Level {
    fn on_collision(
        &mut self,
        phase: CollisionPhase,
        this: HandlerId,
        other: &CollidableInfo,
    ) -> bool {
        self.scene.on_collision(phase, this, other)
    }
}
