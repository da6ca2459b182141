use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use super::{Level, LevelError, SceneContext};
use crate::collision::{CollidableInfo, CollisionPhase, CollisionSink};
use crate::content::{Builders, LevelData};
use crate::message::{HandlerId, Message, MessageBus, MessageSink, Sender};
use crate::render::Renderer;

/// Published (normal priority) once a level finished loading.
pub const GAME_READY: &str = "GAME_READY";

/// Registry of level files by id and owner of the single active level.
#[derive(Debug)]
pub struct LevelManager {
    builders: Builders,
    registered: BTreeMap<u32, PathBuf>,
    active: Option<Level>,
}

impl Default for LevelManager {
    fn default() -> Self {
        Self::new(Builders::with_builtin())
    }
}

impl LevelManager {
    pub fn new(builders: Builders) -> Self {
        Self {
            builders,
            registered: BTreeMap::new(),
            active: None,
        }
    }

    pub fn builders(&self) -> &Builders {
        &self.builders
    }

    pub fn register_level(&mut self, id: u32, path: impl Into<PathBuf>) {
        let path = path.into();
        if let Some(previous) = self.registered.insert(id, path.clone()) {
            warn!(
                id,
                previous = %previous.display(),
                path = %path.display(),
                "level_registration_replaced"
            );
        }
    }

    pub fn active_level(&self) -> Option<&Level> {
        self.active.as_ref()
    }

    pub fn active_level_mut(&mut self) -> Option<&mut Level> {
        self.active.as_mut()
    }

    /// Unloads the active level, then reads, builds and loads level `id`.
    pub fn change_level(&mut self, id: u32, ctx: &mut SceneContext<'_>) -> Result<(), LevelError> {
        let path = self
            .registered
            .get(&id)
            .cloned()
            .ok_or(LevelError::UnknownLevel { id })?;
        self.unload_active(ctx);

        let raw = fs::read_to_string(&path).map_err(|source| LevelError::Read {
            path: path.clone(),
            source,
        })?;
        let data = LevelData::from_json_str(&raw).map_err(|source| LevelError::Parse {
            path: path.clone(),
            source,
        })?;
        info!(id, path = %path.display(), "level_file_read");
        self.load_level(&data, ctx)
    }

    /// A level that fails to load stays active in `Loading`, so it never updates.
    pub fn load_level(&mut self, data: &LevelData, ctx: &mut SceneContext<'_>) -> Result<(), LevelError> {
        self.unload_active(ctx);

        let mut level = Level::new(data.id, &data.name, data.description.clone());
        level.initialize(data, &self.builders)?;
        info!(
            id = level.id(),
            level = %level.name(),
            entities = level.scene().entity_count(),
            "level_activated"
        );
        let level = self.active.insert(level);
        level.load(ctx)?;

        ctx.bus
            .publish(Message::new(GAME_READY, Sender::System("level_manager")));
        Ok(())
    }

    pub fn unload_active(&mut self, ctx: &mut SceneContext<'_>) {
        if let Some(mut level) = self.active.take() {
            info!(id = level.id(), level = %level.name(), "level_deactivated");
            level.unload(ctx);
        }
    }

    pub fn update(&mut self, dt_seconds: f32, ctx: &mut SceneContext<'_>) {
        if let Some(level) = &mut self.active {
            level.update(dt_seconds, ctx);
        }
    }

    pub fn render(&self, renderer: &mut dyn Renderer) {
        if let Some(level) = &self.active {
            level.render(renderer);
        }
    }
}

impl MessageSink for LevelManager {
    fn deliver(&mut self, handler: HandlerId, message: &Message, bus: &mut MessageBus) -> bool {
        self.active
            .as_mut()
            .is_some_and(|level| level.deliver(handler, message, bus))
    }
}

impl CollisionSink for LevelManager {
    fn on_collision(
        &mut self,
        phase: CollisionPhase,
        this: HandlerId,
        other: &CollidableInfo,
    ) -> bool {
        self.active
            .as_mut()
            .is_some_and(|level| level.on_collision(phase, this, other))
    }
}
