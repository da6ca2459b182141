use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info};

use super::InputSnapshot;
use crate::assets::AssetSource;
use crate::collision::CollisionManager;
use crate::content::{Builders, LevelData};
use crate::message::{Message, MessageBus};
use crate::render::Renderer;
use crate::world::{Entity, EntityId, LevelError, LevelManager, SceneContext};

/// The message bus, collision manager and level manager wired into one frame tick.
pub struct Runtime {
    bus: MessageBus,
    collisions: CollisionManager,
    levels: LevelManager,
    asset_sources: Vec<Box<dyn AssetSource>>,
    last_input: InputSnapshot,
    ticks: u64,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("bus", &self.bus)
            .field("collisions", &self.collisions)
            .field("levels", &self.levels)
            .field("asset_sources", &self.asset_sources.len())
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(Builders::with_builtin(), MessageBus::new())
    }
}

impl Runtime {
    pub fn new(builders: Builders, bus: MessageBus) -> Self {
        Self {
            bus,
            collisions: CollisionManager::new(),
            levels: LevelManager::new(builders),
            asset_sources: Vec::new(),
            last_input: InputSnapshot::empty(),
            ticks: 0,
        }
    }

    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut MessageBus {
        &mut self.bus
    }

    pub fn collisions(&self) -> &CollisionManager {
        &self.collisions
    }

    pub fn levels(&self) -> &LevelManager {
        &self.levels
    }

    pub fn levels_mut(&mut self) -> &mut LevelManager {
        &mut self.levels
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn add_asset_source(&mut self, source: Box<dyn AssetSource>) {
        self.asset_sources.push(source);
    }

    pub fn register_level(&mut self, id: u32, path: impl Into<PathBuf>) {
        self.levels.register_level(id, path);
    }

    pub fn change_level(&mut self, id: u32) -> Result<(), LevelError> {
        let mut ctx = SceneContext::new(&mut self.bus, &mut self.collisions, &self.last_input);
        self.levels.change_level(id, &mut ctx)
    }

    pub fn load_level(&mut self, data: &LevelData) -> Result<(), LevelError> {
        let mut ctx = SceneContext::new(&mut self.bus, &mut self.collisions, &self.last_input);
        self.levels.load_level(data, &mut ctx)
    }

    /// Posts into the active level; high-priority deliveries complete before returning.
    pub fn post(&mut self, message: Message) {
        self.bus.post(message, &mut self.levels);
    }

    /// One fixed step: loader and input messages, queued messages, the tree pass, then collisions.
    pub fn tick(&mut self, dt_seconds: f32, input: &InputSnapshot) {
        self.last_input = *input;
        for source in &mut self.asset_sources {
            for asset in source.drain_loaded() {
                debug!(asset = %asset.name, "asset_loaded");
                self.bus.publish(asset.into_message());
            }
        }
        for message in input.mouse_messages() {
            self.bus.publish(message);
        }

        let delivered = self.bus.update(&mut self.levels);
        {
            let mut ctx = SceneContext::new(&mut self.bus, &mut self.collisions, &self.last_input);
            self.levels.update(dt_seconds, &mut ctx);
        }
        self.bus.flush(&mut self.levels);
        self.collisions
            .update(dt_seconds, &mut self.bus, &mut self.levels);

        self.ticks = self.ticks.saturating_add(1);
        debug!(
            tick = self.ticks,
            delivered,
            queued = self.bus.queued_len(),
            active_pairs = self.collisions.active_pair_count(),
            "runtime_tick"
        );
    }

    pub fn render(&self, renderer: &mut dyn Renderer) {
        self.levels.render(renderer);
    }

    /// Takes an entity out of the active level, unloading its subtree.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let level = self.levels.active_level_mut()?;
        let mut ctx = SceneContext::new(&mut self.bus, &mut self.collisions, &self.last_input);
        let removed = level.scene_mut().remove_entity(id, &mut ctx)?;
        debug!(entity = %removed.name(), id = %id, "entity_removed");
        Some(removed)
    }

    pub fn shutdown(&mut self) {
        let mut ctx = SceneContext::new(&mut self.bus, &mut self.collisions, &self.last_input);
        self.levels.unload_active(&mut ctx);
        info!(ticks = self.ticks, "runtime_shutdown");
    }
}
