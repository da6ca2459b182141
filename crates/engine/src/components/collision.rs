use std::any::Any;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::Component;
use crate::collision::{Collidable, CollidableInfo, CollisionPhase, Shape, ShapeRecord};
use crate::content::{parse_record, BuildError};
use crate::message::HandlerId;
use crate::world::{EntityCore, SceneContext, SceneError};

#[derive(Debug, Deserialize)]
struct CollisionRecord {
    #[serde(default)]
    name: Option<String>,
    shape: ShapeRecord,
}

/// Keeps a shape registered with the collision manager, following the owner's world position.
#[derive(Debug, Clone)]
pub struct CollisionComponent {
    name: String,
    shape: Shape,
    handle: Option<HandlerId>,
    contacts: usize,
}

impl CollisionComponent {
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
            handle: None,
            contacts: 0,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn handle(&self) -> Option<HandlerId> {
        self.handle
    }

    /// Number of collidables currently touching this one.
    pub fn contact_count(&self) -> usize {
        self.contacts
    }
}

impl Component for CollisionComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(
        &mut self,
        handler: HandlerId,
        owner: &EntityCore,
        ctx: &mut SceneContext<'_>,
    ) -> Result<(), SceneError> {
        self.handle = Some(handler);
        self.shape.place_at(owner.world_position().to_vec2());
        ctx.collisions.register(Collidable {
            handle: handler,
            name: self.name.clone(),
            shape: self.shape,
        });
        Ok(())
    }

    fn update(&mut self, _dt_seconds: f32, owner: &EntityCore, ctx: &mut SceneContext<'_>) {
        self.shape.place_at(owner.world_position().to_vec2());
        if let Some(handle) = self.handle {
            ctx.collisions.sync_shape(handle, self.shape);
        }
    }

    fn on_collision(&mut self, phase: CollisionPhase, other: &CollidableInfo) {
        match phase {
            CollisionPhase::Entry => self.contacts += 1,
            CollisionPhase::Exit => self.contacts = self.contacts.saturating_sub(1),
            CollisionPhase::Update => {}
        }
        debug!(component = %self.name, other = %other.name, phase = ?phase, "collision_hook");
    }

    fn unload(&mut self, handler: HandlerId, ctx: &mut SceneContext<'_>) {
        ctx.collisions.unregister(handler);
        self.handle = None;
        self.contacts = 0;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub(super) fn build(record: &Value) -> Result<Box<dyn Component>, BuildError> {
    let record: CollisionRecord = parse_record("collision", record)?;
    let shape = record.shape.into_shape("collision")?;
    Ok(Box::new(CollisionComponent::new(
        record.name.unwrap_or_else(|| "collision".to_string()),
        shape,
    )))
}
