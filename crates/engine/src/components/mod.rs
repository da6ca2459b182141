use std::any::Any;

use crate::collision::{CollidableInfo, CollisionPhase};
use crate::content::ComponentRegistry;
use crate::message::{HandlerId, Message, MessageBus};
use crate::render::Renderer;
use crate::world::{EntityCore, SceneContext, SceneError};

mod animated_sprite;
mod bitmap_text;
mod collision;
mod sprite;

pub use animated_sprite::{AnimatedSpriteComponent, DEFAULT_FRAME_TIME_SECONDS};
pub use bitmap_text::BitmapTextComponent;
pub use collision::CollisionComponent;
pub use sprite::SpriteComponent;

/// Visual or physical capability attached to one entity.
///
/// The owner is passed into every hook; components never hold a reference to it.
pub trait Component: Any {
    fn name(&self) -> &str;

    fn load(
        &mut self,
        _handler: HandlerId,
        _owner: &EntityCore,
        _ctx: &mut SceneContext<'_>,
    ) -> Result<(), SceneError> {
        Ok(())
    }

    fn update_ready(
        &mut self,
        _owner: &EntityCore,
        _ctx: &mut SceneContext<'_>,
    ) -> Result<(), SceneError> {
        Ok(())
    }

    fn update(&mut self, _dt_seconds: f32, _owner: &EntityCore, _ctx: &mut SceneContext<'_>) {}

    fn render(&self, _owner: &EntityCore, _renderer: &mut dyn Renderer) {}

    fn on_message(&mut self, _message: &Message, _owner: &EntityCore, _bus: &mut MessageBus) {}

    fn on_collision(&mut self, _phase: CollisionPhase, _other: &CollidableInfo) {}

    fn unload(&mut self, _handler: HandlerId, _ctx: &mut SceneContext<'_>) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A component plus the handler id it receives messages under once loaded.
pub struct ComponentSlot {
    handler: Option<HandlerId>,
    component: Box<dyn Component>,
}

impl ComponentSlot {
    pub fn new(component: Box<dyn Component>) -> Self {
        Self {
            handler: None,
            component,
        }
    }

    pub fn name(&self) -> &str {
        self.component.name()
    }

    pub fn handler(&self) -> Option<HandlerId> {
        self.handler
    }

    pub(crate) fn set_handler(&mut self, handler: HandlerId) {
        self.handler = Some(handler);
    }

    pub fn component(&self) -> &dyn Component {
        self.component.as_ref()
    }

    pub fn component_mut(&mut self) -> &mut dyn Component {
        self.component.as_mut()
    }

    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.component.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.component.as_any_mut().downcast_mut::<T>()
    }
}

impl std::fmt::Debug for ComponentSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentSlot")
            .field("name", &self.name())
            .field("handler", &self.handler)
            .finish()
    }
}

pub(crate) fn register_builtin(registry: &mut ComponentRegistry) {
    registry.register("sprite", sprite::build);
    registry.register("animatedSprite", animated_sprite::build);
    registry.register("collision", collision::build);
    registry.register("bitmapText", bitmap_text::build);
}
