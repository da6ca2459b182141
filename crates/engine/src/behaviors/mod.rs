use std::any::Any;

use crate::content::BehaviorRegistry;
use crate::message::{HandlerId, Message, MessageBus};
use crate::world::{Owner, SceneContext, SceneError};

mod keyboard_movement;
mod mouse_click;
mod player;
mod rotation;
mod scroll;
mod visibility_on_message;

pub use keyboard_movement::KeyboardMovementBehavior;
pub use mouse_click::MouseClickBehavior;
pub use player::{PlayerBehavior, PLAYER_DIED};
pub use rotation::RotationBehavior;
pub use scroll::ScrollBehavior;
pub use visibility_on_message::VisibilityOnMessageBehavior;

/// Gameplay logic attached to one entity. Hooks see the owner through [`Owner`].
pub trait Behavior: Any {
    fn name(&self) -> &str;

    /// Runs once after the whole tree has loaded; sibling lookups resolve here.
    fn update_ready(
        &mut self,
        _handler: HandlerId,
        _owner: &mut Owner<'_>,
        _ctx: &mut SceneContext<'_>,
    ) -> Result<(), SceneError> {
        Ok(())
    }

    fn update(&mut self, _dt_seconds: f32, _owner: &mut Owner<'_>, _ctx: &mut SceneContext<'_>) {}

    fn on_message(&mut self, _message: &Message, _owner: &mut Owner<'_>, _bus: &mut MessageBus) {}

    fn unload(&mut self, _handler: HandlerId, _bus: &mut MessageBus) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub struct BehaviorSlot {
    handler: Option<HandlerId>,
    behavior: Box<dyn Behavior>,
}

impl BehaviorSlot {
    pub fn new(behavior: Box<dyn Behavior>) -> Self {
        Self {
            handler: None,
            behavior,
        }
    }

    pub fn name(&self) -> &str {
        self.behavior.name()
    }

    pub fn handler(&self) -> Option<HandlerId> {
        self.handler
    }

    pub(crate) fn set_handler(&mut self, handler: HandlerId) {
        self.handler = Some(handler);
    }

    pub fn behavior(&self) -> &dyn Behavior {
        self.behavior.as_ref()
    }

    pub fn behavior_mut(&mut self) -> &mut dyn Behavior {
        self.behavior.as_mut()
    }

    pub fn downcast_ref<T: Behavior>(&self) -> Option<&T> {
        self.behavior.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Behavior>(&mut self) -> Option<&mut T> {
        self.behavior.as_any_mut().downcast_mut::<T>()
    }
}

impl std::fmt::Debug for BehaviorSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorSlot")
            .field("name", &self.name())
            .field("handler", &self.handler)
            .finish()
    }
}

pub(crate) fn register_builtin(registry: &mut BehaviorRegistry) {
    registry.register("keyboardMovement", keyboard_movement::build);
    registry.register("mouseClick", mouse_click::build);
    registry.register("scroll", scroll::build);
    registry.register("visibilityOnMessage", visibility_on_message::build);
    registry.register("player", player::build);
    registry.register("rotation", rotation::build);
}
