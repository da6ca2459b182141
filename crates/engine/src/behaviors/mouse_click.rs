use std::any::Any;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::Behavior;
use crate::app::{MouseContext, MOUSE_UP};
use crate::content::{parse_record, BuildError};
use crate::message::{HandlerId, Message, MessageBus, Sender};
use crate::world::{Owner, SceneContext, SceneError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MouseClickRecord {
    name: String,
    width: f32,
    height: f32,
    message_code: String,
}

/// Turns a mouse release inside `[owner, owner + (width, height)]` into `message_code`.
#[derive(Debug, Clone)]
pub struct MouseClickBehavior {
    name: String,
    width: f32,
    height: f32,
    message_code: String,
    handler: Option<HandlerId>,
}

impl MouseClickBehavior {
    pub fn new(
        name: impl Into<String>,
        width: f32,
        height: f32,
        message_code: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            message_code: message_code.into(),
            handler: None,
        }
    }
}

impl Behavior for MouseClickBehavior {
    fn name(&self) -> &str {
        &self.name
    }

    fn update_ready(
        &mut self,
        handler: HandlerId,
        _owner: &mut Owner<'_>,
        ctx: &mut SceneContext<'_>,
    ) -> Result<(), SceneError> {
        self.handler = Some(handler);
        ctx.bus.subscribe(MOUSE_UP, handler);
        Ok(())
    }

    fn on_message(&mut self, message: &Message, owner: &mut Owner<'_>, bus: &mut MessageBus) {
        if message.code() != MOUSE_UP || !owner.core.is_visible() {
            return;
        }
        let Some(mouse) = message.context::<MouseContext>() else {
            return;
        };
        let origin = owner.core.world_position();
        let inside = mouse.position.x >= origin.x
            && mouse.position.x <= origin.x + self.width
            && mouse.position.y >= origin.y
            && mouse.position.y <= origin.y + self.height;
        if inside {
            debug!(behavior = %self.name, code = %self.message_code, "click_target_hit");
            bus.publish(Message::new(
                self.message_code.as_str(),
                Sender::from(self.handler),
            ));
        }
    }

    fn unload(&mut self, handler: HandlerId, bus: &mut MessageBus) {
        bus.unsubscribe(MOUSE_UP, handler);
        self.handler = None;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub(super) fn build(record: &Value) -> Result<Box<dyn Behavior>, BuildError> {
    let record: MouseClickRecord = parse_record("mouseClick", record)?;
    Ok(Box::new(MouseClickBehavior::new(
        record.name,
        record.width,
        record.height,
        record.message_code,
    )))
}
