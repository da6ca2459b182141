use std::any::Any;

use serde::Deserialize;
use serde_json::Value;

use super::Behavior;
use crate::content::{parse_record, BuildError};
use crate::message::{HandlerId, Message, MessageBus};
use crate::world::{Owner, SceneContext, SceneError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VisibilityOnMessageRecord {
    #[serde(default)]
    name: Option<String>,
    message_code: String,
    visible: bool,
}

#[derive(Debug, Clone)]
pub struct VisibilityOnMessageBehavior {
    name: String,
    message_code: String,
    visible: bool,
}

impl VisibilityOnMessageBehavior {
    pub fn new(name: impl Into<String>, message_code: impl Into<String>, visible: bool) -> Self {
        Self {
            name: name.into(),
            message_code: message_code.into(),
            visible,
        }
    }
}

impl Behavior for VisibilityOnMessageBehavior {
    fn name(&self) -> &str {
        &self.name
    }

    fn update_ready(
        &mut self,
        handler: HandlerId,
        _owner: &mut Owner<'_>,
        ctx: &mut SceneContext<'_>,
    ) -> Result<(), SceneError> {
        ctx.bus.subscribe(self.message_code.as_str(), handler);
        Ok(())
    }

    fn on_message(&mut self, message: &Message, owner: &mut Owner<'_>, _bus: &mut MessageBus) {
        if message.code() == self.message_code {
            owner.core.set_visible(self.visible);
        }
    }

    fn unload(&mut self, handler: HandlerId, bus: &mut MessageBus) {
        bus.unsubscribe(&self.message_code, handler);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub(super) fn build(record: &Value) -> Result<Box<dyn Behavior>, BuildError> {
    let record: VisibilityOnMessageRecord = parse_record("visibilityOnMessage", record)?;
    Ok(Box::new(VisibilityOnMessageBehavior::new(
        record
            .name
            .unwrap_or_else(|| "visibilityOnMessage".to_string()),
        record.message_code,
        record.visible,
    )))
}
