use std::any::Any;

use engine::behaviors::Behavior;
use engine::content::parse_record;
use engine::world::{Owner, SceneContext};
use engine::{BuildError, HandlerId, Message, MessageBus, SceneError};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

pub(crate) const GAME_EVENT_LOG_TYPE: &str = "gameEventLog";

#[derive(Debug, Deserialize)]
struct GameEventLogRecord {
    name: String,
    messages: Vec<String>,
}

/// Logs every listed message at info level and keeps the codes seen, in order.
#[derive(Debug, Clone)]
pub(crate) struct GameEventLogBehavior {
    name: String,
    messages: Vec<String>,
    seen: Vec<String>,
}

impl GameEventLogBehavior {
    pub(crate) fn new(name: impl Into<String>, messages: Vec<String>) -> Self {
        Self {
            name: name.into(),
            messages,
            seen: Vec::new(),
        }
    }

    pub(crate) fn seen(&self) -> &[String] {
        &self.seen
    }
}

impl Behavior for GameEventLogBehavior {
    fn name(&self) -> &str {
        &self.name
    }

    fn update_ready(
        &mut self,
        handler: HandlerId,
        _owner: &mut Owner<'_>,
        ctx: &mut SceneContext<'_>,
    ) -> Result<(), SceneError> {
        for code in &self.messages {
            ctx.bus.subscribe(code.as_str(), handler);
        }
        Ok(())
    }

    fn on_message(&mut self, message: &Message, _owner: &mut Owner<'_>, _bus: &mut MessageBus) {
        info!(
            code = message.code(),
            sender = ?message.sender(),
            "game_event"
        );
        self.seen.push(message.code().to_string());
    }

    fn unload(&mut self, handler: HandlerId, bus: &mut MessageBus) {
        for code in &self.messages {
            bus.unsubscribe(code, handler);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub(crate) fn build(record: &Value) -> Result<Box<dyn Behavior>, BuildError> {
    let record: GameEventLogRecord = parse_record(GAME_EVENT_LOG_TYPE, record)?;
    Ok(Box::new(GameEventLogBehavior::new(record.name, record.messages)))
}
