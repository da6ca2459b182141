mod bus;
mod types;

pub use bus::{MessageBus, MessageSink, DEFAULT_NORMAL_MESSAGES_PER_UPDATE};
pub use types::{HandlerId, Message, MessagePriority, Sender};
