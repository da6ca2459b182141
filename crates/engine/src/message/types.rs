use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Opaque subscriber handle minted by [`super::MessageBus::allocate_handler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub(crate) u64);

impl HandlerId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MessagePriority {
    /// Queued and delivered by `MessageBus::update`, a bounded number per call.
    #[default]
    Normal,
    /// Delivered before the posting call returns.
    High,
}

/// Identity tag of whoever posted a message. The bus never inspects it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Sender {
    #[default]
    Anonymous,
    System(&'static str),
    Handler(HandlerId),
}

impl From<Option<HandlerId>> for Sender {
    fn from(handler: Option<HandlerId>) -> Self {
        handler.map_or(Sender::Anonymous, Sender::Handler)
    }
}

/// Immutable once built; clones share the context payload.
#[derive(Clone)]
pub struct Message {
    code: String,
    sender: Sender,
    context: Option<Rc<dyn Any>>,
    priority: MessagePriority,
}

impl Message {
    pub fn new(code: impl Into<String>, sender: Sender) -> Self {
        Self {
            code: code.into(),
            sender,
            context: None,
            priority: MessagePriority::Normal,
        }
    }

    pub fn high(code: impl Into<String>, sender: Sender) -> Self {
        Self::new(code, sender).with_priority(MessagePriority::High)
    }

    pub fn with_priority(mut self, priority: MessagePriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_context<T: Any>(self, context: T) -> Self {
        self.with_shared_context(Rc::new(context))
    }

    pub fn with_shared_context(mut self, context: Rc<dyn Any>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn priority(&self) -> MessagePriority {
        self.priority
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// Typed view of the payload; `None` when absent or of another type.
    pub fn context<T: Any>(&self) -> Option<&T> {
        self.context.as_deref().and_then(|ctx| ctx.downcast_ref::<T>())
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("code", &self.code)
            .field("sender", &self.sender)
            .field("priority", &self.priority)
            .field("has_context", &self.context.is_some())
            .finish()
    }
}
