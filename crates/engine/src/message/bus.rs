use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use tracing::{trace, warn};

use super::{HandlerId, Message, MessagePriority};

pub const DEFAULT_NORMAL_MESSAGES_PER_UPDATE: usize = 10;

/// Owner of message handlers; resolves a [`HandlerId`] to the object behind it.
pub trait MessageSink {
    /// Returns `false` when the handler is not reachable through this sink.
    fn deliver(&mut self, handler: HandlerId, message: &Message, bus: &mut MessageBus) -> bool;
}

#[derive(Debug, Clone)]
struct Delivery {
    message: Rc<Message>,
    handler: HandlerId,
}

/// Routes messages by code to subscribed handlers.
///
/// High-priority messages are delivered synchronously by [`MessageBus::post`].
/// Normal-priority deliveries are queued and drained by [`MessageBus::update`],
/// at most `normal_messages_per_update` per call, in FIFO order.
///
/// Hooks running inside a sink cannot hand that sink back to the bus, so they
/// use [`MessageBus::publish`]: subscribers are resolved immediately and any
/// high-priority deliveries wait for the next `flush`, `post` or `update`.
#[derive(Debug)]
pub struct MessageBus {
    subscriptions: HashMap<String, Vec<HandlerId>>,
    normal_queue: VecDeque<Delivery>,
    pending_high: VecDeque<Delivery>,
    normal_messages_per_update: usize,
    next_handler: u64,
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::with_budget(DEFAULT_NORMAL_MESSAGES_PER_UPDATE)
    }
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budget(normal_messages_per_update: usize) -> Self {
        Self {
            subscriptions: HashMap::new(),
            normal_queue: VecDeque::new(),
            pending_high: VecDeque::new(),
            normal_messages_per_update: normal_messages_per_update.max(1),
            next_handler: 1,
        }
    }

    pub fn normal_messages_per_update(&self) -> usize {
        self.normal_messages_per_update
    }

    pub fn allocate_handler(&mut self) -> HandlerId {
        let id = HandlerId(self.next_handler);
        self.next_handler = self.next_handler.saturating_add(1);
        id
    }

    /// Returns `false` (and warns) when the handler was already subscribed to `code`.
    pub fn subscribe(&mut self, code: impl Into<String>, handler: HandlerId) -> bool {
        let code = code.into();
        let handlers = self.subscriptions.entry(code.clone()).or_default();
        if handlers.contains(&handler) {
            warn!(code = %code, handler = %handler, "duplicate_subscription_ignored");
            return false;
        }
        handlers.push(handler);
        true
    }

    pub fn unsubscribe(&mut self, code: &str, handler: HandlerId) {
        let Some(handlers) = self.subscriptions.get_mut(code) else {
            warn!(code, handler = %handler, "unsubscribe_from_unknown_code");
            return;
        };
        handlers.retain(|existing| *existing != handler);
        if handlers.is_empty() {
            self.subscriptions.remove(code);
        }
    }

    pub fn is_subscribed(&self, code: &str, handler: HandlerId) -> bool {
        self.subscriptions
            .get(code)
            .is_some_and(|handlers| handlers.contains(&handler))
    }

    pub fn subscriber_count(&self, code: &str) -> usize {
        self.subscriptions.get(code).map_or(0, Vec::len)
    }

    pub fn queued_len(&self) -> usize {
        self.normal_queue.len()
    }

    pub fn pending_high_len(&self) -> usize {
        self.pending_high.len()
    }

    /// Posts a message; high-priority deliveries complete before this returns.
    pub fn post<S: MessageSink + ?Sized>(&mut self, message: Message, sink: &mut S) {
        self.publish(message);
        self.flush(sink);
    }

    /// Resolves subscribers now and stages the deliveries without invoking any handler.
    pub fn publish(&mut self, message: Message) {
        let Some(handlers) = self.subscriptions.get(message.code()) else {
            trace!(code = message.code(), "message_without_subscribers");
            return;
        };
        let priority = message.priority();
        let message = Rc::new(message);
        let target = match priority {
            MessagePriority::High => &mut self.pending_high,
            MessagePriority::Normal => &mut self.normal_queue,
        };
        target.extend(handlers.iter().map(|handler| Delivery {
            message: Rc::clone(&message),
            handler: *handler,
        }));
    }

    /// Delivers every staged high-priority message, including ones published while flushing.
    pub fn flush<S: MessageSink + ?Sized>(&mut self, sink: &mut S) -> usize {
        let mut delivered = 0;
        while let Some(delivery) = self.pending_high.pop_front() {
            self.dispatch(delivery, sink);
            delivered += 1;
        }
        delivered
    }

    /// Flushes high-priority work, then drains up to the per-update budget of queued deliveries.
    pub fn update<S: MessageSink + ?Sized>(&mut self, sink: &mut S) -> usize {
        self.flush(sink);
        let limit = self.normal_messages_per_update.min(self.normal_queue.len());
        let mut delivered = 0;
        for _ in 0..limit {
            let Some(delivery) = self.normal_queue.pop_front() else {
                break;
            };
            self.dispatch(delivery, sink);
            delivered += 1;
            self.flush(sink);
        }
        delivered
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
        self.normal_queue.clear();
        self.pending_high.clear();
    }

    fn dispatch<S: MessageSink + ?Sized>(&mut self, delivery: Delivery, sink: &mut S) {
        if !sink.deliver(delivery.handler, &delivery.message, self) {
            trace!(
                code = delivery.message.code(),
                handler = %delivery.handler,
                "handler_unreachable"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::message::Sender;

    #[derive(Default)]
    struct RecordingSink {
        deliveries: Vec<(HandlerId, String)>,
        /// Handler -> message it publishes (and at which priority) when it receives anything.
        reactions: HashMap<HandlerId, Message>,
        unsubscribe_on_delivery: Option<(String, HandlerId)>,
    }

    impl RecordingSink {
        fn count_for(&self, handler: HandlerId) -> usize {
            self.deliveries.iter().filter(|(h, _)| *h == handler).count()
        }
    }

    impl MessageSink for RecordingSink {
        fn deliver(&mut self, handler: HandlerId, message: &Message, bus: &mut MessageBus) -> bool {
            self.deliveries.push((handler, message.code().to_string()));
            if let Some((code, target)) = self.unsubscribe_on_delivery.take() {
                bus.unsubscribe(&code, target);
            }
            if let Some(reaction) = self.reactions.remove(&handler) {
                bus.publish(reaction);
            }
            true
        }
    }

    fn handlers(bus: &mut MessageBus, count: usize) -> Vec<HandlerId> {
        (0..count).map(|_| bus.allocate_handler()).collect()
    }

    #[test]
    fn high_priority_reaches_every_subscriber_before_post_returns() {
        let mut bus = MessageBus::new();
        let ids = handlers(&mut bus, 3);
        for id in &ids {
            bus.subscribe("PING", *id);
        }
        let mut sink = RecordingSink::default();

        bus.post(Message::high("PING", Sender::Anonymous), &mut sink);

        let order: Vec<HandlerId> = sink.deliveries.iter().map(|(h, _)| *h).collect();
        assert_eq!(order, ids);
        assert_eq!(bus.queued_len(), 0);
    }

    #[test]
    fn normal_priority_is_deferred_until_update() {
        let mut bus = MessageBus::new();
        let id = bus.allocate_handler();
        bus.subscribe("PING", id);
        let mut sink = RecordingSink::default();

        bus.post(Message::new("PING", Sender::Anonymous), &mut sink);
        assert!(sink.deliveries.is_empty());
        assert_eq!(bus.queued_len(), 1);

        assert_eq!(bus.update(&mut sink), 1);
        assert_eq!(sink.count_for(id), 1);
    }

    #[test]
    fn normal_deliveries_are_throttled_but_all_arrive_exactly_once() {
        let mut bus = MessageBus::with_budget(10);
        let ids = handlers(&mut bus, 25);
        for id in &ids {
            bus.subscribe("BURST", *id);
        }
        let mut sink = RecordingSink::default();
        bus.post(Message::new("BURST", Sender::Anonymous), &mut sink);

        assert_eq!(bus.update(&mut sink), 10);
        assert_eq!(bus.update(&mut sink), 10);
        assert_eq!(bus.update(&mut sink), 5);
        assert_eq!(bus.update(&mut sink), 0);

        for id in &ids {
            assert_eq!(sink.count_for(*id), 1, "handler {id} delivery count");
        }
    }

    #[test]
    fn duplicate_subscription_delivers_once() {
        let mut bus = MessageBus::new();
        let id = bus.allocate_handler();
        assert!(bus.subscribe("PING", id));
        assert!(!bus.subscribe("PING", id));
        assert_eq!(bus.subscriber_count("PING"), 1);

        let mut sink = RecordingSink::default();
        bus.post(Message::high("PING", Sender::Anonymous), &mut sink);
        bus.post(Message::new("PING", Sender::Anonymous), &mut sink);
        bus.update(&mut sink);

        assert_eq!(sink.count_for(id), 2);
    }

    #[test]
    fn unknown_code_is_ignored() {
        let mut bus = MessageBus::new();
        let mut sink = RecordingSink::default();
        bus.post(Message::high("NOBODY", Sender::Anonymous), &mut sink);
        bus.post(Message::new("NOBODY", Sender::Anonymous), &mut sink);
        assert_eq!(bus.queued_len(), 0);
        assert!(sink.deliveries.is_empty());
    }

    #[test]
    fn unsubscribe_stops_future_delivery_and_tolerates_unknown_codes() {
        let mut bus = MessageBus::new();
        let id = bus.allocate_handler();
        bus.subscribe("PING", id);
        bus.unsubscribe("PING", id);
        bus.unsubscribe("NEVER_SUBSCRIBED", id);
        assert!(!bus.is_subscribed("PING", id));

        let mut sink = RecordingSink::default();
        bus.post(Message::high("PING", Sender::Anonymous), &mut sink);
        assert!(sink.deliveries.is_empty());
    }

    #[test]
    fn unsubscribing_during_dispatch_keeps_the_resolved_delivery_list() {
        let mut bus = MessageBus::new();
        let ids = handlers(&mut bus, 3);
        for id in &ids {
            bus.subscribe("PING", *id);
        }
        let mut sink = RecordingSink {
            unsubscribe_on_delivery: Some(("PING".to_string(), ids[1])),
            ..RecordingSink::default()
        };

        bus.post(Message::high("PING", Sender::Anonymous), &mut sink);
        assert_eq!(sink.deliveries.len(), 3);

        bus.post(Message::high("PING", Sender::Anonymous), &mut sink);
        assert_eq!(sink.count_for(ids[1]), 1);
        assert_eq!(sink.count_for(ids[0]), 2);
        assert_eq!(sink.count_for(ids[2]), 2);
    }

    #[test]
    fn high_priority_published_by_a_handler_completes_within_the_outer_post() {
        let mut bus = MessageBus::new();
        let first = bus.allocate_handler();
        let second = bus.allocate_handler();
        bus.subscribe("FIRST", first);
        bus.subscribe("SECOND", second);
        let mut sink = RecordingSink::default();
        sink.reactions
            .insert(first, Message::high("SECOND", Sender::Handler(first)));

        bus.post(Message::high("FIRST", Sender::Anonymous), &mut sink);

        assert_eq!(sink.count_for(first), 1);
        assert_eq!(sink.count_for(second), 1);
        assert_eq!(bus.pending_high_len(), 0);
    }

    #[test]
    fn published_high_priority_waits_for_flush() {
        let mut bus = MessageBus::new();
        let id = bus.allocate_handler();
        bus.subscribe("PING", id);

        bus.publish(Message::high("PING", Sender::Anonymous));
        assert_eq!(bus.pending_high_len(), 1);

        let mut sink = RecordingSink::default();
        assert_eq!(bus.flush(&mut sink), 1);
        assert_eq!(sink.count_for(id), 1);
    }

    #[test]
    fn budget_is_at_least_one() {
        assert_eq!(MessageBus::with_budget(0).normal_messages_per_update(), 1);
        assert_eq!(
            MessageBus::new().normal_messages_per_update(),
            DEFAULT_NORMAL_MESSAGES_PER_UPDATE
        );
    }
}
