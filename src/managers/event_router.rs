//! Event routing and inter-window messaging
//!
//! Raw input goes to global listeners first, then to the target window's own
//! listeners and `handle_event`. Windows talk to each other by id through
//! four bounded priority queues, drained once per frame in strict priority
//! order (FIFO within a tier).

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use casement_core::{InputEvent, Payload, WindowHandle, WindowRegistry, WindowState};

/// Message priority tier, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum MessagePriority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl MessagePriority {
    /// All tiers in delivery order
    pub const DELIVERY_ORDER: [MessagePriority; 4] = [
        MessagePriority::Critical,
        MessagePriority::High,
        MessagePriority::Normal,
        MessagePriority::Low,
    ];

    fn queue_index(self) -> usize {
        match self {
            MessagePriority::Critical => 0,
            MessagePriority::High => 1,
            MessagePriority::Normal => 2,
            MessagePriority::Low => 3,
        }
    }
}

impl fmt::Display for MessagePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessagePriority::Low => "low",
            MessagePriority::Normal => "normal",
            MessagePriority::High => "high",
            MessagePriority::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// A queued message between two windows
#[derive(Debug, Clone, PartialEq)]
pub struct WindowMessage {
    pub sender_id: String,
    pub receiver_id: String,
    pub message_type: String,
    pub payload: Payload,
    pub priority: MessagePriority,
    pub timestamp: Instant,
}

/// Global input listener. Returning `true` stops further routing.
pub type GlobalListener = Box<dyn FnMut(&InputEvent) -> bool>;

/// Routing and delivery counters
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RouterStats {
    /// Messages accepted into a queue
    pub sent: u64,
    /// Messages handed to a receiver without error
    pub delivered: u64,
    /// Messages dropped because the receiver was missing, not shown or deaf
    pub failed_deliveries: u64,
    /// Messages refused because their queue was full
    pub rejected_full: u64,
    /// Receiver hooks that returned an error
    pub handler_errors: u64,
    /// Input events routed
    pub events_routed: u64,
    /// Input events consumed by a listener or window
    pub events_consumed: u64,
}

/// Dispatches input events and carries prioritized messages between windows
pub struct EventRouter {
    global_listeners: Vec<GlobalListener>,
    queues: [VecDeque<WindowMessage>; 4],
    max_queue_size: usize,
    stats: RouterStats,
}

impl fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRouter")
            .field("global_listeners", &self.global_listeners.len())
            .field("queued", &self.queued_count())
            .field("max_queue_size", &self.max_queue_size)
            .field("stats", &self.stats)
            .finish()
    }
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl EventRouter {
    /// Create a router whose priority queues hold at most `max_queue_size` each
    pub fn new(max_queue_size: usize) -> Self {
        Self {
            global_listeners: Vec::new(),
            queues: Default::default(),
            max_queue_size,
            stats: RouterStats::default(),
        }
    }

    pub fn add_global_listener(&mut self, listener: GlobalListener) {
        self.global_listeners.push(listener);
    }

    pub fn global_listener_count(&self) -> usize {
        self.global_listeners.len()
    }

    // === Input ===

    /// Route one input event
    ///
    /// Global listeners run first and may short-circuit. A target window only
    /// sees the event while shown and accepting input: its listeners run
    /// before its `handle_event`. Returns `true` if anything consumed it.
    pub fn route_event(
        &mut self,
        event: &InputEvent,
        target: Option<WindowHandle>,
        windows: &mut WindowRegistry,
    ) -> bool {
        self.stats.events_routed += 1;

        if self.global_listeners.iter_mut().any(|listener| listener(event)) {
            self.stats.events_consumed += 1;
            return true;
        }

        let Some(window) = target.and_then(|handle| windows.get_mut(handle)) else {
            return false;
        };
        if window.state() != WindowState::Shown || !window.is_input_enabled() {
            return false;
        }

        let consumed = window.dispatch_listeners(event) || window.handle_event(event);
        if consumed {
            self.stats.events_consumed += 1;
        }
        consumed
    }

    // === Messaging ===

    /// Queue a message for `receiver_id`
    ///
    /// Returns `false` when the priority's queue is full; nothing already
    /// queued is evicted.
    pub fn send_message(
        &mut self,
        sender_id: &str,
        receiver_id: &str,
        message_type: &str,
        payload: Payload,
        priority: MessagePriority,
    ) -> bool {
        let queue = &mut self.queues[priority.queue_index()];
        if queue.len() >= self.max_queue_size {
            self.stats.rejected_full += 1;
            log::warn!(
                "{} message queue full ({}), dropping '{}' from '{}' to '{}'",
                priority,
                self.max_queue_size,
                message_type,
                sender_id,
                receiver_id
            );
            return false;
        }

        queue.push_back(WindowMessage {
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            message_type: message_type.to_string(),
            payload,
            priority,
            timestamp: Instant::now(),
        });
        self.stats.sent += 1;
        true
    }

    /// Queue one copy of a message for every recipient except the sender
    ///
    /// Returns how many copies were actually queued.
    pub fn broadcast_message<'a>(
        &mut self,
        sender_id: &str,
        recipients: impl IntoIterator<Item = &'a str>,
        message_type: &str,
        payload: &Payload,
        priority: MessagePriority,
    ) -> usize {
        recipients
            .into_iter()
            .filter(|id| *id != sender_id)
            .filter(|id| self.send_message(sender_id, id, message_type, payload.clone(), priority))
            .count()
    }

    /// Deliver every queued message, highest priority first
    ///
    /// A message whose receiver is missing, not shown or has no message hook
    /// is dropped and counted as a failed delivery. Receiver errors are
    /// logged and counted. Returns the number of messages processed.
    pub fn process_message_queue(&mut self, windows: &mut WindowRegistry) -> usize {
        let mut processed = 0;

        for priority in MessagePriority::DELIVERY_ORDER {
            while let Some(message) = self.queues[priority.queue_index()].pop_front() {
                processed += 1;
                self.deliver(message, windows);
            }
        }

        processed
    }

    fn deliver(&mut self, message: WindowMessage, windows: &mut WindowRegistry) {
        let receiver = windows
            .find(&message.receiver_id)
            .and_then(|handle| windows.get_mut(handle))
            .filter(|window| window.state() == WindowState::Shown);

        let Some(receiver) = receiver else {
            self.stats.failed_deliveries += 1;
            log::debug!(
                "Dropping '{}' from '{}': receiver '{}' missing or not shown",
                message.message_type,
                message.sender_id,
                message.receiver_id
            );
            return;
        };

        match receiver.receive_message(&message.sender_id, &message.message_type, &message.payload) {
            Some(Ok(())) => self.stats.delivered += 1,
            Some(Err(e)) => {
                self.stats.handler_errors += 1;
                log::error!(
                    "Window '{}' failed to handle '{}' from '{}': {:#}",
                    message.receiver_id,
                    message.message_type,
                    message.sender_id,
                    e
                );
            }
            None => {
                self.stats.failed_deliveries += 1;
                log::debug!(
                    "Dropping '{}': window '{}' does not receive messages",
                    message.message_type,
                    message.receiver_id
                );
            }
        }
    }

    /// Number of messages waiting in one tier
    pub fn queue_len(&self, priority: MessagePriority) -> usize {
        self.queues[priority.queue_index()].len()
    }

    /// Number of messages waiting across all tiers
    pub fn queued_count(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }

    /// Drop every queued message without delivering it
    pub fn clear_queues(&mut self) -> usize {
        let dropped = self.queued_count();
        for queue in &mut self.queues {
            queue.clear();
        }
        dropped
    }

    pub fn max_queue_size(&self) -> usize {
        self.max_queue_size
    }

    pub fn stats(&self) -> RouterStats {
        self.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casement_core::{MessageReceiver, Window, WindowArgs, WindowBehavior, WindowClass};

    #[derive(Default)]
    struct Inbox {
        received: Vec<String>,
        fail_on: Option<String>,
        consume_keys: bool,
    }

    impl WindowBehavior for Inbox {
        fn create(&mut self) {}
        fn has_visuals(&self) -> bool {
            false
        }
        fn handle_event(&mut self, _event: &InputEvent) -> bool {
            self.consume_keys
        }
        fn as_receiver(&mut self) -> Option<&mut dyn MessageReceiver> {
            Some(self)
        }
    }

    impl MessageReceiver for Inbox {
        fn receive_message(&mut self, sender: &str, message_type: &str, _payload: &Payload) -> anyhow::Result<()> {
            if self.fail_on.as_deref() == Some(message_type) {
                anyhow::bail!("cannot handle {message_type}");
            }
            self.received.push(format!("{sender}:{message_type}"));
            Ok(())
        }
    }

    impl WindowClass for Inbox {
        fn construct(_args: &WindowArgs) -> Self {
            Inbox::default()
        }
    }

    fn shown(registry: &mut WindowRegistry, id: &str) -> WindowHandle {
        let mut window = Window::new::<Inbox>(id, &WindowArgs::new());
        window.show().unwrap();
        registry.insert(window).unwrap()
    }

    fn inbox(registry: &WindowRegistry, handle: WindowHandle) -> Vec<String> {
        registry.get(handle).unwrap().behavior::<Inbox>().unwrap().received.clone()
    }

    // === Messaging ===

    #[test]
    fn test_priority_order() {
        let mut registry = WindowRegistry::new();
        let rx = shown(&mut registry, "rx");
        let mut router = EventRouter::default();

        router.send_message("tx", "rx", "low", Payload::new(), MessagePriority::Low);
        router.send_message("tx", "rx", "critical", Payload::new(), MessagePriority::Critical);
        router.send_message("tx", "rx", "normal", Payload::new(), MessagePriority::Normal);
        router.send_message("tx", "rx", "high", Payload::new(), MessagePriority::High);

        assert_eq!(router.process_message_queue(&mut registry), 4);
        assert_eq!(
            inbox(&registry, rx),
            vec!["tx:critical", "tx:high", "tx:normal", "tx:low"]
        );
        assert_eq!(router.queued_count(), 0);
    }

    #[test]
    fn test_fifo_within_tier() {
        let mut registry = WindowRegistry::new();
        let rx = shown(&mut registry, "rx");
        let mut router = EventRouter::default();

        for i in 0..5 {
            router.send_message("tx", "rx", &format!("m{i}"), Payload::new(), MessagePriority::Normal);
        }
        router.process_message_queue(&mut registry);
        assert_eq!(inbox(&registry, rx), vec!["tx:m0", "tx:m1", "tx:m2", "tx:m3", "tx:m4"]);
    }

    #[test]
    fn test_full_queue_rejects_new_messages() {
        let mut registry = WindowRegistry::new();
        let rx = shown(&mut registry, "rx");
        let mut router = EventRouter::new(2);

        assert!(router.send_message("tx", "rx", "first", Payload::new(), MessagePriority::Low));
        assert!(router.send_message("tx", "rx", "second", Payload::new(), MessagePriority::Low));
        assert!(!router.send_message("tx", "rx", "third", Payload::new(), MessagePriority::Low));
        // Other tiers are independent
        assert!(router.send_message("tx", "rx", "urgent", Payload::new(), MessagePriority::High));

        assert_eq!(router.stats().rejected_full, 1);
        router.process_message_queue(&mut registry);
        assert_eq!(inbox(&registry, rx), vec!["tx:urgent", "tx:first", "tx:second"]);
    }

    #[test]
    fn test_unknown_receiver_is_failed_delivery() {
        let mut registry = WindowRegistry::new();
        let mut router = EventRouter::default();

        router.send_message("tx", "ghost", "hello", Payload::new(), MessagePriority::Normal);
        assert_eq!(router.process_message_queue(&mut registry), 1);
        let stats = router.stats();
        assert_eq!(stats.failed_deliveries, 1);
        assert_eq!(stats.delivered, 0);
    }

    #[test]
    fn test_hidden_receiver_drops_message() {
        let mut registry = WindowRegistry::new();
        let rx = shown(&mut registry, "rx");
        registry.get_mut(rx).unwrap().hide().unwrap();
        let mut router = EventRouter::default();

        router.send_message("tx", "rx", "hello", Payload::new(), MessagePriority::Normal);
        router.process_message_queue(&mut registry);
        assert!(inbox(&registry, rx).is_empty());
        assert_eq!(router.stats().failed_deliveries, 1);

        // No retry on the next frame
        registry.get_mut(rx).unwrap().show().unwrap();
        assert_eq!(router.process_message_queue(&mut registry), 0);
    }

    #[test]
    fn test_handler_error_is_contained() {
        let mut registry = WindowRegistry::new();
        let rx = shown(&mut registry, "rx");
        registry.get_mut(rx).unwrap().behavior_mut::<Inbox>().unwrap().fail_on = Some("bad".into());
        let mut router = EventRouter::default();

        router.send_message("tx", "rx", "bad", Payload::new(), MessagePriority::High);
        router.send_message("tx", "rx", "good", Payload::new(), MessagePriority::Normal);
        assert_eq!(router.process_message_queue(&mut registry), 2);

        let stats = router.stats();
        assert_eq!(stats.handler_errors, 1);
        assert_eq!(stats.delivered, 1);
        assert_eq!(inbox(&registry, rx), vec!["tx:good"]);
    }

    #[test]
    fn test_broadcast_skips_sender() {
        let mut registry = WindowRegistry::new();
        let a = shown(&mut registry, "a");
        let b = shown(&mut registry, "b");
        let c = shown(&mut registry, "c");
        let mut router = EventRouter::default();

        let sent = router.broadcast_message(
            "a",
            ["a", "b", "c"],
            "refresh",
            &Payload::new(),
            MessagePriority::Normal,
        );
        assert_eq!(sent, 2);
        router.process_message_queue(&mut registry);
        assert!(inbox(&registry, a).is_empty());
        assert_eq!(inbox(&registry, b), vec!["a:refresh"]);
        assert_eq!(inbox(&registry, c), vec!["a:refresh"]);
    }

    #[test]
    fn test_broadcast_counts_only_enqueued() {
        let mut router = EventRouter::new(1);
        let sent = router.broadcast_message(
            "a",
            ["b", "c", "d"],
            "refresh",
            &Payload::new(),
            MessagePriority::Low,
        );
        assert_eq!(sent, 1);
        assert_eq!(router.queue_len(MessagePriority::Low), 1);
    }

    // === Input ===

    #[test]
    fn test_global_listener_short_circuits() {
        let mut registry = WindowRegistry::new();
        let rx = shown(&mut registry, "rx");
        registry.get_mut(rx).unwrap().behavior_mut::<Inbox>().unwrap().consume_keys = true;
        let mut router = EventRouter::default();
        router.add_global_listener(Box::new(|e: &InputEvent| matches!(e, InputEvent::Text(_))));

        assert!(router.route_event(&InputEvent::Text("x".into()), Some(rx), &mut registry));
        assert!(router.route_event(&InputEvent::char_press('x'), Some(rx), &mut registry));
        let stats = router.stats();
        assert_eq!(stats.events_routed, 2);
        assert_eq!(stats.events_consumed, 2);
    }

    #[test]
    fn test_window_listeners_before_handler() {
        let mut registry = WindowRegistry::new();
        let rx = shown(&mut registry, "rx");
        let mut router = EventRouter::default();

        assert!(!router.route_event(&InputEvent::char_press('x'), Some(rx), &mut registry));
        registry
            .get_mut(rx)
            .unwrap()
            .add_event_listener(Box::new(|e: &InputEvent| e.is_pointer()));
        assert!(router.route_event(&InputEvent::click(1.0, 1.0), Some(rx), &mut registry));
    }

    #[test]
    fn test_hidden_or_disabled_target_ignored() {
        let mut registry = WindowRegistry::new();
        let rx = shown(&mut registry, "rx");
        registry.get_mut(rx).unwrap().behavior_mut::<Inbox>().unwrap().consume_keys = true;
        let mut router = EventRouter::default();

        registry.get_mut(rx).unwrap().set_input_enabled(false);
        assert!(!router.route_event(&InputEvent::char_press('x'), Some(rx), &mut registry));

        registry.get_mut(rx).unwrap().set_input_enabled(true);
        registry.get_mut(rx).unwrap().hide().unwrap();
        assert!(!router.route_event(&InputEvent::char_press('x'), Some(rx), &mut registry));
        assert!(!router.route_event(&InputEvent::char_press('x'), None, &mut registry));
    }

    #[test]
    fn test_clear_queues() {
        let mut router = EventRouter::default();
        router.send_message("a", "b", "x", Payload::new(), MessagePriority::Low);
        router.send_message("a", "b", "y", Payload::new(), MessagePriority::Critical);
        assert_eq!(router.clear_queues(), 2);
        assert_eq!(router.queued_count(), 0);
    }
}
