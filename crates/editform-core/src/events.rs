//! Dirty/clean notifications
//!
//! Record services raise a `Dirty` event when their record starts to differ
//! from the persisted copy and a `Clean` event when it matches again.
//! [`EventHub`] is a ready-made publisher for service implementations:
//! - `subscribe` returns a [`SubscriptionToken`] that pairs with exactly one
//!   `unsubscribe`
//! - handlers run in subscription order, outside the hub's lock, so a handler
//!   may subscribe, unsubscribe or raise further events

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Callback invoked when an event is raised
pub type Handler = Arc<dyn Fn() + Send + Sync>;

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Kind of dirty-state notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirtyEvent {
    /// Record differs from its persisted state
    Dirty,
    /// Record matches its persisted state
    Clean,
}

/// Proof of a subscription; hand it back to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken {
    id: u64,
    event: DirtyEvent,
}

impl SubscriptionToken {
    fn issue(event: DirtyEvent) -> Self {
        Self {
            id: NEXT_TOKEN.fetch_add(1, Ordering::Relaxed),
            event,
        }
    }

    /// Event this token subscribed to
    #[inline]
    #[must_use]
    pub fn event(&self) -> DirtyEvent {
        self.event
    }
}

/// Publisher for dirty/clean notifications
#[derive(Default)]
pub struct EventHub {
    handlers: Mutex<Vec<(SubscriptionToken, Handler)>>,
}

impl EventHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind
    pub fn subscribe(&self, event: DirtyEvent, handler: Handler) -> SubscriptionToken {
        let token = SubscriptionToken::issue(event);
        self.handlers.lock().push((token, handler));
        token
    }

    /// Remove the handler registered under `token`.
    ///
    /// Returns false if the token is unknown or was already released.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut handlers = self.handlers.lock();
        let before = handlers.len();
        handlers.retain(|(t, _)| *t != token);
        handlers.len() != before
    }

    /// Raise an event; returns how many handlers ran
    pub fn emit(&self, event: DirtyEvent) -> usize {
        let targets: Vec<Handler> = self
            .handlers
            .lock()
            .iter()
            .filter(|(t, _)| t.event == event)
            .map(|(_, h)| Arc::clone(h))
            .collect();

        for handler in &targets {
            handler();
        }
        targets.len()
    }

    /// Number of live subscriptions for an event kind
    #[must_use]
    pub fn subscriber_count(&self, event: DirtyEvent) -> usize {
        self.handlers
            .lock()
            .iter()
            .filter(|(t, _)| t.event == event)
            .count()
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("dirty", &self.subscriber_count(DirtyEvent::Dirty))
            .field("clean", &self.subscriber_count(DirtyEvent::Clean))
            .finish()
    }
}
