//! UI-side collaborators
//!
//! The session talks to the surrounding UI through these seams:
//! - [`NavigationGuard`] blocks route changes while the record is dirty
//! - [`AlertSurface`] shows one message at a time
//! - [`ExitHandler`] performs the actual exit (overlay close or navigation)
//! - [`RenderSignal`] tells the UI to re-paint; the session never draws

use crate::types::AlertMessage;
use tokio::sync::watch;

/// Router lock and page-exit check
#[cfg_attr(test, mockall::automock)]
pub trait NavigationGuard: Send + Sync {
    /// Block or allow route changes
    fn set_locked(&self, locked: bool);

    /// Arm or disarm the browser-level "leave page?" check
    fn set_page_exit_check(&self, armed: bool);
}

/// Alert display
#[cfg_attr(test, mockall::automock)]
pub trait AlertSurface: Send + Sync {
    fn set_alert(&self, message: AlertMessage);

    fn clear_alert(&self);
}

/// Exit routing
#[cfg_attr(test, mockall::automock)]
pub trait ExitHandler: Send + Sync {
    /// Leave the form by navigating (non-modal)
    fn exit(&self);

    /// Close the overlay hosting the form
    fn modal_exit(&self);
}

/// Render-request channel
///
/// Holds a generation counter; every request bumps it. UI layers either poll
/// [`RenderSignal::requests`] after a controller call or await
/// `changed()` on a receiver from [`RenderSignal::subscribe`].
#[derive(Debug)]
pub struct RenderSignal {
    tx: watch::Sender<u64>,
}

impl RenderSignal {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }

    /// Ask the UI to re-paint
    pub fn request(&self) {
        self.tx.send_modify(|generation| *generation += 1);
    }

    /// Total number of requests so far
    #[must_use]
    pub fn requests(&self) -> u64 {
        *self.tx.borrow()
    }

    /// Receiver that wakes on every request
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }
}

impl Default for RenderSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_count_without_receivers() {
        let signal = RenderSignal::new();
        signal.request();
        signal.request();
        assert_eq!(signal.requests(), 2);
    }

    #[tokio::test]
    async fn receiver_wakes_on_request() {
        let signal = RenderSignal::new();
        let mut rx = signal.subscribe();

        signal.request();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 1);
    }
}
