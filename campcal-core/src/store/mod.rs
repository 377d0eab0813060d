//! Event store contract.
//!
//! The engine never owns event data: it reads through an [`EventStore`] and
//! repaints whenever the store's change feed fires. Two adapters ship with
//! the crate: [`MemoryStore`] (in-process) and [`LocalStore`] (one TOML file
//! per event in a directory).

mod local;
mod memory;

pub use local::LocalStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use crate::error::CampcalResult;
use crate::event::{Event, EventId, EventPatch, NewEvent, UserId};
use crate::range::DateRange;

/// Capacity of the change feed; slow subscribers see lagged notices
/// coalesced into a single "changed".
const CHANGE_FEED_CAPACITY: usize = 64;

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Events overlapping `range`, ordered by start.
    async fn list_by_range(&self, range: DateRange) -> CampcalResult<Vec<Event>>;

    async fn get_by_id(&self, id: &EventId) -> CampcalResult<Event>;

    async fn create(&self, new_event: NewEvent) -> CampcalResult<Event>;

    /// Apply `patch` on behalf of `actor`. All patched fields land together or not at all.
    async fn update(&self, id: &EventId, patch: EventPatch, actor: &UserId)
    -> CampcalResult<Event>;

    async fn delete(&self, id: &EventId, actor: &UserId) -> CampcalResult<()>;

    /// Subscribe to payload-free change notices. Dropping the handle unsubscribes.
    fn subscribe(&self) -> Subscription;
}

/// Whether an event overlaps a half-open range. Zero-length events count when
/// they sit inside it.
pub fn overlaps(event: &Event, range: &DateRange) -> bool {
    event.start_at < range.end && event.end_at >= range.start
}

/// Fan-out of change notices to subscribers.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<()>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        ChangeNotifier { tx }
    }

    pub fn notify(&self) {
        // No subscribers is fine: nobody needs to repaint.
        let _ = self.tx.send(());
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        ChangeNotifier::new()
    }
}

/// A live subscription to a store's change feed.
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<()>,
}

impl Subscription {
    /// Wait for the next change. Returns `false` once the store is gone.
    pub async fn changed(&mut self) -> bool {
        match self.rx.recv().await {
            Ok(()) | Err(RecvError::Lagged(_)) => {
                self.drain();
                true
            }
            Err(RecvError::Closed) => false,
        }
    }

    /// Consume any notices already delivered. Returns `true` if there were any.
    pub fn try_changed(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.rx.try_recv() {
                Ok(()) | Err(TryRecvError::Lagged(_)) => changed = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return changed,
            }
        }
    }

    /// Release the subscription now rather than at drop.
    pub fn unsubscribe(self) {}

    fn drain(&mut self) {
        self.try_changed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notices_coalesce() {
        let notifier = ChangeNotifier::new();
        let mut sub = notifier.subscribe();

        notifier.notify();
        notifier.notify();
        notifier.notify();

        assert!(sub.changed().await);
        assert!(!sub.try_changed());
    }

    #[tokio::test]
    async fn test_unsubscribe_releases_receiver() {
        let notifier = ChangeNotifier::new();
        let sub = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 1);
        sub.unsubscribe();
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_closed_feed_reports_false() {
        let notifier = ChangeNotifier::new();
        let mut sub = notifier.subscribe();
        drop(notifier);
        assert!(!sub.changed().await);
    }
}
