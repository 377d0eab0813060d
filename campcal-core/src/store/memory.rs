//! In-process event store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{CampcalError, CampcalResult};
use crate::event::{Event, EventId, EventPatch, NewEvent, UserId};
use crate::range::DateRange;
use crate::store::{ChangeNotifier, EventStore, Subscription, overlaps};

/// Events held in memory, shared by every handle to the store.
///
/// The store can be switched offline, in which case every call fails with a
/// [`CampcalError::Store`] as an unreachable backend would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    events: RwLock<BTreeMap<EventId, Event>>,
    notifier: ChangeNotifier,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Seed the store with existing events without emitting notices.
    pub fn with_events(events: impl IntoIterator<Item = Event>) -> Self {
        MemoryStore {
            events: RwLock::new(events.into_iter().map(|e| (e.id.clone(), e)).collect()),
            ..Default::default()
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }

    fn ensure_online(&self) -> CampcalResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(CampcalError::Store("store is unreachable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn list_by_range(&self, range: DateRange) -> CampcalResult<Vec<Event>> {
        self.ensure_online()?;

        let mut events: Vec<Event> = self
            .events
            .read()
            .await
            .values()
            .filter(|e| overlaps(e, &range))
            .cloned()
            .collect();
        events.sort_by(|a, b| a.start_at.cmp(&b.start_at).then_with(|| a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn get_by_id(&self, id: &EventId) -> CampcalResult<Event> {
        self.ensure_online()?;

        self.events
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CampcalError::NotFound(id.to_string()))
    }

    async fn create(&self, new_event: NewEvent) -> CampcalResult<Event> {
        self.ensure_online()?;
        new_event.fields.validate()?;

        let event = Event::from_new(EventId::generate(), new_event);
        self.events
            .write()
            .await
            .insert(event.id.clone(), event.clone());

        info!(id = %event.id, owner = %event.owner_id, "created event");
        self.notifier.notify();
        Ok(event)
    }

    async fn update(
        &self,
        id: &EventId,
        patch: EventPatch,
        actor: &UserId,
    ) -> CampcalResult<Event> {
        self.ensure_online()?;

        let updated = {
            let mut events = self.events.write().await;
            let current = events
                .get(id)
                .ok_or_else(|| CampcalError::NotFound(id.to_string()))?;
            let updated = current.apply_patch(&patch)?;
            events.insert(id.clone(), updated.clone());
            updated
        };

        info!(%id, %actor, "updated event");
        self.notifier.notify();
        Ok(updated)
    }

    async fn delete(&self, id: &EventId, actor: &UserId) -> CampcalResult<()> {
        self.ensure_online()?;

        self.events
            .write()
            .await
            .remove(id)
            .ok_or_else(|| CampcalError::NotFound(id.to_string()))?;

        info!(%id, %actor, "deleted event");
        self.notifier.notify();
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        self.notifier.subscribe()
    }
}
