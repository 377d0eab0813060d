use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use campcal_core::CampcalResult;
use campcal_core::controller::{ControllerSettings, Phase, ViewChange, ViewController};
use campcal_core::event::{Category, Event, EventFields, EventId, EventPatch, NewEvent, Status, UserId};
use campcal_core::identity::{FixedClock, StaticIdentity};
use campcal_core::placement::Placement;
use campcal_core::range::{DateRange, Direction, ViewMode};
use campcal_core::reschedule::DropTarget;
use campcal_core::store::{EventStore, LocalStore, MemoryStore, Subscription};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn settings(optimistic_updates: bool) -> ControllerSettings {
    ControllerSettings {
        optimistic_updates,
        ..Default::default()
    }
}

fn controller<S: EventStore>(store: Arc<S>, optimistic: bool) -> ViewController<S> {
    ViewController::new(
        store,
        Arc::new(StaticIdentity::signed_in("alice")),
        settings(optimistic),
    )
    .with_clock(Arc::new(FixedClock(utc(2024, 3, 15, 11, 0))))
}

fn fields(title: &str, start: DateTime<Utc>, hours: i64) -> EventFields {
    EventFields::new(title, start, start + Duration::hours(hours))
}

/// MemoryStore that counts range queries.
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    fetches: AtomicUsize,
}

impl CountingStore {
    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventStore for CountingStore {
    async fn list_by_range(&self, range: DateRange) -> CampcalResult<Vec<Event>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.list_by_range(range).await
    }

    async fn get_by_id(&self, id: &EventId) -> CampcalResult<Event> {
        self.inner.get_by_id(id).await
    }

    async fn create(&self, new_event: NewEvent) -> CampcalResult<Event> {
        self.inner.create(new_event).await
    }

    async fn update(
        &self,
        id: &EventId,
        patch: EventPatch,
        actor: &UserId,
    ) -> CampcalResult<Event> {
        self.inner.update(id, patch, actor).await
    }

    async fn delete(&self, id: &EventId, actor: &UserId) -> CampcalResult<()> {
        self.inner.delete(id, actor).await
    }

    fn subscribe(&self) -> Subscription {
        self.inner.subscribe()
    }
}

#[tokio::test]
async fn test_each_view_change_fetches_once_and_filters_never_fetch() {
    let store = Arc::new(CountingStore::default());
    let mut c = controller(store.clone(), false);
    c.create_event(fields("Spring newsletter", utc(2024, 3, 5, 10, 0), 1))
        .await
        .unwrap();
    c.refresh().await;
    assert_eq!(store.fetches(), 1);

    c.navigate(Direction::Next).await;
    assert_eq!(store.fetches(), 2);
    c.set_view_mode(ViewMode::Week).await;
    assert_eq!(store.fetches(), 3);
    c.jump_to_today().await;
    assert_eq!(store.fetches(), 4);
    c.go_to(date(2024, 3, 5)).await;
    assert_eq!(store.fetches(), 5);
    assert_eq!(c.visible_events().len(), 1);

    c.set_search_text("webinar");
    c.toggle_category(Category::Email);
    c.toggle_status(Status::Planned);
    c.set_filters(c.filter().clone());
    c.reset_filters();
    assert_eq!(store.fetches(), 5);
    assert_eq!(c.visible_events().len(), 1);
    assert_eq!(c.phase(), &Phase::Ready);
}

#[tokio::test]
async fn test_month_view_places_multi_day_event() {
    let store = Arc::new(MemoryStore::new());
    let mut c = controller(store, false);

    c.create_event(fields("Flash sale", utc(2024, 3, 1, 9, 0), 50))
        .await
        .unwrap();
    assert_eq!(c.refresh().await, &Phase::Ready);

    let Placement::Month(cells) = c.placement() else {
        panic!("expected a month placement");
    };
    assert_eq!(cells.len(), 35);
    let occupied: Vec<_> = cells
        .iter()
        .filter(|cell| cell.total() > 0)
        .map(|cell| cell.date)
        .collect();
    assert_eq!(
        occupied,
        vec![date(2024, 3, 1), date(2024, 3, 2), date(2024, 3, 3)]
    );
}

#[tokio::test]
async fn test_change_notice_triggers_refetch() {
    let store = Arc::new(MemoryStore::new());
    let mut c = controller(store.clone(), false);
    c.refresh().await;
    assert!(c.snapshot().is_empty());

    // Another client writes to the shared store.
    let mut other = controller(store.clone(), false);
    other
        .create_event(fields("Partner webinar", utc(2024, 3, 20, 15, 0), 1))
        .await
        .unwrap();

    assert!(c.next_change().await);
    assert_eq!(c.snapshot().len(), 1);
    assert_eq!(c.snapshot()[0].title, "Partner webinar");
}

#[tokio::test]
async fn test_optimistic_create_reconciles_without_duplicates() {
    let store = Arc::new(MemoryStore::new());
    let mut c = controller(store, true);
    c.refresh().await;

    let created = c
        .create_event(fields("Newsletter", utc(2024, 3, 5, 10, 0), 1))
        .await
        .unwrap();
    assert_eq!(c.snapshot().len(), 1);

    assert!(c.sync_pending_changes().await);
    assert_eq!(c.snapshot().len(), 1);
    assert_eq!(c.snapshot()[0].id, created.id);
}

#[tokio::test]
async fn test_optimistic_move_out_of_range_drops_from_snapshot() {
    let store = Arc::new(MemoryStore::new());
    let mut c = controller(store, true);
    let created = c
        .create_event(fields("Newsletter", utc(2024, 3, 5, 10, 0), 1))
        .await
        .unwrap();

    c.reschedule_event(&created.id, DropTarget::Day(date(2024, 5, 2)))
        .await
        .unwrap();
    assert!(c.snapshot().is_empty());

    c.navigate(Direction::Next).await;
    c.navigate(Direction::Next).await;
    assert_eq!(c.snapshot().len(), 1);
    assert_eq!(c.snapshot()[0].start_at, utc(2024, 5, 2, 10, 0));
}

#[tokio::test]
async fn test_filters_and_week_view() {
    let store = Arc::new(MemoryStore::new());
    let mut c = controller(store, false);

    let mut social = fields("Instagram takeover", utc(2024, 3, 12, 9, 0), 2);
    social.category = Category::Social;
    social.status = Status::InProgress;
    c.create_event(social).await.unwrap();
    c.create_event(fields("Newsletter", utc(2024, 3, 13, 14, 0), 1))
        .await
        .unwrap();

    c.set_view_mode(ViewMode::Week).await;
    c.change_view(ViewChange::GoTo(date(2024, 3, 13)));
    c.refresh().await;
    assert_eq!(c.visible_events().len(), 2);

    c.toggle_category(Category::Social);
    c.toggle_status(Status::Planned);
    assert!(c.visible_events().is_empty());

    c.toggle_status(Status::InProgress);
    assert_eq!(c.visible_events().len(), 1);

    let Placement::Slots(columns) = c.placement() else {
        panic!("expected a slot placement");
    };
    assert_eq!(columns.len(), 7);
    assert_eq!(columns.iter().map(|column| column.event_count()).sum::<usize>(), 1);
}

#[tokio::test]
async fn test_local_store_round_trip_through_controller() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalStore::new(dir.path()));
    let mut c = controller(store.clone(), false);

    let created = c
        .create_event(fields("Podcast launch", utc(2024, 3, 18, 8, 0), 1))
        .await
        .unwrap();
    let fetched = store.get_by_id(&created.id).await.unwrap();
    assert_eq!(fetched, created);

    let edited = c
        .update_event(
            &created.id,
            EventPatch {
                title: Some("Podcast launch (ep. 1)".into()),
                budget: Some(Some(400.0)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.start_at, created.start_at);
    assert_eq!(edited.budget, Some(400.0));

    c.delete_event(&created.id).await.unwrap();
    assert!(store.get_by_id(&created.id).await.unwrap_err().is_not_found());

    // Deleted by someone else in the meantime.
    let err = c.delete_event(&created.id).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(c.take_notice().is_some());
    assert_eq!(created.owner_id, UserId::new("alice"));
}
