//! View controller: owns the view state and the event snapshot.
//!
//! Any change to the reference date or view mode goes through a fetch tagged
//! with a generation number; responses for superseded generations are
//! dropped. Filter changes re-derive the visible set from the snapshot in
//! place; typed search text is held back until the debounce delay passes. Mutations wait for the store, then either patch the snapshot
//! (optimistic mode) or rely on the change feed to trigger a re-fetch.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use chrono_tz::Tz;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{CampcalError, CampcalResult};
use crate::event::{Category, Event, EventFields, EventId, EventPatch, NewEvent, Status};
use crate::filter::{DEFAULT_SEARCH_DEBOUNCE, EventFilter, SearchDebounce};
use crate::identity::{Clock, Identity, SystemClock};
use crate::placement::{DEFAULT_CELL_LIMIT, Placement, place};
use crate::range::{
    DateRange, Direction, Layout, ViewMode, local_date, local_instant, navigate, title,
};
use crate::reschedule::{DropTarget, reschedule};
use crate::store::{EventStore, Subscription, overlaps};

const NOT_FOUND_NOTICE: &str = "That event no longer exists. The calendar has been refreshed.";

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSettings {
    pub tz: Tz,
    pub default_view: ViewMode,
    pub cell_limit: usize,
    /// Patch the snapshot right after a successful write.
    pub optimistic_updates: bool,
    /// Quiet period before typed search text is applied.
    pub search_debounce: std::time::Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        ControllerSettings {
            tz: Tz::UTC,
            default_view: ViewMode::default(),
            cell_limit: DEFAULT_CELL_LIMIT,
            optimistic_updates: false,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    /// The last fetch failed; the previous snapshot is still shown.
    Error(String),
    /// The store refused the current user. Terminal until a new controller is built.
    Unauthenticated,
}

/// Everything the visible calendar is derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub reference_date: NaiveDate,
    pub view_mode: ViewMode,
    pub filter: EventFilter,
}

/// Changes that move the visible range and therefore need a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewChange {
    SetViewMode(ViewMode),
    Navigate(Direction),
    JumpToToday,
    GoTo(NaiveDate),
}

/// A fetch for one generation of the view state.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub generation: u64,
    pub range: DateRange,
}

impl FetchRequest {
    pub async fn execute<S: EventStore + ?Sized>(self, store: &S) -> FetchResponse {
        debug!(generation = self.generation, range = %self.range, "fetching events");
        let result = store.list_by_range(self.range).await;
        FetchResponse {
            generation: self.generation,
            range: self.range,
            result,
        }
    }
}

#[derive(Debug)]
pub struct FetchResponse {
    pub generation: u64,
    pub range: DateRange,
    pub result: CampcalResult<Vec<Event>>,
}

/// Keyboard and toolbar intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Navigate(Direction),
    JumpToToday,
    SetView(ViewMode),
    OpenCreate,
    FocusSearch,
}

impl Intent {
    /// Key bindings: `/` search, `n` new event, arrows navigate, `t` today.
    pub fn from_key(key: &str) -> Option<Intent> {
        match key {
            "/" => Some(Intent::FocusSearch),
            "n" | "N" => Some(Intent::OpenCreate),
            "ArrowLeft" => Some(Intent::Navigate(Direction::Previous)),
            "ArrowRight" => Some(Intent::Navigate(Direction::Next)),
            "t" | "T" => Some(Intent::JumpToToday),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntentOutcome {
    /// The view moved and was re-fetched.
    Fetched,
    /// Prefilled fields for a new event.
    OpenCreateForm(EventFields),
    FocusSearch,
}

pub struct ViewController<S: EventStore> {
    store: Arc<S>,
    identity: Arc<dyn Identity>,
    clock: Arc<dyn Clock>,
    settings: ControllerSettings,
    state: ViewState,
    layout: Layout,
    phase: Phase,
    generation: u64,
    snapshot: Vec<Event>,
    visible: Vec<Event>,
    placement: Placement,
    notice: Option<String>,
    search: SearchDebounce,
    subscription: Subscription,
}

impl<S: EventStore> ViewController<S> {
    /// Build a controller on today's date. Subscribes to the store immediately;
    /// the subscription is released when the controller is dropped.
    pub fn new(store: Arc<S>, identity: Arc<dyn Identity>, settings: ControllerSettings) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let today = local_date(clock.now(), settings.tz);
        let layout = Layout::new(today, settings.default_view, settings.tz);
        let subscription = store.subscribe();

        ViewController {
            state: ViewState {
                reference_date: today,
                view_mode: settings.default_view,
                filter: EventFilter::default(),
            },
            placement: Placement::empty(settings.default_view),
            search: SearchDebounce::new(settings.search_debounce),
            layout,
            store,
            identity,
            clock,
            settings,
            phase: Phase::Idle,
            generation: 0,
            snapshot: Vec::new(),
            visible: Vec::new(),
            notice: None,
            subscription,
        }
    }

    /// Replace the clock; the reference date moves to the clock's today.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self.state.reference_date = self.today();
        self.relayout();
        self
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    /// Fetched events for the current range, before filtering.
    pub fn snapshot(&self) -> &[Event] {
        &self.snapshot
    }

    pub fn visible_events(&self) -> &[Event] {
        &self.visible
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn title(&self) -> String {
        title(self.state.reference_date, self.state.view_mode)
    }

    pub fn status_line(&self) -> String {
        match &self.phase {
            Phase::Loading => "Loading events…".to_string(),
            Phase::Unauthenticated => "Sign in to see your calendar".to_string(),
            Phase::Error(message) => format!("Could not load events: {}", message),
            Phase::Idle | Phase::Ready => match self.visible.len() {
                1 => "1 event shown".to_string(),
                n => format!("{} events shown", n),
            },
        }
    }

    /// The pending user-visible notice, if any. Cleared once taken.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub fn today(&self) -> NaiveDate {
        local_date(self.clock.now(), self.settings.tz)
    }

    /// Apply a view change and return the fetch that serves it. Any fetch
    /// issued before this call is now stale.
    pub fn change_view(&mut self, change: ViewChange) -> FetchRequest {
        match change {
            ViewChange::SetViewMode(mode) => self.state.view_mode = mode,
            ViewChange::Navigate(direction) => {
                self.state.reference_date =
                    navigate(self.state.reference_date, self.state.view_mode, direction);
            }
            ViewChange::JumpToToday => self.state.reference_date = self.today(),
            ViewChange::GoTo(date) => self.state.reference_date = date,
        }
        self.relayout();
        self.begin_fetch()
    }

    /// Start a fetch for the current view state.
    pub fn begin_fetch(&mut self) -> FetchRequest {
        self.generation += 1;
        self.phase = Phase::Loading;
        FetchRequest {
            generation: self.generation,
            range: self.layout.range,
        }
    }

    /// Apply a fetch result. Returns `false` when the response was for a
    /// superseded view state and has been dropped.
    pub fn apply_fetch(&mut self, response: FetchResponse) -> bool {
        if response.generation != self.generation {
            debug!(
                stale = response.generation,
                current = self.generation,
                "discarding stale fetch result"
            );
            return false;
        }

        match response.result {
            Ok(events) => {
                debug!(count = events.len(), range = %response.range, "fetched events");
                self.snapshot = events;
                self.phase = Phase::Ready;
            }
            Err(e) if e.is_degradable() => {
                warn!("failed to load events, showing none: {e}");
                self.snapshot.clear();
                self.phase = Phase::Ready;
            }
            Err(CampcalError::NotAuthenticated) => {
                warn!("store rejected the current user");
                self.phase = Phase::Unauthenticated;
            }
            Err(e) => {
                warn!("failed to load events: {e}");
                self.phase = Phase::Error(e.to_string());
            }
        }

        self.rederive();
        true
    }

    /// Fetch the current range and apply the result.
    pub async fn refresh(&mut self) -> &Phase {
        let request = self.begin_fetch();
        let response = request.execute(self.store.as_ref()).await;
        self.apply_fetch(response);
        &self.phase
    }

    pub async fn set_view_mode(&mut self, mode: ViewMode) -> &Phase {
        self.run(ViewChange::SetViewMode(mode)).await
    }

    pub async fn navigate(&mut self, direction: Direction) -> &Phase {
        self.run(ViewChange::Navigate(direction)).await
    }

    pub async fn jump_to_today(&mut self) -> &Phase {
        self.run(ViewChange::JumpToToday).await
    }

    pub async fn go_to(&mut self, date: NaiveDate) -> &Phase {
        self.run(ViewChange::GoTo(date)).await
    }

    async fn run(&mut self, change: ViewChange) -> &Phase {
        let request = self.change_view(change);
        let response = request.execute(self.store.as_ref()).await;
        self.apply_fetch(response);
        &self.phase
    }

    pub fn filter(&self) -> &EventFilter {
        &self.state.filter
    }

    /// Replace the committed filter. No fetch.
    pub fn set_filters(&mut self, filter: EventFilter) {
        self.state.filter = filter;
        self.rederive();
    }

    pub fn set_search_text(&mut self, text: &str) {
        self.search.cancel();
        self.state.filter.text = text.to_string();
        self.rederive();
    }

    /// A keystroke in the search box. Nothing is filtered until `poll_search`
    /// runs after the debounce delay.
    pub fn type_search(&mut self, text: &str, now: Instant) {
        self.search.input(text, now);
    }

    /// Commit typed search text whose delay has elapsed. Returns whether the
    /// visible set changed.
    pub fn poll_search(&mut self, now: Instant) -> bool {
        match self.search.poll(now) {
            Some(text) if text != self.state.filter.text => {
                debug!(%text, "search committed");
                self.state.filter.text = text;
                self.rederive();
                true
            }
            _ => false,
        }
    }

    /// When pending search text becomes committable.
    pub fn search_deadline(&self) -> Option<Instant> {
        self.search.deadline()
    }

    pub fn toggle_category(&mut self, category: Category) {
        self.state.filter.toggle_category(category);
        self.rederive();
    }

    pub fn toggle_status(&mut self, status: Status) {
        self.state.filter.toggle_status(status);
        self.rederive();
    }

    pub fn reset_filters(&mut self) {
        self.search.cancel();
        self.state.filter.reset();
        self.rederive();
    }

    pub async fn handle_intent(&mut self, intent: Intent) -> IntentOutcome {
        match intent {
            Intent::Navigate(direction) => {
                self.navigate(direction).await;
                IntentOutcome::Fetched
            }
            Intent::JumpToToday => {
                self.jump_to_today().await;
                IntentOutcome::Fetched
            }
            Intent::SetView(mode) => {
                self.set_view_mode(mode).await;
                IntentOutcome::Fetched
            }
            Intent::OpenCreate => IntentOutcome::OpenCreateForm(self.create_form()),
            Intent::FocusSearch => IntentOutcome::FocusSearch,
        }
    }

    /// New-event form fields: the reference date at the current hour, one hour long.
    pub fn create_form(&self) -> EventFields {
        let tz = self.settings.tz;
        let hour = self.clock.now().with_timezone(&tz).hour();
        let at = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
        let start = local_instant(self.state.reference_date.and_time(at), tz);
        EventFields::new("", start, start + Duration::hours(1))
    }

    pub async fn create_event(&mut self, fields: EventFields) -> CampcalResult<Event> {
        let owner_id = self.identity.require_user()?;
        fields.validate()?;

        let event = self.store.create(NewEvent { owner_id, fields }).await?;
        info!(id = %event.id, title = %event.title, "event created");

        if self.settings.optimistic_updates {
            self.upsert_local(event.clone());
        }
        Ok(event)
    }

    pub async fn update_event(&mut self, id: &EventId, patch: EventPatch) -> CampcalResult<Event> {
        let actor = self.identity.require_user()?;
        patch.validate()?;
        if let Some(current) = self.snapshot.iter().find(|e| &e.id == id) {
            current.apply_patch(&patch)?;
        }

        match self.store.update(id, patch, &actor).await {
            Ok(event) => {
                info!(%id, "event updated");
                if self.settings.optimistic_updates {
                    self.upsert_local(event.clone());
                }
                Ok(event)
            }
            Err(e) => self.handle_write_error(e).await,
        }
    }

    pub async fn delete_event(&mut self, id: &EventId) -> CampcalResult<()> {
        let actor = self.identity.require_user()?;

        match self.store.delete(id, &actor).await {
            Ok(()) => {
                info!(%id, "event deleted");
                if self.settings.optimistic_updates {
                    self.snapshot.retain(|e| &e.id != id);
                    self.rederive();
                }
                Ok(())
            }
            Err(e) => self.handle_write_error(e).await,
        }
    }

    /// Move an event to a drop target, preserving its duration.
    pub async fn reschedule_event(
        &mut self,
        id: &EventId,
        target: DropTarget,
    ) -> CampcalResult<Event> {
        self.identity.require_user()?;

        let cached = self.snapshot.iter().find(|e| &e.id == id).cloned();
        let event = match cached {
            Some(event) => event,
            None => match self.store.get_by_id(id).await {
                Ok(event) => event,
                Err(e) => return self.handle_write_error(e).await,
            },
        };

        let moved = reschedule(&event, target, self.settings.tz)?;
        debug!(%id, start = %moved.start_at, end = %moved.end_at, "rescheduling event");
        self.update_event(id, moved.patch()).await
    }

    /// Wait for the next store change and re-fetch. Returns `false` once the
    /// store's change feed has closed.
    pub async fn next_change(&mut self) -> bool {
        if !self.subscription.changed().await {
            return false;
        }
        self.refresh().await;
        true
    }

    /// Re-fetch if any change notices arrived since the last check.
    pub async fn sync_pending_changes(&mut self) -> bool {
        if !self.subscription.try_changed() {
            return false;
        }
        self.refresh().await;
        true
    }

    async fn handle_write_error<T>(&mut self, error: CampcalError) -> CampcalResult<T> {
        if error.is_not_found() {
            warn!("{error}");
            self.notice = Some(NOT_FOUND_NOTICE.to_string());
            self.refresh().await;
        }
        Err(error)
    }

    fn upsert_local(&mut self, event: Event) {
        self.snapshot.retain(|e| e.id != event.id);
        if overlaps(&event, &self.layout.range) {
            self.snapshot.push(event);
            self.snapshot
                .sort_by(|a, b| a.start_at.cmp(&b.start_at).then_with(|| a.id.cmp(&b.id)));
        }
        self.rederive();
    }

    fn relayout(&mut self) {
        self.layout = Layout::new(
            self.state.reference_date,
            self.state.view_mode,
            self.settings.tz,
        );
    }

    fn rederive(&mut self) {
        self.visible = self.state.filter.apply(&self.snapshot);
        self.placement = place(&self.layout, &self.visible, self.settings.cell_limit);
    }
}
