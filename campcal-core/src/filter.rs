//! Free-text, category and status filtering.
//!
//! Facets combine with AND; selections inside a facet combine with OR. An empty
//! selection places no restriction on its facet.

use std::collections::BTreeSet;
use std::time::Duration;

use tokio::time::Instant;

use crate::event::{Category, Event, Status};

/// Default delay before typed search text is committed.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub text: String,
    pub categories: BTreeSet<Category>,
    pub statuses: BTreeSet<Status>,
}

impl EventFilter {
    pub fn new(
        text: &str,
        categories: impl IntoIterator<Item = Category>,
        statuses: impl IntoIterator<Item = Status>,
    ) -> Self {
        EventFilter {
            text: text.to_string(),
            categories: categories.into_iter().collect(),
            statuses: statuses.into_iter().collect(),
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.matches_text(event) && self.matches_category(event) && self.matches_status(event)
    }

    /// Events that pass, in their original order. The input is untouched.
    pub fn apply(&self, events: &[Event]) -> Vec<Event> {
        events.iter().filter(|e| self.matches(e)).cloned().collect()
    }

    /// True when any facet restricts the result (enables "reset").
    pub fn is_active(&self) -> bool {
        !self.text.trim().is_empty() || !self.categories.is_empty() || !self.statuses.is_empty()
    }

    /// Clear text and both facets together.
    pub fn reset(&mut self) {
        *self = EventFilter::default();
    }

    pub fn toggle_category(&mut self, category: Category) {
        if !self.categories.remove(&category) {
            self.categories.insert(category);
        }
    }

    pub fn toggle_status(&mut self, status: Status) {
        if !self.statuses.remove(&status) {
            self.statuses.insert(status);
        }
    }

    fn matches_text(&self, event: &Event) -> bool {
        let term = self.text.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }

        event.title.to_lowercase().contains(&term)
            || event
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&term))
    }

    fn matches_category(&self, event: &Event) -> bool {
        self.categories.is_empty() || self.categories.contains(&event.category)
    }

    fn matches_status(&self, event: &Event) -> bool {
        self.statuses.is_empty() || self.statuses.contains(&event.status)
    }
}

/// Holds typed search text until it has been stable for the debounce delay.
#[derive(Debug, Clone)]
pub struct SearchDebounce {
    delay: Duration,
    pending: Option<(String, Instant)>,
}

impl SearchDebounce {
    pub fn new(delay: Duration) -> Self {
        SearchDebounce {
            delay,
            pending: None,
        }
    }

    /// Record a keystroke; restarts the delay.
    pub fn input(&mut self, text: &str, now: Instant) {
        self.pending = Some((text.to_string(), now));
    }

    /// The text to commit, once the delay has elapsed since the last input.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some((_, at)) if now.duration_since(*at) >= self.delay => {
                self.pending.take().map(|(text, _)| text)
            }
            _ => None,
        }
    }

    /// When the pending text becomes committable, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at + self.delay)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

impl Default for SearchDebounce {
    fn default() -> Self {
        SearchDebounce::new(DEFAULT_SEARCH_DEBOUNCE)
    }
}
