//! Campaign event types.
//!
//! An [`Event`] is the single scheduled unit the engine works with. Stores
//! hand these out, the filter and placement engines read them, and the
//! reschedule operator produces [`EventPatch`]es against them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CampcalError, CampcalResult};

/// Opaque event identifier, assigned by the store at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn generate() -> Self {
        EventId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        EventId(s.to_string())
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        EventId(s)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the user who created an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: &str) -> Self {
        UserId(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Campaign channel an event belongs to. Drives color and default label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Email,
    Social,
    Content,
    Ads,
    Events,
    Analytics,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Email,
        Category::Social,
        Category::Content,
        Category::Ads,
        Category::Events,
        Category::Analytics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Email => "email",
            Category::Social => "social",
            Category::Content => "content",
            Category::Ads => "ads",
            Category::Events => "events",
            Category::Analytics => "analytics",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Email => "Email Marketing",
            Category::Social => "Social Media",
            Category::Content => "Content Creation",
            Category::Ads => "Advertising",
            Category::Events => "Events",
            Category::Analytics => "Analytics",
        }
    }

    /// Hex color used when rendering events of this category.
    pub fn color(&self) -> &'static str {
        match self {
            Category::Email => "#EF4444",
            Category::Social => "#3B82F6",
            Category::Content => "#10B981",
            Category::Ads => "#F59E0B",
            Category::Events => "#8B5CF6",
            Category::Analytics => "#6B7280",
        }
    }
}

impl FromStr for Category {
    type Err = CampcalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CampcalError::Validation(format!("unknown category '{}'", s)))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Planned,
        Status::InProgress,
        Status::Completed,
        Status::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Planned => "planned",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
            Status::Cancelled => "cancelled",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Status::Planned => "planned",
            Status::InProgress => "in progress",
            Status::Completed => "completed",
            Status::Cancelled => "cancelled",
        }
    }
}

impl FromStr for Status {
    type Err = CampcalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| CampcalError::Validation(format!("unknown status '{}'", s)))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl FromStr for Priority {
    type Err = CampcalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(CampcalError::Validation(format!(
                "unknown priority '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recurrence pattern declared on a stored record.
///
/// Each stored record is placed as exactly one occurrence; the pattern is
/// kept for display and round-tripping and is never expanded into a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

impl Recurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::None => "none",
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
            Recurrence::Monthly => "monthly",
        }
    }
}

impl FromStr for Recurrence {
    type Err = CampcalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Recurrence::None),
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            "monthly" => Ok(Recurrence::Monthly),
            other => Err(CampcalError::Validation(format!(
                "unknown recurrence '{}'",
                other
            ))),
        }
    }
}

/// A stored campaign event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub owner_id: UserId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub category: Category,
    pub status: Status,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(default)]
    pub is_all_day: bool,
    /// Collaboration hint only; not an access rule.
    #[serde(default)]
    pub is_shared: bool,
    #[serde(default)]
    pub recurrence: Recurrence,
}

impl Event {
    /// Materialize a freshly created event from its request.
    pub fn from_new(id: EventId, new_event: NewEvent) -> Self {
        let NewEvent { owner_id, fields } = new_event;
        Event {
            id,
            owner_id,
            title: fields.title,
            description: fields.description,
            start_at: fields.start_at,
            end_at: fields.end_at,
            category: fields.category,
            status: fields.status,
            priority: fields.priority,
            budget: fields.budget,
            is_all_day: fields.is_all_day,
            is_shared: fields.is_shared,
            recurrence: fields.recurrence,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end_at - self.start_at
    }

    /// The user-editable fields of this event.
    pub fn fields(&self) -> EventFields {
        EventFields {
            title: self.title.clone(),
            description: self.description.clone(),
            start_at: self.start_at,
            end_at: self.end_at,
            category: self.category,
            status: self.status,
            priority: self.priority,
            budget: self.budget,
            is_all_day: self.is_all_day,
            is_shared: self.is_shared,
            recurrence: self.recurrence,
        }
    }

    /// Apply a patch, returning the merged event. `id` and `owner_id` never change.
    pub fn apply_patch(&self, patch: &EventPatch) -> CampcalResult<Event> {
        let mut merged = self.clone();
        if let Some(title) = &patch.title {
            merged.title = title.clone();
        }
        if let Some(description) = &patch.description {
            merged.description = description.clone();
        }
        if let Some(start_at) = patch.start_at {
            merged.start_at = start_at;
        }
        if let Some(end_at) = patch.end_at {
            merged.end_at = end_at;
        }
        if let Some(category) = patch.category {
            merged.category = category;
        }
        if let Some(status) = patch.status {
            merged.status = status;
        }
        if let Some(priority) = patch.priority {
            merged.priority = priority;
        }
        if let Some(budget) = patch.budget {
            merged.budget = budget;
        }
        if let Some(is_all_day) = patch.is_all_day {
            merged.is_all_day = is_all_day;
        }
        if let Some(is_shared) = patch.is_shared {
            merged.is_shared = is_shared;
        }
        if let Some(recurrence) = patch.recurrence {
            merged.recurrence = recurrence;
        }

        merged.fields().validate()?;
        Ok(merged)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// User-supplied event fields, as entered in a create or edit form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFields {
    pub title: String,
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub category: Category,
    pub status: Status,
    pub priority: Priority,
    pub budget: Option<f64>,
    pub is_all_day: bool,
    pub is_shared: bool,
    pub recurrence: Recurrence,
}

impl EventFields {
    /// Fields with the form defaults: email, planned, medium priority.
    pub fn new(title: &str, start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> Self {
        EventFields {
            title: title.to_string(),
            description: None,
            start_at,
            end_at,
            category: Category::Email,
            status: Status::Planned,
            priority: Priority::Medium,
            budget: None,
            is_all_day: false,
            is_shared: false,
            recurrence: Recurrence::None,
        }
    }

    pub fn validate(&self) -> CampcalResult<()> {
        if self.title.trim().is_empty() {
            return Err(CampcalError::Validation("title must not be empty".into()));
        }

        if self.end_at < self.start_at {
            return Err(CampcalError::Validation(format!(
                "end ({}) is before start ({})",
                self.end_at.to_rfc3339(),
                self.start_at.to_rfc3339()
            )));
        }

        match self.budget {
            Some(budget) if !budget.is_finite() || budget < 0.0 => {
                return Err(CampcalError::Validation(format!(
                    "budget must be a non-negative amount, got {}",
                    budget
                )));
            }
            _ => {}
        }

        Ok(())
    }
}

/// Create request: validated fields plus the creating user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub owner_id: UserId,
    pub fields: EventFields,
}

/// Partial update. `None` leaves the stored value unchanged; the nested
/// options on `description` and `budget` allow clearing them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub category: Option<Category>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub budget: Option<Option<f64>>,
    pub is_all_day: Option<bool>,
    pub is_shared: Option<bool>,
    pub recurrence: Option<Recurrence>,
}

impl EventPatch {
    /// A patch that overwrites every editable field (full edit).
    pub fn from_fields(fields: EventFields) -> Self {
        EventPatch {
            title: Some(fields.title),
            description: Some(fields.description),
            start_at: Some(fields.start_at),
            end_at: Some(fields.end_at),
            category: Some(fields.category),
            status: Some(fields.status),
            priority: Some(fields.priority),
            budget: Some(fields.budget),
            is_all_day: Some(fields.is_all_day),
            is_shared: Some(fields.is_shared),
            recurrence: Some(fields.recurrence),
        }
    }

    /// A patch that moves an event: start and end are written together.
    pub fn times(start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> Self {
        EventPatch {
            start_at: Some(start_at),
            end_at: Some(end_at),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == EventPatch::default()
    }

    /// Checks the rules that need no stored event: a blank title, a bad
    /// budget, or an end before start when both are given.
    pub fn validate(&self) -> CampcalResult<()> {
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(CampcalError::Validation("title must not be empty".into()));
        }

        if let (Some(start_at), Some(end_at)) = (self.start_at, self.end_at) {
            if end_at < start_at {
                return Err(CampcalError::Validation(format!(
                    "end ({}) is before start ({})",
                    end_at.to_rfc3339(),
                    start_at.to_rfc3339()
                )));
            }
        }

        match self.budget {
            Some(Some(budget)) if !budget.is_finite() || budget < 0.0 => {
                Err(CampcalError::Validation(format!(
                    "budget must be a non-negative amount, got {}",
                    budget
                )))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_fields() -> EventFields {
        EventFields::new(
            "Spring newsletter",
            Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 15, 30, 0).unwrap(),
        )
    }

    #[test]
    fn test_validate_rejects_blank_title() {
        let mut fields = sample_fields();
        fields.title = "   ".to_string();
        assert!(matches!(fields.validate(), Err(CampcalError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_end_before_start() {
        let mut fields = sample_fields();
        fields.end_at = fields.start_at - Duration::minutes(1);
        assert!(matches!(fields.validate(), Err(CampcalError::Validation(_))));
    }

    #[test]
    fn test_validate_allows_zero_duration() {
        let mut fields = sample_fields();
        fields.end_at = fields.start_at;
        assert!(fields.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_budget() {
        let mut fields = sample_fields();
        fields.budget = Some(-5.0);
        assert!(fields.validate().is_err());
        fields.budget = Some(f64::NAN);
        assert!(fields.validate().is_err());
        fields.budget = Some(0.0);
        assert!(fields.validate().is_ok());
    }

    #[test]
    fn test_patch_validates_without_stored_event() {
        let blank = EventPatch {
            title: Some("  ".into()),
            ..Default::default()
        };
        assert!(matches!(blank.validate(), Err(CampcalError::Validation(_))));

        let start = Utc.with_ymd_and_hms(2024, 3, 1, 14, 0, 0).unwrap();
        let backwards = EventPatch::times(start, start - Duration::hours(1));
        assert!(matches!(backwards.validate(), Err(CampcalError::Validation(_))));

        let negative = EventPatch {
            budget: Some(Some(-5.0)),
            ..Default::default()
        };
        assert!(matches!(negative.validate(), Err(CampcalError::Validation(_))));

        // A lone end is checked against the stored start later.
        let end_only = EventPatch {
            end_at: Some(start),
            budget: Some(None),
            ..Default::default()
        };
        assert!(end_only.validate().is_ok());
    }

    #[test]
    fn test_enum_parsing_uses_wire_names() {
        assert_eq!("in_progress".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!("ads".parse::<Category>().unwrap(), Category::Ads);
        assert_eq!("urgent".parse::<Priority>().unwrap(), Priority::Urgent);
        assert_eq!("weekly".parse::<Recurrence>().unwrap(), Recurrence::Weekly);
        assert!("newsletter".parse::<Category>().is_err());
        assert!("In Progress".parse::<Status>().is_err());
    }

    #[test]
    fn test_apply_patch_keeps_identity_and_validates() {
        let event = Event::from_new(
            EventId::from("evt-1"),
            NewEvent {
                owner_id: UserId::new("alice"),
                fields: sample_fields(),
            },
        );

        let moved = event
            .apply_patch(&EventPatch::times(
                event.start_at + Duration::days(2),
                event.end_at + Duration::days(2),
            ))
            .unwrap();
        assert_eq!(moved.id, event.id);
        assert_eq!(moved.owner_id, event.owner_id);
        assert_eq!(moved.duration(), event.duration());

        let bad = EventPatch {
            end_at: Some(event.start_at - Duration::hours(1)),
            ..Default::default()
        };
        assert!(event.apply_patch(&bad).is_err());
    }

    #[test]
    fn test_event_serializes_snake_case_enums() {
        let event = Event::from_new(
            EventId::from("evt-1"),
            NewEvent {
                owner_id: UserId::new("alice"),
                fields: EventFields {
                    status: Status::InProgress,
                    ..sample_fields()
                },
            },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["status"], "in_progress");
        assert_eq!(json["category"], "email");
        assert_eq!(json["recurrence"], "none");
    }
}
