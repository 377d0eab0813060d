//! Who is acting on the calendar.

use chrono::{DateTime, Utc};

use crate::error::{CampcalError, CampcalResult};
use crate::event::UserId;

/// Source of the current user. Sign-in flows live outside the engine.
pub trait Identity: Send + Sync {
    fn current_user_id(&self) -> Option<UserId>;

    /// The current user, or [`CampcalError::NotAuthenticated`].
    fn require_user(&self) -> CampcalResult<UserId> {
        self.current_user_id().ok_or(CampcalError::NotAuthenticated)
    }
}

/// A fixed identity, e.g. from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(Option<UserId>);

impl StaticIdentity {
    pub fn signed_in(user_id: &str) -> Self {
        StaticIdentity(Some(UserId::new(user_id)))
    }

    pub fn anonymous() -> Self {
        StaticIdentity(None)
    }
}

impl From<Option<String>> for StaticIdentity {
    fn from(user_id: Option<String>) -> Self {
        StaticIdentity(
            user_id
                .filter(|id| !id.trim().is_empty())
                .map(|id| UserId::new(id.trim())),
        )
    }
}

impl Identity for StaticIdentity {
    fn current_user_id(&self) -> Option<UserId> {
        self.0.clone()
    }
}

/// Wall clock used for "today".
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
