//! Scheduling engine for campcal, a calendar of marketing-campaign events.
//!
//! This crate provides everything between the event store and a rendered grid:
//! - `range`: display ranges and grid buckets for month, week, day and year views
//! - `filter`: free-text, category and status filtering
//! - `placement`: assigning events to day cells, hour slots and month counts
//! - `reschedule`: computing new timestamps when an event is dropped on a bucket
//! - `store`: the `EventStore` contract plus in-memory and directory-backed adapters
//! - `controller`: the view state machine tying the above together

pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod filter;
pub mod identity;
pub mod placement;
pub mod range;
pub mod reschedule;
pub mod store;

// Re-export the data model at crate root for convenience
pub use error::{CampcalError, CampcalResult};
pub use event::*;
