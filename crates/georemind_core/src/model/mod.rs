//! Domain model for location reminders and their geofence projections.
//!
//! # Responsibility
//! - Define the persisted `Reminder` record and its validation rules.
//! - Define derived geofence values (`MonitoredRegion`) and ephemeral
//!   provider signals (`TransitionEvent`).
//!
//! # Invariants
//! - Every reminder is identified by a stable, non-blank `ReminderId`.
//! - Monitored regions are computed from reminders and never persisted.

pub mod region;
pub mod reminder;
pub mod transition;
