//! Geofence transition pipeline.
//!
//! `inbox` turns platform callbacks into queued events; `processor` resolves
//! each event's regions into notifications.

pub mod inbox;
pub mod processor;
