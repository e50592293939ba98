//! Geofence reconciliation against an external geofencing provider.
//!
//! # Responsibility
//! - Gate provider calls on the location capabilities.
//! - Derive monitored regions from reminders with one canonical policy.
//! - Keep the provider's region set in line with the reminder set.
//!
//! # Invariants
//! - Regions are keyed by reminder id; re-registering an id replaces it.
//! - Provider faults are logged and never retried here.

pub mod capability;
pub mod memory;
pub mod policy;
pub mod provider;
pub mod reconciler;
