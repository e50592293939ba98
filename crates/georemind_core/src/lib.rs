//! Core domain logic for GeoRemind.
//! This crate is the single source of truth for reminder storage, geofence
//! reconciliation and transition-to-notification resolution.

pub mod config;
pub mod db;
pub mod geofence;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;
pub mod transition;

pub use config::{ConfigError, CoreConfig, GeofenceConfig, LoggingConfig, StorageConfig};
pub use geofence::capability::{
    parse_location_capability, LocationAccess, LocationCapability, StaticLocationAccess,
};
pub use geofence::memory::InMemoryGeofencingProvider;
pub use geofence::policy::GeofencePolicy;
pub use geofence::provider::{GeofencingProvider, ProviderError, RegistrationRequest};
pub use geofence::reconciler::{
    GeofenceReconciler, ReconcileOutcome, ReconcileSummary, RegistrationOutcome, SkippedReminder,
};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::region::{Coordinates, MonitoredRegion, RegionExpiry, TransitionMask};
pub use model::reminder::{Reminder, ReminderId, ReminderValidationError};
pub use model::transition::{TransitionEvent, TransitionKind};
pub use notify::{
    EmitError, LogNotificationEmitter, Notification, NotificationEmitter, NotificationId,
    RecordingNotificationEmitter,
};
pub use repo::outcome::Outcome;
pub use repo::reminder_repository::{LocalReminderRepository, ReminderRepository, REMINDER_NOT_FOUND};
pub use repo::reminder_store::{ReminderStore, SqliteReminderStore, StoreError, StoreResult};
pub use service::reminder_service::{ReminderListing, ReminderService, SaveDecision};
pub use transition::inbox::{transition_channel, InboxClosed, InboxStats, TransitionInbox, TransitionSender};
pub use transition::processor::{
    DropReason, EventDisposition, RegionResolution, ResolutionState, TransitionProcessor,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
