//! Reminder use-case service.
//!
//! # Responsibility
//! - Provide the UI-facing save/list/delete-all entry points.
//! - Validate input at the boundary and decline instead of failing.
//! - Keep monitored regions in step with reminder mutations.
//!
//! # Invariants
//! - A declined save writes nothing.
//! - A geofence registration failure never undoes a successful save.
//! - Service APIs never bypass the repository.

use crate::geofence::reconciler::{GeofenceReconciler, ReconcileOutcome, RegistrationOutcome};
use crate::model::reminder::{Reminder, ReminderId, ReminderValidationError};
use crate::repo::outcome::Outcome;
use crate::repo::reminder_repository::ReminderRepository;
use crate::repo::reminder_store::StoreResult;
use log::info;
use std::sync::Arc;

/// Result of a validated save request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveDecision {
    Saved {
        reminder_id: ReminderId,
        geofence: RegistrationOutcome,
    },
    /// Input failed validation; `reason_code()` maps to the UI message.
    Declined(ReminderValidationError),
}

/// List projection for the reminders screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderListing {
    pub items: Vec<Reminder>,
    /// True when the empty-state placeholder should be shown.
    pub show_no_data: bool,
}

pub struct ReminderService {
    repository: Arc<dyn ReminderRepository>,
    reconciler: Arc<GeofenceReconciler>,
}

impl ReminderService {
    pub fn new(
        repository: Arc<dyn ReminderRepository>,
        reconciler: Arc<GeofenceReconciler>,
    ) -> Self {
        Self {
            repository,
            reconciler,
        }
    }

    /// Validates, persists, then registers a geofence for the reminder.
    ///
    /// A blank id is replaced with a generated one before persistence.
    ///
    /// # Errors
    /// Store faults propagate unchanged; validation failures do not.
    pub async fn validate_and_save(&self, mut reminder: Reminder) -> StoreResult<SaveDecision> {
        if let Err(reason) = reminder.validate_entered() {
            info!(
                "event=reminder_save module=service status=declined reason={}",
                reason.reason_code()
            );
            return Ok(SaveDecision::Declined(reason));
        }

        reminder.ensure_id();
        self.repository.save_reminder(&reminder).await?;
        let geofence = self.reconciler.add_geofence_for_reminder(&reminder).await;

        Ok(SaveDecision::Saved {
            reminder_id: reminder.id,
            geofence,
        })
    }

    /// Loads the reminders list.
    ///
    /// A store fault is passed through as `Outcome::Error` for the UI to show.
    pub async fn list_reminders(&self) -> Outcome<ReminderListing> {
        self.repository
            .get_reminders()
            .await
            .map(|items| ReminderListing {
                show_no_data: items.is_empty(),
                items,
            })
    }

    /// Deletes every reminder, then resyncs monitored regions.
    pub async fn delete_all_reminders(&self) -> StoreResult<ReconcileOutcome> {
        self.repository.delete_all_reminders().await?;
        Ok(self.reconciler.setup_all_geofences().await)
    }

    /// Full resync, meant for app start once location access is granted.
    pub async fn sync_geofences(&self) -> ReconcileOutcome {
        self.reconciler.setup_all_geofences().await
    }
}
