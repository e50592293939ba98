//! Reminder-to-region reconciliation.
//!
//! # Responsibility
//! - Derive the desired region set from the repository on demand.
//! - Register it in one provider call and drop regions this process
//!   registered earlier that are no longer desired.
//! - Register a single reminder right after it is saved.
//!
//! # Invariants
//! - Without the location capabilities every operation is a logged no-op.
//! - Ineligible reminders are skipped, never fatal.
//! - Provider failures leave previously registered regions in place.
//! - Full reconciliations are serialized; running one twice on an unchanged
//!   reminder set yields the same region set.

use crate::geofence::capability::{missing_capabilities, LocationAccess, LocationCapability};
use crate::geofence::policy::GeofencePolicy;
use crate::geofence::provider::{GeofencingProvider, ProviderError, RegistrationRequest};
use crate::model::reminder::{Reminder, ReminderId, ReminderValidationError};
use crate::repo::outcome::Outcome;
use crate::repo::reminder_repository::ReminderRepository;
use log::{info, warn};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Reminder left out of reconciliation, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedReminder {
    pub reminder_id: ReminderId,
    pub reason: ReminderValidationError,
}

/// What one full reconciliation did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Ids submitted in the registration call.
    pub registered: Vec<ReminderId>,
    pub skipped: Vec<SkippedReminder>,
    /// Previously registered ids removed because they are no longer desired.
    pub removed: Vec<ReminderId>,
    pub register_error: Option<ProviderError>,
    pub remove_error: Option<ProviderError>,
}

impl ReconcileSummary {
    /// True when the provider rejected the register or remove call.
    pub fn has_provider_error(&self) -> bool {
        self.register_error.is_some() || self.remove_error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The location gate was closed; nothing was sent to the provider.
    Skipped { missing: Vec<LocationCapability> },
    /// The reminder set could not be read.
    ReadFailed { message: String },
    Completed(ReconcileSummary),
}

/// Result of registering one reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered { region_id: ReminderId },
    Declined(ReminderValidationError),
    ProviderFailed(ProviderError),
    Skipped { missing: Vec<LocationCapability> },
}

pub struct GeofenceReconciler {
    repository: Arc<dyn ReminderRepository>,
    provider: Arc<dyn GeofencingProvider>,
    access: Arc<dyn LocationAccess>,
    policy: GeofencePolicy,
    /// Ids this process has successfully registered.
    registered: Mutex<BTreeSet<ReminderId>>,
}

impl GeofenceReconciler {
    pub fn new(
        repository: Arc<dyn ReminderRepository>,
        provider: Arc<dyn GeofencingProvider>,
        access: Arc<dyn LocationAccess>,
        policy: GeofencePolicy,
    ) -> Self {
        Self {
            repository,
            provider,
            access,
            policy,
            registered: Mutex::new(BTreeSet::new()),
        }
    }

    /// Ids currently believed registered by this process.
    pub async fn registered_ids(&self) -> Vec<ReminderId> {
        self.registered.lock().await.iter().cloned().collect()
    }

    /// Full-catalog reconciliation, run on start and after bulk changes.
    pub async fn setup_all_geofences(&self) -> ReconcileOutcome {
        if let Some(missing) = self.closed_gate("setup_all") {
            return ReconcileOutcome::Skipped { missing };
        }

        // Held for the whole run so concurrent reconciliations cannot
        // interleave their remove/register calls.
        let mut registered = self.registered.lock().await;

        let reminders = match self.repository.get_reminders().await {
            Outcome::Success(reminders) => reminders,
            Outcome::Error(message) => {
                warn!(
                    "event=geofence_reconcile module=geofence status=error stage=read error={}",
                    message
                );
                return ReconcileOutcome::ReadFailed { message };
            }
        };

        let mut summary = ReconcileSummary::default();
        let mut regions = Vec::with_capacity(reminders.len());
        for reminder in &reminders {
            match self.policy.region_for(reminder) {
                Ok(region) => regions.push(region),
                Err(reason) => {
                    warn!(
                        "event=geofence_reconcile module=geofence status=skip reminder_id={} reason={}",
                        reminder.id,
                        reason.reason_code()
                    );
                    summary.skipped.push(SkippedReminder {
                        reminder_id: reminder.id.clone(),
                        reason,
                    });
                }
            }
        }

        let desired: BTreeSet<ReminderId> = regions
            .iter()
            .map(|region| region.region_id.clone())
            .collect();
        let stale: Vec<ReminderId> = registered.difference(&desired).cloned().collect();

        if !stale.is_empty() {
            match self.provider.remove_regions(&stale).await {
                Ok(()) => {
                    for region_id in &stale {
                        registered.remove(region_id);
                    }
                    summary.removed = stale;
                }
                Err(err) => {
                    warn!(
                        "event=geofence_remove module=geofence status=error provider={} count={} error={}",
                        self.provider.provider_id(),
                        stale.len(),
                        err
                    );
                    summary.remove_error = Some(err);
                }
            }
        }

        if !regions.is_empty() {
            let request = RegistrationRequest {
                regions,
                initial_trigger: self.policy.initial_trigger,
            };
            let ids = request.region_ids();
            match self.provider.register_regions(&request).await {
                Ok(()) => {
                    registered.extend(ids.iter().cloned());
                    summary.registered = ids;
                }
                Err(err) => {
                    warn!(
                        "event=geofence_register module=geofence status=error provider={} count={} error={}",
                        self.provider.provider_id(),
                        ids.len(),
                        err
                    );
                    summary.register_error = Some(err);
                }
            }
        }

        if summary.has_provider_error() {
            warn!(
                "event=geofence_reconcile module=geofence status=error registered={} skipped={} removed={} register_failed={} remove_failed={}",
                summary.registered.len(),
                summary.skipped.len(),
                summary.removed.len(),
                summary.register_error.is_some(),
                summary.remove_error.is_some()
            );
        } else {
            info!(
                "event=geofence_reconcile module=geofence status=ok registered={} skipped={} removed={}",
                summary.registered.len(),
                summary.skipped.len(),
                summary.removed.len()
            );
        }
        ReconcileOutcome::Completed(summary)
    }

    /// Registers the region for one reminder, typically right after a save.
    pub async fn add_geofence_for_reminder(&self, reminder: &Reminder) -> RegistrationOutcome {
        if let Some(missing) = self.closed_gate("add_one") {
            return RegistrationOutcome::Skipped { missing };
        }

        let region = match self.policy.region_for(reminder) {
            Ok(region) => region,
            Err(reason) => {
                warn!(
                    "event=geofence_register module=geofence status=skip reminder_id={} reason={}",
                    reminder.id,
                    reason.reason_code()
                );
                return RegistrationOutcome::Declined(reason);
            }
        };

        let region_id = region.region_id.clone();
        let request = RegistrationRequest {
            regions: vec![region],
            initial_trigger: self.policy.initial_trigger,
        };
        match self.provider.register_regions(&request).await {
            Ok(()) => {
                self.registered.lock().await.insert(region_id.clone());
                info!(
                    "event=geofence_register module=geofence status=ok provider={} reminder_id={}",
                    self.provider.provider_id(),
                    region_id
                );
                RegistrationOutcome::Registered { region_id }
            }
            Err(err) => {
                warn!(
                    "event=geofence_register module=geofence status=error provider={} reminder_id={} error={}",
                    self.provider.provider_id(),
                    region_id,
                    err
                );
                RegistrationOutcome::ProviderFailed(err)
            }
        }
    }

    fn closed_gate(&self, operation: &str) -> Option<Vec<LocationCapability>> {
        let missing = missing_capabilities(self.access.as_ref());
        if missing.is_empty() {
            return None;
        }
        let names: Vec<&str> = missing.iter().map(|capability| capability.as_str()).collect();
        warn!(
            "event=geofence_{} module=geofence status=skip reason=location_access_missing missing={}",
            operation,
            names.join(",")
        );
        Some(missing)
    }
}
