//! In-process geofencing provider.
//!
//! Holds monitored regions in a map keyed by region id, which gives the same
//! replace-on-re-add semantics as platform providers. Hosts without a real
//! geofencing primitive (CLI, tests) use it to simulate OS transitions.

use crate::geofence::provider::{GeofencingProvider, ProviderError, RegistrationRequest};
use crate::model::region::MonitoredRegion;
use crate::model::reminder::ReminderId;
use crate::model::transition::{TransitionEvent, TransitionKind};
use crate::transition::inbox::{InboxClosed, TransitionSender};
use async_trait::async_trait;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, RwLock};

const PROVIDER_ID: &str = "in_memory";

#[derive(Default)]
pub struct InMemoryGeofencingProvider {
    regions: RwLock<BTreeMap<ReminderId, MonitoredRegion>>,
    register_calls: AtomicUsize,
    remove_calls: AtomicUsize,
    failure: Mutex<Option<ProviderError>>,
    callback: Option<TransitionSender>,
}

impl InMemoryGeofencingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider that delivers simulated transitions to `callback`.
    pub fn with_callback(callback: TransitionSender) -> Self {
        Self {
            callback: Some(callback),
            ..Self::default()
        }
    }

    /// Makes every following call fail with `error` until cleared.
    pub async fn fail_with(&self, error: ProviderError) {
        *self.failure.lock().await = Some(error);
    }

    pub async fn clear_failure(&self) {
        *self.failure.lock().await = None;
    }

    /// Snapshot of monitored regions, ordered by region id.
    pub async fn regions(&self) -> Vec<MonitoredRegion> {
        self.regions.read().await.values().cloned().collect()
    }

    pub async fn region(&self, region_id: &str) -> Option<MonitoredRegion> {
        self.regions.read().await.get(region_id).cloned()
    }

    pub fn register_call_count(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn remove_call_count(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }

    /// Simulates the platform reporting `kind` for the given regions.
    ///
    /// Only monitored regions whose mask includes `kind` are reported. Returns
    /// how many region ids were delivered in the event (zero sends nothing).
    pub async fn deliver(
        &self,
        kind: TransitionKind,
        region_ids: &[&str],
    ) -> Result<usize, InboxClosed> {
        let matching: Vec<ReminderId> = {
            let regions = self.regions.read().await;
            region_ids
                .iter()
                .filter(|id| {
                    regions
                        .get(**id)
                        .is_some_and(|region| region.transition_mask.contains(kind))
                })
                .map(|id| (*id).to_string())
                .collect()
        };

        if matching.is_empty() {
            return Ok(0);
        }

        let Some(callback) = self.callback.as_ref() else {
            warn!(
                "event=geofence_deliver module=geofence status=error provider={} error=no_callback",
                PROVIDER_ID
            );
            return Err(InboxClosed);
        };

        let count = matching.len();
        callback.deliver(TransitionEvent::new(kind, matching))?;
        Ok(count)
    }

    async fn check_failure(&self) -> Result<(), ProviderError> {
        match self.failure.lock().await.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GeofencingProvider for InMemoryGeofencingProvider {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    async fn register_regions(&self, request: &RegistrationRequest) -> Result<(), ProviderError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure().await?;

        let mut regions = self.regions.write().await;
        for region in &request.regions {
            regions.insert(region.region_id.clone(), region.clone());
        }
        debug!(
            "event=geofence_register module=geofence status=ok provider={} count={} total={}",
            PROVIDER_ID,
            request.regions.len(),
            regions.len()
        );
        Ok(())
    }

    async fn remove_regions(&self, region_ids: &[ReminderId]) -> Result<(), ProviderError> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure().await?;

        let mut regions = self.regions.write().await;
        for region_id in region_ids {
            regions.remove(region_id);
        }
        Ok(())
    }
}
