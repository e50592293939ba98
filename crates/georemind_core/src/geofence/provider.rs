//! Geofencing provider contract.
//!
//! A provider wraps whatever platform primitive watches regions. It delivers
//! transitions to the callback target it was constructed with (usually a
//! `TransitionSender`), out of band from these calls.

use crate::model::region::{MonitoredRegion, TransitionMask};
use crate::model::reminder::ReminderId;
use async_trait::async_trait;
use thiserror::Error;

/// One batched registration call.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationRequest {
    pub regions: Vec<MonitoredRegion>,
    pub initial_trigger: TransitionMask,
}

impl RegistrationRequest {
    pub fn region_ids(&self) -> Vec<ReminderId> {
        self.regions
            .iter()
            .map(|region| region.region_id.clone())
            .collect()
    }
}

/// Provider-side failure. Logged and left unretried by the core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("geofence provider rejected request (code {code}): {message}")]
    Rejected { code: i32, message: String },
    #[error("geofence provider unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait GeofencingProvider: Send + Sync {
    /// Stable provider id used in logs.
    fn provider_id(&self) -> &str;

    /// Adds or replaces every region in `request`, keyed by `region_id`.
    async fn register_regions(&self, request: &RegistrationRequest) -> Result<(), ProviderError>;

    /// Stops monitoring the given ids. Unknown ids are ignored.
    async fn remove_regions(&self, region_ids: &[ReminderId]) -> Result<(), ProviderError>;
}
