//! Transition-to-notification resolution.
//!
//! # Responsibility
//! - Resolve each triggering region id back to a reminder.
//! - Emit one notification per resolved reminder, keyed by region id.
//!
//! # Invariants
//! - Each region id moves `Idle -> Resolving -> Delivered | Dropped`.
//! - Region ids of one event run as independent tasks; a failure or panic
//!   in one never affects the others.
//! - Lookup misses and faults are dropped with a diagnostic log only.
//! - `exit` transitions and provider error events resolve nothing.

use crate::model::reminder::ReminderId;
use crate::model::transition::{TransitionEvent, TransitionKind};
use crate::notify::{EmitError, Notification, NotificationEmitter, NotificationId};
use crate::repo::outcome::Outcome;
use crate::repo::reminder_repository::ReminderRepository;
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Per-region resolution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Idle,
    Resolving,
    Delivered,
    Dropped,
}

impl ResolutionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Resolving => "resolving",
            Self::Delivered => "delivered",
            Self::Dropped => "dropped",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Dropped)
    }

    /// Returns whether `next` is a legal successor of this state.
    pub fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Resolving)
                | (Self::Resolving, Self::Delivered)
                | (Self::Resolving, Self::Dropped)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Repository returned `Outcome::Error` ("not found" or a store fault).
    Lookup(String),
    Emit(EmitError),
    /// The resolution task ended without reporting (panic).
    Aborted(String),
}

/// Terminal record for one region id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionResolution {
    pub region_id: ReminderId,
    pub state: ResolutionState,
    pub notification_id: Option<NotificationId>,
    pub drop_reason: Option<DropReason>,
}

impl RegionResolution {
    pub fn is_delivered(&self) -> bool {
        self.state == ResolutionState::Delivered
    }
}

/// What happened to one delivered event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDisposition {
    /// The provider reported an error instead of regions.
    ProviderError { error_code: i32 },
    /// The transition kind does not trigger notifications.
    Ignored { kind: TransitionKind },
    Processed(Vec<RegionResolution>),
}

impl EventDisposition {
    pub fn delivered_count(&self) -> usize {
        match self {
            Self::Processed(resolutions) => resolutions
                .iter()
                .filter(|resolution| resolution.is_delivered())
                .count(),
            _ => 0,
        }
    }

    pub fn dropped_count(&self) -> usize {
        match self {
            Self::Processed(resolutions) => resolutions.len() - self.delivered_count(),
            _ => 0,
        }
    }
}

/// Tracks one region id through the resolution states.
struct Resolution {
    region_id: ReminderId,
    state: ResolutionState,
}

impl Resolution {
    fn new(region_id: ReminderId) -> Self {
        Self {
            region_id,
            state: ResolutionState::Idle,
        }
    }

    fn advance(&mut self, next: ResolutionState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal resolution transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(
            "event=transition_state module=transition region_id={} from={} to={}",
            self.region_id,
            self.state.as_str(),
            next.as_str()
        );
        self.state = next;
    }

    fn deliver(mut self, notification_id: NotificationId) -> RegionResolution {
        self.advance(ResolutionState::Delivered);
        RegionResolution {
            region_id: self.region_id,
            state: self.state,
            notification_id: Some(notification_id),
            drop_reason: None,
        }
    }

    fn drop_with(mut self, reason: DropReason) -> RegionResolution {
        self.advance(ResolutionState::Dropped);
        RegionResolution {
            region_id: self.region_id,
            state: self.state,
            notification_id: None,
            drop_reason: Some(reason),
        }
    }
}

/// Resolves transition events into notifications.
///
/// Cheap to clone; every clone shares the same collaborators.
#[derive(Clone)]
pub struct TransitionProcessor {
    repository: Arc<dyn ReminderRepository>,
    emitter: Arc<dyn NotificationEmitter>,
}

impl TransitionProcessor {
    pub fn new(
        repository: Arc<dyn ReminderRepository>,
        emitter: Arc<dyn NotificationEmitter>,
    ) -> Self {
        Self {
            repository,
            emitter,
        }
    }

    /// Processes one delivered event to completion.
    ///
    /// Each distinct region id is resolved on its own task; results are
    /// returned in first-seen order.
    pub async fn process(&self, event: TransitionEvent) -> EventDisposition {
        if let Some(error_code) = event.error_code {
            warn!(
                "event=transition_receive module=transition status=error error_code={}",
                error_code
            );
            return EventDisposition::ProviderError { error_code };
        }

        if !event.kind.triggers_notification() {
            debug!(
                "event=transition_receive module=transition status=skip kind={} regions={}",
                event.kind.as_str(),
                event.region_ids.len()
            );
            return EventDisposition::Ignored { kind: event.kind };
        }

        info!(
            "event=transition_receive module=transition status=ok kind={} regions={}",
            event.kind.as_str(),
            event.region_ids.len()
        );

        let mut seen = BTreeSet::new();
        let mut handles = Vec::new();
        for region_id in event.region_ids {
            if !seen.insert(region_id.clone()) {
                continue;
            }
            let processor = self.clone();
            let task_region_id = region_id.clone();
            let handle =
                tokio::spawn(async move { processor.resolve_region(task_region_id).await });
            handles.push((region_id, handle));
        }

        let mut resolutions = Vec::with_capacity(handles.len());
        for (region_id, handle) in handles {
            let resolution = match handle.await {
                Ok(resolution) => resolution,
                Err(err) => {
                    warn!(
                        "event=transition_resolve module=transition status=error region_id={} error_code=task_aborted error={}",
                        region_id, err
                    );
                    let mut resolution = Resolution::new(region_id);
                    resolution.advance(ResolutionState::Resolving);
                    resolution.drop_with(DropReason::Aborted(err.to_string()))
                }
            };
            resolutions.push(resolution);
        }

        let disposition = EventDisposition::Processed(resolutions);
        info!(
            "event=transition_event module=transition status=done kind={} delivered={} dropped={}",
            event.kind.as_str(),
            disposition.delivered_count(),
            disposition.dropped_count()
        );
        disposition
    }

    /// Resolves a single region id and emits its notification.
    pub async fn resolve_region(&self, region_id: ReminderId) -> RegionResolution {
        let mut resolution = Resolution::new(region_id);
        resolution.advance(ResolutionState::Resolving);

        let reminder = match self.repository.get_reminder(&resolution.region_id).await {
            Outcome::Success(reminder) => reminder,
            Outcome::Error(message) => {
                info!(
                    "event=transition_resolve module=transition status=drop region_id={} reason=lookup error={}",
                    resolution.region_id, message
                );
                return resolution.drop_with(DropReason::Lookup(message));
            }
        };

        let notification = Notification::for_reminder(&reminder);
        match self.emitter.notify(&notification).await {
            Ok(()) => {
                info!(
                    "event=transition_resolve module=transition status=ok region_id={} notification_id={}",
                    resolution.region_id, notification.notification_id
                );
                resolution.deliver(notification.notification_id)
            }
            Err(err) => {
                warn!(
                    "event=transition_resolve module=transition status=drop region_id={} reason=emit error={}",
                    resolution.region_id, err
                );
                resolution.drop_with(DropReason::Emit(err))
            }
        }
    }
}
