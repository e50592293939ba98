//! Notification payloads and the emitter seam.
//!
//! # Responsibility
//! - Build the user-visible notification for a resolved reminder.
//! - Define the `NotificationEmitter` contract the host implements.
//!
//! # Invariants
//! - `NotificationId` is the region id, so a redelivered transition replaces
//!   the visible notification and different reminders never collide.

mod emitters;

pub use emitters::{LogNotificationEmitter, RecordingNotificationEmitter};

use crate::model::reminder::{Reminder, ReminderId};
use async_trait::async_trait;
use std::fmt::{Display, Formatter};
use thiserror::Error;

pub const GEOFENCE_CHANNEL_ID: &str = "geofence_channel_id";
pub const GEOFENCE_CHANNEL_NAME: &str = "Geofence Notifications";
const DEEP_LINK_PREFIX: &str = "georemind://reminders/";

/// Notification replace key. Equal to the region id, so distinct reminders
/// never share a visible notification.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NotificationId(ReminderId);

impl NotificationId {
    pub fn for_region(region_id: &str) -> Self {
        Self(region_id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NotificationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// User-visible alert for a reminder whose region was entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub notification_id: NotificationId,
    pub channel_id: &'static str,
    pub reminder_id: ReminderId,
    pub title: String,
    pub body: String,
    /// Follow-up target that opens the reminder detail view.
    pub deep_link: String,
}

impl Notification {
    pub fn for_reminder(reminder: &Reminder) -> Self {
        Self {
            notification_id: NotificationId::for_region(&reminder.id),
            channel_id: GEOFENCE_CHANNEL_ID,
            reminder_id: reminder.id.clone(),
            title: reminder.title.clone().unwrap_or_default(),
            body: reminder.description.clone().unwrap_or_default(),
            deep_link: deep_link_for(&reminder.id),
        }
    }
}

/// Deep-link target for the reminder detail view.
pub fn deep_link_for(reminder_id: &str) -> String {
    format!("{DEEP_LINK_PREFIX}{reminder_id}")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    #[error("notifications are disabled for channel `{0}`")]
    ChannelDisabled(String),
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Delivers notifications to the user.
///
/// Implementations must treat `notification_id` as a replace key.
#[async_trait]
pub trait NotificationEmitter: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), EmitError>;
}
