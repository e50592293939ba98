//! Built-in emitters for hosts without a platform notification service.

use super::{EmitError, Notification, NotificationEmitter, NotificationId, GEOFENCE_CHANNEL_NAME};
use async_trait::async_trait;
use log::info;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, RwLock};

/// Emitter that only writes a metadata log line per notification.
#[derive(Debug, Default)]
pub struct LogNotificationEmitter;

#[async_trait]
impl NotificationEmitter for LogNotificationEmitter {
    async fn notify(&self, notification: &Notification) -> Result<(), EmitError> {
        info!(
            "event=notification_emit module=notify status=ok channel={} notification_id={} reminder_id={}",
            GEOFENCE_CHANNEL_NAME, notification.notification_id, notification.reminder_id
        );
        Ok(())
    }
}

/// Emitter that keeps visible notifications in memory, keyed by id.
///
/// Mirrors a notification tray: posting an existing id replaces it.
#[derive(Default)]
pub struct RecordingNotificationEmitter {
    visible: RwLock<BTreeMap<NotificationId, Notification>>,
    deliveries: AtomicUsize,
    failure: Mutex<Option<EmitError>>,
}

impl RecordingNotificationEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications currently visible, ordered by id.
    pub async fn visible(&self) -> Vec<Notification> {
        self.visible.read().await.values().cloned().collect()
    }

    /// Total `notify` calls that were accepted, including replacements.
    pub fn delivery_count(&self) -> usize {
        self.deliveries.load(Ordering::SeqCst)
    }

    /// Makes every following `notify` fail with `error`.
    pub async fn fail_with(&self, error: EmitError) {
        *self.failure.lock().await = Some(error);
    }
}

#[async_trait]
impl NotificationEmitter for RecordingNotificationEmitter {
    async fn notify(&self, notification: &Notification) -> Result<(), EmitError> {
        if let Some(error) = self.failure.lock().await.clone() {
            return Err(error);
        }
        self.visible
            .write()
            .await
            .insert(notification.notification_id.clone(), notification.clone());
        self.deliveries.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
