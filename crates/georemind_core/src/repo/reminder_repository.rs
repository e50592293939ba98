//! Async reminder repository facade.
//!
//! # Responsibility
//! - Single source of truth for reminders used by the UI, the geofence
//!   reconciler and the transition processor.
//! - Move blocking store calls off async worker threads.
//!
//! # Invariants
//! - Writes return `StoreError` on fault; reads return `Outcome::Error`.
//! - A missing id yields `Outcome::Error(REMINDER_NOT_FOUND)`.
//! - A write that returned `Ok` is visible to every later read.

use crate::model::reminder::{Reminder, ReminderId};
use crate::repo::outcome::Outcome;
use crate::repo::reminder_store::{ReminderStore, StoreError, StoreResult};
use async_trait::async_trait;
use log::{debug, error};
use std::sync::Arc;

/// Message carried by `Outcome::Error` when no reminder matches an id.
pub const REMINDER_NOT_FOUND: &str = "Reminder not found!";

/// Async repository contract consumed by every other core component.
#[async_trait]
pub trait ReminderRepository: Send + Sync {
    /// Persists one reminder (upsert by id).
    async fn save_reminder(&self, reminder: &Reminder) -> StoreResult<()>;
    /// Lists every stored reminder; `Error` only on store fault.
    async fn get_reminders(&self) -> Outcome<Vec<Reminder>>;
    /// Loads one reminder by id.
    async fn get_reminder(&self, id: &str) -> Outcome<Reminder>;
    /// Removes every stored reminder.
    async fn delete_all_reminders(&self) -> StoreResult<()>;
}

/// Repository backed by a local `ReminderStore`.
#[derive(Clone)]
pub struct LocalReminderRepository {
    store: Arc<dyn ReminderStore>,
}

impl LocalReminderRepository {
    pub fn new(store: Arc<dyn ReminderStore>) -> Self {
        Self { store }
    }

    async fn run_blocking<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn ReminderStore) -> StoreResult<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|err| StoreError::Worker(err.to_string()))?
    }
}

#[async_trait]
impl ReminderRepository for LocalReminderRepository {
    async fn save_reminder(&self, reminder: &Reminder) -> StoreResult<()> {
        let owned = reminder.clone();
        let reminder_id: ReminderId = reminder.id.clone();
        match self.run_blocking(move |store| store.save(&owned)).await {
            Ok(()) => {
                debug!(
                    "event=reminder_save module=repo status=ok reminder_id={}",
                    reminder_id
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=reminder_save module=repo status=error reminder_id={} error={}",
                    reminder_id, err
                );
                Err(err)
            }
        }
    }

    async fn get_reminders(&self) -> Outcome<Vec<Reminder>> {
        match self.run_blocking(|store| store.get_all()).await {
            Ok(reminders) => Outcome::Success(reminders),
            Err(err) => {
                error!(
                    "event=reminder_list module=repo status=error error={}",
                    err
                );
                Outcome::Error(err.to_string())
            }
        }
    }

    async fn get_reminder(&self, id: &str) -> Outcome<Reminder> {
        let lookup_id = id.to_string();
        match self
            .run_blocking(move |store| store.get_by_id(&lookup_id))
            .await
        {
            Ok(Some(reminder)) => Outcome::Success(reminder),
            Ok(None) => {
                debug!(
                    "event=reminder_get module=repo status=not_found reminder_id={}",
                    id
                );
                Outcome::error(REMINDER_NOT_FOUND)
            }
            Err(err) => {
                error!(
                    "event=reminder_get module=repo status=error reminder_id={} error={}",
                    id, err
                );
                Outcome::Error(err.to_string())
            }
        }
    }

    async fn delete_all_reminders(&self) -> StoreResult<()> {
        self.run_blocking(|store| store.delete_all()).await?;
        debug!("event=reminder_delete_all module=repo status=ok");
        Ok(())
    }
}
