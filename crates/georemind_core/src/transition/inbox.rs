//! Inbound channel for platform transition callbacks.
//!
//! The platform calls back at least once, unordered, from threads the core
//! does not own. Callbacks push into a `TransitionSender`; one background
//! worker drains the `TransitionInbox` and runs every event on its own task,
//! so a slow lookup never holds up later events.

use crate::model::transition::TransitionEvent;
use crate::transition::processor::{EventDisposition, TransitionProcessor};
use log::{info, warn};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("transition inbox is closed")]
pub struct InboxClosed;

/// Callback target handed to geofencing providers. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TransitionSender {
    tx: mpsc::UnboundedSender<TransitionEvent>,
}

impl TransitionSender {
    /// Enqueues one event without waiting for it to be processed.
    pub fn deliver(&self, event: TransitionEvent) -> Result<(), InboxClosed> {
        self.tx.send(event).map_err(|_| InboxClosed)
    }
}

/// Receiving half, consumed by `spawn`.
pub struct TransitionInbox {
    rx: mpsc::UnboundedReceiver<TransitionEvent>,
}

/// Counters reported when the worker stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InboxStats {
    pub events: usize,
    pub delivered: usize,
    pub dropped: usize,
    pub ignored: usize,
    pub provider_errors: usize,
    pub aborted: usize,
}

impl InboxStats {
    fn record(&mut self, result: Result<EventDisposition, JoinError>) {
        match result {
            Ok(EventDisposition::Processed(resolutions)) => {
                let delivered = resolutions.iter().filter(|r| r.is_delivered()).count();
                self.delivered += delivered;
                self.dropped += resolutions.len() - delivered;
            }
            Ok(EventDisposition::Ignored { .. }) => self.ignored += 1,
            Ok(EventDisposition::ProviderError { .. }) => self.provider_errors += 1,
            Err(err) => {
                warn!(
                    "event=transition_inbox module=transition status=error error_code=event_task_aborted error={}",
                    err
                );
                self.aborted += 1;
            }
        }
    }
}

/// Creates a connected sender/inbox pair.
pub fn transition_channel() -> (TransitionSender, TransitionInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (TransitionSender { tx }, TransitionInbox { rx })
}

impl TransitionInbox {
    /// Starts the background worker.
    ///
    /// The worker stops once every sender is dropped and all in-flight
    /// events have finished, then returns its counters.
    pub fn spawn(self, processor: TransitionProcessor) -> JoinHandle<InboxStats> {
        tokio::spawn(self.run(processor))
    }

    async fn run(mut self, processor: TransitionProcessor) -> InboxStats {
        let mut stats = InboxStats::default();
        let mut in_flight = JoinSet::new();

        info!("event=transition_inbox module=transition status=start");
        while let Some(event) = self.rx.recv().await {
            stats.events += 1;
            let processor = processor.clone();
            in_flight.spawn(async move { processor.process(event).await });

            while let Some(result) = in_flight.try_join_next() {
                stats.record(result);
            }
        }

        while let Some(result) = in_flight.join_next().await {
            stats.record(result);
        }
        info!(
            "event=transition_inbox module=transition status=stop events={} delivered={} dropped={} ignored={}",
            stats.events, stats.delivered, stats.dropped, stats.ignored
        );
        stats
    }
}
