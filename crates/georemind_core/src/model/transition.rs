//! Geofence transition signals delivered by the platform.
//!
//! Events are ephemeral: they are never persisted and may be delivered more
//! than once, out of order.

use crate::model::region::TransitionMask;
use crate::model::reminder::ReminderId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// How a device crossed a monitored region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Enter,
    Exit,
    Dwell,
}

impl TransitionKind {
    /// Stable string id used in logs and CLI input.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::Exit => "exit",
            Self::Dwell => "dwell",
        }
    }

    /// Single-bit mask for this kind.
    pub const fn mask(self) -> TransitionMask {
        match self {
            Self::Enter => TransitionMask::ENTER,
            Self::Exit => TransitionMask::EXIT,
            Self::Dwell => TransitionMask::DWELL,
        }
    }

    /// Returns whether this kind resolves into a user notification.
    ///
    /// `Exit` is reserved and currently ignored.
    pub fn triggers_notification(self) -> bool {
        matches!(self, Self::Enter | Self::Dwell)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported transition kind `{0}`; expected enter|exit|dwell")]
pub struct UnknownTransitionKind(pub String);

impl FromStr for TransitionKind {
    type Err = UnknownTransitionKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "enter" => Ok(Self::Enter),
            "exit" => Ok(Self::Exit),
            "dwell" => Ok(Self::Dwell),
            other => Err(UnknownTransitionKind(other.to_string())),
        }
    }
}

/// Platform-delivered transition naming one or more crossed regions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub region_ids: Vec<ReminderId>,
    pub kind: TransitionKind,
    /// Provider error code; an event carrying one has no usable regions.
    #[serde(default)]
    pub error_code: Option<i32>,
}

impl TransitionEvent {
    pub fn new<I, S>(kind: TransitionKind, region_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ReminderId>,
    {
        Self {
            region_ids: region_ids.into_iter().map(Into::into).collect(),
            kind,
            error_code: None,
        }
    }

    /// Builds an event that reports a provider-side failure.
    pub fn failed(kind: TransitionKind, error_code: i32) -> Self {
        Self {
            region_ids: Vec::new(),
            kind,
            error_code: Some(error_code),
        }
    }
}
