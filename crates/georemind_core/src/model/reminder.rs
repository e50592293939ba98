//! Reminder domain model.
//!
//! # Responsibility
//! - Define the canonical reminder record persisted by the store.
//! - Resolve reminder coordinates and validate geofence eligibility.
//!
//! # Invariants
//! - `id` is stable and never reused for another reminder.
//! - A reminder may be persisted while incomplete; only geofence creation
//!   requires a non-blank title and a valid coordinate pair.
//! - Explicit `latitude`/`longitude` take precedence over the location label.

use crate::model::region::Coordinates;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Stable identifier of a reminder. Also used as the geofence region id.
pub type ReminderId = String;

static LOCATION_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*([+-]?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?)\s*,\s*([+-]?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?)\s*$",
    )
        .expect("valid location label regex")
});

/// Canonical persisted reminder record.
///
/// Every descriptive field is optional so a draft can be stored before the
/// user finishes selecting a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    /// Stable id; generated as a UUIDv4 string when absent on the wire.
    #[serde(default = "generate_reminder_id")]
    pub id: ReminderId,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Free-text location label. Serialized as `location` to match the
    /// external schema naming.
    #[serde(rename = "location")]
    pub location_label: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Reminder {
    /// Creates a reminder draft with a generated id and the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(generate_reminder_id(), title)
    }

    /// Creates a reminder draft with a caller-provided id.
    ///
    /// Used by import paths and tests where identity already exists.
    pub fn with_id(id: impl Into<ReminderId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: Some(title.into()),
            description: None,
            location_label: None,
            latitude: None,
            longitude: None,
        }
    }

    /// Sets the description and returns the updated reminder.
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the free-text location label and returns the updated reminder.
    pub fn labelled(mut self, location_label: impl Into<String>) -> Self {
        self.location_label = Some(location_label.into());
        self
    }

    /// Sets explicit coordinates and returns the updated reminder.
    pub fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Assigns a generated id when the current one is blank.
    ///
    /// Returns `true` when a new id was generated.
    pub fn ensure_id(&mut self) -> bool {
        if self.id.trim().is_empty() {
            self.id = generate_reminder_id();
            return true;
        }
        false
    }

    /// Returns the title when it is present and non-blank.
    pub fn display_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
    }

    /// Resolves the geographic point of this reminder.
    ///
    /// Explicit coordinates win when both are present; otherwise the location
    /// label is parsed as `"<lat>,<lon>"`.
    ///
    /// # Errors
    /// - `MissingLocation` when neither source is present.
    /// - `InvalidCoordinates` when a source is present but unusable.
    pub fn coordinates(&self) -> Result<Coordinates, ReminderValidationError> {
        if let (Some(latitude), Some(longitude)) = (self.latitude, self.longitude) {
            return Coordinates::new(latitude, longitude);
        }

        match self
            .location_label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
        {
            Some(label) => parse_location_label(label),
            None => Err(ReminderValidationError::MissingLocation),
        }
    }

    /// Validates user-entered data before the reminder is persisted.
    ///
    /// Requires a non-blank title and some location source (label or
    /// explicit coordinates). Does not parse the label.
    pub fn validate_entered(&self) -> Result<(), ReminderValidationError> {
        if self.display_title().is_none() {
            return Err(ReminderValidationError::MissingTitle);
        }

        let has_label = self
            .location_label
            .as_deref()
            .is_some_and(|label| !label.trim().is_empty());
        let has_coordinates = self.latitude.is_some() && self.longitude.is_some();
        if !has_label && !has_coordinates {
            return Err(ReminderValidationError::MissingLocation);
        }

        Ok(())
    }

    /// Validates geofence eligibility and returns the region center.
    pub fn validate_for_geofence(&self) -> Result<Coordinates, ReminderValidationError> {
        if self.display_title().is_none() {
            return Err(ReminderValidationError::MissingTitle);
        }
        self.coordinates()
    }

    /// Returns whether a geofence may be created for this reminder.
    pub fn is_geofence_eligible(&self) -> bool {
        self.validate_for_geofence().is_ok()
    }
}

/// Validation failures for reminder input and geofence eligibility.
///
/// Each variant carries a stable reason code for UI message lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReminderValidationError {
    #[error("reminder title must not be empty")]
    MissingTitle,
    #[error("reminder location must be selected")]
    MissingLocation,
    #[error("reminder coordinates are invalid: {0}")]
    InvalidCoordinates(String),
}

impl ReminderValidationError {
    /// Stable reason code surfaced to callers of declined operations.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::MissingTitle => "err_enter_title",
            Self::MissingLocation => "err_select_location",
            Self::InvalidCoordinates(_) => "err_invalid_coordinates",
        }
    }
}

/// Generates a fresh reminder id.
pub fn generate_reminder_id() -> ReminderId {
    Uuid::new_v4().to_string()
}

fn parse_location_label(label: &str) -> Result<Coordinates, ReminderValidationError> {
    let captures = LOCATION_LABEL_RE.captures(label).ok_or_else(|| {
        ReminderValidationError::InvalidCoordinates(format!(
            "location label `{label}` is not a `lat,lon` pair"
        ))
    })?;

    let parse = |value: &str| {
        value.parse::<f64>().map_err(|_| {
            ReminderValidationError::InvalidCoordinates(format!("`{value}` is not a number"))
        })
    };
    Coordinates::new(parse(&captures[1])?, parse(&captures[2])?)
}
