//! Derived geofence region values.
//!
//! # Responsibility
//! - Represent validated geographic points.
//! - Represent monitored circular regions as handed to a geofencing provider.
//!
//! # Invariants
//! - `Coordinates` are finite and inside WGS84 bounds.
//! - A `MonitoredRegion` is a view over one reminder; `region_id` equals the
//!   reminder id.

use crate::model::reminder::{ReminderId, ReminderValidationError};
use crate::model::transition::TransitionKind;
use std::fmt::{Display, Formatter};
use std::ops::BitOr;
use std::time::Duration;

/// Validated latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Builds a coordinate pair after range and finiteness checks.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ReminderValidationError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ReminderValidationError::InvalidCoordinates(format!(
                "latitude {latitude} is outside [-90, 90]"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ReminderValidationError::InvalidCoordinates(format!(
                "longitude {longitude} is outside [-180, 180]"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

impl Display for Coordinates {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Bit set of transition kinds a region reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TransitionMask(u8);

impl TransitionMask {
    pub const ENTER: Self = Self(1);
    pub const EXIT: Self = Self(1 << 1);
    pub const DWELL: Self = Self(1 << 2);

    /// Returns the raw bit representation.
    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns whether `kind` is reported by this mask.
    pub const fn contains(self, kind: TransitionKind) -> bool {
        self.0 & kind.mask().0 != 0
    }
}

impl BitOr for TransitionMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

/// Lifetime of a monitored region on the provider side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegionExpiry {
    #[default]
    Never,
    After(Duration),
}

/// Circular region monitored by the geofencing provider.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoredRegion {
    pub region_id: ReminderId,
    pub center: Coordinates,
    pub radius_meters: f64,
    pub transition_mask: TransitionMask,
    /// Time a device must stay inside before a dwell transition fires.
    pub loitering_delay: Duration,
    pub expiry: RegionExpiry,
}
