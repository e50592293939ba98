//! Location capability declarations and the precondition gate.
//!
//! The core never prompts for permissions. It only asks the host whether the
//! capabilities are already granted and no-ops when they are not.

use std::collections::BTreeSet;
use thiserror::Error;

/// Location capability required before any region is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LocationCapability {
    /// Precise location while the app is in use.
    Foreground,
    /// Location access while the app is not visible.
    Background,
}

impl LocationCapability {
    /// Stable string id used in host declarations and CLI flags.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Foreground => LOCATION_CAPABILITY_FOREGROUND,
            Self::Background => LOCATION_CAPABILITY_BACKGROUND,
        }
    }

    /// User-facing short description.
    pub fn description(self) -> &'static str {
        match self {
            Self::Foreground => "Allow precise location access while the app is open.",
            Self::Background => "Allow location access in the background to watch reminder areas.",
        }
    }
}

pub const LOCATION_CAPABILITY_FOREGROUND: &str = "foreground";
pub const LOCATION_CAPABILITY_BACKGROUND: &str = "background";

/// Every capability geofence registration depends on.
pub const REQUIRED_LOCATION_CAPABILITIES: &[LocationCapability] =
    &[LocationCapability::Foreground, LocationCapability::Background];

/// Parses one capability from its string id.
pub fn parse_location_capability(value: &str) -> Result<LocationCapability, CapabilityError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(CapabilityError::EmptyCapability);
    }

    match normalized {
        LOCATION_CAPABILITY_FOREGROUND => Ok(LocationCapability::Foreground),
        LOCATION_CAPABILITY_BACKGROUND => Ok(LocationCapability::Background),
        other => Err(CapabilityError::UnsupportedCapability(other.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("location capability value must not be empty")]
    EmptyCapability,
    #[error("location capability is unsupported: {0}")]
    UnsupportedCapability(String),
}

/// Host-side view of location permissions and device settings.
pub trait LocationAccess: Send + Sync {
    fn is_granted(&self, capability: LocationCapability) -> bool;

    /// Whether device location services are switched on.
    fn location_enabled(&self) -> bool {
        true
    }
}

/// Returns the capabilities still blocking registration.
///
/// An empty result means the gate is open. When device location is off,
/// every required capability is reported.
pub fn missing_capabilities(access: &dyn LocationAccess) -> Vec<LocationCapability> {
    if !access.location_enabled() {
        return REQUIRED_LOCATION_CAPABILITIES.to_vec();
    }
    REQUIRED_LOCATION_CAPABILITIES
        .iter()
        .copied()
        .filter(|capability| !access.is_granted(*capability))
        .collect()
}

/// Fixed grant set, for hosts that resolve permissions up front and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticLocationAccess {
    granted: BTreeSet<LocationCapability>,
    location_enabled: bool,
}

impl StaticLocationAccess {
    pub fn new(granted: impl IntoIterator<Item = LocationCapability>) -> Self {
        Self {
            granted: granted.into_iter().collect(),
            location_enabled: true,
        }
    }

    pub fn all_granted() -> Self {
        Self::new(REQUIRED_LOCATION_CAPABILITIES.iter().copied())
    }

    pub fn denied() -> Self {
        Self::new([])
    }

    /// Simulates device location services switched off.
    pub fn location_disabled(mut self) -> Self {
        self.location_enabled = false;
        self
    }
}

impl LocationAccess for StaticLocationAccess {
    fn is_granted(&self, capability: LocationCapability) -> bool {
        self.granted.contains(&capability)
    }

    fn location_enabled(&self) -> bool {
        self.location_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::{
        missing_capabilities, parse_location_capability, CapabilityError, LocationCapability,
        StaticLocationAccess,
    };

    #[test]
    fn parses_supported_capabilities() {
        assert_eq!(
            parse_location_capability("foreground").expect("foreground parse"),
            LocationCapability::Foreground
        );
        assert_eq!(
            parse_location_capability(" background ").expect("background parse"),
            LocationCapability::Background
        );
    }

    #[test]
    fn rejects_empty_and_unknown_capabilities() {
        assert_eq!(
            parse_location_capability("  ").expect_err("empty must fail"),
            CapabilityError::EmptyCapability
        );
        assert_eq!(
            parse_location_capability("Background").expect_err("case matters"),
            CapabilityError::UnsupportedCapability("Background".to_string())
        );
    }

    #[test]
    fn reports_missing_background_capability() {
        let access = StaticLocationAccess::new([LocationCapability::Foreground]);
        assert_eq!(
            missing_capabilities(&access),
            vec![LocationCapability::Background]
        );
        assert!(missing_capabilities(&StaticLocationAccess::all_granted()).is_empty());
    }

    #[test]
    fn disabled_location_blocks_even_with_grants() {
        let access = StaticLocationAccess::all_granted().location_disabled();
        assert_eq!(missing_capabilities(&access).len(), 2);
    }

    #[test]
    fn exposes_user_facing_descriptions() {
        assert!(LocationCapability::Foreground
            .description()
            .contains("precise location"));
        assert!(LocationCapability::Background
            .description()
            .contains("background"));
    }
}
