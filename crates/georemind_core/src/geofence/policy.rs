//! Canonical geofence policy.
//!
//! One policy is used by every registration path (single reminder on save
//! and full resync on start): 100 m radius, enter | dwell, 30 s loitering
//! delay, no expiry, initial trigger enter | dwell.

use crate::config::{ConfigError, GeofenceConfig};
use crate::model::region::{MonitoredRegion, RegionExpiry, TransitionMask};
use crate::model::reminder::{Reminder, ReminderValidationError};
use std::time::Duration;

pub const DEFAULT_RADIUS_METERS: f64 = 100.0;
pub const DEFAULT_LOITERING_DELAY: Duration = Duration::from_secs(30);

const SECONDS_PER_HOUR: u64 = 60 * 60;

#[derive(Debug, Clone, PartialEq)]
pub struct GeofencePolicy {
    pub radius_meters: f64,
    pub transition_mask: TransitionMask,
    pub loitering_delay: Duration,
    pub expiry: RegionExpiry,
    /// Transitions reported right away when the device is already inside
    /// a newly registered region.
    pub initial_trigger: TransitionMask,
}

impl Default for GeofencePolicy {
    fn default() -> Self {
        Self {
            radius_meters: DEFAULT_RADIUS_METERS,
            transition_mask: TransitionMask::ENTER | TransitionMask::DWELL,
            loitering_delay: DEFAULT_LOITERING_DELAY,
            expiry: RegionExpiry::Never,
            initial_trigger: TransitionMask::ENTER | TransitionMask::DWELL,
        }
    }
}

impl GeofencePolicy {
    /// Builds a validated policy from the `[geofence]` config section.
    pub fn from_config(config: &GeofenceConfig) -> Result<Self, ConfigError> {
        if !config.radius_meters.is_finite() || config.radius_meters <= 0.0 {
            return Err(ConfigError::InvalidGeofence(format!(
                "radius_meters must be a positive number, got {}",
                config.radius_meters
            )));
        }

        let expiry = match config.expiry_hours {
            None => RegionExpiry::Never,
            Some(0) => {
                return Err(ConfigError::InvalidGeofence(
                    "expiry_hours must be greater than zero when set".to_string(),
                ));
            }
            Some(hours) => {
                let secs = hours.checked_mul(SECONDS_PER_HOUR).ok_or_else(|| {
                    ConfigError::InvalidGeofence(format!("expiry_hours {hours} is too large"))
                })?;
                RegionExpiry::After(Duration::from_secs(secs))
            }
        };

        let mut transition_mask = TransitionMask::ENTER | TransitionMask::DWELL;
        if config.include_exit {
            transition_mask = transition_mask | TransitionMask::EXIT;
        }

        Ok(Self {
            radius_meters: config.radius_meters,
            transition_mask,
            loitering_delay: Duration::from_secs(config.loitering_delay_secs),
            expiry,
            ..Self::default()
        })
    }

    /// Derives the monitored region for one reminder.
    ///
    /// # Errors
    /// Returns the validation failure when the reminder is not
    /// geofence-eligible.
    pub fn region_for(&self, reminder: &Reminder) -> Result<MonitoredRegion, ReminderValidationError> {
        let center = reminder.validate_for_geofence()?;
        Ok(MonitoredRegion {
            region_id: reminder.id.clone(),
            center,
            radius_meters: self.radius_meters,
            transition_mask: self.transition_mask,
            loitering_delay: self.loitering_delay,
            expiry: self.expiry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::GeofencePolicy;
    use crate::config::{ConfigError, GeofenceConfig};
    use crate::model::region::{RegionExpiry, TransitionMask};
    use crate::model::reminder::{Reminder, ReminderValidationError};
    use std::time::Duration;

    #[test]
    fn default_config_matches_default_policy() {
        let policy = GeofencePolicy::from_config(&GeofenceConfig::default()).unwrap();
        assert_eq!(policy, GeofencePolicy::default());
    }

    #[test]
    fn config_can_add_exit_and_expiry() {
        let config = GeofenceConfig {
            include_exit: true,
            expiry_hours: Some(24),
            ..GeofenceConfig::default()
        };
        let policy = GeofencePolicy::from_config(&config).unwrap();
        assert_eq!(
            policy.transition_mask,
            TransitionMask::ENTER | TransitionMask::DWELL | TransitionMask::EXIT
        );
        assert_eq!(
            policy.expiry,
            RegionExpiry::After(Duration::from_secs(24 * 60 * 60))
        );
    }

    #[test]
    fn rejects_non_positive_radius_and_zero_expiry() {
        let radius = GeofenceConfig {
            radius_meters: 0.0,
            ..GeofenceConfig::default()
        };
        assert!(GeofencePolicy::from_config(&radius).is_err());

        let expiry = GeofenceConfig {
            expiry_hours: Some(0),
            ..GeofenceConfig::default()
        };
        assert!(GeofencePolicy::from_config(&expiry).is_err());
    }

    #[test]
    fn rejects_expiry_that_overflows_seconds() {
        let config = GeofenceConfig {
            expiry_hours: Some(u64::MAX / 100),
            ..GeofenceConfig::default()
        };
        assert!(matches!(
            GeofencePolicy::from_config(&config),
            Err(ConfigError::InvalidGeofence(_))
        ));
    }

    #[test]
    fn region_uses_reminder_id_and_label_coordinates() {
        let reminder = Reminder::with_id("r-1", "Pharmacy").labelled("35.0,139.0");
        let region = GeofencePolicy::default().region_for(&reminder).unwrap();
        assert_eq!(region.region_id, "r-1");
        assert_eq!(region.center.latitude, 35.0);
        assert_eq!(region.center.longitude, 139.0);
        assert_eq!(region.radius_meters, 100.0);
        assert_eq!(region.loitering_delay, Duration::from_secs(30));
    }

    #[test]
    fn region_requires_title() {
        let mut reminder = Reminder::with_id("r-2", "   ").at(1.0, 2.0);
        assert_eq!(
            GeofencePolicy::default().region_for(&reminder),
            Err(ReminderValidationError::MissingTitle)
        );
        reminder.title = None;
        assert!(GeofencePolicy::default().region_for(&reminder).is_err());
    }
}
