//! Runtime configuration for core and its hosts.
//!
//! # Responsibility
//! - Hold defaults for storage location, add-region radius and notification
//!   texts.
//! - Read overrides from environment variables.
//!
//! # Invariants
//! - `from_env` never fails; unusable overrides fall back to defaults.

use log::warn;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "TUNITY_DB_PATH";
pub const DEFAULT_RADIUS_ENV: &str = "TUNITY_DEFAULT_RADIUS_M";

const DB_FILE_NAME: &str = "tunity.sqlite3";
const APPLICATION_ID: &str = "me.loterio.tunity";

/// Radius used by the add-region screen, in meters.
pub const DEFAULT_RADIUS_M: f64 = 50.0;

/// Texts and identifiers for the exit notification.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationConfig {
    pub channel_id: String,
    pub channel_name: String,
    pub channel_description: String,
    pub exit_message: String,
}

impl NotificationConfig {
    pub fn for_application(application_id: &str) -> Self {
        Self {
            channel_id: format!("{application_id}.channel"),
            channel_name: "Tunity".to_string(),
            channel_description: "Alerts when you leave one of your geofences".to_string(),
            exit_message: "You did exit the geofence".to_string(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self::for_application(APPLICATION_ID)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TunityConfig {
    pub db_path: PathBuf,
    pub default_radius_m: f64,
    /// Receiver named by the callback target handed to the OS.
    pub transition_receiver: String,
    pub notification: NotificationConfig,
}

impl Default for TunityConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DB_FILE_NAME),
            default_radius_m: DEFAULT_RADIUS_M,
            transition_receiver: format!("{APPLICATION_ID}.GeofenceBroadcastReceiver"),
            notification: NotificationConfig::default(),
        }
    }
}

impl TunityConfig {
    /// Builds configuration from defaults plus environment overrides.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(DB_PATH_ENV) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                config.db_path = PathBuf::from(trimmed);
            }
        }

        if let Some(raw) = lookup(DEFAULT_RADIUS_ENV) {
            match raw.trim().parse::<f64>() {
                Ok(value) if value.is_finite() && value > 0.0 => config.default_radius_m = value,
                _ => warn!(
                    "event=config_load module=config status=fallback key={} reason=invalid_radius",
                    DEFAULT_RADIUS_ENV
                ),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::{TunityConfig, DB_PATH_ENV, DEFAULT_RADIUS_ENV, DEFAULT_RADIUS_M};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_overrides() {
        let config = TunityConfig::from_lookup(lookup(&[]));
        assert_eq!(config.default_radius_m, DEFAULT_RADIUS_M);
        assert!(config.db_path.ends_with("tunity.sqlite3"));
        assert_eq!(config.notification.channel_id, "me.loterio.tunity.channel");
    }

    #[test]
    fn overrides_are_read_and_bad_radius_falls_back() {
        let config = TunityConfig::from_lookup(lookup(&[
            (DB_PATH_ENV, " /data/tunity.db "),
            (DEFAULT_RADIUS_ENV, "75.5"),
        ]));
        assert_eq!(config.db_path, PathBuf::from("/data/tunity.db"));
        assert_eq!(config.default_radius_m, 75.5);

        let config = TunityConfig::from_lookup(lookup(&[(DEFAULT_RADIUS_ENV, "-3")]));
        assert_eq!(config.default_radius_m, DEFAULT_RADIUS_M);
    }
}
