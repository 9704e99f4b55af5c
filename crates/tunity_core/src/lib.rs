//! Core domain logic for Tunity.
//! This crate is the single source of truth for geofence invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod platform;
pub mod repo;
pub mod service;

pub use config::{NotificationConfig, TunityConfig, DEFAULT_RADIUS_M};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::geofence::{
    CircularRegion, GeofenceId, GeofenceRecord, GeofenceValidationError, LatLng,
};
pub use platform::geofencing::{
    Completion, Expiration, GeofenceDescriptor, GeofenceStatus, GeofenceTransition,
    GeofencingClient, GeofencingError, GeofencingRequest, PendingIntent, RemovalTarget,
};
pub use platform::notification::{
    DeepLink, Notification, NotificationChannel, NotificationManager,
};
pub use platform::permission::{Permission, PermissionChecker};
pub use repo::geofence_repo::{
    GeofenceRepository, PreferencesGeofenceRepository, RepoError, RepoResult,
};
pub use service::geofence_service::{GeofenceService, SkipReason, Submission};
pub use service::notifier::ExitNotifier;
pub use service::transition_service::{
    GeofencingEvent, IgnoreReason, TransitionHandler, TransitionOutcome,
};
pub use service::transition_worker::{TransitionWorker, WorkerError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
