//! Geofencing service seam.
//!
//! # Responsibility
//! - Describe registrations in the shape the OS geofencing service accepts.
//! - Carry asynchronous completion back into core as a one-shot callback.
//! - Map OS status codes to human-readable messages.
//!
//! # Invariants
//! - Every call to `add_geofences`/`remove_geofences` completes `on_complete`
//!   at most once, on any thread.

use crate::model::geofence::{CircularRegion, GeofenceId, GeofenceRecord};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One-shot completion for an OS registration call.
pub type Completion = Box<dyn FnOnce(Result<(), GeofencingError>) + Send + 'static>;

/// Boundary transition reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeofenceTransition {
    Enter,
    Exit,
    Dwell,
}

impl GeofenceTransition {
    /// Platform bit value (`1`, `2`, `4`).
    pub fn code(self) -> i32 {
        match self {
            Self::Enter => 1,
            Self::Exit => 2,
            Self::Dwell => 4,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Enter),
            2 => Some(Self::Exit),
            4 => Some(Self::Dwell),
            _ => None,
        }
    }
}

/// Registration lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    Never,
    AfterMillis(u64),
}

/// Platform geofence descriptor built from a complete record.
#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceDescriptor {
    pub request_id: GeofenceId,
    pub region: CircularRegion,
    pub transition_types: Vec<GeofenceTransition>,
    pub expiration: Expiration,
}

impl GeofenceDescriptor {
    /// Builds an exit-only, never-expiring descriptor.
    ///
    /// Returns `None` when the record lacks a center or radius.
    pub fn exit_only(record: &GeofenceRecord) -> Option<Self> {
        let region = record.to_region()?;
        Some(Self {
            request_id: record.id.clone(),
            region,
            transition_types: vec![GeofenceTransition::Exit],
            expiration: Expiration::Never,
        })
    }
}

/// Batch submitted to the geofencing service.
#[derive(Debug, Clone, PartialEq)]
pub struct GeofencingRequest {
    pub geofences: Vec<GeofenceDescriptor>,
    /// Transitions fired immediately if the device is already in that state.
    /// Empty means no initial trigger.
    pub initial_trigger: Vec<GeofenceTransition>,
}

impl GeofencingRequest {
    pub fn single(descriptor: GeofenceDescriptor) -> Self {
        Self {
            geofences: vec![descriptor],
            initial_trigger: Vec::new(),
        }
    }
}

/// Opaque callback target the OS invokes on transitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PendingIntent {
    pub receiver: String,
    pub request_code: i32,
}

impl PendingIntent {
    pub fn broadcast(receiver: impl Into<String>) -> Self {
        Self {
            receiver: receiver.into(),
            request_code: 0,
        }
    }
}

/// What to unregister.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalTarget {
    /// Every registration attached to this callback target.
    CallbackIntent(PendingIntent),
    RequestIds(Vec<GeofenceId>),
}

/// OS geofencing status codes surfaced on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeofenceStatus {
    NotAvailable,
    TooManyGeofences,
    TooManyPendingIntents,
    Other(i32),
}

impl GeofenceStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            1000 => Self::NotAvailable,
            1001 => Self::TooManyGeofences,
            1002 => Self::TooManyPendingIntents,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::NotAvailable => 1000,
            Self::TooManyGeofences => 1001,
            Self::TooManyPendingIntents => 1002,
            Self::Other(code) => code,
        }
    }

    /// Message shown to the user in a transient banner.
    pub fn human_readable_message(self) -> String {
        match self {
            Self::NotAvailable => {
                "Geofence service is not available now. Check that location is turned on."
                    .to_string()
            }
            Self::TooManyGeofences => {
                "Your app has registered too many geofences. Remove one and try again."
                    .to_string()
            }
            Self::TooManyPendingIntents => {
                "Your app has registered too many callback targets for geofences.".to_string()
            }
            Self::Other(code) => format!("Unknown geofence error (code {code})"),
        }
    }
}

/// Failure reported by the geofencing service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeofencingError {
    pub status: GeofenceStatus,
}

impl GeofencingError {
    pub fn new(status: GeofenceStatus) -> Self {
        Self { status }
    }

    pub fn from_code(code: i32) -> Self {
        Self::new(GeofenceStatus::from_code(code))
    }

    pub fn human_readable_message(&self) -> String {
        self.status.human_readable_message()
    }
}

impl Display for GeofencingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.human_readable_message())
    }
}

impl Error for GeofencingError {}

/// OS geofencing client.
///
/// Calls return immediately; the outcome arrives later through `on_complete`.
pub trait GeofencingClient: Send + Sync {
    fn add_geofences(
        &self,
        request: GeofencingRequest,
        callback: &PendingIntent,
        on_complete: Completion,
    );

    fn remove_geofences(&self, target: RemovalTarget, on_complete: Completion);
}

#[cfg(test)]
mod tests {
    use super::{GeofenceDescriptor, GeofenceStatus, GeofenceTransition, Expiration};
    use crate::model::geofence::{GeofenceRecord, LatLng};

    #[test]
    fn exit_only_descriptor_requires_complete_record() {
        let mut record = GeofenceRecord::with_id("g");
        assert!(GeofenceDescriptor::exit_only(&record).is_none());

        record.center = Some(LatLng::new(10.0, 20.0));
        record.radius_m = Some(50.0);
        let descriptor = GeofenceDescriptor::exit_only(&record).expect("complete record");
        assert_eq!(descriptor.request_id, "g");
        assert_eq!(descriptor.transition_types, vec![GeofenceTransition::Exit]);
        assert_eq!(descriptor.expiration, Expiration::Never);
    }

    #[test]
    fn status_codes_map_to_messages() {
        assert_eq!(GeofenceStatus::from_code(1000), GeofenceStatus::NotAvailable);
        assert_eq!(GeofenceStatus::from_code(1001).code(), 1001);
        assert!(GeofenceStatus::from_code(7)
            .human_readable_message()
            .contains("code 7"));
    }

    #[test]
    fn transition_codes_are_platform_bits() {
        for transition in [
            GeofenceTransition::Enter,
            GeofenceTransition::Exit,
            GeofenceTransition::Dwell,
        ] {
            assert_eq!(GeofenceTransition::from_code(transition.code()), Some(transition));
        }
        assert_eq!(GeofenceTransition::from_code(3), None);
    }
}
