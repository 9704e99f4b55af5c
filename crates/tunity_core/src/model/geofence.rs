//! Geofence domain model.
//!
//! # Responsibility
//! - Define the persisted circular-region record.
//! - Derive the platform region shape from a fully populated record.
//!
//! # Invariants
//! - `id` is generated once and never changes for the record lifetime.
//! - A record is registered with the platform only when both `center` and
//!   `radius_m` are set.
//! - Serialized field names stay compatible with the stored blob shape
//!   (`id`, `latLng`, `radius`).

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque identifier shared with the platform as the geofence request id.
pub type GeofenceId = String;

/// Geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Circular region in the shape the platform geofencing service expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularRegion {
    pub center: LatLng,
    pub radius_m: f64,
}

/// One user-defined geofence.
///
/// `center` and `radius_m` stay optional so the add-region flow can build the
/// record step by step before registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceRecord {
    pub id: GeofenceId,
    #[serde(rename = "latLng", default)]
    pub center: Option<LatLng>,
    /// Radius in meters.
    #[serde(rename = "radius", default)]
    pub radius_m: Option<f64>,
}

/// Validation failures for geofence records.
#[derive(Debug, Clone, PartialEq)]
pub enum GeofenceValidationError {
    EmptyId,
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
    InvalidRadius(f64),
}

impl Display for GeofenceValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "geofence id cannot be empty"),
            Self::LatitudeOutOfRange(value) => {
                write!(f, "latitude {value} is outside [-90, 90]")
            }
            Self::LongitudeOutOfRange(value) => {
                write!(f, "longitude {value} is outside [-180, 180]")
            }
            Self::InvalidRadius(value) => {
                write!(f, "radius {value} must be a positive number of meters")
            }
        }
    }
}

impl Error for GeofenceValidationError {}

impl GeofenceRecord {
    /// Creates an empty record with a freshly generated id.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    /// Creates an empty record with a caller-provided id.
    pub fn with_id(id: impl Into<GeofenceId>) -> Self {
        Self {
            id: id.into(),
            center: None,
            radius_m: None,
        }
    }

    /// Creates a fully populated record with a generated id.
    pub fn circle(center: LatLng, radius_m: f64) -> Self {
        let mut record = Self::new();
        record.center = Some(center);
        record.radius_m = Some(radius_m);
        record
    }

    /// Returns whether both center and radius are set.
    pub fn is_complete(&self) -> bool {
        self.center.is_some() && self.radius_m.is_some()
    }

    /// Returns the platform region when the record is fully populated.
    pub fn to_region(&self) -> Option<CircularRegion> {
        match (self.center, self.radius_m) {
            (Some(center), Some(radius_m)) => Some(CircularRegion { center, radius_m }),
            _ => None,
        }
    }

    /// Validates the fields that are present.
    ///
    /// Absent center/radius are not errors here; registration decides what to
    /// do with incomplete records.
    pub fn validate(&self) -> Result<(), GeofenceValidationError> {
        if self.id.trim().is_empty() {
            return Err(GeofenceValidationError::EmptyId);
        }

        if let Some(center) = self.center {
            if !center.latitude.is_finite() || !(-90.0..=90.0).contains(&center.latitude) {
                return Err(GeofenceValidationError::LatitudeOutOfRange(
                    center.latitude,
                ));
            }
            if !center.longitude.is_finite() || !(-180.0..=180.0).contains(&center.longitude) {
                return Err(GeofenceValidationError::LongitudeOutOfRange(
                    center.longitude,
                ));
            }
        }

        if let Some(radius_m) = self.radius_m {
            if !radius_m.is_finite() || radius_m <= 0.0 {
                return Err(GeofenceValidationError::InvalidRadius(radius_m));
            }
        }

        Ok(())
    }
}

impl Default for GeofenceRecord {
    fn default() -> Self {
        Self::new()
    }
}
