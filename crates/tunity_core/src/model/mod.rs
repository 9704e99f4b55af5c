//! Domain model for user-defined geofences.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every geofence is identified by a stable opaque `GeofenceId`.

pub mod geofence;
