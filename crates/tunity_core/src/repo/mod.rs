//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the data access contract for stored geofences.
//! - Keep the blob format and storage key inside the persistence boundary.
//!
//! # Invariants
//! - Repository writes validate records before persistence.

pub mod geofence_repo;
