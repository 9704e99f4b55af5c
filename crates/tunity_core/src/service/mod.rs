//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and platform calls into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage and OS details.

pub mod geofence_service;
pub mod notifier;
pub mod transition_service;
pub mod transition_worker;
