//! Platform service seams.
//!
//! The OS geofencing service, runtime permissions and the notification
//! manager live in the host app. Core talks to them only through these traits
//! so the repository and transition pipeline stay testable without a device.

pub mod geofencing;
pub mod notification;
pub mod permission;
