//! Notification service seam.
//!
//! # Responsibility
//! - Describe channels and notifications independent of the host toolkit.
//! - Carry the deep link that reopens the map view on tap.

use crate::model::geofence::LatLng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Importance {
    Default,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub description: String,
    pub importance: Importance,
    pub enable_lights: bool,
    pub enable_vibration: bool,
    pub show_badge: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Default,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Reminder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Private,
    Public,
}

/// Screen opened when the user taps a notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeepLink {
    /// Map screen centered on a coordinate.
    MapAt(LatLng),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub channel_id: String,
    pub title: String,
    pub deep_link: DeepLink,
    pub priority: Priority,
    pub category: Category,
    pub visibility: Visibility,
    pub auto_cancel: bool,
    /// Alternating off/on durations in milliseconds.
    pub vibrate_pattern: Vec<u64>,
}

/// OS notification manager.
pub trait NotificationManager: Send + Sync {
    fn has_channel(&self, channel_id: &str) -> bool;
    fn create_channel(&self, channel: &NotificationChannel);
    fn notify(&self, notification_id: i32, notification: &Notification);
}
