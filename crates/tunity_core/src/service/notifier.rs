//! Exit notification dispatch.
//!
//! # Invariants
//! - The notification channel is created at most once; later posts reuse it.
//! - Notification ids stay within `0..10_000`.

use crate::config::NotificationConfig;
use crate::model::geofence::LatLng;
use crate::platform::notification::{
    Category, DeepLink, Importance, Notification, NotificationChannel, NotificationManager,
    Priority, Visibility,
};
use log::debug;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

const NOTIFICATION_ID_SPACE: u128 = 10_000;
const VIBRATE_PATTERN_MS: [u64; 4] = [100, 200, 100, 200];

/// Posts geofence-exit notifications through the host notification manager.
pub struct ExitNotifier {
    manager: Arc<dyn NotificationManager>,
    config: NotificationConfig,
}

impl ExitNotifier {
    pub fn new(manager: Arc<dyn NotificationManager>, config: NotificationConfig) -> Self {
        Self { manager, config }
    }

    /// Posts the exit message with a deep link back to `center`.
    ///
    /// Returns the notification id used.
    pub fn send(&self, center: LatLng) -> i32 {
        self.ensure_channel();

        let notification = Notification {
            channel_id: self.config.channel_id.clone(),
            title: self.config.exit_message.clone(),
            deep_link: DeepLink::MapAt(center),
            priority: Priority::High,
            category: Category::Reminder,
            visibility: Visibility::Public,
            auto_cancel: true,
            vibrate_pattern: VIBRATE_PATTERN_MS.to_vec(),
        };
        let notification_id = next_notification_id();
        self.manager.notify(notification_id, &notification);
        debug!(
            "event=notification_post module=notifier status=ok notification_id={}",
            notification_id
        );
        notification_id
    }

    fn ensure_channel(&self) {
        if self.manager.has_channel(&self.config.channel_id) {
            return;
        }
        let channel = NotificationChannel {
            id: self.config.channel_id.clone(),
            name: self.config.channel_name.clone(),
            description: self.config.channel_description.clone(),
            importance: Importance::High,
            enable_lights: true,
            enable_vibration: true,
            show_badge: false,
        };
        self.manager.create_channel(&channel);
        debug!(
            "event=notification_channel module=notifier status=created channel_id={}",
            channel.id
        );
    }
}

fn next_notification_id() -> i32 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    // Bounded by NOTIFICATION_ID_SPACE, always fits.
    (millis % NOTIFICATION_ID_SPACE) as i32
}
