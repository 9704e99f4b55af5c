//! Host-backed platform services.
//!
//! # Responsibility
//! - Queue OS geofencing calls until the Flutter host executes them and
//!   reports the result.
//! - Mirror host permission state.
//! - Buffer channels and notifications for the host to post.
//!
//! # Invariants
//! - Each queued command is completed at most once; unknown tokens are ignored.
//! - Completions run on the caller thread of `complete`, outside any lock.

use log::error;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use tunity_core::{
    CircularRegion, Completion, GeofencingClient, GeofencingError, GeofencingRequest,
    Notification, NotificationChannel, NotificationManager, PendingIntent, Permission,
    PermissionChecker, RemovalTarget,
};

/// Geofencing call waiting for the host.
pub(crate) struct QueuedCommand {
    pub token: u64,
    pub kind: CommandKind,
    pub request_ids: Vec<String>,
    pub region: Option<CircularRegion>,
    pub receiver: Option<String>,
    on_complete: Completion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommandKind {
    Add,
    Remove,
    RemoveAll,
}

impl CommandKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::RemoveAll => "remove_all",
        }
    }
}

/// Snapshot of a queued command without its completion.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CommandView {
    pub token: u64,
    pub kind: CommandKind,
    pub request_ids: Vec<String>,
    pub region: Option<CircularRegion>,
    pub receiver: Option<String>,
}

#[derive(Default)]
pub(crate) struct HostGeofencingClient {
    queue: Mutex<Vec<QueuedCommand>>,
    next_token: AtomicU64,
}

impl HostGeofencingClient {
    pub fn pending(&self) -> Vec<CommandView> {
        match self.queue.lock() {
            Ok(queue) => queue
                .iter()
                .map(|command| CommandView {
                    token: command.token,
                    kind: command.kind,
                    request_ids: command.request_ids.clone(),
                    region: command.region,
                    receiver: command.receiver.clone(),
                })
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Completes the command with `token`. Returns its view when found.
    pub fn complete(
        &self,
        token: u64,
        result: Result<(), GeofencingError>,
    ) -> Option<CommandView> {
        let command = {
            let mut queue = self.queue.lock().ok()?;
            let index = queue.iter().position(|command| command.token == token)?;
            queue.remove(index)
        };
        let view = CommandView {
            token: command.token,
            kind: command.kind,
            request_ids: command.request_ids,
            region: command.region,
            receiver: command.receiver,
        };
        (command.on_complete)(result);
        Some(view)
    }

    fn push(
        &self,
        kind: CommandKind,
        request_ids: Vec<String>,
        region: Option<CircularRegion>,
        receiver: Option<String>,
        on_complete: Completion,
    ) {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed) + 1;
        let command = QueuedCommand {
            token,
            kind,
            request_ids,
            region,
            receiver,
            on_complete,
        };
        match self.queue.lock() {
            Ok(mut queue) => queue.push(command),
            Err(_) => {
                error!(
                    "event=host_queue module=ffi status=error error_code=lock_poisoned token={token}"
                );
            }
        }
    }
}

impl GeofencingClient for HostGeofencingClient {
    fn add_geofences(
        &self,
        request: GeofencingRequest,
        callback: &PendingIntent,
        on_complete: Completion,
    ) {
        let request_ids = request
            .geofences
            .iter()
            .map(|descriptor| descriptor.request_id.clone())
            .collect();
        let region = request.geofences.first().map(|descriptor| descriptor.region);
        self.push(
            CommandKind::Add,
            request_ids,
            region,
            Some(callback.receiver.clone()),
            on_complete,
        );
    }

    fn remove_geofences(&self, target: RemovalTarget, on_complete: Completion) {
        match target {
            RemovalTarget::RequestIds(ids) => {
                self.push(CommandKind::Remove, ids, None, None, on_complete)
            }
            RemovalTarget::CallbackIntent(intent) => self.push(
                CommandKind::RemoveAll,
                Vec::new(),
                None,
                Some(intent.receiver),
                on_complete,
            ),
        }
    }
}

#[derive(Default)]
pub(crate) struct HostPermissions {
    fine_location: AtomicBool,
}

impl HostPermissions {
    pub fn set_fine_location(&self, granted: bool) {
        self.fine_location.store(granted, Ordering::Relaxed);
    }
}

impl PermissionChecker for HostPermissions {
    fn is_granted(&self, permission: Permission) -> bool {
        match permission {
            Permission::FineLocation | Permission::BackgroundLocation => {
                self.fine_location.load(Ordering::Relaxed)
            }
        }
    }
}

#[derive(Default)]
pub(crate) struct HostNotifications {
    known_channels: Mutex<HashSet<String>>,
    channel_outbox: Mutex<Vec<NotificationChannel>>,
    notification_outbox: Mutex<Vec<(i32, Notification)>>,
}

impl HostNotifications {
    pub fn drain(&self) -> (Vec<NotificationChannel>, Vec<(i32, Notification)>) {
        let channels = self
            .channel_outbox
            .lock()
            .map(|mut outbox| std::mem::take(&mut *outbox))
            .unwrap_or_default();
        let notifications = self
            .notification_outbox
            .lock()
            .map(|mut outbox| std::mem::take(&mut *outbox))
            .unwrap_or_default();
        (channels, notifications)
    }
}

impl NotificationManager for HostNotifications {
    fn has_channel(&self, channel_id: &str) -> bool {
        self.known_channels
            .lock()
            .map(|channels| channels.contains(channel_id))
            .unwrap_or(false)
    }

    fn create_channel(&self, channel: &NotificationChannel) {
        if let Ok(mut channels) = self.known_channels.lock() {
            channels.insert(channel.id.clone());
        }
        if let Ok(mut outbox) = self.channel_outbox.lock() {
            outbox.push(channel.clone());
        }
    }

    fn notify(&self, notification_id: i32, notification: &Notification) {
        if let Ok(mut outbox) = self.notification_outbox.lock() {
            outbox.push((notification_id, notification.clone()));
        }
    }
}
