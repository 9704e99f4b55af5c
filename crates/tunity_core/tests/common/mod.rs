//! Fake platform services shared by integration tests.
#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use tunity_core::db::{open_db_in_memory, SqlitePreferences};
use tunity_core::repo::geofence_repo::GEOFENCE_PREFS_NAMESPACE;
use tunity_core::{
    Completion, GeofencingClient, GeofencingError, GeofencingRequest, Notification,
    NotificationChannel, NotificationManager, PendingIntent, Permission, PermissionChecker,
    PreferencesGeofenceRepository, RemovalTarget,
};

pub type MemoryRepo = PreferencesGeofenceRepository<SqlitePreferences>;

pub fn memory_repo() -> Arc<MemoryRepo> {
    let conn = open_db_in_memory().expect("open in-memory db");
    Arc::new(PreferencesGeofenceRepository::new(SqlitePreferences::new(
        conn,
        GEOFENCE_PREFS_NAMESPACE,
    )))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Add(GeofencingRequest, PendingIntent),
    Remove(RemovalTarget),
}

/// Geofencing client that parks completions until the test resolves them.
#[derive(Default)]
pub struct ParkedGeofencingClient {
    calls: Mutex<Vec<Call>>,
    pending: Mutex<VecDeque<Completion>>,
}

impl ParkedGeofencingClient {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().expect("pending lock").len()
    }

    /// Resolves the oldest pending call.
    pub fn complete_next(&self, result: Result<(), GeofencingError>) {
        let completion = self
            .pending
            .lock()
            .expect("pending lock")
            .pop_front()
            .expect("a pending call to complete");
        completion(result);
    }
}

impl GeofencingClient for ParkedGeofencingClient {
    fn add_geofences(
        &self,
        request: GeofencingRequest,
        callback: &PendingIntent,
        on_complete: Completion,
    ) {
        self.calls
            .lock()
            .expect("calls lock")
            .push(Call::Add(request, callback.clone()));
        self.pending.lock().expect("pending lock").push_back(on_complete);
    }

    fn remove_geofences(&self, target: RemovalTarget, on_complete: Completion) {
        self.calls
            .lock()
            .expect("calls lock")
            .push(Call::Remove(target));
        self.pending.lock().expect("pending lock").push_back(on_complete);
    }
}

pub struct FixedPermissions {
    pub fine_location: bool,
}

impl PermissionChecker for FixedPermissions {
    fn is_granted(&self, permission: Permission) -> bool {
        match permission {
            Permission::FineLocation => self.fine_location,
            Permission::BackgroundLocation => self.fine_location,
        }
    }
}

/// Notification manager that records channels and posts.
#[derive(Default)]
pub struct RecordingNotifications {
    channels: Mutex<HashSet<String>>,
    created: Mutex<Vec<NotificationChannel>>,
    posted: Mutex<Vec<(i32, Notification)>>,
}

impl RecordingNotifications {
    pub fn created(&self) -> Vec<NotificationChannel> {
        self.created.lock().expect("created lock").clone()
    }

    pub fn posted(&self) -> Vec<(i32, Notification)> {
        self.posted.lock().expect("posted lock").clone()
    }
}

impl NotificationManager for RecordingNotifications {
    fn has_channel(&self, channel_id: &str) -> bool {
        self.channels.lock().expect("channels lock").contains(channel_id)
    }

    fn create_channel(&self, channel: &NotificationChannel) {
        self.channels
            .lock()
            .expect("channels lock")
            .insert(channel.id.clone());
        self.created.lock().expect("created lock").push(channel.clone());
    }

    fn notify(&self, notification_id: i32, notification: &Notification) {
        self.posted
            .lock()
            .expect("posted lock")
            .push((notification_id, notification.clone()));
    }
}

/// Collects callback outcomes for assertions.
#[derive(Clone, Default)]
pub struct Outcomes {
    inner: Arc<Mutex<Vec<Result<(), String>>>>,
}

impl Outcomes {
    pub fn success(&self) -> impl FnOnce() + Send + 'static {
        let inner = Arc::clone(&self.inner);
        move || inner.lock().expect("outcomes lock").push(Ok(()))
    }

    pub fn failure(&self) -> impl FnOnce(String) + Send + 'static {
        let inner = Arc::clone(&self.inner);
        move |message| inner.lock().expect("outcomes lock").push(Err(message))
    }

    pub fn all(&self) -> Vec<Result<(), String>> {
        self.inner.lock().expect("outcomes lock").clone()
    }
}
