//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose map-screen and add-region use cases to Dart via FRB.
//! - Bridge the host's geofencing service, permission state and notification
//!   manager into core.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - OS calls are queued; the host executes them and reports back through
//!   `platform_complete_command`.
//! - Failure messages are human-readable and ready for a transient banner.

use crate::host::{
    CommandKind, CommandView, HostGeofencingClient, HostNotifications, HostPermissions,
};
use log::{info, warn};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tunity_core::db::{open_db, SqlitePreferences};
use tunity_core::repo::geofence_repo::GEOFENCE_PREFS_NAMESPACE;
use tunity_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    DeepLink, ExitNotifier, GeofenceRecord, GeofenceService, GeofenceStatus, GeofenceTransition,
    GeofencingError, GeofencingEvent, LatLng, PendingIntent, PreferencesGeofenceRepository,
    SkipReason, Submission, TransitionHandler, TransitionWorker, TunityConfig,
};

type Repo = PreferencesGeofenceRepository<SqlitePreferences>;

/// Outcome key used by `remove_all`, which has no request id.
const REMOVE_ALL_KEY: &str = "*";

static RUNTIME: OnceCell<Runtime> = OnceCell::new();

struct Runtime {
    config: TunityConfig,
    service: GeofenceService<Repo>,
    client: Arc<HostGeofencingClient>,
    permissions: Arc<HostPermissions>,
    notifications: Arc<HostNotifications>,
    worker: TransitionWorker,
    /// Callback results keyed by request id, waiting for the host to collect.
    outcomes: Arc<Mutex<HashMap<String, Result<(), String>>>>,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Stored geofence as seen by the map screen.
#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceItem {
    pub id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_m: Option<f64>,
}

/// Envelope for list reads.
#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceListResponse {
    pub items: Vec<GeofenceItem>,
    pub message: String,
}

/// Envelope for add/remove flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeofenceActionResponse {
    /// Whether the step succeeded (or was accepted for the host to execute).
    pub ok: bool,
    pub geofence_id: Option<String>,
    /// Human-readable message; empty for silent outcomes.
    pub message: String,
}

impl GeofenceActionResponse {
    fn success(message: impl Into<String>, geofence_id: Option<String>) -> Self {
        Self {
            ok: true,
            geofence_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            geofence_id: None,
            message: message.into(),
        }
    }
}

/// OS geofencing call the host must execute.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformCommandItem {
    pub token: u64,
    /// `add|remove|remove_all`.
    pub kind: String,
    pub request_ids: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_m: Option<f64>,
    /// Callback receiver for `add` and `remove_all`.
    pub receiver: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelItem {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationItem {
    pub notification_id: i32,
    pub channel_id: String,
    pub title: String,
    /// Map-screen deep link target.
    pub latitude: f64,
    pub longitude: f64,
}

/// Channels to create and notifications to post, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationBatch {
    pub channels: Vec<ChannelItem>,
    pub notifications: Vec<NotificationItem>,
}

/// Mirrors the host's fine-location permission state.
#[flutter_rust_bridge::frb(sync)]
pub fn set_location_permission(granted: bool) -> String {
    match runtime() {
        Ok(runtime) => {
            runtime.permissions.set_fine_location(granted);
            String::new()
        }
        Err(err) => err,
    }
}

/// Lists stored geofences for the map screen.
#[flutter_rust_bridge::frb(sync)]
pub fn map_list_geofences() -> GeofenceListResponse {
    let result = runtime().and_then(|runtime| {
        runtime
            .service
            .get_all()
            .map_err(|err| format!("map_list_geofences failed: {err}"))
    });
    match result {
        Ok(records) => GeofenceListResponse {
            message: format!("{} geofence(s).", records.len()),
            items: records.iter().map(to_item).collect(),
        },
        Err(message) => GeofenceListResponse {
            items: Vec::new(),
            message,
        },
    }
}

/// Looks up one geofence, e.g. when a marker is tapped.
#[flutter_rust_bridge::frb(sync)]
pub fn map_get_geofence(id: String) -> Option<GeofenceItem> {
    let runtime = runtime().ok()?;
    let record = runtime.service.get(id.trim()).ok()??;
    Some(to_item(&record))
}

/// Returns the most recently added geofence, used to recenter after an add.
#[flutter_rust_bridge::frb(sync)]
pub fn map_last_geofence() -> Option<GeofenceItem> {
    let runtime = runtime().ok()?;
    let record = runtime.service.get_last().ok()??;
    Some(to_item(&record))
}

/// Confirms the add-region screen: center on the picked point, fixed radius.
///
/// # FFI contract
/// - `ok=true` means a command was queued; the final result comes from
///   `platform_complete_command`.
/// - Missing permission returns `ok=false` with an empty message.
#[flutter_rust_bridge::frb(sync)]
pub fn new_geofence_add(latitude: f64, longitude: f64) -> GeofenceActionResponse {
    let runtime = match runtime() {
        Ok(runtime) => runtime,
        Err(err) => return GeofenceActionResponse::failure(err),
    };

    let record = GeofenceRecord::circle(
        LatLng::new(latitude, longitude),
        runtime.config.default_radius_m,
    );
    let id = record.id.clone();
    let (success, failure) = runtime.outcome_callbacks(id.clone());

    match runtime.service.add(record, success, failure) {
        Submission::Submitted => {
            GeofenceActionResponse::success("Registration pending.", Some(id))
        }
        Submission::Skipped(SkipReason::Invalid(err)) => {
            runtime.take_outcome(&id);
            GeofenceActionResponse::failure(err.to_string())
        }
        Submission::Skipped(reason) => {
            info!("event=ffi_add module=ffi status=skipped reason={reason:?}");
            GeofenceActionResponse::failure(String::new())
        }
    }
}

/// Removes a stored geofence by id (map screen removal alert).
#[flutter_rust_bridge::frb(sync)]
pub fn map_remove_geofence(id: String) -> GeofenceActionResponse {
    let runtime = match runtime() {
        Ok(runtime) => runtime,
        Err(err) => return GeofenceActionResponse::failure(err),
    };
    let record = match runtime.service.get(id.trim()) {
        Ok(Some(record)) => record,
        Ok(None) => return GeofenceActionResponse::failure(format!("geofence not found: {id}")),
        Err(err) => {
            return GeofenceActionResponse::failure(format!("map_remove_geofence failed: {err}"))
        }
    };

    let id = record.id.clone();
    let (success, failure) = runtime.outcome_callbacks(id.clone());
    runtime.service.remove(record, success, failure);
    GeofenceActionResponse::success("Removal pending.", Some(id))
}

/// Unregisters every geofence and clears storage.
#[flutter_rust_bridge::frb(sync)]
pub fn map_remove_all_geofences() -> GeofenceActionResponse {
    match runtime() {
        Ok(runtime) => {
            let (success, failure) = runtime.outcome_callbacks(REMOVE_ALL_KEY.to_string());
            runtime.service.remove_all(success, failure);
            GeofenceActionResponse::success("Removal pending.", None)
        }
        Err(err) => GeofenceActionResponse::failure(err),
    }
}

/// Lists OS geofencing calls the host has not reported yet.
#[flutter_rust_bridge::frb(sync)]
pub fn platform_pending_commands() -> Vec<PlatformCommandItem> {
    match runtime() {
        Ok(runtime) => runtime.client.pending().into_iter().map(to_command_item).collect(),
        Err(_) => Vec::new(),
    }
}

/// Reports the OS result of a queued command.
///
/// `status_code = None` means success; otherwise it is the OS status code.
/// The returned message is ready for a transient banner.
#[flutter_rust_bridge::frb(sync)]
pub fn platform_complete_command(token: u64, status_code: Option<i32>) -> GeofenceActionResponse {
    let runtime = match runtime() {
        Ok(runtime) => runtime,
        Err(err) => return GeofenceActionResponse::failure(err),
    };

    let result = match status_code {
        None => Ok(()),
        Some(code) => Err(GeofencingError::new(GeofenceStatus::from_code(code))),
    };
    let Some(view) = runtime.client.complete(token, result) else {
        return GeofenceActionResponse::failure(format!("unknown command token: {token}"));
    };

    let key = match view.kind {
        CommandKind::RemoveAll => REMOVE_ALL_KEY.to_string(),
        CommandKind::Add | CommandKind::Remove => {
            view.request_ids.first().cloned().unwrap_or_default()
        }
    };
    let geofence_id = (view.kind != CommandKind::RemoveAll).then(|| key.clone());
    match runtime.take_outcome(&key) {
        Some(Ok(())) => GeofenceActionResponse::success(success_message(view.kind), geofence_id),
        Some(Err(message)) => GeofenceActionResponse::failure(message),
        None => GeofenceActionResponse::failure("command completed without an outcome"),
    }
}

/// Broadcast entry point for OS transition events.
///
/// Queues the event for background handling and returns immediately.
/// Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn transition_enqueue(
    transition: i32,
    triggering_ids: Vec<String>,
    error_code: Option<i32>,
) -> String {
    let runtime = match runtime() {
        Ok(runtime) => runtime,
        Err(err) => return err,
    };
    let Some(transition) = GeofenceTransition::from_code(transition) else {
        return format!("unsupported transition code: {transition}");
    };
    let event = GeofencingEvent {
        error_code,
        transition,
        triggering_ids,
    };
    match runtime.worker.enqueue(event) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Waits for queued transitions, then returns what the host must post.
#[flutter_rust_bridge::frb(sync)]
pub fn transition_take_notifications() -> NotificationBatch {
    let empty = NotificationBatch {
        channels: Vec::new(),
        notifications: Vec::new(),
    };
    let Ok(runtime) = runtime() else {
        return empty;
    };
    if let Err(err) = runtime.worker.flush() {
        warn!("event=ffi_transition_flush module=ffi status=error error={err}");
        return empty;
    }

    let (channels, notifications) = runtime.notifications.drain();
    NotificationBatch {
        channels: channels
            .into_iter()
            .map(|channel| ChannelItem {
                id: channel.id,
                name: channel.name,
                description: channel.description,
            })
            .collect(),
        notifications: notifications
            .into_iter()
            .map(|(notification_id, notification)| {
                let DeepLink::MapAt(center) = notification.deep_link;
                NotificationItem {
                    notification_id,
                    channel_id: notification.channel_id,
                    title: notification.title,
                    latitude: center.latitude,
                    longitude: center.longitude,
                }
            })
            .collect(),
    }
}

impl Runtime {
    fn outcome_callbacks(
        &self,
        key: String,
    ) -> (
        impl FnOnce() + Send + 'static,
        impl FnOnce(String) + Send + 'static,
    ) {
        let on_success = Arc::clone(&self.outcomes);
        let on_failure = Arc::clone(&self.outcomes);
        let failure_key = key.clone();
        (
            move || {
                if let Ok(mut outcomes) = on_success.lock() {
                    outcomes.insert(key, Ok(()));
                }
            },
            move |message| {
                if let Ok(mut outcomes) = on_failure.lock() {
                    outcomes.insert(failure_key, Err(message));
                }
            },
        )
    }

    fn take_outcome(&self, key: &str) -> Option<Result<(), String>> {
        self.outcomes.lock().ok()?.remove(key)
    }
}

fn runtime() -> Result<&'static Runtime, String> {
    RUNTIME.get_or_try_init(|| {
        let config = TunityConfig::from_env();
        let conn = open_db(&config.db_path)
            .map_err(|err| format!("geofence DB open failed: {err}"))?;
        let repo = Arc::new(PreferencesGeofenceRepository::new(SqlitePreferences::new(
            conn,
            GEOFENCE_PREFS_NAMESPACE,
        )));

        let client = Arc::new(HostGeofencingClient::default());
        let permissions = Arc::new(HostPermissions::default());
        let notifications = Arc::new(HostNotifications::default());

        let service = GeofenceService::new(
            Arc::clone(&repo),
            client.clone(),
            permissions.clone(),
            PendingIntent::broadcast(config.transition_receiver.clone()),
        );
        let handler = TransitionHandler::new(
            repo,
            ExitNotifier::new(notifications.clone(), config.notification.clone()),
        );
        let worker = TransitionWorker::spawn(handler, |_, _| {})
            .map_err(|err| format!("transition worker start failed: {err}"))?;

        info!("event=ffi_runtime module=ffi status=ok");
        Ok(Runtime {
            config,
            service,
            client,
            permissions,
            notifications,
            worker,
            outcomes: Arc::new(Mutex::new(HashMap::new())),
        })
    })
}

fn success_message(kind: CommandKind) -> &'static str {
    match kind {
        CommandKind::Add => "Geofence added.",
        CommandKind::Remove => "Geofence removed.",
        CommandKind::RemoveAll => "All geofences removed.",
    }
}

fn to_item(record: &GeofenceRecord) -> GeofenceItem {
    GeofenceItem {
        id: record.id.clone(),
        latitude: record.center.map(|center| center.latitude),
        longitude: record.center.map(|center| center.longitude),
        radius_m: record.radius_m,
    }
}

fn to_command_item(view: CommandView) -> PlatformCommandItem {
    PlatformCommandItem {
        token: view.token,
        kind: view.kind.label().to_string(),
        request_ids: view.request_ids,
        latitude: view.region.map(|region| region.center.latitude),
        longitude: view.region.map(|region| region.center.longitude),
        radius_m: view.region.map(|region| region.radius_m),
        receiver: view.receiver,
    }
}
