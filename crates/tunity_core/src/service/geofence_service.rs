//! Geofence use-case service.
//!
//! # Responsibility
//! - Register records with the OS geofencing service and persist them once the
//!   OS confirms.
//! - Unregister records and drop them from storage once the OS confirms.
//! - Serve read-side lookups for the map screen and transition handling.
//!
//! # Invariants
//! - Storage changes only after the OS reports success.
//! - Incomplete records and missing permission never reach the OS and never
//!   invoke a callback.
//! - Registration failures are never retried here.

use crate::model::geofence::{GeofenceRecord, GeofenceValidationError};
use crate::platform::geofencing::{
    GeofenceDescriptor, GeofencingClient, GeofencingRequest, PendingIntent, RemovalTarget,
};
use crate::platform::permission::{Permission, PermissionChecker};
use crate::repo::geofence_repo::{GeofenceRepository, RepoResult};
use log::{error, info, warn};
use std::sync::Arc;

/// Why `add` did not reach the OS.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    MissingCenter,
    MissingRadius,
    PermissionDenied,
    Invalid(GeofenceValidationError),
}

/// Immediate result of `add`; the OS outcome arrives later via callbacks.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Submitted,
    Skipped(SkipReason),
}

/// Orchestrates repository, OS geofencing client and permission state.
pub struct GeofenceService<R: GeofenceRepository + 'static> {
    repo: Arc<R>,
    client: Arc<dyn GeofencingClient>,
    permissions: Arc<dyn PermissionChecker>,
    callback: PendingIntent,
}

impl<R: GeofenceRepository + 'static> GeofenceService<R> {
    pub fn new(
        repo: Arc<R>,
        client: Arc<dyn GeofencingClient>,
        permissions: Arc<dyn PermissionChecker>,
        callback: PendingIntent,
    ) -> Self {
        Self {
            repo,
            client,
            permissions,
            callback,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    pub fn callback_intent(&self) -> &PendingIntent {
        &self.callback
    }

    /// Submits `record` to the OS and persists it on success.
    ///
    /// # Contract
    /// - Returns `Skipped` without calling `success`/`failure` when center,
    ///   radius or fine-location permission is missing.
    /// - Otherwise, invalid field values call `failure` with the validation
    ///   message.
    /// - On OS success the record is appended to storage, then `success` runs.
    /// - On OS failure `failure` receives a human-readable message.
    pub fn add<S, F>(&self, record: GeofenceRecord, success: S, failure: F) -> Submission
    where
        S: FnOnce() + Send + 'static,
        F: FnOnce(String) + Send + 'static,
    {
        let Some(descriptor) = GeofenceDescriptor::exit_only(&record) else {
            let reason = if record.center.is_none() {
                SkipReason::MissingCenter
            } else {
                SkipReason::MissingRadius
            };
            info!(
                "event=geofence_add module=service status=skipped id={} reason={:?}",
                record.id, reason
            );
            return Submission::Skipped(reason);
        };

        if !self.permissions.is_granted(Permission::FineLocation) {
            info!(
                "event=geofence_add module=service status=skipped id={} reason=permission",
                record.id
            );
            return Submission::Skipped(SkipReason::PermissionDenied);
        }

        if let Err(err) = record.validate() {
            warn!(
                "event=geofence_add module=service status=rejected id={} reason=invalid",
                record.id
            );
            failure(err.to_string());
            return Submission::Skipped(SkipReason::Invalid(err));
        }

        info!(
            "event=geofence_add module=service status=start id={}",
            record.id
        );
        let repo = Arc::clone(&self.repo);
        self.client.add_geofences(
            GeofencingRequest::single(descriptor),
            &self.callback,
            Box::new(move |result| match result {
                Ok(()) => match repo.append(&record) {
                    Ok(()) => {
                        info!(
                            "event=geofence_add module=service status=ok id={}",
                            record.id
                        );
                        success();
                    }
                    Err(err) => {
                        error!(
                            "event=geofence_add module=service status=error id={} error_code=persist_failed error={}",
                            record.id, err
                        );
                        failure(err.to_string());
                    }
                },
                Err(err) => {
                    warn!(
                        "event=geofence_add module=service status=error id={} error_code={}",
                        record.id,
                        err.status.code()
                    );
                    failure(err.human_readable_message());
                }
            }),
        );
        Submission::Submitted
    }

    /// Unregisters `record` and removes it from storage on success.
    ///
    /// Storage removal matches by value equality.
    pub fn remove<S, F>(&self, record: GeofenceRecord, success: S, failure: F)
    where
        S: FnOnce() + Send + 'static,
        F: FnOnce(String) + Send + 'static,
    {
        info!(
            "event=geofence_remove module=service status=start id={}",
            record.id
        );
        let repo = Arc::clone(&self.repo);
        self.client.remove_geofences(
            RemovalTarget::RequestIds(vec![record.id.clone()]),
            Box::new(move |result| match result {
                Ok(()) => match repo.remove(&record) {
                    Ok(changed) => {
                        info!(
                            "event=geofence_remove module=service status=ok id={} changed={}",
                            record.id, changed
                        );
                        success();
                    }
                    Err(err) => {
                        error!(
                            "event=geofence_remove module=service status=error id={} error_code=persist_failed error={}",
                            record.id, err
                        );
                        failure(err.to_string());
                    }
                },
                Err(err) => {
                    warn!(
                        "event=geofence_remove module=service status=error id={} error_code={}",
                        record.id,
                        err.status.code()
                    );
                    failure(err.human_readable_message());
                }
            }),
        );
    }

    /// Unregisters everything bound to the callback target and clears storage.
    pub fn remove_all<S, F>(&self, success: S, failure: F)
    where
        S: FnOnce() + Send + 'static,
        F: FnOnce(String) + Send + 'static,
    {
        let repo = Arc::clone(&self.repo);
        self.client.remove_geofences(
            RemovalTarget::CallbackIntent(self.callback.clone()),
            Box::new(move |result| {
                match result.map_err(|err| err.human_readable_message()).and_then(|()| {
                    repo.clear().map_err(|err| err.to_string())
                }) {
                    Ok(()) => {
                        info!("event=geofence_remove_all module=service status=ok");
                        success();
                    }
                    Err(message) => {
                        warn!("event=geofence_remove_all module=service status=error");
                        failure(message);
                    }
                }
            }),
        );
    }

    pub fn get_all(&self) -> RepoResult<Vec<GeofenceRecord>> {
        self.repo.get_all()
    }

    pub fn get(&self, id: &str) -> RepoResult<Option<GeofenceRecord>> {
        self.repo.get(id)
    }

    pub fn get_last(&self) -> RepoResult<Option<GeofenceRecord>> {
        self.repo.get_last()
    }
}
