//! Geofence transition handling.
//!
//! # Responsibility
//! - Turn an OS transition event into at most one exit notification.
//! - Resolve the triggering geofence id against stored records.
//!
//! # Invariants
//! - Unknown ids, incomplete records and non-exit transitions are dropped
//!   silently (logged, never surfaced to the user).
//! - Only the first triggering geofence is considered.

use crate::model::geofence::GeofenceId;
use crate::platform::geofencing::{GeofenceStatus, GeofenceTransition};
use crate::repo::geofence_repo::GeofenceRepository;
use crate::service::notifier::ExitNotifier;
use log::{debug, error, info};
use std::sync::Arc;

/// Transition event delivered by the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeofencingEvent {
    /// Set when the OS reports an error instead of a transition.
    pub error_code: Option<i32>,
    pub transition: GeofenceTransition,
    pub triggering_ids: Vec<GeofenceId>,
}

impl GeofencingEvent {
    pub fn exit(triggering_ids: Vec<GeofenceId>) -> Self {
        Self {
            error_code: None,
            transition: GeofenceTransition::Exit,
            triggering_ids,
        }
    }
}

/// Why an event produced no notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    PlatformError(GeofenceStatus),
    NotExit(GeofenceTransition),
    NoTriggeringGeofence,
    UnknownGeofence(GeofenceId),
    /// Stored record lacks a center or radius.
    Incomplete(GeofenceId),
    LookupFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Notified {
        record_id: GeofenceId,
        notification_id: i32,
    },
    Ignored(IgnoreReason),
}

/// Resolves transition events and posts exit notifications.
pub struct TransitionHandler<R: GeofenceRepository> {
    repo: Arc<R>,
    notifier: ExitNotifier,
}

impl<R: GeofenceRepository> TransitionHandler<R> {
    pub fn new(repo: Arc<R>, notifier: ExitNotifier) -> Self {
        Self { repo, notifier }
    }

    pub fn handle(&self, event: &GeofencingEvent) -> TransitionOutcome {
        let outcome = self.resolve(event);
        match &outcome {
            TransitionOutcome::Notified {
                record_id,
                notification_id,
            } => info!(
                "event=transition_handle module=transition status=notified id={} notification_id={}",
                record_id, notification_id
            ),
            TransitionOutcome::Ignored(IgnoreReason::PlatformError(status)) => error!(
                "event=transition_handle module=transition status=error error_code={} message={}",
                status.code(),
                status.human_readable_message()
            ),
            TransitionOutcome::Ignored(reason) => debug!(
                "event=transition_handle module=transition status=ignored reason={:?}",
                reason
            ),
        }
        outcome
    }

    fn resolve(&self, event: &GeofencingEvent) -> TransitionOutcome {
        if let Some(code) = event.error_code {
            return ignored(IgnoreReason::PlatformError(GeofenceStatus::from_code(code)));
        }
        if event.transition != GeofenceTransition::Exit {
            return ignored(IgnoreReason::NotExit(event.transition));
        }
        let Some(first_id) = event.triggering_ids.first() else {
            return ignored(IgnoreReason::NoTriggeringGeofence);
        };

        let record = match self.repo.get(first_id) {
            Ok(Some(record)) => record,
            Ok(None) => return ignored(IgnoreReason::UnknownGeofence(first_id.clone())),
            Err(err) => return ignored(IgnoreReason::LookupFailed(err.to_string())),
        };
        let Some(region) = record.to_region() else {
            return ignored(IgnoreReason::Incomplete(record.id));
        };

        let notification_id = self.notifier.send(region.center);
        TransitionOutcome::Notified {
            record_id: record.id,
            notification_id,
        }
    }
}

fn ignored(reason: IgnoreReason) -> TransitionOutcome {
    TransitionOutcome::Ignored(reason)
}
