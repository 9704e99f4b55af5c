//! Geofence repository contracts and preferences-backed implementation.
//!
//! # Responsibility
//! - Persist the ordered geofence list as one serialized blob under a fixed key.
//! - Resolve records by id for display and transition handling.
//!
//! # Invariants
//! - The list is read lazily on every call and rewritten wholesale on writes.
//! - Malformed or absent blobs read as an empty list, never as an error.
//! - Ids stay unique: appending an existing id replaces the older entry.
//! - Read-modify-write cycles are serialized; concurrent appends never drop
//!   each other's records.

use crate::db::{DbError, KeyValueStore};
use crate::model::geofence::{GeofenceRecord, GeofenceValidationError};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

/// Preferences namespace holding geofence state.
pub const GEOFENCE_PREFS_NAMESPACE: &str = "GeofenceRepository";
/// Key of the serialized geofence list.
pub const GEOFENCES_KEY: &str = "GEOFENCES";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for geofence persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(GeofenceValidationError),
    Db(DbError),
    Encode(serde_json::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode geofence list: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<GeofenceValidationError> for RepoError {
    fn from(value: GeofenceValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Repository interface for the persisted geofence list.
///
/// Implementors provide whole-list load/save plus an atomic `update`;
/// lookups and single-record mutations are derived from those.
pub trait GeofenceRepository: Send + Sync {
    fn get_all(&self) -> RepoResult<Vec<GeofenceRecord>>;
    fn save_all(&self, records: &[GeofenceRecord]) -> RepoResult<()>;

    /// Loads the list, applies `change` and writes it back as one step with
    /// respect to other writers. The list is saved only when `change`
    /// returns `true`; that flag is returned.
    fn update(
        &self,
        change: &mut dyn FnMut(&mut Vec<GeofenceRecord>) -> bool,
    ) -> RepoResult<bool>;

    /// Returns the first record with `id`, if any.
    fn get(&self, id: &str) -> RepoResult<Option<GeofenceRecord>> {
        Ok(self.get_all()?.into_iter().find(|record| record.id == id))
    }

    /// Returns the most recently appended record.
    fn get_last(&self) -> RepoResult<Option<GeofenceRecord>> {
        Ok(self.get_all()?.pop())
    }

    fn append(&self, record: &GeofenceRecord) -> RepoResult<()> {
        record.validate()?;
        self.update(&mut |records| {
            records.retain(|existing| existing.id != record.id);
            records.push(record.clone());
            true
        })?;
        Ok(())
    }

    /// Removes every entry equal to `record`. Returns whether anything changed.
    fn remove(&self, record: &GeofenceRecord) -> RepoResult<bool> {
        self.update(&mut |records| {
            let before = records.len();
            records.retain(|existing| existing != record);
            records.len() != before
        })
    }

    fn clear(&self) -> RepoResult<()> {
        self.update(&mut |records| {
            records.clear();
            true
        })?;
        Ok(())
    }
}

/// Geofence repository stored in a key-value preferences namespace.
pub struct PreferencesGeofenceRepository<S: KeyValueStore> {
    store: S,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> PreferencesGeofenceRepository<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn lock_writes(&self) -> RepoResult<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| RepoError::Db(DbError::LockPoisoned))
    }

    fn load(&self) -> RepoResult<Vec<GeofenceRecord>> {
        match self.store.get_string(GEOFENCES_KEY)? {
            Some(blob) => Ok(decode_records(&blob)),
            None => Ok(Vec::new()),
        }
    }

    fn store_records(&self, records: &[GeofenceRecord]) -> RepoResult<()> {
        let blob = encode_records(records)?;
        self.store.put_string(GEOFENCES_KEY, &blob)?;
        Ok(())
    }
}

impl<S: KeyValueStore> GeofenceRepository for PreferencesGeofenceRepository<S> {
    fn get_all(&self) -> RepoResult<Vec<GeofenceRecord>> {
        self.load()
    }

    fn save_all(&self, records: &[GeofenceRecord]) -> RepoResult<()> {
        let _guard = self.lock_writes()?;
        self.store_records(records)
    }

    fn update(
        &self,
        change: &mut dyn FnMut(&mut Vec<GeofenceRecord>) -> bool,
    ) -> RepoResult<bool> {
        let _guard = self.lock_writes()?;
        let mut records = self.load()?;
        if !change(&mut records) {
            return Ok(false);
        }
        self.store_records(&records)?;
        Ok(true)
    }
}

/// Serializes the record list into the stored blob format.
pub fn encode_records(records: &[GeofenceRecord]) -> RepoResult<String> {
    Ok(serde_json::to_string(records)?)
}

/// Parses the stored blob. Anything unreadable yields an empty list.
pub fn decode_records(blob: &str) -> Vec<GeofenceRecord> {
    if blob.trim().is_empty() || blob.trim() == "null" {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<GeofenceRecord>>(blob) {
        Ok(records) => records,
        Err(err) => {
            warn!(
                "event=geofence_decode module=repo status=error bytes={} error={}",
                blob.len(),
                err
            );
            Vec::new()
        }
    }
}
