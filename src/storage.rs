//! Local persistence for processes, requests, analyses, and notifications.
//!
//! Everything lives in one `SQLite` file:
//!
//! ```text
//! process        # Process definitions, stored as validated JSON
//! request        # Requests: status columns + data and timeline as JSON
//! analysis       # Latest risk analysis per request
//! notification   # Status-change outbox, unique per (request, status)
//! ```
//!
//! Each operation opens its own connection. Concurrent writers contend at
//! `SQLite`'s write lock; status transitions are conditional on the stored
//! status, so at most one of two racing decisions can apply.

mod analysis;
mod notification;
mod process;
mod request;

use std::{fs, io, path::PathBuf, time::Duration};

use jiff::Timestamp;
use rusqlite::Connection;
use uuid::Uuid;

use crate::model::{
    ProcessDefinition, Request, RequestStatus, TimelineEntry, ValidationError,
};

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("process not found: {0}")]
    ProcessNotFound(String),

    #[error("request not found: {0}")]
    RequestNotFound(Uuid),

    #[error("request already exists: {0}")]
    RequestAlreadyExists(Uuid),

    /// The stored status no longer matches what the caller observed.
    #[error("request {id} is {actual}, expected {expected}")]
    Conflict {
        id: Uuid,
        expected: RequestStatus,
        actual: RequestStatus,
    },

    #[error("invalid process definition: {0}")]
    InvalidProcess(#[from] ValidationError),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// Read access to process definitions. The engine never writes here.
pub trait ProcessStore {
    fn get_process(&self, id: &str) -> Result<ProcessDefinition>;

    fn list_processes(&self) -> Result<Vec<ProcessDefinition>>;
}

/// Durable request state.
pub trait RequestStore {
    fn get_request(&self, id: Uuid) -> Result<Request>;

    fn create_request(&self, request: Request) -> Result<Request>;

    /// Apply `update` only if the stored status is still `expected`.
    ///
    /// Fails with [`StorageError::Conflict`] when another writer got there
    /// first, and [`StorageError::RequestNotFound`] when there is no such request.
    fn conditional_update_status(
        &self,
        id: Uuid,
        expected: RequestStatus,
        update: &StatusUpdate,
    ) -> Result<()>;
}

/// The fields written by a status transition.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub status: RequestStatus,
    pub remarks: Option<String>,
    pub decided_by: Option<String>,
    pub decided_at: Timestamp,
    /// The full timeline after the transition.
    pub timeline: Vec<TimelineEntry>,
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS process (
        id          TEXT PRIMARY KEY,
        name        TEXT NOT NULL,
        definition  TEXT NOT NULL,
        updated_at  TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS request (
        id            TEXT PRIMARY KEY,
        process_id    TEXT NOT NULL,
        process_name  TEXT NOT NULL,
        submitted_by  TEXT NOT NULL,
        submitted_at  TEXT NOT NULL,
        data          TEXT NOT NULL,
        status        TEXT NOT NULL,
        remarks       TEXT,
        decided_by    TEXT,
        decided_at    TEXT,
        timeline      TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS analysis (
        request_id   TEXT PRIMARY KEY,
        result       TEXT NOT NULL,
        analyzed_at  TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS notification (
        request_id    TEXT NOT NULL,
        status        TEXT NOT NULL,
        published_at  TEXT NOT NULL,
        UNIQUE (request_id, status)
    );
";

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// `SQLite`-backed storage.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    /// Opens (creating if needed) the database at `path`.
    ///
    /// The parent directory is created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let storage = Self { path };
        storage.open()?.execute_batch(SCHEMA)?;
        Ok(storage)
    }

    /// Returns the default database path: `~/.verdict/verdict.sqlite`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".verdict").join("verdict.sqlite"))
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }
}

fn parse_timestamp(s: &str, what: &str) -> Result<Timestamp> {
    s.parse::<Timestamp>()
        .map_err(|e| StorageError::Corrupt(format!("invalid {what}: {e}")))
}

fn parse_status(s: &str) -> Result<RequestStatus> {
    s.parse::<RequestStatus>().map_err(StorageError::Corrupt)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use tempfile::TempDir;

    pub(crate) fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("db").join("verdict.sqlite")).unwrap();
        (dir, storage)
    }

    #[test]
    fn new_creates_parent_directory() {
        let (dir, _storage) = test_storage();
        assert!(dir.path().join("db").join("verdict.sqlite").is_file());
    }

    #[test]
    fn reopening_existing_database_is_harmless() {
        let (dir, _storage) = test_storage();
        let again = Storage::new(dir.path().join("db").join("verdict.sqlite"));
        assert!(again.is_ok());
    }
}
