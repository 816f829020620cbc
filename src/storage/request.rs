//! Request storage: create, load, list, and conditionally transition requests.

use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::model::{Request, RequestStatus};

use super::{
    RequestStore, Result, StatusUpdate, Storage, StorageError, parse_status, parse_timestamp,
};

const SELECT_REQUEST: &str = "SELECT id, process_id, process_name, submitted_by, submitted_at,
        data, status, remarks, decided_by, decided_at, timeline
     FROM request";

impl Storage {
    /// Lists all requests, oldest submission first.
    pub fn list_requests(&self) -> Result<Vec<Request>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(SELECT_REQUEST)?;
        let rows = stmt.query_map([], RawRequest::from_row)?;
        let mut requests = Vec::new();
        for raw in rows {
            requests.push(raw?.into_request()?);
        }
        requests.sort_by(|a: &Request, b: &Request| a.submitted_at.cmp(&b.submitted_at));
        Ok(requests)
    }
}

impl RequestStore for Storage {
    fn get_request(&self, id: Uuid) -> Result<Request> {
        let conn = self.open()?;
        load_request(&conn, id)?.ok_or(StorageError::RequestNotFound(id))
    }

    fn create_request(&self, request: Request) -> Result<Request> {
        let conn = self.open()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO request (id, process_id, process_name, submitted_by,
                 submitted_at, data, status, remarks, decided_by, decided_at, timeline)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                request.id.to_string(),
                &request.process_id,
                &request.process_name,
                &request.submitted_by,
                request.submitted_at.to_string(),
                serde_json::to_string(&request.data)?,
                request.status.as_str(),
                &request.remarks,
                &request.decided_by,
                request.decided_at.map(|t| t.to_string()),
                serde_json::to_string(&request.timeline)?,
            ],
        )?;
        if inserted == 0 {
            return Err(StorageError::RequestAlreadyExists(request.id));
        }
        Ok(request)
    }

    fn conditional_update_status(
        &self,
        id: Uuid,
        expected: RequestStatus,
        update: &StatusUpdate,
    ) -> Result<()> {
        let conn = self.open()?;
        let rows = conn.execute(
            "UPDATE request
             SET status = ?1, remarks = ?2, decided_by = ?3, decided_at = ?4, timeline = ?5
             WHERE id = ?6 AND status = ?7",
            rusqlite::params![
                update.status.as_str(),
                &update.remarks,
                &update.decided_by,
                update.decided_at.to_string(),
                serde_json::to_string(&update.timeline)?,
                id.to_string(),
                expected.as_str(),
            ],
        )?;
        if rows == 1 {
            return Ok(());
        }

        // Nothing matched: either the request is gone or its status moved on.
        let actual: Option<String> = conn
            .query_row(
                "SELECT status FROM request WHERE id = ?1",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        match actual {
            None => Err(StorageError::RequestNotFound(id)),
            Some(actual) => Err(StorageError::Conflict {
                id,
                expected,
                actual: parse_status(&actual)?,
            }),
        }
    }
}

fn load_request(conn: &Connection, id: Uuid) -> Result<Option<Request>> {
    let raw = conn
        .query_row(
            &format!("{SELECT_REQUEST} WHERE id = ?1"),
            [id.to_string()],
            RawRequest::from_row,
        )
        .optional()?;
    raw.map(RawRequest::into_request).transpose()
}

/// A request row as stored, before parsing.
struct RawRequest {
    id: String,
    process_id: String,
    process_name: String,
    submitted_by: String,
    submitted_at: String,
    data: String,
    status: String,
    remarks: Option<String>,
    decided_by: Option<String>,
    decided_at: Option<String>,
    timeline: String,
}

impl RawRequest {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            process_id: row.get(1)?,
            process_name: row.get(2)?,
            submitted_by: row.get(3)?,
            submitted_at: row.get(4)?,
            data: row.get(5)?,
            status: row.get(6)?,
            remarks: row.get(7)?,
            decided_by: row.get(8)?,
            decided_at: row.get(9)?,
            timeline: row.get(10)?,
        })
    }

    fn into_request(self) -> Result<Request> {
        let id = self
            .id
            .parse::<Uuid>()
            .map_err(|e| StorageError::Corrupt(format!("invalid request id: {e}")))?;
        let decided_at = self
            .decided_at
            .as_deref()
            .map(|s| parse_timestamp(s, "decided_at"))
            .transpose()?;

        let request = Request {
            id,
            process_id: self.process_id,
            process_name: self.process_name,
            submitted_by: self.submitted_by,
            submitted_at: parse_timestamp(&self.submitted_at, "submitted_at")?,
            data: serde_json::from_str(&self.data)?,
            status: parse_status(&self.status)?,
            remarks: self.remarks,
            decided_by: self.decided_by,
            decided_at,
            timeline: serde_json::from_str(&self.timeline)?,
        };

        if request.timeline_status() != request.status {
            return Err(StorageError::Corrupt(format!(
                "request {id} is {} but its timeline says {}",
                request.status,
                request.timeline_status()
            )));
        }
        Ok(request)
    }
}
