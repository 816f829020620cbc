//! Notification outbox: one row per (request, status), written on transition.

use jiff::Timestamp;
use uuid::Uuid;

use crate::model::RequestStatus;
use crate::notify::{Notification, Notifier, NotifyError};

use super::{Result, Storage, StorageError, parse_status, parse_timestamp};

impl Storage {
    /// Lists published notifications in publication order, optionally for one request.
    pub fn list_notifications(&self, request_id: Option<Uuid>) -> Result<Vec<Notification>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT request_id, status, published_at FROM notification
             WHERE ?1 IS NULL OR request_id = ?1
             ORDER BY rowid",
        )?;
        let rows = stmt.query_map([request_id.map(|id| id.to_string())], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut notifications = Vec::new();
        for row in rows {
            let (id, status, published_at) = row?;
            notifications.push(Notification {
                request_id: id
                    .parse()
                    .map_err(|e| StorageError::Corrupt(format!("invalid request id: {e}")))?,
                status: parse_status(&status)?,
                published_at: parse_timestamp(&published_at, "published_at")?,
            });
        }
        Ok(notifications)
    }

    fn insert_notification(&self, request_id: Uuid, status: RequestStatus) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT OR IGNORE INTO notification (request_id, status, published_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![
                request_id.to_string(),
                status.as_str(),
                Timestamp::now().to_string(),
            ],
        )?;
        Ok(())
    }
}

impl Notifier for Storage {
    fn publish(
        &self,
        request_id: Uuid,
        status: RequestStatus,
    ) -> core::result::Result<(), NotifyError> {
        self.insert_notification(request_id, status)
            .map_err(|e| NotifyError(e.to_string()))?;
        tracing::info!(%request_id, %status, "request status changed");
        Ok(())
    }
}
