//! Process storage: validated definitions, replaced wholesale on update.

use jiff::Timestamp;
use rusqlite::OptionalExtension;

use crate::model::ProcessDefinition;

use super::{ProcessStore, Result, Storage, StorageError};

impl Storage {
    /// Validates and stores a process definition, replacing any existing
    /// definition with the same id.
    ///
    /// Definitions from any source, generated or hand-written, go through
    /// the same validation.
    pub fn put_process(&self, process: &ProcessDefinition) -> Result<()> {
        process.validate()?;
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO process (id, name, definition, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (id) DO UPDATE
             SET name = excluded.name,
                 definition = excluded.definition,
                 updated_at = excluded.updated_at",
            rusqlite::params![
                &process.id,
                &process.name,
                serde_json::to_string(process)?,
                Timestamp::now().to_string(),
            ],
        )?;
        Ok(())
    }

    /// Deletes a process definition.
    ///
    /// Requests referencing it are left untouched.
    pub fn delete_process(&self, id: &str) -> Result<()> {
        let conn = self.open()?;
        let rows = conn.execute("DELETE FROM process WHERE id = ?1", [id])?;
        if rows == 0 {
            return Err(StorageError::ProcessNotFound(id.to_string()));
        }
        Ok(())
    }
}

impl ProcessStore for Storage {
    fn get_process(&self, id: &str) -> Result<ProcessDefinition> {
        let conn = self.open()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT definition FROM process WHERE id = ?1",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        let json = json.ok_or_else(|| StorageError::ProcessNotFound(id.to_string()))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Lists all processes, sorted by name then id.
    fn list_processes(&self) -> Result<Vec<ProcessDefinition>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare("SELECT definition FROM process ORDER BY name, id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut processes = Vec::new();
        for json in rows {
            processes.push(serde_json::from_str(&json?)?);
        }
        Ok(processes)
    }
}
