//! Analysis storage: the latest risk analysis for each request.

use jiff::Timestamp;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::model::RiskAnalysisResult;

use super::{Result, Storage};

impl Storage {
    /// Records `result` as the latest analysis of `request_id`.
    pub fn save_analysis(&self, request_id: Uuid, result: &RiskAnalysisResult) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT OR REPLACE INTO analysis (request_id, result, analyzed_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![
                request_id.to_string(),
                serde_json::to_string(result)?,
                Timestamp::now().to_string(),
            ],
        )?;
        Ok(())
    }

    /// Loads the latest analysis of `request_id`, if one was recorded.
    pub fn load_analysis(&self, request_id: Uuid) -> Result<Option<RiskAnalysisResult>> {
        let conn = self.open()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT result FROM analysis WHERE request_id = ?1",
                [request_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(json) = json else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&json)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::engine;
    use crate::model::{AnalysisInput, FieldValue, RequestData};
    use crate::storage::tests::test_storage;

    fn analysis(port: i32) -> RiskAnalysisResult {
        engine::analyze(&AnalysisInput {
            request_id: Some("r".into()),
            process_id: Some("firewall".into()),
            data: Some(RequestData::from([(
                "port".to_string(),
                FieldValue::from(port),
            )])),
        })
        .unwrap()
    }

    #[test]
    fn load_missing_analysis_is_none() {
        let (_dir, storage) = test_storage();
        assert!(storage.load_analysis(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn save_keeps_latest() {
        let (_dir, storage) = test_storage();
        let id = Uuid::new_v4();

        storage.save_analysis(id, &analysis(22)).unwrap();
        storage.save_analysis(id, &analysis(443)).unwrap();

        let loaded = storage.load_analysis(id).unwrap().unwrap();
        assert_eq!(loaded, analysis(443));
    }
}
