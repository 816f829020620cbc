//! The automated approver.
//!
//! The agent analyzes a stored request, weighs the analysis against the
//! process's agent configuration, and records its decision like any other
//! approver would. It only ever acts on pending requests; anything it
//! cannot approve confidently goes to a human unless the process says to
//! reject by default.

use uuid::Uuid;

use crate::decision::{self, DecisionError, DecisionInput};
use crate::engine::{self, EngineError, MAX_SCORE};
use crate::model::{
    AgentConfig, AnalysisInput, DefaultDecision, Request, RequestStatus, RiskAnalysisResult,
    RiskLevel,
};
use crate::notify::Notifier;
use crate::storage::{ProcessStore, RequestStore, Storage, StorageError};

/// Recorded as `decidedBy` on the agent's decisions.
pub const AGENT_ACTOR: &str = "agent";

/// What the agent would decide, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub status: RequestStatus,
    /// In `[0, 1]`. Falls linearly from 1 at the base score to 0 at the ceiling.
    pub confidence: f64,
    pub rationale: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Decision(#[from] DecisionError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("request {id} is {status}; the agent only decides pending requests")]
    NotPending { id: Uuid, status: RequestStatus },
}

/// Confidence the agent places in an analysis.
pub fn confidence(analysis: &RiskAnalysisResult) -> f64 {
    let headroom = MAX_SCORE.saturating_sub(analysis.risk_score);
    (f64::from(headroom) / f64::from(MAX_SCORE - engine::BASE_SCORE)).clamp(0.0, 1.0)
}

/// Decide what the agent would do with `analysis` under `config`.
pub fn propose(analysis: &RiskAnalysisResult, config: &AgentConfig) -> Proposal {
    let confidence = confidence(analysis);

    if analysis.auto_approved && confidence >= config.confidence_threshold {
        return Proposal {
            status: RequestStatus::Approved,
            confidence,
            rationale: format!(
                "Auto-approved at confidence {confidence:.2}. {}",
                analysis.reasoning
            ),
        };
    }

    let status = match config.default_decision {
        DefaultDecision::Reject => RequestStatus::Rejected,
        DefaultDecision::Human => RequestStatus::Human,
        // Approving by default never overrides a failed check or high risk.
        DefaultDecision::Approve
            if !analysis.has_failure() && analysis.risk_level != RiskLevel::High =>
        {
            RequestStatus::Approved
        }
        DefaultDecision::Approve => RequestStatus::Human,
    };
    Proposal {
        status,
        confidence,
        rationale: format!(
            "Not confident enough to auto-approve (confidence {confidence:.2}, threshold {:.2}); \
             {}. {}",
            config.confidence_threshold,
            analysis.recommendation,
            analysis.reasoning
        ),
    }
}

/// Analyze a stored request and record the latest result.
///
/// A failure to record the analysis is logged; the result is still returned.
pub fn assess(storage: &Storage, request: &Request) -> Result<RiskAnalysisResult, EngineError> {
    let analysis = engine::analyze(&AnalysisInput {
        request_id: Some(request.id.to_string()),
        process_id: Some(request.process_id.clone()),
        data: Some(request.data.clone()),
    })?;
    if let Err(e) = storage.save_analysis(request.id, &analysis) {
        tracing::warn!(request_id = %request.id, "failed to record analysis: {e}");
    }
    Ok(analysis)
}

/// Analyze a pending request and record the agent's decision on it.
///
/// If the request's process has since been deleted, the default agent
/// configuration applies.
pub fn act(
    storage: &Storage,
    notifier: &dyn Notifier,
    request_id: Uuid,
) -> Result<(RiskAnalysisResult, Request), AgentError> {
    let request = storage
        .get_request(request_id)
        .map_err(DecisionError::from)?;
    if request.status != RequestStatus::Pending {
        return Err(AgentError::NotPending {
            id: request.id,
            status: request.status,
        });
    }

    let config = match storage.get_process(&request.process_id) {
        Ok(process) => process.agent_config,
        Err(StorageError::ProcessNotFound(_)) => {
            tracing::warn!(
                request_id = %request.id,
                process_id = %request.process_id,
                "process no longer exists; using default agent configuration"
            );
            AgentConfig::default()
        }
        Err(e) => return Err(e.into()),
    };

    let analysis = assess(storage, &request)?;
    let proposal = propose(&analysis, &config);
    let decided = decision::record(
        storage,
        notifier,
        &DecisionInput {
            request_id: request.id,
            status: proposal.status,
            remarks: Some(proposal.rationale),
            decided_by: Some(AGENT_ACTOR.to_string()),
            decided_at: None,
        },
    )?;
    Ok((analysis, decided))
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;

    use crate::model::{FieldValue, RequestData, sample_process};
    use crate::notify::LogNotifier;
    use crate::storage::tests::test_storage;

    fn analysis_of(pairs: &[(&str, FieldValue)]) -> RiskAnalysisResult {
        engine::analyze(&AnalysisInput {
            request_id: Some("r".into()),
            process_id: Some("generic".into()),
            data: Some(
                pairs
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), v.clone()))
                    .collect(),
            ),
        })
        .unwrap()
    }

    fn config(default_decision: DefaultDecision, confidence_threshold: f64) -> AgentConfig {
        AgentConfig {
            allow_human_override: true,
            default_decision,
            confidence_threshold,
        }
    }

    #[test]
    fn confidence_spans_the_scale() {
        assert!((confidence(&analysis_of(&[])) - 1.0).abs() < f64::EPSILON);
        let high = analysis_of(&[("source_ip", "192.168.1.100".into()), ("port", 22.into())]);
        assert!(confidence(&high).abs() < f64::EPSILON);
    }

    #[test]
    fn clean_request_is_approved() {
        let p = propose(
            &analysis_of(&[("port", 443.into())]),
            &config(DefaultDecision::Human, 0.8),
        );
        assert_eq!(p.status, RequestStatus::Approved);
    }

    #[test]
    fn threshold_can_withhold_approval() {
        // Score 3 gives confidence 0.875.
        let a = analysis_of(&[("license_type", "Paid".into())]);
        assert!(a.auto_approved);
        let p = propose(&a, &config(DefaultDecision::Human, 0.9));
        assert_eq!(p.status, RequestStatus::Human);
    }

    #[test]
    fn uncertain_request_follows_default_decision() {
        let a = analysis_of(&[("software_name", "TeamViewer".into())]);
        assert_eq!(
            propose(&a, &config(DefaultDecision::Human, 0.5)).status,
            RequestStatus::Human
        );
        assert_eq!(
            propose(&a, &config(DefaultDecision::Reject, 0.5)).status,
            RequestStatus::Rejected
        );
        assert_eq!(
            propose(&a, &config(DefaultDecision::Approve, 0.5)).status,
            RequestStatus::Approved
        );
    }

    #[test]
    fn default_approve_never_overrides_failed_check() {
        let a = analysis_of(&[("amount", 6000.into())]);
        assert_eq!(
            propose(&a, &config(DefaultDecision::Approve, 0.0)).status,
            RequestStatus::Human
        );
    }

    #[test]
    fn assess_returns_analysis_when_recording_fails() {
        let (dir, storage) = test_storage();
        let data = RequestData::from([
            ("source_ip".to_string(), FieldValue::from("8.8.8.8")),
            ("port".to_string(), FieldValue::from(22)),
        ]);
        let request = Request::submit(&sample_process(), "alice", data, Timestamp::now()).unwrap();
        // The next connection recreates an empty file with no tables.
        std::fs::remove_file(dir.path().join("db").join("verdict.sqlite")).unwrap();

        let analysis = assess(&storage, &request).unwrap();

        assert_eq!(analysis.risk_score, 6);
        assert_eq!(analysis.request_id, request.id.to_string());
        assert!(storage.load_analysis(request.id).is_err());
    }

    #[test]
    fn act_records_agent_decision() {
        let (_dir, storage) = test_storage();
        let process = sample_process();
        storage.put_process(&process).unwrap();
        let data = RequestData::from([
            ("source_ip".to_string(), FieldValue::from("192.168.1.100")),
            ("port".to_string(), FieldValue::from(22)),
        ]);
        let request = storage
            .create_request(Request::submit(&process, "alice", data, Timestamp::now()).unwrap())
            .unwrap();

        let (analysis, decided) = act(&storage, &LogNotifier, request.id).unwrap();

        assert_eq!(analysis.risk_score, 10);
        assert_eq!(decided.status, RequestStatus::Human);
        assert_eq!(decided.decided_by.as_deref(), Some(AGENT_ACTOR));
        assert_eq!(storage.load_analysis(request.id).unwrap(), Some(analysis));

        let err = act(&storage, &LogNotifier, request.id).unwrap_err();
        assert!(matches!(err, AgentError::NotPending { .. }));
    }

    #[test]
    fn act_survives_deleted_process() {
        let (_dir, storage) = test_storage();
        let process = sample_process();
        storage.put_process(&process).unwrap();
        let data = RequestData::from([
            ("source_ip".to_string(), FieldValue::from("8.8.8.8")),
            ("port".to_string(), FieldValue::from(443)),
        ]);
        let request = storage
            .create_request(Request::submit(&process, "alice", data, Timestamp::now()).unwrap())
            .unwrap();
        storage.delete_process(&process.id).unwrap();

        let (_, decided) = act(&storage, &LogNotifier, request.id).unwrap();
        assert_eq!(decided.status, RequestStatus::Approved);
    }
}
