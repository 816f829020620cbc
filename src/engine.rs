//! Risk evaluation engine.
//!
//! One synchronous pass: run the applicable checks, sum their contributions
//! onto a base score, clamp, tier, and explain. No state is shared between
//! calls, so analyses of different requests may run concurrently.

use crate::checks;
use crate::model::{AnalysisInput, CheckStatus, RiskAnalysisResult, RiskLevel};

/// Inherent risk of any request, before checks.
pub const BASE_SCORE: u32 = 2;

/// Ceiling of the risk scale.
pub const MAX_SCORE: u32 = 10;

/// The call was rejected before any check ran.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

impl EngineError {
    /// Whether the caller is at fault (client-error class) rather than the engine.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MissingField(_))
    }
}

/// Analyze a request's data.
///
/// Identical `(process_id, data)` always produce identical results apart
/// from the echoed request id.
pub fn analyze(input: &AnalysisInput) -> Result<RiskAnalysisResult, EngineError> {
    let request_id = input
        .request_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or(EngineError::MissingField("requestId"))?;
    let process_id = input
        .process_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or(EngineError::MissingField("processId"))?;
    let data = input
        .data
        .as_ref()
        .ok_or(EngineError::MissingField("data"))?;

    let checks = checks::run_applicable(process_id, data);

    let raw: u32 = BASE_SCORE + checks.iter().map(|c| c.risk_contribution).sum::<u32>();
    let risk_score = raw.min(MAX_SCORE);
    let risk_level = RiskLevel::from_score(risk_score);
    let any_failed = checks.iter().any(|c| c.status == CheckStatus::Failed);
    let auto_approved = risk_level == RiskLevel::Low && !any_failed;

    let recommendation = if auto_approved {
        "Auto-approve: low risk and all checks passed without failures"
    } else if risk_level == RiskLevel::High {
        "Manual review required: high risk detected"
    } else {
        "Escalate to manager for approval"
    }
    .to_string();

    let mut result = RiskAnalysisResult {
        request_id: request_id.to_string(),
        risk_score,
        risk_level,
        auto_approved,
        checks,
        recommendation,
        reasoning: String::new(),
    };
    result.reasoning = format!(
        "Risk score {risk_score}/10 ({}) from {} check(s): {} passed, {} warning(s), {} failed.",
        risk_level.as_str(),
        result.checks.len(),
        result.count(CheckStatus::Passed),
        result.count(CheckStatus::Warning),
        result.count(CheckStatus::Failed),
    );

    tracing::info!(
        request_id,
        process_id,
        risk_score,
        risk_level = risk_level.as_str(),
        auto_approved,
        "risk analysis complete"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::checks::BASIC_VALIDATION;
    use crate::model::{FieldValue, RequestData};

    fn input(process_id: &str, pairs: &[(&str, FieldValue)]) -> AnalysisInput {
        AnalysisInput {
            request_id: Some("req-1".into()),
            process_id: Some(process_id.into()),
            data: Some(
                pairs
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), v.clone()))
                    .collect(),
            ),
        }
    }

    #[test]
    fn known_bad_ip_on_ssh_is_high_risk() {
        let r = analyze(&input(
            "network-access",
            &[("source_ip", "192.168.1.100".into()), ("port", 22.into())],
        ))
        .unwrap();
        assert_eq!(r.risk_score, 10);
        assert_eq!(r.risk_level, RiskLevel::High);
        assert!(!r.auto_approved);
        assert_eq!(r.count(CheckStatus::Failed), 2);
        assert!(r.recommendation.starts_with("Manual review"));
    }

    #[test]
    fn https_port_auto_approves() {
        let r = analyze(&input("network-access", &[("port", 443.into())])).unwrap();
        assert_eq!(r.risk_score, 2);
        assert_eq!(r.risk_level, RiskLevel::Low);
        assert!(r.auto_approved);
        assert!(r.recommendation.starts_with("Auto-approve"));
    }

    #[test]
    fn review_required_software_escalates() {
        let r = analyze(&input("install", &[("software_name", "TeamViewer".into())])).unwrap();
        assert_eq!(r.risk_score, 4);
        assert_eq!(r.risk_level, RiskLevel::Medium);
        assert!(!r.auto_approved);
        assert!(r.recommendation.starts_with("Escalate"));
    }

    #[test]
    fn failed_check_vetoes_auto_approval() {
        let r = analyze(&input("purchase", &[("amount", 6000.into())])).unwrap();
        assert_eq!(r.risk_score, 5);
        assert_eq!(r.risk_level, RiskLevel::Medium);
        assert!(!r.auto_approved);
    }

    #[test]
    fn score_is_clamped_to_ten() {
        let r = analyze(&input(
            "firewall",
            &[
                ("source_ip", "192.168.1.100".into()),
                ("port", 3389.into()),
                ("software_name", "mimikatz".into()),
            ],
        ))
        .unwrap();
        assert_eq!(r.risk_score, MAX_SCORE);
    }

    #[test]
    fn no_applicable_checks_scores_base() {
        let r = analyze(&input("laptop", &[("reason", "broken screen".into())])).unwrap();
        assert_eq!(r.risk_score, BASE_SCORE);
        assert_eq!(r.checks.len(), 1);
        assert_eq!(r.checks[0].name, BASIC_VALIDATION);
        assert!(r.auto_approved);
    }

    #[test]
    fn reasoning_summarizes_counts() {
        let r = analyze(&input(
            "misc",
            &[("port", 25.into()), ("license_type", "Free".into())],
        ))
        .unwrap();
        assert_eq!(
            r.reasoning,
            "Risk score 4/10 (medium) from 2 check(s): 1 passed, 1 warning(s), 0 failed."
        );
    }

    #[test]
    fn low_score_with_warning_still_auto_approves() {
        // License warning (+1) keeps the score at 3: low tier, nothing failed.
        let r = analyze(&input("misc", &[("license_type", "Paid".into())])).unwrap();
        assert_eq!(r.risk_score, 3);
        assert!(r.auto_approved);
    }

    #[test]
    fn missing_inputs_are_client_errors() {
        let mut i = input("p", &[]);
        i.request_id = None;
        let err = analyze(&i).unwrap_err();
        assert_eq!(err, EngineError::MissingField("requestId"));
        assert!(err.is_client_error());

        let mut i = input("p", &[]);
        i.process_id = Some("  ".into());
        assert_eq!(analyze(&i), Err(EngineError::MissingField("processId")));

        let mut i = input("p", &[]);
        i.data = None;
        assert_eq!(analyze(&i), Err(EngineError::MissingField("data")));
    }

    #[test]
    fn empty_data_is_not_missing_data() {
        let r = analyze(&input("p", &[])).unwrap();
        assert_eq!(r.risk_score, BASE_SCORE);
    }

    #[test]
    fn analysis_is_idempotent() {
        let pairs: &[(&str, FieldValue)] = &[
            ("amount", 1500.into()),
            ("software_name", "Dropbox".into()),
        ];
        let mut a = analyze(&input("software-request", pairs)).unwrap();
        let mut b = analyze(&input("software-request", pairs)).unwrap();
        a.request_id.clear();
        b.request_id.clear();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn adding_a_failing_field_never_lowers_score() {
        let clean: RequestData = [("port".to_string(), FieldValue::from(443))].into();
        let base = analyze(&AnalysisInput {
            request_id: Some("r".into()),
            process_id: Some("p".into()),
            data: Some(clean.clone()),
        })
        .unwrap();

        for (key, value) in [
            ("source_ip", FieldValue::from("192.168.1.100")),
            ("amount", FieldValue::from(9000)),
            ("software_name", FieldValue::from("BitTorrent")),
        ] {
            let mut data = clean.clone();
            data.insert(key.to_string(), value);
            let r = analyze(&AnalysisInput {
                request_id: Some("r".into()),
                process_id: Some("p".into()),
                data: Some(data),
            })
            .unwrap();
            assert!(r.risk_score >= base.risk_score, "{key}");
            assert!(!r.auto_approved, "{key}");
        }
    }
}
