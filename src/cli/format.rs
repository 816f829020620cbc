//! Output formatting for CLI display.

use uuid::Uuid;

use verdict::model::{Request, RequestStatus, RiskAnalysisResult};

/// The first eight characters of an id, enough to resolve it again.
pub(super) fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// One line per request for `request list`.
pub(super) fn request_line(request: &Request) -> String {
    let status = match request.status {
        RequestStatus::Pending => "pending",
        RequestStatus::Approved => "approved",
        RequestStatus::Rejected => "rejected",
        RequestStatus::Human => "needs review",
    };
    format!(
        "{}  [{status}]  {}  by {}",
        short_id(request.id),
        request.process_name,
        request.submitted_by
    )
}

/// A one-line summary of an analysis for stderr.
pub(super) fn describe_analysis(analysis: &RiskAnalysisResult) -> String {
    let verdict = if analysis.auto_approved {
        "auto-approvable"
    } else {
        "needs approval"
    };
    format!(
        "Risk {}/10 ({}, {verdict}): {}",
        analysis.risk_score,
        analysis.risk_level.as_str(),
        analysis.recommendation
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use verdict::model::{CheckOutcome, CheckStatus, RiskLevel};

    #[test]
    fn short_id_is_eight_chars() {
        let id = Uuid::new_v4();
        let short = short_id(id);
        assert_eq!(short.len(), 8);
        assert!(id.to_string().starts_with(&short));
    }

    #[test]
    fn describes_analysis() {
        let analysis = RiskAnalysisResult {
            request_id: "r".into(),
            risk_score: 4,
            risk_level: RiskLevel::Medium,
            auto_approved: false,
            checks: vec![CheckOutcome {
                name: "Software Security Check".into(),
                status: CheckStatus::Warning,
                details: "TeamViewer requires review".into(),
                risk_contribution: 2,
            }],
            recommendation: "Escalate to manager for approval".into(),
            reasoning: String::new(),
        };
        assert_eq!(
            describe_analysis(&analysis),
            "Risk 4/10 (medium, needs approval): Escalate to manager for approval"
        );
    }
}
