//! Risk analysis types: the engine's input and its explainable output.

use serde::{Deserialize, Serialize};

use super::request::RequestData;

/// The engine's boundary input.
///
/// Every member is optional on the wire so that a missing one can be
/// reported as a validation failure rather than a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisInput {
    #[serde(default)]
    pub request_id: Option<String>,

    #[serde(default)]
    pub process_id: Option<String>,

    #[serde(default)]
    pub data: Option<RequestData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Passed,
    Warning,
    Failed,
}

/// What a single check concluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    pub name: String,
    pub status: CheckStatus,
    pub details: String,
    pub risk_contribution: u32,
}

/// Risk tier derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// `..=3` is low, `4..=6` medium, `7..` high.
    pub fn from_score(score: u32) -> Self {
        match score {
            ..=3 => Self::Low,
            4..=6 => Self::Medium,
            _ => Self::High,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// The engine's boundary output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAnalysisResult {
    pub request_id: String,

    /// Always within `2..=10`.
    pub risk_score: u32,

    pub risk_level: RiskLevel,

    pub auto_approved: bool,

    /// Never empty.
    pub checks: Vec<CheckOutcome>,

    pub recommendation: String,

    pub reasoning: String,
}

impl RiskAnalysisResult {
    pub fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    pub fn has_failure(&self) -> bool {
        self.count(CheckStatus::Failed) > 0
    }
}
