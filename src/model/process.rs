//! Process definitions: the admin-authored template a request is submitted against.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A process: form schema, advisory policies, risk bands, and agent settings.
///
/// Pure data. Definitions may be hand-written or machine-generated; either
/// way they pass through [`ProcessDefinition::validate`] before being stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDefinition {
    /// Unique, immutable once created.
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// The submission form, in display order.
    #[serde(default)]
    pub fields: Vec<FormField>,

    /// Human-readable business rules. Advisory context, never executed.
    #[serde(default)]
    pub policies: Vec<Policy>,

    #[serde(default)]
    pub risk_definitions: Vec<RiskDefinition>,

    #[serde(default)]
    pub agent_config: AgentConfig,
}

/// One input on the submission form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    /// Unique within the process. Keys the submitted data map.
    pub key: String,

    pub label: String,

    #[serde(rename = "type")]
    pub kind: FieldKind,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    /// Allowed values for `select` fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

/// The input type of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Textarea,
    Select,
    File,
    Email,
}

/// A business rule stated in prose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub text: String,

    #[serde(rename = "type", default)]
    pub kind: String,

    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A named risk factor with its threshold bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskDefinition {
    pub risk_id: String,

    pub definition_text: String,

    pub thresholds: Thresholds,

    #[serde(default)]
    pub description: String,
}

/// Band boundaries. Must be strictly increasing: `low < medium < high`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

/// How the automated agent behaves for this process.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    pub allow_human_override: bool,

    pub default_decision: DefaultDecision,

    /// Minimum confidence, in `[0, 1]`, for the agent to approve on its own.
    pub confidence_threshold: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            allow_human_override: true,
            default_decision: DefaultDecision::Human,
            confidence_threshold: 0.8,
        }
    }
}

/// What the agent falls back to when it cannot decide confidently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefaultDecision {
    Approve,
    Reject,
    Human,
}

/// A schema violation in a process definition.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("process id must not be empty")]
    EmptyId,

    #[error("process name must not be empty")]
    EmptyName,

    #[error("field key must not be empty (field #{0})")]
    EmptyFieldKey(usize),

    #[error("duplicate field key: {0}")]
    DuplicateFieldKey(String),

    #[error("select field '{0}' has no options")]
    SelectWithoutOptions(String),

    #[error("risk '{0}' thresholds must satisfy low < medium < high")]
    ThresholdOrder(String),

    #[error("confidence threshold {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),
}

impl ProcessDefinition {
    /// Check the definition's structural invariants.
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let mut seen = HashSet::new();
        for (i, field) in self.fields.iter().enumerate() {
            if field.key.trim().is_empty() {
                return Err(ValidationError::EmptyFieldKey(i));
            }
            if !seen.insert(field.key.as_str()) {
                return Err(ValidationError::DuplicateFieldKey(field.key.clone()));
            }
            if field.kind == FieldKind::Select
                && field.options.as_ref().is_none_or(Vec::is_empty)
            {
                return Err(ValidationError::SelectWithoutOptions(field.key.clone()));
            }
        }

        for risk in &self.risk_definitions {
            let t = risk.thresholds;
            // Also rejects NaN, which compares false both ways.
            if !(t.low < t.medium && t.medium < t.high) {
                return Err(ValidationError::ThresholdOrder(risk.risk_id.clone()));
            }
        }

        let c = self.agent_config.confidence_threshold;
        if !(0.0..=1.0).contains(&c) {
            return Err(ValidationError::ConfidenceOutOfRange(c));
        }

        Ok(())
    }
}
