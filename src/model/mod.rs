//! Core data model for Verdict.
//!
//! These types represent the approval workflow: process definitions,
//! requests and their audit timeline, and risk analysis results.

mod analysis;
mod process;
mod request;

pub use analysis::{AnalysisInput, CheckOutcome, CheckStatus, RiskAnalysisResult, RiskLevel};
pub use process::{
    AgentConfig, DefaultDecision, FieldKind, FormField, Policy, ProcessDefinition, RiskDefinition,
    Severity, Thresholds, ValidationError,
};
pub use request::{
    EntryStatus, FieldValue, Request, RequestData, RequestStatus, SubmissionError, TimelineEntry,
    TimelineKind,
};

#[cfg(test)]
pub(crate) use process::tests::sample_process;
