//! Check registry: independent evaluators over submitted request data.
//!
//! Each check names the field that triggers it and, optionally, a process-id
//! hint that activates it even when the form uses generic field names.
//! Checks are pure: same input, same outcome. They never fail; a value that
//! cannot be interpreted is reported as `failed` at the check's maximum
//! contribution.

mod budget;
mod network;
mod software;

use crate::model::{CheckOutcome, CheckStatus, FieldValue, RequestData};

/// A built-in check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    IpReputation,
    PortRisk,
    Budget,
    SoftwareSecurity,
    LicenseCost,
}

/// The fixed catalog, in evaluation order.
pub const REGISTRY: [Check; 5] = [
    Check::IpReputation,
    Check::PortRisk,
    Check::Budget,
    Check::SoftwareSecurity,
    Check::LicenseCost,
];

/// Name of the outcome synthesized when no check applies.
pub const BASIC_VALIDATION: &str = "Basic Validation";

impl Check {
    pub fn name(self) -> &'static str {
        match self {
            Self::IpReputation => "IP Reputation Check",
            Self::PortRisk => "Port Risk Assessment",
            Self::Budget => "Budget Check",
            Self::SoftwareSecurity => "Software Security Check",
            Self::LicenseCost => "License Cost Check",
        }
    }

    /// The field whose presence triggers this check.
    pub fn trigger_field(self) -> &'static str {
        match self {
            Self::IpReputation => "source_ip",
            Self::PortRisk => "port",
            Self::Budget => "amount",
            Self::SoftwareSecurity => "software_name",
            Self::LicenseCost => "license_type",
        }
    }

    /// Generic field names consulted when the check is activated by a
    /// process hint rather than by its trigger field.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::IpReputation => &["ip", "ip_address", "source", "source_address"],
            Self::PortRisk => &["destination_port", "port_number", "target_port"],
            Self::Budget => &["cost", "total", "price"],
            Self::SoftwareSecurity => &["software", "application", "app_name"],
            Self::LicenseCost => &[],
        }
    }

    /// Process-id substrings that activate this check.
    fn process_hints(self) -> &'static [&'static str] {
        match self {
            Self::IpReputation | Self::PortRisk => &["firewall"],
            Self::Budget => &["budget", "purchase", "expense"],
            Self::SoftwareSecurity => &["software"],
            Self::LicenseCost => &[],
        }
    }

    /// The largest contribution this check can make.
    pub fn max_contribution(self) -> u32 {
        match self {
            Self::IpReputation | Self::PortRisk => 4,
            Self::Budget => 3,
            Self::SoftwareSecurity => 5,
            Self::LicenseCost => 1,
        }
    }

    /// Whether this check runs for the given process and data.
    ///
    /// A blank trigger value counts as absent, as it does on submission.
    pub fn applies(self, process_id: &str, data: &RequestData) -> bool {
        if data.get(self.trigger_field()).is_some_and(|v| !v.is_blank()) {
            return true;
        }
        let process_id = process_id.to_ascii_lowercase();
        self.process_hints()
            .iter()
            .any(|hint| process_id.contains(hint))
    }

    /// Evaluate the check against `data`.
    ///
    /// The trigger field wins; aliases are consulted only when it is absent.
    /// An absent or blank value is malformed input.
    pub fn evaluate(self, data: &RequestData) -> CheckOutcome {
        let present = |key: &str| data.get(key).filter(|v| !v.is_blank());
        let value = present(self.trigger_field())
            .or_else(|| self.aliases().iter().find_map(|alias| present(*alias)));
        let Some(value) = value else {
            return self.malformed("no value supplied");
        };

        match self {
            Self::IpReputation => network::ip_reputation(self, value),
            Self::PortRisk => network::port_risk(self, value),
            Self::Budget => budget::budget(self, value),
            Self::SoftwareSecurity => software::software_security(self, value),
            Self::LicenseCost => software::license_cost(self, value),
        }
    }

    fn outcome(self, status: CheckStatus, contribution: u32, details: String) -> CheckOutcome {
        CheckOutcome {
            name: self.name().to_string(),
            status,
            details,
            risk_contribution: contribution,
        }
    }

    fn malformed(self, why: &str) -> CheckOutcome {
        self.outcome(
            CheckStatus::Failed,
            self.max_contribution(),
            format!("Could not evaluate {}: {why}", self.trigger_field()),
        )
    }
}

/// Run every applicable check, in registry order.
///
/// Never returns an empty list: when nothing applies, a single passed
/// [`BASIC_VALIDATION`] outcome with zero contribution stands in.
pub fn run_applicable(process_id: &str, data: &RequestData) -> Vec<CheckOutcome> {
    let mut outcomes: Vec<CheckOutcome> = REGISTRY
        .iter()
        .filter(|check| check.applies(process_id, data))
        .map(|check| {
            let outcome = check.evaluate(data);
            tracing::debug!(
                check = check.name(),
                status = ?outcome.status,
                contribution = outcome.risk_contribution,
                "check evaluated"
            );
            outcome
        })
        .collect();

    if outcomes.is_empty() {
        outcomes.push(CheckOutcome {
            name: BASIC_VALIDATION.to_string(),
            status: CheckStatus::Passed,
            details: "No specific checks apply; basic validation passed".to_string(),
            risk_contribution: 0,
        });
    }
    outcomes
}

/// Text of a value that must be a non-blank scalar string.
fn scalar_text(value: &FieldValue) -> Option<&str> {
    match value {
        FieldValue::Text(s) if !s.trim().is_empty() => Some(s.trim()),
        _ => None,
    }
}
