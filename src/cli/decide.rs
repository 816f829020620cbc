//! Decision command: record an approver's decision.

use clap::ValueEnum;
use jiff::Timestamp;

use verdict::config::Config;
use verdict::decision::{self, DecisionError, DecisionInput};
use verdict::identity::resolve_identity;
use verdict::model::{Request, RequestStatus};
use verdict::storage::Storage;

use super::{format, print_json};

/// CLI-facing decision, mapped to the domain `RequestStatus`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DecisionArg {
    /// Approve the request.
    Approved,
    /// Reject the request.
    Rejected,
    /// Hand the request to a human reviewer.
    Human,
}

impl DecisionArg {
    fn to_domain(self) -> RequestStatus {
        match self {
            Self::Approved => RequestStatus::Approved,
            Self::Rejected => RequestStatus::Rejected,
            Self::Human => RequestStatus::Human,
        }
    }
}

pub(super) fn cmd_decide(
    config: &Config,
    storage: &Storage,
    identity: Option<&str>,
    request: &Request,
    status: DecisionArg,
    remarks: Option<String>,
    at: Option<&str>,
) -> Result<(), String> {
    let decided_at = at
        .map(|s| {
            s.parse::<Timestamp>()
                .map_err(|e| format!("invalid --at '{s}': {e}"))
        })
        .transpose()?;

    let input = DecisionInput {
        request_id: request.id,
        status: status.to_domain(),
        remarks,
        decided_by: resolve_identity(identity, config),
        decided_at,
    };

    let decided = decision::record(storage, storage, &input).map_err(|e| match e {
        DecisionError::InvalidTransition { from, .. } if from.is_terminal() => {
            format!("request is already {from}; decisions on it are final")
        }
        e if e.is_conflict() => {
            format!("{e}\nRe-fetch with `verdict request show` before deciding again.")
        }
        e => format!("failed to record decision: {e}"),
    })?;

    eprintln!(
        "Request {} {} → {}",
        format::short_id(decided.id),
        request.status,
        decided.status
    );
    print_json(&decided)
}
