//! CLI interface for Verdict.
//!
//! Designed for scripts and humans alike. Each subcommand is non-interactive:
//! arguments in, JSON out on stdout, short human-readable notes on stderr.
//!
//! Request ids accept a full UUID or an unambiguous prefix.

mod decide;
mod format;
mod process;
mod request;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use uuid::Uuid;

use verdict::config::Config;
use verdict::model::{AnalysisInput, Request};
use verdict::storage::{RequestStore, Storage};
use verdict::{agent, engine};

use decide::DecisionArg;
use process::ProcessCommand;
use request::RequestCommand;

/// Verdict: risk-checked approvals.
#[derive(Debug, Parser)]
#[command(name = "verdict", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Act as this identity (submitter or approver).
    /// Falls back to `VERDICT_IDENTITY`, then `default-identity` in config.
    #[arg(long = "as", global = true)]
    identity: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: approving a firewall change
  1. verdict process put firewall-change.json
  2. verdict request submit --process firewall-change --as alice \
       --field source_ip=10.1.2.3 --field port=443
     → prints a request ID (e.g. 5f2c91ab)
  3. verdict analyze 5f2
  4. verdict decide 5f2 approved --as bob --remarks "Within policy"

Or let the agent decide:
  verdict agent 5f2"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage process definitions.
    Process {
        #[command(subcommand)]
        command: ProcessCommand,
    },

    /// Submit and inspect requests.
    Request {
        #[command(subcommand)]
        command: RequestCommand,
    },

    /// Run the risk engine.
    ///
    /// With a request id, analyzes the stored request and records the result.
    /// With `--input`, analyzes a raw `{requestId, processId, data}` document
    /// without touching storage.
    Analyze {
        /// Request ID: full UUID or unambiguous prefix.
        #[arg(required_unless_present = "input", conflicts_with = "input")]
        request: Option<String>,

        /// Analysis input JSON file.
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Record a decision on a request.
    Decide {
        /// Request ID: full UUID or unambiguous prefix.
        request: String,

        /// The decision.
        #[arg(value_enum)]
        status: DecisionArg,

        /// Remarks recorded with the decision.
        #[arg(long)]
        remarks: Option<String>,

        /// When the decision was made (RFC 3339). Defaults to now.
        #[arg(long)]
        at: Option<String>,
    },

    /// Let the agent analyze a pending request and decide it.
    Agent {
        /// Request ID: full UUID or unambiguous prefix.
        request: String,
    },

    /// List published status-change notifications.
    Notifications {
        /// Only notifications for this request.
        #[arg(long)]
        request: Option<String>,
    },
}

/// Run a parsed command, returning an error message on failure.
pub fn run(cli: Cli, config: &Config, storage: &Storage) -> Result<(), String> {
    let identity = cli.identity.as_deref();

    match cli.command {
        Command::Process { command } => process::run(storage, command),
        Command::Request { command } => request::run(config, storage, identity, command),
        Command::Analyze { request, input } => match (request, input) {
            (_, Some(path)) => cmd_analyze_input(&path),
            (Some(reference), None) => {
                let request = resolve_request(storage, &reference)?;
                cmd_analyze(storage, &request)
            }
            (None, None) => Err("specify a request id or --input".to_string()),
        },
        Command::Decide {
            request,
            status,
            remarks,
            at,
        } => {
            let request = resolve_request(storage, &request)?;
            decide::cmd_decide(
                config,
                storage,
                identity,
                &request,
                status,
                remarks,
                at.as_deref(),
            )
        }
        Command::Agent { request } => {
            let request = resolve_request(storage, &request)?;
            cmd_agent(storage, &request)
        }
        Command::Notifications { request } => {
            let id = request
                .map(|r| resolve_request(storage, &r).map(|req| req.id))
                .transpose()?;
            cmd_notifications(storage, id)
        }
    }
}

fn cmd_analyze(storage: &Storage, request: &Request) -> Result<(), String> {
    let analysis =
        agent::assess(storage, request).map_err(|e| format!("analysis failed: {e}"))?;
    eprintln!("{}", format::describe_analysis(&analysis));
    print_json(&analysis)
}

fn cmd_analyze_input(path: &Path) -> Result<(), String> {
    let json = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let input: AnalysisInput = serde_json::from_str(&json)
        .map_err(|e| format!("invalid analysis input in {}: {e}", path.display()))?;

    let analysis = engine::analyze(&input).map_err(|e| {
        let class = if e.is_client_error() {
            "client error"
        } else {
            "server error"
        };
        format!("analysis rejected ({class}): {e}")
    })?;
    eprintln!("{}", format::describe_analysis(&analysis));
    print_json(&analysis)
}

fn cmd_agent(storage: &Storage, request: &Request) -> Result<(), String> {
    let (analysis, decided) = agent::act(storage, storage, request.id)
        .map_err(|e| format!("agent could not decide: {e}"))?;
    eprintln!("{}", format::describe_analysis(&analysis));
    eprintln!(
        "Request {} → {}",
        format::short_id(decided.id),
        decided.status
    );
    print_json(&decided)
}

fn cmd_notifications(storage: &Storage, request: Option<Uuid>) -> Result<(), String> {
    let notifications = storage
        .list_notifications(request)
        .map_err(|e| format!("failed to list notifications: {e}"))?;
    print_json(&notifications)
}

/// Pretty-print a value as JSON on stdout.
fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("failed to serialize output: {e}"))?;
    println!("{json}");
    Ok(())
}

/// Resolve a request reference (full UUID or unambiguous prefix) to a request.
fn resolve_request(storage: &Storage, reference: &str) -> Result<Request, String> {
    // Try full UUID first.
    if let Ok(id) = reference.parse::<Uuid>() {
        return storage
            .get_request(id)
            .map_err(|e| format!("request not found: {e}"));
    }

    // Try as a prefix match against all requests.
    let requests = storage
        .list_requests()
        .map_err(|e| format!("failed to list requests: {e}"))?;

    let matches: Vec<&Request> = requests
        .iter()
        .filter(|r| r.id.to_string().starts_with(reference))
        .collect();

    match matches.as_slice() {
        [] => Err(format!("no request matching '{reference}'")),
        [only] => Ok((*only).clone()),
        many => {
            let ids: Vec<String> = many.iter().map(|r| format::short_id(r.id)).collect();
            Err(format!(
                "'{reference}' is ambiguous; it matches {} requests: {}",
                many.len(),
                ids.join(", ")
            ))
        }
    }
}
