//! Request commands: submit, list, show.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use jiff::Timestamp;

use verdict::config::Config;
use verdict::identity::require_identity;
use verdict::model::{FieldValue, Request, RequestData};
use verdict::storage::{ProcessStore, RequestStore, Storage};

use super::{format, print_json, resolve_request};

#[derive(Debug, Subcommand)]
pub enum RequestCommand {
    /// Submit a request against a process. Prints the request ID.
    Submit {
        /// Process ID.
        #[arg(long)]
        process: String,

        /// A form value as `key=value`. Repeat a key for multi-file fields.
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,

        /// Form data as a JSON object, merged under any `--field` values.
        #[arg(long)]
        data: Option<PathBuf>,
    },

    /// List requests, oldest first.
    List,

    /// Print a request, its timeline, and its latest analysis as JSON.
    Show {
        /// Request ID: full UUID or unambiguous prefix.
        request: String,
    },
}

pub(super) fn run(
    config: &Config,
    storage: &Storage,
    identity: Option<&str>,
    command: RequestCommand,
) -> Result<(), String> {
    match command {
        RequestCommand::Submit {
            process,
            fields,
            data,
        } => {
            let submitted_by = require_identity(identity, config)?;
            let mut form = match data {
                Some(path) => read_data(&path)?,
                None => RequestData::new(),
            };
            form.extend(parse_fields(&fields)?);
            cmd_submit(storage, &process, &submitted_by, form)
        }
        RequestCommand::List => cmd_list(storage),
        RequestCommand::Show { request } => {
            let request = resolve_request(storage, &request)?;
            let analysis = storage
                .load_analysis(request.id)
                .map_err(|e| format!("failed to load analysis: {e}"))?;
            print_json(&serde_json::json!({
                "request": request,
                "analysis": analysis,
            }))
        }
    }
}

fn cmd_submit(
    storage: &Storage,
    process_id: &str,
    submitted_by: &str,
    data: RequestData,
) -> Result<(), String> {
    let process = storage
        .get_process(process_id)
        .map_err(|e| format!("failed to load process: {e}"))?;

    let request = Request::submit(&process, submitted_by, data, Timestamp::now())
        .map_err(|e| format!("invalid submission: {e}"))?;
    let request = storage
        .create_request(request)
        .map_err(|e| format!("failed to create request: {e}"))?;

    println!("{}", request.id);
    Ok(())
}

fn cmd_list(storage: &Storage) -> Result<(), String> {
    let requests = storage
        .list_requests()
        .map_err(|e| format!("failed to list requests: {e}"))?;

    if requests.is_empty() {
        println!("No requests");
        return Ok(());
    }

    for r in &requests {
        println!("{}", format::request_line(r));
    }

    Ok(())
}

fn read_data(path: &Path) -> Result<RequestData, String> {
    let json = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&json).map_err(|e| format!("invalid form data in {}: {e}", path.display()))
}

/// Parse `key=value` pairs. Numeric values become numbers; a repeated key
/// collects its values into a list.
fn parse_fields(pairs: &[String]) -> Result<RequestData, String> {
    let mut data = RequestData::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got '{pair}'"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("empty field key in '{pair}'"));
        }

        let value = match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => FieldValue::Number(n),
            _ => FieldValue::Text(raw.to_string()),
        };
        match data.remove(key) {
            None => {
                data.insert(key.to_string(), value);
            }
            Some(previous) => {
                let mut items = match previous {
                    FieldValue::List(items) => items,
                    other => vec![other.to_text()],
                };
                items.push(value.to_text());
                data.insert(key.to_string(), FieldValue::List(items));
            }
        }
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn parses_numbers_and_text() {
        let data = parse_fields(&pairs(&["port=22", "source_ip=10.0.0.1"])).unwrap();
        assert_eq!(data["port"], FieldValue::Number(22.0));
        assert_eq!(data["source_ip"], FieldValue::Text("10.0.0.1".into()));
    }

    #[test]
    fn repeated_key_becomes_list() {
        let data = parse_fields(&pairs(&["files=a.pdf", "files=b.pdf", "files=c.pdf"])).unwrap();
        assert_eq!(
            data["files"],
            FieldValue::List(vec!["a.pdf".into(), "b.pdf".into(), "c.pdf".into()])
        );
    }

    #[test]
    fn value_may_contain_equals() {
        let data = parse_fields(&pairs(&["note=a=b"])).unwrap();
        assert_eq!(data["note"], FieldValue::Text("a=b".into()));
    }

    #[test]
    fn rejects_malformed_pairs() {
        assert!(parse_fields(&pairs(&["port"])).is_err());
        assert!(parse_fields(&pairs(&["=22"])).is_err());
    }
}
