//! Requests: one submission against a process, tracked through its decision states.

use std::{collections::BTreeMap, fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::process::{FieldKind, ProcessDefinition};

/// Submitted form data, keyed by field key.
///
/// Ordered so that serialized output is stable for identical input.
pub type RequestData = BTreeMap<String, FieldValue>;

/// A submitted value. Partially typed: the same field may arrive as a
/// number or as a numeric string depending on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    /// Multi-file uploads.
    List(Vec<String>),
}

impl FieldValue {
    /// Numeric view: numbers as-is, strings if they parse.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            Self::List(_) => None,
        }
    }

    /// Textual view: strings as-is, numbers formatted, lists comma-joined.
    pub fn to_text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            Self::List(items) => items.join(","),
        }
    }

    /// Blank text or an empty list. Numbers are never blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Number(_) => false,
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

/// A single submission and its decision state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: Uuid,

    /// Reference only. The process may later be edited or deleted.
    pub process_id: String,

    /// The process name as it was at submission time.
    pub process_name: String,

    pub submitted_by: String,

    pub submitted_at: Timestamp,

    pub data: RequestData,

    pub status: RequestStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<Timestamp>,

    /// Append-only audit trail.
    pub timeline: Vec<TimelineEntry>,
}

/// Where a request stands in the decision state machine.
///
/// ```text
/// Pending ──▶ Approved | Rejected | Human
/// Human   ──▶ Approved | Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    /// Needs human review.
    Human,
}

impl RequestStatus {
    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (
                Self::Pending,
                Self::Approved | Self::Rejected | Self::Human
            ) | (Self::Human, Self::Approved | Self::Rejected)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Human => "Human",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "human" => Ok(Self::Human),
            other => Err(format!("unknown request status: {other}")),
        }
    }
}

/// One event in a request's audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub id: Uuid,

    pub timestamp: Timestamp,

    #[serde(rename = "type")]
    pub kind: TimelineKind,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,

    pub status: EntryStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineKind {
    Submitted,
    AutoCheck,
    PendingApproval,
    /// Handed to a human reviewer.
    Escalated,
    Approved,
    Rejected,
}

impl TimelineKind {
    /// The request status this entry records, if it records one.
    fn status(self) -> Option<RequestStatus> {
        match self {
            Self::Approved => Some(RequestStatus::Approved),
            Self::Rejected => Some(RequestStatus::Rejected),
            Self::Escalated => Some(RequestStatus::Human),
            Self::Submitted | Self::AutoCheck | Self::PendingApproval => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Completed,
    /// The active waiting state. At most one entry holds it.
    Current,
    Pending,
}

/// A submission that does not satisfy its process form.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmissionError {
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("field '{0}' must be a number")]
    NotANumber(String),

    #[error("field '{field}' must be one of: {allowed}")]
    NotAnOption { field: String, allowed: String },

    #[error("field '{0}' must be an email address")]
    NotAnEmail(String),

    #[error("submitter must not be empty")]
    EmptySubmitter,
}

impl Request {
    /// Create a new pending request against `process`.
    ///
    /// Validates `data` against the process form and seeds the timeline with
    /// the submission, the automated check, and the open approval step.
    pub fn submit(
        process: &ProcessDefinition,
        submitted_by: &str,
        data: RequestData,
        now: Timestamp,
    ) -> Result<Self, SubmissionError> {
        if submitted_by.trim().is_empty() {
            return Err(SubmissionError::EmptySubmitter);
        }
        check_form(process, &data)?;

        let entry = |kind, title: &str, status| TimelineEntry {
            id: Uuid::new_v4(),
            timestamp: now,
            kind,
            title: title.to_string(),
            description: None,
            actor: None,
            status,
        };

        let mut submitted = entry(
            TimelineKind::Submitted,
            "Request submitted",
            EntryStatus::Completed,
        );
        submitted.actor = Some(submitted_by.to_string());
        let timeline = vec![
            submitted,
            entry(
                TimelineKind::AutoCheck,
                "Automated checks queued",
                EntryStatus::Completed,
            ),
            entry(
                TimelineKind::PendingApproval,
                "Awaiting approval",
                EntryStatus::Current,
            ),
        ];

        Ok(Self {
            id: Uuid::new_v4(),
            process_id: process.id.clone(),
            process_name: process.name.clone(),
            submitted_by: submitted_by.to_string(),
            submitted_at: now,
            data,
            status: RequestStatus::Pending,
            remarks: None,
            decided_by: None,
            decided_at: None,
            timeline,
        })
    }

    /// Close out the current entry and append `entry`.
    pub fn advance(&mut self, entry: TimelineEntry) {
        for e in &mut self.timeline {
            if e.status == EntryStatus::Current {
                e.status = EntryStatus::Completed;
            }
        }
        self.timeline.push(entry);
    }

    /// Timestamp of the latest timeline entry.
    pub fn last_event_at(&self) -> Option<Timestamp> {
        self.timeline.last().map(|e| e.timestamp)
    }

    /// The status implied by the timeline alone.
    ///
    /// Storage compares this with the stored `status` on load.
    pub fn timeline_status(&self) -> RequestStatus {
        self.timeline
            .iter()
            .rev()
            .find_map(|e| e.kind.status())
            .unwrap_or(RequestStatus::Pending)
    }
}

fn check_form(process: &ProcessDefinition, data: &RequestData) -> Result<(), SubmissionError> {
    for field in &process.fields {
        let value = data.get(&field.key).filter(|v| !v.is_blank());
        let Some(value) = value else {
            if field.required {
                return Err(SubmissionError::MissingField(field.key.clone()));
            }
            continue;
        };

        match field.kind {
            FieldKind::Number if value.as_number().is_none() => {
                return Err(SubmissionError::NotANumber(field.key.clone()));
            }
            FieldKind::Select => {
                let options = field.options.as_deref().unwrap_or_default();
                let text = value.to_text();
                if !options.iter().any(|o| *o == text) {
                    return Err(SubmissionError::NotAnOption {
                        field: field.key.clone(),
                        allowed: options.join(", "),
                    });
                }
            }
            FieldKind::Email if !value.to_text().contains('@') => {
                return Err(SubmissionError::NotAnEmail(field.key.clone()));
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::process::tests::sample_process;

    fn firewall_data() -> RequestData {
        RequestData::from([
            ("source_ip".to_string(), FieldValue::from("10.1.2.3")),
            ("port".to_string(), FieldValue::from(443)),
        ])
    }

    #[test]
    fn transitions_follow_state_machine() {
        use RequestStatus::*;

        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Pending.can_transition_to(Human));
        assert!(Human.can_transition_to(Approved));
        assert!(Human.can_transition_to(Rejected));

        assert!(!Human.can_transition_to(Human));
        assert!(!Human.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Pending.is_terminal());
        assert!(!Human.is_terminal());
        for terminal in [Approved, Rejected] {
            assert!(terminal.is_terminal());
            for next in [Pending, Approved, Rejected, Human] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("approved".parse(), Ok(RequestStatus::Approved));
        assert_eq!("HUMAN".parse(), Ok(RequestStatus::Human));
        assert!("maybe".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn field_value_deserializes_untagged() {
        let data: RequestData =
            serde_json::from_str(r#"{"port": 22, "ip": "1.2.3.4", "files": ["a", "b"]}"#).unwrap();
        assert_eq!(data["port"], FieldValue::Number(22.0));
        assert_eq!(data["ip"], FieldValue::Text("1.2.3.4".into()));
        assert_eq!(data["files"].to_text(), "a,b");
        assert_eq!(FieldValue::from(" 8080 ").as_number(), Some(8080.0));
    }

    #[test]
    fn submit_seeds_timeline() {
        let now = Timestamp::now();
        let req = Request::submit(&sample_process(), "alice", firewall_data(), now).unwrap();

        assert_eq!(req.status, RequestStatus::Pending);
        assert_eq!(req.process_name, "Firewall Change");
        let kinds: Vec<_> = req.timeline.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            [
                TimelineKind::Submitted,
                TimelineKind::AutoCheck,
                TimelineKind::PendingApproval
            ]
        );
        let current = req
            .timeline
            .iter()
            .filter(|e| e.status == EntryStatus::Current)
            .count();
        assert_eq!(current, 1);
        assert_eq!(req.timeline_status(), RequestStatus::Pending);
    }

    #[test]
    fn submit_rejects_missing_required_field() {
        let mut data = firewall_data();
        data.remove("port");
        let err = Request::submit(&sample_process(), "alice", data, Timestamp::now()).unwrap_err();
        assert_eq!(err, SubmissionError::MissingField("port".into()));
    }

    #[test]
    fn submit_rejects_blank_required_field() {
        let mut data = firewall_data();
        data.insert("source_ip".into(), FieldValue::from("   "));
        let err = Request::submit(&sample_process(), "alice", data, Timestamp::now()).unwrap_err();
        assert_eq!(err, SubmissionError::MissingField("source_ip".into()));
    }

    #[test]
    fn submit_rejects_non_numeric_number_field() {
        let mut data = firewall_data();
        data.insert("port".into(), FieldValue::from("ssh"));
        let err = Request::submit(&sample_process(), "alice", data, Timestamp::now()).unwrap_err();
        assert_eq!(err, SubmissionError::NotANumber("port".into()));
    }

    #[test]
    fn submit_rejects_unknown_select_option() {
        let mut data = firewall_data();
        data.insert("protocol".into(), FieldValue::from("ICMP"));
        let err = Request::submit(&sample_process(), "alice", data, Timestamp::now()).unwrap_err();
        assert!(matches!(err, SubmissionError::NotAnOption { .. }));
    }

    #[test]
    fn advance_keeps_single_current_entry() {
        let now = Timestamp::now();
        let mut req = Request::submit(&sample_process(), "alice", firewall_data(), now).unwrap();
        req.advance(TimelineEntry {
            id: Uuid::new_v4(),
            timestamp: now,
            kind: TimelineKind::Escalated,
            title: "Escalated".into(),
            description: None,
            actor: None,
            status: EntryStatus::Current,
        });

        let current: Vec<_> = req
            .timeline
            .iter()
            .filter(|e| e.status == EntryStatus::Current)
            .map(|e| e.kind)
            .collect();
        assert_eq!(current, [TimelineKind::Escalated]);
        assert_eq!(req.timeline_status(), RequestStatus::Human);
    }
}
