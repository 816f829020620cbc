//! Decision recorder: applies a decision to a request's persisted state.
//!
//! A decision moves a request along the state machine, appends a timeline
//! entry, and publishes the change. The write is conditional on the status
//! the recorder observed, so of two racing decisions at most one applies.

use jiff::Timestamp;
use uuid::Uuid;

use crate::model::{EntryStatus, Request, RequestStatus, TimelineEntry, TimelineKind};
use crate::notify::{self, Notifier};
use crate::storage::{RequestStore, StatusUpdate, StorageError};

/// A decision as submitted by a person or the agent.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionInput {
    pub request_id: Uuid,
    pub status: RequestStatus,
    pub remarks: Option<String>,
    pub decided_by: Option<String>,
    /// Defaults to now.
    pub decided_at: Option<Timestamp>,
}

#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    #[error("invalid decision: {0}")]
    Validation(String),

    #[error("request not found: {0}")]
    NotFound(Uuid),

    #[error("invalid transition for request {id}: {from} -> {to}")]
    InvalidTransition {
        id: Uuid,
        from: RequestStatus,
        to: RequestStatus,
    },

    /// Another decision was applied between read and write.
    #[error("request {id} changed concurrently: expected {expected}, found {actual}")]
    Conflict {
        id: Uuid,
        expected: RequestStatus,
        actual: RequestStatus,
    },

    #[error(transparent)]
    Storage(StorageError),
}

impl DecisionError {
    /// Whether the caller should re-fetch the request before deciding again.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. } | Self::Conflict { .. })
    }
}

impl From<StorageError> for DecisionError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::RequestNotFound(id) => Self::NotFound(id),
            StorageError::Conflict {
                id,
                expected,
                actual,
            } => Self::Conflict {
                id,
                expected,
                actual,
            },
            other => Self::Storage(other),
        }
    }
}

/// Apply `input` to its request and return the updated request.
///
/// Success is reported only once the conditional write has landed. The
/// status-change notification is published afterwards; its failure is
/// logged and does not affect the result.
pub fn record<S>(
    store: &S,
    notifier: &dyn Notifier,
    input: &DecisionInput,
) -> Result<Request, DecisionError>
where
    S: RequestStore + ?Sized,
{
    if input.status == RequestStatus::Pending {
        return Err(DecisionError::Validation(
            "status must be one of Approved, Rejected, Human".to_string(),
        ));
    }

    let mut request = store.get_request(input.request_id)?;
    let observed = request.status;
    if !observed.can_transition_to(input.status) {
        return Err(DecisionError::InvalidTransition {
            id: request.id,
            from: observed,
            to: input.status,
        });
    }

    // The timeline never goes backwards in time.
    let last = request.last_event_at().unwrap_or(request.submitted_at);
    let decided_at = match input.decided_at {
        Some(at) if at < last => {
            return Err(DecisionError::Validation(format!(
                "decidedAt {at} precedes the latest timeline entry ({last})"
            )));
        }
        Some(at) => at,
        None => Timestamp::now().max(last),
    };

    request.advance(timeline_entry(input, decided_at));
    request.status = input.status;
    request.remarks.clone_from(&input.remarks);
    request.decided_by.clone_from(&input.decided_by);
    request.decided_at = Some(decided_at);

    let update = StatusUpdate {
        status: request.status,
        remarks: request.remarks.clone(),
        decided_by: request.decided_by.clone(),
        decided_at,
        timeline: request.timeline.clone(),
    };
    store.conditional_update_status(request.id, observed, &update)?;

    tracing::info!(
        request_id = %request.id,
        from = %observed,
        to = %request.status,
        decided_by = request.decided_by.as_deref().unwrap_or("-"),
        "decision recorded"
    );
    notify::publish_quietly(notifier, request.id, request.status);

    Ok(request)
}

fn timeline_entry(input: &DecisionInput, at: Timestamp) -> TimelineEntry {
    let (kind, title, status) = match input.status {
        RequestStatus::Approved => (
            TimelineKind::Approved,
            "Request approved",
            EntryStatus::Completed,
        ),
        RequestStatus::Rejected => (
            TimelineKind::Rejected,
            "Request rejected",
            EntryStatus::Completed,
        ),
        // Pending is rejected before we get here.
        RequestStatus::Human | RequestStatus::Pending => (
            TimelineKind::Escalated,
            "Escalated for human review",
            EntryStatus::Current,
        ),
    };
    TimelineEntry {
        id: Uuid::new_v4(),
        timestamp: at,
        kind,
        title: title.to_string(),
        description: input.remarks.clone(),
        actor: input.decided_by.clone(),
        status,
    }
}
