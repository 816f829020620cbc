//! Status-change notifications.
//!
//! Publishing is fire-and-forget from the caller's point of view: a failed
//! publish is logged and never fails the decision that triggered it.
//! Delivery is at-least-once; consumers de-duplicate by `(request, status)`.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::RequestStatus;

/// A published status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub request_id: Uuid,
    pub status: RequestStatus,
    pub published_at: Timestamp,
}

#[derive(Debug, thiserror::Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// A channel that informs submitters and approvers of status changes.
pub trait Notifier {
    fn publish(&self, request_id: Uuid, status: RequestStatus) -> Result<(), NotifyError>;
}

/// Publishes to the log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn publish(&self, request_id: Uuid, status: RequestStatus) -> Result<(), NotifyError> {
        tracing::info!(%request_id, %status, "request status changed");
        Ok(())
    }
}

/// Publish, logging instead of propagating failure.
pub fn publish_quietly(notifier: &dyn Notifier, request_id: Uuid, status: RequestStatus) {
    if let Err(e) = notifier.publish(request_id, status) {
        tracing::warn!(%request_id, %status, "{e}");
    }
}
