// src/workflow/status.rs
//
// Display-label derivation. Deliberately lossy: this feeds badge coloring
// and the pending-stage sublabel, never authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::upstream::models::request::{EventRequest, LegacyDecision, RequestStatus};

/// Fixed display vocabulary for status badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum StatusLabel {
    Approved,
    Pending,
    Rejected,
    Cancelled,
}

impl StatusLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::Pending => "Pending",
            Self::Rejected => "Rejected",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// Map a request's raw status/action fields to one badge label.
///
/// The concatenation order (event status, request status, admin action,
/// coordinator final action) and the substring test order are both load
/// bearing: "reject" is checked before "approve" so a value like
/// "Reschedule rejected, approval withdrawn" reads as rejected.
pub fn derive_label(request: &EventRequest) -> StatusLabel {
    let joined = [
        request.event.status.as_deref(),
        request.raw_status.as_deref(),
        request.admin_action.as_deref(),
        request.coordinator_final_action.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase();

    if joined.contains("reject") {
        StatusLabel::Rejected
    } else if joined.contains("approve") || joined.contains("complete") {
        StatusLabel::Approved
    } else if joined.contains("pending") || joined.contains("waiting") || joined.contains("awaiting") {
        StatusLabel::Pending
    } else if joined.contains("cancel") {
        StatusLabel::Cancelled
    } else {
        StatusLabel::Pending
    }
}

/// Human-readable sublabel for requests still in flight, shown under the
/// Pending badge. Uses the new workflow statuses when recognized, otherwise
/// falls back to the legacy action fields.
pub fn pending_stage(request: &EventRequest) -> Option<String> {
    match &request.status {
        RequestStatus::PendingStakeholderReview => {
            return Some("Waiting for stakeholder review".into())
        }
        RequestStatus::PendingCoordinatorReview => {
            return Some("Waiting for coordinator review".into())
        }
        RequestStatus::PendingAdminReview => return Some("Waiting for admin review".into()),
        RequestStatus::RescheduledByAdmin | RequestStatus::RescheduledByCoordinator => {
            return Some("Rescheduled, waiting for stakeholder confirmation".into())
        }
        RequestStatus::RescheduledByStakeholder => {
            return Some("New date proposed, waiting for review".into())
        }
        RequestStatus::Approved | RequestStatus::Rejected | RequestStatus::Cancelled => return None,
        RequestStatus::Unknown(_) => {}
    }

    // Legacy records: reconstruct the stage from whichever fields exist.
    match request.admin_decision() {
        Some(LegacyDecision::Rescheduled) => {
            if request.stakeholder_decision().is_none() && request.stakeholder_id.is_some() {
                Some("Rescheduled, waiting for stakeholder confirmation".into())
            } else {
                None
            }
        }
        Some(_) => None,
        None => {
            if request.stakeholder_id.is_none() {
                Some("Waiting for stakeholder assignment".into())
            } else if request.stakeholder_decision().is_none() {
                Some("Waiting for stakeholder review".into())
            } else {
                Some("Waiting for admin review".into())
            }
        }
    }
}
