// src/upstream/models/request.rs
use serde::{Deserialize, Serialize, Serializer};
use utoipa::ToSchema;

use super::event::EventSummary;

/// Workflow status of an event request as reported by the Unite API.
///
/// The wire value is a free-form string; everything we do not recognize is
/// preserved in `Unknown` so legacy records keep round-tripping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(from = "String")]
pub enum RequestStatus {
    PendingStakeholderReview,
    PendingCoordinatorReview,
    PendingAdminReview,
    RescheduledByAdmin,
    RescheduledByCoordinator,
    RescheduledByStakeholder,
    Approved,
    Rejected,
    Cancelled,
    Unknown(String),
}

impl RequestStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "pending_stakeholder_review" => Self::PendingStakeholderReview,
            "pending_coordinator_review" => Self::PendingCoordinatorReview,
            "pending_admin_review" => Self::PendingAdminReview,
            "rescheduled_by_admin" => Self::RescheduledByAdmin,
            "rescheduled_by_coordinator" => Self::RescheduledByCoordinator,
            "rescheduled_by_stakeholder" => Self::RescheduledByStakeholder,
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Unknown(raw.trim().to_string()),
        }
    }

    /// Canonical wire spelling (new-workflow casing).
    pub fn as_str(&self) -> &str {
        match self {
            Self::PendingStakeholderReview => "Pending_Stakeholder_Review",
            Self::PendingCoordinatorReview => "Pending_Coordinator_Review",
            Self::PendingAdminReview => "Pending_Admin_Review",
            Self::RescheduledByAdmin => "Rescheduled_By_Admin",
            Self::RescheduledByCoordinator => "Rescheduled_By_Coordinator",
            Self::RescheduledByStakeholder => "Rescheduled_By_Stakeholder",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Cancelled => "Cancelled",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Cancelled)
    }

    pub fn is_rescheduled(&self) -> bool {
        matches!(
            self,
            Self::RescheduledByAdmin | Self::RescheduledByCoordinator | Self::RescheduledByStakeholder
        )
    }
}

impl From<String> for RequestStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl Serialize for RequestStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Decision recorded in one of the legacy free-text action fields
/// (`AdminAction`, `StakeholderFinalAction`, `CoordinatorFinalAction`).
///
/// The lowercase substring is the only reliable signal in those fields, so
/// parsing is substring-based on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LegacyDecision {
    Accepted,
    Rejected,
    Rescheduled,
    Cancelled,
}

impl LegacyDecision {
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_lowercase();
        if lowered.is_empty() {
            return None;
        }
        if lowered.contains("resched") {
            Some(Self::Rescheduled)
        } else if lowered.contains("accept") || lowered.contains("approve") {
            Some(Self::Accepted)
        } else if lowered.contains("reject") || lowered.contains("decline") {
            Some(Self::Rejected)
        } else if lowered.contains("cancel") {
            Some(Self::Cancelled)
        } else {
            None
        }
    }
}

/// Explicit permission grants shipped on a request by the backend.
///
/// When any of these are present they are authoritative; status inference
/// only fills the gaps they leave (see `workflow::permissions`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ExplicitGrants {
    /// Raw `allowedActions` array, if the backend sent one.
    pub actions: Option<Vec<String>>,
    pub can_view: Option<bool>,
    pub can_accept: Option<bool>,
    pub can_reject: Option<bool>,
    pub can_reschedule: Option<bool>,
    pub can_confirm: Option<bool>,
    pub can_decline: Option<bool>,
    /// `canAdminAction` on the wire, which in practice gates cancel.
    pub can_cancel: Option<bool>,
    pub can_delete: Option<bool>,
    pub can_manage_staff: Option<bool>,
}

impl ExplicitGrants {
    pub fn is_empty(&self) -> bool {
        self.actions.is_none()
            && self.can_view.is_none()
            && self.can_accept.is_none()
            && self.can_reject.is_none()
            && self.can_reschedule.is_none()
            && self.can_confirm.is_none()
            && self.can_decline.is_none()
            && self.can_cancel.is_none()
            && self.can_delete.is_none()
            && self.can_manage_staff.is_none()
    }
}

/// Canonical event request, produced only by `upstream::normalize`.
///
/// Downstream code (permissions, labels, dispatch, detail composition) reads
/// this shape and never probes raw JSON again.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventRequest {
    pub id: String,
    pub status: RequestStatus,
    /// Raw status string as received, kept for label derivation.
    pub raw_status: Option<String>,
    pub admin_action: Option<String>,
    pub stakeholder_final_action: Option<String>,
    pub coordinator_final_action: Option<String>,
    pub coordinator_id: Option<String>,
    pub stakeholder_id: Option<String>,
    /// True when the request carries a non-empty `originalData` payload,
    /// meaning it edits an existing event rather than creating one.
    pub is_edit: bool,
    #[serde(skip)]
    pub grants: ExplicitGrants,
    pub event: EventSummary,
}

impl EventRequest {
    pub fn admin_decision(&self) -> Option<LegacyDecision> {
        self.admin_action.as_deref().and_then(LegacyDecision::parse)
    }

    pub fn stakeholder_decision(&self) -> Option<LegacyDecision> {
        self.stakeholder_final_action
            .as_deref()
            .and_then(LegacyDecision::parse)
    }

    pub fn coordinator_decision(&self) -> Option<LegacyDecision> {
        self.coordinator_final_action
            .as_deref()
            .and_then(LegacyDecision::parse)
    }

    /// Whether an admin has recorded any decision yet, via either the new
    /// workflow status or the legacy free-text field.
    pub fn has_admin_decision(&self) -> bool {
        self.admin_decision().is_some()
            || matches!(
                self.status,
                RequestStatus::Approved
                    | RequestStatus::Rejected
                    | RequestStatus::RescheduledByAdmin
            )
    }
}
