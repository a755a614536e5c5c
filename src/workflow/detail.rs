// src/workflow/detail.rs
use serde::Serialize;
use utoipa::ToSchema;

use crate::upstream::models::event::EventCategory;
use crate::upstream::models::request::{EventRequest, LegacyDecision, RequestStatus};

/// Which narrative block the request detail screen should render.
///
/// Exactly one block is selected, in a fixed priority order: a stakeholder
/// reschedule outranks an admin reschedule, which outranks an edit, then
/// rejection, then cancellation, and everything else falls through to the
/// full creation detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DetailView {
    StakeholderRescheduled,
    AdminRescheduled,
    Edited,
    Rejected,
    Cancelled,
    CreationDetail,
}

impl DetailView {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StakeholderRescheduled => "stakeholder-rescheduled",
            Self::AdminRescheduled => "admin-rescheduled",
            Self::Edited => "edited",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::CreationDetail => "creation-detail",
        }
    }
}

pub fn select_view(request: &EventRequest) -> DetailView {
    if request.stakeholder_decision() == Some(LegacyDecision::Rescheduled)
        || request.status == RequestStatus::RescheduledByStakeholder
    {
        return DetailView::StakeholderRescheduled;
    }
    if request.admin_decision() == Some(LegacyDecision::Rescheduled)
        || request.status.is_rescheduled()
    {
        return DetailView::AdminRescheduled;
    }
    if request.is_edit {
        return DetailView::Edited;
    }
    if request.status == RequestStatus::Rejected
        || request.admin_decision() == Some(LegacyDecision::Rejected)
        || request.coordinator_decision() == Some(LegacyDecision::Rejected)
    {
        return DetailView::Rejected;
    }
    if request.status == RequestStatus::Cancelled
        || request.admin_decision() == Some(LegacyDecision::Cancelled)
    {
        return DetailView::Cancelled;
    }
    DetailView::CreationDetail
}

/// Category-specific figures surfaced by the creation-detail block. The
/// probing for these values happens once, in `upstream::normalize`; this
/// only picks which one matters for the category.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDetail {
    pub category: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_donations: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_audience: Option<i64>,
}

pub fn category_detail(request: &EventRequest) -> Option<CategoryDetail> {
    let event = &request.event;
    match event.category.as_ref()? {
        EventCategory::BloodDrive => Some(CategoryDetail {
            category: "blood",
            target_donations: event.target_donations,
            max_participants: None,
            expected_audience: None,
        }),
        EventCategory::Training => Some(CategoryDetail {
            category: "training",
            target_donations: None,
            max_participants: event.max_participants,
            expected_audience: None,
        }),
        EventCategory::Advocacy => Some(CategoryDetail {
            category: "advocacy",
            target_donations: None,
            max_participants: None,
            expected_audience: event.expected_audience,
        }),
        EventCategory::Other(_) => None,
    }
}
