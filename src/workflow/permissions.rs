// src/workflow/permissions.rs
//
// Advisory permission derivation: given a canonical request and the current
// viewer, compute which actions the dashboard should offer. Explicit grants
// from the backend always win; the status decision table below only fills
// the gaps they leave. The upstream API re-checks everything on submit.

use crate::middleware::auth::Viewer;
use crate::upstream::models::request::{EventRequest, LegacyDecision, RequestStatus};

use super::actions::{ActionSet, AllowedAction, ALL_ACTIONS};

/// Derive the set of actions currently permitted on `request` for `viewer`.
pub fn derive_actions(request: &EventRequest, viewer: &Viewer) -> ActionSet {
    // An explicit allowedActions array is authoritative for the whole
    // request; no inference happens at all. Backend data is trusted even if
    // it looks inconsistent with the status.
    if let Some(list) = request.grants.actions.as_ref() {
        let mut set = ActionSet::new();
        for raw in list {
            set.insert_raw(raw);
        }
        for action in ALL_ACTIONS {
            if flag_for(request, action) == Some(true) {
                set.insert(action);
            }
        }
        return set;
    }

    let inferred = infer_from_status(request, viewer);

    let mut set = ActionSet::new();
    for action in ALL_ACTIONS {
        match flag_for(request, action) {
            Some(true) => set.insert(action),
            Some(false) => {} // explicit denial beats inference
            None => {
                if inferred.contains(action) {
                    set.insert(action);
                }
            }
        }
    }
    set
}

fn flag_for(request: &EventRequest, action: AllowedAction) -> Option<bool> {
    let grants = &request.grants;
    match action {
        AllowedAction::View => grants.can_view,
        AllowedAction::Accept => grants.can_accept,
        AllowedAction::Reject => grants.can_reject,
        AllowedAction::Reschedule => grants.can_reschedule,
        AllowedAction::Confirm => grants.can_confirm,
        AllowedAction::Decline => grants.can_decline,
        AllowedAction::Cancel => grants.can_cancel,
        AllowedAction::Delete => grants.can_delete,
        AllowedAction::ManageStaff => grants.can_manage_staff,
    }
}

/// Status-based fallback, the decision table from the review workflow.
/// Inference never grants `reschedule` on an edit request.
fn infer_from_status(request: &EventRequest, viewer: &Viewer) -> ActionSet {
    let mut set = ActionSet::new();

    match &request.status {
        RequestStatus::PendingStakeholderReview => {
            // Only the referenced stakeholder reviews at this stage.
            if viewer.matches_id(request.stakeholder_id.as_deref()) {
                set.insert(AllowedAction::Accept);
                set.insert(AllowedAction::Reject);
            }
        }
        RequestStatus::PendingCoordinatorReview => {
            if viewer.matches_id(request.coordinator_id.as_deref()) || viewer.is_system_admin {
                set.insert(AllowedAction::Accept);
                set.insert(AllowedAction::Reject);
                set.insert(AllowedAction::Reschedule);
            }
        }
        RequestStatus::PendingAdminReview => {
            if viewer.has_admin_role() || viewer.is_coordinator_role() {
                set.insert(AllowedAction::Accept);
                set.insert(AllowedAction::Reject);
                set.insert(AllowedAction::Reschedule);
            }
        }
        RequestStatus::RescheduledByAdmin | RequestStatus::RescheduledByCoordinator => {
            reschedule_acknowledgement(request, viewer, &mut set);
        }
        RequestStatus::RescheduledByStakeholder => {
            // The stakeholder proposed a new date; the reviewing side decides.
            if viewer.has_admin_role() || viewer.is_coordinator_role() {
                set.insert(AllowedAction::Accept);
                set.insert(AllowedAction::Reject);
            }
        }
        RequestStatus::Approved | RequestStatus::Rejected => {}
        RequestStatus::Cancelled => {
            // Hard delete is admin-only and only from the cancelled state.
            if viewer.has_admin_role() {
                set.insert(AllowedAction::Delete);
            }
        }
        RequestStatus::Unknown(_) => {
            // Legacy records: fall back to the free-text action fields.
            if request.admin_decision() == Some(LegacyDecision::Rescheduled) {
                reschedule_acknowledgement(request, viewer, &mut set);
            } else if request.admin_action.is_none() && viewer.has_admin_role() {
                set.insert(AllowedAction::Accept);
                set.insert(AllowedAction::Reject);
                set.insert(AllowedAction::Reschedule);
            }
        }
    }

    if request.is_edit {
        set.remove(AllowedAction::Reschedule);
    }
    set
}

/// A reschedule is on the table: the owning stakeholder confirms or declines
/// the new date, admins and coordinators can still accept or reject outright.
fn reschedule_acknowledgement(request: &EventRequest, viewer: &Viewer, set: &mut ActionSet) {
    let stakeholder_responded = request.stakeholder_decision().is_some();
    if viewer.matches_id(request.stakeholder_id.as_deref()) && !stakeholder_responded {
        set.insert(AllowedAction::Confirm);
        set.insert(AllowedAction::Decline);
    }
    if viewer.has_admin_role() || viewer.is_coordinator_role() {
        set.insert(AllowedAction::Accept);
        set.insert(AllowedAction::Reject);
    }
}
