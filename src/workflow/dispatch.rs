// src/workflow/dispatch.rs
//
// Mutating-action dispatch against the upstream Unite API. The awkward part
// is the timeout policy: our client timeout is shorter than the backend's
// worst-case processing, so a timed-out POST may still have succeeded
// server-side. Instead of surfacing the timeout immediately, the dispatcher
// polls the request until the expected terminal state shows up, and only
// fails after the poll budget is spent. The phases are modeled explicitly:
// Sent -> TimedOut -> Verifying -> Confirmed | Failed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::middleware::auth::Viewer;
use crate::upstream::cache::{ResponseCache, REQUEST_LIST_PATTERNS};
use crate::upstream::client::{UpstreamClient, UpstreamError};
use crate::upstream::models::request::{EventRequest, LegacyDecision, RequestStatus};

use super::dialog::DialogKind;
use super::refresh::{RefreshBus, RefreshReason};
use super::status::{derive_label, StatusLabel};

pub const REQUEST_LIST_PATH: &str = "/api/event-requests";

/// A mutating operation on one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestAction {
    Accept,
    Reject,
    Reschedule,
    Confirm,
    Decline,
    Cancel,
    Delete,
}

impl RequestAction {
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_lowercase();
        if lowered.starts_with("resched") {
            return Some(Self::Reschedule);
        }
        match lowered.as_str() {
            "accept" | "approve" => Some(Self::Accept),
            "reject" => Some(Self::Reject),
            "confirm" => Some(Self::Confirm),
            "decline" => Some(Self::Decline),
            "cancel" => Some(Self::Cancel),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Reschedule => "reschedule",
            Self::Confirm => "confirm",
            Self::Decline => "decline",
            Self::Cancel => "cancel",
            Self::Delete => "delete",
        }
    }

    /// Reject and Cancel must explain themselves.
    pub fn requires_note(&self) -> bool {
        matches!(self, Self::Reject | Self::Cancel)
    }

    /// The upstream validator rejects a note field on these, so the payload
    /// must not carry one at all.
    pub fn forbids_note(&self) -> bool {
        matches!(self, Self::Accept | Self::Confirm | Self::Delete)
    }

    pub fn dialog_kind(&self) -> DialogKind {
        match self {
            Self::Accept => DialogKind::Accept,
            Self::Reject => DialogKind::Reject,
            Self::Reschedule => DialogKind::Reschedule,
            Self::Confirm => DialogKind::Confirm,
            Self::Decline => DialogKind::Decline,
            Self::Cancel => DialogKind::Cancel,
            Self::Delete => DialogKind::Delete,
        }
    }
}

/// Validated submission payload.
#[derive(Debug, Clone)]
pub struct ActionSubmission {
    pub action: RequestAction,
    pub note: Option<String>,
    pub rescheduled_date: Option<DateTime<Utc>>,
}

impl ActionSubmission {
    pub fn validate(&self) -> Result<(), UpstreamError> {
        if self.action.requires_note()
            && self.note.as_deref().map(str::trim).unwrap_or("").is_empty()
        {
            return Err(UpstreamError::Validation(format!(
                "A note is required to {} a request",
                self.action.wire_name()
            )));
        }
        if self.action == RequestAction::Reschedule && self.rescheduled_date.is_none() {
            return Err(UpstreamError::Validation(
                "A new date is required to reschedule a request".into(),
            ));
        }
        Ok(())
    }

    fn payload(&self) -> Value {
        let mut body = json!({ "action": self.action.wire_name() });
        if !self.action.forbids_note() {
            if let Some(note) = self.note.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
                body["note"] = json!(note);
            }
        }
        if let Some(date) = self.rescheduled_date {
            body["rescheduledDate"] = json!(date.to_rfc3339());
        }
        body
    }
}

/// Phases of one dispatch, made explicit so "did the timed-out call actually
/// succeed" is a state rather than a nest of catches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case", tag = "phase")]
pub enum DispatchPhase {
    Sent,
    TimedOut,
    Verifying { attempt: u32 },
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    pub request_id: String,
    pub action: RequestAction,
    /// True when the POST timed out but polling confirmed the new state.
    pub recovered: bool,
    /// True when the request was already in the expected terminal state and
    /// no network call was made at all.
    pub short_circuited: bool,
}

/// Runs mutations and reconciles local state afterwards: cache invalidation,
/// a warm list re-fetch, and the double refresh broadcast.
#[derive(Clone)]
pub struct Dispatcher {
    upstream: Arc<UpstreamClient>,
    cache: Arc<ResponseCache>,
    refresh: Arc<RefreshBus>,
}

impl Dispatcher {
    pub fn new(
        upstream: Arc<UpstreamClient>,
        cache: Arc<ResponseCache>,
        refresh: Arc<RefreshBus>,
    ) -> Self {
        Self {
            upstream,
            cache,
            refresh,
        }
    }

    pub async fn submit(
        &self,
        viewer: &Viewer,
        token: &str,
        request: &EventRequest,
        submission: ActionSubmission,
    ) -> Result<DispatchOutcome, UpstreamError> {
        submission.validate()?;
        let dispatch_id = uuid::Uuid::new_v4();
        tracing::info!(
            %dispatch_id,
            request_id = %request.id,
            action = submission.action.wire_name(),
            "dispatching request action"
        );

        // Already in the expected terminal state: synthesize success without
        // touching the network, so a double click cannot double-submit.
        if short_circuits(submission.action) && expectation_met(submission.action, request) {
            tracing::info!(
                request_id = %request.id,
                action = submission.action.wire_name(),
                "request already in target state, skipping dispatch"
            );
            return Ok(DispatchOutcome {
                request_id: request.id.clone(),
                action: submission.action,
                recovered: false,
                short_circuited: true,
            });
        }

        let mut phase = DispatchPhase::Sent;
        let sent = match submission.action {
            RequestAction::Delete => self
                .upstream
                .delete_json(&format!("/api/event-requests/{}", request.id), Some(token))
                .await
                .map(|_| ()),
            _ => self.post_action(viewer, token, request, &submission).await,
        };

        let mut recovered = false;
        match sent {
            Ok(()) => advance(&mut phase, DispatchPhase::Confirmed, &request.id),
            Err(UpstreamError::Timeout) => {
                advance(&mut phase, DispatchPhase::TimedOut, &request.id);
                if self.verify_outcome(token, request, submission.action, &mut phase).await {
                    advance(&mut phase, DispatchPhase::Confirmed, &request.id);
                    recovered = true;
                } else {
                    advance(&mut phase, DispatchPhase::Failed, &request.id);
                }
            }
            Err(other) => return Err(other),
        }

        match phase {
            DispatchPhase::Confirmed => {
                self.reconcile(token).await;
                Ok(DispatchOutcome {
                    request_id: request.id.clone(),
                    action: submission.action,
                    recovered,
                    short_circuited: false,
                })
            }
            // All polls failed to observe the expected state: surface the
            // original timeout.
            _ => Err(UpstreamError::Timeout),
        }
    }

    async fn post_action(
        &self,
        viewer: &Viewer,
        token: &str,
        request: &EventRequest,
        submission: &ActionSubmission,
    ) -> Result<(), UpstreamError> {
        let payload = submission.payload();
        let path = format!("/api/event-requests/{}/actions", request.id);
        match self.upstream.post_json(&path, Some(token), &payload).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => {
                // Older deployments only expose the per-role action alias.
                let legacy = format!(
                    "/api/event-requests/{}/{}",
                    request.id,
                    role_action_suffix(viewer)
                );
                self.upstream
                    .post_json(&legacy, Some(token), &payload)
                    .await
                    .map(|_| ())
            }
            Err(err) => Err(err),
        }
    }

    /// Poll the request until the expected state shows up or the attempt
    /// budget runs out.
    async fn verify_outcome(
        &self,
        token: &str,
        request: &EventRequest,
        action: RequestAction,
        phase: &mut DispatchPhase,
    ) -> bool {
        let opts = self.upstream.options().clone();
        for attempt in 1..=opts.verify_poll_attempts {
            tokio::time::sleep(opts.verify_poll_interval).await;
            advance(phase, DispatchPhase::Verifying { attempt }, &request.id);
            match self.upstream.fetch_request(Some(token), &request.id).await {
                Ok(current) => {
                    if expectation_met(action, &current) {
                        tracing::info!(
                            request_id = %request.id,
                            attempt,
                            "timed out action confirmed by poll"
                        );
                        return true;
                    }
                }
                // A deleted request stops existing; for delete that IS success.
                Err(err) if err.is_not_found() && action == RequestAction::Delete => return true,
                Err(err) => {
                    tracing::debug!(request_id = %request.id, attempt, error = %err, "verify poll failed");
                }
            }
        }
        false
    }

    /// Post-success reconciliation: never patch locally, always invalidate
    /// and re-fetch, then nudge the views twice.
    async fn reconcile(&self, token: &str) {
        self.cache.invalidate_matching(REQUEST_LIST_PATTERNS);

        let ticket = self.cache.begin_fetch();
        match self.upstream.get_json(REQUEST_LIST_PATH, Some(token)).await {
            Ok(body) => {
                self.cache.store(ticket, REQUEST_LIST_PATH, body);
            }
            Err(err) => {
                tracing::warn!(error = %err, "post-action list re-fetch failed");
            }
        }

        let refresh = self.refresh.clone();
        tokio::spawn(async move {
            refresh.nudge_after_mutation(RefreshReason::ActionCompleted).await;
        });
    }
}

fn advance(phase: &mut DispatchPhase, next: DispatchPhase, request_id: &str) {
    tracing::debug!(request_id, from = ?*phase, to = ?next, "dispatch phase");
    *phase = next;
}

/// Role-based endpoint suffix for the legacy per-role action routes.
pub fn role_action_suffix(viewer: &Viewer) -> &'static str {
    if viewer.is_system_admin {
        "admin-action"
    } else if viewer.is_coordinator_role() {
        "coordinator-action"
    } else if viewer.is_stakeholder_role() {
        "stakeholder-action"
    } else {
        "admin-action"
    }
}

fn short_circuits(action: RequestAction) -> bool {
    matches!(
        action,
        RequestAction::Accept | RequestAction::Confirm | RequestAction::Reject | RequestAction::Cancel
    )
}

/// Whether the request already shows the state this action drives toward.
pub fn expectation_met(action: RequestAction, request: &EventRequest) -> bool {
    match action {
        RequestAction::Accept | RequestAction::Confirm => {
            request.status == RequestStatus::Approved || derive_label(request) == StatusLabel::Approved
        }
        RequestAction::Reject => {
            request.status == RequestStatus::Rejected || derive_label(request) == StatusLabel::Rejected
        }
        RequestAction::Cancel | RequestAction::Delete => {
            request.status == RequestStatus::Cancelled
                || derive_label(request) == StatusLabel::Cancelled
        }
        RequestAction::Reschedule => {
            request.status.is_rescheduled()
                || request.admin_decision() == Some(LegacyDecision::Rescheduled)
                || request.coordinator_decision() == Some(LegacyDecision::Rescheduled)
        }
        RequestAction::Decline => request.stakeholder_decision() == Some(LegacyDecision::Rejected),
    }
}
