//! Shared test harness: a stub Unite API the gateway talks to, plus a
//! helper that boots the gateway itself on an ephemeral port.

#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use unite_gateway::app_state::AppState;
use unite_gateway::build_router;
use unite_gateway::upstream::client::UpstreamOptions;

/// In-memory stand-in for the upstream Unite API.
///
/// Action handling applies the status effect *before* its artificial delay,
/// so a gateway that gives up waiting still leaves a completed mutation
/// behind, exactly the situation the timeout-recovery poll exists for.
pub struct StubUpstream {
    pub requests: Mutex<HashMap<String, Value>>,
    pub action_hits: AtomicUsize,
    pub detail_hits: AtomicUsize,
    pub action_delay: Mutex<Duration>,
    pub apply_action_effect: AtomicBool,
}

impl Default for StubUpstream {
    fn default() -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
            action_hits: AtomicUsize::new(0),
            detail_hits: AtomicUsize::new(0),
            action_delay: Mutex::new(Duration::ZERO),
            apply_action_effect: AtomicBool::new(true),
        }
    }
}

impl StubUpstream {
    pub fn with_request(raw: Value) -> Arc<Self> {
        let stub = Arc::new(Self::default());
        stub.insert_request(raw);
        stub
    }

    pub fn insert_request(&self, raw: Value) {
        let id = raw
            .get("_id")
            .or_else(|| raw.get("Request_ID"))
            .and_then(Value::as_str)
            .expect("stub requests need an _id or Request_ID")
            .to_string();
        self.requests.lock().unwrap().insert(id, raw);
    }

    pub fn set_action_delay(&self, delay: Duration) {
        *self.action_delay.lock().unwrap() = delay;
    }

    pub fn disable_action_effect(&self) {
        self.apply_action_effect.store(false, Ordering::SeqCst);
    }

    pub fn status_of(&self, id: &str) -> Option<String> {
        self.requests
            .lock()
            .unwrap()
            .get(id)
            .and_then(|r| r.get("Status"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

async fn list_requests(State(stub): State<Arc<StubUpstream>>) -> Json<Value> {
    let requests = stub.requests.lock().unwrap();
    let items: Vec<Value> = requests.values().cloned().collect();
    Json(json!({
        "data": items,
        "statusCounts": {"Pending": items.len()},
        "total": items.len(),
    }))
}

async fn get_request(
    State(stub): State<Arc<StubUpstream>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    stub.detail_hits.fetch_add(1, Ordering::SeqCst);
    match stub.requests.lock().unwrap().get(&id) {
        Some(raw) => Ok(Json(raw.clone())),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Request not found"})),
        )),
    }
}

async fn post_action(
    State(stub): State<Arc<StubUpstream>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    stub.action_hits.fetch_add(1, Ordering::SeqCst);

    let action = body.get("action").and_then(Value::as_str).unwrap_or_default();
    if stub.apply_action_effect.load(Ordering::SeqCst) {
        let new_status = match action {
            "accept" | "confirm" => Some("Approved"),
            "reject" | "decline" => Some("Rejected"),
            "cancel" => Some("Cancelled"),
            "reschedule" => Some("Rescheduled_By_Admin"),
            _ => None,
        };
        if let Some(status) = new_status {
            if let Some(raw) = stub.requests.lock().unwrap().get_mut(&id) {
                raw["Status"] = json!(status);
            }
        }
    }

    // Delay AFTER the effect: a slow backend that already committed.
    let delay = *stub.action_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    Ok(Json(json!({"success": true})))
}

async fn delete_request(
    State(stub): State<Arc<StubUpstream>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match stub.requests.lock().unwrap().remove(&id) {
        Some(_) => Ok(Json(json!({"success": true}))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Request not found"})),
        )),
    }
}

async fn empty_list() -> Json<Value> {
    Json(json!({"data": []}))
}

pub async fn spawn_stub(stub: Arc<StubUpstream>) -> String {
    let app = Router::new()
        .route("/api/event-requests", get(list_requests))
        .route(
            "/api/event-requests/{id}",
            get(get_request).delete(delete_request),
        )
        .route("/api/event-requests/{id}/actions", axum::routing::post(post_action))
        .route("/api/public/events", get(empty_list))
        .route("/api/stakeholders", get(empty_list))
        .route("/api/coordinators", get(empty_list))
        .route("/api/districts", get(empty_list))
        .route("/api/notifications", get(empty_list))
        .with_state(stub);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Boot the gateway against `upstream_base` with test-friendly timings.
pub async fn spawn_gateway(upstream_base: &str) -> String {
    spawn_gateway_with(
        upstream_base,
        Duration::from_secs(5),
        Duration::from_millis(50),
        3,
    )
    .await
}

pub async fn spawn_gateway_with(
    upstream_base: &str,
    timeout: Duration,
    poll_interval: Duration,
    poll_attempts: u32,
) -> String {
    let opts = UpstreamOptions {
        base_url: upstream_base.to_string(),
        timeout,
        verify_poll_attempts: poll_attempts,
        verify_poll_interval: poll_interval,
    };
    let state = AppState::new(
        opts,
        Duration::from_secs(60),
        Duration::from_millis(50),
        Duration::from_secs(60),
    );
    let app = build_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn profile(id: &str, role: &str) -> String {
    json!({"id": id, "role": role}).to_string()
}

/// GET helper with auth and an optional viewer profile header.
pub async fn get_json(base: &str, path: &str, viewer: Option<&str>) -> (StatusCode, Value) {
    let mut req = reqwest::Client::new()
        .get(format!("{base}{path}"))
        .header("Authorization", "Bearer test-token");
    if let Some(profile) = viewer {
        req = req.header("x-unite-user", profile);
    }
    let response = req.send().await.unwrap();
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

pub async fn post_json(
    base: &str,
    path: &str,
    viewer: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    let mut req = reqwest::Client::new()
        .post(format!("{base}{path}"))
        .header("Authorization", "Bearer test-token")
        .json(&body);
    if let Some(profile) = viewer {
        req = req.header("x-unite-user", profile);
    }
    let response = req.send().await.unwrap();
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

pub async fn delete_json(base: &str, path: &str, viewer: Option<&str>) -> (StatusCode, Value) {
    let mut req = reqwest::Client::new()
        .delete(format!("{base}{path}"))
        .header("Authorization", "Bearer test-token");
    if let Some(profile) = viewer {
        req = req.header("x-unite-user", profile);
    }
    let response = req.send().await.unwrap();
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}
