//! End-to-end tests for the mutating-action dispatch path: note rules,
//! terminal-state short-circuiting, and the timeout-then-verify recovery.

mod common;

use common::{post_json, profile, spawn_gateway, spawn_gateway_with, spawn_stub, StubUpstream};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::time::Duration;

#[tokio::test]
async fn accept_that_times_out_recovers_once_polling_sees_approved() {
    let stub = StubUpstream::with_request(json!({
        "_id": "r-1",
        "Status": "Pending_Admin_Review",
        "coordinator_id": "C1"
    }));
    // The stub commits the status change, then stalls past the client
    // timeout before answering.
    stub.set_action_delay(Duration::from_millis(400));
    let upstream = spawn_stub(stub.clone()).await;
    let gateway = spawn_gateway_with(
        &upstream,
        Duration::from_millis(100),
        Duration::from_millis(50),
        5,
    )
    .await;

    let admin = profile("A1", "System Admin");
    let (status, body) = post_json(
        &gateway,
        "/event-requests/r-1/actions",
        Some(&admin),
        json!({"action": "accept"}),
    )
    .await;

    assert_eq!(status, 200, "recovered dispatch must succeed: {body}");
    assert_eq!(body["data"]["recovered"], json!(true));
    assert_eq!(body["data"]["shortCircuited"], json!(false));
    assert_eq!(stub.action_hits.load(Ordering::SeqCst), 1);
    assert_eq!(stub.status_of("r-1").as_deref(), Some("Approved"));
}

#[tokio::test]
async fn timeout_without_a_confirming_poll_surfaces_gateway_timeout() {
    let stub = StubUpstream::with_request(json!({
        "_id": "r-1",
        "Status": "Pending_Admin_Review"
    }));
    // Slow AND ineffective: the polls keep seeing the old status.
    stub.disable_action_effect();
    stub.set_action_delay(Duration::from_millis(400));
    let upstream = spawn_stub(stub.clone()).await;
    let gateway = spawn_gateway_with(
        &upstream,
        Duration::from_millis(100),
        Duration::from_millis(50),
        2,
    )
    .await;

    let admin = profile("A1", "System Admin");
    let (status, body) = post_json(
        &gateway,
        "/event-requests/r-1/actions",
        Some(&admin),
        json!({"action": "accept"}),
    )
    .await;

    assert_eq!(status, 504, "unverified timeout must surface: {body}");
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn accepting_an_already_approved_request_short_circuits_twice() {
    let stub = StubUpstream::with_request(json!({
        "_id": "r-1",
        "Status": "Approved"
    }));
    let upstream = spawn_stub(stub.clone()).await;
    let gateway = spawn_gateway(&upstream).await;

    let admin = profile("A1", "System Admin");
    for _ in 0..2 {
        let (status, body) = post_json(
            &gateway,
            "/event-requests/r-1/actions",
            Some(&admin),
            json!({"action": "accept"}),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body["data"]["shortCircuited"], json!(true));
    }
    // Neither call reached the upstream action endpoint.
    assert_eq!(stub.action_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn reject_without_a_note_is_refused_before_any_network_call() {
    let stub = StubUpstream::with_request(json!({
        "_id": "r-1",
        "Status": "Pending_Admin_Review"
    }));
    let upstream = spawn_stub(stub.clone()).await;
    let gateway = spawn_gateway(&upstream).await;

    let admin = profile("A1", "System Admin");
    let (status, body) = post_json(
        &gateway,
        "/event-requests/r-1/actions",
        Some(&admin),
        json!({"action": "reject", "note": "   "}),
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["success"], json!(false));
    assert_eq!(stub.action_hits.load(Ordering::SeqCst), 0);

    // With a note it goes through and the status flips.
    let (status, _) = post_json(
        &gateway,
        "/event-requests/r-1/actions",
        Some(&admin),
        json!({"action": "reject", "note": "double-booked venue"}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(stub.status_of("r-1").as_deref(), Some("Rejected"));
}

#[tokio::test]
async fn approve_synonym_dispatches_as_accept() {
    let stub = StubUpstream::with_request(json!({
        "_id": "r-1",
        "Status": "Pending_Admin_Review"
    }));
    let upstream = spawn_stub(stub.clone()).await;
    let gateway = spawn_gateway(&upstream).await;

    let admin = profile("A1", "System Admin");
    let (status, body) = post_json(
        &gateway,
        "/event-requests/r-1/actions",
        Some(&admin),
        json!({"action": "Approve"}),
    )
    .await;

    assert_eq!(status, 200, "{body}");
    assert_eq!(body["data"]["action"], json!("accept"));
    assert_eq!(stub.status_of("r-1").as_deref(), Some("Approved"));
}

#[tokio::test]
async fn unknown_actions_are_rejected() {
    let stub = StubUpstream::with_request(json!({
        "_id": "r-1",
        "Status": "Pending_Admin_Review"
    }));
    let upstream = spawn_stub(stub.clone()).await;
    let gateway = spawn_gateway(&upstream).await;

    let (status, _) = post_json(
        &gateway,
        "/event-requests/r-1/actions",
        Some(&profile("A1", "System Admin")),
        json!({"action": "escalate"}),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(stub.action_hits.load(Ordering::SeqCst), 0);
}
