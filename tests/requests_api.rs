//! Gateway API tests: list decoration, viewer resolution, detail view
//! composition, dialog sessions, and the delete lifecycle guard.

mod common;

use common::{delete_json, get_json, post_json, profile, spawn_gateway, spawn_stub, StubUpstream};
use serde_json::{json, Value};

fn first_request(body: &Value) -> &Value {
    &body["data"]["requests"][0]
}

#[tokio::test]
async fn list_requires_authorization() {
    let stub = StubUpstream::with_request(json!({"_id": "r-1"}));
    let upstream = spawn_stub(stub).await;
    let gateway = spawn_gateway(&upstream).await;

    let response = reqwest::Client::new()
        .get(format!("{gateway}/event-requests"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn list_decorates_requests_with_viewer_specific_actions() {
    let stub = StubUpstream::with_request(json!({
        "_id": "r-1",
        "Status": "Pending_Admin_Review",
        "coordinator_id": "C1",
        "event": {"title": "Spring Drive", "category": "Blood Drive", "targetDonations": 80}
    }));
    let upstream = spawn_stub(stub).await;
    let gateway = spawn_gateway(&upstream).await;

    let coordinator = profile("C1", "Coordinator");
    let (status, body) = get_json(&gateway, "/event-requests", Some(&coordinator)).await;
    assert_eq!(status, 200, "{body}");

    let request = first_request(&body);
    assert_eq!(request["id"], json!("r-1"));
    assert_eq!(request["statusLabel"], json!("Pending"));
    assert_eq!(request["pendingStage"], json!("Waiting for admin review"));
    let actions = request["allowedActions"].as_array().unwrap();
    for expected in ["accept", "reject", "reschedule"] {
        assert!(actions.contains(&json!(expected)), "missing {expected}: {actions:?}");
    }
    assert!(!actions.contains(&json!("manage-staff")));
    assert_eq!(request["event"]["title"], json!("Spring Drive"));
    assert_eq!(body["data"]["statusCounts"]["Pending"], json!(1));
}

#[tokio::test]
async fn explicit_allowed_actions_override_inference_for_every_viewer() {
    let stub = StubUpstream::with_request(json!({
        "_id": "r-1",
        "Status": "Pending_Admin_Review",
        "allowedActions": ["view"]
    }));
    let upstream = spawn_stub(stub).await;
    let gateway = spawn_gateway(&upstream).await;

    let admin = profile("A1", "System Admin");
    let (_, body) = get_json(&gateway, "/event-requests", Some(&admin)).await;
    assert_eq!(
        first_request(&body)["allowedActions"],
        json!(["view"]),
        "backend-sent array is authoritative"
    );
}

#[tokio::test]
async fn malformed_viewer_profile_degrades_to_no_actions_without_erroring() {
    let stub = StubUpstream::with_request(json!({
        "_id": "r-1",
        "Status": "Pending_Admin_Review"
    }));
    let upstream = spawn_stub(stub).await;
    let gateway = spawn_gateway(&upstream).await;

    let (status, body) = get_json(&gateway, "/event-requests", Some("{broken json")).await;
    assert_eq!(status, 200, "malformed profile must not error: {body}");
    assert_eq!(first_request(&body)["allowedActions"], json!([]));
}

#[tokio::test]
async fn detail_composes_view_selection_and_open_dialogs() {
    let stub = StubUpstream::with_request(json!({
        "_id": "r-1",
        "Status": "Pending_Admin_Review",
        "event": {"title": "Donor Training", "category": "Training", "maxParticipants": 25}
    }));
    let upstream = spawn_stub(stub).await;
    let gateway = spawn_gateway(&upstream).await;

    let admin = profile("A1", "System Admin");

    // Open a cancel dialog, confirm it shows up in the detail response.
    let (status, _) = post_json(
        &gateway,
        "/ui/requests/r-1/dialogs/cancel/open",
        Some(&admin),
        json!({}),
    )
    .await;
    assert_eq!(status, 200);

    let (status, body) = get_json(&gateway, "/event-requests/r-1", Some(&admin)).await;
    assert_eq!(status, 200, "{body}");
    let detail = &body["data"];
    assert_eq!(detail["detailView"], json!("creation-detail"));
    assert_eq!(detail["categoryDetail"]["category"], json!("training"));
    assert_eq!(detail["categoryDetail"]["maxParticipants"], json!(25));
    assert_eq!(detail["openDialogs"], json!(["cancel"]));

    // Another viewer's session starts clean.
    let other = profile("A2", "System Admin");
    let (_, body) = get_json(&gateway, "/event-requests/r-1", Some(&other)).await;
    assert_eq!(body["data"]["openDialogs"], json!([]));
}

#[tokio::test]
async fn rescheduled_requests_select_the_reschedule_narrative() {
    let stub = StubUpstream::with_request(json!({
        "_id": "r-1",
        "Status": "Rescheduled_By_Admin",
        "stakeholder_id": "S1"
    }));
    let upstream = spawn_stub(stub).await;
    let gateway = spawn_gateway(&upstream).await;

    let stakeholder = profile("S1", "Stakeholder");
    let (_, body) = get_json(&gateway, "/event-requests/r-1", Some(&stakeholder)).await;
    let detail = &body["data"];
    assert_eq!(detail["detailView"], json!("admin-rescheduled"));
    let actions = detail["allowedActions"].as_array().unwrap();
    assert!(actions.contains(&json!("confirm")), "{actions:?}");
    assert!(actions.contains(&json!("decline")));
}

#[tokio::test]
async fn delete_is_gated_on_role_and_cancelled_state() {
    let stub = StubUpstream::with_request(json!({
        "_id": "r-1",
        "Status": "Pending_Admin_Review"
    }));
    stub.insert_request(json!({"_id": "r-2", "Status": "Cancelled"}));
    let upstream = spawn_stub(stub.clone()).await;
    let gateway = spawn_gateway(&upstream).await;

    // Non-admin viewers cannot delete at all.
    let coordinator = profile("C1", "Coordinator");
    let (status, _) = delete_json(&gateway, "/event-requests/r-2", Some(&coordinator)).await;
    assert_eq!(status, 403);

    // Admins cannot delete a request that is not cancelled yet.
    let admin = profile("A1", "System Admin");
    let (status, body) = delete_json(&gateway, "/event-requests/r-1", Some(&admin)).await;
    assert_eq!(status, 400, "{body}");

    // Cancelled requests delete fine and disappear upstream.
    let (status, body) = delete_json(&gateway, "/event-requests/r-2", Some(&admin)).await;
    assert_eq!(status, 200, "{body}");
    assert!(stub.requests.lock().unwrap().get("r-2").is_none());

    // The delete flow pops the transient success dialog.
    let (_, body) = get_json(&gateway, "/ui/requests/r-2/dialogs", Some(&admin)).await;
    assert_eq!(body["data"]["open"], json!(["delete-success"]));
}

#[tokio::test]
async fn successful_action_closes_only_its_own_dialog() {
    let stub = StubUpstream::with_request(json!({
        "_id": "r-1",
        "Status": "Pending_Admin_Review"
    }));
    let upstream = spawn_stub(stub).await;
    let gateway = spawn_gateway(&upstream).await;

    let admin = profile("A1", "System Admin");
    for kind in ["accept", "reject"] {
        let (status, _) = post_json(
            &gateway,
            &format!("/ui/requests/r-1/dialogs/{kind}/open"),
            Some(&admin),
            json!({}),
        )
        .await;
        assert_eq!(status, 200);
    }

    let (status, _) = post_json(
        &gateway,
        "/event-requests/r-1/actions",
        Some(&admin),
        json!({"action": "accept"}),
    )
    .await;
    assert_eq!(status, 200);

    let (_, body) = get_json(&gateway, "/ui/requests/r-1/dialogs", Some(&admin)).await;
    assert_eq!(body["data"]["open"], json!(["reject"]));
}

#[tokio::test]
async fn force_refresh_drops_the_cached_list() {
    let stub = StubUpstream::with_request(json!({
        "_id": "r-1",
        "Status": "Pending_Admin_Review"
    }));
    let upstream = spawn_stub(stub.clone()).await;
    let gateway = spawn_gateway(&upstream).await;

    let admin = profile("A1", "System Admin");

    // Prime the cache, then change the upstream behind its back.
    let (_, body) = get_json(&gateway, "/event-requests", Some(&admin)).await;
    assert_eq!(body["data"]["total"], json!(1));
    stub.insert_request(json!({"_id": "r-2", "Status": "Pending_Admin_Review"}));

    // Cached: the new request is not visible yet.
    let (_, body) = get_json(&gateway, "/event-requests", Some(&admin)).await;
    assert_eq!(body["data"]["total"], json!(1));

    let (status, _) = post_json(&gateway, "/event-requests/refresh", Some(&admin), json!({})).await;
    assert_eq!(status, 200);

    let (_, body) = get_json(&gateway, "/event-requests", Some(&admin)).await;
    assert_eq!(body["data"]["total"], json!(2));
}

#[tokio::test]
async fn delete_via_the_actions_endpoint_is_guarded_the_same_way() {
    let stub = StubUpstream::with_request(json!({
        "_id": "r-1",
        "Status": "Pending_Admin_Review"
    }));
    let upstream = spawn_stub(stub.clone()).await;
    let gateway = spawn_gateway(&upstream).await;

    let admin = profile("A1", "System Admin");
    let (status, _) = post_json(
        &gateway,
        "/event-requests/r-1/actions",
        Some(&admin),
        json!({"action": "delete"}),
    )
    .await;
    assert_eq!(status, 400);
    assert!(stub.requests.lock().unwrap().contains_key("r-1"));
}
