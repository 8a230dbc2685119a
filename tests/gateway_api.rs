//! Realtime gateway integration tests
//!
//! Exercises the room event publish endpoint against the room registry:
//! authentication, fan-out scoping, and delivery counts. Handshake
//! authentication and lag-to-resync translation are covered by the unit
//! tests next to the gateway itself.

mod common;

use axum::http::StatusCode;
use common::{signup_company, signup_junior, test_server_with_state, test_ws_server_with_state};
use std::time::Duration;
use talentlink::shared::{RoomEvent, RoomEventType, ServerFrame};
use uuid::Uuid;

/// Poll until `condition` holds, panicking after one second
async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within one second");
}

#[tokio::test]
async fn test_gateway_join_receive_leave_over_websocket() {
    let (server, state) = test_ws_server_with_state();
    let signup = signup_junior(&server, "dev@example.com").await;
    let access = signup["access_token"].as_str().unwrap().to_string();

    let mut ws = server
        .get_websocket("/gateway")
        .add_query_param("token", &access)
        .await
        .into_websocket()
        .await;

    let admitted: ServerFrame = ws.receive_json().await;
    assert_eq!(admitted, ServerFrame::Admitted);

    ws.send_text(r#"{"op":"join","room":"project-1"}"#).await;
    wait_until(|| state.rooms.member_count("project-1") == 1).await;

    // A broadcast now reaches the connection as an event frame
    let delivered = state.rooms.broadcast(
        "project-1",
        RoomEvent::created("project-1", serde_json::json!({ "id": "c1" })),
    );
    assert_eq!(delivered, 1);

    let frame: ServerFrame = ws.receive_json().await;
    match frame {
        ServerFrame::Event(event) => {
            assert_eq!(event.room_id, "project-1");
            assert_eq!(event.payload["id"], "c1");
        }
        other => panic!("expected an event frame, got {other:?}"),
    }

    // Leaving removes membership; the empty room is dropped
    ws.send_text(r#"{"op":"leave","room":"project-1"}"#).await;
    wait_until(|| state.rooms.member_count("project-1") == 0).await;

    // Garbage frames are ignored, not fatal
    ws.send_text("not json").await;
    ws.send_text(r#"{"op":"join","room":"project-2"}"#).await;
    wait_until(|| state.rooms.member_count("project-2") == 1).await;
}

#[tokio::test]
async fn test_gateway_disconnect_clears_membership() {
    let (server, state) = test_ws_server_with_state();
    let signup = signup_junior(&server, "dev@example.com").await;
    let access = signup["access_token"].as_str().unwrap().to_string();

    let mut ws = server
        .get_websocket("/gateway")
        .add_query_param("token", &access)
        .await
        .into_websocket()
        .await;
    let _admitted: ServerFrame = ws.receive_json().await;

    ws.send_text(r#"{"op":"join","room":"project-1"}"#).await;
    ws.send_text(r#"{"op":"join","room":"project-2"}"#).await;
    wait_until(|| {
        state.rooms.member_count("project-1") == 1 && state.rooms.member_count("project-2") == 1
    })
    .await;

    // Dropping the client socket closes the connection server-side
    drop(ws);
    wait_until(|| state.rooms.room_count() == 0).await;
}

#[tokio::test]
async fn test_gateway_handshake_rejected_without_token() {
    let (server, _state) = test_ws_server_with_state();

    let response = server.get_websocket("/gateway").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_publish_requires_authentication() {
    let (server, _state) = test_server_with_state();

    let response = server
        .post("/api/rooms/project-1/events")
        .json(&serde_json::json!({
            "type": "created",
            "payload": { "id": "c1" }
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_publish_fans_out_to_room_members_only() {
    let (server, state) = test_server_with_state();
    let signup = signup_junior(&server, "dev@example.com").await;
    let access = signup["access_token"].as_str().unwrap();

    let member_a = Uuid::new_v4();
    let member_b = Uuid::new_v4();
    let outsider = Uuid::new_v4();
    let mut rx_a = state.rooms.join("project-1", member_a);
    let mut rx_b = state.rooms.join("project-1", member_b);
    let mut rx_out = state.rooms.join("project-2", outsider);

    let response = server
        .post("/api/rooms/project-1/events")
        .add_header("Authorization", format!("Bearer {access}"))
        .json(&serde_json::json!({
            "type": "updated",
            "payload": { "id": "c7", "body": "edited" }
        }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["room_id"], "project-1");
    assert_eq!(body["delivered"], 2);

    for rx in [&mut rx_a, &mut rx_b] {
        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, RoomEventType::Updated);
        assert_eq!(event.room_id, "project-1");
        assert_eq!(event.payload["id"], "c7");
        assert!(!event.timestamp.is_empty());
    }
    assert!(rx_out.try_recv().is_err());
}

#[tokio::test]
async fn test_publish_to_empty_room_reports_zero() {
    let (server, _state) = test_server_with_state();
    let signup = signup_company(&server, "acme@example.com").await;
    let access = signup["access_token"].as_str().unwrap();

    let response = server
        .post("/api/rooms/project-empty/events")
        .add_header("Authorization", format!("Bearer {access}"))
        .json(&serde_json::json!({
            "type": "deleted",
            "payload": { "id": "c1" }
        }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["delivered"], 0);
}

#[tokio::test]
async fn test_publish_rejects_unknown_event_type() {
    let (server, _state) = test_server_with_state();
    let signup = signup_junior(&server, "dev@example.com").await;
    let access = signup["access_token"].as_str().unwrap();

    let response = server
        .post("/api/rooms/project-1/events")
        .add_header("Authorization", format!("Bearer {access}"))
        .json(&serde_json::json!({
            "type": "renamed",
            "payload": {}
        }))
        .await;
    // Unknown variants fail deserialization before the handler runs
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}
