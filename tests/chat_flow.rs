mod common;

use axum::http::StatusCode;
use common::{body_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn conversation_persists_across_turns() {
    let app = TestApp::new();

    let response = app
        .post_json(
            "/api/chat/nyayai",
            "user-1",
            &json!({ "message": "My landlord will not return my deposit" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    let session_id = body["session_id"].as_str().unwrap().to_string();
    let reply = body["response"].as_str().unwrap();
    assert!(reply.contains("consult a verified lawyer"));

    let response = app
        .post_json(
            "/api/chat/nyayai",
            "user-1",
            &json!({ "message": "What notice period applies?", "session_id": session_id }),
        )
        .await;
    let body = body_json(response).await;
    assert_eq!(body["session_id"], json!(session_id.clone()));

    let response = app
        .get(&format!("/api/chat/history/{session_id}"), "user-1")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let messages = body["chat"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0]["role"], json!("user"));
    assert_eq!(messages[1]["role"], json!("assistant"));
    assert_eq!(
        messages[2]["content"],
        json!("What notice period applies?")
    );
}

#[tokio::test]
async fn sessions_are_private_to_their_owner() {
    let app = TestApp::new();

    let response = app
        .post_json(
            "/api/chat/nyayai",
            "user-1",
            &json!({ "message": "How do I file an FIR?" }),
        )
        .await;
    let session_id = body_json(response).await["session_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .get(&format!("/api/chat/history/{session_id}"), "user-2")
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Nor can another user append to it.
    let response = app
        .post_json(
            "/api/chat/nyayai",
            "user-2",
            &json!({ "message": "hello", "session_id": session_id }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.get("/api/chat/history/unknown-session", "user-1").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_messages_are_rejected() {
    let app = TestApp::new();

    let response = app
        .post_json("/api/chat/nyayai", "user-1", &json!({ "message": "   " }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn user_chats_lists_summaries_for_the_caller_only() {
    let app = TestApp::new();

    app.post_json(
        "/api/chat/nyayai",
        "user-1",
        &json!({ "message": "Question about RTI" }),
    )
    .await;
    app.post_json(
        "/api/chat/nyayai",
        "user-1",
        &json!({ "message": "Question about rent" }),
    )
    .await;
    app.post_json(
        "/api/chat/nyayai",
        "user-2",
        &json!({ "message": "Question about divorce" }),
    )
    .await;

    let response = app.get("/api/chat/user-chats", "user-1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let chats = body["chats"].as_array().unwrap();
    assert_eq!(chats.len(), 2);
    for chat in chats {
        assert_eq!(chat["message_count"], json!(2));
        // Preview is the latest message, which is the assistant reply.
        assert!(chat["last_message"]
            .as_str()
            .unwrap()
            .contains("consult a verified lawyer"));
        assert!(chat["session_id"].as_str().is_some());
    }
}
