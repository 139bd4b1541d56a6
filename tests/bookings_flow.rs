mod common;

use axum::http::StatusCode;
use common::{body_json, TestApp};
use serde_json::json;

use sunolegal::payments::compute_signature;

const KEY_SECRET: &str = "rzp_test_secret";

async fn create_booking(app: &TestApp, token: &str, lawyer_id: &str, duration: i64) -> (String, String) {
    let response = app
        .post_json(
            "/api/bookings/create",
            token,
            &json!({
                "lawyer_id": lawyer_id,
                "consultation_type": "video",
                "date": "2026-08-20",
                "time_slot": "10:00",
                "duration": duration,
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["currency"], json!("INR"));
    (
        body["booking_id"].as_str().unwrap().to_string(),
        body["order_id"].as_str().unwrap().to_string(),
    )
}

fn captured_webhook_body(event_id: &str, order_id: &str, payment_id: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": event_id,
        "event": "payment.captured",
        "payload": {
            "payment": {
                "entity": {
                    "id": payment_id,
                    "order_id": order_id,
                    "amount": 50_000,
                },
            },
        },
    }))
    .unwrap()
}

#[tokio::test]
async fn webhook_capture_confirms_booking() {
    let app = TestApp::new();
    let lawyer_id = app.seed_lawyer("Adv. Test", 500).await;

    let (_, order_id) = create_booking(&app, "user-1", &lawyer_id, 30).await;

    let body = captured_webhook_body("evt_1", &order_id, "pay_1");
    let signature = app.sign_webhook(&body);
    let response = app.post_webhook(&body, &signature).await;
    assert_eq!(response.status(), StatusCode::OK);
    let reply = body_json(response).await;
    assert_eq!(reply["status"], json!("processed"));

    let response = app.get("/api/bookings/list", "user-1").await;
    let reply = body_json(response).await;
    let bookings = reply["bookings"].as_array().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["status"], json!("confirmed"));
    assert_eq!(bookings[0]["payment_id"], json!("pay_1"));
}

#[tokio::test]
async fn webhook_redelivery_reports_duplicate() {
    let app = TestApp::new();
    let lawyer_id = app.seed_lawyer("Adv. Test", 500).await;
    let (_, order_id) = create_booking(&app, "user-1", &lawyer_id, 30).await;

    let body = captured_webhook_body("evt_1", &order_id, "pay_1");
    let signature = app.sign_webhook(&body);
    app.post_webhook(&body, &signature).await;

    let response = app.post_webhook(&body, &signature).await;
    assert_eq!(response.status(), StatusCode::OK);
    let reply = body_json(response).await;
    assert_eq!(reply["status"], json!("duplicate"));
}

#[tokio::test]
async fn webhook_rejects_bad_or_missing_signature() {
    let app = TestApp::new();

    let body = captured_webhook_body("evt_1", "order_x", "pay_1");
    let response = app.post_webhook(&body, "0000").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Signature over different bytes must not validate either.
    let other = captured_webhook_body("evt_2", "order_x", "pay_1");
    let signature = app.sign_webhook(&other);
    let response = app.post_webhook(&body, &signature).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn client_verification_confirms_and_is_idempotent() {
    let app = TestApp::new();
    let lawyer_id = app.seed_lawyer("Adv. Test", 500).await;
    let (_, order_id) = create_booking(&app, "user-1", &lawyer_id, 30).await;

    let signature = compute_signature(KEY_SECRET, format!("{order_id}|pay_9").as_bytes());
    let request = json!({
        "order_id": order_id,
        "payment_id": "pay_9",
        "signature": signature,
    });

    let response = app
        .post_json("/api/bookings/verify-payment", "user-1", &request)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/api/bookings/list", "user-1").await;
    let reply = body_json(response).await;
    assert_eq!(reply["bookings"][0]["status"], json!("confirmed"));

    // Re-verification of a confirmed order still succeeds.
    let response = app
        .post_json("/api/bookings/verify-payment", "user-1", &request)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn client_verification_rejects_forged_signature() {
    let app = TestApp::new();
    let lawyer_id = app.seed_lawyer("Adv. Test", 500).await;
    let (_, order_id) = create_booking(&app, "user-1", &lawyer_id, 30).await;

    let response = app
        .post_json(
            "/api/bookings/verify-payment",
            "user-1",
            &json!({
                "order_id": order_id,
                "payment_id": "pay_9",
                "signature": "deadbeef",
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get("/api/bookings/list", "user-1").await;
    let reply = body_json(response).await;
    assert_eq!(reply["bookings"][0]["status"], json!("pending"));
}

#[tokio::test]
async fn amount_bills_per_half_hour_block() {
    let app = TestApp::new();
    let lawyer_id = app.seed_lawyer("Adv. Test", 500).await;

    let response = app
        .post_json(
            "/api/bookings/create",
            "user-1",
            &json!({
                "lawyer_id": lawyer_id,
                "consultation_type": "video",
                "date": "2026-08-20",
                "time_slot": "10:00",
                "duration": 45,
            }),
        )
        .await;
    let body = body_json(response).await;
    assert_eq!(body["amount"], json!(500));

    let response = app
        .post_json(
            "/api/bookings/create",
            "user-1",
            &json!({
                "lawyer_id": lawyer_id,
                "consultation_type": "video",
                "date": "2026-08-20",
                "time_slot": "11:00",
                "duration": 60,
            }),
        )
        .await;
    let body = body_json(response).await;
    assert_eq!(body["amount"], json!(1000));
}

#[tokio::test]
async fn rejects_unknown_lawyer_and_bad_duration() {
    let app = TestApp::new();

    let response = app
        .post_json(
            "/api/bookings/create",
            "user-1",
            &json!({
                "lawyer_id": "missing",
                "consultation_type": "video",
                "date": "2026-08-20",
                "time_slot": "10:00",
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let lawyer_id = app.seed_lawyer("Adv. Test", 500).await;
    let response = app
        .post_json(
            "/api/bookings/create",
            "user-1",
            &json!({
                "lawyer_id": lawyer_id,
                "consultation_type": "video",
                "date": "2026-08-20",
                "time_slot": "10:00",
                "duration": 0,
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_is_scoped_to_the_caller() {
    let app = TestApp::new();
    let lawyer_id = app.seed_lawyer("Adv. Test", 500).await;
    create_booking(&app, "user-1", &lawyer_id, 30).await;

    let response = app.get("/api/bookings/list", "user-2").await;
    let reply = body_json(response).await;
    assert!(reply["bookings"].as_array().unwrap().is_empty());
}
