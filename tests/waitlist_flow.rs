mod common;

use axum::http::StatusCode;
use common::{body_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn signup_is_deduplicated_by_email() {
    let app = TestApp::new();

    let request = json!({
        "name": "Asha Patel",
        "email": "asha@example.com",
        "city": "Ahmedabad",
        "user_type": "citizen",
    });

    let response = app.post_json_public("/api/waitlist", &request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert!(body["waitlist_id"].as_str().is_some());

    // Resubmitting the same email is still a success, without a new entry.
    let response = app.post_json_public("/api/waitlist", &request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], json!("You're already on the waitlist!"));
    assert!(body.get("waitlist_id").is_none());

    let response = app.get_public("/api/waitlist/count").await;
    let body = body_json(response).await;
    assert_eq!(body["count"], json!(1));
}

#[tokio::test]
async fn count_grows_with_distinct_emails() {
    let app = TestApp::new();

    for email in ["a@example.com", "b@example.com", "c@example.com"] {
        let response = app
            .post_json_public(
                "/api/waitlist",
                &json!({
                    "name": "Someone",
                    "email": email,
                    "city": "Delhi",
                    "user_type": "citizen",
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.get_public("/api/waitlist/count").await;
    let body = body_json(response).await;
    assert_eq!(body["count"], json!(3));
}

#[tokio::test]
async fn lawyer_interest_mirrors_the_waitlist() {
    let app = TestApp::new();

    let request = json!({
        "name": "Adv. Rohan Desai",
        "email": "rohan@example.com",
        "city": "Mumbai",
        "practice_area": "Corporate Law",
        "experience": "8 years",
    });

    let response = app.post_json_public("/api/lawyer-interest", &request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["interest_id"].as_str().is_some());

    let response = app.post_json_public("/api/lawyer-interest", &request).await;
    let body = body_json(response).await;
    assert_eq!(
        body["message"],
        json!("You've already registered your interest!")
    );

    let response = app.get_public("/api/lawyer-interest/count").await;
    let body = body_json(response).await;
    assert_eq!(body["count"], json!(1));

    // The two registries are independent.
    let response = app.get_public("/api/waitlist/count").await;
    let body = body_json(response).await;
    assert_eq!(body["count"], json!(0));
}
