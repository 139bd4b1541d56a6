#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

use sunolegal::assistant::CannedAssistant;
use sunolegal::auth::verifier::MockVerifier;
use sunolegal::config::{AppConfig, AssistantMode, AuthMode, PaymentMode};
use sunolegal::gateway::MockGateway;
use sunolegal::mailer::LogMailer;
use sunolegal::models::collections;
use sunolegal::payments::compute_signature;
use sunolegal::render::TemplateRenderer;
use sunolegal::routes::create_router;
use sunolegal::state::AppState;
use sunolegal::storage::MemoryObjectStore;
use sunolegal::store::{to_record, MemoryStore};

pub const ADMIN_TOKEN: &str = "admin-1";
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// In-process application wired against in-memory backends. Every instance
/// owns fresh state, so tests never share data.
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let config = AppConfig {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            cors_allowed_origin: None,
            auth_mode: AuthMode::Mock,
            jwt_secret: None,
            jwt_issuer: "sunolegal".to_string(),
            jwt_audience: "sunolegal-clients".to_string(),
            payment_mode: PaymentMode::Mock,
            razorpay_key_id: "rzp_test_key".to_string(),
            razorpay_key_secret: "rzp_test_secret".to_string(),
            razorpay_webhook_secret: WEBHOOK_SECRET.to_string(),
            assistant_mode: AssistantMode::Canned,
            assistant_api_url: "http://127.0.0.1:0/unused".to_string(),
            assistant_api_key: None,
            assistant_model: "test-model".to_string(),
            signed_url_ttl_minutes: 15,
            admin_uids: vec![ADMIN_TOKEN.to_string()],
        };

        let state = AppState::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryObjectStore::new()),
            Arc::new(MockGateway::new()),
            Arc::new(MockVerifier::new()),
            Arc::new(CannedAssistant::new()),
            Arc::new(TemplateRenderer::new()),
            Arc::new(LogMailer::new()),
        );
        let router = create_router(state.clone());

        Self { state, router }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("request should not fail at the transport level")
    }

    pub async fn get(&self, path: &str, token: &str) -> Response {
        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn get_public(&self, path: &str) -> Response {
        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post_json(&self, path: &str, token: &str, body: &Value) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap();
        self.send(request).await
    }

    pub async fn post_json_public(&self, path: &str, body: &Value) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap();
        self.send(request).await
    }

    pub async fn put_json(&self, path: &str, token: &str, body: &Value) -> Response {
        let request = Request::builder()
            .method(Method::PUT)
            .uri(path)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap();
        self.send(request).await
    }

    pub async fn upload_file(
        &self,
        path: &str,
        token: &str,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Response {
        let boundary = format!("boundary-{}", Uuid::new_v4());

        let mut body = Vec::new();
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Delivers a webhook the way the gateway would: raw bytes plus a keyed
    /// signature header over exactly those bytes.
    pub async fn post_webhook(&self, body: &[u8], signature: &str) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/webhooks/razorpay")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-razorpay-signature", signature)
            .body(Body::from(body.to_vec()))
            .unwrap();
        self.send(request).await
    }

    pub fn sign_webhook(&self, body: &[u8]) -> String {
        compute_signature(WEBHOOK_SECRET, body)
    }

    pub async fn seed_lawyer(&self, name: &str, price: i64) -> String {
        let record = to_record(&json!({
            "name": name,
            "bar_council_id": "DL/00000/2020",
            "specialization": ["Family Law"],
            "languages": ["Hindi", "English"],
            "city": "Delhi",
            "state": "Delhi",
            "experience": 5,
            "price": price,
            "rating": 4.5,
            "reviews": 10,
            "verified": true,
        }))
        .unwrap();
        self.state
            .store
            .add(collections::LAWYERS, record)
            .await
            .unwrap()
    }

    pub async fn save_profile(&self, token: &str, name: &str, email: &str) {
        let response = self
            .post_json(
                "/api/users/profile",
                token,
                &json!({
                    "name": name,
                    "phone": "+91-9999999999",
                    "email": email,
                    "city": "Delhi",
                    "state": "Delhi",
                }),
            )
            .await;
        assert!(response.status().is_success(), "profile save failed");
    }
}

pub async fn body_to_vec(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body collection failed")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = body_to_vec(response).await;
    serde_json::from_slice(&bytes).expect("body was not valid JSON")
}
