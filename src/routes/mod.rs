use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{auth::AuthenticatedUser, state::AppState};

pub mod applications;
pub mod bookings;
pub mod cases;
pub mod chat;
pub mod documents;
pub mod health;
pub mod laws;
pub mod lawyers;
pub mod seed;
pub mod users;
pub mod waitlist;
pub mod webhooks;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        let allow_origin = AllowOrigin::list(headers);

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let users_routes = Router::new().route(
        "/profile",
        get(users::get_profile).post(users::save_profile),
    );

    let chat_routes = Router::new()
        .route("/nyayai", post(chat::chat_with_nyayai))
        .route("/history/:session_id", get(chat::get_chat_history))
        .route("/user-chats", get(chat::get_user_chats));

    let documents_routes = Router::new()
        .route("/generate", post(documents::generate_document))
        .route("/list", get(documents::list_documents))
        .route("/:id/download", get(documents::download_document));

    let application_routes = Router::new()
        .route("/apply", post(applications::apply))
        .route(
            "/application/documents",
            post(applications::upload_verification_document),
        )
        .route("/application/status", get(applications::application_status));

    let admin_routes = Router::new()
        .route("/applications", get(applications::admin_list_applications))
        .route(
            "/applications/:id/documents",
            get(applications::admin_application_documents),
        )
        .route(
            "/applications/:id/approve",
            post(applications::admin_approve_application),
        )
        .route(
            "/applications/:id/reject",
            post(applications::admin_reject_application),
        );

    let bookings_routes = Router::new()
        .route("/create", post(bookings::create_booking))
        .route("/verify-payment", post(bookings::verify_payment))
        .route("/list", get(bookings::list_bookings));

    let cases_routes = Router::new()
        .route("/create", post(cases::create_case))
        .route("/list", get(cases::list_cases))
        .route("/:id", get(cases::get_case))
        .route("/:id/notes", put(cases::add_case_note));

    let protected_state = state.clone();
    let protected_routes = Router::new()
        .nest("/api/users", users_routes)
        .nest("/api/chat", chat_routes)
        .nest("/api/documents", documents_routes)
        .nest("/api/lawyers", application_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/bookings", bookings_routes)
        .nest("/api/cases", cases_routes)
        .layer(middleware::from_extractor_with_state::<AuthenticatedUser, _>(protected_state));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/lawyers/list", get(lawyers::list_lawyers))
        .route("/api/lawyers/:id", get(lawyers::get_lawyer))
        .route("/api/laws/list", get(laws::list_laws))
        .route("/api/laws/:id", get(laws::get_law))
        .route("/api/webhooks/razorpay", post(webhooks::razorpay_webhook))
        .route("/api/waitlist", post(waitlist::join_waitlist))
        .route("/api/waitlist/count", get(waitlist::waitlist_count))
        .route(
            "/api/lawyer-interest",
            post(waitlist::register_lawyer_interest),
        )
        .route(
            "/api/lawyer-interest/count",
            get(waitlist::lawyer_interest_count),
        )
        .route("/api/seed-data", post(seed::seed_sample_data))
        .route("/download/:token", get(documents::download_with_token));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 32))
}
