use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Json;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::mailer::send_in_background;
use crate::models::collections;
use crate::payments::{
    reconcile_webhook, verify_webhook_signature, WebhookEvent, WebhookOutcome, SIGNATURE_HEADER,
};
use crate::state::AppState;
use crate::store::{FilterOp, Query};

pub async fn razorpay_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::bad_request("missing webhook signature"))?;

    if !verify_webhook_signature(&state.config.razorpay_webhook_secret, &body, signature) {
        warn!("webhook signature mismatch");
        return Err(AppError::bad_request("invalid webhook signature"));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|err| AppError::bad_request(format!("malformed webhook payload: {err}")))?;

    let outcome = reconcile_webhook(state.store.as_ref(), &event).await?;
    let status = match outcome {
        WebhookOutcome::Processed => "processed",
        WebhookOutcome::Duplicate => "duplicate",
        WebhookOutcome::Ignored => "ignored",
    };
    info!(event_id = %event.id, event = %event.event, status, "webhook received");

    if outcome == WebhookOutcome::Processed && event.event == "payment.captured" {
        notify_booking_owners(&state, &event.payload.payment.entity.order_id).await;
    }

    Ok(Json(json!({
        "success": true,
        "status": status,
    })))
}

/// Queues a confirmation email for each booking on the captured order.
/// Owners without a stored profile email are skipped.
async fn notify_booking_owners(state: &AppState, order_id: &str) {
    let bookings = match state
        .store
        .query(
            collections::BOOKINGS,
            Query::new().filter("order_id", FilterOp::Equal, order_id.to_string()),
        )
        .await
    {
        Ok(records) => records,
        Err(err) => {
            warn!(error = %err, "failed to load bookings for confirmation email");
            return;
        }
    };

    for booking in bookings {
        let Some(user_id) = booking.get("user_id").and_then(Value::as_str) else {
            continue;
        };
        let Ok(Some(profile)) = state.store.get(collections::USERS, user_id).await else {
            continue;
        };
        let Some(email) = profile.get("email").and_then(Value::as_str) else {
            continue;
        };

        let date = booking.get("date").and_then(Value::as_str).unwrap_or("");
        let time_slot = booking
            .get("time_slot")
            .and_then(Value::as_str)
            .unwrap_or("");
        send_in_background(
            state.mailer.clone(),
            email.to_string(),
            "Your consultation is confirmed".to_string(),
            format!("Your booking on {date} at {time_slot} has been confirmed."),
        );
    }
}
