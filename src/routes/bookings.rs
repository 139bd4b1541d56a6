use axum::extract::{Json, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{collections, Booking, BookingStatus};
use crate::payments::{confirm_order, consultation_amount, verify_payment_signature};
use crate::state::AppState;
use crate::store::{to_record, Direction, FilterOp, Query};

fn default_duration() -> i64 {
    30
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub lawyer_id: String,
    pub consultation_type: String,
    pub date: String,
    pub time_slot: String,
    #[serde(default = "default_duration")]
    pub duration: i64,
}

#[derive(Deserialize)]
pub struct VerifyPaymentRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

pub async fn create_booking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    if request.duration <= 0 {
        return Err(AppError::bad_request("duration must be positive"));
    }

    let lawyer = state
        .store
        .get(collections::LAWYERS, &request.lawyer_id)
        .await?
        .ok_or_else(AppError::not_found)?;
    let price = lawyer.get("price").and_then(Value::as_i64).unwrap_or(500);

    let amount = consultation_amount(price, request.duration);
    let order = state
        .gateway
        .create_order(
            amount * 100,
            "INR",
            json!({
                "user_id": user.uid,
                "lawyer_id": request.lawyer_id,
                "consultation_type": request.consultation_type,
            }),
        )
        .await
        .map_err(AppError::internal)?;

    let booking = Booking {
        id: String::new(),
        user_id: user.uid.clone(),
        lawyer_id: request.lawyer_id,
        consultation_type: request.consultation_type,
        date: request.date,
        time_slot: request.time_slot,
        duration: request.duration,
        amount,
        status: BookingStatus::Pending,
        order_id: order.id.clone(),
        payment_id: None,
        failure_reason: None,
        created_at: String::new(),
    };
    let booking_id = state
        .store
        .add(collections::BOOKINGS, to_record(&booking)?)
        .await?;

    info!(%booking_id, order_id = %order.id, amount, "booking created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "booking_id": booking_id,
            "order_id": order.id,
            "amount": amount,
            "currency": "INR",
        })),
    ))
}

pub async fn verify_payment(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(request): Json<VerifyPaymentRequest>,
) -> AppResult<Json<Value>> {
    let valid = verify_payment_signature(
        &state.config.razorpay_key_secret,
        &request.order_id,
        &request.payment_id,
        &request.signature,
    );
    if !valid {
        warn!(order_id = %request.order_id, "payment signature mismatch");
        return Err(AppError::bad_request("Payment verification failed"));
    }

    // Re-verifying an already confirmed order is a no-op success.
    let confirmed = confirm_order(
        state.store.as_ref(),
        &request.order_id,
        &request.payment_id,
    )
    .await?;

    info!(order_id = %request.order_id, confirmed, "payment verified");

    Ok(Json(json!({
        "success": true,
        "message": "Payment verified and booking confirmed",
    })))
}

pub async fn list_bookings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Value>> {
    let records = state
        .store
        .query(
            collections::BOOKINGS,
            Query::new()
                .filter("user_id", FilterOp::Equal, user.uid.clone())
                .order_by("created_at", Direction::Descending),
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "bookings": records,
    })))
}
