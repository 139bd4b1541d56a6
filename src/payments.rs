use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::{
    models::{collections, BookingStatus},
    store::{now_rfc3339, to_record, Datastore, FieldWrite, FilterOp, Query, StoreError},
};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";

/// Consultations are priced per 30-minute block; partial blocks do not bill.
pub fn consultation_amount(price_per_30_min: i64, duration_minutes: i64) -> i64 {
    price_per_30_min * (duration_minutes / 30)
}

pub fn compute_signature(secret: &str, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

fn signatures_match(expected_hex: &str, provided_hex: &str) -> bool {
    let expected = match hex::decode(expected_hex) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let provided = match hex::decode(provided_hex) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    if expected.len() != provided.len() {
        return false;
    }
    expected.ct_eq(provided.as_slice()).into()
}

/// Client-side confirmation signature: keyed hash over `order_id|payment_id`.
pub fn verify_payment_signature(
    secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    let payload = format!("{order_id}|{payment_id}");
    signatures_match(&compute_signature(secret, payload.as_bytes()), signature)
}

/// Webhook signature: keyed hash over the raw body bytes.
pub fn verify_webhook_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    signatures_match(&compute_signature(secret, body), signature)
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    pub event: String,
    pub payload: WebhookPayload,
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub payment: WebhookPayment,
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayment {
    pub entity: PaymentEntity,
}

#[derive(Debug, Deserialize)]
pub struct PaymentEntity {
    pub id: String,
    pub order_id: String,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Processed,
    Duplicate,
    Ignored,
}

/// Apply a verified webhook event to the booking records.
///
/// Delivery is at-least-once: a previously recorded event id or payment id
/// short-circuits to `Duplicate` without touching any booking. Bookings
/// already in a terminal state are skipped during transitions. The event
/// ledger entry is written last so a failed attempt stays retryable.
pub async fn reconcile_webhook(
    store: &dyn Datastore,
    event: &WebhookEvent,
) -> Result<WebhookOutcome, StoreError> {
    if store
        .get(collections::WEBHOOK_EVENTS, &event.id)
        .await?
        .is_some()
    {
        return Ok(WebhookOutcome::Duplicate);
    }

    let entity = &event.payload.payment.entity;
    if store
        .get(collections::PAYMENTS, &entity.id)
        .await?
        .is_some()
    {
        return Ok(WebhookOutcome::Duplicate);
    }

    match event.event.as_str() {
        "payment.captured" => {
            transition_order(
                store,
                &entity.order_id,
                BookingStatus::Confirmed,
                vec![(
                    "payment_id".to_string(),
                    FieldWrite::Set(Value::String(entity.id.clone())),
                )],
            )
            .await?;
            record_payment(store, entity, &event.event).await?;
        }
        "payment.failed" => {
            let reason = entity
                .error_description
                .clone()
                .unwrap_or_else(|| "payment failed".to_string());
            transition_order(
                store,
                &entity.order_id,
                BookingStatus::PaymentFailed,
                vec![(
                    "failure_reason".to_string(),
                    FieldWrite::Set(Value::String(reason)),
                )],
            )
            .await?;
            record_payment(store, entity, &event.event).await?;
        }
        "payment.authorized" => {
            transition_order(store, &entity.order_id, BookingStatus::Authorized, Vec::new())
                .await?;
        }
        _ => return Ok(WebhookOutcome::Ignored),
    }

    let ledger_entry = to_record(&json!({
        "event_id": event.id,
        "event_type": event.event,
        "recorded_at": now_rfc3339(),
    }))?;
    store
        .insert_new(collections::WEBHOOK_EVENTS, &event.id, ledger_entry)
        .await?;

    Ok(WebhookOutcome::Processed)
}

/// Confirm every non-terminal booking referencing the order, recording the
/// payment id. Used by the client-side verification path; the payment ledger
/// is written only by webhook events.
pub async fn confirm_order(
    store: &dyn Datastore,
    order_id: &str,
    payment_id: &str,
) -> Result<usize, StoreError> {
    transition_order(
        store,
        order_id,
        BookingStatus::Confirmed,
        vec![
            (
                "payment_id".to_string(),
                FieldWrite::Set(Value::String(payment_id.to_string())),
            ),
            (
                "payment_verified_at".to_string(),
                FieldWrite::Set(Value::String(now_rfc3339())),
            ),
        ],
    )
    .await
}

async fn transition_order(
    store: &dyn Datastore,
    order_id: &str,
    target: BookingStatus,
    extra: Vec<(String, FieldWrite)>,
) -> Result<usize, StoreError> {
    let bookings = store
        .query(
            collections::BOOKINGS,
            Query::new().filter("order_id", FilterOp::Equal, order_id),
        )
        .await?;

    let mut transitioned = 0;
    for booking in bookings {
        let current: Option<BookingStatus> = booking
            .get("status")
            .cloned()
            .and_then(|status| serde_json::from_value(status).ok());
        if matches!(current, Some(status) if status.is_terminal()) {
            continue;
        }

        let id = match booking.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => continue,
        };

        let mut patch = vec![(
            "status".to_string(),
            FieldWrite::Set(serde_json::to_value(target)?),
        )];
        patch.extend(extra.iter().cloned());
        store.update(collections::BOOKINGS, &id, patch).await?;
        transitioned += 1;
    }

    Ok(transitioned)
}

async fn record_payment(
    store: &dyn Datastore,
    entity: &PaymentEntity,
    event_type: &str,
) -> Result<(), StoreError> {
    let entry = to_record(&json!({
        "payment_id": entity.id,
        "order_id": entity.order_id,
        "event": event_type,
        "recorded_at": now_rfc3339(),
    }))?;
    store
        .insert_new(collections::PAYMENTS, &entity.id, entry)
        .await?;
    Ok(())
}
