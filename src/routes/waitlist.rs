use axum::extract::{Json, State};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::AppResult;
use crate::models::{collections, LawyerInterestEntry, WaitlistEntry};
use crate::state::AppState;
use crate::store::{to_record, Query, StoreError};

#[derive(Deserialize)]
pub struct WaitlistRequest {
    pub name: String,
    pub email: String,
    pub city: String,
    pub user_type: String,
}

#[derive(Deserialize)]
pub struct LawyerInterestRequest {
    pub name: String,
    pub email: String,
    pub city: String,
    pub practice_area: String,
    pub experience: String,
}

pub async fn join_waitlist(
    State(state): State<AppState>,
    Json(request): Json<WaitlistRequest>,
) -> AppResult<Json<Value>> {
    let entry = WaitlistEntry {
        name: request.name,
        email: request.email.clone(),
        city: request.city,
        user_type: request.user_type,
        status: "pending".to_string(),
        created_at: String::new(),
    };

    let email_value = Value::String(request.email);
    match state
        .store
        .add_unique(
            collections::WAITLIST,
            "email",
            &email_value,
            to_record(&entry)?,
        )
        .await
    {
        Ok(id) => {
            info!(waitlist_id = %id, "waitlist signup");
            Ok(Json(json!({
                "success": true,
                "waitlist_id": id,
                "message": "You're on the waitlist! We'll notify you at launch.",
            })))
        }
        // Resubmitting the same email is a friendly success, not an error.
        Err(StoreError::AlreadyExists(_)) => Ok(Json(json!({
            "success": true,
            "message": "You're already on the waitlist!",
        }))),
        Err(other) => Err(other.into()),
    }
}

pub async fn waitlist_count(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let records = state.store.query(collections::WAITLIST, Query::new()).await?;
    Ok(Json(json!({ "count": records.len() })))
}

pub async fn register_lawyer_interest(
    State(state): State<AppState>,
    Json(request): Json<LawyerInterestRequest>,
) -> AppResult<Json<Value>> {
    let entry = LawyerInterestEntry {
        name: request.name,
        email: request.email.clone(),
        city: request.city,
        practice_area: request.practice_area,
        experience: request.experience,
        status: "pending".to_string(),
        created_at: String::new(),
    };

    let email_value = Value::String(request.email);
    match state
        .store
        .add_unique(
            collections::LAWYER_INTEREST,
            "email",
            &email_value,
            to_record(&entry)?,
        )
        .await
    {
        Ok(id) => {
            info!(interest_id = %id, "lawyer interest signup");
            Ok(Json(json!({
                "success": true,
                "interest_id": id,
                "message": "Thanks for your interest! We'll be in touch soon.",
            })))
        }
        Err(StoreError::AlreadyExists(_)) => Ok(Json(json!({
            "success": true,
            "message": "You've already registered your interest!",
        }))),
        Err(other) => Err(other.into()),
    }
}

pub async fn lawyer_interest_count(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let records = state
        .store
        .query(collections::LAWYER_INTEREST, Query::new())
        .await?;
    Ok(Json(json!({ "count": records.len() })))
}
