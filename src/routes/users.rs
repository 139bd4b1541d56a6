use axum::extract::{Json, State};
use serde_json::json;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{collections, UserProfile};
use crate::state::AppState;
use crate::store::{now_rfc3339, to_record};

pub async fn save_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(profile): Json<UserProfile>,
) -> AppResult<Json<serde_json::Value>> {
    user.require_registered()?;

    let mut record = to_record(&profile)?;
    record.insert("uid".to_string(), user.uid.clone().into());
    let now = now_rfc3339();
    record.insert("created_at".to_string(), now.clone().into());
    record.insert("updated_at".to_string(), now.into());

    state
        .store
        .set(collections::USERS, &user.uid, record, true)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Profile saved successfully",
        "user_id": user.uid,
    })))
}

pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<serde_json::Value>> {
    let record = state
        .store
        .get(collections::USERS, &user.uid)
        .await?
        .ok_or_else(AppError::not_found)?;

    Ok(Json(json!({
        "success": true,
        "profile": record,
    })))
}
