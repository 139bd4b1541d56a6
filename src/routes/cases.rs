use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{collections, Case, CaseNote};
use crate::state::AppState;
use crate::store::{now_rfc3339, to_record, Direction, FieldWrite, FilterOp, Query, Record};

#[derive(Deserialize)]
pub struct CreateCaseRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub court: Option<String>,
    #[serde(default)]
    pub case_number: Option<String>,
    #[serde(default)]
    pub hearing_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct AddNoteRequest {
    pub content: String,
}

async fn load_owned_case(state: &AppState, case_id: &str, uid: &str) -> AppResult<Record> {
    let record = state
        .store
        .get(collections::CASES, case_id)
        .await?
        .ok_or_else(AppError::not_found)?;

    if record.get("user_id") != Some(&Value::String(uid.to_string())) {
        return Err(AppError::forbidden("access denied"));
    }
    Ok(record)
}

pub async fn create_case(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateCaseRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let now = now_rfc3339();
    let case = Case {
        id: String::new(),
        user_id: user.uid.clone(),
        title: request.title,
        description: request.description,
        court: request.court,
        case_number: request.case_number,
        hearing_date: request.hearing_date,
        status: request.status.unwrap_or_else(|| "active".to_string()),
        notes: Vec::new(),
        documents: Vec::new(),
        created_at: String::new(),
        updated_at: now,
    };

    let case_id = state
        .store
        .add(collections::CASES, to_record(&case)?)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "case_id": case_id,
            "message": "Case created successfully",
        })),
    ))
}

pub async fn list_cases(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Value>> {
    let records = state
        .store
        .query(
            collections::CASES,
            Query::new()
                .filter("user_id", FilterOp::Equal, user.uid.clone())
                .order_by("updated_at", Direction::Descending),
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "cases": records,
    })))
}

pub async fn get_case(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(case_id): Path<String>,
) -> AppResult<Json<Value>> {
    let record = load_owned_case(&state, &case_id, &user.uid).await?;

    Ok(Json(json!({
        "success": true,
        "case": record,
    })))
}

pub async fn add_case_note(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(case_id): Path<String>,
    Json(request): Json<AddNoteRequest>,
) -> AppResult<Json<Value>> {
    load_owned_case(&state, &case_id, &user.uid).await?;

    let note = CaseNote {
        content: request.content,
        timestamp: now_rfc3339(),
    };
    state
        .store
        .update(
            collections::CASES,
            &case_id,
            vec![(
                "notes".to_string(),
                FieldWrite::ArrayUnion(vec![serde_json::to_value(&note)?]),
            )],
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Note added successfully",
    })))
}
