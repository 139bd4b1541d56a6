use axum::extract::{Json, Multipart, Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::mailer::send_in_background;
use crate::models::{collections, LawyerApplication, LawyerProfile, VerificationStatus};
use crate::state::AppState;
use crate::store::{from_record, to_record, FieldWrite, FilterOp, Query, Record, StoreError};

#[derive(Deserialize)]
pub struct ApplyRequest {
    pub name: String,
    pub bar_council_id: String,
    pub specialization: Vec<String>,
    pub languages: Vec<String>,
    pub city: String,
    pub state: String,
    pub experience: i64,
    pub price: i64,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Deserialize)]
pub struct RejectRequest {
    pub reason: String,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct ApproveRequest {
    #[serde(default)]
    pub admin_notes: Option<String>,
}

async fn find_application(
    state: &AppState,
    owner_user_id: &str,
) -> AppResult<Option<LawyerApplication>> {
    let mut records = state
        .store
        .query(
            collections::LAWYER_APPLICATIONS,
            Query::new().filter("owner_user_id", FilterOp::Equal, owner_user_id.to_string()),
        )
        .await?;

    match records.pop() {
        Some(record) => Ok(Some(from_record(record)?)),
        None => Ok(None),
    }
}

async fn load_application(state: &AppState, id: &str) -> AppResult<LawyerApplication> {
    let record = state
        .store
        .get(collections::LAWYER_APPLICATIONS, id)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(from_record(record)?)
}

fn is_decided(application: &LawyerApplication) -> bool {
    matches!(
        application.verification_status,
        VerificationStatus::Approved | VerificationStatus::Rejected
    )
}

/// Looks up the applicant's profile email and queues a decision notice.
/// Applicants without a stored email are skipped.
async fn notify_applicant(state: &AppState, owner_user_id: &str, subject: &str, body: String) {
    let profile = match state.store.get(collections::USERS, owner_user_id).await {
        Ok(record) => record,
        Err(err) => {
            error!(error = %err, "failed to load applicant profile for notification");
            return;
        }
    };
    let Some(email) = profile
        .as_ref()
        .and_then(|record| record.get("email"))
        .and_then(Value::as_str)
    else {
        return;
    };
    send_in_background(
        state.mailer.clone(),
        email.to_string(),
        subject.to_string(),
        body,
    );
}

pub async fn apply(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<ApplyRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    user.require_registered()?;

    let application = LawyerApplication {
        id: String::new(),
        owner_user_id: user.uid.clone(),
        name: request.name,
        bar_council_id: request.bar_council_id,
        specialization: request.specialization,
        languages: request.languages,
        city: request.city,
        state: request.state,
        experience: request.experience,
        price: request.price,
        bio: request.bio,
        verification_status: VerificationStatus::Pending,
        verified: false,
        verification_docs: Vec::new(),
        admin_notes: None,
        rejected_reason: None,
        lawyer_profile_id: None,
        created_at: String::new(),
    };

    let owner_value = Value::String(user.uid.clone());
    let id = state
        .store
        .add_unique(
            collections::LAWYER_APPLICATIONS,
            "owner_user_id",
            &owner_value,
            to_record(&application)?,
        )
        .await
        .map_err(|err| match err {
            StoreError::AlreadyExists(_) => {
                AppError::conflict("an application already exists for this account")
            }
            other => other.into(),
        })?;

    info!(application_id = %id, "lawyer application submitted");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "application_id": id,
            "message": "Application submitted successfully",
        })),
    ))
}

pub async fn upload_verification_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> AppResult<Json<Value>> {
    let application = find_application(&state, &user.uid)
        .await?
        .ok_or_else(AppError::not_found)?;
    if is_decided(&application) {
        return Err(AppError::conflict("application has already been decided"));
    }

    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        error!(error = %err, "invalid multipart data");
        AppError::bad_request(format!("invalid multipart data: {err}"))
    })? {
        if field.name() == Some("file") {
            filename = field.file_name().map(|name| name.to_string());
            content_type = field.content_type().map(|mime| mime.to_string());
            let data = field.bytes().await.map_err(|err| {
                error!(error = %err, "failed to read file bytes");
                AppError::bad_request(format!("failed to read file bytes: {err}"))
            })?;
            file_bytes = Some(data.to_vec());
        }
    }

    let file_bytes =
        file_bytes.ok_or_else(|| AppError::bad_request("file field is required"))?;
    if file_bytes.is_empty() {
        return Err(AppError::bad_request("file field must not be empty"));
    }
    let filename = filename
        .filter(|name| !name.is_empty() && !name.contains('/'))
        .ok_or_else(|| AppError::bad_request("a plain filename is required"))?;

    let path = format!("verification_docs/{}/{filename}", user.uid);
    state
        .blobs
        .upload(&path, file_bytes, &user.uid, content_type)
        .await?;

    state
        .store
        .update(
            collections::LAWYER_APPLICATIONS,
            &application.id,
            vec![
                (
                    "verification_docs".to_string(),
                    FieldWrite::ArrayUnion(vec![Value::String(path.clone())]),
                ),
                (
                    "verification_status".to_string(),
                    FieldWrite::Set(serde_json::to_value(
                        VerificationStatus::DocumentsUploaded,
                    )?),
                ),
            ],
        )
        .await?;

    info!(application_id = %application.id, %path, "verification document uploaded");

    Ok(Json(json!({
        "success": true,
        "message": "Document uploaded successfully",
        "path": path,
    })))
}

pub async fn application_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Value>> {
    let application = find_application(&state, &user.uid)
        .await?
        .ok_or_else(AppError::not_found)?;

    Ok(Json(json!({
        "success": true,
        "application": application,
    })))
}

pub async fn admin_list_applications(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Value>> {
    user.require_admin()?;

    let records: Vec<Record> = state
        .store
        .query(collections::LAWYER_APPLICATIONS, Query::new())
        .await?;

    Ok(Json(json!({
        "success": true,
        "count": records.len(),
        "applications": records,
    })))
}

pub async fn admin_application_documents(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(application_id): Path<String>,
) -> AppResult<Json<Value>> {
    user.require_admin()?;

    let application = load_application(&state, &application_id).await?;
    let ttl = state.config.signed_url_ttl_minutes;

    let mut documents = Vec::with_capacity(application.verification_docs.len());
    for path in &application.verification_docs {
        let token = state
            .blobs
            .issue_signed_url(path, &user.uid, true, ttl)
            .await?;
        documents.push(json!({
            "path": path,
            "url": format!("/download/{token}"),
            "expires_in_minutes": ttl,
        }));
    }

    Ok(Json(json!({
        "success": true,
        "documents": documents,
    })))
}

pub async fn admin_approve_application(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(application_id): Path<String>,
    Json(request): Json<ApproveRequest>,
) -> AppResult<Json<Value>> {
    user.require_admin()?;

    let application = load_application(&state, &application_id).await?;
    if is_decided(&application) {
        return Err(AppError::conflict("application has already been decided"));
    }

    let profile = LawyerProfile {
        id: String::new(),
        owner_user_id: Some(application.owner_user_id.clone()),
        name: application.name.clone(),
        bar_council_id: application.bar_council_id.clone(),
        specialization: application.specialization.clone(),
        languages: application.languages.clone(),
        city: application.city.clone(),
        state: application.state.clone(),
        experience: application.experience,
        price: application.price,
        rating: 0.0,
        reviews: 0,
        bio: application.bio.clone(),
        verified: true,
        created_at: String::new(),
    };
    let lawyer_id = state
        .store
        .add(collections::LAWYERS, to_record(&profile)?)
        .await?;

    let mut patch = vec![
        (
            "verification_status".to_string(),
            FieldWrite::Set(serde_json::to_value(VerificationStatus::Approved)?),
        ),
        ("verified".to_string(), FieldWrite::Set(Value::Bool(true))),
        (
            "lawyer_profile_id".to_string(),
            FieldWrite::Set(Value::String(lawyer_id.clone())),
        ),
    ];
    if let Some(notes) = request.admin_notes {
        patch.push(("admin_notes".to_string(), FieldWrite::Set(Value::String(notes))));
    }
    state
        .store
        .update(collections::LAWYER_APPLICATIONS, &application_id, patch)
        .await?;

    info!(application_id = %application_id, %lawyer_id, "lawyer application approved");
    notify_applicant(
        &state,
        &application.owner_user_id,
        "Your lawyer application has been approved",
        format!(
            "Congratulations {}, your application has been approved and your profile is now live.",
            application.name
        ),
    )
    .await;

    Ok(Json(json!({
        "success": true,
        "message": "Application approved",
        "lawyer_id": lawyer_id,
    })))
}

pub async fn admin_reject_application(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(application_id): Path<String>,
    Json(request): Json<RejectRequest>,
) -> AppResult<Json<Value>> {
    user.require_admin()?;

    let application = load_application(&state, &application_id).await?;
    if is_decided(&application) {
        return Err(AppError::conflict("application has already been decided"));
    }

    let mut patch = vec![
        (
            "verification_status".to_string(),
            FieldWrite::Set(serde_json::to_value(VerificationStatus::Rejected)?),
        ),
        (
            "rejected_reason".to_string(),
            FieldWrite::Set(Value::String(request.reason.clone())),
        ),
    ];
    if let Some(notes) = request.admin_notes {
        patch.push(("admin_notes".to_string(), FieldWrite::Set(Value::String(notes))));
    }
    state
        .store
        .update(collections::LAWYER_APPLICATIONS, &application_id, patch)
        .await?;

    info!(application_id = %application_id, "lawyer application rejected");
    notify_applicant(
        &state,
        &application.owner_user_id,
        "Update on your lawyer application",
        format!(
            "Your application could not be approved at this time. Reason: {}",
            request.reason
        ),
    )
    .await;

    Ok(Json(json!({
        "success": true,
        "message": "Application rejected",
    })))
}
