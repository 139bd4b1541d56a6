use axum::extract::{Json, Path, Query as QueryParams, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{collections, DocumentRecord, DocumentType};
use crate::state::AppState;
use crate::store::{fetch_page, to_record, Direction, FilterOp, Query};

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

fn inline_content_disposition(filename: &str) -> Option<HeaderValue> {
    if filename.is_empty() {
        return None;
    }

    let sanitized: String = filename
        .chars()
        .map(|ch| match ch {
            '"' | '\\' => '_',
            _ => ch,
        })
        .collect();

    let encoded =
        percent_encoding::utf8_percent_encode(&sanitized, percent_encoding::NON_ALPHANUMERIC);
    HeaderValue::from_str(&format!(
        "inline; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    ))
    .ok()
}

#[derive(Deserialize)]
pub struct GenerateDocumentRequest {
    pub document_type: String,
    pub data: Value,
}

#[derive(Deserialize)]
pub struct DocumentListQuery {
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

pub async fn generate_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<GenerateDocumentRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let doc_type = DocumentType::parse(&request.document_type).ok_or_else(|| {
        AppError::bad_request(format!(
            "unknown document type {:?}",
            request.document_type
        ))
    })?;

    let bytes = state
        .renderer
        .render(doc_type, &request.data)
        .map_err(|err| AppError::bad_request(format!("document rendering failed: {err}")))?;

    let id = Uuid::new_v4().to_string();
    let storage_path = format!("documents/{}/{id}", user.uid);
    state
        .blobs
        .upload(
            &storage_path,
            bytes,
            &user.uid,
            Some("text/plain; charset=utf-8".to_string()),
        )
        .await?;

    let record = DocumentRecord {
        id: id.clone(),
        user_id: user.uid.clone(),
        doc_type,
        storage_path,
        data: request.data,
        status: "generated".to_string(),
        created_at: crate::store::now_rfc3339(),
    };
    state
        .store
        .set(collections::DOCUMENTS, &id, to_record(&record)?, false)
        .await?;

    tracing::info!(document_id = %id, doc_type = doc_type.as_str(), "document generated");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Document generated successfully",
            "document_id": id,
        })),
    ))
}

pub async fn list_documents(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    QueryParams(params): QueryParams<DocumentListQuery>,
) -> AppResult<Json<Value>> {
    let page_size = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(AppError::bad_request(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }

    let mut query = Query::new()
        .filter("user_id", FilterOp::Equal, user.uid.clone())
        .order_by("created_at", Direction::Descending);
    if let Some(cursor) = params.cursor {
        query = query.start_after(cursor);
    }

    let page = fetch_page(
        state.store.as_ref(),
        collections::DOCUMENTS,
        query,
        "created_at",
        page_size,
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "documents": page.records,
        "next_cursor": page.next_cursor,
    })))
}

pub async fn download_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(document_id): Path<String>,
) -> AppResult<Json<Value>> {
    let record = state
        .store
        .get(collections::DOCUMENTS, &document_id)
        .await?
        .ok_or_else(AppError::not_found)?;

    let storage_path = record
        .get("storage_path")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::internal("document record has no storage path"))?;

    let ttl = state.config.signed_url_ttl_minutes;
    let token = state
        .blobs
        .issue_signed_url(storage_path, &user.uid, user.is_admin, ttl)
        .await?;

    Ok(Json(json!({
        "success": true,
        "url": format!("/download/{token}"),
        "expires_in_minutes": ttl,
    })))
}

pub async fn download_with_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<impl IntoResponse> {
    let path = state.blobs.resolve_signed_url(&token).await?;

    // The token is the authorization; ownership was checked at issue time.
    let object = state.blobs.fetch(&path, "", true).await?;

    let mut headers = HeaderMap::new();
    if let Some(content_type) = object
        .content_type
        .as_deref()
        .and_then(|value| HeaderValue::from_str(value).ok())
    {
        headers.insert(header::CONTENT_TYPE, content_type);
    }
    let filename = path.rsplit('/').next().unwrap_or_default();
    if let Some(disposition) = inline_content_disposition(filename) {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }

    Ok((StatusCode::OK, headers, object.bytes))
}
