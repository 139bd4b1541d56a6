use axum::extract::{Json, Path, State};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{collections, ChatMessage, ChatSession, MessageRole};
use crate::state::AppState;
use crate::store::{
    from_record, now_rfc3339, to_record, Direction, FieldWrite, FilterOp, Query,
};

const USER_CHATS_LIMIT: usize = 20;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

pub async fn chat_with_nyayai(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<Value>> {
    if request.message.trim().is_empty() {
        return Err(AppError::bad_request("message must not be empty"));
    }

    let session_id = request
        .session_id
        .unwrap_or_else(|| format!("{}_{}", user.uid, Utc::now().timestamp_millis()));

    let existing = state.store.get(collections::CHATS, &session_id).await?;
    let history: Vec<ChatMessage> = match &existing {
        Some(record) => {
            let session: ChatSession = from_record(record.clone())?;
            if session.user_id != user.uid {
                return Err(AppError::forbidden("access denied"));
            }
            session.messages
        }
        None => Vec::new(),
    };

    let reply = state
        .assistant
        .reply(&history, &request.message)
        .await
        .map_err(AppError::internal)?;

    let user_message = ChatMessage {
        role: MessageRole::User,
        content: request.message,
        timestamp: now_rfc3339(),
    };
    let assistant_message = ChatMessage {
        role: MessageRole::Assistant,
        content: reply.clone(),
        timestamp: now_rfc3339(),
    };

    if existing.is_some() {
        state
            .store
            .update(
                collections::CHATS,
                &session_id,
                vec![(
                    "messages".to_string(),
                    FieldWrite::ArrayUnion(vec![
                        serde_json::to_value(&user_message)?,
                        serde_json::to_value(&assistant_message)?,
                    ]),
                )],
            )
            .await?;
    } else {
        let now = now_rfc3339();
        let session = ChatSession {
            session_id: session_id.clone(),
            user_id: user.uid.clone(),
            messages: vec![user_message, assistant_message],
            created_at: now.clone(),
            updated_at: now,
        };
        state
            .store
            .set(collections::CHATS, &session_id, to_record(&session)?, false)
            .await?;
    }

    Ok(Json(json!({
        "success": true,
        "response": reply,
        "session_id": session_id,
    })))
}

pub async fn get_chat_history(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(session_id): Path<String>,
) -> AppResult<Json<Value>> {
    let record = state
        .store
        .get(collections::CHATS, &session_id)
        .await?
        .ok_or_else(AppError::not_found)?;

    if record.get("user_id") != Some(&Value::String(user.uid.clone())) {
        return Err(AppError::forbidden("access denied"));
    }

    Ok(Json(json!({
        "success": true,
        "chat": record,
    })))
}

pub async fn get_user_chats(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Value>> {
    let records = state
        .store
        .query(
            collections::CHATS,
            Query::new()
                .filter("user_id", FilterOp::Equal, user.uid.clone())
                .order_by("updated_at", Direction::Descending)
                .limit(USER_CHATS_LIMIT),
        )
        .await?;

    let chats: Vec<Value> = records
        .into_iter()
        .map(|record| {
            let messages = record
                .get("messages")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let last_message = messages
                .last()
                .and_then(|message| message.get("content"))
                .cloned()
                .unwrap_or(Value::Null);

            json!({
                "session_id": record.get("session_id").cloned().unwrap_or(Value::Null),
                "last_message": last_message,
                "updated_at": record.get("updated_at").cloned().unwrap_or(Value::Null),
                "message_count": messages.len(),
            })
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "chats": chats,
    })))
}
