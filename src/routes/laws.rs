use axum::extract::{Json, Path, Query as QueryParams, State};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::collections;
use crate::state::AppState;
use crate::store::{FilterOp, Query};

#[derive(Deserialize)]
pub struct LawListQuery {
    pub category: Option<String>,
    pub state: Option<String>,
    pub search: Option<String>,
}

pub async fn list_laws(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<LawListQuery>,
) -> AppResult<Json<Value>> {
    let mut query = Query::new();
    if let Some(category) = params.category {
        query = query.filter("category", FilterOp::Equal, category);
    }
    if let Some(law_state) = params.state {
        query = query.filter("state", FilterOp::Equal, law_state);
    }

    let records = state.store.query(collections::LAWS, query).await?;

    let search = params.search.map(|term| term.to_lowercase());
    let laws: Vec<Value> = records
        .into_iter()
        .filter(|record| match &search {
            Some(term) => record
                .get("title")
                .and_then(Value::as_str)
                .is_some_and(|title| title.to_lowercase().contains(term)),
            None => true,
        })
        .map(Value::Object)
        .collect();

    Ok(Json(json!({
        "success": true,
        "count": laws.len(),
        "laws": laws,
    })))
}

pub async fn get_law(
    State(state): State<AppState>,
    Path(law_id): Path<String>,
) -> AppResult<Json<Value>> {
    let record = state
        .store
        .get(collections::LAWS, &law_id)
        .await?
        .ok_or_else(AppError::not_found)?;

    Ok(Json(json!({
        "success": true,
        "law": record,
    })))
}
