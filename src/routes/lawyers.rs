use axum::extract::{Json, Path, Query as QueryParams, State};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::collections;
use crate::state::AppState;
use crate::store::{FilterOp, Query};

#[derive(Deserialize)]
pub struct LawyerListQuery {
    pub city: Option<String>,
    pub specialization: Option<String>,
    pub language: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
}

pub async fn list_lawyers(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<LawyerListQuery>,
) -> AppResult<Json<Value>> {
    let mut query = Query::new();
    if let Some(city) = params.city {
        query = query.filter("city", FilterOp::Equal, city);
    }
    if let Some(specialization) = params.specialization {
        query = query.filter("specialization", FilterOp::ArrayContains, specialization);
    }
    if let Some(language) = params.language {
        query = query.filter("languages", FilterOp::ArrayContains, language);
    }

    let records = state.store.query(collections::LAWYERS, query).await?;

    // Price bounds are applied after the query, the backing store only
    // supports equality and array-membership filters.
    let lawyers: Vec<Value> = records
        .into_iter()
        .filter(|record| {
            let price = record.get("price").and_then(Value::as_i64).unwrap_or(0);
            if params.min_price.is_some_and(|min| price < min) {
                return false;
            }
            if params.max_price.is_some_and(|max| price > max) {
                return false;
            }
            true
        })
        .map(Value::Object)
        .collect();

    Ok(Json(json!({
        "success": true,
        "count": lawyers.len(),
        "lawyers": lawyers,
    })))
}

pub async fn get_lawyer(
    State(state): State<AppState>,
    Path(lawyer_id): Path<String>,
) -> AppResult<Json<Value>> {
    let record = state
        .store
        .get(collections::LAWYERS, &lawyer_id)
        .await?
        .ok_or_else(AppError::not_found)?;

    Ok(Json(json!({
        "success": true,
        "lawyer": record,
    })))
}
