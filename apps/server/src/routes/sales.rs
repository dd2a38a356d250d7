//! # Sales Endpoints
//!
//! ```text
//! POST /api/sales                       body: UncheckedSaleRequest → 201 Sale
//! GET  /api/sales/{store_id}            ?startDate&endDate → [Sale] newest first
//! GET  /api/sales/{store_id}/metrics    ?startDate&endDate → SalesMetrics
//! ```
//!
//! Dates are RFC 3339 timestamps or plain `YYYY-MM-DD` days. A plain day
//! used as `endDate` covers that whole day.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use tally_core::validation::{validate_sale_request, UncheckedSaleRequest};
use tally_core::{DateRange, Sale, SalesMetrics, ValidationError};
use tracing::info;

use super::owned_store;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sales", post(create))
        .route("/api/sales/{store_id}", get(list))
        .route("/api/sales/{store_id}/metrics", get(metrics))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl RangeQuery {
    pub fn to_range(&self) -> Result<DateRange, ValidationError> {
        Ok(DateRange {
            start: parse_bound("startDate", self.start_date.as_deref(), NaiveTime::MIN)?,
            end: parse_bound("endDate", self.end_date.as_deref(), end_of_day())?,
        })
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(NaiveTime::MIN)
}

/// Parses one bound; a bare date takes `day_time` as its time of day.
fn parse_bound(
    field: &str,
    raw: Option<&str>,
    day_time: NaiveTime,
) -> Result<Option<DateTime<Utc>>, ValidationError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };

    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(at.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|day| Some(day.and_time(day_time).and_utc()))
        .map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected YYYY-MM-DD or an RFC 3339 timestamp".to_string(),
        })
}

async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<UncheckedSaleRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Sale>)> {
    let Json(unchecked) = payload?;
    let request = validate_sale_request(unchecked)?;
    owned_store(&state, &request.store, &user).await?;

    let sale = state.db.sales().create_sale(&request).await?;
    info!(
        sale = %sale.id,
        store = %sale.store,
        total = %sale.total,
        method = %sale.payment_method,
        "Sale recorded"
    );
    Ok((StatusCode::CREATED, Json(sale)))
}

async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    store_id: Result<Path<String>, PathRejection>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Sale>>> {
    let Path(store_id) = store_id?;
    let Query(query) = query?;
    let range = query.to_range()?;

    let store = owned_store(&state, &store_id, &user).await?;
    Ok(Json(state.db.sales().list_by_store(&store.id, &range).await?))
}

async fn metrics(
    State(state): State<AppState>,
    user: AuthUser,
    store_id: Result<Path<String>, PathRejection>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> ApiResult<Json<SalesMetrics>> {
    let Path(store_id) = store_id?;
    let Query(query) = query?;
    let range = query.to_range()?;

    let store = owned_store(&state, &store_id, &user).await?;
    Ok(Json(state.db.sales().metrics(&store.id, &range).await?))
}
