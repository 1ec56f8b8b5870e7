//! Availability search endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use chrono::NaiveDate;
use providers::AvailabilityQuery;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::routes::booking::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub guests: Option<u32>,
}

/// GET /availability/search — merged offers across the published rate
/// codes. Rate codes that fail upstream are reported, not fatal.
#[tracing::instrument(skip(state))]
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if params.end_date <= params.start_date {
        return Err(ApiError::BadRequest(
            "endDate must be after startDate".to_string(),
        ));
    }
    let guests = params.guests.unwrap_or(1);
    if guests == 0 {
        return Err(ApiError::BadRequest(
            "guests must be at least 1".to_string(),
        ));
    }

    let query = AvailabilityQuery {
        start_date: params.start_date,
        end_date: params.end_date,
        guests,
    };
    let merged = state.availability.search(&query).await;
    let total = merged.properties.len();

    Ok(Json(json!({
        "success": true,
        "data": merged.properties,
        "searchParams": {
            "startDate": params.start_date,
            "endDate": params.end_date,
            "guests": guests,
            "nights": (params.end_date - params.start_date).num_days(),
        },
        "total": total,
        "failedRateCodes": merged.failed_rate_codes,
    })))
}

/// GET /availability/buildings — the provider's building list, as-is.
#[tracing::instrument(skip(state))]
pub async fn buildings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let buildings = state.booking_api.buildings().await?;
    let total = buildings.len();

    Ok(Json(json!({
        "success": true,
        "data": buildings,
        "total": total,
    })))
}
