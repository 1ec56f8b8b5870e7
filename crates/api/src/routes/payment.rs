//! Payment intent endpoints, thin pass-throughs to the gateway.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::Money;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::routes::booking::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub payment_intent_id: String,
}

/// POST /payment/create-intent — create a payment intent the frontend
/// can confirm.
#[tracing::instrument(skip_all)]
pub async fn create_intent(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateIntentRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !req.amount.is_finite() || req.amount <= 0.0 {
        return Err(ApiError::BadRequest("amount must be positive".to_string()));
    }
    let currency = req.currency.unwrap_or_else(|| "SEK".to_string());

    let intent = state
        .gateway
        .create_payment_intent(Money::from_major(req.amount), &currency, req.metadata)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "paymentIntentId": intent.payment_intent_id,
            "clientSecret": intent.client_secret,
        },
    })))
}

/// POST /payment/verify — report the current state of an intent.
#[tracing::instrument(skip_all)]
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.payment_intent_id.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "paymentIntentId is required".to_string(),
        ));
    }

    let verification = state.gateway.verify_payment(&req.payment_intent_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "paymentIntentId": req.payment_intent_id,
            "status": verification.status,
            "verified": verification.succeeded(),
            "amount": verification.amount.major_units(),
            "currency": verification.currency,
        },
    })))
}
