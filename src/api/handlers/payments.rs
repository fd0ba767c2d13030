use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    api::state::AppState,
    error::{AppError, Result},
    service::{SessionVerification, WebhookAck},
};

/// Stripe webhook endpoint. Signature verification consumes the body bytes
/// exactly as received, so this handler extracts `Bytes` instead of a parsed
/// JSON value.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::SignatureInvalid)?;

    let payload = std::str::from_utf8(&body).map_err(|_| AppError::SignatureInvalid)?;

    let ack = state
        .booking_service
        .handle_webhook(payload, signature)
        .await?;

    Ok(Json(ack))
}

#[derive(Debug, Deserialize)]
pub struct VerifySessionParams {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct VerifySessionResponse {
    pub success: bool,
    #[serde(flatten)]
    pub verification: SessionVerification,
}

pub async fn verify_session(
    State(state): State<AppState>,
    Query(params): Query<VerifySessionParams>,
) -> Result<Json<VerifySessionResponse>> {
    let verification = state
        .booking_service
        .verify_session(&params.session_id)
        .await?;

    Ok(Json(VerifySessionResponse {
        success: true,
        verification,
    }))
}
