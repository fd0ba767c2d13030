use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::{
    api::state::AppState,
    error::{AppError, Result},
    service::{BookingRequest, BookingSummary, CreatedBooking, CreatedCheckout, RequestContext},
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";
const RECENT_BOOKINGS_LIMIT: i64 = 5;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingBody {
    pub booking_data: BookingRequest,
    pub locale: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateBookingResponse {
    pub success: bool,
    #[serde(flatten)]
    pub created: CreatedBooking,
}

#[derive(Debug, Serialize)]
pub struct CreateCheckoutResponse {
    pub success: bool,
    #[serde(flatten)]
    pub created: CreatedCheckout,
}

fn request_context(headers: &HeaderMap) -> RequestContext {
    RequestContext {
        origin: headers
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string()),
        host: headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string()),
    }
}

pub async fn create_cash(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateBookingBody>,
) -> Result<(StatusCode, Json<CreateBookingResponse>)> {
    let ctx = request_context(&headers);
    let created = state
        .booking_service
        .create_cash_booking(body.booking_data, body.locale.as_deref(), &ctx)
        .await?;

    Ok((
        StatusCode::OK,
        Json(CreateBookingResponse {
            success: true,
            created,
        }),
    ))
}

pub async fn create_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateBookingBody>,
) -> Result<(StatusCode, Json<CreateCheckoutResponse>)> {
    let ctx = request_context(&headers);
    let created = state
        .booking_service
        .create_card_checkout(body.booking_data, body.locale.as_deref(), &ctx)
        .await?;

    Ok((
        StatusCode::OK,
        Json(CreateCheckoutResponse {
            success: true,
            created,
        }),
    ))
}

#[derive(Debug, Serialize)]
pub struct RecentBookingsResponse {
    pub success: bool,
    pub bookings: Vec<BookingSummary>,
}

/// Ops-only booking inspection. Gated on a constant-time token comparison;
/// denied when the token is unset or the header does not match.
pub async fn recent(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RecentBookingsResponse>> {
    let expected = state
        .settings
        .server
        .admin_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Forbidden)?;

    let provided = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if provided.as_bytes().ct_eq(expected.as_bytes()).unwrap_u8() != 1 {
        return Err(AppError::Forbidden);
    }

    let bookings = state
        .booking_service
        .recent_bookings(RECENT_BOOKINGS_LIMIT)
        .await?;

    Ok(Json(RecentBookingsResponse {
        success: true,
        bookings,
    }))
}
