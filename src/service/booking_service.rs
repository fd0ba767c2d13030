use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    config::Settings,
    domain::{
        format_cents, generate_booking_reference, Booking, BookingStatus, PaymentMethod,
        PaymentStatus, ServiceType, VehicleClass,
    },
    error::{AppError, Result},
    notifications::{Delivery, NotificationReport, NotificationSender},
    payments::{GatewayEvent, PaymentGateway, SESSION_ID_PREFIX},
    pricing,
    repository::BookingRepository,
};

const SUPPORTED_LOCALES: &[&str] = &["en", "de", "fr", "es", "it"];
const DEFAULT_LOCALE: &str = "en";

/// Booking submission as received from the website. The client may echo its
/// displayed total in `quoted_total`; the server reprices every booking and
/// never persists that value.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub service_type: ServiceType,
    pub vehicle: Option<VehicleClass>,
    #[serde(default)]
    pub pickup_address: String,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    pub dropoff_address: Option<String>,
    pub dropoff_lat: Option<f64>,
    pub dropoff_lng: Option<f64>,
    pub pickup_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub distance_km: f64,
    #[serde(default)]
    pub duration_min: i64,
    #[serde(default)]
    pub passengers: i64,
    #[serde(default)]
    pub luggage: i64,
    #[serde(default)]
    pub child_seats: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub flight_number: Option<String>,
    pub special_requests: Option<String>,
    pub quoted_total: Option<f64>,
}

/// Origin material extracted from the incoming request. Only used after
/// validation — an attacker-controlled `Origin` header is never trusted
/// blindly.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub origin: Option<String>,
    pub host: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBooking {
    pub booking_id: String,
    pub redirect_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedCheckout {
    pub booking_id: String,
    pub checkout_url: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifiedPaymentStatus {
    Paid,
    Unpaid,
    Processing,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionVerification {
    pub payment_status: VerifiedPaymentStatus,
    pub booking: BookingDetails,
}

/// Formatted view of a booking's trip, customer and price fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    pub booking_id: String,
    pub service_type: ServiceType,
    pub pickup_address: String,
    pub dropoff_address: Option<String>,
    pub pickup_at: String,
    pub vehicle: VehicleClass,
    pub passengers: i64,
    pub luggage: i64,
    pub child_seats: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub flight_number: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub booking_status: BookingStatus,
    pub base_price: String,
    pub distance_charge: String,
    pub airport_fee: String,
    pub child_seats_charge: String,
    pub total_price: String,
    pub currency: String,
}

impl From<&Booking> for BookingDetails {
    fn from(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id.clone(),
            service_type: booking.service_type,
            pickup_address: booking.pickup_address.clone(),
            dropoff_address: booking.dropoff_address.clone(),
            pickup_at: booking.pickup_at.to_rfc3339(),
            vehicle: booking.vehicle,
            passengers: booking.passengers,
            luggage: booking.luggage,
            child_seats: booking.child_seats,
            customer_name: booking.customer_name.clone(),
            customer_email: booking.customer_email.clone(),
            customer_phone: booking.customer_phone.clone(),
            flight_number: booking.flight_number.clone(),
            payment_method: booking.payment_method,
            payment_status: booking.payment_status,
            booking_status: booking.booking_status,
            base_price: format_cents(booking.price.base_cents),
            distance_charge: format_cents(booking.price.distance_cents),
            airport_fee: format_cents(booking.price.airport_fee_cents),
            child_seats_charge: format_cents(booking.price.child_seat_cents),
            total_price: format_cents(booking.price.total_cents),
            currency: booking.currency.clone(),
        }
    }
}

/// Summary fields for the ops booking-inspection endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    pub booking_id: String,
    pub customer_name: String,
    pub pickup_address: String,
    pub pickup_at: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub total_price: String,
    pub created_at: String,
}

impl From<&Booking> for BookingSummary {
    fn from(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id.clone(),
            customer_name: booking.customer_name.clone(),
            pickup_address: booking.pickup_address.clone(),
            pickup_at: booking.pickup_at.to_rfc3339(),
            payment_method: booking.payment_method,
            payment_status: booking.payment_status,
            total_price: format_cents(booking.price.total_cents),
            created_at: booking.created_at.to_rfc3339(),
        }
    }
}

/// Orchestrates pricing, persistence, payment and notification across the
/// three booking entry points, and owns every `payment_status` transition.
pub struct BookingService {
    pub repo: Arc<dyn BookingRepository>,
    pub gateway: Option<Arc<dyn PaymentGateway>>,
    pub notifier: Option<Arc<dyn NotificationSender>>,
    pub settings: Arc<Settings>,
}

impl BookingService {
    pub fn new(
        repo: Arc<dyn BookingRepository>,
        gateway: Option<Arc<dyn PaymentGateway>>,
        notifier: Option<Arc<dyn NotificationSender>>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            repo,
            gateway,
            notifier,
            settings,
        }
    }

    pub async fn create_cash_booking(
        &self,
        request: BookingRequest,
        locale: Option<&str>,
        ctx: &RequestContext,
    ) -> Result<CreatedBooking> {
        validate_request(&request)?;
        let price = pricing::quote(
            request.service_type,
            request.vehicle,
            request.distance_km,
            request.duration_min,
            request.child_seats,
        )?;

        let booking = build_booking(request, price, PaymentMethod::Cash, None);
        let booking = self.repo.create(booking).await?;

        let report = self.dispatch_notifications(&booking).await;
        tracing::debug!(
            "Notifications for booking {}: confirmation {:?}, admin {:?}",
            booking.id,
            report.confirmation,
            report.admin
        );

        let base = resolve_public_origin(&self.settings, ctx);
        let locale = sanitize_locale(locale);
        let redirect_url = format!(
            "{}/{}/booking/confirmation?ref={}",
            base, locale, booking.id
        );

        Ok(CreatedBooking {
            booking_id: booking.id,
            redirect_url,
        })
    }

    pub async fn create_card_checkout(
        &self,
        request: BookingRequest,
        locale: Option<&str>,
        ctx: &RequestContext,
    ) -> Result<CreatedCheckout> {
        validate_request(&request)?;
        let price = pricing::quote(
            request.service_type,
            request.vehicle,
            request.distance_km,
            request.duration_min,
            request.child_seats,
        )?;

        let gateway = self.gateway.as_ref().ok_or_else(|| {
            AppError::Configuration("Card payments are not configured".to_string())
        })?;

        let mut booking = build_booking(request, price, PaymentMethod::Card, None);

        let base = resolve_public_origin(&self.settings, ctx);
        let locale = sanitize_locale(locale);
        let success_url = format!(
            "{}/{}/booking/confirmation?session_id={{CHECKOUT_SESSION_ID}}",
            base, locale
        );
        let cancel_url = format!("{}/{}/booking/cancelled", base, locale);

        let handle = gateway
            .create_checkout_session(&booking, &success_url, &cancel_url)
            .await?;

        booking.stripe_session_id = Some(handle.session_id);
        let booking = self.repo.create(booking).await?;

        Ok(CreatedCheckout {
            booking_id: booking.id,
            checkout_url: handle.checkout_url,
        })
    }

    /// Webhook completion. Delivery is at-least-once: an unknown session or a
    /// repeated `paid` event is acknowledged, not failed, so the provider
    /// does not retry futilely. Only signature failure or missing
    /// configuration surfaces as an error.
    pub async fn handle_webhook(&self, payload: &str, signature: &str) -> Result<WebhookAck> {
        let gateway = self.gateway.as_ref().ok_or_else(|| {
            AppError::Configuration("Stripe webhook handling is not configured".to_string())
        })?;

        let event = gateway.verify_webhook(payload, signature)?;

        match event {
            GatewayEvent::CheckoutCompleted {
                session_id,
                payment_status,
                payment_intent,
            } => {
                self.finalize_checkout(&session_id, payment_status.settles_booking(), payment_intent)
                    .await;
            }
            GatewayEvent::CheckoutExpired { session_id } => {
                match self.repo.find_by_session(&session_id).await {
                    Ok(Some(booking)) if booking.payment_status == PaymentStatus::Pending => {
                        tracing::info!(
                            "Checkout session {} expired; booking {} left pending for manual follow-up",
                            session_id,
                            booking.id
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!("Lookup failed for expired session {}: {}", session_id, e)
                    }
                }
            }
            GatewayEvent::PaymentFailed { payment_intent } => {
                tracing::warn!("Payment failed for intent {}", payment_intent);
            }
            GatewayEvent::Unhandled(event_type) => {
                tracing::debug!("Unhandled webhook event type: {}", event_type);
            }
        }

        Ok(WebhookAck { received: true })
    }

    async fn finalize_checkout(
        &self,
        session_id: &str,
        settled: bool,
        payment_intent: Option<String>,
    ) {
        let booking = match self.repo.find_by_session(session_id).await {
            Ok(Some(booking)) => booking,
            Ok(None) => {
                tracing::warn!("No booking linked to checkout session {}", session_id);
                return;
            }
            Err(e) => {
                tracing::error!("Lookup failed for checkout session {}: {}", session_id, e);
                return;
            }
        };

        if !settled {
            tracing::info!(
                "Checkout session {} completed without settlement; booking {} untouched",
                session_id,
                booking.id
            );
            return;
        }

        if booking.payment_status == PaymentStatus::Paid {
            tracing::debug!("Booking {} already recorded as paid", booking.id);
            return;
        }

        match self
            .repo
            .update_payment_status(&booking.id, PaymentStatus::Paid, payment_intent.as_deref())
            .await
        {
            Ok(updated) => {
                tracing::info!("Booking {} paid via checkout session {}", updated.id, session_id);
                let report = self.dispatch_notifications(&updated).await;
                tracing::debug!(
                    "Notifications for booking {}: confirmation {:?}, admin {:?}",
                    updated.id,
                    report.confirmation,
                    report.admin
                );
            }
            Err(e) => {
                tracing::error!("Failed to record payment for booking {}: {}", booking.id, e);
            }
        }
    }

    /// Read-only reconciliation poll. Reports the provider's view without
    /// ever mutating `payment_status` — the webhook owns that transition, and
    /// callers re-poll until it lands.
    pub async fn verify_session(&self, session_id: &str) -> Result<SessionVerification> {
        if !session_id.starts_with(SESSION_ID_PREFIX) {
            return Err(AppError::Validation(
                "Invalid session identifier format".to_string(),
            ));
        }

        let gateway = self.gateway.as_ref().ok_or_else(|| {
            AppError::Configuration("Card payments are not configured".to_string())
        })?;

        let state = gateway.retrieve_session(session_id).await?;

        let booking = self
            .repo
            .find_by_session(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No booking found for this session".to_string()))?;

        let payment_status = if state.payment_status.settles_booking() {
            VerifiedPaymentStatus::Paid
        } else if state.payment_status == crate::payments::GatewayPaymentStatus::Unpaid {
            VerifiedPaymentStatus::Unpaid
        } else {
            VerifiedPaymentStatus::Processing
        };

        Ok(SessionVerification {
            payment_status,
            booking: BookingDetails::from(&booking),
        })
    }

    pub async fn recent_bookings(&self, limit: i64) -> Result<Vec<BookingSummary>> {
        let bookings = self.repo.find_recent(limit).await?;
        Ok(bookings.iter().map(BookingSummary::from).collect())
    }

    async fn dispatch_notifications(&self, booking: &Booking) -> NotificationReport {
        let Some(notifier) = &self.notifier else {
            return NotificationReport::skipped();
        };

        let confirmation = match notifier.send_confirmation(booking).await {
            Ok(()) => Delivery::Sent,
            Err(e) => {
                tracing::error!("Confirmation email for booking {} failed: {}", booking.id, e);
                Delivery::Failed
            }
        };

        let admin = match notifier.send_admin_notification(booking).await {
            Ok(()) => Delivery::Sent,
            Err(e) => {
                tracing::error!("Admin email for booking {} failed: {}", booking.id, e);
                Delivery::Failed
            }
        };

        NotificationReport {
            confirmation,
            admin,
        }
    }
}

fn validate_request(request: &BookingRequest) -> Result<()> {
    if request.vehicle.is_none() {
        return Err(AppError::Validation("Please select a vehicle".to_string()));
    }
    if request.pickup_address.trim().is_empty() {
        return Err(AppError::Validation("Pickup address is required".to_string()));
    }
    if request.service_type.requires_route() {
        let has_dropoff = request
            .dropoff_address
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .is_some();
        if !has_dropoff {
            return Err(AppError::Validation(
                "Dropoff address is required".to_string(),
            ));
        }
    }
    if request.pickup_at.is_none() {
        return Err(AppError::Validation(
            "Pickup date and time are required".to_string(),
        ));
    }
    if request.name.trim().is_empty() {
        return Err(AppError::Validation(
            "Passenger name is required".to_string(),
        ));
    }
    if request.email.trim().is_empty() || !request.email.contains('@') {
        return Err(AppError::Validation(
            "A valid email address is required".to_string(),
        ));
    }
    if request.phone.trim().is_empty() {
        return Err(AppError::Validation("Phone number is required".to_string()));
    }
    if request.passengers < 1 {
        return Err(AppError::Validation(
            "At least one passenger is required".to_string(),
        ));
    }
    Ok(())
}

fn build_booking(
    request: BookingRequest,
    price: crate::domain::PriceBreakdown,
    payment_method: PaymentMethod,
    stripe_session_id: Option<String>,
) -> Booking {
    let now = Utc::now();
    Booking {
        id: generate_booking_reference(),
        payment_method,
        payment_status: PaymentStatus::Pending,
        booking_status: BookingStatus::Confirmed,
        stripe_session_id,
        stripe_payment_intent: None,
        service_type: request.service_type,
        pickup_address: request.pickup_address,
        pickup_lat: request.pickup_lat,
        pickup_lng: request.pickup_lng,
        dropoff_address: request.dropoff_address,
        dropoff_lat: request.dropoff_lat,
        dropoff_lng: request.dropoff_lng,
        // validate_request has already established presence
        pickup_at: request.pickup_at.unwrap_or(now),
        distance_km: request.distance_km,
        duration_min: request.duration_min,
        vehicle: request.vehicle.unwrap_or(VehicleClass::Sedan),
        passengers: request.passengers,
        luggage: request.luggage,
        child_seats: request.child_seats,
        price,
        currency: "EUR".to_string(),
        customer_name: request.name,
        customer_email: request.email,
        customer_phone: request.phone,
        flight_number: request.flight_number,
        special_requests: request.special_requests,
        created_at: now,
        updated_at: now,
    }
}

fn sanitize_locale(locale: Option<&str>) -> &str {
    match locale {
        Some(locale) if SUPPORTED_LOCALES.contains(&locale) => locale,
        _ => DEFAULT_LOCALE,
    }
}

/// Resolves the origin used for customer-facing URLs: the configured base URL
/// first, then a validated request origin (https, or localhost), then the
/// Host header. The scheme is only http for localhost hosts.
pub fn resolve_public_origin(settings: &Settings, ctx: &RequestContext) -> String {
    if let Some(base) = settings
        .server
        .base_url
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return base.trim_end_matches('/').to_string();
    }

    if let Some(origin) = ctx.origin.as_deref().and_then(validate_origin) {
        return origin;
    }

    if let Some(host) = ctx.host.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let scheme = if is_localhost(host) { "http" } else { "https" };
        return format!("{}://{}", scheme, host);
    }

    format!("http://{}:{}", settings.server.host, settings.server.port)
}

fn validate_origin(origin: &str) -> Option<String> {
    let origin = origin.trim().trim_end_matches('/');
    if let Some(rest) = origin.strip_prefix("https://") {
        if !rest.is_empty() {
            return Some(origin.to_string());
        }
    }
    if let Some(rest) = origin.strip_prefix("http://") {
        if is_localhost(rest) {
            return Some(origin.to_string());
        }
    }
    None
}

fn is_localhost(host: &str) -> bool {
    let bare = host.trim_start_matches('[');
    let bare = bare.split(']').next().unwrap_or(bare);
    let bare = bare.split(':').next().unwrap_or(bare);
    bare == "localhost" || bare == "127.0.0.1" || bare == "::1"
}
