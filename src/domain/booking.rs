use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single reserved transfer: trip, customer, price and payment state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub booking_status: BookingStatus,
    pub stripe_session_id: Option<String>,
    pub stripe_payment_intent: Option<String>,
    pub service_type: ServiceType,
    pub pickup_address: String,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    pub dropoff_address: Option<String>,
    pub dropoff_lat: Option<f64>,
    pub dropoff_lng: Option<f64>,
    pub pickup_at: DateTime<Utc>,
    pub distance_km: f64,
    pub duration_min: i64,
    pub vehicle: VehicleClass,
    pub passengers: i64,
    pub luggage: i64,
    pub child_seats: i64,
    pub price: PriceBreakdown,
    pub currency: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub flight_number: Option<String>,
    pub special_requests: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Cash,
}

/// Lifecycle of money collection. `Paid` and `Cancelled` are terminal;
/// nothing ever transitions back to `Pending`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Cancelled,
    Refunded,
}

/// Lifecycle of service delivery, independent of payment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    AirportTransfer,
    Intercity,
    Hourly,
}

impl ServiceType {
    /// Hourly hire has no fixed destination; the other services are routed.
    pub fn requires_route(&self) -> bool {
        !matches!(self, ServiceType::Hourly)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    Sedan,
    Estate,
    Minivan,
    Minibus,
}

/// Server-side price breakdown in euro cents. The total is always the sum of
/// its components as produced by the pricing calculator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceBreakdown {
    pub base_cents: i64,
    pub distance_cents: i64,
    pub airport_fee_cents: i64,
    pub child_seat_cents: i64,
    pub total_cents: i64,
}

impl PriceBreakdown {
    pub fn total_display(&self) -> String {
        format_cents(self.total_cents)
    }
}

pub fn format_cents(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// Generates a globally unique booking reference like
/// `TRF-9BB40D1AF63F4E6C8D2A51C07B3E9F12`. Assigned exactly once, before
/// persistence, and never regenerated.
pub fn generate_booking_reference() -> String {
    format!("TRF-{}", Uuid::new_v4().simple().to_string().to_uppercase())
}
