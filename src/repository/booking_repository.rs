use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::{
    domain::{
        Booking, BookingStatus, PaymentMethod, PaymentStatus, PriceBreakdown, ServiceType,
        VehicleClass,
    },
    error::{AppError, Result},
    repository::BookingRepository,
};

#[derive(FromRow)]
struct BookingRow {
    id: String,
    payment_method: String,
    payment_status: String,
    booking_status: String,
    stripe_session_id: Option<String>,
    stripe_payment_intent: Option<String>,
    service_type: String,
    pickup_address: String,
    pickup_lat: Option<f64>,
    pickup_lng: Option<f64>,
    dropoff_address: Option<String>,
    dropoff_lat: Option<f64>,
    dropoff_lng: Option<f64>,
    pickup_at: NaiveDateTime,
    distance_km: f64,
    duration_min: i64,
    vehicle: String,
    passengers: i64,
    luggage: i64,
    child_seats: i64,
    base_cents: i64,
    distance_cents: i64,
    airport_fee_cents: i64,
    child_seat_cents: i64,
    total_cents: i64,
    currency: String,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    flight_number: Option<String>,
    special_requests: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

const BOOKING_COLUMNS: &str = r#"id, payment_method, payment_status, booking_status,
       stripe_session_id, stripe_payment_intent, service_type,
       pickup_address, pickup_lat, pickup_lng,
       dropoff_address, dropoff_lat, dropoff_lng,
       pickup_at, distance_km, duration_min, vehicle,
       passengers, luggage, child_seats,
       base_cents, distance_cents, airport_fee_cents, child_seat_cents, total_cents,
       currency, customer_name, customer_email, customer_phone,
       flight_number, special_requests, created_at, updated_at"#;

pub struct SqliteBookingRepository {
    pool: SqlitePool,
}

impl SqliteBookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_booking(row: BookingRow) -> Result<Booking> {
        Ok(Booking {
            id: row.id,
            payment_method: Self::parse_payment_method(&row.payment_method)?,
            payment_status: Self::parse_payment_status(&row.payment_status)?,
            booking_status: Self::parse_booking_status(&row.booking_status)?,
            stripe_session_id: row.stripe_session_id,
            stripe_payment_intent: row.stripe_payment_intent,
            service_type: Self::parse_service_type(&row.service_type)?,
            pickup_address: row.pickup_address,
            pickup_lat: row.pickup_lat,
            pickup_lng: row.pickup_lng,
            dropoff_address: row.dropoff_address,
            dropoff_lat: row.dropoff_lat,
            dropoff_lng: row.dropoff_lng,
            pickup_at: DateTime::from_naive_utc_and_offset(row.pickup_at, Utc),
            distance_km: row.distance_km,
            duration_min: row.duration_min,
            vehicle: Self::parse_vehicle(&row.vehicle)?,
            passengers: row.passengers,
            luggage: row.luggage,
            child_seats: row.child_seats,
            price: PriceBreakdown {
                base_cents: row.base_cents,
                distance_cents: row.distance_cents,
                airport_fee_cents: row.airport_fee_cents,
                child_seat_cents: row.child_seat_cents,
                total_cents: row.total_cents,
            },
            currency: row.currency,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            customer_phone: row.customer_phone,
            flight_number: row.flight_number,
            special_requests: row.special_requests,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn parse_payment_status(s: &str) -> Result<PaymentStatus> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "cancelled" => Ok(PaymentStatus::Cancelled),
            "refunded" => Ok(PaymentStatus::Refunded),
            _ => Err(AppError::Database(format!("Invalid payment status: {}", s))),
        }
    }

    fn payment_status_to_str(status: PaymentStatus) -> &'static str {
        match status {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Refunded => "refunded",
        }
    }

    fn parse_payment_method(s: &str) -> Result<PaymentMethod> {
        match s {
            "card" => Ok(PaymentMethod::Card),
            "cash" => Ok(PaymentMethod::Cash),
            _ => Err(AppError::Database(format!("Invalid payment method: {}", s))),
        }
    }

    fn payment_method_to_str(method: PaymentMethod) -> &'static str {
        match method {
            PaymentMethod::Card => "card",
            PaymentMethod::Cash => "cash",
        }
    }

    fn parse_booking_status(s: &str) -> Result<BookingStatus> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "in_progress" => Ok(BookingStatus::InProgress),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            _ => Err(AppError::Database(format!("Invalid booking status: {}", s))),
        }
    }

    fn booking_status_to_str(status: BookingStatus) -> &'static str {
        match status {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    fn parse_service_type(s: &str) -> Result<ServiceType> {
        match s {
            "airport_transfer" => Ok(ServiceType::AirportTransfer),
            "intercity" => Ok(ServiceType::Intercity),
            "hourly" => Ok(ServiceType::Hourly),
            _ => Err(AppError::Database(format!("Invalid service type: {}", s))),
        }
    }

    fn service_type_to_str(service_type: ServiceType) -> &'static str {
        match service_type {
            ServiceType::AirportTransfer => "airport_transfer",
            ServiceType::Intercity => "intercity",
            ServiceType::Hourly => "hourly",
        }
    }

    fn parse_vehicle(s: &str) -> Result<VehicleClass> {
        match s {
            "sedan" => Ok(VehicleClass::Sedan),
            "estate" => Ok(VehicleClass::Estate),
            "minivan" => Ok(VehicleClass::Minivan),
            "minibus" => Ok(VehicleClass::Minibus),
            _ => Err(AppError::Database(format!("Invalid vehicle class: {}", s))),
        }
    }

    fn vehicle_to_str(vehicle: VehicleClass) -> &'static str {
        match vehicle {
            VehicleClass::Sedan => "sedan",
            VehicleClass::Estate => "estate",
            VehicleClass::Minivan => "minivan",
            VehicleClass::Minibus => "minibus",
        }
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepository {
    async fn create(&self, booking: Booking) -> Result<Booking> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            INSERT INTO bookings (
                id, payment_method, payment_status, booking_status,
                stripe_session_id, stripe_payment_intent, service_type,
                pickup_address, pickup_lat, pickup_lng,
                dropoff_address, dropoff_lat, dropoff_lng,
                pickup_at, distance_km, duration_min, vehicle,
                passengers, luggage, child_seats,
                base_cents, distance_cents, airport_fee_cents, child_seat_cents, total_cents,
                currency, customer_name, customer_email, customer_phone,
                flight_number, special_requests, created_at, updated_at
            ) VALUES (
                ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
            )
            "#,
        )
        .bind(&booking.id)
        .bind(Self::payment_method_to_str(booking.payment_method))
        .bind(Self::payment_status_to_str(booking.payment_status))
        .bind(Self::booking_status_to_str(booking.booking_status))
        .bind(&booking.stripe_session_id)
        .bind(&booking.stripe_payment_intent)
        .bind(Self::service_type_to_str(booking.service_type))
        .bind(&booking.pickup_address)
        .bind(booking.pickup_lat)
        .bind(booking.pickup_lng)
        .bind(&booking.dropoff_address)
        .bind(booking.dropoff_lat)
        .bind(booking.dropoff_lng)
        .bind(booking.pickup_at.naive_utc())
        .bind(booking.distance_km)
        .bind(booking.duration_min)
        .bind(Self::vehicle_to_str(booking.vehicle))
        .bind(booking.passengers)
        .bind(booking.luggage)
        .bind(booking.child_seats)
        .bind(booking.price.base_cents)
        .bind(booking.price.distance_cents)
        .bind(booking.price.airport_fee_cents)
        .bind(booking.price.child_seat_cents)
        .bind(booking.price.total_cents)
        .bind(&booking.currency)
        .bind(&booking.customer_name)
        .bind(&booking.customer_email)
        .bind(&booking.customer_phone)
        .bind(&booking.flight_number)
        .bind(&booking.special_requests)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::Persistence(format!(
                "Insert affected no rows for booking {}",
                booking.id
            )));
        }

        self.find_by_id(&booking.id).await?.ok_or_else(|| {
            AppError::Persistence("Failed to retrieve created booking".to_string())
        })
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = ?",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_booking(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_session(&self, session_id: &str) -> Result<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE stripe_session_id = ?",
            BOOKING_COLUMNS
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_booking(r)?)),
            None => Ok(None),
        }
    }

    async fn update_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
        payment_intent: Option<&str>,
    ) -> Result<Booking> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET payment_status = ?,
                stripe_payment_intent = COALESCE(?, stripe_payment_intent),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(Self::payment_status_to_str(status))
        .bind(payment_intent)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Booking {} not found", id)));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Persistence("Failed to retrieve updated booking".to_string())
        })
    }

    async fn update_booking_status(&self, id: &str, status: BookingStatus) -> Result<Booking> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET booking_status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(Self::booking_status_to_str(status))
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Booking {} not found", id)));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Persistence("Failed to retrieve updated booking".to_string())
        })
    }

    async fn find_recent(&self, limit: i64) -> Result<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings ORDER BY created_at DESC LIMIT ?",
            BOOKING_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }

    async fn find_today(&self) -> Result<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE date(created_at) = date('now') ORDER BY created_at DESC",
            BOOKING_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE customer_email = ? ORDER BY created_at DESC",
            BOOKING_COLUMNS
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }
}
