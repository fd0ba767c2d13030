#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use aerocab::{
    config::Settings,
    domain::{
        generate_booking_reference, Booking, BookingStatus, PaymentMethod, PaymentStatus,
        ServiceType, VehicleClass,
    },
    error::{AppError, Result},
    notifications::NotificationSender,
    payments::{
        CheckoutHandle, GatewayEvent, GatewayPaymentStatus, PaymentGateway, SessionState,
    },
    pricing,
    repository::SqliteBookingRepository,
    service::{BookingRequest, BookingService},
};

/// In-memory SQLite gives every connection its own database, so the test
/// pool is capped at a single connection.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .expect("connect");
    sqlx::migrate!("./migrations").run(&pool).await.expect("migrate");
    pool
}

/// A valid intercity sedan request: 20 km at 1.00/km over a 25.00 base fare,
/// so the calculator prices it at 45.00.
pub fn sample_request() -> BookingRequest {
    BookingRequest {
        service_type: ServiceType::Intercity,
        vehicle: Some(VehicleClass::Sedan),
        pickup_address: "Av. da Liberdade 120, Lisbon".to_string(),
        pickup_lat: Some(38.7205),
        pickup_lng: Some(-9.1458),
        dropoff_address: Some("Cascais Marina".to_string()),
        dropoff_lat: Some(38.6916),
        dropoff_lng: Some(-9.4203),
        pickup_at: Some(Utc::now() + Duration::days(3)),
        distance_km: 20.0,
        duration_min: 25,
        passengers: 2,
        luggage: 1,
        child_seats: 0,
        name: "Maria Santos".to_string(),
        email: "maria@example.com".to_string(),
        phone: "+351 912 345 678".to_string(),
        flight_number: None,
        special_requests: None,
        quoted_total: None,
    }
}

pub fn sample_booking(email: &str, session_id: Option<&str>) -> Booking {
    let price = pricing::quote(ServiceType::Intercity, Some(VehicleClass::Sedan), 20.0, 25, 0)
        .expect("quote");
    let now = Utc::now();
    Booking {
        id: generate_booking_reference(),
        payment_method: if session_id.is_some() {
            PaymentMethod::Card
        } else {
            PaymentMethod::Cash
        },
        payment_status: PaymentStatus::Pending,
        booking_status: BookingStatus::Confirmed,
        stripe_session_id: session_id.map(|s| s.to_string()),
        stripe_payment_intent: None,
        service_type: ServiceType::Intercity,
        pickup_address: "Av. da Liberdade 120, Lisbon".to_string(),
        pickup_lat: None,
        pickup_lng: None,
        dropoff_address: Some("Cascais Marina".to_string()),
        dropoff_lat: None,
        dropoff_lng: None,
        pickup_at: now + Duration::days(3),
        distance_km: 20.0,
        duration_min: 25,
        vehicle: VehicleClass::Sedan,
        passengers: 2,
        luggage: 1,
        child_seats: 0,
        price,
        currency: "EUR".to_string(),
        customer_name: "Maria Santos".to_string(),
        customer_email: email.to_string(),
        customer_phone: "+351 912 345 678".to_string(),
        flight_number: None,
        special_requests: None,
        created_at: now,
        updated_at: now,
    }
}

/// In-memory stand-in for the Stripe gateway. `verify_webhook` accepts the
/// literal signature "valid" and replays the queued event; anything else is
/// rejected the way a tampered signature would be.
pub struct FakeGateway {
    pub sessions: Mutex<HashMap<String, SessionState>>,
    pub next_event: Mutex<Option<GatewayEvent>>,
    pub webhook_secret_configured: bool,
    pub retrieve_calls: AtomicUsize,
    session_counter: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            next_event: Mutex::new(None),
            webhook_secret_configured: true,
            retrieve_calls: AtomicUsize::new(0),
            session_counter: AtomicUsize::new(0),
        }
    }

    pub fn without_webhook_secret() -> Self {
        Self {
            webhook_secret_configured: false,
            ..Self::new()
        }
    }

    pub fn insert_session(&self, session_id: &str, payment_status: GatewayPaymentStatus) {
        self.sessions.lock().unwrap().insert(
            session_id.to_string(),
            SessionState {
                payment_status,
                payment_intent: Some("pi_fake_123".to_string()),
            },
        );
    }

    pub fn queue_event(&self, event: GatewayEvent) {
        *self.next_event.lock().unwrap() = Some(event);
    }

    pub fn retrieve_call_count(&self) -> usize {
        self.retrieve_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_checkout_session(
        &self,
        _booking: &Booking,
        _success_url: &str,
        _cancel_url: &str,
    ) -> Result<CheckoutHandle> {
        let n = self.session_counter.fetch_add(1, Ordering::SeqCst);
        let session_id = format!("cs_test_{}", n);
        self.insert_session(&session_id, GatewayPaymentStatus::Unpaid);
        Ok(CheckoutHandle {
            checkout_url: format!("https://checkout.stripe.test/{}", session_id),
            session_id,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionState> {
        self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Checkout session not found".to_string()))
    }

    fn verify_webhook(&self, _payload: &str, signature: &str) -> Result<GatewayEvent> {
        if !self.webhook_secret_configured {
            return Err(AppError::Configuration(
                "Stripe webhook secret not configured".to_string(),
            ));
        }
        if signature != "valid" {
            return Err(AppError::SignatureInvalid);
        }
        Ok(self
            .next_event
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| GatewayEvent::Unhandled("fake.event".to_string())))
    }
}

/// Records attempted sends; optionally fails every send to exercise the
/// best-effort contract.
pub struct RecordingNotifier {
    pub confirmations: AtomicUsize,
    pub admin_notifications: AtomicUsize,
    pub failing: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            confirmations: AtomicUsize::new(0),
            admin_notifications: AtomicUsize::new(0),
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    pub fn confirmation_count(&self) -> usize {
        self.confirmations.load(Ordering::SeqCst)
    }

    pub fn admin_count(&self) -> usize {
        self.admin_notifications.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn send_confirmation(&self, _booking: &Booking) -> Result<()> {
        self.confirmations.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(AppError::Upstream("SMTP error: simulated".to_string()));
        }
        Ok(())
    }

    async fn send_admin_notification(&self, _booking: &Booking) -> Result<()> {
        self.admin_notifications.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(AppError::Upstream("SMTP error: simulated".to_string()));
        }
        Ok(())
    }
}

pub struct TestHarness {
    pub service: Arc<BookingService>,
    pub repo: Arc<SqliteBookingRepository>,
    pub gateway: Arc<FakeGateway>,
    pub notifier: Arc<RecordingNotifier>,
    pub settings: Arc<Settings>,
}

pub async fn harness() -> TestHarness {
    harness_with(FakeGateway::new(), RecordingNotifier::new()).await
}

pub async fn harness_with(gateway: FakeGateway, notifier: RecordingNotifier) -> TestHarness {
    let pool = memory_pool().await;
    let repo = Arc::new(SqliteBookingRepository::new(pool));
    let gateway = Arc::new(gateway);
    let notifier = Arc::new(notifier);
    let settings = Arc::new(Settings::default());
    let service = Arc::new(BookingService::new(
        repo.clone(),
        Some(gateway.clone()),
        Some(notifier.clone()),
        settings.clone(),
    ));
    TestHarness {
        service,
        repo,
        gateway,
        notifier,
        settings,
    }
}
