use async_trait::async_trait;

use crate::domain::{Booking, BookingStatus, PaymentStatus};
use crate::error::Result;

pub mod booking_repository;

pub use booking_repository::SqliteBookingRepository;

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: Booking) -> Result<Booking>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>>;
    async fn find_by_session(&self, session_id: &str) -> Result<Option<Booking>>;
    /// Single atomic statement: sets the payment status, attaches the payment
    /// intent when given, bumps `updated_at`. Applying the same status twice
    /// is a no-op success. Fails with `NotFound` when no row matches.
    async fn update_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
        payment_intent: Option<&str>,
    ) -> Result<Booking>;
    async fn update_booking_status(&self, id: &str, status: BookingStatus) -> Result<Booking>;
    async fn find_recent(&self, limit: i64) -> Result<Vec<Booking>>;
    async fn find_today(&self) -> Result<Vec<Booking>>;
    async fn find_by_email(&self, email: &str) -> Result<Vec<Booking>>;
}
