use async_trait::async_trait;

use crate::{domain::Booking, error::Result};

pub mod stripe_gateway;

pub use stripe_gateway::StripeGateway;

/// Checkout session identifiers issued by the provider carry this prefix.
/// Callers reject malformed identifiers before any provider call is made.
pub const SESSION_ID_PREFIX: &str = "cs_";

#[derive(Debug, Clone)]
pub struct CheckoutHandle {
    pub session_id: String,
    pub checkout_url: String,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub payment_status: GatewayPaymentStatus,
    pub payment_intent: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayPaymentStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,
    Unknown,
}

impl GatewayPaymentStatus {
    pub fn settles_booking(&self) -> bool {
        matches!(
            self,
            GatewayPaymentStatus::Paid | GatewayPaymentStatus::NoPaymentRequired
        )
    }
}

/// An authenticated webhook event, reduced to what the booking lifecycle
/// needs.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    CheckoutCompleted {
        session_id: String,
        payment_status: GatewayPaymentStatus,
        payment_intent: Option<String>,
    },
    CheckoutExpired {
        session_id: String,
    },
    PaymentFailed {
        payment_intent: String,
    },
    Unhandled(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        booking: &Booking,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutHandle>;

    /// Fails with `NotFound` when the provider reports no such session,
    /// including sessions that have expired out of retention.
    async fn retrieve_session(&self, session_id: &str) -> Result<SessionState>;

    /// Verifies the provider signature against the raw, unparsed request
    /// body. Re-serializing a parsed body breaks verification, so callers
    /// must hand the bytes through exactly as received.
    fn verify_webhook(&self, payload: &str, signature: &str) -> Result<GatewayEvent>;
}
