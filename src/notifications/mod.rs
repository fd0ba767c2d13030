use async_trait::async_trait;

use crate::{domain::Booking, error::Result};

pub mod email;

pub use email::SmtpNotifier;

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_confirmation(&self, booking: &Booking) -> Result<()>;
    async fn send_admin_notification(&self, booking: &Booking) -> Result<()>;
}

/// Outcome of one best-effort send. Notification is not part of the
/// booking's durability contract: a failure is logged and never propagated
/// into the operation that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Copy)]
pub struct NotificationReport {
    pub confirmation: Delivery,
    pub admin: Delivery,
}

impl NotificationReport {
    pub fn skipped() -> Self {
        Self {
            confirmation: Delivery::Skipped,
            admin: Delivery::Skipped,
        }
    }
}
