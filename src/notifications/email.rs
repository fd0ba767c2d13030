use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{
    config::EmailConfig,
    domain::{Booking, ServiceType},
    error::{AppError, Result},
    notifications::NotificationSender,
};

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    admin: Mailbox,
}

impl SmtpNotifier {
    /// Builds the notifier from configuration; returns `None` when email is
    /// disabled or incompletely configured.
    pub fn from_config(config: &EmailConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }

        let (host, username, password, from, admin) = match (
            config.smtp_host.as_deref(),
            config.smtp_username.as_deref(),
            config.smtp_password.as_deref(),
            config.from_address.as_deref(),
            config.admin_address.as_deref(),
        ) {
            (Some(host), Some(user), Some(pass), Some(from), Some(admin)) => {
                (host, user, pass, from, admin)
            }
            _ => {
                tracing::warn!("Email enabled but missing configuration");
                return None;
            }
        };

        let from: Mailbox = match from.parse() {
            Ok(mb) => mb,
            Err(e) => {
                tracing::warn!("Invalid from address {}: {}", from, e);
                return None;
            }
        };
        let admin: Mailbox = match admin.parse() {
            Ok(mb) => mb,
            Err(e) => {
                tracing::warn!("Invalid admin address {}: {}", admin, e);
                return None;
            }
        };

        let transport = match AsyncSmtpTransport::<Tokio1Executor>::relay(host) {
            Ok(builder) => builder
                .credentials(Credentials::new(username.to_string(), password.to_string()))
                .build(),
            Err(e) => {
                tracing::warn!("Failed to build SMTP transport for {}: {}", host, e);
                return None;
            }
        };

        Some(Self { transport, from, admin })
    }

    fn service_label(booking: &Booking) -> &'static str {
        match booking.service_type {
            ServiceType::AirportTransfer => "Airport transfer",
            ServiceType::Intercity => "Intercity transfer",
            ServiceType::Hourly => "Hourly hire",
        }
    }

    fn trip_summary(booking: &Booking) -> String {
        let mut lines = vec![
            format!("Booking reference: {}", booking.id),
            format!("Service: {}", Self::service_label(booking)),
            format!("Pickup: {}", booking.pickup_address),
        ];
        if let Some(dropoff) = &booking.dropoff_address {
            lines.push(format!("Dropoff: {}", dropoff));
        }
        lines.push(format!(
            "Pickup time: {}",
            booking.pickup_at.format("%Y-%m-%d %H:%M UTC")
        ));
        lines.push(format!("Vehicle: {:?}", booking.vehicle));
        lines.push(format!("Passengers: {}", booking.passengers));
        if let Some(flight) = &booking.flight_number {
            lines.push(format!("Flight: {}", flight));
        }
        lines.push(format!(
            "Total: {} {}",
            booking.price.total_display(),
            booking.currency
        ));
        lines.join("\n")
    }

    async fn send(&self, message: Message) -> Result<()> {
        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Upstream(format!("SMTP error: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl NotificationSender for SmtpNotifier {
    async fn send_confirmation(&self, booking: &Booking) -> Result<()> {
        let to: Mailbox = format!("{} <{}>", booking.customer_name, booking.customer_email)
            .parse()
            .or_else(|_| booking.customer_email.parse())
            .map_err(|e| AppError::Upstream(format!("Invalid recipient address: {}", e)))?;

        let body = format!(
            "Dear {},\n\nYour transfer is booked.\n\n{}\n\nPayment: {:?} ({:?})\n\nWe look forward to driving you.",
            booking.customer_name,
            Self::trip_summary(booking),
            booking.payment_method,
            booking.payment_status,
        );

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(format!("Your booking {} is confirmed", booking.id))
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| AppError::Upstream(format!("Failed to build email: {}", e)))?;

        self.send(message).await
    }

    async fn send_admin_notification(&self, booking: &Booking) -> Result<()> {
        let body = format!(
            "New booking received.\n\n{}\n\nCustomer: {} <{}> {}\nPayment: {:?} ({:?})",
            Self::trip_summary(booking),
            booking.customer_name,
            booking.customer_email,
            booking.customer_phone,
            booking.payment_method,
            booking.payment_status,
        );

        let message = Message::builder()
            .from(self.from.clone())
            .to(self.admin.clone())
            .subject(format!("New booking {}", booking.id))
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| AppError::Upstream(format!("Failed to build email: {}", e)))?;

        self.send(message).await
    }
}
