use async_trait::async_trait;
use stripe::{
    CheckoutSession, CheckoutSessionId, CheckoutSessionMode, CheckoutSessionPaymentStatus,
    Client, CreateCheckoutSession, CreateCheckoutSessionLineItems, Currency, EventObject,
    EventType, Webhook, WebhookError,
};

use crate::{
    domain::{Booking, ServiceType},
    error::{AppError, Result},
    payments::{
        CheckoutHandle, GatewayEvent, GatewayPaymentStatus, PaymentGateway, SessionState,
    },
};

pub struct StripeGateway {
    client: Client,
    webhook_secret: Option<String>,
}

impl StripeGateway {
    pub fn new(api_key: String, webhook_secret: Option<String>) -> Self {
        let client = Client::new(api_key);
        Self {
            client,
            webhook_secret,
        }
    }

    fn line_item_name(booking: &Booking) -> String {
        let service = match booking.service_type {
            ServiceType::AirportTransfer => "Airport transfer",
            ServiceType::Intercity => "Intercity transfer",
            ServiceType::Hourly => "Hourly hire",
        };
        format!("{} — booking {}", service, booking.id)
    }

    fn line_item_description(booking: &Booking) -> String {
        match &booking.dropoff_address {
            Some(dropoff) => format!("{} to {}", booking.pickup_address, dropoff),
            None => format!(
                "{} for {} min from {}",
                Self::line_item_name(booking),
                booking.duration_min,
                booking.pickup_address
            ),
        }
    }
}

fn map_payment_status(status: CheckoutSessionPaymentStatus) -> GatewayPaymentStatus {
    match status {
        CheckoutSessionPaymentStatus::Paid => GatewayPaymentStatus::Paid,
        CheckoutSessionPaymentStatus::Unpaid => GatewayPaymentStatus::Unpaid,
        CheckoutSessionPaymentStatus::NoPaymentRequired => {
            GatewayPaymentStatus::NoPaymentRequired
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        booking: &Booking,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutHandle> {
        let mut params = CreateCheckoutSession::new();
        params.mode = Some(CheckoutSessionMode::Payment);
        params.success_url = Some(success_url);
        params.cancel_url = Some(cancel_url);
        params.customer_email = Some(&booking.customer_email);

        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            price_data: Some(stripe::CreateCheckoutSessionLineItemsPriceData {
                currency: Currency::EUR,
                unit_amount: Some(booking.price.total_cents),
                product_data: Some(stripe::CreateCheckoutSessionLineItemsPriceDataProductData {
                    name: Self::line_item_name(booking),
                    description: Some(Self::line_item_description(booking)),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            quantity: Some(1),
            ..Default::default()
        }]);

        let mut metadata = std::collections::HashMap::new();
        metadata.insert("booking_id".to_string(), booking.id.clone());
        params.metadata = Some(metadata);
        params.client_reference_id = Some(&booking.id);

        let session = CheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| AppError::Upstream(format!("Stripe error: {}", e)))?;

        let checkout_url = session
            .url
            .ok_or_else(|| AppError::Upstream("No checkout URL returned".to_string()))?;

        Ok(CheckoutHandle {
            session_id: session.id.to_string(),
            checkout_url,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionState> {
        let id: CheckoutSessionId = session_id
            .parse()
            .map_err(|_| AppError::Validation("Invalid session identifier".to_string()))?;

        let session = CheckoutSession::retrieve(&self.client, &id, &[])
            .await
            .map_err(|e| match &e {
                stripe::StripeError::Stripe(req) if req.http_status == 404 => {
                    AppError::NotFound("Checkout session not found".to_string())
                }
                _ => AppError::Upstream(format!("Stripe error: {}", e)),
            })?;

        Ok(SessionState {
            payment_status: map_payment_status(session.payment_status),
            payment_intent: session.payment_intent.map(|pi| pi.id().to_string()),
        })
    }

    fn verify_webhook(&self, payload: &str, signature: &str) -> Result<GatewayEvent> {
        let secret = self.webhook_secret.as_deref().ok_or_else(|| {
            AppError::Configuration("Stripe webhook secret not configured".to_string())
        })?;

        let event = Webhook::construct_event(payload, signature, secret).map_err(|e| {
            match e {
                WebhookError::BadSignature
                | WebhookError::BadHeader(_)
                | WebhookError::BadTimestamp(_)
                | WebhookError::BadKey => AppError::SignatureInvalid,
                other => {
                    tracing::warn!("Webhook payload rejected: {}", other);
                    AppError::SignatureInvalid
                }
            }
        })?;

        let type_label = format!("{:?}", event.type_);
        let event = match event.type_ {
            EventType::CheckoutSessionCompleted => {
                if let EventObject::CheckoutSession(session) = event.data.object {
                    GatewayEvent::CheckoutCompleted {
                        session_id: session.id.to_string(),
                        payment_status: map_payment_status(session.payment_status),
                        payment_intent: session.payment_intent.map(|pi| pi.id().to_string()),
                    }
                } else {
                    GatewayEvent::Unhandled(type_label)
                }
            }
            EventType::CheckoutSessionExpired => {
                if let EventObject::CheckoutSession(session) = event.data.object {
                    GatewayEvent::CheckoutExpired {
                        session_id: session.id.to_string(),
                    }
                } else {
                    GatewayEvent::Unhandled(type_label)
                }
            }
            EventType::PaymentIntentPaymentFailed => {
                if let EventObject::PaymentIntent(intent) = event.data.object {
                    GatewayEvent::PaymentFailed {
                        payment_intent: intent.id.to_string(),
                    }
                } else {
                    GatewayEvent::Unhandled(type_label)
                }
            }
            _ => GatewayEvent::Unhandled(type_label),
        };

        Ok(event)
    }
}
