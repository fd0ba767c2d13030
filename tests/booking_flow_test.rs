mod common;

use aerocab::{
    domain::{PaymentMethod, PaymentStatus},
    error::AppError,
    payments::{GatewayEvent, GatewayPaymentStatus},
    repository::BookingRepository,
    service::{RequestContext, VerifiedPaymentStatus},
};
use common::{harness, harness_with, sample_booking, sample_request, FakeGateway, RecordingNotifier};

fn ctx() -> RequestContext {
    RequestContext::default()
}

#[tokio::test]
async fn cash_booking_persists_calculator_price() -> anyhow::Result<()> {
    let h = harness().await;

    let mut request = sample_request();
    // Tampered client-side price must never reach the database
    request.quoted_total = Some(1.0);

    let created = h
        .service
        .create_cash_booking(request, Some("en"), &ctx())
        .await?;

    assert!(created.booking_id.starts_with("TRF-"));
    assert!(created
        .redirect_url
        .contains(&format!("/en/booking/confirmation?ref={}", created.booking_id)));

    let row = h
        .repo
        .find_by_id(&created.booking_id)
        .await?
        .expect("persisted booking");
    assert_eq!(row.payment_method, PaymentMethod::Cash);
    assert_eq!(row.payment_status, PaymentStatus::Pending);
    assert_eq!(row.stripe_session_id, None);
    assert_eq!(row.price.total_cents, 4500);

    assert_eq!(h.notifier.confirmation_count(), 1);
    assert_eq!(h.notifier.admin_count(), 1);

    Ok(())
}

#[tokio::test]
async fn cash_booking_requires_a_passenger() -> anyhow::Result<()> {
    let h = harness().await;

    let mut request = sample_request();
    request.passengers = 0;

    let err = h
        .service
        .create_cash_booking(request, Some("en"), &ctx())
        .await
        .unwrap_err();

    match err {
        AppError::Validation(msg) => assert_eq!(msg, "At least one passenger is required"),
        other => panic!("expected validation error, got {:?}", other),
    }

    assert!(h.repo.find_recent(10).await?.is_empty());
    assert_eq!(h.notifier.confirmation_count(), 0);

    Ok(())
}

#[tokio::test]
async fn validation_names_the_first_missing_field() -> anyhow::Result<()> {
    let h = harness().await;

    let mut request = sample_request();
    request.vehicle = None;
    request.pickup_address.clear();
    request.passengers = 0;

    let err = h
        .service
        .create_cash_booking(request, Some("en"), &ctx())
        .await
        .unwrap_err();
    match err {
        AppError::Validation(msg) => assert_eq!(msg, "Please select a vehicle"),
        other => panic!("expected validation error, got {:?}", other),
    }

    let mut request = sample_request();
    request.dropoff_address = None;
    let err = h
        .service
        .create_cash_booking(request, Some("en"), &ctx())
        .await
        .unwrap_err();
    match err {
        AppError::Validation(msg) => assert_eq!(msg, "Dropoff address is required"),
        other => panic!("expected validation error, got {:?}", other),
    }

    Ok(())
}

#[tokio::test]
async fn notification_failure_never_fails_the_booking() -> anyhow::Result<()> {
    let h = harness_with(FakeGateway::new(), RecordingNotifier::failing()).await;

    let created = h
        .service
        .create_cash_booking(sample_request(), Some("en"), &ctx())
        .await?;

    // Both sends were attempted and failed; the booking survived
    assert_eq!(h.notifier.confirmation_count(), 1);
    assert_eq!(h.notifier.admin_count(), 1);
    assert!(h.repo.find_by_id(&created.booking_id).await?.is_some());

    Ok(())
}

#[tokio::test]
async fn card_checkout_links_a_session() -> anyhow::Result<()> {
    let h = harness().await;

    let created = h
        .service
        .create_card_checkout(sample_request(), Some("de"), &ctx())
        .await?;

    assert!(created.checkout_url.starts_with("https://checkout.stripe.test/"));

    let row = h
        .repo
        .find_by_id(&created.booking_id)
        .await?
        .expect("persisted booking");
    assert_eq!(row.payment_method, PaymentMethod::Card);
    assert_eq!(row.payment_status, PaymentStatus::Pending);
    let session_id = row.stripe_session_id.expect("card booking carries a session");
    assert!(session_id.starts_with("cs_"));

    // Card bookings notify on payment, not on creation
    assert_eq!(h.notifier.confirmation_count(), 0);

    Ok(())
}

#[tokio::test]
async fn webhook_marks_pending_booking_paid() -> anyhow::Result<()> {
    let h = harness().await;

    let booking = sample_booking("maria@example.com", Some("cs_test_hook"));
    let id = booking.id.clone();
    h.repo.create(booking).await?;

    h.gateway.queue_event(GatewayEvent::CheckoutCompleted {
        session_id: "cs_test_hook".to_string(),
        payment_status: GatewayPaymentStatus::Paid,
        payment_intent: Some("pi_hook_1".to_string()),
    });

    let ack = h.service.handle_webhook("{}", "valid").await?;
    assert!(ack.received);

    let row = h.repo.find_by_id(&id).await?.expect("booking");
    assert_eq!(row.payment_status, PaymentStatus::Paid);
    assert_eq!(row.stripe_payment_intent.as_deref(), Some("pi_hook_1"));

    assert_eq!(h.notifier.confirmation_count(), 1);
    assert_eq!(h.notifier.admin_count(), 1);

    Ok(())
}

#[tokio::test]
async fn webhook_redelivery_is_idempotent() -> anyhow::Result<()> {
    let h = harness().await;

    let booking = sample_booking("maria@example.com", Some("cs_test_twice"));
    let id = booking.id.clone();
    h.repo.create(booking).await?;

    let event = GatewayEvent::CheckoutCompleted {
        session_id: "cs_test_twice".to_string(),
        payment_status: GatewayPaymentStatus::Paid,
        payment_intent: Some("pi_twice".to_string()),
    };

    h.gateway.queue_event(event.clone());
    h.service.handle_webhook("{}", "valid").await?;

    h.gateway.queue_event(event);
    let ack = h.service.handle_webhook("{}", "valid").await?;
    assert!(ack.received);

    let row = h.repo.find_by_id(&id).await?.expect("booking");
    assert_eq!(row.payment_status, PaymentStatus::Paid);
    // Emails go out once, on the transition into paid
    assert_eq!(h.notifier.confirmation_count(), 1);
    assert_eq!(h.notifier.admin_count(), 1);

    Ok(())
}

#[tokio::test]
async fn webhook_for_unknown_session_is_acknowledged() -> anyhow::Result<()> {
    let h = harness().await;

    h.gateway.queue_event(GatewayEvent::CheckoutCompleted {
        session_id: "cs_test_stale".to_string(),
        payment_status: GatewayPaymentStatus::Paid,
        payment_intent: None,
    });

    // The provider retries on failure; a stale or racing event must still ack
    let ack = h.service.handle_webhook("{}", "valid").await?;
    assert!(ack.received);

    Ok(())
}

#[tokio::test]
async fn webhook_without_settlement_leaves_booking_pending() -> anyhow::Result<()> {
    let h = harness().await;

    let booking = sample_booking("maria@example.com", Some("cs_test_unpaid"));
    let id = booking.id.clone();
    h.repo.create(booking).await?;

    h.gateway.queue_event(GatewayEvent::CheckoutCompleted {
        session_id: "cs_test_unpaid".to_string(),
        payment_status: GatewayPaymentStatus::Unpaid,
        payment_intent: None,
    });
    h.service.handle_webhook("{}", "valid").await?;

    let row = h.repo.find_by_id(&id).await?.expect("booking");
    assert_eq!(row.payment_status, PaymentStatus::Pending);
    assert_eq!(h.notifier.confirmation_count(), 0);

    Ok(())
}

#[tokio::test]
async fn expired_session_never_cancels_automatically() -> anyhow::Result<()> {
    let h = harness().await;

    let booking = sample_booking("maria@example.com", Some("cs_test_expired"));
    let id = booking.id.clone();
    h.repo.create(booking).await?;

    h.gateway.queue_event(GatewayEvent::CheckoutExpired {
        session_id: "cs_test_expired".to_string(),
    });
    let ack = h.service.handle_webhook("{}", "valid").await?;
    assert!(ack.received);

    let row = h.repo.find_by_id(&id).await?.expect("booking");
    assert_eq!(row.payment_status, PaymentStatus::Pending);

    Ok(())
}

#[tokio::test]
async fn paid_booking_never_returns_to_pending() -> anyhow::Result<()> {
    let h = harness().await;

    let booking = sample_booking("maria@example.com", Some("cs_test_final"));
    let id = booking.id.clone();
    h.repo.create(booking).await?;

    h.gateway.queue_event(GatewayEvent::CheckoutCompleted {
        session_id: "cs_test_final".to_string(),
        payment_status: GatewayPaymentStatus::Paid,
        payment_intent: Some("pi_final".to_string()),
    });
    h.service.handle_webhook("{}", "valid").await?;

    // A late expiry event and a verification poll both leave paid alone
    h.gateway.queue_event(GatewayEvent::CheckoutExpired {
        session_id: "cs_test_final".to_string(),
    });
    h.service.handle_webhook("{}", "valid").await?;

    h.gateway
        .insert_session("cs_test_final", GatewayPaymentStatus::Unpaid);
    let _ = h.service.verify_session("cs_test_final").await?;

    let row = h.repo.find_by_id(&id).await?.expect("booking");
    assert_eq!(row.payment_status, PaymentStatus::Paid);

    Ok(())
}

#[tokio::test]
async fn tampered_signature_is_rejected_before_any_update() -> anyhow::Result<()> {
    let h = harness().await;

    let booking = sample_booking("maria@example.com", Some("cs_test_sig"));
    let id = booking.id.clone();
    h.repo.create(booking).await?;

    h.gateway.queue_event(GatewayEvent::CheckoutCompleted {
        session_id: "cs_test_sig".to_string(),
        payment_status: GatewayPaymentStatus::Paid,
        payment_intent: None,
    });

    let err = h.service.handle_webhook("{}", "tampered").await.unwrap_err();
    assert!(matches!(err, AppError::SignatureInvalid));

    let row = h.repo.find_by_id(&id).await?.expect("booking");
    assert_eq!(row.payment_status, PaymentStatus::Pending);

    Ok(())
}

#[tokio::test]
async fn missing_webhook_secret_is_a_configuration_error() -> anyhow::Result<()> {
    let h = harness_with(FakeGateway::without_webhook_secret(), RecordingNotifier::new()).await;

    let err = h.service.handle_webhook("{}", "valid").await.unwrap_err();
    assert!(matches!(err, AppError::Configuration(_)));

    Ok(())
}

#[tokio::test]
async fn verify_session_rejects_malformed_identifiers() -> anyhow::Result<()> {
    let h = harness().await;

    let err = h.service.verify_session("not-cs-prefixed").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    // Malformed identifiers never reach the provider
    assert_eq!(h.gateway.retrieve_call_count(), 0);

    Ok(())
}

#[tokio::test]
async fn verify_session_for_unknown_session_is_not_found() -> anyhow::Result<()> {
    let h = harness().await;

    let err = h.service.verify_session("cs_test_gone").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(h.gateway.retrieve_call_count(), 1);

    Ok(())
}

#[tokio::test]
async fn verify_session_without_linked_booking_is_not_found() -> anyhow::Result<()> {
    let h = harness().await;

    // The provider knows the session but no booking row references it
    h.gateway
        .insert_session("cs_test_orphan", GatewayPaymentStatus::Paid);

    let err = h.service.verify_session("cs_test_orphan").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

#[tokio::test]
async fn verify_session_maps_provider_statuses() -> anyhow::Result<()> {
    let h = harness().await;

    let booking = sample_booking("maria@example.com", Some("cs_test_map"));
    let id = booking.id.clone();
    h.repo.create(booking).await?;

    h.gateway
        .insert_session("cs_test_map", GatewayPaymentStatus::Unpaid);
    let result = h.service.verify_session("cs_test_map").await?;
    assert_eq!(result.payment_status, VerifiedPaymentStatus::Unpaid);

    h.gateway
        .insert_session("cs_test_map", GatewayPaymentStatus::NoPaymentRequired);
    let result = h.service.verify_session("cs_test_map").await?;
    assert_eq!(result.payment_status, VerifiedPaymentStatus::Paid);

    // Anything the mapping does not recognize reports as still processing
    h.gateway
        .insert_session("cs_test_map", GatewayPaymentStatus::Unknown);
    let result = h.service.verify_session("cs_test_map").await?;
    assert_eq!(result.payment_status, VerifiedPaymentStatus::Processing);
    assert_eq!(result.booking.total_price, "45.00");

    // Polling reports; it never reconciles
    let row = h.repo.find_by_id(&id).await?.expect("booking");
    assert_eq!(row.payment_status, PaymentStatus::Pending);

    Ok(())
}
