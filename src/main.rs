use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aerocab::{
    api,
    config::Settings,
    notifications::{NotificationSender, SmtpNotifier},
    payments::{PaymentGateway, StripeGateway},
    repository::SqliteBookingRepository,
    service::BookingService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aerocab=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!(
        "Starting Aerocab server on {}:{}",
        settings.server.host,
        settings.server.port
    );

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    let booking_repo = Arc::new(SqliteBookingRepository::new(db_pool.clone()));

    // Initialize Stripe gateway if configured
    let gateway: Option<Arc<dyn PaymentGateway>> = if settings.stripe.enabled {
        if let Some(api_key) = settings.stripe.secret_key.clone() {
            tracing::info!("Stripe payment processing enabled");
            if settings.stripe.webhook_secret.is_none() {
                tracing::warn!("Stripe webhook secret not set; webhook deliveries will be rejected");
            }
            Some(Arc::new(StripeGateway::new(
                api_key,
                settings.stripe.webhook_secret.clone(),
            )))
        } else {
            tracing::warn!("Stripe enabled but missing secret key");
            None
        }
    } else {
        tracing::info!("Stripe payment processing disabled");
        None
    };

    // Initialize email notifications if configured
    let notifier: Option<Arc<dyn NotificationSender>> = match SmtpNotifier::from_config(&settings.email)
    {
        Some(notifier) => {
            tracing::info!("Email notifications enabled");
            Some(Arc::new(notifier))
        }
        None => {
            tracing::info!("Email notifications disabled");
            None
        }
    };

    let settings = Arc::new(settings);
    let booking_service = Arc::new(BookingService::new(
        booking_repo,
        gateway,
        notifier,
        settings.clone(),
    ));

    let app = api::create_app(booking_service, settings.clone());

    let listener = tokio::net::TcpListener::bind(format!(
        "{}:{}",
        settings.server.host, settings.server.port
    ))
    .await?;

    tracing::info!(
        "Server listening on http://{}:{}",
        settings.server.host,
        settings.server.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}
