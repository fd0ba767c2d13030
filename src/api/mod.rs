pub mod handlers;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{config::Settings, service::BookingService};
use state::AppState;

pub fn create_app(booking_service: Arc<BookingService>, settings: Arc<Settings>) -> Router {
    let app_state = AppState::new(booking_service, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))
        // API routes
        .nest("/api", api_routes())
        // Add state to the router
        .with_state(app_state)
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive()) // Configure properly for production
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/bookings", booking_routes())
        .nest("/payments", payment_routes())
}

fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/cash", post(handlers::bookings::create_cash))
        .route("/checkout", post(handlers::bookings::create_checkout))
        .route("/recent", get(handlers::bookings::recent))
}

fn payment_routes() -> Router<AppState> {
    Router::new()
        // Public webhook endpoint; must see the raw body
        .route("/webhook/stripe", post(handlers::payments::stripe_webhook))
        .route("/verify-session", get(handlers::payments::verify_session))
}
