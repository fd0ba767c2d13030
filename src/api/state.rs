use std::sync::Arc;

use crate::{config::Settings, service::BookingService};

#[derive(Clone)]
pub struct AppState {
    pub booking_service: Arc<BookingService>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(booking_service: Arc<BookingService>, settings: Arc<Settings>) -> Self {
        Self {
            booking_service,
            settings,
        }
    }
}
