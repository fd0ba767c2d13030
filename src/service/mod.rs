pub mod booking_service;

pub use booking_service::{
    BookingDetails, BookingRequest, BookingService, BookingSummary, CreatedBooking,
    CreatedCheckout, RequestContext, SessionVerification, VerifiedPaymentStatus, WebhookAck,
};
