pub mod bookings;
pub mod payment_webhook;
pub mod search;
