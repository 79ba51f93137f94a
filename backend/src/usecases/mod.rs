pub mod booking;
pub mod payment_gateway;
pub mod payment_webhook;
pub mod slot_catalog;
