pub mod account_statuses;
pub mod booking_statuses;
pub mod slot_statuses;
