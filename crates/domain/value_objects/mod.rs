pub mod bank_details;
pub mod bookings;
pub mod deposit_holds;
pub mod deposits;
pub mod enums;
pub mod payment_events;
pub mod slot_search;
