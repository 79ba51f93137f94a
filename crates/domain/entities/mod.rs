pub mod bookings;
pub mod payment_events;
pub mod profiles;
pub mod slots;
