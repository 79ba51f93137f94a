pub mod bookings;
pub mod notifications;
pub mod profiles;
pub mod slots;
