pub mod bookings;
pub mod profiles;
pub mod slots;
