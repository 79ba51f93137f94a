use mockall::automock;

use crate::domain::value_objects::bookings::BookingConfirmed;

/// Fire-and-forget hand-off to whoever tells the provider and customer.
/// Implementations must not block the caller.
#[automock]
pub trait BookingNotifier {
    fn booking_confirmed(&self, event: BookingConfirmed);
}
