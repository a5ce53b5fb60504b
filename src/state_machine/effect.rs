//! Effects produced by state transitions

use crate::db::NewBooking;
use crate::intent::Language;
use crate::whatsapp::{ButtonsMessage, ListMessage};

/// Effects to be executed after a state transition, in order
///
/// `PersistState` follows the last booking store write, or else the replies,
/// so a transition whose effects fail part way leaves the stored session
/// where it was and the provider's redelivery replays it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Store the new session state
    PersistState,

    /// Forget the sender's session entirely
    ResetSession,

    /// Plain text reply to the sender
    SendText { body: String },

    /// Interactive list (services, appointment slots)
    SendList { list: ListMessage },

    /// Interactive reply buttons
    SendButtons { buttons: ButtonsMessage },

    /// Clinic address and map link
    SendLocation { lang: Language },

    /// Offers validity notice and the question whether to send them
    SendOffersValidity { lang: Language },

    /// Offer images
    SendOffersImages { lang: Language },

    /// Doctor profile images
    SendDoctors { lang: Language },

    /// Delete bookings made under `phone`
    CancelBookings { phone: String },

    /// Tell the sender how many bookings the preceding cancellation removed
    SendCancellationOutcome { lang: Language },

    /// Store the finalized booking
    StoreBooking { booking: NewBooking },

    /// Confirmation notice: picture with caption, or text when there is none
    SendBookingNotice { booking: NewBooking, lang: Language },
}

impl Effect {
    pub fn text(body: impl Into<String>) -> Self {
        Effect::SendText { body: body.into() }
    }

    pub fn list(list: ListMessage) -> Self {
        Effect::SendList { list }
    }

    pub fn buttons(buttons: ButtonsMessage) -> Self {
        Effect::SendButtons { buttons }
    }

    /// Whether this effect writes to the booking store
    pub fn writes_bookings(&self) -> bool {
        matches!(self, Effect::CancelBookings { .. } | Effect::StoreBooking { .. })
    }
}
