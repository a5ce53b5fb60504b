//! Booking confirmation notice
//!
//! Shared by the chat flow and the web form endpoint.

use super::traits::Dispatcher;
use crate::db::NewBooking;
use crate::intent::Language;
use crate::replies;
use crate::whatsapp::{DispatchError, OutboundMessage};
use std::sync::Arc;

/// How a booking notice reached the patient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeDelivery {
    /// Picture with caption; the contact line follows in the background
    Image,
    /// Picture rejected, same content sent as text
    TextFallback,
    /// No usable picture
    Text,
}

/// Send the confirmation for `booking` to `to`.
///
/// Only a failure of the final text send is an error.
pub async fn send_booking_notice<D>(
    dispatcher: &Arc<D>,
    to: &str,
    clinic: &str,
    booking: &NewBooking,
    lang: Language,
) -> Result<NoticeDelivery, DispatchError>
where
    D: Dispatcher + ?Sized + 'static,
{
    let link = booking
        .image
        .as_deref()
        .filter(|link| link.starts_with("http"));

    let fell_back = match link {
        Some(link) => {
            let caption = replies::booking_confirmed(lang, clinic, booking);
            match dispatcher
                .send(&OutboundMessage::image(to, link, &caption))
                .await
            {
                Ok(()) => {
                    spawn_follow_up(dispatcher, OutboundMessage::text(to, replies::contact_line(lang)));
                    return Ok(NoticeDelivery::Image);
                }
                Err(e) => {
                    tracing::warn!(
                        to = %to,
                        error = %e,
                        "Confirmation image rejected, falling back to text"
                    );
                    true
                }
            }
        }
        None => false,
    };

    let body = replies::booking_confirmed_text(lang, clinic, booking);
    dispatcher.send(&OutboundMessage::text(to, &body)).await?;
    Ok(if fell_back {
        NoticeDelivery::TextFallback
    } else {
        NoticeDelivery::Text
    })
}

/// Send a secondary message in the background; failures are only logged
fn spawn_follow_up<D>(dispatcher: &Arc<D>, message: OutboundMessage)
where
    D: Dispatcher + ?Sized + 'static,
{
    let dispatcher = Arc::clone(dispatcher);
    tokio::spawn(async move {
        if let Err(e) = dispatcher.send(&message).await {
            tracing::warn!(to = %message.to, error = %e, "Follow-up message failed");
        }
    });
}
