//! Effect executor
//!
//! Runs the effects of one transition in order against the collaborators,
//! stopping at the first failure.

use super::notice::send_booking_notice;
use super::traits::{BookingStore, Dispatcher, MediaService};
use super::ProcessError;
use crate::catalog::Catalog;
use crate::replies;
use crate::session::SessionStore;
use crate::state_machine::{Effect, SessionState};
use crate::whatsapp::OutboundMessage;
use std::sync::Arc;

/// Executes effects on behalf of one sender
pub(super) struct EffectExecutor<'a, S, D, M, B> {
    pub sender: &'a str,
    /// Session after the transition
    pub state: &'a SessionState,
    pub sessions: &'a S,
    pub dispatcher: &'a Arc<D>,
    pub media: &'a M,
    pub bookings: &'a B,
    pub catalog: &'a Catalog,
    /// Bookings removed by the last cancellation
    pub removed: usize,
}

impl<S, D, M, B> EffectExecutor<'_, S, D, M, B>
where
    S: SessionStore,
    D: Dispatcher + 'static,
    M: MediaService,
    B: BookingStore,
{
    pub async fn run(&mut self, effects: Vec<Effect>) -> Result<(), ProcessError> {
        for effect in effects {
            self.execute(effect).await?;
        }
        Ok(())
    }

    async fn execute(&mut self, effect: Effect) -> Result<(), ProcessError> {
        match effect {
            Effect::PersistState => self
                .sessions
                .upsert(self.sender, self.state)
                .await
                .map_err(ProcessError::Session),

            Effect::ResetSession => {
                tracing::info!(sender = %self.sender, "Session reset");
                self.sessions
                    .delete(self.sender)
                    .await
                    .map_err(ProcessError::Session)
            }

            Effect::SendText { body } => self.send(OutboundMessage::text(self.sender, &body)).await,

            Effect::SendList { list } => self.send(OutboundMessage::list(self.sender, &list)).await,

            Effect::SendButtons { buttons } => {
                self.send(OutboundMessage::buttons(self.sender, &buttons))
                    .await
            }

            Effect::SendLocation { lang } => {
                Ok(self.media.send_location(self.sender, lang).await?)
            }

            Effect::SendOffersValidity { lang } => {
                Ok(self.media.send_offers_validity(self.sender, lang).await?)
            }

            Effect::SendOffersImages { lang } => {
                Ok(self.media.send_offers_images(self.sender, lang).await?)
            }

            Effect::SendDoctors { lang } => Ok(self.media.send_doctors(self.sender, lang).await?),

            Effect::CancelBookings { phone } => {
                self.removed = self
                    .bookings
                    .delete_by_phone(&phone)
                    .await
                    .map_err(ProcessError::Bookings)?;
                tracing::info!(
                    sender = %self.sender,
                    removed = self.removed,
                    "Cancellation processed"
                );
                Ok(())
            }

            Effect::SendCancellationOutcome { lang } => {
                let body = if self.removed == 0 {
                    replies::no_booking_found(lang).to_string()
                } else {
                    replies::cancellation_done(lang, self.removed)
                };
                self.send(OutboundMessage::text(self.sender, &body)).await
            }

            Effect::StoreBooking { booking } => {
                let stored = self
                    .bookings
                    .insert(&booking)
                    .await
                    .map_err(ProcessError::Bookings)?;
                tracing::info!(
                    sender = %self.sender,
                    booking_id = %stored.id,
                    service = %stored.service,
                    appointment = %stored.appointment,
                    "Booking stored"
                );
                Ok(())
            }

            Effect::SendBookingNotice { booking, lang } => {
                let delivery = send_booking_notice(
                    self.dispatcher,
                    self.sender,
                    &self.catalog.clinic_name,
                    &booking,
                    lang,
                )
                .await?;
                tracing::debug!(sender = %self.sender, ?delivery, "Booking notice sent");
                Ok(())
            }
        }
    }

    async fn send(&self, message: OutboundMessage) -> Result<(), ProcessError> {
        Ok(self.dispatcher.send(&message).await?)
    }
}
