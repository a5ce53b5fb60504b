//! Runtime for inbound messages
//!
//! Serializes events per sender, filters provider redeliveries, routes each
//! message through the state machine and executes the resulting effects.

mod executor;
mod ledger;
mod notice;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use notice::{send_booking_notice, NoticeDelivery};
pub use traits::*;

use crate::catalog::Catalog;
use crate::intent::Language;
use crate::media::CatalogMedia;
use crate::replies;
use crate::session::{InMemorySessionStore, SessionStore};
use crate::state_machine::{transition, ClinicContext, Event};
use crate::whatsapp::{DispatchError, GraphClient, InboundMessage, MessageBody, OutboundMessage};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use executor::EffectExecutor;
use ledger::MessageLedger;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Type alias for the production concierge with concrete implementations
pub type ProductionConcierge = Concierge<
    InMemorySessionStore,
    GraphClient,
    CatalogMedia<GraphClient>,
    Arc<dyn AudioProcessor>,
    DatabaseBookings,
>;

/// Failure while processing an inbound message; effects already performed stay performed
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Session store error: {0}")]
    Session(String),
    #[error("Dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),
    #[error("Booking store error: {0}")]
    Bookings(String),
}

/// How an inbound message was dealt with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Routed and all effects executed
    Handled,
    /// Redelivery of a message that was already processed
    Duplicate,
    /// Nothing to route (unsupported kind or empty text)
    Ignored,
}

/// Routes inbound messages for every sender
pub struct Concierge<S, D, M, A, B> {
    sessions: S,
    dispatcher: Arc<D>,
    media: M,
    audio: A,
    bookings: B,
    catalog: Arc<Catalog>,
    clock: fn() -> NaiveDateTime,
    sender_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    ledger: std::sync::Mutex<MessageLedger>,
}

fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

impl<S, D, M, A, B> Concierge<S, D, M, A, B>
where
    S: SessionStore,
    D: Dispatcher + 'static,
    M: MediaService,
    A: AudioProcessor,
    B: BookingStore,
{
    pub fn new(
        sessions: S,
        dispatcher: Arc<D>,
        media: M,
        audio: A,
        bookings: B,
        catalog: Arc<Catalog>,
    ) -> Self {
        Self {
            sessions,
            dispatcher,
            media,
            audio,
            bookings,
            catalog,
            clock: local_now,
            sender_locks: Mutex::new(HashMap::new()),
            ledger: std::sync::Mutex::new(MessageLedger::default()),
        }
    }

    /// Fix the time used to offer appointment slots
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Process one inbound message end to end
    pub async fn handle(&self, message: &InboundMessage) -> Result<Outcome, ProcessError> {
        let Some(id) = message.id.as_deref() else {
            return self.route(message).await;
        };

        if !self.ledger().claim(id) {
            tracing::info!(sender = %message.from, message_id = %id, "Dropping redelivered message");
            return Ok(Outcome::Duplicate);
        }
        let result = self.route(message).await;
        match &result {
            Ok(_) => self.ledger().complete(id),
            Err(_) => self.ledger().release(id),
        }
        result
    }

    fn ledger(&self) -> std::sync::MutexGuard<'_, MessageLedger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn route(&self, message: &InboundMessage) -> Result<Outcome, ProcessError> {
        let sender = message.from.as_str();
        let body = message.body();
        match body {
            MessageBody::Unsupported(kind) => {
                tracing::debug!(sender = %sender, kind = %kind, "Ignoring unsupported message");
                return Ok(Outcome::Ignored);
            }
            MessageBody::Text("") => return Ok(Outcome::Ignored),
            _ => {}
        }

        let guard = self.lock_sender(sender).await;
        let result = self.route_locked(sender, body).await;
        drop(guard);
        self.release_sender(sender).await;
        result
    }

    async fn route_locked(
        &self,
        sender: &str,
        body: MessageBody<'_>,
    ) -> Result<Outcome, ProcessError> {
        let state = self
            .sessions
            .get_or_create(sender)
            .await
            .map_err(ProcessError::Session)?;

        let event = match body {
            MessageBody::Text(text) => Event::text(text),
            MessageBody::Interactive(option) => Event::interactive(&option.id, &option.title),
            MessageBody::Audio(media) => match self.audio.transcribe(media).await {
                Ok(text) => {
                    tracing::info!(sender = %sender, chars = text.chars().count(), "Voice note transcribed");
                    Event::text(text)
                }
                Err(e) => {
                    tracing::warn!(sender = %sender, error = %e, "Voice note not transcribed");
                    let lang = state.draft().map_or_else(Language::default, |d| d.language);
                    let reply = OutboundMessage::text(sender, replies::audio_not_understood(lang));
                    self.dispatcher.send(&reply).await?;
                    return Ok(Outcome::Handled);
                }
            },
            MessageBody::Unsupported(_) => return Ok(Outcome::Ignored),
        };

        let context = ClinicContext::new(
            sender,
            self.catalog.services.clone(),
            self.catalog.upcoming_slots((self.clock)()),
        );
        let result = match transition(&state, &context, event) {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(sender = %sender, error = %e, "No transition");
                return Ok(Outcome::Ignored);
            }
        };
        tracing::info!(
            sender = %sender,
            from = state.label(),
            to = result.new_state.label(),
            effects = result.effects.len(),
            "Transition"
        );

        let mut executor = EffectExecutor {
            sender,
            state: &result.new_state,
            sessions: &self.sessions,
            dispatcher: &self.dispatcher,
            media: &self.media,
            bookings: &self.bookings,
            catalog: &self.catalog,
            removed: 0,
        };
        executor.run(result.effects).await?;
        Ok(Outcome::Handled)
    }

    async fn lock_sender(&self, sender: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.sender_locks.lock().await;
            Arc::clone(locks.entry(sender.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Forget the sender's lock once nobody holds or waits on it
    async fn release_sender(&self, sender: &str) {
        let mut locks = self.sender_locks.lock().await;
        if locks
            .get(sender)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(sender);
        }
    }
}

#[async_trait]
impl<S, D, M, A, B> MessageHandler for Concierge<S, D, M, A, B>
where
    S: SessionStore,
    D: Dispatcher + 'static,
    M: MediaService,
    A: AudioProcessor,
    B: BookingStore,
{
    async fn handle(&self, message: &InboundMessage) -> Result<Outcome, ProcessError> {
        Concierge::handle(self, message).await
    }
}
