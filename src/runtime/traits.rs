//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the concierge with mock implementations.

use super::{Outcome, ProcessError};
use crate::audio::AudioError;
use crate::db::{Booking, Database, NewBooking};
use crate::intent::Language;
use crate::whatsapp::{DispatchError, GraphClient, InboundMessage, MediaRef, OutboundMessage};
use async_trait::async_trait;
use std::sync::Arc;

/// Entry point the webhook hands inbound messages to
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: &InboundMessage) -> Result<Outcome, ProcessError>;
}

/// Outbound message channel to the sender
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Deliver one message; a rejected or undeliverable payload is an error
    async fn send(&self, message: &OutboundMessage) -> Result<(), DispatchError>;
}

/// Canned media replies (location, offers, doctors)
#[async_trait]
pub trait MediaService: Send + Sync {
    async fn send_location(&self, to: &str, lang: Language) -> Result<(), DispatchError>;

    /// Offers validity notice, which also asks whether to send the offers
    async fn send_offers_validity(&self, to: &str, lang: Language) -> Result<(), DispatchError>;

    async fn send_offers_images(&self, to: &str, lang: Language) -> Result<(), DispatchError>;

    async fn send_doctors(&self, to: &str, lang: Language) -> Result<(), DispatchError>;
}

/// Turns a voice note into text
#[async_trait]
pub trait AudioProcessor: Send + Sync {
    async fn transcribe(&self, media: &MediaRef) -> Result<String, AudioError>;
}

/// Storage for finalized bookings
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert(&self, booking: &NewBooking) -> Result<Booking, String>;

    /// Remove every booking under `phone`, returning how many were removed
    async fn delete_by_phone(&self, phone: &str) -> Result<usize, String>;

    /// All bookings, newest first
    async fn list(&self) -> Result<Vec<Booking>, String>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: Dispatcher + ?Sized> Dispatcher for Arc<T> {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DispatchError> {
        (**self).send(message).await
    }
}

#[async_trait]
impl<T: MediaService + ?Sized> MediaService for Arc<T> {
    async fn send_location(&self, to: &str, lang: Language) -> Result<(), DispatchError> {
        (**self).send_location(to, lang).await
    }

    async fn send_offers_validity(&self, to: &str, lang: Language) -> Result<(), DispatchError> {
        (**self).send_offers_validity(to, lang).await
    }

    async fn send_offers_images(&self, to: &str, lang: Language) -> Result<(), DispatchError> {
        (**self).send_offers_images(to, lang).await
    }

    async fn send_doctors(&self, to: &str, lang: Language) -> Result<(), DispatchError> {
        (**self).send_doctors(to, lang).await
    }
}

#[async_trait]
impl<T: AudioProcessor + ?Sized> AudioProcessor for Arc<T> {
    async fn transcribe(&self, media: &MediaRef) -> Result<String, AudioError> {
        (**self).transcribe(media).await
    }
}

#[async_trait]
impl<T: BookingStore + ?Sized> BookingStore for Arc<T> {
    async fn insert(&self, booking: &NewBooking) -> Result<Booking, String> {
        (**self).insert(booking).await
    }

    async fn delete_by_phone(&self, phone: &str) -> Result<usize, String> {
        (**self).delete_by_phone(phone).await
    }

    async fn list(&self) -> Result<Vec<Booking>, String> {
        (**self).list().await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

#[async_trait]
impl Dispatcher for GraphClient {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DispatchError> {
        GraphClient::send(self, message).await
    }
}

/// Adapter to use Database as BookingStore
#[derive(Clone)]
pub struct DatabaseBookings {
    db: Database,
}

impl DatabaseBookings {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookingStore for DatabaseBookings {
    async fn insert(&self, booking: &NewBooking) -> Result<Booking, String> {
        self.db.insert_booking(booking).map_err(|e| e.to_string())
    }

    async fn delete_by_phone(&self, phone: &str) -> Result<usize, String> {
        self.db
            .delete_bookings_by_phone(phone)
            .map_err(|e| e.to_string())
    }

    async fn list(&self) -> Result<Vec<Booking>, String> {
        self.db.list_bookings().map_err(|e| e.to_string())
    }
}
