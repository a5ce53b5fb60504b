//! HTTP API
//!
//! WhatsApp webhook (verification handshake and event delivery), the web
//! form's confirmation endpoint and a read-only booking listing.

mod handlers;
mod types;

pub use handlers::create_router;

use crate::runtime::{BookingStore, Dispatcher, MessageHandler};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub concierge: Arc<dyn MessageHandler>,
    pub bookings: Arc<dyn BookingStore>,
    /// Outbound channel for notices requested over HTTP
    pub dispatcher: Arc<dyn Dispatcher>,
    /// Webhook verification secret; the handshake fails while unset
    pub verify_token: Option<String>,
    pub clinic_name: String,
}

impl AppState {
    pub fn new(
        concierge: Arc<dyn MessageHandler>,
        bookings: Arc<dyn BookingStore>,
        dispatcher: Arc<dyn Dispatcher>,
        verify_token: Option<String>,
        clinic_name: impl Into<String>,
    ) -> Self {
        Self {
            concierge,
            bookings,
            dispatcher,
            verify_token,
            clinic_name: clinic_name.into(),
        }
    }
}
