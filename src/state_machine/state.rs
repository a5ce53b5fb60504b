//! Session state types

use crate::catalog::{Service, Slot};
use crate::db::NewBooking;
use crate::intent::Language;
use serde::{Deserialize, Serialize};

// ============================================================================
// Session State
// ============================================================================

/// Per-sender conversational state
///
/// The two single-shot prompts and the booking flow are variants of one value,
/// so a sender can never wait on both prompts at once and never holds more
/// than one booking draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing pending
    #[default]
    Idle,

    /// Offers validity prompt sent, next message answers it.
    /// A booking interrupted by the offers question is parked here.
    AwaitingOffersConfirm {
        #[serde(default)]
        suspended: Option<BookingProgress>,
    },

    /// Cancellation requested, next message should carry the booking phone
    AwaitingCancelPhone,

    /// Booking details are being collected
    Booking(BookingProgress),
}

impl SessionState {
    pub fn is_awaiting_offers(&self) -> bool {
        matches!(self, SessionState::AwaitingOffersConfirm { .. })
    }

    pub fn is_awaiting_cancel_phone(&self) -> bool {
        matches!(self, SessionState::AwaitingCancelPhone)
    }

    /// The booking draft in progress, including one parked behind the offers prompt
    pub fn draft(&self) -> Option<&BookingDraft> {
        match self {
            SessionState::Booking(progress)
            | SessionState::AwaitingOffersConfirm {
                suspended: Some(progress),
            } => Some(&progress.draft),
            _ => None,
        }
    }

    /// Enter the offers prompt, parking any booking in progress
    pub fn suspend_for_offers(&self) -> SessionState {
        let suspended = match self {
            SessionState::Booking(progress) => Some(progress.clone()),
            SessionState::AwaitingOffersConfirm { suspended } => suspended.clone(),
            SessionState::Idle | SessionState::AwaitingCancelPhone => None,
        };
        SessionState::AwaitingOffersConfirm { suspended }
    }

    /// Drop a pending offers prompt, resuming a parked booking if there was one
    pub fn leave_offers_prompt(&self) -> SessionState {
        match self {
            SessionState::AwaitingOffersConfirm { suspended } => suspended
                .clone()
                .map_or(SessionState::Idle, SessionState::Booking),
            other => other.clone(),
        }
    }

    /// Short name for logs
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingOffersConfirm { .. } => "awaiting_offers_confirm",
            SessionState::AwaitingCancelPhone => "awaiting_cancel_phone",
            SessionState::Booking(progress) => progress.step.label(),
        }
    }
}

// ============================================================================
// Booking Progress
// ============================================================================

/// Position in the booking flow plus what has been collected so far
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingProgress {
    pub step: BookingStep,
    pub draft: BookingDraft,
}

impl BookingProgress {
    pub fn at(step: BookingStep, draft: BookingDraft) -> Self {
        Self { step, draft }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    CollectingName,
    CollectingService,
    CollectingAppointment,
    Confirming,
}

impl BookingStep {
    pub fn label(self) -> &'static str {
        match self {
            BookingStep::CollectingName => "collecting_name",
            BookingStep::CollectingService => "collecting_service",
            BookingStep::CollectingAppointment => "collecting_appointment",
            BookingStep::Confirming => "confirming",
        }
    }
}

/// Partially collected appointment request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub name: Option<String>,
    /// Contact number; the sender's own WhatsApp identity
    pub phone: String,
    pub service: Option<String>,
    pub appointment: Option<String>,
    /// Image sent with the confirmation notice
    pub image: Option<String>,
    /// Language the flow was started in, used when a reply has no letters
    #[serde(default)]
    pub language: Language,
    /// Rows of the slot list last sent, in order
    #[serde(default)]
    pub offered_slots: Vec<Slot>,
}

impl BookingDraft {
    pub fn new(phone: impl Into<String>, language: Language) -> Self {
        Self {
            name: None,
            phone: phone.into(),
            service: None,
            appointment: None,
            image: None,
            language,
            offered_slots: Vec::new(),
        }
    }

    pub fn with_service(mut self, service: &Service) -> Self {
        self.service = Some(service.title(self.language).to_string());
        self.image.clone_from(&service.image);
        self
    }

    pub fn with_slot(mut self, slot: &Slot) -> Self {
        self.appointment = Some(slot.label.clone());
        self
    }

    /// The record to persist, if every required field has been collected
    pub fn to_booking(&self) -> Option<NewBooking> {
        Some(NewBooking {
            name: self.name.clone()?,
            phone: self.phone.clone(),
            service: self.service.clone()?,
            appointment: self.appointment.clone()?,
            image: self.image.clone(),
        })
    }
}

// ============================================================================
// Context
// ============================================================================

/// Inputs to a transition that are not part of the session (immutable)
#[derive(Debug, Clone)]
pub struct ClinicContext {
    pub sender: String,
    pub services: Vec<Service>,
    /// Bookable slots as of the moment the event is handled
    pub slots: Vec<Slot>,
}

impl ClinicContext {
    pub fn new(sender: impl Into<String>, services: Vec<Service>, slots: Vec<Slot>) -> Self {
        Self {
            sender: sender.into(),
            services,
            slots,
        }
    }
}
