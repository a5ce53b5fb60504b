//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use crate::audio::AudioError;
use crate::db::{phone_suffix, Booking, NewBooking};
use crate::intent::Language;
use crate::session::{InMemorySessionStore, SessionStore};
use crate::state_machine::SessionState;
use crate::whatsapp::{
    DispatchError, InboundMessage, InteractiveReply, MediaRef, OutboundContent, OutboundMessage,
    SelectedOption, TextContent,
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

// ============================================================================
// Mock Dispatcher
// ============================================================================

/// Records every delivered message
#[derive(Default)]
pub struct MockDispatcher {
    sent: Mutex<Vec<OutboundMessage>>,
    fail_images: bool,
    fail_all: AtomicBool,
}

impl MockDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every image payload
    pub fn failing_images(mut self) -> Self {
        self.fail_images = true;
        self
    }

    /// Reject everything until switched back
    pub fn set_failing(&self, failing: bool) {
        self.fail_all.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Bodies of the text messages delivered to `to`
    pub fn texts_to(&self, to: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|m| m.to == to)
            .filter_map(|m| match m.content {
                OutboundContent::Text { text } => Some(text.body),
                _ => None,
            })
            .collect()
    }

    /// `(link, caption)` of the images delivered to `to`
    pub fn images_to(&self, to: &str) -> Vec<(String, String)> {
        self.sent()
            .into_iter()
            .filter(|m| m.to == to)
            .filter_map(|m| match m.content {
                OutboundContent::Image { image } => Some((image.link, image.caption)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Dispatcher for MockDispatcher {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DispatchError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(DispatchError::network("mock dispatcher offline"));
        }
        if self.fail_images && matches!(message.content, OutboundContent::Image { .. }) {
            return Err(DispatchError::rejected("mock image rejected"));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

// ============================================================================
// Mock Media Service
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCall {
    Location,
    OffersValidity,
    OffersImages,
    Doctors,
}

/// Records media requests instead of sending anything
#[derive(Default)]
pub struct MockMedia {
    calls: Mutex<Vec<(MediaCall, String, Language)>>,
}

impl MockMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(MediaCall, String, Language)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: MediaCall, to: &str, lang: Language) -> Result<(), DispatchError> {
        self.calls.lock().unwrap().push((call, to.to_string(), lang));
        Ok(())
    }
}

#[async_trait]
impl MediaService for MockMedia {
    async fn send_location(&self, to: &str, lang: Language) -> Result<(), DispatchError> {
        self.record(MediaCall::Location, to, lang)
    }

    async fn send_offers_validity(&self, to: &str, lang: Language) -> Result<(), DispatchError> {
        self.record(MediaCall::OffersValidity, to, lang)
    }

    async fn send_offers_images(&self, to: &str, lang: Language) -> Result<(), DispatchError> {
        self.record(MediaCall::OffersImages, to, lang)
    }

    async fn send_doctors(&self, to: &str, lang: Language) -> Result<(), DispatchError> {
        self.record(MediaCall::Doctors, to, lang)
    }
}

// ============================================================================
// Mock Audio Processor
// ============================================================================

/// Returns a fixed transcript, or fails when built with [`MockAudio::failing`]
pub struct MockAudio {
    transcript: Option<String>,
    pub requests: Mutex<Vec<String>>,
}

impl MockAudio {
    pub fn transcript(text: impl Into<String>) -> Self {
        Self {
            transcript: Some(text.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            transcript: None,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AudioProcessor for MockAudio {
    async fn transcribe(&self, media: &MediaRef) -> Result<String, AudioError> {
        self.requests.lock().unwrap().push(media.id.clone());
        self.transcript.clone().ok_or(AudioError::Empty)
    }
}

// ============================================================================
// Mock Booking Store
// ============================================================================

/// In-memory booking store that records cancellation requests
#[derive(Default)]
pub struct MockBookings {
    bookings: Mutex<Vec<Booking>>,
    cancellations: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl MockBookings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn stored(&self) -> Vec<Booking> {
        self.bookings.lock().unwrap().clone()
    }

    pub fn cancellations(&self) -> Vec<String> {
        self.cancellations.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err("mock booking store unavailable".to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl BookingStore for MockBookings {
    async fn insert(&self, booking: &NewBooking) -> Result<Booking, String> {
        self.check()?;
        let stored = Booking {
            id: uuid::Uuid::new_v4().to_string(),
            name: booking.name.clone(),
            phone: booking.phone.clone(),
            service: booking.service.clone(),
            appointment: booking.appointment.clone(),
            image: booking.image.clone(),
            created_at: Utc::now(),
        };
        self.bookings.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn delete_by_phone(&self, phone: &str) -> Result<usize, String> {
        self.check()?;
        self.cancellations.lock().unwrap().push(phone.to_string());
        let suffix = phone_suffix(phone);
        let mut bookings = self.bookings.lock().unwrap();
        let before = bookings.len();
        bookings.retain(|b| b.phone != phone && (suffix.is_none() || phone_suffix(&b.phone) != suffix));
        Ok(before - bookings.len())
    }

    async fn list(&self) -> Result<Vec<Booking>, String> {
        self.check()?;
        let mut all = self.stored();
        all.reverse();
        Ok(all)
    }
}

// ============================================================================
// Counting Session Store
// ============================================================================

/// In-memory sessions that count every store access
#[derive(Default)]
pub struct CountingSessions {
    inner: InMemorySessionStore,
    calls: AtomicUsize,
}

impl CountingSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionStore for CountingSessions {
    async fn get(&self, sender: &str) -> Result<Option<SessionState>, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get(sender).await
    }

    async fn upsert(&self, sender: &str, state: &SessionState) -> Result<(), String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert(sender, state).await
    }

    async fn delete(&self, sender: &str) -> Result<(), String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(sender).await
    }
}

// ============================================================================
// Inbound Message Builders
// ============================================================================

fn inbound(from: &str, id: Option<&str>, message_type: &str) -> InboundMessage {
    InboundMessage {
        id: id.map(String::from),
        from: from.to_string(),
        message_type: message_type.to_string(),
        timestamp: None,
        text: None,
        audio: None,
        interactive: None,
    }
}

pub fn text_message(from: &str, id: Option<&str>, body: &str) -> InboundMessage {
    InboundMessage {
        text: Some(TextContent {
            body: body.to_string(),
        }),
        ..inbound(from, id, "text")
    }
}

pub fn reply_message(from: &str, id: Option<&str>, reply_id: &str, title: &str) -> InboundMessage {
    InboundMessage {
        interactive: Some(InteractiveReply {
            reply_type: "button_reply".to_string(),
            button_reply: Some(SelectedOption {
                id: reply_id.to_string(),
                title: title.to_string(),
            }),
            list_reply: None,
        }),
        ..inbound(from, id, "interactive")
    }
}

pub fn audio_message(from: &str, id: Option<&str>, media_id: &str) -> InboundMessage {
    InboundMessage {
        audio: Some(MediaRef {
            id: media_id.to_string(),
            mime_type: Some("audio/ogg; codecs=opus".to_string()),
        }),
        ..inbound(from, id, "audio")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::replies;
    use crate::runtime::{Concierge, Outcome, ProcessError};
    use crate::state_machine::transition::{CONFIRM_BOOKING_ID, SERVICE_PREFIX};
    use crate::state_machine::BookingStep;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::sync::Arc;

    const SARA: &str = "966554412398";

    /// Sunday 2026-10-18 08:00, before the first slot of the day
    fn sunday_morning() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    type TestConcierge =
        Concierge<Arc<CountingSessions>, MockDispatcher, Arc<MockMedia>, Arc<MockAudio>, Arc<MockBookings>>;

    struct Harness {
        concierge: TestConcierge,
        sessions: Arc<CountingSessions>,
        dispatcher: Arc<MockDispatcher>,
        media: Arc<MockMedia>,
        audio: Arc<MockAudio>,
        bookings: Arc<MockBookings>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with(MockDispatcher::new(), MockAudio::transcript("where is the clinic"))
        }

        fn with(dispatcher: MockDispatcher, audio: MockAudio) -> Self {
            let mut catalog = Catalog::default();
            catalog.services[0].image = Some("https://img.example/checkup.png".to_string());

            let sessions = Arc::new(CountingSessions::new());
            let dispatcher = Arc::new(dispatcher);
            let media = Arc::new(MockMedia::new());
            let audio = Arc::new(audio);
            let bookings = Arc::new(MockBookings::new());
            let concierge = Concierge::new(
                sessions.clone(),
                dispatcher.clone(),
                media.clone(),
                audio.clone(),
                bookings.clone(),
                Arc::new(catalog),
            )
            .with_clock(sunday_morning);
            Self {
                concierge,
                sessions,
                dispatcher,
                media,
                audio,
                bookings,
            }
        }

        async fn text(&self, body: &str) -> Outcome {
            self.concierge
                .handle(&text_message(SARA, None, body))
                .await
                .unwrap()
        }

        async fn state(&self) -> Option<SessionState> {
            self.sessions.get(SARA).await.unwrap()
        }

        /// Body texts of every list or button message sent, in order
        fn interactive_bodies(&self) -> Vec<String> {
            self.dispatcher
                .sent()
                .into_iter()
                .filter_map(|m| match m.content {
                    OutboundContent::Interactive { interactive } => {
                        interactive["body"]["text"].as_str().map(String::from)
                    }
                    _ => None,
                })
                .collect()
        }

        async fn step(&self) -> Option<BookingStep> {
            match self.state().await? {
                SessionState::Booking(progress) => Some(progress.step),
                _ => None,
            }
        }

        /// Walk a new booking up to the confirmation buttons
        async fn book_until_confirm(&self, service: &str) {
            self.text("I want to book").await;
            self.text("Sara Ali").await;
            self.concierge
                .handle(&reply_message(SARA, None, &format!("{SERVICE_PREFIX}{service}"), "x"))
                .await
                .unwrap();
            self.text("1").await;
        }
    }

    #[tokio::test]
    async fn test_greeting_from_new_sender() {
        let h = Harness::new();
        assert_eq!(h.text("hi").await, Outcome::Handled);

        assert_eq!(
            h.dispatcher.texts_to(SARA),
            vec![replies::greeting(Language::English).to_string()]
        );
        let state = h.state().await.unwrap();
        assert_eq!(state, SessionState::Idle);
        assert!(state.draft().is_none());
    }

    #[tokio::test]
    async fn test_ban_word_resets_session() {
        let h = Harness::new();
        h.text("book").await;
        h.text("Sara Ali").await;
        assert!(h.state().await.unwrap().draft().is_some());
        let before = h.dispatcher.sent().len();

        h.text("you are stupid").await;

        assert_eq!(h.state().await, None);
        let sent = h.dispatcher.sent();
        assert_eq!(sent.len(), before + 1);
        assert_eq!(
            h.dispatcher.texts_to(SARA).last().map(String::as_str),
            Some(replies::banned(Language::English))
        );
    }

    #[tokio::test]
    async fn test_cancellation_by_phone() {
        let h = Harness::new();
        h.text("cancel my booking").await;
        assert_eq!(h.state().await, Some(SessionState::AwaitingCancelPhone));

        h.text("abc").await;
        assert_eq!(h.state().await, Some(SessionState::AwaitingCancelPhone));
        assert!(h.bookings.cancellations().is_empty());

        h.text("0554412398").await;
        assert_eq!(h.state().await, Some(SessionState::Idle));
        assert_eq!(h.bookings.cancellations(), vec!["0554412398".to_string()]);
        assert_eq!(
            h.dispatcher.texts_to(SARA).last().map(String::as_str),
            Some(replies::no_booking_found(Language::Arabic))
        );
    }

    #[tokio::test]
    async fn test_cancellation_removes_existing_booking() {
        let h = Harness::new();
        h.book_until_confirm("cleaning").await;
        h.text("yes").await;
        assert_eq!(h.bookings.stored().len(), 1);

        h.text("cancel").await;
        h.text("055 441 2398").await;
        assert!(h.bookings.stored().is_empty());
        assert_eq!(
            h.dispatcher.texts_to(SARA).last(),
            Some(&replies::cancellation_done(Language::Arabic, 1))
        );
    }

    #[tokio::test]
    async fn test_finalize_with_image_notice() {
        let h = Harness::new();
        h.book_until_confirm("checkup").await;

        let SessionState::Booking(progress) = h.state().await.unwrap() else {
            panic!("expected booking in progress");
        };
        assert_eq!(progress.step, BookingStep::Confirming);
        assert_eq!(progress.draft.appointment.as_deref(), Some("Sun 18 Oct 10:00"));

        h.concierge
            .handle(&reply_message(SARA, None, CONFIRM_BOOKING_ID, "Confirm ✅"))
            .await
            .unwrap();

        let stored = h.bookings.stored();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "Sara Ali");
        assert_eq!(stored[0].phone, SARA);
        assert_eq!(stored[0].service, "Checkup");

        let images = h.dispatcher.images_to(SARA);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].0, "https://img.example/checkup.png");
        assert!(images[0].1.contains("Sara Ali"));
        assert!(!h
            .dispatcher
            .texts_to(SARA)
            .iter()
            .any(|t| t.contains("Hello Sara Ali")));

        assert!(h.state().await.unwrap().draft().is_none());
    }

    #[tokio::test]
    async fn test_rejected_image_falls_back_to_text() {
        let h = Harness::with(
            MockDispatcher::new().failing_images(),
            MockAudio::failing(),
        );
        h.book_until_confirm("checkup").await;
        h.text("yes").await;

        assert_eq!(h.bookings.stored().len(), 1);
        assert!(h.dispatcher.images_to(SARA).is_empty());
        let notices: Vec<_> = h
            .dispatcher
            .texts_to(SARA)
            .into_iter()
            .filter(|t| t.contains("Hello Sara Ali"))
            .collect();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].ends_with(replies::contact_line(Language::English)));
    }

    #[tokio::test]
    async fn test_finalize_without_image_sends_text() {
        let h = Harness::new();
        h.book_until_confirm("cleaning").await;
        h.text("ok").await;

        assert_eq!(h.bookings.stored().len(), 1);
        assert!(h.dispatcher.images_to(SARA).is_empty());
        let notices = h
            .dispatcher
            .texts_to(SARA)
            .into_iter()
            .filter(|t| t.contains("Hello Sara Ali"))
            .count();
        assert_eq!(notices, 1);
        assert_eq!(h.state().await, Some(SessionState::Idle));
    }

    #[tokio::test]
    async fn test_redelivery_is_dropped() {
        let h = Harness::new();
        let message = text_message(SARA, Some("wamid.1"), "hello");

        assert_eq!(h.concierge.handle(&message).await.unwrap(), Outcome::Handled);
        assert_eq!(h.concierge.handle(&message).await.unwrap(), Outcome::Duplicate);
        assert_eq!(h.dispatcher.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_message_is_retried_on_redelivery() {
        let h = Harness::new();
        let message = text_message(SARA, Some("wamid.2"), "hello");

        h.dispatcher.set_failing(true);
        let err = h.concierge.handle(&message).await.unwrap_err();
        assert!(matches!(err, ProcessError::Dispatch(_)));

        h.dispatcher.set_failing(false);
        assert_eq!(h.concierge.handle(&message).await.unwrap(), Outcome::Handled);
        assert_eq!(h.dispatcher.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces() {
        let h = Harness::new();
        h.book_until_confirm("cleaning").await;
        h.bookings.set_failing(true);

        let confirm = text_message(SARA, Some("wamid.7"), "yes");
        let err = h.concierge.handle(&confirm).await.unwrap_err();
        assert!(matches!(err, ProcessError::Bookings(_)));
        // Nothing was committed, the draft waits for the retry
        assert_eq!(h.step().await, Some(BookingStep::Confirming));
        assert!(h.bookings.stored().is_empty());

        h.bookings.set_failing(false);
        assert_eq!(h.concierge.handle(&confirm).await.unwrap(), Outcome::Handled);
        assert_eq!(h.bookings.stored().len(), 1);
        assert_eq!(h.state().await, Some(SessionState::Idle));
    }

    #[tokio::test]
    async fn test_notice_failure_keeps_stored_booking() {
        let h = Harness::new();
        h.book_until_confirm("cleaning").await;
        h.dispatcher.set_failing(true);

        let confirm = text_message(SARA, Some("wamid.8"), "yes");
        assert!(h.concierge.handle(&confirm).await.is_err());
        // The insert is committed with the session, so a retry cannot book twice
        assert_eq!(h.bookings.stored().len(), 1);
        assert_eq!(h.state().await, Some(SessionState::Idle));
    }

    #[tokio::test]
    async fn test_failed_reply_leaves_state_for_retry() {
        let h = Harness::new();
        h.text("I want to book").await;
        h.dispatcher.set_failing(true);

        let name = text_message(SARA, Some("wamid.9"), "Sara Ali");
        assert!(h.concierge.handle(&name).await.is_err());
        assert_eq!(h.step().await, Some(BookingStep::CollectingName));

        h.dispatcher.set_failing(false);
        assert_eq!(h.concierge.handle(&name).await.unwrap(), Outcome::Handled);
        assert_eq!(h.step().await, Some(BookingStep::CollectingService));
        assert_eq!(
            h.interactive_bodies(),
            vec![replies::choose_service(Language::English, "Sara Ali")]
        );
    }

    #[tokio::test]
    async fn test_media_intents_use_media_service() {
        let h = Harness::new();
        h.text("location").await;
        h.text("العروض").await;
        h.text("نعم").await;
        h.text("doctors").await;

        let calls: Vec<_> = h.media.calls().into_iter().map(|(c, _, l)| (c, l)).collect();
        assert_eq!(
            calls,
            vec![
                (MediaCall::Location, Language::English),
                (MediaCall::OffersValidity, Language::Arabic),
                (MediaCall::OffersImages, Language::Arabic),
                (MediaCall::Doctors, Language::English),
            ]
        );
        assert_eq!(h.state().await, Some(SessionState::Idle));
    }

    #[tokio::test]
    async fn test_voice_note_routed_as_text() {
        let h = Harness::new();
        let outcome = h
            .concierge
            .handle(&audio_message(SARA, Some("wamid.3"), "media-9"))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(*h.audio.requests.lock().unwrap(), vec!["media-9".to_string()]);
        assert_eq!(h.media.calls()[0].0, MediaCall::Location);
    }

    #[tokio::test]
    async fn test_untranscribable_voice_note() {
        let h = Harness::with(MockDispatcher::new(), MockAudio::failing());
        h.concierge
            .handle(&audio_message(SARA, None, "media-9"))
            .await
            .unwrap();

        assert_eq!(
            h.dispatcher.texts_to(SARA),
            vec![replies::audio_not_understood(Language::Arabic).to_string()]
        );
        assert_eq!(h.state().await, Some(SessionState::Idle));
    }

    #[tokio::test]
    async fn test_unsupported_messages_skip_session_store() {
        let h = Harness::new();
        let mut sticker = text_message(SARA, Some("wamid.4"), "");
        sticker.message_type = "sticker".to_string();

        assert_eq!(h.concierge.handle(&sticker).await.unwrap(), Outcome::Ignored);
        assert_eq!(h.text("   ").await, Outcome::Ignored);
        assert_eq!(h.sessions.calls(), 0);
        assert!(h.dispatcher.sent().is_empty());
    }

    #[tokio::test]
    async fn test_same_sender_events_are_serialized() {
        let h = Harness::new();
        h.text("book").await;

        // Both messages see the state left by the other, whichever runs first
        let first = text_message(SARA, Some("wamid.5"), "Sara Ali");
        let second = text_message(SARA, Some("wamid.6"), "Sara Ali");
        let (a, b) = tokio::join!(h.concierge.handle(&first), h.concierge.handle(&second));
        assert_eq!(a.unwrap(), Outcome::Handled);
        assert_eq!(b.unwrap(), Outcome::Handled);

        let SessionState::Booking(progress) = h.state().await.unwrap() else {
            panic!("expected booking in progress");
        };
        // Name accepted once, then "Sara Ali" is not a service and the list is re-sent
        assert_eq!(progress.step, BookingStep::CollectingService);
        assert_eq!(progress.draft.name.as_deref(), Some("Sara Ali"));
        assert_eq!(
            h.interactive_bodies(),
            vec![
                replies::choose_service(Language::English, "Sara Ali"),
                replies::invalid_service(Language::English).to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_senders_are_independent() {
        let h = Harness::new();
        h.text("book").await;
        h.concierge
            .handle(&text_message("966500000001", None, "hello"))
            .await
            .unwrap();

        assert!(h.state().await.unwrap().draft().is_some());
        assert_eq!(
            h.sessions.get("966500000001").await.unwrap(),
            Some(SessionState::Idle)
        );
    }
}
