//! Pure state transition function
//!
//! Given the sender's session, the clinic context and one inbound event, the
//! transition decides the next session and the effects to run. It performs
//! no I/O; the runtime executes the returned effects in order.

use super::{BookingDraft, BookingProgress, BookingStep, ClinicContext, Effect, Event, SessionState};
use crate::catalog::{Service, Slot, MAX_LIST_ROWS};
use crate::intent::{classify, keywords, IntentKind, Language, Utterance, MIN_PHONE_DIGITS};
use crate::replies;
use crate::whatsapp::{ButtonsMessage, ListMessage, ListRow, ReplyButton};
use std::ops::RangeInclusive;
use thiserror::Error;

/// Row id prefix of the service list
pub const SERVICE_PREFIX: &str = "service:";
/// Row id prefix of the appointment slot list
pub const SLOT_PREFIX: &str = "slot:";
pub const CONFIRM_BOOKING_ID: &str = "booking:confirm";
pub const CANCEL_BOOKING_ID: &str = "booking:cancel";

const NAME_CHARS: RangeInclusive<usize> = 2..=60;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    /// Add `PersistState` when the session moved, unless it is being reset.
    ///
    /// It goes right after the last booking store write, or after every
    /// reply when there is none.
    fn persisting_changes(mut self, previous: &SessionState) -> Self {
        if self.new_state == *previous || self.effects.contains(&Effect::ResetSession) {
            return self;
        }
        let at = self
            .effects
            .iter()
            .rposition(Effect::writes_bookings)
            .map_or(self.effects.len(), |index| index + 1);
        self.effects.insert(at, Effect::PersistState);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Message has no text")]
    EmptyMessage,
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs.
pub fn transition(
    state: &SessionState,
    context: &ClinicContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    let result = match event {
        Event::Text { text } => on_text(state, context, &text)?,
        Event::Interactive { reply_id, title } => {
            on_interactive(state, context, &reply_id, &title)
        }
    };
    Ok(result.persisting_changes(state))
}

fn stay(state: &SessionState) -> TransitionResult {
    TransitionResult::new(state.clone())
}

// ============================================================================
// Free Text
// ============================================================================

fn on_text(
    state: &SessionState,
    context: &ClinicContext,
    text: &str,
) -> Result<TransitionResult, TransitionError> {
    let fallback = state.draft().map_or_else(Language::default, |d| d.language);
    let utterance = Utterance::new(text, fallback);
    if utterance.is_empty() {
        return Err(TransitionError::EmptyMessage);
    }
    let lang = utterance.language();
    let intent = classify(&utterance, state);

    // The offers prompt is single-shot: anything past it in the cascade drops it
    let state = if intent.precedes_offers_prompt() {
        state.clone()
    } else {
        state.leave_offers_prompt()
    };

    let result = match intent {
        IntentKind::Greeting => stay(&state).with_effect(Effect::text(replies::greeting(lang))),
        IntentKind::Banned => TransitionResult::new(SessionState::Idle)
            .with_effect(Effect::ResetSession)
            .with_effect(Effect::text(replies::banned(lang))),
        IntentKind::Location => stay(&state).with_effect(Effect::SendLocation { lang }),
        IntentKind::Offers => TransitionResult::new(state.suspend_for_offers())
            .with_effect(Effect::SendOffersValidity { lang }),
        IntentKind::OffersConfirmation => TransitionResult::new(state.leave_offers_prompt())
            .with_effect(Effect::SendOffersImages { lang }),
        IntentKind::Doctors => stay(&state).with_effect(Effect::SendDoctors { lang }),
        IntentKind::CancelRequest => TransitionResult::new(SessionState::AwaitingCancelPhone)
            .with_effect(Effect::text(replies::cancel_phone_prompt(lang))),
        IntentKind::CancelPhone => cancel_phone(&utterance),
        IntentKind::BookingInput => booking_text(&state, context, &utterance),
    };
    Ok(result)
}

fn cancel_phone(utterance: &Utterance) -> TransitionResult {
    let lang = utterance.language();
    let phone = utterance.digits();
    if phone.len() < MIN_PHONE_DIGITS {
        return TransitionResult::new(SessionState::AwaitingCancelPhone)
            .with_effect(Effect::text(replies::invalid_cancel_phone(lang)));
    }
    TransitionResult::new(SessionState::Idle).with_effects([
        Effect::CancelBookings { phone },
        Effect::SendCancellationOutcome { lang },
    ])
}

fn booking_text(
    state: &SessionState,
    context: &ClinicContext,
    utterance: &Utterance,
) -> TransitionResult {
    match state {
        SessionState::Booking(progress) => booking_step(progress, context, utterance),
        _ if utterance.mentions(keywords::BOOKING) => {
            start_booking(context, utterance.language())
        }
        _ => stay(state).with_effect(Effect::text(replies::help(utterance.language()))),
    }
}

fn booking_step(
    progress: &BookingProgress,
    context: &ClinicContext,
    utterance: &Utterance,
) -> TransitionResult {
    let draft = progress.draft.clone();
    let lang = draft.language;

    match progress.step {
        BookingStep::CollectingName => match valid_name(utterance.raw()) {
            Some(name) => {
                let body = replies::choose_service(lang, &name);
                let draft = BookingDraft {
                    name: Some(name),
                    ..draft
                };
                TransitionResult::new(SessionState::Booking(BookingProgress::at(
                    BookingStep::CollectingService,
                    draft,
                )))
                .with_effect(Effect::list(service_list(context, lang, body)))
            }
            None => TransitionResult::new(SessionState::Booking(progress.clone()))
                .with_effect(Effect::text(replies::invalid_name(lang))),
        },
        BookingStep::CollectingService => match pick_service(context, utterance) {
            Some(service) => service_chosen(context, draft.with_service(service)),
            None => reprompt(progress, context),
        },
        BookingStep::CollectingAppointment => match pick_slot(&progress.draft, context, utterance) {
            Some(slot) => slot_chosen(draft.with_slot(slot)),
            None => reprompt(progress, context),
        },
        BookingStep::Confirming => {
            if utterance.mentions(keywords::NEGATIVE) {
                discard_booking(lang)
            } else if utterance.mentions(keywords::AFFIRMATIVE) {
                finalize_booking(progress, context)
            } else {
                TransitionResult::new(SessionState::Booking(progress.clone()))
                    .with_effect(Effect::text(replies::confirm_reprompt(lang)))
            }
        }
    }
}

// ============================================================================
// Interactive Replies
// ============================================================================

fn on_interactive(
    state: &SessionState,
    context: &ClinicContext,
    reply_id: &str,
    title: &str,
) -> TransitionResult {
    let state = state.leave_offers_prompt();
    match &state {
        SessionState::Booking(progress) => booking_reply(progress, context, reply_id),
        SessionState::AwaitingCancelPhone => {
            let lang = Language::detect_or(title, Language::default());
            stay(&state).with_effect(Effect::text(replies::cancel_phone_prompt(lang)))
        }
        _ => stay(&state),
    }
}

fn booking_reply(
    progress: &BookingProgress,
    context: &ClinicContext,
    reply_id: &str,
) -> TransitionResult {
    let draft = progress.draft.clone();
    match progress.step {
        BookingStep::CollectingService => {
            let service = reply_id
                .strip_prefix(SERVICE_PREFIX)
                .and_then(|id| context.services.iter().find(|s| s.id == id));
            match service {
                Some(service) => service_chosen(context, draft.with_service(service)),
                None => reprompt(progress, context),
            }
        }
        BookingStep::CollectingAppointment => {
            // A slot from an older list may no longer be offered
            let slot = reply_id
                .strip_prefix(SLOT_PREFIX)
                .and_then(|id| context.slots.iter().find(|s| s.id == id));
            match slot {
                Some(slot) => slot_chosen(draft.with_slot(slot)),
                None => reprompt(progress, context),
            }
        }
        BookingStep::Confirming if reply_id == CONFIRM_BOOKING_ID => {
            finalize_booking(progress, context)
        }
        BookingStep::Confirming if reply_id == CANCEL_BOOKING_ID => {
            discard_booking(draft.language)
        }
        _ => reprompt(progress, context),
    }
}

// ============================================================================
// Booking Steps
// ============================================================================

fn start_booking(context: &ClinicContext, lang: Language) -> TransitionResult {
    let draft = BookingDraft::new(context.sender.clone(), lang);
    TransitionResult::new(SessionState::Booking(BookingProgress::at(
        BookingStep::CollectingName,
        draft,
    )))
    .with_effect(Effect::text(replies::ask_name(lang)))
}

fn service_chosen(context: &ClinicContext, draft: BookingDraft) -> TransitionResult {
    let body = replies::choose_slot(draft.language, draft.service.as_deref().unwrap_or_default());
    offer_slots(context, draft, body)
}

/// Send the bookable slots and keep them in the draft, so a list position in
/// the reply means the row the sender saw
fn offer_slots(context: &ClinicContext, mut draft: BookingDraft, body: String) -> TransitionResult {
    let lang = draft.language;
    if context.slots.is_empty() {
        return TransitionResult::new(SessionState::Idle)
            .with_effect(Effect::text(replies::no_slots(lang)));
    }
    draft.offered_slots = context.slots.iter().take(MAX_LIST_ROWS).cloned().collect();
    let list = slot_list(&draft.offered_slots, lang, body);
    TransitionResult::new(SessionState::Booking(BookingProgress::at(
        BookingStep::CollectingAppointment,
        draft,
    )))
    .with_effect(Effect::list(list))
}

fn slot_chosen(draft: BookingDraft) -> TransitionResult {
    let buttons = confirm_buttons(&draft);
    TransitionResult::new(SessionState::Booking(BookingProgress::at(
        BookingStep::Confirming,
        draft,
    )))
    .with_effect(Effect::buttons(buttons))
}

fn finalize_booking(progress: &BookingProgress, context: &ClinicContext) -> TransitionResult {
    let lang = progress.draft.language;
    match progress.draft.to_booking() {
        Some(booking) => TransitionResult::new(SessionState::Idle).with_effects([
            Effect::StoreBooking {
                booking: booking.clone(),
            },
            Effect::SendBookingNotice { booking, lang },
        ]),
        // Incomplete drafts cannot be confirmed; start over rather than store a partial record
        None => start_booking(context, lang),
    }
}

fn discard_booking(lang: Language) -> TransitionResult {
    TransitionResult::new(SessionState::Idle)
        .with_effect(Effect::text(replies::booking_discarded(lang)))
}

/// Ask again for whatever the current step is waiting on
fn reprompt(progress: &BookingProgress, context: &ClinicContext) -> TransitionResult {
    let lang = progress.draft.language;
    let unchanged = || TransitionResult::new(SessionState::Booking(progress.clone()));
    match progress.step {
        BookingStep::CollectingName => {
            unchanged().with_effect(Effect::text(replies::ask_name(lang)))
        }
        BookingStep::CollectingService => unchanged().with_effect(Effect::list(service_list(
            context,
            lang,
            replies::invalid_service(lang).to_string(),
        ))),
        // Rows are rebuilt: slots may have passed since the last list
        BookingStep::CollectingAppointment => offer_slots(
            context,
            progress.draft.clone(),
            replies::invalid_slot(lang).to_string(),
        ),
        BookingStep::Confirming => {
            unchanged().with_effect(Effect::buttons(confirm_buttons(&progress.draft)))
        }
    }
}

// ============================================================================
// Input Matching
// ============================================================================

/// Accept a name that has letters, no digits and a sensible length
fn valid_name(text: &str) -> Option<String> {
    let name = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let length = name.chars().count();
    let plausible = NAME_CHARS.contains(&length)
        && name.chars().any(char::is_alphabetic)
        && !name.chars().any(char::is_numeric);
    plausible.then_some(name)
}

/// A service by list position (`"2"`), id or title in either language
fn pick_service<'a>(context: &'a ClinicContext, utterance: &Utterance) -> Option<&'a Service> {
    if let Some(position) = utterance.number() {
        return position
            .checked_sub(1)
            .and_then(|index| context.services.get(index));
    }
    let text = utterance.raw();
    context.services.iter().find(|s| {
        s.id.eq_ignore_ascii_case(text)
            || s.title_en.eq_ignore_ascii_case(text)
            || s.title_ar == text
    })
}

/// A slot from the list last sent, by position or exact label, that is still bookable
fn pick_slot<'a>(
    draft: &'a BookingDraft,
    context: &ClinicContext,
    utterance: &Utterance,
) -> Option<&'a Slot> {
    let offered = &draft.offered_slots;
    let slot = match utterance.number() {
        Some(position) => position.checked_sub(1).and_then(|index| offered.get(index)),
        None => {
            let text = utterance.raw();
            offered
                .iter()
                .find(|s| s.id == text || s.label.eq_ignore_ascii_case(text))
        }
    }?;
    context.slots.iter().any(|s| s.id == slot.id).then_some(slot)
}

// ============================================================================
// Outbound Builders
// ============================================================================

fn service_list(context: &ClinicContext, lang: Language, body: String) -> ListMessage {
    ListMessage {
        body,
        button: replies::services_button(lang).to_string(),
        rows: context
            .services
            .iter()
            .take(MAX_LIST_ROWS)
            .map(|s| ListRow {
                id: format!("{SERVICE_PREFIX}{}", s.id),
                title: s.title(lang).to_string(),
            })
            .collect(),
    }
}

fn slot_list(slots: &[Slot], lang: Language, body: String) -> ListMessage {
    ListMessage {
        body,
        button: replies::slots_button(lang).to_string(),
        rows: slots
            .iter()
            .map(|s| ListRow {
                id: format!("{SLOT_PREFIX}{}", s.id),
                title: s.label.clone(),
            })
            .collect(),
    }
}

fn confirm_buttons(draft: &BookingDraft) -> ButtonsMessage {
    let lang = draft.language;
    ButtonsMessage {
        body: replies::booking_summary(lang, draft),
        buttons: vec![
            ReplyButton {
                id: CONFIRM_BOOKING_ID.to_string(),
                title: replies::confirm_label(lang).to_string(),
            },
            ReplyButton {
                id: CANCEL_BOOKING_ID.to_string(),
                title: replies::cancel_label(lang).to_string(),
            },
        ],
    }
}
