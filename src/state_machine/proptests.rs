//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::transition::{CANCEL_BOOKING_ID, CONFIRM_BOOKING_ID};
use super::*;
use crate::catalog::{Service, Slot};
use crate::intent::{classify, Language, Utterance};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

const SENDER: &str = "966554412398";

fn test_context() -> ClinicContext {
    ClinicContext::new(
        SENDER,
        vec![
            Service {
                id: "checkup".to_string(),
                title_en: "Checkup".to_string(),
                title_ar: "فحص".to_string(),
                image: Some("https://img.example/checkup.png".to_string()),
            },
            Service {
                id: "whitening".to_string(),
                title_en: "Whitening".to_string(),
                title_ar: "تبييض".to_string(),
                image: None,
            },
        ],
        vec![
            Slot {
                id: "202610181000".to_string(),
                label: "Sun 18 Oct 10:00".to_string(),
            },
            Slot {
                id: "202610191600".to_string(),
                label: "Mon 19 Oct 16:00".to_string(),
            },
        ],
    )
}

fn full_draft(language: Language) -> BookingDraft {
    let context = test_context();
    BookingDraft {
        name: Some("Sara Ali".to_string()),
        ..BookingDraft::new(SENDER, language)
    }
    .with_service(&context.services[0])
    .with_slot(&context.slots[0])
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_language() -> impl Strategy<Value = Language> {
    prop_oneof![Just(Language::English), Just(Language::Arabic)]
}

fn arb_step() -> impl Strategy<Value = BookingStep> {
    prop_oneof![
        Just(BookingStep::CollectingName),
        Just(BookingStep::CollectingService),
        Just(BookingStep::CollectingAppointment),
        Just(BookingStep::Confirming),
    ]
}

fn arb_progress() -> impl Strategy<Value = BookingProgress> {
    (arb_step(), arb_language())
        .prop_map(|(step, language)| BookingProgress::at(step, full_draft(language)))
}

fn arb_state() -> impl Strategy<Value = SessionState> {
    prop_oneof![
        Just(SessionState::Idle),
        Just(SessionState::AwaitingCancelPhone),
        proptest::option::of(arb_progress())
            .prop_map(|suspended| SessionState::AwaitingOffersConfirm { suspended }),
        arb_progress().prop_map(SessionState::Booking),
    ]
}

/// Phrases that drive the cascade, mixed with arbitrary noise
fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("hi".to_string()),
        Just("مرحبا".to_string()),
        Just("you idiot".to_string()),
        Just("location".to_string()),
        Just("العروض".to_string()),
        Just("yes".to_string()),
        Just("no".to_string()),
        Just("doctors".to_string()),
        Just("cancel".to_string()),
        Just("0554412398".to_string()),
        Just("book".to_string()),
        Just("Sara Ali".to_string()),
        Just("1".to_string()),
        "[a-zA-Z0-9 ]{0,20}",
        "[\u{0621}-\u{064A} ]{0,12}",
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        4 => arb_text().prop_map(Event::text),
        1 => prop_oneof![
            Just("service:checkup"),
            Just("service:unknown"),
            Just("slot:202610181000"),
            Just("slot:000000000000"),
            Just(CONFIRM_BOOKING_ID),
            Just(CANCEL_BOOKING_ID),
        ]
        .prop_map(|id| Event::interactive(id, "tap")),
    ]
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Invariant 1: Same state and text always classify the same way
    #[test]
    fn prop_classification_is_deterministic(state in arb_state(), text in arb_text()) {
        let utterance = Utterance::new(&text, Language::default());
        prop_assert_eq!(classify(&utterance, &state), classify(&utterance, &state));

        let first = transition(&state, &test_context(), Event::text(text.clone()));
        let second = transition(&state, &test_context(), Event::text(text));
        match (first, second) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.new_state, b.new_state);
                prop_assert_eq!(a.effects, b.effects);
            }
            (Err(a), Err(b)) => prop_assert_eq!(a, b),
            (a, b) => prop_assert!(false, "diverged: {:?} vs {:?}", a, b),
        }
    }

    // Invariant 2: Any event sequence keeps the session well formed
    #[test]
    fn prop_sessions_stay_well_formed(events in proptest::collection::vec(arb_event(), 0..25)) {
        let mut state = SessionState::Idle;
        let ctx = test_context();

        for event in events {
            let Ok(result) = transition(&state, &ctx, event) else {
                continue;
            };
            state = result.new_state;

            // The two single-shot prompts never overlap
            prop_assert!(!(state.is_awaiting_offers() && state.is_awaiting_cancel_phone()));
            if state.is_awaiting_cancel_phone() || state == SessionState::Idle {
                prop_assert!(state.draft().is_none(), "draft left in {:?}", state);
            }
            if let Some(draft) = state.draft() {
                prop_assert_eq!(draft.phone.as_str(), SENDER);
            }
        }
    }

    // Invariant 3: A changed session is persisted once, after every reply
    // unless a booking store write commits it first
    #[test]
    fn prop_state_changes_persist(state in arb_state(), event in arb_event()) {
        if let Ok(result) = transition(&state, &test_context(), event) {
            let resets = result.effects.contains(&Effect::ResetSession);
            if result.new_state != state && !resets {
                let persists: Vec<usize> = result
                    .effects
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| **e == Effect::PersistState)
                    .map(|(index, _)| index)
                    .collect();
                prop_assert_eq!(
                    persists.len(),
                    1,
                    "State changed but not persisted once: {:?} -> {:?}",
                    &state,
                    &result.new_state
                );
                let expected = match result.effects.iter().rposition(Effect::writes_bookings) {
                    Some(write) => write + 1,
                    None => result.effects.len() - 1,
                };
                prop_assert_eq!(persists[0], expected);
            }
            if result.new_state == state {
                prop_assert!(!result.effects.contains(&Effect::PersistState));
            }
        }
    }

    // Invariant 4: A ban word resets the session and sends exactly one message
    #[test]
    fn prop_ban_resets_session(state in arb_state(), prefix in "[0-9 ]{0,10}") {
        let text = format!("{prefix} stupid");
        let result = transition(&state, &test_context(), Event::text(text)).unwrap();
        prop_assert_eq!(&result.new_state, &SessionState::Idle);
        prop_assert_eq!(result.effects.len(), 2);
        prop_assert_eq!(&result.effects[0], &Effect::ResetSession);
        prop_assert!(matches!(result.effects[1], Effect::SendText { .. }), "expected effects[1] to be SendText");
    }

    // Invariant 5: Finalizing leaves no draft and stores the booking exactly once
    #[test]
    fn prop_finalize_clears_draft(language in arb_language(), by_button in any::<bool>()) {
        let state = SessionState::Booking(BookingProgress::at(
            BookingStep::Confirming,
            full_draft(language),
        ));
        let event = if by_button {
            Event::interactive(CONFIRM_BOOKING_ID, "Confirm")
        } else {
            Event::text("yes")
        };
        let result = transition(&state, &test_context(), event).unwrap();
        prop_assert!(result.new_state.draft().is_none());
        let finalized = result
            .effects
            .iter()
            .filter(|e| matches!(e, Effect::StoreBooking { .. }))
            .count();
        prop_assert_eq!(finalized, 1);
        prop_assert!(matches!(result.effects.last(), Some(Effect::SendBookingNotice { .. })), "expected last effect to be SendBookingNotice");
    }

    // Invariant 6: Short cancellation numbers reprompt, long ones cancel once
    #[test]
    fn prop_cancel_phone_threshold(digits in "[0-9]{1,14}") {
        let result = transition(
            &SessionState::AwaitingCancelPhone,
            &test_context(),
            Event::text(digits.clone()),
        )
        .unwrap();
        let cancels: Vec<_> = result
            .effects
            .iter()
            .filter_map(|e| match e {
                Effect::CancelBookings { phone } => Some(phone.clone()),
                _ => None,
            })
            .collect();
        if digits.len() < 8 {
            prop_assert_eq!(&result.new_state, &SessionState::AwaitingCancelPhone);
            prop_assert!(cancels.is_empty());
        } else {
            prop_assert_eq!(&result.new_state, &SessionState::Idle);
            prop_assert_eq!(cancels, vec![digits]);
        }
    }
}

#[test]
fn test_cancel_phone_examples() {
    let ctx = test_context();
    let state = SessionState::AwaitingCancelPhone;

    let result = transition(&state, &ctx, Event::text("abc")).unwrap();
    assert_eq!(result.new_state, state);
    assert_eq!(result.effects.len(), 1);

    let result = transition(&state, &ctx, Event::text("0554412398")).unwrap();
    assert_eq!(result.new_state, SessionState::Idle);
    assert_eq!(
        result.effects,
        vec![
            Effect::CancelBookings {
                phone: "0554412398".to_string(),
            },
            Effect::PersistState,
            Effect::SendCancellationOutcome {
                lang: Language::Arabic,
            },
        ]
    );
}
