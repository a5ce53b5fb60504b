//! Intent classification for inbound text
//!
//! Classification is a pure function of the message text and the sender's
//! current [`SessionState`]. Rules are evaluated in [`CASCADE`] order and the
//! first matching rule wins; anything unmatched is booking-flow input.

pub mod keywords;

use crate::state_machine::SessionState;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static ARABIC_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{Arabic}").expect("valid regex"));
static LATIN_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]").expect("valid regex"));

/// Article and conjunction prefixes that may be glued to an Arabic keyword.
const ARABIC_PREFIXES: &[&str] = &["وال", "بال", "لل", "ال", "و", "ب"];

/// Keywords this short are matched as whole words only.
const SHORT_KEYWORD_CHARS: usize = 3;

/// Minimum digit count for a cancellation phone number.
pub const MIN_PHONE_DIGITS: usize = 8;

/// Reply language, selected from the script of the inbound text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    #[default]
    Arabic,
}

impl Language {
    /// Detect the language of `text`, or `None` if it contains no letters.
    pub fn detect(text: &str) -> Option<Self> {
        let arabic = ARABIC_LETTER.find_iter(text).count();
        let latin = LATIN_LETTER.find_iter(text).count();
        match (arabic, latin) {
            (0, 0) => None,
            (a, l) if a >= l => Some(Language::Arabic),
            _ => Some(Language::English),
        }
    }

    pub fn detect_or(text: &str, fallback: Language) -> Self {
        Self::detect(text).unwrap_or(fallback)
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Arabic => "ar",
        }
    }
}

/// Normalized view of an inbound text message
#[derive(Debug, Clone)]
pub struct Utterance {
    raw: String,
    normalized: String,
    words: Vec<String>,
    language: Language,
}

impl Utterance {
    pub fn new(text: &str, fallback: Language) -> Self {
        let raw = text.trim().to_string();
        let normalized = normalize(&raw);
        let words = normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(String::from)
            .collect();
        Self {
            language: Language::detect_or(&raw, fallback),
            raw,
            normalized,
            words,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Digits of the message with everything else stripped.
    /// Arabic-Indic digits are converted to ASCII.
    pub fn digits(&self) -> String {
        self.raw.chars().filter_map(ascii_digit).collect()
    }

    /// The message as a number, if it consists of digits only (`"2"`, `"٢"`)
    pub fn number(&self) -> Option<usize> {
        if self.raw.is_empty() || !self.raw.chars().all(|c| ascii_digit(c).is_some()) {
            return None;
        }
        self.digits().parse().ok()
    }

    /// True if any keyword occurs in the message.
    ///
    /// Latin keywords and short Arabic keywords must match whole words (or a
    /// whole phrase of consecutive words); longer Arabic keywords match
    /// anywhere in the text.
    pub fn mentions(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|kw| self.mentions_one(kw))
    }

    fn mentions_one(&self, keyword: &str) -> bool {
        if keyword.is_ascii() {
            let phrase: Vec<&str> = keyword.split_whitespace().collect();
            return !phrase.is_empty()
                && self
                    .words
                    .windows(phrase.len())
                    .any(|window| window.iter().zip(&phrase).all(|(w, p)| w == p));
        }
        if keyword.chars().count() <= SHORT_KEYWORD_CHARS {
            return self.words.iter().any(|w| arabic_word_matches(w, keyword));
        }
        self.normalized.contains(keyword)
    }
}

fn ascii_digit(c: char) -> Option<char> {
    let zero = match c {
        '0'..='9' => return Some(c),
        '\u{0660}'..='\u{0669}' => 0x0660,
        '\u{06F0}'..='\u{06F9}' => 0x06F0,
        _ => return None,
    };
    char::from_digit(u32::from(c) - zero, 10)
}

fn arabic_word_matches(word: &str, keyword: &str) -> bool {
    word == keyword
        || ARABIC_PREFIXES
            .iter()
            .any(|prefix| word.strip_prefix(prefix) == Some(keyword))
}

/// Lowercase and fold Arabic spelling variants so keyword tables stay small.
fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\u{064B}'..='\u{0652}' | '\u{0640}'))
        .map(|c| match c {
            'أ' | 'إ' | 'آ' => 'ا',
            'ى' => 'ي',
            'ة' => 'ه',
            other => other,
        })
        .flat_map(char::to_lowercase)
        .collect()
}

// ============================================================================
// Cascade
// ============================================================================

/// The classified purpose of an inbound text message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentKind {
    Greeting,
    Banned,
    Location,
    Offers,
    OffersConfirmation,
    Doctors,
    CancelRequest,
    CancelPhone,
    BookingInput,
}

/// One entry of the cascade: an intent and the predicate that selects it
pub struct Rule {
    pub kind: IntentKind,
    pub matches: fn(&Utterance, &SessionState) -> bool,
}

/// Ordered rule table. Earlier rules shadow later ones.
pub const CASCADE: &[Rule] = &[
    Rule {
        kind: IntentKind::Greeting,
        matches: |u, _| u.mentions(keywords::GREETINGS),
    },
    Rule {
        kind: IntentKind::Banned,
        matches: |u, _| u.mentions(keywords::BANNED),
    },
    Rule {
        kind: IntentKind::Location,
        matches: |u, _| u.mentions(keywords::LOCATION),
    },
    Rule {
        kind: IntentKind::Offers,
        matches: |u, _| u.mentions(keywords::OFFERS),
    },
    Rule {
        kind: IntentKind::OffersConfirmation,
        matches: |u, state| {
            state.is_awaiting_offers()
                && u.mentions(keywords::OFFERS_CONFIRMATION)
                && !u.mentions(keywords::NEGATIVE)
        },
    },
    Rule {
        kind: IntentKind::Doctors,
        matches: |u, _| u.mentions(keywords::DOCTORS),
    },
    Rule {
        kind: IntentKind::CancelRequest,
        matches: |u, _| u.mentions(keywords::CANCEL),
    },
    Rule {
        kind: IntentKind::CancelPhone,
        matches: |_, state| state.is_awaiting_cancel_phone(),
    },
];

/// Run the cascade. Returns [`IntentKind::BookingInput`] when no rule fires.
pub fn classify(utterance: &Utterance, state: &SessionState) -> IntentKind {
    CASCADE
        .iter()
        .find(|rule| (rule.matches)(utterance, state))
        .map_or(IntentKind::BookingInput, |rule| rule.kind)
}

impl IntentKind {
    /// Whether this intent is decided before the single-shot offers prompt
    /// is resolved. Any other intent first clears a pending offers prompt.
    pub fn precedes_offers_prompt(self) -> bool {
        matches!(
            self,
            IntentKind::Greeting
                | IntentKind::Banned
                | IntentKind::Location
                | IntentKind::Offers
                | IntentKind::OffersConfirmation
        )
    }
}
