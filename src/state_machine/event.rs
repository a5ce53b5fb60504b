//! Events that can occur in a session

/// Inbound user actions that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Free text, typed or transcribed from a voice note
    Text { text: String },

    /// A tap on a reply button or list row we sent earlier
    Interactive { reply_id: String, title: String },
}

impl Event {
    pub fn text(text: impl Into<String>) -> Self {
        Event::Text { text: text.into() }
    }

    pub fn interactive(reply_id: impl Into<String>, title: impl Into<String>) -> Self {
        Event::Interactive {
            reply_id: reply_id.into(),
            title: title.into(),
        }
    }
}
