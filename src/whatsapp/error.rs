//! Outbound dispatch error types

use thiserror::Error;

/// Failure to deliver a message through the Graph API
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DispatchError {
    pub kind: DispatchErrorKind,
    pub message: String,
}

impl DispatchError {
    pub fn new(kind: DispatchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_configured() -> Self {
        Self::new(
            DispatchErrorKind::NotConfigured,
            "WHATSAPP_TOKEN / PHONE_NUMBER_ID not configured",
        )
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(DispatchErrorKind::Network, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(DispatchErrorKind::Rejected, message)
    }
}

/// Error classification for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchErrorKind {
    /// Outbound credential or sender id missing
    NotConfigured,
    /// Transport failure, timeout
    Network,
    /// Non-2xx response or an `error` object in the body
    Rejected,
}

impl From<reqwest::Error> for DispatchError {
    fn from(e: reqwest::Error) -> Self {
        Self::network(e.to_string())
    }
}
