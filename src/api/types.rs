//! API request and response types

use serde::{Deserialize, Serialize};

/// Query string of the webhook verification handshake
#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Body of `POST /sendWhatsApp`, posted by the booking web form
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NoticeRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub appointment: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NoticeResponse {
    pub success: bool,
    /// The picture was rejected and the notice went out as text
    pub fallback: bool,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
