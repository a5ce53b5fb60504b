//! WhatsApp Cloud API payload types

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Inbound
// ============================================================================

/// One message from a webhook event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InboundMessage {
    /// Provider message id (`wamid...`), used to drop redeliveries
    #[serde(default)]
    pub id: Option<String>,
    pub from: String,
    #[serde(rename = "type", default)]
    pub message_type: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub text: Option<TextContent>,
    #[serde(default)]
    pub audio: Option<MediaRef>,
    #[serde(default)]
    pub interactive: Option<InteractiveReply>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TextContent {
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaRef {
    pub id: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InteractiveReply {
    #[serde(rename = "type", default)]
    pub reply_type: String,
    #[serde(default)]
    pub button_reply: Option<SelectedOption>,
    #[serde(default)]
    pub list_reply: Option<SelectedOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelectedOption {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

/// What an inbound message carries, as far as routing is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageBody<'a> {
    Text(&'a str),
    Audio(&'a MediaRef),
    Interactive(&'a SelectedOption),
    Unsupported(&'a str),
}

impl InboundMessage {
    pub fn body(&self) -> MessageBody<'_> {
        match self.message_type.as_str() {
            "audio" => self
                .audio
                .as_ref()
                .map_or(MessageBody::Unsupported("audio"), MessageBody::Audio),
            "interactive" => self
                .interactive
                .as_ref()
                .and_then(|i| i.button_reply.as_ref().or(i.list_reply.as_ref()))
                .map_or(MessageBody::Unsupported("interactive"), MessageBody::Interactive),
            "text" => self
                .text
                .as_ref()
                .map_or(MessageBody::Unsupported("text"), |t| {
                    MessageBody::Text(t.body.trim())
                }),
            other => MessageBody::Unsupported(other),
        }
    }
}

/// Pull `entry[0].changes[0].value.messages[0]` out of a webhook body.
///
/// Returns `None` for status callbacks and for any envelope that does not
/// have the expected shape.
pub fn extract_message(body: &Value) -> Option<InboundMessage> {
    let message = body
        .get("entry")?
        .get(0)?
        .get("changes")?
        .get(0)?
        .get("value")?
        .get("messages")?
        .get(0)?;
    serde_json::from_value(message.clone()).ok()
}

// ============================================================================
// Outbound
// ============================================================================

/// Interactive list message (one section)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListMessage {
    pub body: String,
    /// Label of the button that opens the list
    pub button: String,
    pub rows: Vec<ListRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub id: String,
    pub title: String,
}

/// Interactive reply-button message (up to three buttons)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonsMessage {
    pub body: String,
    pub buttons: Vec<ReplyButton>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyButton {
    pub id: String,
    pub title: String,
}

/// Request body for `POST /{phone_number_id}/messages`
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub messaging_product: &'static str,
    pub recipient_type: &'static str,
    pub to: String,
    #[serde(flatten)]
    pub content: OutboundContent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundContent {
    Text { text: TextPayload },
    Image { image: ImagePayload },
    Interactive { interactive: Value },
}

#[derive(Debug, Clone, Serialize)]
pub struct TextPayload {
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImagePayload {
    pub link: String,
    pub caption: String,
}

/// Row titles are limited to 24 characters, button titles to 20.
const ROW_TITLE_MAX: usize = 24;
const BUTTON_TITLE_MAX: usize = 20;

fn clip(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

impl OutboundMessage {
    fn new(to: &str, content: OutboundContent) -> Self {
        Self {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to: to.to_string(),
            content,
        }
    }

    pub fn text(to: &str, body: &str) -> Self {
        Self::new(
            to,
            OutboundContent::Text {
                text: TextPayload {
                    body: body.to_string(),
                },
            },
        )
    }

    pub fn image(to: &str, link: &str, caption: &str) -> Self {
        Self::new(
            to,
            OutboundContent::Image {
                image: ImagePayload {
                    link: link.to_string(),
                    caption: caption.to_string(),
                },
            },
        )
    }

    pub fn list(to: &str, list: &ListMessage) -> Self {
        let rows: Vec<Value> = list
            .rows
            .iter()
            .map(|row| serde_json::json!({ "id": row.id, "title": clip(&row.title, ROW_TITLE_MAX) }))
            .collect();
        Self::new(
            to,
            OutboundContent::Interactive {
                interactive: serde_json::json!({
                    "type": "list",
                    "body": { "text": list.body },
                    "action": {
                        "button": clip(&list.button, BUTTON_TITLE_MAX),
                        "sections": [{ "title": clip(&list.button, ROW_TITLE_MAX), "rows": rows }]
                    }
                }),
            },
        )
    }

    pub fn buttons(to: &str, message: &ButtonsMessage) -> Self {
        let buttons: Vec<Value> = message
            .buttons
            .iter()
            .map(|b| {
                serde_json::json!({
                    "type": "reply",
                    "reply": { "id": b.id, "title": clip(&b.title, BUTTON_TITLE_MAX) }
                })
            })
            .collect();
        Self::new(
            to,
            OutboundContent::Interactive {
                interactive: serde_json::json!({
                    "type": "button",
                    "body": { "text": message.body },
                    "action": { "buttons": buttons }
                }),
            },
        )
    }
}
