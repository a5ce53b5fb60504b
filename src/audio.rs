//! Voice note transcription
//!
//! Voice notes are downloaded from the Graph API and posted to an
//! OpenAI-compatible `audio/transcriptions` endpoint. The transcript is then
//! handled exactly like typed text.

use crate::runtime::AudioProcessor;
use crate::whatsapp::{DispatchError, GraphClient, MediaRef};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_TRANSCRIBE_URL: &str = "https://api.openai.com/v1/audio/transcriptions";
pub const DEFAULT_TRANSCRIBE_MODEL: &str = "whisper-1";

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Transcription is not configured")]
    Disabled,
    #[error("Media download failed: {0}")]
    Download(#[from] DispatchError),
    #[error("Transcription request failed: {0}")]
    Request(String),
    #[error("Transcription service error: {0}")]
    Service(String),
    #[error("Voice note contained no speech")]
    Empty,
}

#[derive(Debug, Clone)]
pub struct TranscriberConfig {
    pub api_key: String,
    pub url: String,
    pub model: String,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Deserialize)]
struct ServiceErrorResponse {
    error: ServiceErrorDetail,
}

#[derive(Deserialize)]
struct ServiceErrorDetail {
    message: String,
}

/// Whisper-style transcriber using the Graph client for downloads
pub struct WhisperTranscriber {
    graph: GraphClient,
    config: TranscriberConfig,
}

impl WhisperTranscriber {
    pub fn new(graph: GraphClient, config: TranscriberConfig) -> Self {
        Self { graph, config }
    }
}

#[async_trait]
impl AudioProcessor for WhisperTranscriber {
    async fn transcribe(&self, media: &MediaRef) -> Result<String, AudioError> {
        let bytes = self.graph.download_media(&media.id).await?;
        let mime = media.mime_type.as_deref().unwrap_or("audio/ogg");
        tracing::debug!(media_id = %media.id, bytes = bytes.len(), mime = %mime, "Transcribing voice note");

        let file = Part::bytes(bytes)
            .file_name(file_name(mime))
            .mime_str(base_mime(mime))
            .map_err(|e| AudioError::Request(format!("Invalid MIME type {mime}: {e}")))?;
        let form = Form::new()
            .text("model", self.config.model.clone())
            .part("file", file);

        let response = self
            .graph
            .http()
            .post(&self.config.url)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AudioError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AudioError::Request(format!("Failed to read response: {e}")))?;
        if !status.is_success() {
            let message = serde_json::from_str::<ServiceErrorResponse>(&body)
                .map_or(body, |resp| resp.error.message);
            return Err(AudioError::Service(format!("HTTP {status}: {message}")));
        }

        let transcript: TranscriptionResponse = serde_json::from_str(&body)
            .map_err(|e| AudioError::Service(format!("Failed to parse response: {e}")))?;
        let text = transcript.text.trim();
        if text.is_empty() {
            return Err(AudioError::Empty);
        }
        Ok(text.to_string())
    }
}

/// Used when no transcription key is configured
pub struct DisabledTranscriber;

#[async_trait]
impl AudioProcessor for DisabledTranscriber {
    async fn transcribe(&self, _media: &MediaRef) -> Result<String, AudioError> {
        Err(AudioError::Disabled)
    }
}

/// `audio/ogg; codecs=opus` -> `audio/ogg`
fn base_mime(mime: &str) -> &str {
    mime.split(';').next().unwrap_or(mime).trim()
}

fn file_name(mime: &str) -> String {
    let extension = match base_mime(mime) {
        "audio/mpeg" => "mp3",
        "audio/mp4" | "audio/aac" => "m4a",
        "audio/amr" => "amr",
        _ => "ogg",
    };
    format!("voice.{extension}")
}
