//! Graph API client for the WhatsApp Cloud API

use super::types::OutboundMessage;
use super::DispatchError;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_GRAPH_BASE: &str = "https://graph.facebook.com";
pub const DEFAULT_GRAPH_VERSION: &str = "v21.0";

/// Credentials and endpoint for the originating business number
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub base_url: String,
    pub version: String,
    pub token: String,
    pub phone_number_id: String,
}

impl GraphConfig {
    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{path}",
            self.base_url.trim_end_matches('/'),
            self.version
        )
    }
}

/// Sends messages on behalf of the configured business number.
///
/// Built without a [`GraphConfig`] every send fails with
/// [`DispatchErrorKind::NotConfigured`](super::DispatchErrorKind::NotConfigured).
#[derive(Clone)]
pub struct GraphClient {
    client: Client,
    config: Option<GraphConfig>,
}

impl GraphClient {
    pub fn new(config: Option<GraphConfig>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    fn config(&self) -> Result<&GraphConfig, DispatchError> {
        self.config.as_ref().ok_or_else(DispatchError::not_configured)
    }

    /// POST a message payload, treating non-2xx and `error` bodies as failures
    pub async fn send(&self, payload: &OutboundMessage) -> Result<(), DispatchError> {
        let config = self.config()?;
        let url = config.endpoint(&format!("{}/messages", config.phone_number_id));
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(&url)
            .bearer_auth(&config.token)
            .json(payload)
            .send()
            .await?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if let Some(detail) = rejection(status.is_success(), &body) {
            tracing::warn!(
                to = %payload.to,
                status = %status,
                error = %detail,
                "Graph API rejected message"
            );
            return Err(DispatchError::rejected(format!("{status}: {detail}")));
        }

        tracing::debug!(
            to = %payload.to,
            duration_ms = %start.elapsed().as_millis(),
            "Message sent"
        );
        Ok(())
    }

    /// Resolve a media id to a short-lived download URL, then fetch the bytes
    pub async fn download_media(&self, media_id: &str) -> Result<Vec<u8>, DispatchError> {
        let config = self.config()?;
        let meta: Value = self
            .client
            .get(config.endpoint(media_id))
            .bearer_auth(&config.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let url = meta
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| DispatchError::rejected(format!("No URL for media {media_id}")))?;

        let bytes = self
            .client
            .get(url)
            .bearer_auth(&config.token)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }
}

/// Describe why a Graph API response counts as a failure, if it does
fn rejection(success: bool, body: &Value) -> Option<String> {
    if let Some(error) = body.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| error.to_string(), String::from);
        return Some(message);
    }
    (!success).then(|| body.to_string())
}
