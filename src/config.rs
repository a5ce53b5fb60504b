//! Process configuration from environment variables

use crate::audio::{TranscriberConfig, DEFAULT_TRANSCRIBE_MODEL, DEFAULT_TRANSCRIBE_URL};
use crate::whatsapp::{GraphConfig, DEFAULT_GRAPH_BASE, DEFAULT_GRAPH_VERSION};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid PORT value: {0}")]
    InvalidPort(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Webhook verification secret
    pub verify_token: Option<String>,
    pub whatsapp_token: Option<String>,
    pub phone_number_id: Option<String>,
    pub graph_base: String,
    pub graph_version: String,
    pub transcribe_api_key: Option<String>,
    pub transcribe_url: String,
    pub transcribe_model: String,
    pub db_path: PathBuf,
    /// Catalog JSON; the built-in catalog is used when unset
    pub catalog_path: Option<PathBuf>,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match var("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let db_path = var("CLINIC_DB_PATH").map_or_else(
            || {
                let home = var("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(home).join(".clinic-concierge").join("clinic.db")
            },
            PathBuf::from,
        );

        Ok(Self {
            verify_token: var("VERIFY_TOKEN"),
            whatsapp_token: var("WHATSAPP_TOKEN"),
            phone_number_id: var("PHONE_NUMBER_ID"),
            graph_base: var("GRAPH_API_BASE").unwrap_or_else(|| DEFAULT_GRAPH_BASE.to_string()),
            graph_version: var("GRAPH_API_VERSION")
                .unwrap_or_else(|| DEFAULT_GRAPH_VERSION.to_string()),
            transcribe_api_key: var("TRANSCRIBE_API_KEY"),
            transcribe_url: var("TRANSCRIBE_URL")
                .unwrap_or_else(|| DEFAULT_TRANSCRIBE_URL.to_string()),
            transcribe_model: var("TRANSCRIBE_MODEL")
                .unwrap_or_else(|| DEFAULT_TRANSCRIBE_MODEL.to_string()),
            db_path,
            catalog_path: var("CLINIC_CATALOG_PATH").map(PathBuf::from),
            port,
        })
    }

    /// Graph API credentials, when both token and phone number id are set
    pub fn graph(&self) -> Option<GraphConfig> {
        Some(GraphConfig {
            base_url: self.graph_base.clone(),
            version: self.graph_version.clone(),
            token: self.whatsapp_token.clone()?,
            phone_number_id: self.phone_number_id.clone()?,
        })
    }

    pub fn transcriber(&self) -> Option<TranscriberConfig> {
        Some(TranscriberConfig {
            api_key: self.transcribe_api_key.clone()?,
            url: self.transcribe_url.clone(),
            model: self.transcribe_model.clone(),
        })
    }
}
