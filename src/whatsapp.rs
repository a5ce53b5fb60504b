//! WhatsApp Cloud API plumbing
//!
//! Inbound webhook envelope parsing and the outbound Graph API client.

mod client;
mod error;
mod types;

pub use client::{GraphClient, GraphConfig, DEFAULT_GRAPH_BASE, DEFAULT_GRAPH_VERSION};
pub use error::{DispatchError, DispatchErrorKind};
pub use types::*;
