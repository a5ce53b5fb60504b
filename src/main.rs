//! Clinic Concierge - WhatsApp booking assistant
//!
//! A Rust backend that routes WhatsApp messages for a dental clinic through
//! a per-sender booking state machine.

mod api;
mod audio;
mod catalog;
mod config;
mod db;
mod intent;
mod media;
mod replies;
mod runtime;
mod session;
mod state_machine;
mod whatsapp;

use api::{create_router, AppState};
use audio::{DisabledTranscriber, WhisperTranscriber};
use catalog::Catalog;
use config::Config;
use db::Database;
use media::CatalogMedia;
use runtime::{AudioProcessor, DatabaseBookings, ProductionConcierge};
use session::InMemorySessionStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use whatsapp::GraphClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clinic_concierge=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env()?;

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;

    let catalog = Arc::new(Catalog::load(config.catalog_path.as_deref())?);
    tracing::info!(
        clinic = %catalog.clinic_name,
        services = catalog.services.len(),
        custom = config.catalog_path.is_some(),
        "Catalog loaded"
    );

    // Secrets are only reported as present or absent
    let graph = GraphClient::new(config.graph())?;
    if graph.is_configured() {
        tracing::info!(version = %config.graph_version, "Graph API client configured");
    } else {
        tracing::warn!("WHATSAPP_TOKEN or PHONE_NUMBER_ID not set; replies will fail");
    }
    if config.verify_token.is_none() {
        tracing::warn!("VERIFY_TOKEN not set; webhook verification will be refused");
    }

    let audio: Arc<dyn AudioProcessor> = match config.transcriber() {
        Some(transcriber) => {
            tracing::info!(model = %transcriber.model, "Voice note transcription enabled");
            Arc::new(WhisperTranscriber::new(graph.clone(), transcriber))
        }
        None => {
            tracing::warn!("TRANSCRIBE_API_KEY not set; voice notes will not be understood");
            Arc::new(DisabledTranscriber)
        }
    };

    let bookings = DatabaseBookings::new(db);
    let dispatcher = Arc::new(graph.clone());
    let concierge: ProductionConcierge = ProductionConcierge::new(
        InMemorySessionStore::new(),
        Arc::clone(&dispatcher),
        CatalogMedia::new(Arc::clone(&catalog), graph),
        audio,
        bookings.clone(),
        Arc::clone(&catalog),
    );

    // Create application state
    let state = AppState::new(
        Arc::new(concierge),
        Arc::new(bookings),
        dispatcher,
        config.verify_token.clone(),
        catalog.clinic_name.clone(),
    );

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Clinic concierge listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
