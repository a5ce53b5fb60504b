//! HTTP request handlers

use super::types::{ErrorResponse, NoticeRequest, NoticeResponse, VerifyQuery};
use super::AppState;
use crate::db::{Booking, NewBooking};
use crate::intent::Language;
use crate::runtime::{send_booking_notice, NoticeDelivery};
use crate::whatsapp::extract_message;
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(banner))
        // WhatsApp Cloud API webhook
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        // Booking web form confirmation
        .route("/sendWhatsApp", post(send_notice))
        .route("/api/bookings", get(list_bookings))
        .with_state(state)
}

// ============================================================
// Webhook
// ============================================================

/// The challenge to echo back, if the handshake is valid.
///
/// Valid means a non-empty mode and a token equal to the configured secret.
/// With no secret configured nothing verifies.
pub fn verify_subscription<'a>(query: &'a VerifyQuery, secret: Option<&str>) -> Option<&'a str> {
    query.mode.as_deref().filter(|mode| !mode.is_empty())?;
    let token = query.verify_token.as_deref()?;
    (Some(token) == secret).then(|| query.challenge.as_deref().unwrap_or_default())
}

async fn verify_webhook(
    State(state): State<AppState>,
    query: Result<Query<VerifyQuery>, QueryRejection>,
) -> Response {
    let Ok(Query(query)) = query else {
        tracing::warn!("Webhook verification with malformed query");
        return StatusCode::FORBIDDEN.into_response();
    };
    match verify_subscription(&query, state.verify_token.as_deref()) {
        Some(challenge) => {
            tracing::info!("Webhook verified");
            (StatusCode::OK, challenge.to_string()).into_response()
        }
        None => {
            tracing::warn!(
                mode = ?query.mode,
                secret_configured = state.verify_token.is_some(),
                "Webhook verification failed"
            );
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

async fn receive_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed webhook body");
            return Ok(StatusCode::OK);
        }
    };

    // Status callbacks (delivered, read) carry no message
    let Some(message) = extract_message(&payload) else {
        tracing::debug!("Webhook event without message");
        return Ok(StatusCode::OK);
    };

    match state.concierge.handle(&message).await {
        Ok(outcome) => {
            tracing::debug!(sender = %message.from, ?outcome, "Webhook processed");
            Ok(StatusCode::OK)
        }
        Err(e) => {
            tracing::error!(sender = %message.from, error = %e, "Failed to process message");
            Err(AppError::Internal(e.to_string()))
        }
    }
}

// ============================================================
// Web Form Notice
// ============================================================

/// Send the booking confirmation for a form submission, in Arabic
async fn send_notice(
    State(state): State<AppState>,
    Json(request): Json<NoticeRequest>,
) -> Result<Json<NoticeResponse>, AppError> {
    let (Some(name), Some(phone)) = (
        request.name.filter(|name| !name.is_empty()),
        request.phone.filter(|phone| !phone.is_empty()),
    ) else {
        tracing::warn!("Notice request without name or phone");
        return Err(AppError::BadRequest("Missing name or phone number".to_string()));
    };

    let booking = NewBooking {
        name,
        phone,
        service: request.service.unwrap_or_default(),
        appointment: request.appointment.unwrap_or_default(),
        image: request.image,
    };
    let delivery = send_booking_notice(
        &state.dispatcher,
        &booking.phone,
        &state.clinic_name,
        &booking,
        Language::Arabic,
    )
    .await
    .map_err(|e| {
        tracing::error!(to = %booking.phone, error = %e, "Notice not delivered");
        AppError::Internal(e.to_string())
    })?;

    tracing::info!(to = %booking.phone, ?delivery, "Notice sent");
    Ok(Json(NoticeResponse {
        success: true,
        fallback: delivery == NoticeDelivery::TextFallback,
    }))
}

// ============================================================
// Bookings & Health
// ============================================================

async fn list_bookings(State(state): State<AppState>) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = state.bookings.list().await.map_err(AppError::Internal)?;
    Ok(Json(bookings))
}

async fn banner(State(state): State<AppState>) -> String {
    format!("{} concierge is running", state.clinic_name)
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
