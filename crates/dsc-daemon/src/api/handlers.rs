//! HTTP handlers

use crate::api::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::Json;
use dsc_types::{Envelope, MessageResponse};
use serde::Serialize;

/// Protocol endpoint. Every well-formed envelope is answered with a
/// [`MessageResponse`] and status 200, rejections included.
pub async fn receive_message(
    State(state): State<AppState>,
    payload: Result<Json<Envelope>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(envelope) = payload.map_err(|e| match e.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(e.body_text()),
        _ => ApiError::BadRequest(e.body_text()),
    })?;
    let response = state.dispatcher.dispatch(envelope).await;
    Ok(Json(response))
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
    })
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("no route for {uri}"))
}
