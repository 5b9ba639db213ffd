//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap};

use crate::{
    infrastructure::dto::http::{AuthResponse, ConnectionDto, HubStateDto},
    ui::{error::ApiError, state::AppState},
};

/// Header carrying the shared secret on `GET /auth`
pub const PASSWORD_HEADER: &str = "x-connection-password";

/// Exchange the shared secret for a connection token
pub async fn auth_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AuthResponse>, ApiError> {
    let presented = headers
        .get(PASSWORD_HEADER)
        .and_then(|value| value.to_str().ok());

    match state.authenticate_usecase.execute(presented).await {
        Ok(token) => {
            tracing::info!("Issued connection token");
            Ok(Json(AuthResponse {
                token: token.as_str().to_string(),
            }))
        }
        Err(e) => {
            tracing::warn!("Rejected token request: {}", e);
            Err(e.into())
        }
    }
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Debug endpoint to get the current hub state (for testing purposes)
pub async fn debug_hub_state(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HubStateDto>, ApiError> {
    let status = state
        .hub
        .status()
        .await
        .map_err(|_| ApiError::ServiceUnavailable)?;

    // Domain Model から DTO への変換
    let mut connections: Vec<ConnectionDto> = status
        .connections
        .into_iter()
        .map(|c| ConnectionDto {
            id: c.id.to_string(),
            remote: c.remote,
        })
        .collect();
    connections.sort_by(|a, b| a.id.cmp(&b.id));

    Ok(Json(HubStateDto {
        connections,
        history: (&status.history).into(),
    }))
}
