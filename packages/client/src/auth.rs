//! Token exchange with the relay.

use beehive_server::infrastructure::dto::http::{AuthResponse, ErrorResponse};
use reqwest::StatusCode;

use crate::error::ClientError;

/// Header carrying the shared secret
pub const PASSWORD_HEADER: &str = "X-Connection-Password";

/// Exchange the password for a one-connection token
pub async fn fetch_token(base_url: &str, password: &str) -> Result<String, ClientError> {
    let url = format!("{}/auth", base_url.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .get(&url)
        .header(PASSWORD_HEADER, password)
        .send()
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        let message = response
            .json::<ErrorResponse>()
            .await
            .map(|body| body.message)
            .unwrap_or_else(|_| "invalid password".to_string());
        return Err(ClientError::Unauthorized(message));
    }
    if !status.is_success() {
        return Err(ClientError::ConnectionError(format!(
            "token request failed with status {}",
            status
        )));
    }

    let body: AuthResponse = response
        .json()
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
    Ok(body.token)
}

/// Build the WebSocket chat URL from the HTTP base URL.
///
/// `http` becomes `ws` and `https` becomes `wss`.
pub fn chat_url(base_url: &str, token: &str) -> Result<String, ClientError> {
    let base = base_url.trim_end_matches('/');
    let rest = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        return Err(ClientError::InvalidUrl(base_url.to_string()));
    };
    Ok(format!("{}/chat?token={}", rest, token))
}
