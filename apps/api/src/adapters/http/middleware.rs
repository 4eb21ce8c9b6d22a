use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use crate::{adapters::http::app_state::AppState, app_error::AppError};

/// Reject requests that carry no configured web API token.
pub async fn api_token_auth(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = extract_token(request.headers()) else {
        tracing::debug!(uri = %request.uri(), "Request without API token");
        return Err(AppError::Unauthorized);
    };

    if !app_state.api_tokens.verify(token) {
        tracing::warn!(uri = %request.uri(), "Invalid API token");
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// Token from `Authorization: Bearer <token>`, falling back to `X-API-Key`.
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(auth) = headers.get(AUTHORIZATION)
        && let Ok(val) = auth.to_str()
        && let Some(token) = val.strip_prefix("Bearer ")
        && !token.trim().is_empty()
    {
        return Some(token.trim());
    }
    if let Some(key) = headers.get("x-api-key")
        && let Ok(val) = key.to_str()
        && !val.trim().is_empty()
    {
        return Some(val.trim());
    }
    None
}
