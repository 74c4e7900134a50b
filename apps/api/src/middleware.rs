use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use partledger_core::AppError;

use crate::error::ApiResult;
use crate::state::AppState;

/// Requires the configured bearer token and attaches the API identity.
pub async fn require_bearer_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if token != Some(state.api_token.as_str()) {
        return Err(AppError::Unauthorized("a valid bearer token is required".to_owned()).into());
    }

    request.extensions_mut().insert(state.api_identity.clone());
    Ok(next.run(request).await)
}
