use crate::config::logging::secure_log;
use crate::error::{api_error::ApiError, token_error::TokenError};
use crate::service::token_service::TokenServiceTrait;
use crate::state::token_state::TokenState;
use axum::extract::State;
use axum::{http, http::Request, middleware::Next, response::IntoResponse};
use tracing::info;

/// Accepts either `Bearer <token>` or the bare token
fn extract_token(value: &str) -> &str {
    let value = value.trim();
    match value.strip_prefix("Bearer") {
        Some(rest) if rest.is_empty() || rest.starts_with(' ') => rest.trim(),
        _ => value,
    }
}

pub async fn auth(
    State(state): State<TokenState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let token = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .map(extract_token)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            info!("SECURITY: Request to protected route without a token");
            TokenError::MissingToken
        })?;

    let user_id = state.token_service.verify(token).inspect_err(|e| {
        info!("SECURITY: Rejected token: {}", e);
    })?;

    match state.user_service.find_by_id(user_id).await? {
        Some(user) => {
            secure_log::sensitive_debug!("Authenticated request for user ID: {}", user.id);
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        None => {
            // Signature was fine but the account no longer exists
            secure_log::secure_error!("Token subject not found", user_id);
            Err(TokenError::InvalidToken.into())
        }
    }
}
