use crate::dto::{token_dto::LoginResponseDto, user_dto::LoginUserDto};
use crate::error::{api_error::ApiError, request_error::JsonRequest};
use crate::service::token_service::TokenServiceTrait;
use crate::state::auth_state::AuthState;
use axum::{Json, extract::State};
use tracing::info;

pub async fn login(
    State(state): State<AuthState>,
    JsonRequest(payload): JsonRequest<LoginUserDto>,
) -> Result<Json<LoginResponseDto>, ApiError> {
    let user = state.user_service.authenticate(payload).await?;
    let token = state.token_service.issue(user.id)?;

    info!(user_id = user.id, expires_at = token.exp, "Token issued");
    Ok(Json(LoginResponseDto::from_token(token)))
}
