use crate::config::logging::secure_log;
use crate::dto::user_dto::{RegisterUserDto, RegisteredUserDto};
use crate::error::{api_error::ApiError, request_error::JsonRequest};
use crate::response::app_response::SuccessResponse;
use crate::state::user_state::UserState;
use axum::{extract::State, http::StatusCode};

pub async fn register(
    State(state): State<UserState>,
    JsonRequest(payload): JsonRequest<RegisterUserDto>,
) -> Result<SuccessResponse<RegisteredUserDto>, ApiError> {
    secure_log::sensitive_debug!("User registration attempt: {:?}", payload);

    let registered = state.user_service.register(payload).await?;

    Ok(SuccessResponse::send(registered)
        .with_message("User registered successfully!")
        .with_status(StatusCode::CREATED))
}
