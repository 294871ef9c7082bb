use crate::config::logging::secure_log;
use crate::dto::user_dto::UserReadDto;
use crate::entity::user::User;
use crate::error::api_error::ApiError;
use crate::response::app_response::SuccessResponse;
use crate::state::user_state::UserState;
use axum::{Extension, extract::State};

pub async fn profile(
    State(state): State<UserState>,
    Extension(current_user): Extension<User>,
) -> Result<SuccessResponse<UserReadDto>, ApiError> {
    secure_log::sensitive_debug!("Profile accessed for user ID: {}", current_user.id);

    let profile = state.user_service.profile(current_user).await?;
    Ok(SuccessResponse::send(profile))
}
