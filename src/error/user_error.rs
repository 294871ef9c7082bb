use crate::response::app_response::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum UserError {
    #[error("User already exists")]
    UserAlreadyExists,
    /// Wrong password and unknown username render the same
    #[error("Invalid credentials")]
    InvalidCredentials,
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let status_code = match self {
            UserError::UserAlreadyExists => StatusCode::CONFLICT,
            UserError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        };

        ErrorResponse::send(self.to_string()).with_status(status_code).into_response()
    }
}
