use crate::response::app_response::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token is invalid")]
    InvalidToken,
    #[error("Token has expired, please log in again")]
    TokenExpired,
    #[error("Token is missing")]
    MissingToken,
    #[error("Token error: {0}")]
    TokenCreationError(String),
}

impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        let status_code = match self {
            TokenError::InvalidToken => StatusCode::FORBIDDEN,
            TokenError::TokenExpired => StatusCode::FORBIDDEN,
            TokenError::MissingToken => StatusCode::FORBIDDEN,
            TokenError::TokenCreationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match self {
            TokenError::TokenCreationError(_) => "Something went wrong".to_string(),
            other => other.to_string(),
        };

        ErrorResponse::send(message).with_status(status_code).into_response()
    }
}
