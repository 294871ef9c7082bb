use crate::error::credential_error::CredentialError;
use crate::error::db_error::DbError;
use crate::error::request_error::RequestError;
use crate::error::token_error::TokenError;
use crate::error::user_error::UserError;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Every failure a request handler can produce
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Token(error) => error.into_response(),
            ApiError::User(error) => error.into_response(),
            ApiError::Db(error) => error.into_response(),
            ApiError::Request(error) => error.into_response(),
            ApiError::Credential(error) => error.into_response(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Request(RequestError::ValidationError(errors))
    }
}
