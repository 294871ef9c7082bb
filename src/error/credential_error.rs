use crate::response::app_response::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredentialError {
    /// Covers bad hex, wrong IV length, corrupt ciphertext, bad padding and
    /// non-UTF-8 plaintext alike.
    #[error("Password decryption failed")]
    Decryption,
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("Stored password hash is malformed")]
    MalformedHash,
}

impl IntoResponse for CredentialError {
    fn into_response(self) -> Response {
        match self {
            // Indistinguishable from a wrong password
            CredentialError::Decryption => ErrorResponse::send("Invalid credentials".to_string())
                .with_status(StatusCode::UNAUTHORIZED)
                .into_response(),
            CredentialError::Hashing(_) | CredentialError::MalformedHash => {
                ErrorResponse::send("Something went wrong".to_string())
                    .with_status(StatusCode::INTERNAL_SERVER_ERROR)
                    .into_response()
            }
        }
    }
}
