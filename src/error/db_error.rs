use crate::response::app_response::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },
    #[error("Store operation timed out")]
    Timeout,
    #[error("{0}")]
    SomethingWentWrong(String),
}

impl DbError {
    /// Callers may retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::Timeout)
    }
}

impl From<sqlx::Error> for DbError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
                DbError::UniqueViolation {
                    constraint: db_error.constraint().unwrap_or("unknown").to_string(),
                }
            }
            sqlx::Error::PoolTimedOut => DbError::Timeout,
            other => DbError::SomethingWentWrong(other.to_string()),
        }
    }
}

impl IntoResponse for DbError {
    fn into_response(self) -> Response {
        // Database text never reaches the client
        let (status_code, message) = match self {
            DbError::Timeout => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable, please retry",
            ),
            DbError::UniqueViolation { .. } => (StatusCode::CONFLICT, "Resource already exists"),
            DbError::SomethingWentWrong(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
            }
        };

        ErrorResponse::send(message.to_string()).with_status(status_code).into_response()
    }
}
