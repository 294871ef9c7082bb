pub mod api_error;
pub mod config_error;
pub mod credential_error;
pub mod db_error;
pub mod request_error;
pub mod token_error;
pub mod user_error;

/// Failures that stop the server from starting
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] config_error::ConfigError),
    #[error(transparent)]
    Token(#[from] token_error::TokenError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}
