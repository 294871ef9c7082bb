use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Required configuration parameter '{0}' is missing")]
    Missing(String),
    #[error("Configuration parameter '{key}' is invalid: {reason}")]
    Invalid { key: String, reason: String },
}
