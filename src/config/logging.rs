use crate::config::parameter;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Environment types for log level configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "test" | "testing" => Environment::Test,
            _ => Environment::Development,
        }
    }
}

/// Logging configuration for security-aware logging
#[derive(Debug)]
pub struct LoggingConfig {
    environment: Environment,
    log_level: Level,
}

impl LoggingConfig {
    /// Derive logging configuration from the loaded parameters
    pub fn from_parameters() -> Self {
        let environment = parameter::get_optional("ENV")
            .map(|s| Environment::parse(&s))
            .unwrap_or(Environment::Development);

        let log_level = parameter::get_optional("LOG_LEVEL")
            .and_then(|level| parse_level(&level))
            .unwrap_or(Level::INFO);

        Self {
            environment,
            log_level,
        }
    }

    pub fn log_level(&self) -> Level {
        self.log_level
    }

    /// Check if detailed error logging is allowed
    pub fn allow_detailed_errors(&self) -> bool {
        matches!(self.environment, Environment::Development) || self.log_level >= Level::DEBUG
    }

    /// Check if sensitive data logging is allowed
    pub fn allow_sensitive_data(&self) -> bool {
        matches!(self.environment, Environment::Development) && self.log_level >= Level::DEBUG
    }
}

fn parse_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

/// Global logging configuration instance
static LOGGING_CONFIG: std::sync::OnceLock<LoggingConfig> = std::sync::OnceLock::new();

/// Install the tracing subscriber and the global logging configuration.
///
/// `RUST_LOG` wins over `LOG_LEVEL` when both are present.
pub fn init() {
    let config = get_config();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level().as_str().to_lowercase()));

    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        tracing::warn!("Tracing subscriber already installed, skipping re-initialization");
    }

    tracing::info!(
        "Logging configured: environment={:?}, level={:?}",
        config.environment,
        config.log_level
    );
}

/// Get global logging configuration, deriving it on first use
pub fn get_config() -> &'static LoggingConfig {
    LOGGING_CONFIG.get_or_init(LoggingConfig::from_parameters)
}

/// Security-aware logging macros
pub mod secure_log {

    /// Log errors with environment-aware detail level
    macro_rules! secure_error {
        ($message:expr) => {
            if $crate::config::logging::get_config().allow_detailed_errors() {
                tracing::error!("{}", $message);
            } else {
                tracing::error!("An internal error occurred");
            }
        };
        ($message:expr, $error:expr) => {
            if $crate::config::logging::get_config().allow_detailed_errors() {
                tracing::error!("{}: {}", $message, $error);
            } else {
                tracing::error!("{}: An internal error occurred", $message);
            }
        };
        ($($arg:tt)*) => {
            if $crate::config::logging::get_config().allow_detailed_errors() {
                tracing::error!($($arg)*);
            } else {
                tracing::error!("An internal error occurred");
            }
        };
    }

    /// Log sensitive data only in development with debug level
    macro_rules! sensitive_debug {
        ($($arg:tt)*) => {
            if $crate::config::logging::get_config().allow_sensitive_data() {
                tracing::debug!($($arg)*);
            }
        };
    }

    pub(crate) use secure_error;
    pub(crate) use sensitive_debug;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert!(matches!(Environment::parse("development"), Environment::Development));
        assert!(matches!(Environment::parse("prod"), Environment::Production));
        assert!(matches!(Environment::parse("test"), Environment::Test));
        assert!(matches!(Environment::parse("unknown"), Environment::Development));
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!(parse_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_level("warn"), Some(Level::WARN));
        assert_eq!(parse_level("verbose"), None);
    }

    #[test]
    fn test_development_allows_detail_but_not_secrets_at_info() {
        let config = LoggingConfig {
            environment: Environment::Development,
            log_level: Level::INFO,
        };

        assert!(config.allow_detailed_errors());
        assert!(!config.allow_sensitive_data());
    }

    #[test]
    fn test_production_restrictions() {
        let config = LoggingConfig {
            environment: Environment::Production,
            log_level: Level::INFO,
        };

        assert!(!config.allow_detailed_errors());
        assert!(!config.allow_sensitive_data());
    }

    #[test]
    fn test_production_debug_never_logs_sensitive_data() {
        let config = LoggingConfig {
            environment: Environment::Production,
            log_level: Level::DEBUG,
        };

        assert!(config.allow_detailed_errors());
        assert!(!config.allow_sensitive_data());
    }
}
