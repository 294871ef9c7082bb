use crate::error::config_error::ConfigError;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{error, info, warn};

static CONFIG: OnceLock<HashMap<String, String>> = OnceLock::new();

/// Default configuration values
const DEFAULTS: &[(&str, &str)] = &[
    ("SERVER_ADDRESS", "127.0.0.1"),
    ("SERVER_PORT", "8081"),
    ("ENV", "development"),
    ("LOG_LEVEL", "info"),
    ("DB_MAX_CONNECTIONS", "20"),
    ("DB_MIN_CONNECTIONS", "5"),
    ("DB_ACQUIRE_TIMEOUT_SECONDS", "30"),
    ("DB_IDLE_TIMEOUT_SECONDS", "600"), // 10 minutes
    ("DB_MAX_LIFETIME_SECONDS", "1800"), // 30 minutes
    ("DB_RUN_MIGRATIONS", "true"),
    ("STORE_TIMEOUT_SECONDS", "5"),
    ("JWT_TTL_SECONDS", "600"),
    ("JWT_LEEWAY_SECONDS", "0"),
    ("BCRYPT_COST", "12"),
    ("PASSWORD_PADDING", "pkcs7"),
    ("EMPLOYEE_ROLE_ID", "1"),
];

/// Keys without a default. Secrets live here so they can never fall back to a literal.
const EXTERNAL_ONLY: &[&str] = &["DATABASE_URL", "JWT_SECRET", "PASSWORD_DECRYPTION_KEY"];

pub fn init() {
    match dotenv::dotenv() {
        Ok(path) => info!("Loaded environment file: {:?}", path),
        Err(_) => warn!("No .env file found, using system environment variables"),
    }

    let config = collect(|key| std::env::var(key).ok());

    if CONFIG.set(config).is_err() {
        error!("Configuration already initialized");
    } else {
        info!("Configuration initialized successfully");
    }
}

/// Merge defaults with whatever `lookup` yields for every known key.
fn collect<F>(lookup: F) -> HashMap<String, String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = HashMap::new();

    for (key, value) in DEFAULTS {
        config.insert(key.to_string(), value.to_string());
    }

    let known = DEFAULTS.iter().map(|(key, _)| *key).chain(EXTERNAL_ONLY.iter().copied());
    for key in known {
        if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
            config.insert(key.to_string(), value);
        }
    }

    config
}

pub fn get_optional(parameter: &str) -> Option<String> {
    CONFIG
        .get()
        .and_then(|config| config.get(parameter))
        .cloned()
}

pub fn require(parameter: &str) -> Result<String, ConfigError> {
    get_optional(parameter).ok_or_else(|| {
        error!("Configuration parameter '{}' not found", parameter);
        ConfigError::Missing(parameter.to_string())
    })
}

/// Parse a required parameter into any `FromStr` type.
pub fn require_parsed<T>(parameter: &str) -> Result<T, ConfigError>
where
    T: FromStr,
{
    let value = require(parameter)?;
    value.trim().parse::<T>().map_err(|_| {
        error!("Configuration parameter '{}' has an unparsable value", parameter);
        ConfigError::Invalid {
            key: parameter.to_string(),
            reason: format!("expected {}", std::any::type_name::<T>()),
        }
    })
}

pub fn require_bool(parameter: &str) -> Result<bool, ConfigError> {
    let value = require(parameter)?.to_lowercase();
    match value.as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key: parameter.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

/// Number of loaded parameters, logged at startup
pub fn loaded_count() -> usize {
    CONFIG.get().map(|config| config.len()).unwrap_or_default()
}
