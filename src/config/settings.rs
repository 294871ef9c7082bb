//! Typed, immutable application settings.
//!
//! Built once at startup from [`parameter`] and handed to the services by value.
//! Nothing here is read again after the server starts.

use crate::config::parameter;
use crate::error::config_error::ConfigError;
use crate::service::credential_service::PaddingScheme;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub token: TokenSettings,
    pub credential: CredentialSettings,
    pub employee_role_id: i32,
}

#[derive(Clone, Debug)]
pub struct ServerSettings {
    pub address: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

#[derive(Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
    pub run_migrations: bool,
    /// Upper bound on a single store operation
    pub operation_timeout: Duration,
}

#[derive(Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub ttl_seconds: i64,
    pub leeway_seconds: u64,
}

#[derive(Clone)]
pub struct CredentialSettings {
    pub bcrypt_cost: u32,
    /// When present the password decryption stage is active
    pub decryption_key: Option<String>,
    pub padding: PaddingScheme,
}

impl Settings {
    /// Build settings from the loaded parameters. Call after [`parameter::init`].
    pub fn from_parameters() -> Result<Self, ConfigError> {
        let server = ServerSettings {
            address: parameter::require("SERVER_ADDRESS")?,
            port: parameter::require_parsed("SERVER_PORT")?,
        };

        let database = DatabaseSettings {
            url: parameter::require("DATABASE_URL")?,
            max_connections: parameter::require_parsed("DB_MAX_CONNECTIONS")?,
            min_connections: parameter::require_parsed("DB_MIN_CONNECTIONS")?,
            acquire_timeout: seconds("DB_ACQUIRE_TIMEOUT_SECONDS")?,
            idle_timeout: seconds("DB_IDLE_TIMEOUT_SECONDS")?,
            max_lifetime: seconds("DB_MAX_LIFETIME_SECONDS")?,
            run_migrations: parameter::require_bool("DB_RUN_MIGRATIONS")?,
            operation_timeout: seconds("STORE_TIMEOUT_SECONDS")?,
        };

        let ttl_seconds = token_ttl(parameter::require_parsed("JWT_TTL_SECONDS")?)?;

        let token = TokenSettings {
            secret: parameter::require("JWT_SECRET")?,
            ttl_seconds,
            leeway_seconds: parameter::require_parsed("JWT_LEEWAY_SECONDS")?,
        };

        let credential = CredentialSettings {
            bcrypt_cost: parameter::require_parsed("BCRYPT_COST")?,
            decryption_key: parameter::get_optional("PASSWORD_DECRYPTION_KEY"),
            padding: parameter::require_parsed("PASSWORD_PADDING")?,
        };

        Ok(Self {
            server,
            database,
            token,
            credential,
            employee_role_id: parameter::require_parsed("EMPLOYEE_ROLE_ID")?,
        })
    }
}

/// Longest accepted token lifetime: one week
pub const MAX_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

fn token_ttl(ttl_seconds: i64) -> Result<i64, ConfigError> {
    if !(1..=MAX_TOKEN_TTL_SECONDS).contains(&ttl_seconds) {
        return Err(ConfigError::Invalid {
            key: "JWT_TTL_SECONDS".to_string(),
            reason: format!("must be between 1 and {}", MAX_TOKEN_TTL_SECONDS),
        });
    }
    Ok(ttl_seconds)
}

fn seconds(parameter: &str) -> Result<Duration, ConfigError> {
    parameter::require_parsed::<u64>(parameter).map(Duration::from_secs)
}

impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("operation_timeout", &self.operation_timeout)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("ttl_seconds", &self.ttl_seconds)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for CredentialSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSettings")
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("decryption_enabled", &self.decryption_key.is_some())
            .field("padding", &self.padding)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_ttl_bounds() {
        assert_eq!(token_ttl(600), Ok(600));
        assert_eq!(token_ttl(MAX_TOKEN_TTL_SECONDS), Ok(MAX_TOKEN_TTL_SECONDS));
        assert!(token_ttl(0).is_err());
        assert!(token_ttl(-1).is_err());
        assert!(token_ttl(MAX_TOKEN_TTL_SECONDS + 1).is_err());
        assert!(matches!(
            token_ttl(i64::MAX),
            Err(ConfigError::Invalid { key, .. }) if key == "JWT_TTL_SECONDS"
        ));
    }
}
