use crate::config::settings::TokenSettings;
use crate::dto::token_dto::{TokenClaimsDto, TokenReadDto};
use crate::error::token_error::TokenError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

/// Minimum HS256 secret length (256 bits)
pub const MIN_SECRET_BYTES: usize = 32;

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    leeway_seconds: u64,
}

pub trait TokenServiceTrait {
    fn new(settings: &TokenSettings) -> Result<Self, TokenError>
    where
        Self: Sized;
    fn issue(&self, user_id: i64) -> Result<TokenReadDto, TokenError>;
    fn issue_at(&self, user_id: i64, issued_at: DateTime<Utc>) -> Result<TokenReadDto, TokenError>;
    fn verify(&self, token: &str) -> Result<i64, TokenError>;
}

impl TokenServiceTrait for TokenService {
    fn new(settings: &TokenSettings) -> Result<Self, TokenError> {
        if settings.secret.len() < MIN_SECRET_BYTES {
            return Err(TokenError::TokenCreationError(format!(
                "JWT secret must be at least {} bytes, got {}",
                MIN_SECRET_BYTES,
                settings.secret.len()
            )));
        }

        let ttl = Duration::try_seconds(settings.ttl_seconds)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or_else(|| {
                TokenError::TokenCreationError(format!(
                    "Token TTL of {} seconds is out of range",
                    settings.ttl_seconds
                ))
            })?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            ttl,
            leeway_seconds: settings.leeway_seconds,
        })
    }

    fn issue(&self, user_id: i64) -> Result<TokenReadDto, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    fn issue_at(&self, user_id: i64, issued_at: DateTime<Utc>) -> Result<TokenReadDto, TokenError> {
        let exp = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| {
                TokenError::TokenCreationError("Token expiration calculation overflow".to_string())
            })?
            .timestamp();
        let iat = issued_at.timestamp();

        let claims = TokenClaimsDto {
            sub: user_id.to_string(),
            iat,
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::TokenCreationError(e.to_string()))?;

        Ok(TokenReadDto { token, iat, exp })
    }

    /// Signature and expiry only. Whether the subject still exists is the
    /// caller's concern.
    fn verify(&self, token: &str) -> Result<i64, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = self.leeway_seconds;

        let token_data = decode::<TokenClaimsDto>(token, &self.decoding_key, &validation)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::TokenExpired,
                _ => TokenError::InvalidToken,
            })?;

        // Valid only while now < exp; jsonwebtoken alone lets `exp == now` through
        let cutoff = Utc::now().timestamp() - self.leeway_seconds as i64;
        if token_data.claims.exp <= cutoff {
            return Err(TokenError::TokenExpired);
        }

        token_data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| TokenError::InvalidToken)
    }
}
