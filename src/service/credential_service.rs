//! Password handling between the wire and the `users.password` column.
//!
//! A submitted password may first need decrypting (clients that encrypt with
//! the shared AES key), then it is checked against the password policy and
//! hashed with bcrypt. Login verifies a candidate against the stored hash.

use crate::config::logging::secure_log;
use crate::config::settings::CredentialSettings;
use crate::dto::user_dto::{EncryptedPassword, PasswordPayload};
use crate::error::api_error::ApiError;
use crate::error::config_error::ConfigError;
use crate::error::credential_error::CredentialError;
use crate::error::request_error::RequestError;
use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::block_padding::{NoPadding, Pkcs7};
use cbc::cipher::{BlockDecryptMut, KeyIvInit};
use std::str::FromStr;
use std::sync::Arc;

pub const MIN_PASSWORD_CHARS: usize = 8;
/// bcrypt ignores everything past this many bytes
pub const MAX_PASSWORD_BYTES: usize = 72;

/// How the client padded the plaintext before encrypting
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaddingScheme {
    Pkcs7,
    /// Trailing NUL bytes
    Zero,
}

impl FromStr for PaddingScheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pkcs7" => Ok(PaddingScheme::Pkcs7),
            "zero" | "nul" => Ok(PaddingScheme::Zero),
            other => Err(ConfigError::Invalid {
                key: "PASSWORD_PADDING".to_string(),
                reason: format!("unknown padding scheme '{}'", other),
            }),
        }
    }
}

#[derive(Clone)]
enum CipherKey {
    Aes128([u8; 16]),
    Aes192([u8; 24]),
    Aes256([u8; 32]),
}

/// AES-CBC decryptor for client-encrypted passwords
#[derive(Clone)]
pub struct PasswordCipher {
    key: CipherKey,
    padding: PaddingScheme,
}

impl PasswordCipher {
    /// The key is used as raw bytes; its length selects AES-128, -192 or -256.
    pub fn new(key: &[u8], padding: PaddingScheme) -> Result<Self, ConfigError> {
        let key = match key.len() {
            16 => CipherKey::Aes128(copy_key(key)),
            24 => CipherKey::Aes192(copy_key(key)),
            32 => CipherKey::Aes256(copy_key(key)),
            len => {
                return Err(ConfigError::Invalid {
                    key: "PASSWORD_DECRYPTION_KEY".to_string(),
                    reason: format!("must be 16, 24 or 32 bytes, got {}", len),
                });
            }
        };

        Ok(Self { key, padding })
    }

    pub fn decrypt(&self, encrypted: &EncryptedPassword) -> Result<String, CredentialError> {
        let iv = hex::decode(encrypted.iv.trim()).map_err(|_| CredentialError::Decryption)?;
        let content =
            hex::decode(encrypted.content.trim()).map_err(|_| CredentialError::Decryption)?;
        if content.is_empty() {
            return Err(CredentialError::Decryption);
        }

        let plaintext = match &self.key {
            CipherKey::Aes128(key) => {
                let decryptor = cbc::Decryptor::<Aes128>::new_from_slices(key, &iv)
                    .map_err(|_| CredentialError::Decryption)?;
                unpad(decryptor, &content, self.padding)?
            }
            CipherKey::Aes192(key) => {
                let decryptor = cbc::Decryptor::<Aes192>::new_from_slices(key, &iv)
                    .map_err(|_| CredentialError::Decryption)?;
                unpad(decryptor, &content, self.padding)?
            }
            CipherKey::Aes256(key) => {
                let decryptor = cbc::Decryptor::<Aes256>::new_from_slices(key, &iv)
                    .map_err(|_| CredentialError::Decryption)?;
                unpad(decryptor, &content, self.padding)?
            }
        };

        String::from_utf8(plaintext).map_err(|_| CredentialError::Decryption)
    }
}

fn copy_key<const N: usize>(key: &[u8]) -> [u8; N] {
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(key);
    bytes
}

fn unpad<D>(decryptor: D, content: &[u8], padding: PaddingScheme) -> Result<Vec<u8>, CredentialError>
where
    D: BlockDecryptMut,
{
    match padding {
        PaddingScheme::Pkcs7 => decryptor
            .decrypt_padded_vec_mut::<Pkcs7>(content)
            .map_err(|_| CredentialError::Decryption),
        PaddingScheme::Zero => {
            let mut plaintext = decryptor
                .decrypt_padded_vec_mut::<NoPadding>(content)
                .map_err(|_| CredentialError::Decryption)?;
            while plaintext.last() == Some(&0) {
                plaintext.pop();
            }
            Ok(plaintext)
        }
    }
}

/// bcrypt hashing with a per-password random salt embedded in the output
#[derive(Clone, Copy, Debug)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, ConfigError> {
        if !(4..=31).contains(&cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST".to_string(),
                reason: "must be between 4 and 31".to_string(),
            });
        }
        Ok(Self { cost })
    }

    pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
        bcrypt::hash(password, self.cost).map_err(|e| CredentialError::Hashing(e.to_string()))
    }

    /// `Ok(false)` on mismatch; errors only when the stored hash is unusable.
    pub fn verify(&self, candidate: &str, stored_hash: &str) -> Result<bool, CredentialError> {
        bcrypt::verify(candidate, stored_hash).map_err(|_| CredentialError::MalformedHash)
    }
}

pub struct CredentialService {
    cipher: Option<PasswordCipher>,
    hasher: PasswordHasher,
    /// Verified against when the username is unknown so both paths cost the same
    dummy_hash: String,
}

impl CredentialService {
    pub fn new(settings: &CredentialSettings) -> Result<Self, ConfigError> {
        let hasher = PasswordHasher::new(settings.bcrypt_cost)?;
        let cipher = settings
            .decryption_key
            .as_deref()
            .map(|key| PasswordCipher::new(key.as_bytes(), settings.padding))
            .transpose()?;

        let dummy_hash = hasher.hash("timing-equalizer").map_err(|e| ConfigError::Invalid {
            key: "BCRYPT_COST".to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            cipher,
            hasher,
            dummy_hash,
        })
    }

    pub fn new_shared(settings: &CredentialSettings) -> Result<Arc<Self>, ConfigError> {
        Self::new(settings).map(Arc::new)
    }

    pub fn decryption_enabled(&self) -> bool {
        self.cipher.is_some()
    }

    /// Turn the submitted payload into the plaintext password.
    ///
    /// With a decryption key configured only encrypted payloads are accepted;
    /// without one only plain strings are.
    pub fn reveal_password(&self, payload: PasswordPayload) -> Result<String, ApiError> {
        match (&self.cipher, payload) {
            (Some(cipher), PasswordPayload::Encrypted(encrypted)) => {
                cipher.decrypt(&encrypted).map_err(|e| {
                    tracing::warn!("SECURITY: Rejected an undecryptable password payload");
                    ApiError::Credential(e)
                })
            }
            (Some(_), PasswordPayload::Plain(_)) => {
                Err(RequestError::invalid("password", "Password must be encrypted").into())
            }
            (None, PasswordPayload::Plain(password)) => Ok(password),
            (None, PasswordPayload::Encrypted(_)) => {
                tracing::warn!("SECURITY: Encrypted password submitted but decryption is disabled");
                Err(CredentialError::Decryption.into())
            }
        }
    }

    pub fn check_password_policy(&self, password: &str) -> Result<(), RequestError> {
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(RequestError::invalid(
                "password",
                format!("Password must be at least {} characters long", MIN_PASSWORD_CHARS),
            ));
        }
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(RequestError::invalid(
                "password",
                format!("Password must not exceed {} bytes", MAX_PASSWORD_BYTES),
            ));
        }
        Ok(())
    }

    /// bcrypt is CPU bound, so it runs on the blocking pool.
    pub async fn hash_password(&self, password: String) -> Result<String, CredentialError> {
        let hasher = self.hasher;
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| {
                secure_log::secure_error!("Password hashing task failed", e);
                CredentialError::Hashing("hashing task failed".to_string())
            })?
    }

    pub async fn verify_password(&self, candidate: String, stored_hash: String) -> Result<bool, CredentialError> {
        let hasher = self.hasher;
        tokio::task::spawn_blocking(move || hasher.verify(&candidate, &stored_hash))
            .await
            .map_err(|e| {
                secure_log::secure_error!("Password verification task failed", e);
                CredentialError::Hashing("verification task failed".to_string())
            })?
    }

    /// Burn one verification for a username that does not exist.
    pub async fn verify_against_dummy(&self, candidate: String) {
        let _ = self.verify_password(candidate, self.dummy_hash.clone()).await;
    }
}
