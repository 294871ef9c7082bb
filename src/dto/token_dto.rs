use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenReadDto {
    pub token: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenClaimsDto {
    /// User id, kept as a string per the JWT registered claim
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone, Serialize)]
pub struct LoginResponseDto {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub expires_at: i64,
}

impl LoginResponseDto {
    pub fn from_token(token: TokenReadDto) -> Self {
        Self {
            success: true,
            message: "Login successful".to_string(),
            token: token.token,
            expires_at: token.exp,
        }
    }
}
