pub mod credential_service;
pub mod token_service;
pub mod user_service;
