pub mod auth_state;
pub mod token_state;
pub mod user_state;
