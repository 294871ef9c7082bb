pub mod auth;
pub mod health;
pub mod profile;
pub mod register;
pub mod root;
