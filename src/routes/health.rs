use crate::handler::health_handler;
use crate::state::user_state::UserState;
use axum::{Router, routing::get};

pub fn routes() -> Router<UserState> {
    Router::new().route("/health", get(health_handler::health_check))
}
