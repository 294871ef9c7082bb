use crate::handler::profile_handler;
use crate::state::user_state::UserState;
use axum::{Router, routing::get};

pub fn routes() -> Router<UserState> {
    Router::new().route("/profile", get(profile_handler::profile))
}
