use crate::handler::register_handler;
use crate::state::user_state::UserState;
use axum::{Router, routing::post};

pub fn routes() -> Router<UserState> {
    Router::<UserState>::new().route("/register_user", post(register_handler::register))
}
