use crate::handler::auth_handler;
use crate::state::auth_state::AuthState;
use axum::{Router, routing::post};

pub fn routes() -> Router<AuthState> {
    Router::<AuthState>::new().route("/login_user", post(auth_handler::login))
}
