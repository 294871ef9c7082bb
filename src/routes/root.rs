use super::{auth, health, profile, register};
use crate::config::settings::Settings;
use crate::error::AppError;
use crate::handler::health_handler;
use crate::middleware::auth as auth_middleware;
use crate::repository::UserStore;
use crate::service::credential_service::CredentialService;
use crate::service::token_service::{TokenService, TokenServiceTrait};
use crate::service::user_service::UserService;
use crate::state::auth_state::AuthState;
use crate::state::token_state::TokenState;
use crate::state::user_state::UserState;
use axum::{Router, middleware};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Build the application router over `store`.
///
/// Fails when the token or credential settings are unusable, so a bad
/// secret stops the server before it accepts traffic.
pub fn routes(store: Arc<dyn UserStore>, settings: &Settings) -> Result<Router, AppError> {
    health_handler::init_start_time();

    let token_service = TokenService::new(&settings.token)?;
    let credentials = CredentialService::new_shared(&settings.credential)?;
    let user_service = UserService::new(
        store,
        credentials,
        settings.database.operation_timeout,
        settings.employee_role_id,
    );

    let merged_router = {
        let auth_state = AuthState::new(user_service.clone(), token_service.clone());
        let user_state = UserState::new(user_service.clone());
        let token_state = TokenState::new(token_service, user_service);

        auth::routes()
            .with_state(auth_state)
            .merge(register::routes().with_state(user_state.clone()))
            .merge(
                profile::routes()
                    .layer(ServiceBuilder::new().layer(middleware::from_fn_with_state(
                        token_state,
                        auth_middleware::auth,
                    )))
                    .with_state(user_state.clone()),
            )
            .merge(health::routes().with_state(user_state))
    };

    let app_router = Router::new()
        .nest("/api", merged_router)
        .layer(TraceLayer::new_for_http());

    Ok(app_router)
}
