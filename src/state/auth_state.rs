use crate::service::token_service::TokenService;
use crate::service::user_service::UserService;

#[derive(Clone)]
pub struct AuthState {
    pub(crate) token_service: TokenService,
    pub(crate) user_service: UserService,
}

impl AuthState {
    pub fn new(user_service: UserService, token_service: TokenService) -> Self {
        Self {
            token_service,
            user_service,
        }
    }
}
