use crate::config::logging::secure_log;
use crate::dto::user_dto::{
    LoginInput, LoginUserDto, RegisterUserDto, RegisteredUserDto, RegistrationInput, UserReadDto,
};
use crate::entity::employee::Employee;
use crate::entity::user::{NewUser, User};
use crate::error::api_error::ApiError;
use crate::error::db_error::DbError;
use crate::error::user_error::UserError;
use crate::repository::UserStore;
use crate::service::credential_service::CredentialService;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    credentials: Arc<CredentialService>,
    store_timeout: Duration,
    employee_role_id: i32,
}

impl UserService {
    pub fn new(
        store: Arc<dyn UserStore>,
        credentials: Arc<CredentialService>,
        store_timeout: Duration,
        employee_role_id: i32,
    ) -> Self {
        Self {
            store,
            credentials,
            store_timeout,
            employee_role_id,
        }
    }

    /// Validate, decrypt, hash and persist a new user.
    ///
    /// Nothing is written unless every check passes. The employee row is
    /// created only for the employee role and in the same store call as the
    /// user, so the two succeed or fail together.
    pub async fn register(&self, payload: RegisterUserDto) -> Result<RegisteredUserDto, ApiError> {
        let input = RegistrationInput::try_from(payload)?;

        let password = self.credentials.reveal_password(input.password)?;
        self.credentials.check_password_policy(&password)?;
        let password_hash = self.credentials.hash_password(password).await?;

        let employee = (input.role_id == self.employee_role_id).then_some(input.employee);
        let new_user = NewUser {
            username: input.username,
            email: input.email,
            password_hash,
            role_id: input.role_id,
            first_name: input.first_name,
            middle_name: input.middle_name,
            last_name: input.last_name,
        };

        let (user, employee) = self
            .bounded(self.store.create_user(new_user, employee))
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation { constraint } => {
                    secure_log::sensitive_debug!("Registration rejected by constraint {}", constraint);
                    ApiError::User(UserError::UserAlreadyExists)
                }
                other => {
                    secure_log::secure_error!("Failed to create user", other);
                    ApiError::Db(other)
                }
            })?;

        tracing::info!(
            user_id = user.id,
            employee = employee.is_some(),
            "User registered"
        );
        Ok(RegisteredUserDto::from_parts(&user, employee.as_ref()))
    }

    /// Check a username and password pair.
    ///
    /// Unknown usernames and wrong passwords both end in
    /// [`UserError::InvalidCredentials`] after one bcrypt verification.
    pub async fn authenticate(&self, payload: LoginUserDto) -> Result<User, ApiError> {
        let input = LoginInput::try_from(payload)?;
        let password = self.credentials.reveal_password(input.password)?;

        let Some(user) = self.bounded(self.store.find_by_username(&input.username)).await? else {
            self.credentials.verify_against_dummy(password).await;
            tracing::warn!("SECURITY: Failed login attempt");
            return Err(UserError::InvalidCredentials.into());
        };

        let matches = self
            .credentials
            .verify_password(password, user.password.clone())
            .await
            .map_err(|e| {
                secure_log::secure_error!("SECURITY: Password verification system error", e);
                ApiError::Credential(e)
            })?;

        if !matches {
            tracing::warn!(user_id = user.id, "SECURITY: Failed login attempt");
            return Err(UserError::InvalidCredentials.into());
        }

        tracing::info!(user_id = user.id, "SECURITY: Successful authentication");
        Ok(user)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, ApiError> {
        Ok(self.bounded(self.store.find_by_id(id)).await?)
    }

    pub async fn employee_for(&self, user_id: i64) -> Result<Option<Employee>, ApiError> {
        Ok(self.bounded(self.store.find_employee_by_user_id(user_id)).await?)
    }

    pub async fn profile(&self, user: User) -> Result<UserReadDto, ApiError> {
        let employee = self.employee_for(user.id).await?;
        Ok(UserReadDto::from_parts(user, employee))
    }

    pub async fn store_reachable(&self) -> bool {
        match self.bounded(self.store.ping()).await {
            Ok(()) => true,
            Err(e) => {
                secure_log::secure_error!("Store health check failed", e);
                false
            }
        }
    }

    async fn bounded<T>(
        &self,
        operation: impl Future<Output = Result<T, DbError>>,
    ) -> Result<T, DbError> {
        match tokio::time::timeout(self.store_timeout, operation).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout = ?self.store_timeout, "Store operation timed out");
                Err(DbError::Timeout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::CredentialSettings;
    use crate::dto::user_dto::PasswordPayload;
    use crate::error::credential_error::CredentialError;
    use crate::error::request_error::RequestError;
    use crate::repository::memory_repository::InMemoryUserStore;
    use crate::service::credential_service::PaddingScheme;
    use crate::service::credential_service::tests::{KEY_256, encrypt_pkcs7_256};
    use serde_json::{Value, json};

    const EMPLOYEE_ROLE: i32 = 1;

    fn credentials(decryption_key: Option<&[u8]>) -> Arc<CredentialService> {
        CredentialService::new_shared(&CredentialSettings {
            bcrypt_cost: 4,
            decryption_key: decryption_key.map(|k| String::from_utf8_lossy(k).into_owned()),
            padding: PaddingScheme::Pkcs7,
        })
        .unwrap()
    }

    fn service_with(store: Arc<InMemoryUserStore>, decryption_key: Option<&[u8]>) -> UserService {
        UserService::new(
            store,
            credentials(decryption_key),
            Duration::from_secs(5),
            EMPLOYEE_ROLE,
        )
    }

    fn alice() -> Value {
        json!({
            "username": "alice",
            "email": "a@x.com",
            "password": "longenough1",
            "role_id": 2,
            "first_name": "Alice"
        })
    }

    fn register_dto(body: Value) -> RegisterUserDto {
        serde_json::from_value(body).unwrap()
    }

    fn login_dto(username: &str, password: &str) -> LoginUserDto {
        serde_json::from_value(json!({"username": username, "password": password})).unwrap()
    }

    #[tokio::test]
    async fn test_register_non_employee_creates_no_employee_row() {
        let store = InMemoryUserStore::new_shared();
        let service = service_with(store.clone(), None);

        let registered = service.register(register_dto(alice())).await.unwrap();

        assert_eq!(registered.username, "alice");
        assert_eq!(registered.employee_id, None);
        assert_eq!(store.user_count().await, 1);
        assert_eq!(store.employee_count().await, 0);
    }

    #[tokio::test]
    async fn test_stored_hash_differs_from_password_and_verifies() {
        let store = InMemoryUserStore::new_shared();
        let service = service_with(store.clone(), None);
        service.register(register_dto(alice())).await.unwrap();

        let stored = store.find_by_username("alice").await.unwrap().unwrap();
        assert_ne!(stored.password, "longenough1");
        assert!(
            credentials(None)
                .verify_password("longenough1".to_string(), stored.password)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_register_employee_role_creates_employee_row() {
        let store = InMemoryUserStore::new_shared();
        let service = service_with(store.clone(), None);
        let mut body = alice();
        body["role_id"] = json!(EMPLOYEE_ROLE);
        body["bloodgroup"] = json!("O+");

        let registered = service.register(register_dto(body)).await.unwrap();

        assert_eq!(registered.employee_id.as_deref(), Some("EMP000001"));
        let employee = store
            .find_employee_by_user_id(registered.user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(employee.blood_group.as_deref(), Some("O+"));
    }

    #[tokio::test]
    async fn test_missing_field_writes_nothing() {
        let store = InMemoryUserStore::new_shared();
        let service = service_with(store.clone(), None);
        let mut body = alice();
        body.as_object_mut().unwrap().remove("first_name");

        let error = service.register(register_dto(body)).await.unwrap_err();

        let ApiError::Request(request_error) = error else {
            panic!("expected a request error");
        };
        assert_eq!(request_error.missing_fields(), vec!["first_name"]);
        assert_eq!(store.user_count().await, 0);
        assert_eq!(store.employee_count().await, 0);
    }

    #[tokio::test]
    async fn test_short_password_is_rejected_before_storage() {
        let store = InMemoryUserStore::new_shared();
        let service = service_with(store.clone(), None);
        let mut body = alice();
        body["password"] = json!("short");

        let error = service.register(register_dto(body)).await.unwrap_err();

        assert!(matches!(error, ApiError::Request(RequestError::InvalidField { field: "password", .. })));
        assert_eq!(store.user_count().await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_conflict_without_partial_state() {
        let store = InMemoryUserStore::new_shared();
        let service = service_with(store.clone(), None);
        service.register(register_dto(alice())).await.unwrap();

        let mut again = alice();
        again["email"] = json!("other@x.com");
        again["role_id"] = json!(EMPLOYEE_ROLE);
        let error = service.register(register_dto(again)).await.unwrap_err();

        assert!(matches!(error, ApiError::User(UserError::UserAlreadyExists)));
        assert_eq!(store.user_count().await, 1);
        assert_eq!(store.employee_count().await, 0);
    }

    #[tokio::test]
    async fn test_failed_employee_insert_rolls_back_user() {
        let store = InMemoryUserStore::new_shared();
        store.reject_employee_inserts(true);
        let service = service_with(store.clone(), None);
        let mut body = alice();
        body["role_id"] = json!(EMPLOYEE_ROLE);

        let error = service.register(register_dto(body)).await.unwrap_err();

        assert!(matches!(error, ApiError::Db(DbError::SomethingWentWrong(_))));
        assert_eq!(store.user_count().await, 0);

        // Nothing of the first attempt survives, so the same username is free
        store.reject_employee_inserts(false);
        let mut retry = alice();
        retry["role_id"] = json!(EMPLOYEE_ROLE);
        let registered = service.register(register_dto(retry)).await.unwrap();
        assert_eq!(registered.user_id, 1);
        assert_eq!(store.employee_count().await, 1);
    }

    #[tokio::test]
    async fn test_encrypted_registration_then_login() {
        let store = InMemoryUserStore::new_shared();
        let service = service_with(store.clone(), Some(KEY_256));
        let mut body = alice();
        body["password"] = serde_json::to_value(encrypt_pkcs7_256("longenough1")).unwrap();

        service.register(register_dto(body)).await.unwrap();

        let login: LoginUserDto = serde_json::from_value(json!({
            "username": "alice",
            "password": encrypt_pkcs7_256("longenough1"),
        }))
        .unwrap();
        assert_eq!(service.authenticate(login).await.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_plaintext_rejected_when_decryption_active() {
        let store = InMemoryUserStore::new_shared();
        let service = service_with(store.clone(), Some(KEY_256));

        let error = service.register(register_dto(alice())).await.unwrap_err();

        assert!(matches!(error, ApiError::Request(RequestError::InvalidField { field: "password", .. })));
        assert_eq!(store.user_count().await, 0);
    }

    #[tokio::test]
    async fn test_login_with_correct_password() {
        let service = service_with(InMemoryUserStore::new_shared(), None);
        service.register(register_dto(alice())).await.unwrap();

        let user = service.authenticate(login_dto("alice", "longenough1")).await.unwrap();
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_the_same() {
        let service = service_with(InMemoryUserStore::new_shared(), None);
        service.register(register_dto(alice())).await.unwrap();

        let wrong_password = service
            .authenticate(login_dto("alice", "wrongpassword"))
            .await
            .unwrap_err();
        let unknown_user = service
            .authenticate(login_dto("mallory", "longenough1"))
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, ApiError::User(UserError::InvalidCredentials)));
        assert!(matches!(unknown_user, ApiError::User(UserError::InvalidCredentials)));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_undecryptable_login_is_a_credential_failure() {
        let service = service_with(InMemoryUserStore::new_shared(), Some(KEY_256));
        let login = LoginUserDto {
            username: Some("alice".to_string()),
            password: Some(PasswordPayload::Encrypted(crate::dto::user_dto::EncryptedPassword {
                iv: "00".to_string(),
                content: "ff".to_string(),
            })),
        };

        let error = service.authenticate(login).await.unwrap_err();
        assert!(matches!(error, ApiError::Credential(CredentialError::Decryption)));
    }

    #[tokio::test]
    async fn test_slow_store_times_out_as_retryable() {
        let store = Arc::new(InMemoryUserStore::with_latency(Duration::from_millis(500)));
        let service = UserService::new(store, credentials(None), Duration::from_millis(20), EMPLOYEE_ROLE);

        let error = service.find_by_id(1).await.unwrap_err();

        let ApiError::Db(db_error) = error else {
            panic!("expected a store error");
        };
        assert!(db_error.is_retryable());
        assert!(!service.store_reachable().await);
    }

    #[tokio::test]
    async fn test_profile_includes_employee() {
        let service = service_with(InMemoryUserStore::new_shared(), None);
        let mut body = alice();
        body["role_id"] = json!(EMPLOYEE_ROLE);
        body["govid"] = json!("GOV-9");
        let registered = service.register(register_dto(body)).await.unwrap();

        let user = service.find_by_id(registered.user_id).await.unwrap().unwrap();
        let profile = service.profile(user).await.unwrap();

        assert_eq!(profile.username, "alice");
        assert_eq!(profile.employee.unwrap().gov_id.as_deref(), Some("GOV-9"));
    }
}
