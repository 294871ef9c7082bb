use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// bcrypt hash with embedded salt, never the raw password
    #[serde(skip_serializing)]
    pub password: String,
    pub role_id: i32,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row data for a user that has not been persisted yet
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role_id: i32,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("role_id", &self.role_id)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("role_id", &self.role_id)
            .finish_non_exhaustive()
    }
}
