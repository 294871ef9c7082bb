pub mod memory_repository;
pub mod user_repository;

use crate::entity::employee::{Employee, NewEmployee};
use crate::entity::user::{NewUser, User};
use crate::error::db_error::DbError;
use async_trait::async_trait;

/// Persistence for users and their employee records.
///
/// Implementations must make `create_user` atomic: either the user and its
/// employee row are both stored, or neither is.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(
        &self,
        user: NewUser,
        employee: Option<NewEmployee>,
    ) -> Result<(User, Option<Employee>), DbError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DbError>;
    async fn find_employee_by_user_id(&self, user_id: i64) -> Result<Option<Employee>, DbError>;
    /// Cheap reachability check used by the health endpoint
    async fn ping(&self) -> Result<(), DbError>;
}
