use crate::config::database::{Database, DatabaseTrait};
use crate::config::logging::secure_log;
use crate::entity::employee::{Employee, NewEmployee, employee_identifier};
use crate::entity::user::{NewUser, User};
use crate::error::db_error::DbError;
use crate::repository::UserStore;
use async_trait::async_trait;
use std::sync::Arc;

const USER_COLUMNS: &str =
    "id, username, email, password, role_id, first_name, middle_name, last_name, created_at";
const EMPLOYEE_COLUMNS: &str =
    "id, user_id, employee_id, department_id, blood_group, gov_id, verification_documents, created_at";

/// Postgres-backed [`UserStore`]
#[derive(Clone)]
pub struct UserRepository {
    pub(crate) db_conn: Arc<Database>,
}

impl UserRepository {
    pub fn new(db_conn: &Arc<Database>) -> Self {
        Self {
            db_conn: Arc::clone(db_conn),
        }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create_user(
        &self,
        user: NewUser,
        employee: Option<NewEmployee>,
    ) -> Result<(User, Option<Employee>), DbError> {
        let start = std::time::Instant::now();
        let mut tx = self.db_conn.get_pool().begin().await.map_err(|e| {
            secure_log::secure_error!("Failed to open registration transaction", e);
            DbError::from(e)
        })?;

        let insert_user = format!(
            "INSERT INTO users (username, email, password, role_id, first_name, middle_name, last_name) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            USER_COLUMNS
        );
        let created = sqlx::query_as::<_, User>(&insert_user)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role_id)
            .bind(&user.first_name)
            .bind(&user.middle_name)
            .bind(&user.last_name)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                secure_log::secure_error!("User insert failed", e);
                DbError::from(e)
            })?;

        let employee = match employee {
            Some(details) => {
                let insert_employee = format!(
                    "INSERT INTO employees (user_id, employee_id, department_id, blood_group, gov_id, verification_documents) \
                     VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
                    EMPLOYEE_COLUMNS
                );
                let row = sqlx::query_as::<_, Employee>(&insert_employee)
                    .bind(created.id)
                    .bind(employee_identifier(created.id))
                    .bind(details.department_id)
                    .bind(&details.blood_group)
                    .bind(&details.gov_id)
                    .bind(&details.verification_documents)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(|e| {
                        secure_log::secure_error!("Employee insert failed", e);
                        DbError::from(e)
                    })?;
                Some(row)
            }
            None => None,
        };

        // Dropping `tx` on any early return above rolls the user insert back
        tx.commit().await.map_err(|e| {
            secure_log::secure_error!("Registration commit failed", e);
            DbError::from(e)
        })?;

        secure_log::sensitive_debug!("User registration stored in {:?}", start.elapsed());
        Ok((created, employee))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        let start = std::time::Instant::now();
        let query = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);

        match sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(self.db_conn.get_pool())
            .await
        {
            Ok(user) => {
                secure_log::sensitive_debug!("User lookup by username completed in {:?}", start.elapsed());
                Ok(user)
            }
            Err(e) => {
                secure_log::secure_error!("User lookup by username failed", e);
                Err(DbError::from(e))
            }
        }
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        let start = std::time::Instant::now();
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        match sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(self.db_conn.get_pool())
            .await
        {
            Ok(user) => {
                secure_log::sensitive_debug!("User lookup by ID completed in {:?}", start.elapsed());
                Ok(user)
            }
            Err(e) => {
                secure_log::secure_error!("User lookup by ID failed", e);
                Err(DbError::from(e))
            }
        }
    }

    async fn find_employee_by_user_id(&self, user_id: i64) -> Result<Option<Employee>, DbError> {
        let query = format!("SELECT {} FROM employees WHERE user_id = $1", EMPLOYEE_COLUMNS);

        sqlx::query_as::<_, Employee>(&query)
            .bind(user_id)
            .fetch_optional(self.db_conn.get_pool())
            .await
            .map_err(|e| {
                secure_log::secure_error!("Employee lookup failed", e);
                DbError::from(e)
            })
    }

    async fn ping(&self) -> Result<(), DbError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(self.db_conn.get_pool())
            .await
            .map(|_| ())
            .map_err(DbError::from)
    }
}
