use crate::entity::employee::{Employee, NewEmployee, employee_identifier};
use crate::entity::user::{NewUser, User};
use crate::error::db_error::DbError;
use crate::repository::UserStore;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Clone, Default)]
struct Tables {
    users: Vec<User>,
    employees: Vec<Employee>,
    next_user_id: i64,
    next_employee_id: i64,
}

/// Process-local [`UserStore`] with the same uniqueness rules as the SQL schema.
///
/// One lock covers both tables. A registration is written to a staged copy
/// and swapped in only when every row succeeded.
#[derive(Default)]
pub struct InMemoryUserStore {
    tables: Mutex<Tables>,
    reject_employees: AtomicBool,
    latency: Option<Duration>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Every operation sleeps this long first; used to exercise store timeouts
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Fail the employee insert after the user row has been staged
    pub fn reject_employee_inserts(&self, reject: bool) {
        self.reject_employees.store(reject, Ordering::SeqCst);
    }

    pub async fn user_count(&self) -> usize {
        self.tables.lock().await.users.len()
    }

    pub async fn employee_count(&self) -> usize {
        self.tables.lock().await.employees.len()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn unique_violation(constraint: &str) -> DbError {
    DbError::UniqueViolation {
        constraint: constraint.to_string(),
    }
}

fn insert_user(tables: &mut Tables, user: NewUser) -> Result<User, DbError> {
    if tables.users.iter().any(|u| u.username == user.username) {
        return Err(unique_violation("uq_users_username"));
    }
    if tables.users.iter().any(|u| u.email == user.email) {
        return Err(unique_violation("uq_users_email"));
    }

    tables.next_user_id += 1;
    let created = User {
        id: tables.next_user_id,
        username: user.username,
        email: user.email,
        password: user.password_hash,
        role_id: user.role_id,
        first_name: user.first_name,
        middle_name: user.middle_name,
        last_name: user.last_name,
        created_at: Utc::now(),
    };
    tables.users.push(created.clone());
    Ok(created)
}

fn insert_employee(
    tables: &mut Tables,
    user_id: i64,
    details: NewEmployee,
) -> Result<Employee, DbError> {
    let employee_id = employee_identifier(user_id);
    if tables.employees.iter().any(|e| e.user_id == user_id) {
        return Err(unique_violation("uq_employees_user_id"));
    }
    if tables.employees.iter().any(|e| e.employee_id == employee_id) {
        return Err(unique_violation("uq_employee_id"));
    }

    tables.next_employee_id += 1;
    let row = Employee {
        id: tables.next_employee_id,
        user_id,
        employee_id,
        department_id: details.department_id,
        blood_group: details.blood_group,
        gov_id: details.gov_id,
        verification_documents: details.verification_documents,
        created_at: Utc::now(),
    };
    tables.employees.push(row.clone());
    Ok(row)
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create_user(
        &self,
        user: NewUser,
        employee: Option<NewEmployee>,
    ) -> Result<(User, Option<Employee>), DbError> {
        self.simulate_latency().await;
        let mut tables = self.tables.lock().await;

        let mut staged = tables.clone();
        let created = insert_user(&mut staged, user)?;
        let employee = match employee {
            Some(details) => {
                if self.reject_employees.load(Ordering::SeqCst) {
                    return Err(DbError::SomethingWentWrong("employee insert rejected".to_string()));
                }
                Some(insert_employee(&mut staged, created.id, details)?)
            }
            None => None,
        };

        *tables = staged;
        Ok((created, employee))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        self.simulate_latency().await;
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        self.simulate_latency().await;
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_employee_by_user_id(&self, user_id: i64) -> Result<Option<Employee>, DbError> {
        self.simulate_latency().await;
        let tables = self.tables.lock().await;
        Ok(tables.employees.iter().find(|e| e.user_id == user_id).cloned())
    }

    async fn ping(&self) -> Result<(), DbError> {
        self.simulate_latency().await;
        Ok(())
    }
}
