use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Employee {
    pub id: i64,
    pub user_id: i64,
    pub employee_id: String,
    pub department_id: Option<i32>,
    pub blood_group: Option<String>,
    pub gov_id: Option<String>,
    pub verification_documents: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Employee details supplied at registration; the owning user id and the
/// employee identifier are assigned by the store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewEmployee {
    pub department_id: Option<i32>,
    pub blood_group: Option<String>,
    pub gov_id: Option<String>,
    pub verification_documents: Option<String>,
}

/// Employee identifiers are derived from the owning user's id, which is unique.
pub fn employee_identifier(user_id: i64) -> String {
    format!("EMP{:06}", user_id)
}
