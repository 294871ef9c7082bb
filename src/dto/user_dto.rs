use crate::entity::employee::{Employee, NewEmployee};
use crate::entity::user::User;
use crate::error::request_error::RequestError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

/// Password encrypted by the client with the shared AES key, both parts hex encoded
#[derive(Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct EncryptedPassword {
    pub iv: String,
    pub content: String,
}

/// A submitted password: either a plain string or an encrypted object
#[derive(Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PasswordPayload {
    Plain(String),
    Encrypted(EncryptedPassword),
}

#[derive(Clone, Default, Deserialize, Validate)]
pub struct RegisterUserDto {
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(
        required(message = "Username is required"),
        length(min = 1, max = 80, message = "Username must be between 1 and 80 characters")
    )]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(
        required(message = "Email is required"),
        length(min = 1, max = 120, message = "Email must be between 1 and 120 characters"),
        email(message = "Email format is invalid")
    )]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(required(message = "Password is required"))]
    pub password: Option<PasswordPayload>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(
        required(message = "Role ID is required"),
        custom(function = "validate_role_id")
    )]
    pub role_id: Option<Value>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(
        required(message = "First name is required"),
        length(min = 1, max = 100, message = "First name must be between 1 and 100 characters")
    )]
    pub first_name: Option<String>,
    #[validate(length(max = 100, message = "Middle name must not exceed 100 characters"))]
    pub middle_name: Option<String>,
    #[validate(length(max = 100, message = "Last name must not exceed 100 characters"))]
    pub last_name: Option<String>,
    pub department_id: Option<i32>,
    #[serde(rename = "bloodgroup", alias = "blood_group")]
    #[validate(length(max = 3, message = "Blood group must not exceed 3 characters"))]
    pub blood_group: Option<String>,
    #[serde(rename = "govid", alias = "gov_id")]
    #[validate(length(max = 50, message = "Government ID must not exceed 50 characters"))]
    pub gov_id: Option<String>,
    #[serde(rename = "verificationdocuments", alias = "verification_documents")]
    #[validate(length(max = 255, message = "Verification documents must not exceed 255 characters"))]
    pub verification_documents: Option<String>,
}

#[derive(Clone, Default, Deserialize, Validate)]
pub struct LoginUserDto {
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(
        required(message = "Username is required"),
        length(min = 1, max = 80, message = "Username must be between 1 and 80 characters")
    )]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(required(message = "Password is required"))]
    pub password: Option<PasswordPayload>,
}

/// Values a client sends for a field it left empty
trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Blank for Value {
    fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl Blank for PasswordPayload {
    fn is_blank(&self) -> bool {
        match self {
            PasswordPayload::Plain(password) => password.is_empty(),
            PasswordPayload::Encrypted(encrypted) => {
                encrypted.iv.trim().is_empty() && encrypted.content.trim().is_empty()
            }
        }
    }
}

/// Empty strings count as absent so they fail `required` and get reported by name
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Blank,
{
    Ok(Option::<T>::deserialize(deserializer)?.filter(|value| !value.is_blank()))
}

fn validate_role_id(role_id: &Value) -> Result<(), ValidationError> {
    match role_id_from_value(role_id) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("integer")
            .with_message(std::borrow::Cow::Borrowed("Role ID must be an integer"))),
    }
}

/// JSON integers only; `"1"` and `1.0` are rejected.
fn role_id_from_value(value: &Value) -> Option<i32> {
    value.as_i64().and_then(|id| i32::try_from(id).ok())
}

/// Registration payload after validation
#[derive(Clone)]
pub struct RegistrationInput {
    pub username: String,
    pub email: String,
    pub password: PasswordPayload,
    pub role_id: i32,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub employee: NewEmployee,
}

impl TryFrom<RegisterUserDto> for RegistrationInput {
    type Error = RequestError;

    fn try_from(dto: RegisterUserDto) -> Result<Self, Self::Error> {
        dto.validate()?;

        let (Some(username), Some(email), Some(password), Some(role_id), Some(first_name)) =
            (dto.username, dto.email, dto.password, dto.role_id, dto.first_name)
        else {
            return Err(RequestError::invalid("payload", "Required fields are missing"));
        };

        let role_id = role_id_from_value(&role_id)
            .ok_or_else(|| RequestError::invalid("role_id", "Role ID must be an integer"))?;

        Ok(Self {
            username,
            email,
            password,
            role_id,
            first_name,
            middle_name: dto.middle_name,
            last_name: dto.last_name,
            employee: NewEmployee {
                department_id: dto.department_id,
                blood_group: dto.blood_group,
                gov_id: dto.gov_id,
                verification_documents: dto.verification_documents,
            },
        })
    }
}

/// Login payload after validation
#[derive(Clone)]
pub struct LoginInput {
    pub username: String,
    pub password: PasswordPayload,
}

impl TryFrom<LoginUserDto> for LoginInput {
    type Error = RequestError;

    fn try_from(dto: LoginUserDto) -> Result<Self, Self::Error> {
        dto.validate()?;

        let (Some(username), Some(password)) = (dto.username, dto.password) else {
            return Err(RequestError::invalid("payload", "Required fields are missing"));
        };

        Ok(Self { username, password })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RegisteredUserDto {
    pub user_id: i64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
}

impl RegisteredUserDto {
    pub fn from_parts(user: &User, employee: Option<&Employee>) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            employee_id: employee.map(|e| e.employee_id.clone()),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct UserReadDto {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role_id: i32,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee: Option<Employee>,
}

impl UserReadDto {
    pub fn from_parts(user: User, employee: Option<Employee>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role_id: user.role_id,
            first_name: user.first_name,
            middle_name: user.middle_name,
            last_name: user.last_name,
            created_at: user.created_at,
            employee,
        }
    }
}

impl std::fmt::Debug for PasswordPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PasswordPayload::Plain(_) => f.write_str("Plain(<redacted>)"),
            PasswordPayload::Encrypted(_) => f.write_str("Encrypted(<redacted>)"),
        }
    }
}

impl std::fmt::Debug for RegisterUserDto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterUserDto")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("role_id", &self.role_id)
            .field("first_name", &self.first_name)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for LoginUserDto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginUserDto")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registration(body: Value) -> RegisterUserDto {
        serde_json::from_value(body).unwrap()
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

    #[test]
    fn test_valid_registration_converts() {
        let input = RegistrationInput::try_from(registration(alice())).unwrap();
        assert_eq!(input.username, "alice");
        assert_eq!(input.role_id, 2);
        assert_eq!(input.password, PasswordPayload::Plain("longenough1".to_string()));
        assert_eq!(input.last_name, None);
        assert_eq!(input.employee, NewEmployee::default());
    }

    #[test]
    fn test_missing_fields_are_named() {
        let error = RegistrationInput::try_from(registration(json!({
            "username": "alice",
            "password": "longenough1"
        })))
        .err()
        .unwrap();

        assert_eq!(error.missing_fields(), vec!["email", "first_name", "role_id"]);
    }

    #[test]
    fn test_null_counts_as_missing() {
        let mut body = alice();
        body["email"] = Value::Null;
        let error = RegistrationInput::try_from(registration(body)).err().unwrap();
        assert_eq!(error.missing_fields(), vec!["email"]);
    }

    #[test]
    fn test_blank_required_values_count_as_missing() {
        let mut body = alice();
        body["email"] = json!("");
        body["first_name"] = json!("   ");
        body["role_id"] = json!("");
        body["password"] = json!("");
        let error = RegistrationInput::try_from(registration(body)).err().unwrap();

        assert_eq!(error.missing_fields(), vec!["email", "first_name", "password", "role_id"]);
    }

    #[test]
    fn test_blank_optional_values_are_kept() {
        let mut body = alice();
        body["middle_name"] = json!("");
        let input = RegistrationInput::try_from(registration(body)).unwrap();
        assert_eq!(input.middle_name.as_deref(), Some(""));
    }

    #[test]
    fn test_login_with_empty_username_names_it() {
        let dto: LoginUserDto =
            serde_json::from_value(json!({"username": "", "password": "longenough1"})).unwrap();
        let error = LoginInput::try_from(dto).err().unwrap();
        assert_eq!(error.missing_fields(), vec!["username"]);
    }

    #[test]
    fn test_username_over_80_characters_is_rejected() {
        let mut body = alice();
        body["username"] = json!("u".repeat(81));
        assert!(RegistrationInput::try_from(registration(body)).is_err());

        let mut body = alice();
        body["username"] = json!("u".repeat(80));
        assert!(RegistrationInput::try_from(registration(body)).is_ok());
    }

    #[test]
    fn test_email_over_120_characters_is_rejected() {
        let mut body = alice();
        body["email"] = json!(format!("{}@x.com", "a".repeat(115)));
        let error = RegistrationInput::try_from(registration(body)).err().unwrap();
        assert!(matches!(error, RequestError::ValidationError(_)));
        assert!(error.missing_fields().is_empty());
    }

    #[test]
    fn test_role_id_must_be_an_integer() {
        for role_id in [json!("1"), json!(1.5), json!(true), json!(i64::MAX)] {
            let mut body = alice();
            body["role_id"] = role_id;
            let error = RegistrationInput::try_from(registration(body)).err().unwrap();
            let RequestError::ValidationError(errors) = error else {
                panic!("expected validation errors");
            };
            assert!(errors.field_errors().contains_key("role_id"));
        }
    }

    #[test]
    fn test_employee_fields_accept_both_spellings() {
        let mut body = alice();
        body["bloodgroup"] = json!("O+");
        body["gov_id"] = json!("GOV-1");
        body["verificationdocuments"] = json!("s3://docs/alice.pdf");
        body["department_id"] = json!(4);

        let input = RegistrationInput::try_from(registration(body)).unwrap();
        assert_eq!(input.employee.blood_group.as_deref(), Some("O+"));
        assert_eq!(input.employee.gov_id.as_deref(), Some("GOV-1"));
        assert_eq!(
            input.employee.verification_documents.as_deref(),
            Some("s3://docs/alice.pdf")
        );
        assert_eq!(input.employee.department_id, Some(4));
    }

    #[test]
    fn test_blood_group_length() {
        let mut body = alice();
        body["bloodgroup"] = json!("AB+-");
        assert!(RegistrationInput::try_from(registration(body)).is_err());
    }

    #[test]
    fn test_encrypted_password_deserializes() {
        let mut body = alice();
        body["password"] = json!({"iv": "00", "content": "ff"});
        let input = RegistrationInput::try_from(registration(body)).unwrap();
        assert_eq!(
            input.password,
            PasswordPayload::Encrypted(EncryptedPassword {
                iv: "00".to_string(),
                content: "ff".to_string(),
            })
        );
    }

    #[test]
    fn test_login_requires_username_and_password() {
        let dto: LoginUserDto = serde_json::from_value(json!({"username": "alice"})).unwrap();
        let error = LoginInput::try_from(dto).err().unwrap();
        assert_eq!(error.missing_fields(), vec!["password"]);
    }

    #[test]
    fn test_debug_output_hides_password() {
        let dto = registration(alice());
        let rendered = format!("{:?}", dto);
        assert!(!rendered.contains("longenough1"));
        assert!(rendered.contains("alice"));
    }
}
