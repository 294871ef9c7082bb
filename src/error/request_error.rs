use crate::response::app_response::{ErrorResponse, ValidationErrorDetail};
use axum::extract::{FromRequest, Request, rejection::JsonRejection};
use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    ValidationError(#[from] validator::ValidationErrors),
    #[error("{reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error(transparent)]
    JsonRejection(#[from] JsonRejection),
}

impl RequestError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        RequestError::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Names of required fields that were absent, sorted for stable messages
    pub fn missing_fields(&self) -> Vec<String> {
        let RequestError::ValidationError(errors) = self else {
            return Vec::new();
        };

        let mut missing: Vec<String> = errors
            .field_errors()
            .into_iter()
            .filter(|(_, field_errors)| field_errors.iter().any(|e| e.code == "required"))
            .map(|(field, _)| field.to_string())
            .collect();
        missing.sort();
        missing
    }
}

/// JSON body extractor that reports malformed bodies as [`RequestError`].
///
/// Field validation is left to the service layer so that it runs on every
/// entry point, not only HTTP.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRequest<T>(pub T);

impl<T, S> FromRequest<S> for JsonRequest<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = RequestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(RequestError::JsonRejection)?;
        Ok(JsonRequest(value))
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let missing = self.missing_fields();
        match self {
            RequestError::ValidationError(validation_errors) => {
                let message = if missing.is_empty() {
                    "Validation failed".to_string()
                } else {
                    format!("Missing required fields: {}", missing.join(", "))
                };
                let details = convert_validation_errors_to_details(validation_errors);
                ErrorResponse::with_validation_errors(message, details)
                    .with_status(StatusCode::BAD_REQUEST)
                    .into_response()
            }
            RequestError::InvalidField { field, reason } => ErrorResponse::with_validation_errors(
                "Validation failed".to_string(),
                vec![ValidationErrorDetail::new(
                    field.to_string(),
                    "INVALID_VALUE".to_string(),
                    reason,
                )],
            )
            .with_status(StatusCode::BAD_REQUEST)
            .into_response(),
            RequestError::JsonRejection(rejection) => {
                ErrorResponse::send(rejection.body_text())
                    .with_status(StatusCode::BAD_REQUEST)
                    .into_response()
            }
        }
    }
}

fn convert_validation_errors_to_details(errors: validator::ValidationErrors) -> Vec<ValidationErrorDetail> {
    let mut details: Vec<ValidationErrorDetail> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| {
                let params_string_keys: HashMap<String, Value> = error
                    .params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect();

                let semantic_type =
                    map_validator_code_to_semantic_type(&error.code, &params_string_keys);

                ValidationErrorDetail::new(
                    field.to_string(),
                    semantic_type,
                    error
                        .message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                )
            })
        })
        .collect();
    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

fn map_validator_code_to_semantic_type(code: &str, params: &HashMap<String, Value>) -> String {
    match code {
        "email" => "INVALID_FORMAT".to_string(),
        "length" => {
            if params.get("max").is_some() {
                "INVALID_LENGTH".to_string()
            } else {
                "TOO_SHORT".to_string()
            }
        }
        "integer" => "INVALID_TYPE".to_string(),
        "required" => "MISSING".to_string(),
        _ => "INVALID_VALUE".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_type_mapping() {
        let mut params = HashMap::new();
        assert_eq!(map_validator_code_to_semantic_type("required", &params), "MISSING");
        assert_eq!(map_validator_code_to_semantic_type("email", &params), "INVALID_FORMAT");
        assert_eq!(map_validator_code_to_semantic_type("length", &params), "TOO_SHORT");
        params.insert("max".to_string(), Value::from(80));
        assert_eq!(map_validator_code_to_semantic_type("length", &params), "INVALID_LENGTH");
        assert_eq!(map_validator_code_to_semantic_type("integer", &params), "INVALID_TYPE");
    }

    #[test]
    fn test_invalid_field_is_bad_request() {
        let response = RequestError::invalid("password", "too short").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
