use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// One rejected field of a candidate record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("validation failed: {}", summarize(.0))]
    Validation(Vec<FieldViolation>),

    #[error("account with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("account not found: {0}")]
    NotFound(i32),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type AccountResult<T> = Result<T, AccountError>;

impl AccountError {
    /// Fields rejected by validation, empty for every other variant.
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            AccountError::Validation(v) => v,
            _ => &[],
        }
    }
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AccountError::Validation(violations) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                summarize(violations),
            ),
            AccountError::DuplicateEmail(email) => (
                StatusCode::CONFLICT,
                "duplicate",
                format!("Account with email '{}' already exists", email),
            ),
            AccountError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Account {} not found", id),
            ),
            AccountError::Hashing(msg) => {
                tracing::error!(error = %msg, "password hashing error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AccountError::Database(e) => {
                tracing::error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        (
            status,
            Json(json!({
                "error": {
                    "type": error_type,
                    "message": message
                }
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_every_field() {
        let err = AccountError::Validation(vec![
            FieldViolation::new("email", "must be a valid email address"),
            FieldViolation::new("password", "must be at least 4 characters"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("email: must be a valid email address"));
        assert!(msg.contains("password: must be at least 4 characters"));
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (AccountError::Validation(vec![]), StatusCode::BAD_REQUEST),
            (
                AccountError::DuplicateEmail("a@b.io".into()),
                StatusCode::CONFLICT,
            ),
            (AccountError::NotFound(7), StatusCode::NOT_FOUND),
            (
                AccountError::Hashing("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AccountError::Database(sqlx::Error::RowNotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn non_validation_errors_have_no_violations() {
        assert!(AccountError::NotFound(1).violations().is_empty());
    }
}
