//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::auth::{PasswordError, TokenError};
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("{0}")]
    Validation(String),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing Authorization header")]
    MissingCredential,

    #[error("Invalid Authorization format")]
    MalformedCredential,

    #[error("Invalid token")]
    InvalidToken,

    #[error("{0} not found")]
    NotFound(&'static str),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] crate::domain::DomainError),

    // Server errors (5xx)
    #[error("Storage failure")]
    Store(StoreError),

    #[error("Internal error")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AppError::DuplicateEmail,
            StoreError::UserNotFound(_) => AppError::NotFound("User"),
            other => AppError::Store(other),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Encoding(msg) => AppError::Internal(msg),
            TokenError::Expired | TokenError::Invalid => AppError::InvalidToken,
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(e: PasswordError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    /// HTTP status and machine-readable code
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            // 400 Bad Request
            AppError::Validation(_) | AppError::Domain(_) => {
                (StatusCode::BAD_REQUEST, "validation_error")
            }

            // 401 Unauthorized
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            AppError::MissingCredential => (StatusCode::UNAUTHORIZED, "missing_credential"),
            AppError::MalformedCredential => (StatusCode::UNAUTHORIZED, "malformed_credential"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token"),

            // 404 Not Found
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),

            // 409 Conflict
            AppError::DuplicateEmail => (StatusCode::CONFLICT, "duplicate_email"),

            // 500 Internal Server Error
            AppError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_failure"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    /// Offending field or value for rejected input
    pub fn details(&self) -> Option<String> {
        use crate::domain::DomainError;

        match self {
            AppError::Domain(domain_err) => match domain_err {
                DomainError::MissingField(field) => Some((*field).to_string()),
                DomainError::InvalidField { field, .. } => Some((*field).to_string()),
                DomainError::InvalidAmount(e) => Some(e.to_string()),
                DomainError::InvalidDate(value) | DomainError::InvalidEntryType(value) => {
                    Some(value.clone())
                }
                DomainError::InvalidRange { start, end } => Some(format!("{start}..{end}")),
            },
            AppError::NotFound(kind) => Some((*kind).to_string()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        match &self {
            AppError::Store(e) => tracing::error!("Storage error: {:?}", e),
            AppError::Internal(msg) => tracing::error!("Internal error: {}", msg),
            _ => {}
        }

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details: self.details(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Domain(DomainError::MissingField("name")), StatusCode::BAD_REQUEST),
            (AppError::DuplicateEmail, StatusCode::CONFLICT),
            (AppError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AppError::MissingCredential, StatusCode::UNAUTHORIZED),
            (AppError::MalformedCredential, StatusCode::UNAUTHORIZED),
            (AppError::InvalidToken, StatusCode::UNAUTHORIZED),
            (AppError::NotFound("Expense"), StatusCode::NOT_FOUND),
            (
                AppError::Store(StoreError::Decode("bad".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.status_and_code().0, status, "{error:?}");
        }
    }

    #[test]
    fn test_store_errors_translate() {
        assert!(matches!(
            AppError::from(StoreError::DuplicateEmail),
            AppError::DuplicateEmail
        ));
        assert!(matches!(
            AppError::from(StoreError::Decode("x".into())),
            AppError::Store(_)
        ));
    }

    #[test]
    fn test_store_failure_hides_detail() {
        let err = AppError::from(StoreError::Decode("/var/data.json line 3".into()));
        assert_eq!(err.to_string(), "Storage failure");
    }

    #[test]
    fn test_details_name_the_rejected_input() {
        let missing = AppError::Domain(DomainError::MissingField("amount"));
        assert_eq!(missing.details().as_deref(), Some("amount"));

        let bad_date = AppError::Domain(DomainError::InvalidDate("2024-13-01".into()));
        assert_eq!(bad_date.details().as_deref(), Some("2024-13-01"));

        assert_eq!(AppError::NotFound("Expense").details().as_deref(), Some("Expense"));
        assert!(AppError::InvalidToken.details().is_none());
        assert!(AppError::Store(StoreError::Decode("x".into())).details().is_none());
    }

    #[tokio::test]
    async fn test_response_body_carries_details() {
        use http_body_util::BodyExt;

        let response = AppError::Domain(DomainError::MissingField("category")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error_code"], "validation_error");
        assert_eq!(body["details"], "category");

        let response = AppError::InvalidCredentials.into_response();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body.get("details").is_none());
    }

    #[test]
    fn test_token_errors_are_invalid_token() {
        assert!(matches!(AppError::from(TokenError::Expired), AppError::InvalidToken));
        assert!(matches!(AppError::from(TokenError::Invalid), AppError::InvalidToken));
    }
}
