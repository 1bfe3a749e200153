//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps registry errors to HTTP status codes and returns JSON error bodies
//! with a stable machine-readable code. Storage failures are logged and
//! reported without their internal message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use oblivion_registry::RegistryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// The error.
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "ALREADY_MINTED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Whether the same request may succeed if retried.
    #[serde(default)]
    pub retryable: bool,
}

/// Application-level error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request content failed validation (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401).
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// A registry operation failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            Self::Registry(err) => (registry_status(err), err.code()),
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, Self::Registry(RegistryError::Storage(_)))
    }
}

fn registry_status(err: &RegistryError) -> StatusCode {
    match err {
        RegistryError::Unauthorized { .. } | RegistryError::Soulbound => StatusCode::FORBIDDEN,
        RegistryError::AlreadyMinted { .. }
        | RegistryError::AlreadyRevoked(_)
        | RegistryError::LastAdminProtected { .. } => StatusCode::CONFLICT,
        RegistryError::InvalidProof(_)
        | RegistryError::UnknownVerifier(_)
        | RegistryError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RegistryError::VerificationUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
        RegistryError::Revoked(_) => StatusCode::GONE,
        RegistryError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if self.is_internal() {
            tracing::error!(error = %self, "internal server error");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };
        let retryable = matches!(&self, Self::Registry(err) if err.is_retryable());

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                retryable,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<oblivion_core::ValidationError> for AppError {
    fn from(err: oblivion_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use oblivion_core::{CredentialId, Identity, IdentityHash, Role};

    fn status(err: RegistryError) -> StatusCode {
        AppError::from(err).status_and_code().0
    }

    #[test]
    fn registry_errors_map_to_distinct_statuses() {
        let id = CredentialId::new(1);
        let who = Identity::new("mallory").unwrap();
        assert_eq!(
            status(RegistryError::Unauthorized {
                caller: who.clone(),
                role: Role::Issuer
            }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status(RegistryError::AlreadyMinted {
                identity_hash: IdentityHash::commit(b"h")
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(RegistryError::InvalidProof("no".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(RegistryError::VerificationUnavailable("t".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status(RegistryError::NotFound(id)), StatusCode::NOT_FOUND);
        assert_eq!(status(RegistryError::Revoked(id)), StatusCode::GONE);
        assert_eq!(status(RegistryError::AlreadyRevoked(id)), StatusCode::CONFLICT);
        assert_eq!(
            status(RegistryError::LastAdminProtected { account: who }),
            StatusCode::CONFLICT
        );
        assert_eq!(status(RegistryError::Soulbound), StatusCode::FORBIDDEN);
        assert_eq!(
            status(RegistryError::Storage("disk".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn code_comes_from_registry() {
        let err = AppError::from(RegistryError::Soulbound);
        assert_eq!(err.status_and_code().1, "SOULBOUND");
        let err = AppError::BadRequest("x".into());
        assert_eq!(err.status_and_code(), (StatusCode::BAD_REQUEST, "BAD_REQUEST"));
    }

    #[tokio::test]
    async fn storage_message_is_hidden() {
        let response =
            AppError::from(RegistryError::Storage("/var/lib/audit: disk full".into()))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error.code, "STORAGE_ERROR");
        assert!(!body.error.message.contains("disk"));
        assert!(body.error.retryable);
    }

    #[tokio::test]
    async fn client_errors_keep_message() {
        let response =
            AppError::from(RegistryError::Revoked(CredentialId::new(7))).into_response();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error.code, "REVOKED");
        assert!(body.error.message.contains('7'));
        assert!(!body.error.retryable);
    }
}
