//! # Authentication Middleware
//!
//! Resolves the caller's [`Identity`] from the `Authorization` header.
//! Authorization (which roles the identity holds) is always decided by the
//! registry, never here.
//!
//! ## Token Format
//!
//! ```text
//! Bearer {identity}:{secret}   when AUTH_TOKEN is configured
//! Bearer {identity}            development mode (no AUTH_TOKEN)
//! ```
//!
//! The secret follows the last `:`, so identities may themselves contain
//! colons (`did:example:123:secret`).

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use oblivion_core::Identity;
use subtle::ConstantTimeEq;

use crate::error::{AppError, ErrorBody, ErrorDetail};

/// The authenticated caller, available to handlers as an extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(pub Identity);

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| {
                AppError::Unauthenticated("no caller identity in request context".into())
            })
    }
}

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token value.
#[derive(Clone)]
pub struct AuthConfig {
    /// Shared secret. `None` disables secret checking.
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Constant-time comparison of secrets.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse a bearer token into the caller's identity.
pub fn parse_bearer_token(provided: &str, expected_secret: Option<&str>) -> Result<Identity, String> {
    let identity = match expected_secret {
        Some(expected) => {
            let (identity, secret) = provided
                .rsplit_once(':')
                .ok_or("invalid token format, expected {identity}:{secret}")?;
            if !constant_time_token_eq(secret, expected) {
                return Err("invalid bearer token".into());
            }
            identity
        }
        None => provided,
    };
    Identity::new(identity).map_err(|e| format!("invalid identity: {e}"))
}

/// Extract the Bearer token, resolve the caller, and inject
/// [`CallerIdentity`] into request extensions.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected = request
        .extensions()
        .get::<AuthConfig>()
        .and_then(|c| c.token.clone());

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let provided = match auth_header {
        Some(value) => match value.strip_prefix("Bearer ") {
            Some(token) => token.trim(),
            None => {
                tracing::warn!("authentication failed: non-Bearer authorization scheme");
                return unauthenticated_response("authorization header must use Bearer scheme");
            }
        },
        None => {
            tracing::warn!("authentication failed: missing authorization header");
            return unauthenticated_response("missing authorization header");
        }
    };

    match parse_bearer_token(provided, expected.as_deref()) {
        Ok(identity) => {
            request.extensions_mut().insert(CallerIdentity(identity));
            next.run(request).await
        }
        Err(msg) => {
            tracing::warn!(reason = %msg, "authentication failed");
            unauthenticated_response(&msg)
        }
    }
}

fn unauthenticated_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHENTICATED".to_string(),
            message: message.to_string(),
            retryable: false,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_app(token: Option<&str>) -> Router {
        let auth_config = AuthConfig {
            token: token.map(str::to_string),
        };
        Router::new()
            .route(
                "/whoami",
                get(|CallerIdentity(who): CallerIdentity| async move { who.to_string() }),
            )
            .layer(from_fn(auth_middleware))
            .layer(axum::Extension(auth_config))
    }

    async fn call(app: Router, header: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(h) = header {
            builder = builder.header("Authorization", h);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn parses_identity_and_secret() {
        assert_eq!(
            parse_bearer_token("alice:s3cret", Some("s3cret")).unwrap().as_str(),
            "alice"
        );
        assert_eq!(
            parse_bearer_token("did:example:42:s3cret", Some("s3cret"))
                .unwrap()
                .as_str(),
            "did:example:42"
        );
        assert!(parse_bearer_token("alice:wrong", Some("s3cret")).is_err());
        assert!(parse_bearer_token("alice", Some("s3cret")).is_err());
        assert!(parse_bearer_token(":s3cret", Some("s3cret")).is_err());
    }

    #[test]
    fn dev_mode_takes_whole_token() {
        assert_eq!(parse_bearer_token("alice", None).unwrap().as_str(), "alice");
        assert!(parse_bearer_token("", None).is_err());
    }

    #[tokio::test]
    async fn valid_token_resolves_caller() {
        let (status, body) = call(test_app(Some("s3cret")), Some("Bearer alice:s3cret")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "alice");
    }

    #[tokio::test]
    async fn missing_header_rejected() {
        let (status, body) = call(test_app(Some("s3cret")), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("missing"));
    }

    #[tokio::test]
    async fn wrong_secret_rejected() {
        let (status, body) = call(test_app(Some("s3cret")), Some("Bearer alice:nope")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("UNAUTHENTICATED"));
    }

    #[tokio::test]
    async fn non_bearer_scheme_rejected() {
        let (status, body) = call(test_app(None), Some("Basic dXNlcjpwYXNz")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Bearer scheme"));
    }

    #[tokio::test]
    async fn dev_mode_still_needs_an_identity() {
        let (status, body) = call(test_app(None), Some("Bearer bob")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "bob");
        let (status, _) = call(test_app(None), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = AuthConfig {
            token: Some("super-secret".into()),
        };
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("REDACTED"));
    }
}
