//! # oblivion-api: HTTP Service for the Passport Registry
//!
//! ## API Surface
//!
//! | Route                              | Auth | Module                  |
//! |------------------------------------|------|-------------------------|
//! | `GET  /v1/passports[/:id[/…]]`     | no   | [`routes::passports`]   |
//! | `GET  /v1/identities/:hash`        | no   | [`routes::passports`]   |
//! | `POST /v1/passports[/:id/…]`       | yes  | [`routes::passports`]   |
//! | `GET  /v1/accounts/:identity`      | no   | [`routes::roles`]       |
//! | `POST /v1/roles/*`                 | yes  | [`routes::roles`]       |
//! | `GET  /v1/verifier`                | no   | [`routes::verifier`]    |
//! | `PUT  /v1/verifier`                | yes  | [`routes::verifier`]    |
//! | `GET  /v1/audit`                   | no   | [`routes::audit`]       |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AuthMiddleware (mutating routes only) → Handler
//! ```

pub mod auth;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the full application router.
///
/// Health probes and reads are mounted outside the auth middleware.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    let authenticated = Router::new()
        .merge(routes::passports::authenticated_router())
        .merge(routes::roles::authenticated_router())
        .merge(routes::verifier::authenticated_router())
        .route_layer(from_fn(auth::auth_middleware));

    let api = Router::new()
        .merge(routes::passports::public_router())
        .merge(routes::roles::public_router())
        .merge(routes::verifier::public_router())
        .merge(routes::audit::router())
        .merge(authenticated)
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe. Always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. Returns 200 once the registry is constructed.
async fn readiness() -> &'static str {
    "ready"
}
