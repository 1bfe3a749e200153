//! # Verifier Endpoints
//!
//! - `GET /v1/verifier`: the active verification backend (public).
//! - `PUT /v1/verifier`: switch to a built-in backend (Admin only).

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use oblivion_zkp::VerifierRef;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

/// The active verifier, and the request body for replacing it.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifierBody {
    /// Verifier reference (`mock:allow`, `mock:deny`, `signal-binding`).
    pub verifier: VerifierRef,
}

/// Unauthenticated verifier routes.
pub fn public_router() -> Router<AppState> {
    Router::new().route("/v1/verifier", get(get_verifier))
}

/// Verifier routes requiring a caller identity.
pub fn authenticated_router() -> Router<AppState> {
    Router::new().route("/v1/verifier", put(set_verifier))
}

async fn get_verifier(State(state): State<AppState>) -> Json<VerifierBody> {
    Json(VerifierBody {
        verifier: state.registry.verifier(),
    })
}

async fn set_verifier(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    body: Result<Json<VerifierBody>, JsonRejection>,
) -> Result<Json<VerifierBody>, AppError> {
    let req = extract_json(body)?;
    state.registry.set_verifier_ref(&caller, req.verifier)?;
    Ok(Json(VerifierBody {
        verifier: state.registry.verifier(),
    }))
}
