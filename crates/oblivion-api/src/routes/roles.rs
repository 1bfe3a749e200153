//! # Role Endpoints
//!
//! - `GET /v1/accounts/:identity`: roles and passport count (public).
//! - `POST /v1/roles/grant`, `POST /v1/roles/revoke`: Admin only.
//! - `POST /v1/roles/renounce`: drop one of the caller's own roles.
//!
//! Granting a held role or revoking an absent one succeeds without change.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use oblivion_core::{Identity, Role};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_path};
use crate::state::AppState;

/// Request body for grant and revoke.
#[derive(Debug, Deserialize)]
pub struct RoleChangeRequest {
    /// The account to change.
    pub account: Identity,
    /// The role.
    pub role: Role,
}

/// Request body for renounce.
#[derive(Debug, Deserialize)]
pub struct RenounceRequest {
    /// The role the caller gives up.
    pub role: Role,
}

/// An account's standing in the registry.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountView {
    /// The account.
    pub account: Identity,
    /// Roles held.
    pub roles: Vec<Role>,
    /// Passports owned, revoked included.
    pub passports: u64,
}

/// Unauthenticated role routes.
pub fn public_router() -> Router<AppState> {
    Router::new().route("/v1/accounts/:identity", get(get_account))
}

/// Role routes requiring a caller identity.
pub fn authenticated_router() -> Router<AppState> {
    Router::new()
        .route("/v1/roles/grant", post(grant_role))
        .route("/v1/roles/revoke", post(revoke_role))
        .route("/v1/roles/renounce", post(renounce_role))
}

fn account_view(state: &AppState, account: Identity) -> AccountView {
    AccountView {
        roles: state.registry.roles_of(&account),
        passports: state.registry.balance_of(&account),
        account,
    }
}

async fn get_account(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<AccountView>, AppError> {
    let account = Identity::new(extract_path(path)?)?;
    Ok(Json(account_view(&state, account)))
}

async fn grant_role(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    body: Result<Json<RoleChangeRequest>, JsonRejection>,
) -> Result<Json<AccountView>, AppError> {
    let req = extract_json(body)?;
    state.registry.grant_role(&caller, &req.account, req.role)?;
    Ok(Json(account_view(&state, req.account)))
}

async fn revoke_role(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    body: Result<Json<RoleChangeRequest>, JsonRejection>,
) -> Result<Json<AccountView>, AppError> {
    let req = extract_json(body)?;
    state.registry.revoke_role(&caller, &req.account, req.role)?;
    Ok(Json(account_view(&state, req.account)))
}

async fn renounce_role(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    body: Result<Json<RenounceRequest>, JsonRejection>,
) -> Result<Json<AccountView>, AppError> {
    let req = extract_json(body)?;
    state.registry.renounce_role(&caller, req.role)?;
    Ok(Json(account_view(&state, caller)))
}
