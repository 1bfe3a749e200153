//! # Passport Endpoints
//!
//! ## Public
//!
//! - `GET /v1/passports`: issued count.
//! - `GET /v1/passports/:id`: lifecycle record (no attributes).
//! - `GET /v1/passports/:id/attributes`: attributes of an active passport;
//!   `410 REVOKED` once revoked.
//! - `GET /v1/passports/:id/owner`: holder, regardless of revocation.
//! - `GET /v1/identities/:hash`: credential bound to an identity hash.
//!
//! ## Authenticated
//!
//! - `POST /v1/passports`: issue (Issuer).
//! - `POST /v1/passports/:id/revoke`: revoke (Revoker).
//! - `POST /v1/passports/:id/transfer`: always `403 SOULBOUND`.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use oblivion_core::{
    hex_decode, Attributes, CredentialId, Identity, IdentityHash, MetadataPointer, Role,
};
use oblivion_registry::{Credential, CredentialState, IssueRequest, Revocation};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_path};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Request body for issuance.
#[derive(Debug, Deserialize)]
pub struct IssuePassportRequest {
    /// The holder.
    pub owner: Identity,
    /// Declared attributes.
    pub attributes: Attributes,
    /// Hex-encoded proof bytes (`0x` prefix optional).
    pub proof: String,
    /// Public signals the proof commits to.
    #[serde(default)]
    pub public_signals: Vec<u64>,
    /// Off-registry metadata reference.
    #[serde(default)]
    pub metadata_pointer: MetadataPointer,
}

/// Response to a successful issuance.
#[derive(Debug, Serialize, Deserialize)]
pub struct IssuePassportResponse {
    /// The new credential id.
    pub id: CredentialId,
}

/// Request body for revocation.
#[derive(Debug, Deserialize)]
pub struct RevokePassportRequest {
    /// Free-text reason.
    pub reason: String,
}

/// Request body for transfer. Parsed only for logging.
#[derive(Debug, Default, Deserialize)]
pub struct TransferPassportRequest {
    /// Claimed current holder.
    pub from: Option<Identity>,
    /// Requested new holder.
    pub to: Option<Identity>,
}

/// Lifecycle view of a passport. Attributes are served separately so that
/// revoked credentials never return them.
#[derive(Debug, Serialize, Deserialize)]
pub struct PassportView {
    /// Credential id.
    pub id: CredentialId,
    /// The holder.
    pub owner: Identity,
    /// Lifecycle state.
    pub state: CredentialState,
    /// The identity commitment the passport is bound to.
    pub identity_hash: IdentityHash,
    /// Off-registry metadata reference.
    pub metadata_pointer: MetadataPointer,
    /// Issuance time.
    pub issued_at: DateTime<Utc>,
    /// Revocation details, if revoked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation: Option<Revocation>,
}

impl From<Credential> for PassportView {
    fn from(c: Credential) -> Self {
        Self {
            id: c.id(),
            owner: c.owner().clone(),
            state: c.state(),
            identity_hash: c.attributes().identity_hash,
            metadata_pointer: c.metadata_pointer().clone(),
            issued_at: c.issued_at(),
            revocation: c.revocation().cloned(),
        }
    }
}

/// Attributes of an active passport.
#[derive(Debug, Serialize, Deserialize)]
pub struct AttributesResponse {
    /// Credential id.
    pub id: CredentialId,
    /// The attributes.
    pub attributes: Attributes,
}

/// Holder of a passport.
#[derive(Debug, Serialize, Deserialize)]
pub struct OwnerResponse {
    /// Credential id.
    pub id: CredentialId,
    /// The holder.
    pub owner: Identity,
    /// Whether the passport is revoked.
    pub revoked: bool,
}

/// Issued count.
#[derive(Debug, Serialize, Deserialize)]
pub struct SupplyResponse {
    /// Number of passports ever issued.
    pub total_supply: u64,
}

/// Binding of an identity hash.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityResponse {
    /// The commitment.
    pub identity_hash: IdentityHash,
    /// The bound credential.
    pub credential_id: CredentialId,
}

// ---------------------------------------------------------------------------
// Routers
// ---------------------------------------------------------------------------

/// Unauthenticated passport routes.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/v1/passports", get(total_supply))
        .route("/v1/passports/:id", get(get_passport))
        .route("/v1/passports/:id/attributes", get(get_attributes))
        .route("/v1/passports/:id/owner", get(get_owner))
        .route("/v1/identities/:hash", get(get_identity))
}

/// Passport routes requiring a caller identity.
pub fn authenticated_router() -> Router<AppState> {
    Router::new()
        .route("/v1/passports", post(issue_passport))
        .route("/v1/passports/:id/revoke", post(revoke_passport))
        .route("/v1/passports/:id/transfer", post(transfer_passport))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn credential_id(path: Result<Path<u64>, PathRejection>) -> Result<CredentialId, AppError> {
    extract_path(path).map(CredentialId::new)
}

async fn total_supply(State(state): State<AppState>) -> Json<SupplyResponse> {
    Json(SupplyResponse {
        total_supply: state.registry.total_supply(),
    })
}

async fn get_passport(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<PassportView>, AppError> {
    let id = credential_id(path)?;
    Ok(Json(state.registry.credential(id)?.into()))
}

async fn get_attributes(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<AttributesResponse>, AppError> {
    let id = credential_id(path)?;
    let attributes = state.registry.get_attributes(id)?;
    Ok(Json(AttributesResponse { id, attributes }))
}

async fn get_owner(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<OwnerResponse>, AppError> {
    let id = credential_id(path)?;
    let owner = state.registry.owner_of(id)?;
    let revoked = state.registry.is_revoked(id)?;
    Ok(Json(OwnerResponse { id, owner, revoked }))
}

async fn get_identity(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<IdentityResponse>, AppError> {
    let identity_hash: IdentityHash = extract_path(path)?.parse()?;
    let credential_id = state.registry.credential_of(&identity_hash).ok_or_else(|| {
        AppError::NotFound(format!("no passport bound to identity {identity_hash}"))
    })?;
    Ok(Json(IdentityResponse {
        identity_hash,
        credential_id,
    }))
}

/// POST /v1/passports: issue a passport.
///
/// The proof is checked by the registry's active verifier. Returns `201`
/// with the new id.
async fn issue_passport(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    body: Result<Json<IssuePassportRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IssuePassportResponse>), AppError> {
    // Refuse non-issuers before looking at the body.
    state.registry.authorize(&caller, Role::Issuer)?;
    let req = extract_json(body)?;
    let proof = hex_decode(&req.proof)?;
    let id = state
        .registry
        .issue(
            &caller,
            IssueRequest {
                owner: req.owner,
                attributes: req.attributes,
                proof,
                public_signals: req.public_signals,
                metadata_pointer: req.metadata_pointer,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(IssuePassportResponse { id })))
}

async fn revoke_passport(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    path: Result<Path<u64>, PathRejection>,
    body: Result<Json<RevokePassportRequest>, JsonRejection>,
) -> Result<Json<PassportView>, AppError> {
    let id = credential_id(path)?;
    let req = extract_json(body)?;
    state.registry.revoke(&caller, id, &req.reason)?;
    Ok(Json(state.registry.credential(id)?.into()))
}

/// POST /v1/passports/:id/transfer: rejected unconditionally.
///
/// Neither the id nor the body is validated first; every call is `SOULBOUND`.
async fn transfer_passport(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(raw_id): Path<String>,
    body: Option<Json<TransferPassportRequest>>,
) -> Result<StatusCode, AppError> {
    let Json(req) = body.unwrap_or_default();
    let id = CredentialId::new(raw_id.parse().unwrap_or(0));
    let from = req.from.unwrap_or_else(|| caller.clone());
    let to = req.to.unwrap_or_else(|| caller.clone());
    state.registry.transfer(&caller, &from, &to, id)?;
    Ok(StatusCode::NO_CONTENT)
}
