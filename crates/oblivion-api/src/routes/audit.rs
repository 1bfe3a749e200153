//! # Audit Endpoint
//!
//! `GET /v1/audit?since=N&limit=M` returns retained records with
//! `sequence > N`, oldest first. Clients tail the log by passing the last
//! sequence they saw.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use oblivion_registry::AuditRecord;

use crate::error::AppError;
use crate::extractors::extract_query;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 1000;

/// Query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    /// Return records after this sequence.
    #[serde(default)]
    pub since: u64,
    /// Page size, capped at 1000.
    pub limit: Option<usize>,
}

/// One page of audit records.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuditPage {
    /// Sequence of the newest record in the log.
    pub head: u64,
    /// The records.
    pub records: Vec<AuditRecord>,
}

/// Audit routes (public).
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/audit", get(list_audit))
}

async fn list_audit(
    State(state): State<AppState>,
    query: Result<Query<AuditQuery>, QueryRejection>,
) -> Result<Json<AuditPage>, AppError> {
    let q = extract_query(query)?;
    let limit = q.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    Ok(Json(AuditPage {
        head: state.registry.audit_head(),
        records: state.registry.audit_since(q.since, limit),
    }))
}
