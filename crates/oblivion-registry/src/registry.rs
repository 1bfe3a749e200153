//! # Credential Registry
//!
//! Composes [`AccessControl`], [`IdentityHashIndex`], the active
//! [`VerificationGate`], and the [`AuditLog`] into the issuance and
//! revocation operations.
//!
//! ## Locking
//!
//! All mutable state sits behind one `parking_lot::RwLock`. Reads take the
//! shared lock and see a consistent snapshot. Every mutation runs entirely
//! under the exclusive lock as one commit:
//!
//! 1. validate against current state,
//! 2. build the audit record,
//! 3. write it to the sink (the only fallible step after validation),
//! 4. apply the change and append the record.
//!
//! A failure at 1–3 leaves the registry untouched.
//!
//! ## Issuance
//!
//! Verification can be slow and is not run under the lock. `issue` checks
//! role and uniqueness under the read lock, runs the gate on the blocking
//! pool with a timeout, then re-checks everything under the write lock
//! before committing. Two concurrent issues for one identity hash can both
//! pass verification; only the first to reach the write lock succeeds.
//! If the verifier was replaced while a proof was being checked, the
//! result is discarded.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::broadcast;

use oblivion_core::{
    Attributes, CredentialId, Identity, IdentityHash, MetadataPointer, Role, ValidationError,
};
use oblivion_zkp::{resolve, VerificationGate, VerifierRef, VerifyError};

use crate::access::AccessControl;
use crate::audit::{
    verify_chain_records, AuditChainError, AuditEvent, AuditLog, AuditRecord, AuditSink,
};
use crate::config::RegistryConfig;
use crate::credential::{Credential, Revocation};
use crate::error::RegistryError;
use crate::index::IdentityHashIndex;

/// Maximum length of a revocation reason, in characters.
pub const MAX_REASON_LEN: usize = 1024;

/// Inputs to [`CredentialRegistry::issue`].
#[derive(Debug, Clone)]
pub struct IssueRequest {
    /// The holder of the new credential.
    pub owner: Identity,
    /// Declared attributes, including the identity commitment.
    pub attributes: Attributes,
    /// Opaque proof bytes for the verification gate.
    pub proof: Vec<u8>,
    /// Public signals the proof commits to.
    pub public_signals: Vec<u64>,
    /// Off-registry metadata reference.
    pub metadata_pointer: MetadataPointer,
}

struct ActiveVerifier {
    reference: VerifierRef,
    gate: Arc<dyn VerificationGate>,
    /// Bumped on every replacement so in-flight issuances can detect it.
    epoch: u64,
}

struct RegistryState {
    credentials: Vec<Credential>,
    index: IdentityHashIndex,
    access: AccessControl,
    verifier: ActiveVerifier,
    audit: AuditLog,
}

impl RegistryState {
    fn credential(&self, id: CredentialId) -> Result<&Credential, RegistryError> {
        id.value()
            .checked_sub(1)
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| self.credentials.get(i))
            .ok_or(RegistryError::NotFound(id))
    }

    fn next_id(&self) -> CredentialId {
        CredentialId::new(self.credentials.len() as u64 + 1)
    }

    /// Fail with `AlreadyMinted` if `hash` is bound, unless re-enrollment is
    /// allowed and the bound credential is revoked.
    fn ensure_unbound(&self, hash: &IdentityHash, reenroll: bool) -> Result<(), RegistryError> {
        let Some(existing) = self.index.lookup(hash) else {
            return Ok(());
        };
        if reenroll && self.credential(existing).is_ok_and(Credential::is_revoked) {
            return Ok(());
        }
        Err(RegistryError::AlreadyMinted {
            identity_hash: *hash,
        })
    }

    /// Persist and apply one validated change. Returns the audit sequence.
    fn commit(&mut self, event: AuditEvent) -> Result<u64, RegistryError> {
        let record = self
            .audit
            .prepare(event)
            .map_err(|e| RegistryError::Storage(format!("audit encoding failed: {e}")))?;
        if let Err(e) = self.audit.persist(&record) {
            tracing::error!(
                sequence = record.sequence,
                event = record.event.kind(),
                error = %e,
                "audit sink write failed; change not applied"
            );
            return Err(RegistryError::Storage(e.to_string()));
        }
        self.apply(&record.event, record.timestamp);
        let sequence = record.sequence;
        self.audit.push(record);
        Ok(sequence)
    }

    /// Apply a recorded change. Preconditions are checked by the caller.
    ///
    /// `VerifierUpdated` swaps the reference only; the caller installs the gate.
    fn apply(&mut self, event: &AuditEvent, at: DateTime<Utc>) {
        match event {
            AuditEvent::CredentialIssued {
                owner,
                id,
                attributes,
                metadata_pointer,
            } => {
                self.credentials.push(Credential::new(
                    *id,
                    owner.clone(),
                    *attributes,
                    metadata_pointer.clone(),
                    at,
                ));
                if self.index.reserve(attributes.identity_hash, *id).is_err() {
                    // Re-enrollment over a revoked credential.
                    self.index.rebind(attributes.identity_hash, *id);
                }
            }
            AuditEvent::CredentialRevoked { by, id, reason } => {
                let slot = id
                    .value()
                    .checked_sub(1)
                    .and_then(|i| usize::try_from(i).ok());
                if let Some(credential) = slot.and_then(|i| self.credentials.get_mut(i)) {
                    credential.mark_revoked(Revocation {
                        by: by.clone(),
                        reason: reason.clone(),
                        at,
                    });
                }
            }
            AuditEvent::VerifierUpdated { current, .. } => {
                self.verifier.reference = current.clone();
                self.verifier.epoch += 1;
            }
            AuditEvent::RoleGranted { account, role, .. } => {
                self.access.insert(account.clone(), *role);
            }
            AuditEvent::RoleRevoked { account, role, .. } => {
                self.access.remove(account, *role);
            }
        }
    }

    /// Check that a record read back from storage is a legal next step.
    fn check_replayed(&self, event: &AuditEvent, reenroll: bool) -> Result<(), String> {
        match event {
            AuditEvent::CredentialIssued { id, attributes, .. } => {
                if *id != self.next_id() {
                    return Err(format!("expected credential {}, found {id}", self.next_id()));
                }
                self.ensure_unbound(&attributes.identity_hash, reenroll)
                    .map_err(|e| e.to_string())
            }
            AuditEvent::CredentialRevoked { id, .. } => self
                .credential(*id)
                .and_then(Credential::ensure_revocable)
                .map_err(|e| e.to_string()),
            AuditEvent::RoleRevoked { account, role, .. } => {
                if *role == Role::Admin
                    && self.access.has_role(account, Role::Admin)
                    && self.access.admin_count() <= 1
                {
                    return Err(format!("removes the last admin ({account})"));
                }
                Ok(())
            }
            AuditEvent::VerifierUpdated { .. } | AuditEvent::RoleGranted { .. } => Ok(()),
        }
    }
}

/// Configures and constructs a [`CredentialRegistry`].
pub struct RegistryBuilder {
    admin: Identity,
    verifier: VerifierRef,
    gate: Arc<dyn VerificationGate>,
    config: RegistryConfig,
    sink: Option<Box<dyn AuditSink>>,
    history: Vec<AuditRecord>,
}

impl RegistryBuilder {
    /// Set registry tunables.
    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    /// Persist every audit record to `sink`.
    pub fn sink(mut self, sink: Box<dyn AuditSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Rebuild state from previously persisted records instead of seeding.
    ///
    /// The records must form an intact chain from sequence 1. The seed admin
    /// comes from the first record. The final verifier reference in the
    /// history wins over the one passed to the builder; the builder's gate
    /// is reused when the references match and the backend is resolved
    /// otherwise.
    pub fn history(mut self, records: Vec<AuditRecord>) -> Self {
        self.history = records;
        self
    }

    /// Build the registry.
    ///
    /// Without history, the seed admin grant and the initial verifier are
    /// written as the first two audit records.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Storage`] if the sink rejects the genesis records or
    /// the history does not replay; [`RegistryError::UnknownVerifier`] if
    /// the history ends on a verifier that cannot be resolved.
    pub fn build(self) -> Result<CredentialRegistry, RegistryError> {
        if self.history.is_empty() {
            self.seed()
        } else {
            self.replay()
        }
    }

    fn empty_state(&self, admin: Identity, sink: Option<Box<dyn AuditSink>>) -> RegistryState {
        RegistryState {
            credentials: Vec::new(),
            index: IdentityHashIndex::new(),
            access: AccessControl::new(admin),
            verifier: ActiveVerifier {
                reference: self.verifier.clone(),
                gate: Arc::clone(&self.gate),
                epoch: 0,
            },
            audit: AuditLog::new(self.config.audit_capacity, sink),
        }
    }

    fn seed(mut self) -> Result<CredentialRegistry, RegistryError> {
        let sink = self.sink.take();
        let mut state = self.empty_state(self.admin.clone(), sink);
        state.commit(AuditEvent::RoleGranted {
            by: self.admin.clone(),
            account: self.admin.clone(),
            role: Role::Admin,
        })?;
        state.commit(AuditEvent::VerifierUpdated {
            by: self.admin.clone(),
            previous: None,
            current: self.verifier.clone(),
        })?;
        tracing::info!(admin = %self.admin, verifier = %self.verifier, "registry initialized");
        Ok(CredentialRegistry {
            state: RwLock::new(state),
            config: self.config,
        })
    }

    fn replay(mut self) -> Result<CredentialRegistry, RegistryError> {
        let history = std::mem::take(&mut self.history);
        verify_chain_records(&history)
            .map_err(|e| RegistryError::Storage(format!("audit history is corrupt: {e}")))?;
        let seed_admin = match history.first() {
            Some(AuditRecord {
                sequence: 1,
                event:
                    AuditEvent::RoleGranted {
                        account,
                        role: Role::Admin,
                        ..
                    },
                ..
            }) => account.clone(),
            _ => {
                return Err(RegistryError::Storage(
                    "audit history must start with the seed admin grant".into(),
                ))
            }
        };

        let sink = self.sink.take();
        let mut state = self.empty_state(seed_admin, sink);
        for record in history {
            state
                .check_replayed(&record.event, self.config.allow_reenrollment)
                .map_err(|reason| {
                    RegistryError::Storage(format!(
                        "audit replay failed at record {}: {reason}",
                        record.sequence
                    ))
                })?;
            state.apply(&record.event, record.timestamp);
            state.audit.restore(record);
        }

        if state.verifier.reference != self.verifier {
            tracing::warn!(
                configured = %self.verifier,
                recorded = %state.verifier.reference,
                "configured verifier differs from audit history; using recorded verifier"
            );
            state.verifier.gate = resolve(&state.verifier.reference)
                .map_err(|e| RegistryError::UnknownVerifier(e.to_string()))?;
        }

        tracing::info!(
            credentials = state.credentials.len(),
            audit_head = state.audit.head_sequence(),
            verifier = %state.verifier.reference,
            "registry restored from audit history"
        );
        Ok(CredentialRegistry {
            state: RwLock::new(state),
            config: self.config,
        })
    }
}

/// The passport registry.
pub struct CredentialRegistry {
    state: RwLock<RegistryState>,
    config: RegistryConfig,
}

impl std::fmt::Debug for CredentialRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("CredentialRegistry")
            .field("credentials", &state.credentials.len())
            .field("verifier", &state.verifier.reference)
            .field("audit", &state.audit)
            .field("config", &self.config)
            .finish()
    }
}

impl CredentialRegistry {
    /// Start building a registry seeded with `admin` and the given verifier.
    pub fn builder(
        admin: Identity,
        verifier: VerifierRef,
        gate: Arc<dyn VerificationGate>,
    ) -> RegistryBuilder {
        RegistryBuilder {
            admin,
            verifier,
            gate,
            config: RegistryConfig::default(),
            sink: None,
            history: Vec::new(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // -- Issuance and revocation ---------------------------------------------

    /// Issue a credential to `request.owner`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Unauthorized`] unless `caller` is an Issuer.
    /// - [`RegistryError::AlreadyMinted`] if the identity hash is bound.
    /// - [`RegistryError::InvalidProof`] if the gate rejects the proof.
    /// - [`RegistryError::VerificationUnavailable`] on gate failure, timeout,
    ///   or a verifier change during verification.
    /// - [`RegistryError::Storage`] if the audit sink fails.
    pub async fn issue(
        &self,
        caller: &Identity,
        request: IssueRequest,
    ) -> Result<CredentialId, RegistryError> {
        let IssueRequest {
            owner,
            attributes,
            proof,
            public_signals,
            metadata_pointer,
        } = request;
        let identity_hash = attributes.identity_hash;

        let (gate, epoch) = {
            let state = self.state.read();
            state.access.authorize(caller, Role::Issuer)?;
            state.ensure_unbound(&identity_hash, self.config.allow_reenrollment)?;
            (Arc::clone(&state.verifier.gate), state.verifier.epoch)
        };

        if let Err(e) = self.run_gate(gate, proof, public_signals, attributes).await {
            tracing::warn!(
                caller = %caller,
                identity_hash = %identity_hash,
                error = %e,
                "issuance rejected by verification"
            );
            return Err(e);
        }

        let mut state = self.state.write();
        state.access.authorize(caller, Role::Issuer)?;
        state.ensure_unbound(&identity_hash, self.config.allow_reenrollment)?;
        if state.verifier.epoch != epoch {
            return Err(RegistryError::VerificationUnavailable(
                "verifier changed during issuance".into(),
            ));
        }
        let id = state.next_id();
        let sequence = state.commit(AuditEvent::CredentialIssued {
            owner: owner.clone(),
            id,
            attributes,
            metadata_pointer,
        })?;
        tracing::info!(
            id = %id,
            owner = %owner,
            issuer = %caller,
            identity_hash = %identity_hash,
            sequence,
            "passport issued"
        );
        Ok(id)
    }

    async fn run_gate(
        &self,
        gate: Arc<dyn VerificationGate>,
        proof: Vec<u8>,
        public_signals: Vec<u64>,
        attributes: Attributes,
    ) -> Result<(), RegistryError> {
        let timeout = self.config.verify_timeout();
        let task = tokio::task::spawn_blocking(move || {
            gate.verify(&proof, &public_signals, &attributes)
        });
        match tokio::time::timeout(timeout, task).await {
            Err(_) => Err(RegistryError::VerificationUnavailable(format!(
                "verifier did not answer within {} ms",
                timeout.as_millis()
            ))),
            Ok(Err(join)) => Err(RegistryError::VerificationUnavailable(format!(
                "verifier task failed: {join}"
            ))),
            Ok(Ok(Ok(true))) => Ok(()),
            Ok(Ok(Ok(false))) => Err(RegistryError::InvalidProof(
                "proof rejected by verifier".into(),
            )),
            Ok(Ok(Err(VerifyError::MalformedProof(msg)))) => Err(RegistryError::InvalidProof(msg)),
            Ok(Ok(Err(e))) => Err(RegistryError::VerificationUnavailable(e.to_string())),
        }
    }

    /// Revoke an active credential.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Unauthorized`] unless `caller` is a Revoker,
    /// [`RegistryError::NotFound`], [`RegistryError::AlreadyRevoked`],
    /// [`RegistryError::Validation`] for an over-long reason, and
    /// [`RegistryError::Storage`].
    pub fn revoke(
        &self,
        caller: &Identity,
        id: CredentialId,
        reason: &str,
    ) -> Result<(), RegistryError> {
        let mut state = self.state.write();
        state.access.authorize(caller, Role::Revoker)?;
        if reason.chars().count() > MAX_REASON_LEN {
            return Err(ValidationError::InvalidReason(format!(
                "reason exceeds {MAX_REASON_LEN} characters"
            ))
            .into());
        }
        state.credential(id)?.ensure_revocable()?;
        let sequence = state.commit(AuditEvent::CredentialRevoked {
            by: caller.clone(),
            id,
            reason: reason.to_string(),
        })?;
        tracing::info!(id = %id, revoker = %caller, reason, sequence, "passport revoked");
        Ok(())
    }

    /// Always fails. Credentials are bound to their owner permanently.
    pub fn transfer(
        &self,
        caller: &Identity,
        from: &Identity,
        to: &Identity,
        id: CredentialId,
    ) -> Result<(), RegistryError> {
        tracing::warn!(
            caller = %caller,
            from = %from,
            to = %to,
            id = %id,
            "transfer attempted on soulbound passport"
        );
        Err(RegistryError::Soulbound)
    }

    // -- Roles ---------------------------------------------------------------

    /// Grant `role` to `account`. A no-op if already held.
    pub fn grant_role(
        &self,
        caller: &Identity,
        account: &Identity,
        role: Role,
    ) -> Result<(), RegistryError> {
        let mut state = self.state.write();
        if !state.access.check_grant(caller, account, role)? {
            return Ok(());
        }
        let sequence = state.commit(AuditEvent::RoleGranted {
            by: caller.clone(),
            account: account.clone(),
            role,
        })?;
        tracing::info!(admin = %caller, account = %account, role = %role, sequence, "role granted");
        Ok(())
    }

    /// Remove `role` from `account`. A no-op if not held.
    ///
    /// # Errors
    ///
    /// [`RegistryError::LastAdminProtected`] when removing the only Admin.
    pub fn revoke_role(
        &self,
        caller: &Identity,
        account: &Identity,
        role: Role,
    ) -> Result<(), RegistryError> {
        let mut state = self.state.write();
        if !state.access.check_revoke(caller, account, role)? {
            return Ok(());
        }
        let sequence = state.commit(AuditEvent::RoleRevoked {
            by: caller.clone(),
            account: account.clone(),
            role,
        })?;
        tracing::info!(admin = %caller, account = %account, role = %role, sequence, "role revoked");
        Ok(())
    }

    /// Drop one of the caller's own roles.
    pub fn renounce_role(&self, caller: &Identity, role: Role) -> Result<(), RegistryError> {
        let mut state = self.state.write();
        if !state.access.check_renounce(caller, role)? {
            return Ok(());
        }
        let sequence = state.commit(AuditEvent::RoleRevoked {
            by: caller.clone(),
            account: caller.clone(),
            role,
        })?;
        tracing::info!(account = %caller, role = %role, sequence, "role renounced");
        Ok(())
    }

    // -- Verifier ------------------------------------------------------------

    /// Replace the verification backend. Admin only.
    pub fn set_verifier(
        &self,
        caller: &Identity,
        reference: VerifierRef,
        gate: Arc<dyn VerificationGate>,
    ) -> Result<(), RegistryError> {
        let mut state = self.state.write();
        state.access.authorize(caller, Role::Admin)?;
        let previous = state.verifier.reference.clone();
        let sequence = state.commit(AuditEvent::VerifierUpdated {
            by: caller.clone(),
            previous: Some(previous.clone()),
            current: reference.clone(),
        })?;
        state.verifier.gate = gate;
        tracing::info!(
            admin = %caller,
            previous = %previous,
            current = %reference,
            sequence,
            "verifier updated"
        );
        Ok(())
    }

    /// Replace the verification backend with a built-in one by reference.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Unauthorized`] is checked before the reference, so
    /// non-admins learn nothing about which backends exist.
    pub fn set_verifier_ref(
        &self,
        caller: &Identity,
        reference: VerifierRef,
    ) -> Result<(), RegistryError> {
        self.state.read().access.authorize(caller, Role::Admin)?;
        let gate = resolve(&reference).map_err(|e| match e {
            VerifyError::UnknownVerifier(r) => RegistryError::UnknownVerifier(r),
            other => RegistryError::UnknownVerifier(other.to_string()),
        })?;
        self.set_verifier(caller, reference, gate)
    }

    /// The active verifier reference.
    pub fn verifier(&self) -> VerifierRef {
        self.state.read().verifier.reference.clone()
    }

    // -- Reads ---------------------------------------------------------------

    /// A snapshot of the full credential record.
    pub fn credential(&self, id: CredentialId) -> Result<Credential, RegistryError> {
        self.state.read().credential(id).cloned()
    }

    /// Attributes of an active credential. Fails `Revoked` once revoked.
    pub fn get_attributes(&self, id: CredentialId) -> Result<Attributes, RegistryError> {
        self.state
            .read()
            .credential(id)
            .and_then(|c| c.valid_attributes().copied())
    }

    /// The holder, regardless of revocation.
    pub fn owner_of(&self, id: CredentialId) -> Result<Identity, RegistryError> {
        self.state.read().credential(id).map(|c| c.owner().clone())
    }

    /// Whether the credential is revoked.
    pub fn is_revoked(&self, id: CredentialId) -> Result<bool, RegistryError> {
        self.state.read().credential(id).map(Credential::is_revoked)
    }

    /// The credential's metadata reference.
    pub fn metadata_pointer(&self, id: CredentialId) -> Result<MetadataPointer, RegistryError> {
        self.state
            .read()
            .credential(id)
            .map(|c| c.metadata_pointer().clone())
    }

    /// Number of credentials ever issued.
    pub fn total_supply(&self) -> u64 {
        self.state.read().credentials.len() as u64
    }

    /// Number of credentials owned by `owner`, revoked ones included.
    pub fn balance_of(&self, owner: &Identity) -> u64 {
        self.state
            .read()
            .credentials
            .iter()
            .filter(|c| c.owner() == owner)
            .count() as u64
    }

    /// The credential bound to an identity hash.
    pub fn credential_of(&self, identity_hash: &IdentityHash) -> Option<CredentialId> {
        self.state.read().index.lookup(identity_hash)
    }

    /// Whether `account` holds `role`.
    pub fn has_role(&self, account: &Identity, role: Role) -> bool {
        self.state.read().access.has_role(account, role)
    }

    /// Fail `Unauthorized` unless `account` holds `role`.
    ///
    /// Lets outer layers refuse a caller before parsing its input. The
    /// mutating operations repeat the check under their own lock.
    pub fn authorize(&self, account: &Identity, role: Role) -> Result<(), RegistryError> {
        self.state.read().access.authorize(account, role)
    }

    /// Identities holding `role`.
    pub fn role_members(&self, role: Role) -> Vec<Identity> {
        self.state.read().access.members(role)
    }

    /// Roles held by `account`.
    pub fn roles_of(&self, account: &Identity) -> Vec<Role> {
        self.state.read().access.roles_of(account)
    }

    // -- Audit ---------------------------------------------------------------

    /// Retained audit records after sequence `after`, at most `limit`.
    pub fn audit_since(&self, after: u64, limit: usize) -> Vec<AuditRecord> {
        self.state.read().audit.since(after, limit)
    }

    /// Every retained audit record.
    pub fn audit_entries(&self) -> Vec<AuditRecord> {
        self.state.read().audit.entries().to_vec()
    }

    /// Sequence of the newest audit record.
    pub fn audit_head(&self) -> u64 {
        self.state.read().audit.head_sequence()
    }

    /// Verify the retained audit chain.
    pub fn verify_audit_chain(&self) -> Result<(), AuditChainError> {
        self.state.read().audit.verify_chain()
    }

    /// Live feed of audit records committed from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<AuditRecord> {
        self.state.read().audit.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oblivion_zkp::{SignalBindingVerifier, StaticVerifier};

    fn id(s: &str) -> Identity {
        Identity::new(s).unwrap()
    }

    fn registry() -> CredentialRegistry {
        CredentialRegistry::builder(
            id("root"),
            "mock:allow".parse().unwrap(),
            Arc::new(StaticVerifier::new(true)),
        )
        .build()
        .unwrap()
    }

    fn request(owner: &str) -> IssueRequest {
        IssueRequest {
            owner: id(owner),
            attributes: Attributes::all_set(IdentityHash::commit(owner.as_bytes())),
            proof: vec![1, 2, 3],
            public_signals: vec![1; 5],
            metadata_pointer: MetadataPointer::default(),
        }
    }

    #[test]
    fn genesis_records_admin_and_verifier() {
        let reg = registry();
        let entries = reg.audit_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event.kind(), "role_granted");
        assert!(matches!(
            &entries[1].event,
            AuditEvent::VerifierUpdated { previous: None, .. }
        ));
        assert!(reg.has_role(&id("root"), Role::Admin));
        assert_eq!(reg.verifier().as_str(), "mock:allow");
    }

    #[tokio::test]
    async fn issue_requires_issuer() {
        let reg = registry();
        let err = reg.issue(&id("root"), request("alice")).await.unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized { role: Role::Issuer, .. }));
        assert_eq!(reg.total_supply(), 0);
        assert_eq!(reg.audit_head(), 2);
    }

    #[tokio::test]
    async fn ids_are_sequential() {
        let reg = registry();
        reg.grant_role(&id("root"), &id("issuer"), Role::Issuer).unwrap();
        let a = reg.issue(&id("issuer"), request("alice")).await.unwrap();
        let b = reg.issue(&id("issuer"), request("bob")).await.unwrap();
        assert_eq!(a, CredentialId::new(1));
        assert_eq!(b, CredentialId::new(2));
        assert_eq!(reg.total_supply(), 2);
        assert_eq!(reg.balance_of(&id("alice")), 1);
    }

    #[tokio::test]
    async fn malformed_proof_is_invalid() {
        let reg = registry();
        reg.grant_role(&id("root"), &id("issuer"), Role::Issuer).unwrap();
        reg.set_verifier(
            &id("root"),
            "signal-binding".parse().unwrap(),
            Arc::new(SignalBindingVerifier),
        )
        .unwrap();
        let err = reg.issue(&id("issuer"), request("alice")).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidProof(_)));

        let mut ok = request("alice");
        ok.public_signals = ok.attributes.public_signals();
        ok.proof = SignalBindingVerifier::prove(&ok.attributes);
        assert!(reg.issue(&id("issuer"), ok).await.is_ok());
    }

    #[tokio::test]
    async fn over_long_reason_is_rejected() {
        let reg = registry();
        reg.grant_role(&id("root"), &id("issuer"), Role::Issuer).unwrap();
        reg.grant_role(&id("root"), &id("revoker"), Role::Revoker).unwrap();
        let issued = reg.issue(&id("issuer"), request("alice")).await.unwrap();
        let head = reg.audit_head();

        let reason = "x".repeat(MAX_REASON_LEN + 1);
        let err = reg.revoke(&id("revoker"), issued, &reason).unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)));
        assert!(!reg.is_revoked(issued).unwrap());
        assert_eq!(reg.audit_head(), head);

        reg.revoke(&id("revoker"), issued, &"x".repeat(MAX_REASON_LEN))
            .unwrap();
        assert!(reg.is_revoked(issued).unwrap());
    }

    #[test]
    fn role_is_checked_before_reason_length() {
        let reg = registry();
        let reason = "x".repeat(MAX_REASON_LEN + 1);
        let err = reg.revoke(&id("eve"), CredentialId::FIRST, &reason).unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized { .. }));
    }

    #[test]
    fn set_verifier_ref_checks_role_before_reference() {
        let reg = registry();
        let unknown: VerifierRef = "groth16:remote".parse().unwrap();
        assert!(matches!(
            reg.set_verifier_ref(&id("eve"), unknown.clone()),
            Err(RegistryError::Unauthorized { .. })
        ));
        assert!(matches!(
            reg.set_verifier_ref(&id("root"), unknown),
            Err(RegistryError::UnknownVerifier(_))
        ));
        reg.set_verifier_ref(&id("root"), "mock:deny".parse().unwrap())
            .unwrap();
        assert_eq!(reg.verifier().as_str(), "mock:deny");
    }

    #[test]
    fn authorize_reports_missing_role() {
        let reg = registry();
        assert!(reg.authorize(&id("root"), Role::Admin).is_ok());
        assert!(matches!(
            reg.authorize(&id("root"), Role::Issuer),
            Err(RegistryError::Unauthorized { role: Role::Issuer, .. })
        ));
    }

    #[test]
    fn role_noops_are_not_audited() {
        let reg = registry();
        let head = reg.audit_head();
        reg.grant_role(&id("root"), &id("root"), Role::Admin).unwrap();
        reg.revoke_role(&id("root"), &id("nobody"), Role::Issuer).unwrap();
        reg.renounce_role(&id("nobody"), Role::Revoker).unwrap();
        assert_eq!(reg.audit_head(), head);
    }
}
