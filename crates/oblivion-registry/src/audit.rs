//! # Audit Log
//!
//! Append-only, hash-chained record of every issuance, revocation, role
//! change, and verifier change. Records are written inside the registry's
//! write lock, in the same step as the state change they describe, so a
//! consumer that has seen record N has a consistent view of state as of N.
//!
//! ## Chain
//!
//! `hash = SHA-256(previous_hash || JSON{sequence, timestamp, event})` with
//! hashes as lowercase hex. The first record links to 64 zeros.
//!
//! ## Consumers
//!
//! - [`AuditLog::since`] for cursor-based tailing.
//! - [`AuditLog::subscribe`] for live tailing over a broadcast channel.
//! - [`AuditSink`] for durable persistence. The sink is written before the
//!   in-memory state changes; a sink failure aborts the operation and
//!   [`JsonLinesSink`] truncates whatever part of the line it wrote.
//!
//! The log is never consulted for control flow.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use oblivion_core::{
    sha256_raw, to_hex, Attributes, CredentialId, Identity, MetadataPointer, Role,
};
use oblivion_zkp::VerifierRef;

/// Previous hash of the first record.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Live-tail channel depth. Slow subscribers observe `Lagged`.
const BROADCAST_CAPACITY: usize = 1024;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A state change recorded in the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A credential was issued.
    CredentialIssued {
        /// The holder.
        owner: Identity,
        /// The new credential id.
        id: CredentialId,
        /// Declared attributes.
        attributes: Attributes,
        /// Off-registry metadata reference.
        metadata_pointer: MetadataPointer,
    },
    /// A credential was revoked.
    CredentialRevoked {
        /// The revoker.
        by: Identity,
        /// The revoked credential.
        id: CredentialId,
        /// Reason supplied by the revoker.
        reason: String,
    },
    /// The verification backend changed.
    VerifierUpdated {
        /// The admin that made the change.
        by: Identity,
        /// The previous backend, absent for the initial configuration.
        previous: Option<VerifierRef>,
        /// The new backend.
        current: VerifierRef,
    },
    /// A role was granted.
    RoleGranted {
        /// The admin that granted it.
        by: Identity,
        /// The recipient.
        account: Identity,
        /// The role.
        role: Role,
    },
    /// A role was revoked or renounced.
    RoleRevoked {
        /// The admin that revoked it, or the account itself when renounced.
        by: Identity,
        /// The account that lost the role.
        account: Identity,
        /// The role.
        role: Role,
    },
}

impl AuditEvent {
    /// Return the event type as a string.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CredentialIssued { .. } => "credential_issued",
            Self::CredentialRevoked { .. } => "credential_revoked",
            Self::VerifierUpdated { .. } => "verifier_updated",
            Self::RoleGranted { .. } => "role_granted",
            Self::RoleRevoked { .. } => "role_revoked",
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A sequenced, hash-linked audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// 1-based position in the log.
    pub sequence: u64,
    /// When the change was committed.
    pub timestamp: DateTime<Utc>,
    /// The change.
    pub event: AuditEvent,
    /// Hash of the preceding record.
    pub previous_hash: String,
    /// Hash of this record.
    pub hash: String,
}

#[derive(Serialize)]
struct HashedBody<'a> {
    sequence: u64,
    timestamp: &'a DateTime<Utc>,
    event: &'a AuditEvent,
}

impl AuditRecord {
    /// Compute the chain hash for a record body.
    ///
    /// # Errors
    ///
    /// Returns the serialization error if the body cannot be encoded.
    pub fn compute_hash(
        previous_hash: &str,
        sequence: u64,
        timestamp: &DateTime<Utc>,
        event: &AuditEvent,
    ) -> Result<String, serde_json::Error> {
        let body = serde_json::to_vec(&HashedBody {
            sequence,
            timestamp,
            event,
        })?;
        let mut input = Vec::with_capacity(previous_hash.len() + body.len());
        input.extend_from_slice(previous_hash.as_bytes());
        input.extend_from_slice(&body);
        Ok(to_hex(&sha256_raw(&input)))
    }
}

/// A break in an audit chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditChainError {
    /// Sequence numbers are not contiguous.
    #[error("sequence gap: expected {expected}, found {found}")]
    SequenceGap {
        /// The sequence that should have followed.
        expected: u64,
        /// The sequence actually present.
        found: u64,
    },
    /// A record does not link to its predecessor.
    #[error("record {sequence} does not link to its predecessor")]
    BrokenLink {
        /// The offending record.
        sequence: u64,
    },
    /// A record's hash does not match its content.
    #[error("record {sequence} hash mismatch")]
    HashMismatch {
        /// The offending record.
        sequence: u64,
    },
}

/// Verify that `records` form an intact chain.
///
/// A slice starting at sequence 1 must link to [`GENESIS_HASH`]; a slice
/// starting later (a trimmed log) is anchored on its first record.
pub fn verify_chain_records(records: &[AuditRecord]) -> Result<(), AuditChainError> {
    let mut expected_prev: Option<&str> = None;
    let mut expected_seq: Option<u64> = None;

    for record in records {
        if let Some(seq) = expected_seq {
            if record.sequence != seq {
                return Err(AuditChainError::SequenceGap {
                    expected: seq,
                    found: record.sequence,
                });
            }
        }
        let link_ok = match expected_prev {
            Some(prev) => record.previous_hash == prev,
            None => record.sequence != 1 || record.previous_hash == GENESIS_HASH,
        };
        if !link_ok {
            return Err(AuditChainError::BrokenLink {
                sequence: record.sequence,
            });
        }
        let recomputed = AuditRecord::compute_hash(
            &record.previous_hash,
            record.sequence,
            &record.timestamp,
            &record.event,
        )
        .map_err(|_| AuditChainError::HashMismatch {
            sequence: record.sequence,
        })?;
        if recomputed != record.hash {
            return Err(AuditChainError::HashMismatch {
                sequence: record.sequence,
            });
        }
        expected_prev = Some(&record.hash);
        expected_seq = Some(record.sequence + 1);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Failure writing or reading durable audit storage.
#[derive(Error, Debug)]
pub enum AuditSinkError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable destination for audit records.
pub trait AuditSink: Send + Sync {
    /// Persist one record. Called inside the registry's write lock.
    fn append(&self, record: &AuditRecord) -> Result<(), AuditSinkError>;
}

/// Byte storage under a [`JsonLinesSink`].
///
/// Appends must be undoable: on any failure the sink cuts the store back
/// to its length before the append, so a rejected record never survives
/// into the persisted chain.
pub trait LineStore: Send {
    /// Current length in bytes.
    fn end_offset(&mut self) -> io::Result<u64>;
    /// Append `bytes` at the end.
    fn append(&mut self, bytes: &[u8]) -> io::Result<()>;
    /// Flush appended bytes to stable storage.
    fn sync(&mut self) -> io::Result<()>;
    /// Discard everything past `len`.
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl LineStore for File {
    fn end_offset(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)?;
        self.sync_data()
    }
}

/// Appends one JSON record per line to a [`LineStore`], a file by default.
#[derive(Debug)]
pub struct JsonLinesSink<S = File> {
    store: Mutex<S>,
}

impl JsonLinesSink<File> {
    /// Open `path` for appending, creating it if absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditSinkError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }
}

impl<S: LineStore> JsonLinesSink<S> {
    /// Wrap an existing store.
    pub fn new(store: S) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }
}

fn append_synced<S: LineStore>(store: &mut S, line: &[u8]) -> io::Result<()> {
    store.append(line)?;
    store.sync()
}

impl<S: LineStore> AuditSink for JsonLinesSink<S> {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditSinkError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        let mut store = self.store.lock();
        let start = store.end_offset()?;
        if let Err(e) = append_synced(&mut *store, &line) {
            if let Err(undo) = store.truncate(start) {
                tracing::error!(
                    sequence = record.sequence,
                    offset = start,
                    error = %undo,
                    "failed to roll back rejected audit line"
                );
            }
            return Err(e.into());
        }
        Ok(())
    }
}

/// Read every record from a JSON-lines audit file. Blank lines are skipped.
pub fn read_json_lines(path: impl AsRef<Path>) -> Result<Vec<AuditRecord>, AuditSinkError> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// AuditLog
// ---------------------------------------------------------------------------

/// The in-memory audit log of one registry.
///
/// Appending is a three-step protocol driven by the registry:
/// [`prepare`](Self::prepare) (pure), [`persist`](Self::persist) (fallible,
/// before any state change), [`push`](Self::push) (infallible, after).
pub struct AuditLog {
    records: Vec<AuditRecord>,
    head_hash: String,
    next_sequence: u64,
    capacity: usize,
    sink: Option<Box<dyn AuditSink>>,
    live: broadcast::Sender<AuditRecord>,
}

impl AuditLog {
    /// Create an empty log. `capacity == 0` retains every record.
    pub fn new(capacity: usize, sink: Option<Box<dyn AuditSink>>) -> Self {
        let (live, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            records: Vec::new(),
            head_hash: GENESIS_HASH.to_string(),
            next_sequence: 1,
            capacity,
            sink,
            live,
        }
    }

    /// Build the next record for `event` without appending it.
    pub(crate) fn prepare(&self, event: AuditEvent) -> Result<AuditRecord, serde_json::Error> {
        let timestamp = Utc::now();
        let hash =
            AuditRecord::compute_hash(&self.head_hash, self.next_sequence, &timestamp, &event)?;
        Ok(AuditRecord {
            sequence: self.next_sequence,
            timestamp,
            event,
            previous_hash: self.head_hash.clone(),
            hash,
        })
    }

    /// Write `record` to the durable sink, if any.
    pub(crate) fn persist(&self, record: &AuditRecord) -> Result<(), AuditSinkError> {
        match &self.sink {
            Some(sink) => sink.append(record),
            None => Ok(()),
        }
    }

    /// Append a prepared (and persisted) record.
    pub(crate) fn push(&mut self, record: AuditRecord) {
        self.head_hash.clone_from(&record.hash);
        self.next_sequence = record.sequence + 1;
        // No subscribers is not an error.
        let _ = self.live.send(record.clone());
        self.records.push(record);
        if self.capacity > 0 && self.records.len() > self.capacity {
            let trim = (self.capacity / 10).max(1);
            self.records.drain(..trim);
        }
    }

    /// Restore a record read back from durable storage (no sink write, no broadcast).
    pub(crate) fn restore(&mut self, record: AuditRecord) {
        self.head_hash.clone_from(&record.hash);
        self.next_sequence = record.sequence + 1;
        self.records.push(record);
        if self.capacity > 0 && self.records.len() > self.capacity {
            let trim = (self.capacity / 10).max(1);
            self.records.drain(..trim);
        }
    }

    /// Retained records, oldest first.
    pub fn entries(&self) -> &[AuditRecord] {
        &self.records
    }

    /// Retained records with `sequence > after`, at most `limit` of them.
    pub fn since(&self, after: u64, limit: usize) -> Vec<AuditRecord> {
        let start = self.records.partition_point(|r| r.sequence <= after);
        self.records[start..].iter().take(limit).cloned().collect()
    }

    /// Sequence of the newest record (0 when empty).
    pub fn head_sequence(&self) -> u64 {
        self.next_sequence - 1
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record is retained.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Verify the retained chain.
    pub fn verify_chain(&self) -> Result<(), AuditChainError> {
        verify_chain_records(&self.records)
    }

    /// Receive every record appended from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<AuditRecord> {
        self.live.subscribe()
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog")
            .field("records", &self.records.len())
            .field("head_sequence", &self.head_sequence())
            .field("capacity", &self.capacity)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oblivion_core::IdentityHash;

    fn id(s: &str) -> Identity {
        Identity::new(s).unwrap()
    }

    fn grant(n: u8) -> AuditEvent {
        AuditEvent::RoleGranted {
            by: id("root"),
            account: id(&format!("acct-{n}")),
            role: Role::Issuer,
        }
    }

    fn append(log: &mut AuditLog, event: AuditEvent) {
        let record = log.prepare(event).unwrap();
        log.persist(&record).unwrap();
        log.push(record);
    }

    #[test]
    fn chain_links_from_genesis() {
        let mut log = AuditLog::new(0, None);
        for n in 0..5 {
            append(&mut log, grant(n));
        }
        assert_eq!(log.len(), 5);
        assert_eq!(log.head_sequence(), 5);
        assert_eq!(log.entries()[0].previous_hash, GENESIS_HASH);
        assert_eq!(log.entries()[1].previous_hash, log.entries()[0].hash);
        assert!(log.verify_chain().is_ok());
    }

    #[test]
    fn tampering_is_detected() {
        let mut log = AuditLog::new(0, None);
        for n in 0..3 {
            append(&mut log, grant(n));
        }
        let mut records = log.entries().to_vec();
        if let AuditEvent::RoleGranted { role, .. } = &mut records[1].event {
            *role = Role::Admin;
        }
        assert_eq!(
            verify_chain_records(&records),
            Err(AuditChainError::HashMismatch { sequence: 2 })
        );

        let mut records = log.entries().to_vec();
        records.remove(1);
        assert_eq!(
            verify_chain_records(&records),
            Err(AuditChainError::SequenceGap {
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn since_is_a_cursor() {
        let mut log = AuditLog::new(0, None);
        for n in 0..6 {
            append(&mut log, grant(n));
        }
        let tail = log.since(4, 100);
        assert_eq!(
            tail.iter().map(|r| r.sequence).collect::<Vec<_>>(),
            vec![5, 6]
        );
        assert_eq!(log.since(0, 2).len(), 2);
        assert!(log.since(6, 10).is_empty());
    }

    #[test]
    fn capacity_trims_oldest_but_keeps_sequence() {
        let mut log = AuditLog::new(10, None);
        for n in 0..11 {
            append(&mut log, grant(n));
        }
        assert_eq!(log.len(), 10);
        assert_eq!(log.entries()[0].sequence, 2);
        assert_eq!(log.head_sequence(), 11);
        assert!(log.verify_chain().is_ok());
    }

    #[test]
    fn subscribers_see_new_records() {
        let mut log = AuditLog::new(0, None);
        let mut rx = log.subscribe();
        append(&mut log, grant(1));
        let got = rx.try_recv().unwrap();
        assert_eq!(got.sequence, 1);
        assert_eq!(got.event.kind(), "role_granted");
    }

    #[test]
    fn json_lines_round_trip_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let sink = JsonLinesSink::open(&path).unwrap();
        let mut log = AuditLog::new(0, Some(Box::new(sink)));
        append(
            &mut log,
            AuditEvent::CredentialIssued {
                owner: id("holder"),
                id: CredentialId::FIRST,
                attributes: Attributes::all_set(IdentityHash::commit(b"holder")),
                metadata_pointer: MetadataPointer::new("ipfs://meta").unwrap(),
            },
        );
        append(&mut log, grant(2));

        let records = read_json_lines(&path).unwrap();
        assert_eq!(records, log.entries());
        assert!(verify_chain_records(&records).is_ok());
    }

    /// In-memory store whose next sync fails after the bytes landed.
    #[derive(Debug, Default)]
    struct UnsyncedStore {
        bytes: Vec<u8>,
        fail_sync: bool,
    }

    impl LineStore for UnsyncedStore {
        fn end_offset(&mut self) -> io::Result<u64> {
            Ok(self.bytes.len() as u64)
        }

        fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
            self.bytes.extend_from_slice(bytes);
            Ok(())
        }

        fn sync(&mut self) -> io::Result<()> {
            if std::mem::take(&mut self.fail_sync) {
                return Err(io::Error::other("fsync failed"));
            }
            Ok(())
        }

        fn truncate(&mut self, len: u64) -> io::Result<()> {
            self.bytes.truncate(len as usize);
            Ok(())
        }
    }

    #[test]
    fn failed_sync_leaves_no_line_behind() {
        let sink = JsonLinesSink::new(UnsyncedStore::default());
        let mut log = AuditLog::new(0, None);
        let first = log.prepare(grant(1)).unwrap();
        sink.append(&first).unwrap();
        let kept = sink.store.lock().bytes.len();

        sink.store.lock().fail_sync = true;
        let second = log.prepare(grant(2)).unwrap();
        assert!(matches!(sink.append(&second), Err(AuditSinkError::Io(_))));
        assert_eq!(sink.store.lock().bytes.len(), kept);

        sink.append(&second).unwrap();
        assert!(sink.store.lock().bytes.len() > kept);
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let json = serde_json::to_value(grant(1)).unwrap();
        assert_eq!(json["type"], "role_granted");
        assert_eq!(json["role"], "issuer");
    }
}
