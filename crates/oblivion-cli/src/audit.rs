//! # Audit Subcommand
//!
//! Offline verification of a JSON-lines audit export.
//!
//! ```bash
//! oblivion audit verify /var/lib/passport/audit.jsonl
//! ```
//!
//! Exit codes: 0 intact, 2 broken chain, 1 unreadable file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use oblivion_registry::{read_json_lines, verify_chain_records, AuditChainError};

/// Arguments for `oblivion audit`.
#[derive(Args, Debug)]
pub struct AuditArgs {
    #[command(subcommand)]
    pub command: AuditCommand,
}

/// Audit operations.
#[derive(Subcommand, Debug)]
pub enum AuditCommand {
    /// Check sequence continuity and hash links of an exported log.
    Verify {
        /// JSON-lines audit file.
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

/// Result of verifying one file.
#[derive(Debug)]
pub struct VerifyReport {
    /// Records read.
    pub records: usize,
    /// Sequence of the last record, if any.
    pub head: Option<u64>,
    /// The first break found, if any.
    pub broken: Option<AuditChainError>,
}

/// Read and verify an audit file.
pub fn verify_file(path: &Path) -> Result<VerifyReport> {
    let records = read_json_lines(path)
        .with_context(|| format!("failed to read audit log: {}", path.display()))?;
    Ok(VerifyReport {
        records: records.len(),
        head: records.last().map(|r| r.sequence),
        broken: verify_chain_records(&records).err(),
    })
}

/// Execute `oblivion audit`.
pub fn run_audit(args: &AuditArgs) -> Result<u8> {
    match &args.command {
        AuditCommand::Verify { file } => {
            let report = verify_file(file)?;
            match report.broken {
                None => {
                    println!(
                        "OK: {} records, head sequence {}",
                        report.records,
                        report.head.unwrap_or(0)
                    );
                    Ok(0)
                }
                Some(err) => {
                    println!("BROKEN: {err}");
                    Ok(2)
                }
            }
        }
    }
}
