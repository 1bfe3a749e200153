//! # Identity Subcommands
//!
//! - `oblivion hash <MATERIAL>` prints the SHA-256 identity commitment.
//! - `oblivion proof --identity-hash <HEX> [flags]` prints a JSON bundle
//!   (`attributes`, `public_signals`, hex `proof`) that the `signal-binding`
//!   verifier accepts. The bundle can be pasted into an issuance request.

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};

use oblivion_core::{to_hex, Attributes, IdentityHash};
use oblivion_zkp::SignalBindingVerifier;

/// Arguments for `oblivion hash`.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Identity material to commit to (document number, DID, ...).
    #[arg(value_name = "MATERIAL")]
    pub material: String,
}

/// Arguments for `oblivion proof`.
#[derive(Args, Debug)]
pub struct ProofArgs {
    /// Identity commitment, hex with optional `0x` prefix.
    #[arg(long, value_name = "HEX")]
    pub identity_hash: String,

    /// Identity documents were verified.
    #[arg(long)]
    pub verified: bool,

    /// Holder is of legal age.
    #[arg(long)]
    pub adult: bool,

    /// Holder passed liveness checks.
    #[arg(long)]
    pub human: bool,

    /// Holder is not on a sanctions list.
    #[arg(long)]
    pub not_sanctioned: bool,

    /// Holder is not a duplicate enrollment.
    #[arg(long)]
    pub unique: bool,
}

/// Output of `oblivion proof`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProofBundle {
    /// Declared attributes.
    pub attributes: Attributes,
    /// Conventional signal encoding of the flags.
    pub public_signals: Vec<u64>,
    /// Hex-encoded binding proof.
    pub proof: String,
}

/// Build the proof bundle for the given flags.
pub fn build_bundle(args: &ProofArgs) -> Result<ProofBundle> {
    let identity_hash: IdentityHash = args
        .identity_hash
        .trim()
        .parse()
        .context("invalid --identity-hash")?;
    let attributes = Attributes {
        verified: args.verified,
        adult: args.adult,
        human: args.human,
        not_sanctioned: args.not_sanctioned,
        unique: args.unique,
        identity_hash,
    };
    Ok(ProofBundle {
        public_signals: attributes.public_signals(),
        proof: format!("0x{}", to_hex(&SignalBindingVerifier::prove(&attributes))),
        attributes,
    })
}

/// Execute `oblivion hash`.
pub fn run_hash(args: &HashArgs) -> Result<u8> {
    println!("{}", IdentityHash::commit(args.material.as_bytes()));
    Ok(0)
}

/// Execute `oblivion proof`.
pub fn run_proof(args: &ProofArgs) -> Result<u8> {
    let bundle = build_bundle(args)?;
    tracing::debug!(identity_hash = %bundle.attributes.identity_hash, "built proof bundle");
    println!(
        "{}",
        serde_json::to_string_pretty(&bundle).context("failed to encode bundle")?
    );
    Ok(0)
}
