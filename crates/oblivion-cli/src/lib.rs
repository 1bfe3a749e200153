//! # oblivion-cli: CLI Tool for the Passport Registry
//!
//! ## Subcommands
//!
//! - `oblivion hash`: identity-hash commitment for raw material.
//! - `oblivion proof`: signal-binding proof bundle for a set of flags.
//! - `oblivion audit verify`: offline check of an exported audit log.
//!
//! ```bash
//! oblivion hash "P<UTOERIKSSON<<ANNA<MARIA"
//! oblivion proof --identity-hash 0x… --verified --adult --human --not-sanctioned --unique
//! oblivion audit verify audit.jsonl
//! ```

pub mod audit;
pub mod identity;
