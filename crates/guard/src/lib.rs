#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Manifest verification for mfsync
//!
//! Checks that every manifest entry is present in the input directory,
//! either by existence or by content checksum. Verification never mutates
//! the filesystem.

mod types;
mod verifier;

pub use types::{Discrepancy, EntryOutcome, VerificationResult, VerificationStrategy};
pub use verifier::Verifier;
