#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Materialize mode for mfsync
//!
//! Copies the files named by a manifest from the input directory to a
//! destination. The whole manifest is existence-checked first; only if every
//! entry is present is anything copied. Copies use a size-only comparison:
//! a file is transferred when it is missing at the destination or its size
//! differs, and contents are never re-hashed.

mod filelist;
mod syncer;
mod transfer;

pub use filelist::TransferList;
pub use syncer::{SyncReport, Syncer};
pub use transfer::{backend_for, Rsync, SizeOnlyCopy, Transfer, TransferStats};
