use crate::filelist::TransferList;
use crate::transfer::{backend_for, Transfer, TransferStats};
use mfsync_config::Config;
use mfsync_errors::{Error, SyncError};
use mfsync_guard::Verifier;
use mfsync_manifest::Manifest;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, warn};

/// Outcome of a successful materialize run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Entries that passed the existence check
    pub verified: usize,
    pub stats: TransferStats,
}

/// Verifies a manifest by existence and copies its files to a destination.
pub struct Syncer {
    input_dir: PathBuf,
    backend: Box<dyn Transfer>,
    list_dir: Option<PathBuf>,
}

impl Syncer {
    /// Syncer for the configured input directory and transfer method
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_backend(&config.input_dir, backend_for(config.transfer))
    }

    #[must_use]
    pub fn with_backend(input_dir: &Path, backend: Box<dyn Transfer>) -> Self {
        Self {
            input_dir: input_dir.to_path_buf(),
            backend,
            list_dir: None,
        }
    }

    /// Create transient list files in `dir` instead of the system temp dir
    #[must_use]
    pub fn list_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.list_dir = Some(dir.into());
        self
    }

    /// Existence-check the whole manifest, then copy it to `destination`.
    ///
    /// Always uses the existence strategy, even for checksummed manifests;
    /// checksums play no part in the copy. Nothing is copied unless the
    /// destination exists and every entry is present.
    ///
    /// # Errors
    ///
    /// - [`SyncError::DestinationNotFound`] if `destination` is not a directory
    /// - [`SyncError::VerificationFailed`] if any entry is missing
    /// - [`SyncError::TransferFailed`] if the copy fails; files already copied
    ///   are left in place
    pub async fn materialize(
        &self,
        manifest: &Manifest,
        destination: &Path,
    ) -> Result<SyncReport, Error> {
        let destination = match fs::metadata(destination).await {
            Ok(m) if m.is_dir() => fs::canonicalize(destination)
                .await
                .map_err(|e| Error::io_with_path(&e, destination))?,
            _ => {
                error!(path = %destination.display(), "destination does not exist");
                return Err(SyncError::DestinationNotFound {
                    path: destination.display().to_string(),
                }
                .into());
            }
        };

        let verification = Verifier::existence(&self.input_dir)
            .verify(manifest)
            .await;
        if !verification.passed() {
            return Err(SyncError::VerificationFailed {
                failed: verification.discrepancies.len(),
                total: verification.total(),
            }
            .into());
        }

        let list = TransferList::create(manifest.paths(), self.list_dir.as_deref())?;
        info!(
            files = list.len(),
            backend = self.backend.name(),
            destination = %destination.display(),
            "transferring"
        );

        let outcome = self
            .backend
            .transfer(list.path(), &self.input_dir, &destination)
            .await;

        if let Err(e) = list.close() {
            warn!("failed to remove transfer list: {e}");
        }

        let stats = outcome?;
        info!(
            transferred = stats.transferred,
            skipped = stats.skipped,
            bytes = stats.bytes,
            "sync complete"
        );

        Ok(SyncReport {
            verified: verification.total(),
            stats,
        })
    }
}
