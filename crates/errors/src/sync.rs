//! Materialize (verify + copy) error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum SyncError {
    #[error("destination directory does not exist: {path}")]
    DestinationNotFound { path: String },

    #[error("existence check failed: {failed} of {total} entries missing, nothing copied")]
    VerificationFailed { failed: usize, total: usize },

    #[error("failed to prepare transfer list: {message}")]
    ListFileFailed { message: String },

    #[error("transfer via {backend} failed: {message}")]
    TransferFailed { backend: String, message: String },
}

impl UserFacingError for SyncError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::DestinationNotFound { .. } => {
                Some("Create the destination directory before running mfsync.")
            }
            Self::VerificationFailed { .. } => {
                Some("Run `mfsync --dry-run` to list the missing entries.")
            }
            Self::TransferFailed { .. } => Some(
                "Files copied before the failure were left in place; rerun to resume.",
            ),
            Self::ListFileFailed { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::DestinationNotFound { .. } => "sync.destination_not_found",
            Self::VerificationFailed { .. } => "sync.verification_failed",
            Self::ListFileFailed { .. } => "sync.list_file_failed",
            Self::TransferFailed { .. } => "sync.transfer_failed",
        };
        Some(code)
    }
}
