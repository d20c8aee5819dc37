//! Manifest loading error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ManifestError {
    #[error("manifest not found: {path}")]
    NotFound { path: String },

    #[error("failed to read manifest {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("invalid manifest entry on line {line}: {reason}")]
    InvalidEntry { line: usize, reason: String },
}

impl UserFacingError for ManifestError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => Some("Check that FILELIST points at the manifest file."),
            Self::InvalidEntry { .. } => Some(
                "Checksummed manifests need `<checksum>  <relative-path>` on every line; \
                 paths must be relative and must not contain `..`.",
            ),
            Self::ReadFailed { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::NotFound { .. } => "manifest.not_found",
            Self::ReadFailed { .. } => "manifest.read_failed",
            Self::InvalidEntry { .. } => "manifest.invalid_entry",
        };
        Some(code)
    }
}
