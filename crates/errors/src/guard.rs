//! Verification error types

use thiserror::Error;

/// Errors emitted by the verification subsystem.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum GuardError {
    /// One or more manifest entries were not satisfied.
    #[error("verification failed: {failed} of {total} entries not satisfied")]
    VerificationFailed { failed: usize, total: usize },
}

impl GuardError {
    #[must_use]
    pub fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::VerificationFailed { .. } => "guard.verification_failed",
        };
        Some(code)
    }
}
