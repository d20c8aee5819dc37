//! Type definitions for manifest verification

use mfsync_config::Config;
use mfsync_errors::GuardError;
use mfsync_hash::ChecksumAlgorithm;
use std::fmt;

/// How each entry is checked against the input directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStrategy {
    /// Regular, readable file exists; contents are not inspected
    Existence,
    /// File contents hash to the manifest checksum
    Checksum(ChecksumAlgorithm),
}

impl VerificationStrategy {
    /// Strategy selected by `CHECKMD5`
    #[must_use]
    pub fn for_config(config: &Config) -> Self {
        if config.checksum_mode {
            Self::Checksum(config.checksum_algorithm)
        } else {
            Self::Existence
        }
    }
}

impl fmt::Display for VerificationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Existence => f.write_str("existence"),
            Self::Checksum(algorithm) => write!(f, "checksum ({algorithm})"),
        }
    }
}

/// Per-entry outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryOutcome {
    pub exists: bool,
    pub readable: bool,
    /// `None` when contents were not inspected
    pub checksum_ok: Option<bool>,
}

impl EntryOutcome {
    pub(crate) const MISSING: Self = Self {
        exists: false,
        readable: false,
        checksum_ok: None,
    };

    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.exists && self.readable && self.checksum_ok.unwrap_or(true)
    }

    /// Discrepancy for an unsatisfied entry
    #[must_use]
    pub fn discrepancy(&self, path: &str) -> Option<Discrepancy> {
        let path = path.to_string();
        if !self.exists {
            Some(Discrepancy::Missing { path })
        } else if !self.readable {
            Some(Discrepancy::Unreadable { path })
        } else if self.checksum_ok == Some(false) {
            Some(Discrepancy::ChecksumMismatch { path })
        } else {
            None
        }
    }
}

/// Issues discovered during verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discrepancy {
    Missing { path: String },
    Unreadable { path: String },
    ChecksumMismatch { path: String },
}

impl Discrepancy {
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Missing { path } | Self::Unreadable { path } | Self::ChecksumMismatch { path } => {
                path
            }
        }
    }

    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Missing { .. } => "does not exist",
            Self::Unreadable { .. } => "is not readable",
            Self::ChecksumMismatch { .. } => "checksum mismatch",
        }
    }
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path(), self.reason())
    }
}

/// Result of a verification run over a whole manifest.
#[derive(Debug, Clone)]
pub struct VerificationResult {
    pub strategy: VerificationStrategy,
    /// One outcome per manifest entry, in manifest order
    pub outcomes: Vec<EntryOutcome>,
    /// Unsatisfied entries, in manifest order
    pub discrepancies: Vec<Discrepancy>,
}

impl VerificationResult {
    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// All-or-nothing: true iff every entry is satisfied
    #[must_use]
    pub fn passed(&self) -> bool {
        self.discrepancies.is_empty()
    }

    /// Convert a failed run into an error carrying the counts
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::VerificationFailed`] unless every entry passed.
    pub fn into_result(self) -> Result<Self, GuardError> {
        if self.passed() {
            Ok(self)
        } else {
            Err(GuardError::VerificationFailed {
                failed: self.discrepancies.len(),
                total: self.total(),
            })
        }
    }
}
