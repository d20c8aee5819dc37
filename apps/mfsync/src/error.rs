//! CLI error handling

use std::fmt;

use mfsync_errors::UserFacingError;

/// Exit status for runtime failures
pub const EXIT_FAILURE: i32 = 1;
/// Exit status for usage errors and help
pub const EXIT_USAGE: i32 = 2;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(mfsync_errors::ConfigError),
    /// Loading, verification or transfer error
    Ops(mfsync_errors::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => {
                write!(f, "Configuration error: {e}")?;
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                Ok(())
            }
            CliError::Ops(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Ops(e) => Some(e),
        }
    }
}

impl From<mfsync_errors::Error> for CliError {
    fn from(e: mfsync_errors::Error) -> Self {
        match e {
            mfsync_errors::Error::Config(e) => CliError::Config(e),
            other => CliError::Ops(other),
        }
    }
}

impl From<mfsync_errors::GuardError> for CliError {
    fn from(e: mfsync_errors::GuardError) -> Self {
        CliError::Ops(e.into())
    }
}
