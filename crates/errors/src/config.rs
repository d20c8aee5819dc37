//! Configuration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("settings file not found: {path}")]
    NotFound { path: String },

    #[error("parse error in {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("missing required setting: {field}")]
    MissingField { field: String },

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("input directory does not exist: {path}")]
    InputDirNotFound { path: String },
}

impl UserFacingError for ConfigError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => {
                Some("Point MFSYNC_CONFIG at an existing settings file or unset it.")
            }
            Self::MissingField { .. } => Some(
                "Set FILELIST, INPUTDIR and CHECKMD5 in mfsync.toml or in the environment.",
            ),
            Self::InvalidValue { .. } | Self::ParseError { .. } => {
                Some("Fix the setting value and retry the command.")
            }
            Self::InputDirNotFound { .. } => Some("INPUTDIR must name an existing directory."),
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::NotFound { .. } => "config.not_found",
            Self::ParseError { .. } => "config.parse_error",
            Self::MissingField { .. } => "config.missing_field",
            Self::InvalidValue { .. } => "config.invalid_value",
            Self::InputDirNotFound { .. } => "config.input_dir_not_found",
        };
        Some(code)
    }
}
