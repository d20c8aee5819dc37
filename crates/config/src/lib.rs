#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for mfsync
//!
//! Settings are layered, lowest precedence first:
//! - Settings file (`$MFSYNC_CONFIG`, or `./mfsync.toml` when present)
//! - Environment variables with the same key names
//!
//! The result is resolved once into an immutable [`Config`] that is passed
//! explicitly to the manifest loader, verifier and syncer.

use mfsync_errors::{ConfigError, Error};
use mfsync_hash::ChecksumAlgorithm;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use tracing::debug;

/// Environment variable naming an explicit settings file
pub const CONFIG_ENV: &str = "MFSYNC_CONFIG";

/// Settings file picked up from the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "mfsync.toml";

/// Setting keys, shared by the settings file and the environment
pub mod keys {
    pub const FILELIST: &str = "FILELIST";
    pub const INPUTDIR: &str = "INPUTDIR";
    pub const CHECKMD5: &str = "CHECKMD5";
    pub const CHECKSUM_ALGO: &str = "CHECKSUM_ALGO";
    pub const TRANSFER: &str = "TRANSFER";
}

/// How files are moved to the destination in materialize mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMethod {
    /// In-process size-only copier
    #[default]
    Native,
    /// External `rsync --size-only`
    Rsync,
}

impl TransferMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Rsync => "rsync",
        }
    }
}

impl fmt::Display for TransferMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(Self::Native),
            "rsync" => Ok(Self::Rsync),
            other => Err(format!("unknown transfer method: {other}")),
        }
    }
}

/// Raw, partially specified settings as read from a file or the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub filelist: Option<PathBuf>,
    pub input_dir: Option<PathBuf>,
    pub check_md5: Option<bool>,
    pub checksum_algorithm: Option<ChecksumAlgorithm>,
    pub transfer: Option<TransferMethod>,
}

/// Settings file layout before values are validated
///
/// Scalar values are kept as text and validated by the same rules as the
/// environment, so `CHECKMD5 = "yes"` and `CHECKMD5 = 1` are both accepted.
#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(rename = "FILELIST", default)]
    filelist: Option<PathBuf>,

    #[serde(rename = "INPUTDIR", default)]
    input_dir: Option<PathBuf>,

    #[serde(rename = "CHECKMD5", default)]
    check_md5: Option<ScalarValue>,

    #[serde(rename = "CHECKSUM_ALGO", default)]
    checksum_algorithm: Option<ScalarValue>,

    #[serde(rename = "TRANSFER", default)]
    transfer: Option<ScalarValue>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScalarValue {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl ScalarValue {
    fn into_text(self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Integer(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

impl SettingsFile {
    fn into_settings(self) -> Result<Settings, Error> {
        let mut settings = Settings {
            filelist: self.filelist,
            input_dir: self.input_dir,
            ..Settings::default()
        };
        let scalars = [
            (keys::CHECKMD5, self.check_md5),
            (keys::CHECKSUM_ALGO, self.checksum_algorithm),
            (keys::TRANSFER, self.transfer),
        ];
        settings.merge_vars(
            scalars
                .into_iter()
                .filter_map(|(key, value)| Some((key, value?.into_text()))),
        )?;
        Ok(settings)
    }
}

/// Fully resolved configuration for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Manifest path
    pub filelist: PathBuf,
    /// Absolute, existing source directory
    pub input_dir: PathBuf,
    /// Verify by content checksum instead of existence
    pub checksum_mode: bool,
    pub checksum_algorithm: ChecksumAlgorithm,
    pub transfer: TransferMethod,
}

impl Settings {
    /// Load settings from a TOML file
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if the file does not exist, an I/O
    /// error if it cannot be read, [`ConfigError::ParseError`] if it is not
    /// valid TOML, or [`ConfigError::InvalidValue`] naming a bad key.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.display().to_string(),
                }
                .into()
            } else {
                Error::io_with_path(&e, path)
            }
        })?;

        let file: SettingsFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        file.into_settings()
    }

    /// Locate and load the settings file, if any
    ///
    /// An explicit `$MFSYNC_CONFIG` must exist. Without it, `./mfsync.toml`
    /// is read when present and otherwise settings start empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected file cannot be read or parsed.
    pub async fn discover() -> Result<Self, Error> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            let path = PathBuf::from(path);
            debug!(path = %path.display(), "loading settings from {CONFIG_ENV}");
            return Self::load_from_file(&path).await;
        }

        let local = Path::new(DEFAULT_SETTINGS_FILE);
        if fs::try_exists(local).await.unwrap_or(false) {
            debug!(path = %local.display(), "loading settings from working directory");
            Self::load_from_file(local).await
        } else {
            Ok(Self::default())
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a recognised variable holds an invalid value.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        self.merge_vars(
            std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
        )
    }

    /// Merge key/value overrides; unrelated keys are ignored
    ///
    /// # Errors
    ///
    /// Returns an error if a recognised key holds an invalid value.
    pub fn merge_vars<I, K, V>(&mut self, vars: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            match key.as_ref() {
                keys::FILELIST => self.filelist = Some(PathBuf::from(value.into())),
                keys::INPUTDIR => self.input_dir = Some(PathBuf::from(value.into())),
                keys::CHECKMD5 => self.check_md5 = Some(parse_bool(keys::CHECKMD5, value.into())?),
                keys::CHECKSUM_ALGO => {
                    let value = value.into();
                    self.checksum_algorithm =
                        Some(value.parse().map_err(|_| ConfigError::InvalidValue {
                            field: keys::CHECKSUM_ALGO.to_string(),
                            value,
                        })?);
                }
                keys::TRANSFER => {
                    let value = value.into();
                    self.transfer = Some(value.parse().map_err(|_| ConfigError::InvalidValue {
                        field: keys::TRANSFER.to_string(),
                        value,
                    })?);
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Check required fields and resolve the input directory
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] naming the first absent required
    /// key, or [`ConfigError::InputDirNotFound`] if `INPUTDIR` is not an
    /// existing directory.
    pub async fn resolve(self) -> Result<Config, Error> {
        let filelist = self.filelist.ok_or_else(|| missing(keys::FILELIST))?;
        let input_dir = self.input_dir.ok_or_else(|| missing(keys::INPUTDIR))?;
        let checksum_mode = self.check_md5.ok_or_else(|| missing(keys::CHECKMD5))?;

        let not_found = || ConfigError::InputDirNotFound {
            path: input_dir.display().to_string(),
        };
        let absolute = fs::canonicalize(&input_dir).await.map_err(|_| not_found())?;
        let metadata = fs::metadata(&absolute).await.map_err(|_| not_found())?;
        if !metadata.is_dir() {
            return Err(not_found().into());
        }

        Ok(Config {
            filelist,
            input_dir: absolute,
            checksum_mode,
            checksum_algorithm: self.checksum_algorithm.unwrap_or_default(),
            transfer: self.transfer.unwrap_or_default(),
        })
    }
}

impl Config {
    /// Load settings from the file and environment, then resolve them
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file is unreadable, a value is
    /// invalid, a required key is missing, or `INPUTDIR` does not exist.
    pub async fn load() -> Result<Self, Error> {
        let mut settings = Settings::discover().await?;
        settings.merge_env()?;
        let config = settings.resolve().await?;
        debug!(
            filelist = %config.filelist.display(),
            input_dir = %config.input_dir.display(),
            checksum_mode = config.checksum_mode,
            checksum_algorithm = %config.checksum_algorithm,
            transfer = %config.transfer,
            "configuration loaded"
        );
        Ok(config)
    }
}

fn missing(field: &str) -> Error {
    ConfigError::MissingField {
        field: field.to_string(),
    }
    .into()
}

fn parse_bool(field: &str, value: String) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
        }
        .into()),
    }
}
