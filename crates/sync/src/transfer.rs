//! Size-only transfer backends

use crate::filelist::TransferList;
use async_trait::async_trait;
use mfsync_config::TransferMethod;
use mfsync_errors::{Error, SyncError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, trace};

/// Counters for one transfer pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    /// Files copied because they were missing or differed in size
    pub transferred: usize,
    /// Files already present with a matching size
    pub skipped: usize,
    pub bytes: u64,
}

/// Copies the files named in a list file from `source` to `destination`.
///
/// Implementations transfer a file only when it is absent at the
/// destination or its size differs, and recreate the relative directory
/// structure beneath `destination`.
#[async_trait]
pub trait Transfer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn transfer(
        &self,
        list: &Path,
        source: &Path,
        destination: &Path,
    ) -> Result<TransferStats, Error>;
}

/// Backend selected by the `TRANSFER` setting
#[must_use]
pub fn backend_for(method: TransferMethod) -> Box<dyn Transfer> {
    match method {
        TransferMethod::Native => Box::new(SizeOnlyCopy),
        TransferMethod::Rsync => Box::new(Rsync::default()),
    }
}

/// In-process size-only copier
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeOnlyCopy;

impl SizeOnlyCopy {
    fn failed(path: &Path, e: &std::io::Error) -> Error {
        SyncError::TransferFailed {
            backend: "native".to_string(),
            message: format!("{}: {e}", path.display()),
        }
        .into()
    }

    async fn copy_one(src: &Path, dst: &Path) -> Result<Option<u64>, Error> {
        let src_len = fs::metadata(src)
            .await
            .map_err(|e| Self::failed(src, &e))?
            .len();

        if let Ok(existing) = fs::metadata(dst).await {
            if existing.is_file() && existing.len() == src_len {
                return Ok(None);
            }
        }

        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::failed(parent, &e))?;
        }

        // copy beside the target, then rename over it
        let staging = staging_path(dst);
        let copied = match fs::copy(src, &staging).await {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&staging).await;
                return Err(Self::failed(src, &e));
            }
        };
        if let Err(e) = fs::rename(&staging, dst).await {
            let _ = fs::remove_file(&staging).await;
            return Err(Self::failed(dst, &e));
        }

        Ok(Some(copied))
    }
}

fn staging_path(dst: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(dst.file_name().unwrap_or_default());
    name.push(".mfsync-partial");
    dst.with_file_name(name)
}

#[async_trait]
impl Transfer for SizeOnlyCopy {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn transfer(
        &self,
        list: &Path,
        source: &Path,
        destination: &Path,
    ) -> Result<TransferStats, Error> {
        let mut stats = TransferStats::default();

        for relative in TransferList::read(list).await? {
            let src = source.join(&relative);
            let dst = destination.join(&relative);
            match Self::copy_one(&src, &dst).await? {
                Some(bytes) => {
                    trace!(path = %relative, bytes, "transferred");
                    stats.transferred += 1;
                    stats.bytes += bytes;
                }
                None => {
                    trace!(path = %relative, "size matches, skipped");
                    stats.skipped += 1;
                }
            }
        }

        Ok(stats)
    }
}

/// External `rsync --size-only --files-from` backend
#[derive(Debug, Clone)]
pub struct Rsync {
    program: PathBuf,
}

impl Default for Rsync {
    fn default() -> Self {
        Self::new("rsync")
    }
}

impl Rsync {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(list: &Path, source: &Path, destination: &Path) -> Vec<OsString> {
        let mut files_from = OsString::from("--files-from=");
        files_from.push(list);
        vec![
            OsString::from("--recursive"),
            OsString::from("--size-only"),
            OsString::from("--out-format=%l %n"),
            files_from,
            with_trailing_slash(source),
            with_trailing_slash(destination),
        ]
    }
}

fn with_trailing_slash(path: &Path) -> OsString {
    let mut s = path.as_os_str().to_os_string();
    s.push("/");
    s
}

/// Parse `--out-format=%l %n` lines; directory lines end with `/`
fn parse_rsync_output(stdout: &str) -> (usize, u64) {
    stdout
        .lines()
        .filter(|line| !line.ends_with('/'))
        .filter_map(|line| line.split_once(' '))
        .filter_map(|(len, _)| len.parse::<u64>().ok())
        .fold((0, 0), |(count, bytes), len| (count + 1, bytes + len))
}

#[async_trait]
impl Transfer for Rsync {
    fn name(&self) -> &'static str {
        "rsync"
    }

    async fn transfer(
        &self,
        list: &Path,
        source: &Path,
        destination: &Path,
    ) -> Result<TransferStats, Error> {
        let listed = TransferList::read(list).await?.len();
        let args = Self::args(list, source, destination);
        debug!(program = %self.program.display(), ?args, "running rsync");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .map_err(|e| SyncError::TransferFailed {
                backend: self.name().to_string(),
                message: format!("failed to run {}: {e}", self.program.display()),
            })?;

        if !output.status.success() {
            return Err(SyncError::TransferFailed {
                backend: self.name().to_string(),
                message: format!(
                    "{} ({})",
                    String::from_utf8_lossy(&output.stderr).trim(),
                    output.status
                ),
            }
            .into());
        }

        let (transferred, bytes) = parse_rsync_output(&String::from_utf8_lossy(&output.stdout));
        Ok(TransferStats {
            transferred,
            skipped: listed.saturating_sub(transferred),
            bytes,
        })
    }
}
