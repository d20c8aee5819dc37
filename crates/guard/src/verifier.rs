use crate::types::{EntryOutcome, VerificationResult, VerificationStrategy};
use mfsync_config::Config;
use mfsync_errors::{Error, StorageError};
use mfsync_hash::Checksum;
use mfsync_manifest::{Entry, Manifest};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, warn};

/// Checks manifest entries against the input directory.
#[derive(Debug, Clone)]
pub struct Verifier {
    input_dir: PathBuf,
    strategy: VerificationStrategy,
}

impl Verifier {
    /// Verifier using the strategy selected by the configuration
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_strategy(&config.input_dir, VerificationStrategy::for_config(config))
    }

    /// Existence-only verifier regardless of `CHECKMD5`
    #[must_use]
    pub fn existence(input_dir: &Path) -> Self {
        Self::with_strategy(input_dir, VerificationStrategy::Existence)
    }

    #[must_use]
    pub fn with_strategy(input_dir: &Path, strategy: VerificationStrategy) -> Self {
        Self {
            input_dir: input_dir.to_path_buf(),
            strategy,
        }
    }

    #[must_use]
    pub fn strategy(&self) -> VerificationStrategy {
        self.strategy
    }

    /// Check every entry and summarise.
    ///
    /// The whole manifest is scanned before deciding so that every failing
    /// entry is reported, one log line each, followed by `Ok` or `Failed`.
    /// Filesystem errors on an entry make that entry unsatisfied; they never
    /// stop the scan.
    pub async fn verify(&self, manifest: &Manifest) -> VerificationResult {
        debug!(
            input_dir = %self.input_dir.display(),
            strategy = %self.strategy,
            entries = manifest.len(),
            "verifying manifest"
        );

        let mut outcomes = Vec::with_capacity(manifest.len());
        let mut discrepancies = Vec::new();

        for entry in manifest {
            let outcome = self.check_entry(entry).await;
            if let Some(discrepancy) = outcome.discrepancy(entry.relative_path()) {
                warn!(path = discrepancy.path(), "{discrepancy}");
                discrepancies.push(discrepancy);
            }
            outcomes.push(outcome);
        }

        let result = VerificationResult {
            strategy: self.strategy,
            outcomes,
            discrepancies,
        };

        if result.passed() {
            info!(entries = result.total(), strategy = %self.strategy, "Ok");
        } else {
            error!(
                entries = result.total(),
                failed = result.discrepancies.len(),
                strategy = %self.strategy,
                "Failed"
            );
        }

        result
    }

    /// Check a single entry
    pub async fn check_entry(&self, entry: &Entry) -> EntryOutcome {
        let path = self.input_dir.join(entry.relative_path());

        let is_file = fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return EntryOutcome::MISSING;
        }

        match self.strategy {
            VerificationStrategy::Existence => {
                let readable = fs::File::open(&path).await.is_ok();
                EntryOutcome {
                    exists: true,
                    readable,
                    checksum_ok: None,
                }
            }
            VerificationStrategy::Checksum(algorithm) => {
                let Some(expected) = entry.checksum() else {
                    // nothing to compare against
                    return EntryOutcome {
                        exists: true,
                        readable: true,
                        checksum_ok: Some(false),
                    };
                };
                match Checksum::hash_file(algorithm, &path).await {
                    Ok(actual) => EntryOutcome {
                        exists: true,
                        readable: true,
                        checksum_ok: Some(actual.matches(expected)),
                    },
                    Err(Error::Storage(StorageError::PathNotFound { .. })) => EntryOutcome::MISSING,
                    Err(e) => {
                        debug!(path = %path.display(), error = %e, "hashing failed");
                        EntryOutcome {
                            exists: true,
                            readable: false,
                            checksum_ok: None,
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Discrepancy;
    use mfsync_hash::ChecksumAlgorithm;
    use mfsync_manifest::ManifestFormat;
    use tempfile::TempDir;

    fn md5_hex(data: &[u8]) -> String {
        Checksum::from_data(ChecksumAlgorithm::Md5, data)
            .to_hex()
            .to_string()
    }

    fn source_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.txt"), b"alpha").unwrap();
        std::fs::write(dir.path().join("sub/b.txt"), b"bravo").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_existence_all_present() {
        let dir = source_tree();
        let manifest = Manifest::parse("a.txt\nsub/b.txt\n", ManifestFormat::Plain).unwrap();
        let result = Verifier::existence(dir.path()).verify(&manifest).await;
        assert!(result.passed());
        assert_eq!(result.total(), 2);
        assert!(result.outcomes.iter().all(|o| o.checksum_ok.is_none()));
    }

    #[tokio::test]
    async fn test_existence_collects_every_missing_entry() {
        let dir = source_tree();
        let manifest =
            Manifest::parse("gone1.txt\na.txt\nsub/gone2.txt\n", ManifestFormat::Plain).unwrap();
        let result = Verifier::existence(dir.path()).verify(&manifest).await;
        assert!(!result.passed());
        assert_eq!(
            result.discrepancies,
            [
                Discrepancy::Missing {
                    path: "gone1.txt".into()
                },
                Discrepancy::Missing {
                    path: "sub/gone2.txt".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_directory_is_not_a_file() {
        let dir = source_tree();
        let manifest = Manifest::parse("sub\n", ManifestFormat::Plain).unwrap();
        let result = Verifier::existence(dir.path()).verify(&manifest).await;
        assert!(!result.passed());
        assert_eq!(result.discrepancies[0].reason(), "does not exist");
    }

    #[tokio::test]
    async fn test_checksum_flags_only_altered_entry() {
        let dir = source_tree();
        let text = format!(
            "{}  a.txt\n{}  sub/b.txt\n",
            md5_hex(b"alpha"),
            md5_hex(b"not bravo")
        );
        let manifest = Manifest::parse(&text, ManifestFormat::Checksummed).unwrap();
        let verifier = Verifier::with_strategy(
            dir.path(),
            VerificationStrategy::Checksum(ChecksumAlgorithm::Md5),
        );
        let result = verifier.verify(&manifest).await;
        assert_eq!(
            result.discrepancies,
            [Discrepancy::ChecksumMismatch {
                path: "sub/b.txt".into()
            }]
        );
        assert_eq!(result.outcomes[0].checksum_ok, Some(true));
        assert_eq!(result.outcomes[1].checksum_ok, Some(false));
    }

    #[tokio::test]
    async fn test_checksum_missing_file_reports_absence() {
        let dir = source_tree();
        let text = format!("{}  nope.txt\n", md5_hex(b"alpha"));
        let manifest = Manifest::parse(&text, ManifestFormat::Checksummed).unwrap();
        let verifier = Verifier::with_strategy(
            dir.path(),
            VerificationStrategy::Checksum(ChecksumAlgorithm::Md5),
        );
        let result = verifier.verify(&manifest).await;
        assert_eq!(result.discrepancies[0].to_string(), "nope.txt does not exist");
    }

    #[tokio::test]
    async fn test_existence_ignores_wrong_checksums() {
        let dir = source_tree();
        let manifest =
            Manifest::parse("deadbeef  a.txt\n", ManifestFormat::Checksummed).unwrap();
        let result = Verifier::existence(dir.path()).verify(&manifest).await;
        assert!(result.passed());
    }

    #[tokio::test]
    async fn test_empty_manifest_passes_in_both_strategies() {
        let dir = TempDir::new().unwrap();
        let manifest = Manifest::parse("", ManifestFormat::Checksummed).unwrap();
        for strategy in [
            VerificationStrategy::Existence,
            VerificationStrategy::Checksum(ChecksumAlgorithm::Md5),
        ] {
            let result = Verifier::with_strategy(dir.path(), strategy)
                .verify(&manifest)
                .await;
            assert!(result.passed());
        }
    }

    #[cfg(unix)]
    fn make_unreadable(path: &std::path::Path) -> bool {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o000)).unwrap();
        // root ignores permission bits
        std::fs::File::open(path).is_err()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_file_is_reported_in_both_strategies() {
        let dir = source_tree();
        if !make_unreadable(&dir.path().join("a.txt")) {
            return;
        }
        let checksummed = format!(
            "{}  a.txt\n{}  sub/b.txt\n",
            md5_hex(b"alpha"),
            md5_hex(b"bravo")
        );
        let cases = [
            (
                VerificationStrategy::Existence,
                Manifest::parse("a.txt\nsub/b.txt\n", ManifestFormat::Plain).unwrap(),
            ),
            (
                VerificationStrategy::Checksum(ChecksumAlgorithm::Md5),
                Manifest::parse(&checksummed, ManifestFormat::Checksummed).unwrap(),
            ),
        ];

        for (strategy, manifest) in cases {
            let result = Verifier::with_strategy(dir.path(), strategy)
                .verify(&manifest)
                .await;
            assert_eq!(
                result.discrepancies,
                [Discrepancy::Unreadable {
                    path: "a.txt".into()
                }]
            );
            assert_eq!(result.discrepancies[0].to_string(), "a.txt is not readable");
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_read_error_while_hashing_does_not_stop_scan() {
        let dir = source_tree();
        // reading offset 0 of /proc/self/mem fails with EIO
        std::os::unix::fs::symlink("/proc/self/mem", dir.path().join("mem.bin")).unwrap();
        let manifest =
            Manifest::parse("00  mem.bin\n00  missing.txt\n", ManifestFormat::Checksummed)
                .unwrap();
        let verifier = Verifier::with_strategy(
            dir.path(),
            VerificationStrategy::Checksum(ChecksumAlgorithm::Md5),
        );

        let result = verifier.verify(&manifest).await;

        assert_eq!(result.total(), 2);
        assert_eq!(
            result.discrepancies,
            [
                Discrepancy::Unreadable {
                    path: "mem.bin".into()
                },
                Discrepancy::Missing {
                    path: "missing.txt".into()
                },
            ]
        );
    }
}
