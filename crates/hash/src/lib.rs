#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Content checksums for mfsync
//!
//! Manifests carry hex digests produced by the usual command-line tools
//! (`md5sum`, `b3sum`). This crate recomputes them by streaming file
//! contents so large files never have to be held in memory.

use blake3::Hasher as Blake3Hasher;
use md5::{Digest, Md5};
use mfsync_errors::{Error, StorageError};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Size of chunks for streaming hash computation
const CHUNK_SIZE: usize = 64 * 1024; // 64KB

/// Digest algorithm used for manifest checksums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChecksumAlgorithm {
    /// MD5, as written by `md5sum`
    #[default]
    Md5,
    /// BLAKE3, as written by `b3sum`
    Blake3,
}

impl ChecksumAlgorithm {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Blake3 => "blake3",
        }
    }

    fn hasher(self) -> StreamHasher {
        match self {
            Self::Md5 => StreamHasher::Md5(Md5::new()),
            Self::Blake3 => StreamHasher::Blake3(Box::new(Blake3Hasher::new())),
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "blake3" | "b3" => Ok(Self::Blake3),
            other => Err(format!("unknown checksum algorithm: {other}")),
        }
    }
}

enum StreamHasher {
    Md5(Md5),
    Blake3(Box<Blake3Hasher>),
}

impl StreamHasher {
    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Self::Md5(h) => hex::encode(h.finalize()),
            Self::Blake3(h) => h.finalize().to_hex().to_string(),
        }
    }
}

/// A computed content checksum, stored as lowercase hex
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum {
    algorithm: ChecksumAlgorithm,
    hex: String,
}

impl Checksum {
    /// Compute the checksum of a byte slice
    #[must_use]
    pub fn from_data(algorithm: ChecksumAlgorithm, data: &[u8]) -> Self {
        let mut hasher = algorithm.hasher();
        hasher.update(data);
        Self {
            algorithm,
            hex: hasher.finalize_hex(),
        }
    }

    /// Compute the checksum of a file
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or read.
    pub async fn hash_file(algorithm: ChecksumAlgorithm, path: &Path) -> Result<Self, Error> {
        let mut file = File::open(path)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, path))?;

        let mut hasher = algorithm.hasher();
        let mut buffer = vec![0; CHUNK_SIZE];

        loop {
            let n = file
                .read(&mut buffer)
                .await
                .map_err(|e| Error::io_with_path(&e, path))?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        Ok(Self {
            algorithm,
            hex: hasher.finalize_hex(),
        })
    }

    #[must_use]
    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    /// Lowercase hex digest
    #[must_use]
    pub fn to_hex(&self) -> &str {
        &self.hex
    }

    /// Byte-exact comparison against a digest as written in a manifest
    #[must_use]
    pub fn matches(&self, expected: &str) -> bool {
        self.hex.as_bytes() == expected.as_bytes()
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_md5_known_value() {
        let sum = Checksum::from_data(ChecksumAlgorithm::Md5, b"hello world");
        assert_eq!(sum.to_hex(), "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn test_blake3_known_value() {
        let sum = Checksum::from_data(ChecksumAlgorithm::Blake3, b"hello world");
        assert_eq!(
            sum.to_hex(),
            "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24"
        );
    }

    #[test]
    fn test_matches_is_byte_exact() {
        let sum = Checksum::from_data(ChecksumAlgorithm::Md5, b"hello world");
        assert!(sum.matches("5eb63bbbe01eeed093cb22bb8f5acdc3"));
        assert!(!sum.matches("5EB63BBBE01EEED093CB22BB8F5ACDC3"));
        assert!(!sum.matches("5eb63bbbe01eeed093cb22bb8f5acdc3 "));
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("MD5".parse::<ChecksumAlgorithm>(), Ok(ChecksumAlgorithm::Md5));
        assert_eq!(
            "blake3".parse::<ChecksumAlgorithm>(),
            Ok(ChecksumAlgorithm::Blake3)
        );
        assert!("sha1".parse::<ChecksumAlgorithm>().is_err());
    }

    #[tokio::test]
    async fn test_hash_file_streams_past_chunk_boundary() {
        use std::io::Write;
        let mut temp = NamedTempFile::new().unwrap();
        let data = vec![7u8; CHUNK_SIZE * 2 + 17];
        temp.write_all(&data).unwrap();

        let sum = Checksum::hash_file(ChecksumAlgorithm::Md5, temp.path())
            .await
            .unwrap();
        assert_eq!(sum, Checksum::from_data(ChecksumAlgorithm::Md5, &data));
    }

    #[tokio::test]
    async fn test_hash_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Checksum::hash_file(ChecksumAlgorithm::Md5, &dir.path().join("nope")).await;
        assert!(matches!(
            result,
            Err(Error::Storage(StorageError::PathNotFound { .. }))
        ));
    }
}
