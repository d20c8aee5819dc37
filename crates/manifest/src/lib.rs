#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! File manifest handling for mfsync
//!
//! A manifest is the authoritative, ordered list of files expected in the
//! input directory. Two line formats exist and a file uses exactly one:
//!
//! - plain: `relative/path`
//! - checksummed: `<checksum>  relative/path`, as written by `md5sum`
//!
//! The format is chosen by configuration, never sniffed from the contents.
//! In checksummed lines the path is the *last* whitespace-delimited token,
//! so paths containing whitespace cannot be expressed in that format.

use mfsync_errors::{Error, ManifestError};
use std::fmt;
use std::path::{Component, Path};
use tokio::fs;
use tracing::debug;

/// Line format of a manifest file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    /// One relative path per line
    Plain,
    /// `<checksum> <relative-path>` per line
    Checksummed,
}

impl ManifestFormat {
    #[must_use]
    pub fn from_checksum_mode(checksum_mode: bool) -> Self {
        if checksum_mode {
            Self::Checksummed
        } else {
            Self::Plain
        }
    }
}

/// One parsed manifest line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    relative_path: String,
    checksum: Option<String>,
}

impl Entry {
    #[must_use]
    pub fn plain(relative_path: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            checksum: None,
        }
    }

    #[must_use]
    pub fn checksummed(checksum: impl Into<String>, relative_path: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            checksum: Some(checksum.into()),
        }
    }

    #[must_use]
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    #[must_use]
    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.checksum {
            Some(sum) => write!(f, "{sum}  {}", self.relative_path),
            None => f.write_str(&self.relative_path),
        }
    }
}

/// Ordered, immutable list of expected files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    format: ManifestFormat,
    entries: Vec<Entry>,
}

impl Manifest {
    /// Read and parse a manifest file
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::NotFound`] if the file does not exist,
    /// [`ManifestError::ReadFailed`] if it cannot be read as UTF-8 text, and
    /// [`ManifestError::InvalidEntry`] for a malformed line.
    pub async fn load(path: &Path, format: ManifestFormat) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ManifestError::NotFound {
                    path: path.display().to_string(),
                }
            } else {
                ManifestError::ReadFailed {
                    path: path.display().to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let manifest = Self::parse(&contents, format)?;
        debug!(
            path = %path.display(),
            format = ?format,
            entries = manifest.len(),
            "manifest loaded"
        );
        Ok(manifest)
    }

    /// Parse manifest text
    ///
    /// Blank lines are skipped, so an empty file is an empty manifest.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::InvalidEntry`] with the 1-based line number
    /// of the first malformed line.
    pub fn parse(contents: &str, format: ManifestFormat) -> Result<Self, Error> {
        let mut entries = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            if let Some(entry) = parse_line(index + 1, line, format)? {
                entries.push(entry);
            }
        }
        Ok(Self { format, entries })
    }

    #[must_use]
    pub fn format(&self) -> ManifestFormat {
        self.format
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Relative paths in manifest order, checksums stripped
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(Entry::relative_path)
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn parse_line(
    line_no: usize,
    line: &str,
    format: ManifestFormat,
) -> Result<Option<Entry>, ManifestError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let entry = match format {
        ManifestFormat::Plain => Entry::plain(trimmed),
        ManifestFormat::Checksummed => {
            let mut tokens = trimmed.split_whitespace();
            let checksum = tokens.next().unwrap_or_default();
            let Some(path) = tokens.next_back() else {
                return Err(ManifestError::InvalidEntry {
                    line: line_no,
                    reason: format!("expected `<checksum> <path>`, got `{trimmed}`"),
                });
            };
            Entry::checksummed(checksum, path)
        }
    };

    check_relative(line_no, entry.relative_path())?;
    Ok(Some(entry))
}

fn check_relative(line_no: usize, path: &str) -> Result<(), ManifestError> {
    let escapes = Path::new(path).components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(ManifestError::InvalidEntry {
            line: line_no,
            reason: format!("path must be relative without `..`: {path}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_plain() {
        let manifest = Manifest::parse("a.txt\nsub/b.txt\n", ManifestFormat::Plain).unwrap();
        assert_eq!(manifest.paths().collect::<Vec<_>>(), ["a.txt", "sub/b.txt"]);
        assert!(manifest.entries().iter().all(|e| e.checksum().is_none()));
    }

    #[test]
    fn test_parse_checksummed_uses_last_token() {
        let text = "d41d8cd98f00b204e9800998ecf8427e  a.txt\n\
                    0123456789abcdef0123456789abcdef\tsub/b.txt\r\n";
        let manifest = Manifest::parse(text, ManifestFormat::Checksummed).unwrap();
        assert_eq!(
            manifest.entries(),
            [
                Entry::checksummed("d41d8cd98f00b204e9800998ecf8427e", "a.txt"),
                Entry::checksummed("0123456789abcdef0123456789abcdef", "sub/b.txt"),
            ]
        );
    }

    #[test]
    fn test_whitespace_in_checksummed_path_keeps_last_token() {
        // documented limitation: only the final token survives
        let manifest =
            Manifest::parse("abc  my file.txt", ManifestFormat::Checksummed).unwrap();
        assert_eq!(manifest.entries()[0].relative_path(), "file.txt");
    }

    #[test]
    fn test_checksummed_line_without_checksum() {
        let err = Manifest::parse("abc  a.txt\nlonely.txt\n", ManifestFormat::Checksummed)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Manifest(ManifestError::InvalidEntry { line: 2, .. })
        ));
    }

    #[test]
    fn test_empty_and_blank_lines() {
        assert!(Manifest::parse("", ManifestFormat::Plain).unwrap().is_empty());
        let manifest = Manifest::parse("\n  \na.txt\n\n", ManifestFormat::Plain).unwrap();
        assert_eq!(manifest.len(), 1);
    }

    #[test]
    fn test_rejects_escaping_paths() {
        for bad in ["../etc/passwd", "/etc/passwd", "sub/../../x"] {
            assert!(Manifest::parse(bad, ManifestFormat::Plain).is_err(), "{bad}");
        }
        assert!(Manifest::parse("./a.txt", ManifestFormat::Plain).is_ok());
    }

    #[test]
    fn test_display_roundtrip_line() {
        let entry = Entry::checksummed("abc", "a.txt");
        assert_eq!(entry.to_string(), "abc  a.txt");
    }

    proptest! {
        #[test]
        fn prop_checksummed_entries_keep_order_and_checksums(
            rows in proptest::collection::vec(("[0-9a-f]{32}", "[a-z]{1,8}(/[a-z]{1,8}){0,2}"), 0..20)
        ) {
            let text: String = rows
                .iter()
                .map(|(sum, path)| format!("{sum}  {path}\n"))
                .collect();
            let manifest = Manifest::parse(&text, ManifestFormat::Checksummed).unwrap();
            prop_assert_eq!(manifest.len(), rows.len());
            for (entry, (sum, path)) in manifest.entries().iter().zip(&rows) {
                prop_assert_eq!(entry.checksum(), Some(sum.as_str()));
                prop_assert_eq!(entry.relative_path(), path.as_str());
            }
        }

        #[test]
        fn prop_plain_entries_have_no_checksum(
            paths in proptest::collection::vec("[a-z]{1,8}(/[a-z]{1,8}){0,2}", 0..20)
        ) {
            let manifest = Manifest::parse(&paths.join("\n"), ManifestFormat::Plain).unwrap();
            prop_assert_eq!(manifest.paths().collect::<Vec<_>>(), paths.iter().map(String::as_str).collect::<Vec<_>>());
            prop_assert!(manifest.entries().iter().all(|e| e.checksum().is_none()));
        }
    }
}
