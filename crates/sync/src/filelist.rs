//! Transient list of relative paths handed to the transfer backend

use mfsync_errors::{Error, SyncError};
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::fs;

const LIST_PREFIX: &str = "mfsync-list-";

/// Uniquely named temporary file holding one relative path per line.
///
/// The file is deleted when the value is dropped or closed, so every exit
/// path of a transfer removes it.
#[derive(Debug)]
pub struct TransferList {
    file: NamedTempFile,
    count: usize,
}

impl TransferList {
    /// Write `paths` to a fresh list file in `dir` (system temp dir if `None`)
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ListFileFailed`] if the file cannot be created or
    /// written.
    pub fn create<'a, I>(paths: I, dir: Option<&Path>) -> Result<Self, Error>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut builder = tempfile::Builder::new();
        builder.prefix(LIST_PREFIX).suffix(".txt");
        let file = match dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(list_error)?;

        let mut count = 0;
        {
            let mut writer = BufWriter::new(file.as_file());
            for path in paths {
                writeln!(writer, "{path}").map_err(list_error)?;
                count += 1;
            }
            writer.flush().map_err(list_error)?;
        }

        Ok(Self { file, count })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Delete the list file, reporting failure
    ///
    /// # Errors
    ///
    /// Returns an error if the file could not be removed.
    pub fn close(self) -> Result<(), Error> {
        self.file.close().map_err(list_error)
    }

    /// Read a list file back, skipping blank lines
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn read(path: &Path) -> Result<Vec<String>, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;
        Ok(contents
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

fn list_error(e: std::io::Error) -> Error {
    SyncError::ListFileFailed {
        message: e.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_roundtrip_and_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let list = TransferList::create(["a.txt", "sub/b.txt"], Some(dir.path())).unwrap();
        let path = list.path().to_path_buf();

        assert_eq!(list.len(), 2);
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(LIST_PREFIX));
        assert_eq!(
            TransferList::read(&path).await.unwrap(),
            ["a.txt", "sub/b.txt"]
        );

        list.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let list = TransferList::create(std::iter::empty(), Some(dir.path())).unwrap();
        let path = list.path().to_path_buf();
        assert!(list.is_empty());
        drop(list);
        assert!(!path.exists());
    }
}
