//! File-backed journal for persistent stores.

use crate::backend::JournalBackend;
use crate::error::{StoreError, StoreResult};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A journal stored in a single file on disk.
///
/// The file is opened for appending and locked exclusively for the
/// lifetime of the handle; a second process opening the same path fails
/// with [`StoreError::Locked`]. An optional POSIX mode is applied to
/// newly created files on Unix platforms.
///
/// `flush` pushes buffered bytes to the OS; `sync` additionally forces
/// them onto the disk before returning.
#[derive(Debug)]
pub struct FileJournal {
    path: PathBuf,
    file: File,
    len: u64,
}

impl FileJournal {
    /// Opens or creates the journal file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Locked`] when another process holds the
    /// file lock, or an I/O error if the file cannot be opened.
    pub fn open(path: &Path, mode: Option<u32>) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        file.try_lock_exclusive().map_err(|_| StoreError::Locked {
            path: path.to_path_buf(),
        })?;

        #[cfg(unix)]
        if let Some(mode) = mode {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(mode))?;
        }
        #[cfg(not(unix))]
        let _ = mode;

        let len = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            len,
        })
    }

    /// Returns the path of the journal file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl JournalBackend for FileJournal {
    fn append(&mut self, bytes: &[u8]) -> StoreResult<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(bytes)?;
        self.len += bytes.len() as u64;
        Ok(())
    }

    fn read_all(&self) -> StoreResult<Vec<u8>> {
        let mut reader = &self.file;
        reader.seek(SeekFrom::Start(0))?;
        let mut buf = Vec::with_capacity(self.len as usize);
        reader.read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn flush(&mut self) -> StoreResult<()> {
        self.file.flush()?;
        Ok(())
    }

    fn sync(&mut self) -> StoreResult<()> {
        self.file.sync_data()?;
        Ok(())
    }

    fn reset(&mut self) -> StoreResult<()> {
        self.file.set_len(0)?;
        self.file.sync_all()?;
        self.len = 0;
        Ok(())
    }

    fn len(&self) -> StoreResult<u64> {
        Ok(self.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_and_append() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.db");

        let mut journal = FileJournal::open(&path, None).unwrap();
        assert_eq!(journal.len().unwrap(), 0);

        journal.append(b"one").unwrap();
        journal.append(b"two").unwrap();
        assert_eq!(journal.len().unwrap(), 6);
        assert_eq!(journal.read_all().unwrap(), b"onetwo");
    }

    #[test]
    fn survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.db");

        {
            let mut journal = FileJournal::open(&path, None).unwrap();
            journal.append(b"durable").unwrap();
            journal.sync().unwrap();
        }

        let journal = FileJournal::open(&path, None).unwrap();
        assert_eq!(journal.read_all().unwrap(), b"durable");
    }

    #[test]
    fn second_opener_fails_locked() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.db");

        let _held = FileJournal::open(&path, None).unwrap();
        let result = FileJournal::open(&path, None);
        assert!(matches!(result, Err(StoreError::Locked { .. })));
    }

    #[test]
    fn reset_discards_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.db");

        let mut journal = FileJournal::open(&path, None).unwrap();
        journal.append(b"stale").unwrap();
        journal.reset().unwrap();

        assert_eq!(journal.len().unwrap(), 0);
        assert!(journal.read_all().unwrap().is_empty());
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("catalog.db");

        let journal = FileJournal::open(&path, None).unwrap();
        assert!(path.exists());
        assert_eq!(journal.path(), path);
    }

    #[cfg(unix)]
    #[test]
    fn applies_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.db");

        let _journal = FileJournal::open(&path, Some(0o600)).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
