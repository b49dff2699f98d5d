//! Storage: the edited file and its backup.
//!
//! Edits never touch the file directly. `W` appends finished lines to a
//! backup file next to it (the path plus a suffix, `~` by default), `E`
//! appends the rest and renames the backup over the file, and `Q` deletes
//! the backup. A backup left behind by an earlier session is removed at
//! startup, before any new lines go into it.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::buffer::{Line, LineBuffer};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A failed file operation. Each one ends the session.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("open {} failed", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("create {} failed", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("read {} failed", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("write {} failed", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("save {} failed", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("remove backup {} failed", path.display())]
    RemoveBackup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// What [`Storage::load`] found.
#[derive(Debug)]
pub enum Loaded {
    /// The file existed; here are its lines.
    Existing(LineBuffer),
    /// The file did not exist and was created empty.
    Created,
}

/// The file being edited and its backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Storage {
    path: PathBuf,
    backup: PathBuf,
}

impl Storage {
    /// Storage for `path`, backing up to `path` + `suffix`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, suffix: &str) -> Self {
        let path = path.into();
        let mut backup = OsString::from(path.as_os_str());
        backup.push(suffix);
        Self {
            path,
            backup: PathBuf::from(backup),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn backup(&self) -> &Path {
        &self.backup
    }

    /// Read the file, or create it empty if it does not exist.
    ///
    /// # Errors
    ///
    /// [`StorageError::Open`] for any open failure other than a missing
    /// file, [`StorageError::Create`] if the missing file cannot be created,
    /// and [`StorageError::Read`] if reading fails part way.
    pub fn load(&self) -> Result<Loaded, StorageError> {
        match File::open(&self.path) {
            Ok(file) => {
                let buffer =
                    LineBuffer::read_from(BufReader::new(file)).map_err(|source| StorageError::Read {
                        path: self.path.clone(),
                        source,
                    })?;
                debug!(path = %self.path.display(), lines = buffer.len(), "loaded");
                Ok(Loaded::Existing(buffer))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                File::create(&self.path).map_err(|source| StorageError::Create {
                    path: self.path.clone(),
                    source,
                })?;
                debug!(path = %self.path.display(), "created");
                Ok(Loaded::Created)
            }
            Err(source) => Err(StorageError::Open {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Delete a backup left by an earlier session. Returns whether one was
    /// there.
    ///
    /// # Errors
    ///
    /// [`StorageError::RemoveBackup`] if it exists but cannot be removed.
    pub fn remove_stale_backup(&self) -> Result<bool, StorageError> {
        match fs::remove_file(&self.backup) {
            Ok(()) => {
                debug!(path = %self.backup.display(), "removed stale backup");
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StorageError::RemoveBackup {
                path: self.backup.clone(),
                source,
            }),
        }
    }

    /// Append `lines` to the backup, each followed by `\n`. The backup is
    /// created (owner and group read/write) if needed, even for no lines.
    ///
    /// # Errors
    ///
    /// [`StorageError::Write`] if the backup cannot be opened or written.
    pub fn append(&self, lines: &[Line]) -> Result<(), StorageError> {
        let write_err = |source: io::Error| StorageError::Write {
            path: self.backup.clone(),
            source,
        };

        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o660);
        }

        let file = options.open(&self.backup).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        for line in lines {
            writer.write_all(line).map_err(write_err)?;
            writer.write_all(b"\n").map_err(write_err)?;
        }
        writer.flush().map_err(write_err)?;
        debug!(path = %self.backup.display(), lines = lines.len(), "appended");
        Ok(())
    }

    /// Replace the file with the backup.
    ///
    /// # Errors
    ///
    /// [`StorageError::Save`] if the rename fails.
    pub fn finalize(&self) -> Result<(), StorageError> {
        fs::rename(&self.backup, &self.path).map_err(|source| StorageError::Save {
            path: self.path.clone(),
            source,
        })
    }

    /// Throw the backup away, leaving the file as it was. A missing backup
    /// is fine.
    ///
    /// # Errors
    ///
    /// [`StorageError::RemoveBackup`] if it exists but cannot be removed.
    pub fn discard(&self) -> Result<(), StorageError> {
        self.remove_stale_backup().map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn storage_in(dir: &TempDir) -> Storage {
        Storage::new(dir.path().join("notes.txt"), "~")
    }

    fn lines(text: &[&str]) -> Vec<Line> {
        text.iter().map(|s| s.as_bytes().to_vec()).collect()
    }

    #[test]
    fn backup_path_appends_suffix() {
        let storage = Storage::new("/tmp/a.txt", "~");
        assert_eq!(storage.backup(), Path::new("/tmp/a.txt~"));
        let storage = Storage::new("b", ".bak");
        assert_eq!(storage.backup(), Path::new("b.bak"));
    }

    #[test]
    fn load_existing_file() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        fs::write(storage.path(), "one\ntwo\r\nthree").unwrap();

        let Loaded::Existing(buffer) = storage.load().unwrap() else {
            panic!("expected existing file");
        };
        assert_eq!(buffer.lines(), lines(&["one", "two", "three"]).as_slice());
        assert!(!buffer.is_dirty());
    }

    #[test]
    fn load_missing_file_creates_it() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);

        assert!(matches!(storage.load().unwrap(), Loaded::Created));
        assert!(storage.path().exists());
        assert_eq!(fs::read(storage.path()).unwrap(), b"");
    }

    #[test]
    fn load_in_missing_directory_fails_to_create() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("nope").join("f.txt"), "~");
        assert!(matches!(storage.load(), Err(StorageError::Create { .. })));
    }

    #[test]
    fn load_directory_fails_to_read() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path(), "~");
        let err = storage.load().unwrap_err();
        assert!(matches!(err, StorageError::Read { .. } | StorageError::Open { .. }));
    }

    #[test]
    fn append_accumulates() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);

        storage.append(&lines(&["a", "b"])).unwrap();
        storage.append(&lines(&["c"])).unwrap();
        assert_eq!(fs::read(storage.backup()).unwrap(), b"a\nb\nc\n");
    }

    #[test]
    fn append_nothing_still_creates_backup() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        storage.append(&[]).unwrap();
        assert!(storage.backup().exists());
    }

    #[cfg(unix)]
    #[test]
    fn backup_is_created_group_writable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        storage.append(&lines(&["x"])).unwrap();
        let mode = fs::metadata(storage.backup()).unwrap().permissions().mode();
        // umask may strip bits but never adds any.
        assert_eq!(mode & 0o777 & !0o660, 0);
    }

    #[test]
    fn finalize_replaces_file() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        fs::write(storage.path(), "old\n").unwrap();

        storage.append(&lines(&["new"])).unwrap();
        storage.finalize().unwrap();
        assert_eq!(fs::read(storage.path()).unwrap(), b"new\n");
        assert!(!storage.backup().exists());
    }

    #[test]
    fn finalize_without_backup_fails() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        assert!(matches!(storage.finalize(), Err(StorageError::Save { .. })));
    }

    #[test]
    fn discard_removes_backup_and_keeps_file() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        fs::write(storage.path(), "keep\n").unwrap();
        storage.append(&lines(&["gone"])).unwrap();

        storage.discard().unwrap();
        assert!(!storage.backup().exists());
        assert_eq!(fs::read(storage.path()).unwrap(), b"keep\n");
        storage.discard().unwrap();
    }

    #[test]
    fn stale_backup_is_removed() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        fs::write(storage.backup(), "stale\n").unwrap();

        assert!(storage.remove_stale_backup().unwrap());
        assert!(!storage.backup().exists());
        assert!(!storage.remove_stale_backup().unwrap());
    }

    #[test]
    fn errors_name_the_operation_and_path() {
        let storage = Storage::new("/no/such/dir/f", "~");
        let err = storage.finalize().unwrap_err();
        assert_eq!(err.to_string(), "save /no/such/dir/f failed");
    }
}
