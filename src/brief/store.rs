use crate::error::StoreError;
use fs2::FileExt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub type UpdateFn<'a> = dyn FnMut(Option<&str>) -> Result<String, StoreError> + 'a;

/// Key-addressed store shared by every process on the machine.
///
/// A single `write` is atomic and durable once it returns. Nothing spans
/// two keys: concurrent writers to different keys never see each other's
/// ordering, and the last writer per key wins.
pub trait KeyValueStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Read-modify-write of one key. Returns the value that was written.
    fn update(&self, key: &str, f: &mut UpdateFn<'_>) -> Result<String, StoreError> {
        let current = self.read(key)?;
        let next = f(current.as_deref())?;
        self.write(key, &next)?;
        Ok(next)
    }
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn lock_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!(".{key}.lock"))
    }

    fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|err| io_error(&self.dir, err))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        let path = self.value_path(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(&path, err)),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.ensure_dir()?;
        let path = self.value_path(key);

        // Same directory so the rename never crosses a filesystem boundary.
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|err| io_error(&self.dir, err))?;
        tmp.write_all(value.as_bytes())
            .map_err(|err| io_error(tmp.path(), err))?;
        tmp.as_file()
            .sync_all()
            .map_err(|err| io_error(tmp.path(), err))?;
        tmp.persist(&path).map_err(|err| io_error(&path, err.error))?;
        Ok(())
    }

    fn update(&self, key: &str, f: &mut UpdateFn<'_>) -> Result<String, StoreError> {
        validate_key(key)?;
        self.ensure_dir()?;
        let lock_path = self.lock_path(key);
        let lock = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|err| io_error(&lock_path, err))?;
        FileExt::lock_exclusive(&lock).map_err(|err| io_error(&lock_path, err))?;

        let result = self
            .read(key)
            .and_then(|current| f(current.as_deref()))
            .and_then(|next| self.write(key, &next).map(|()| next));

        let _ = FileExt::unlock(&lock);
        result
    }
}
