//! Plain filesystem backend: one file per object.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::error::{Result, VaultError};

use super::Storage;

/// Stores each payload as its own file under a base directory.
///
/// The id returned by `save` is the full path of the written file; `open`,
/// `delete` and `exists` take that path back.
pub struct LocalStorage {
    base_dir: PathBuf,
}

impl LocalStorage {
    /// Create the backend, ensuring the base directory exists.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Conventional stored name for an upload: `<prefix>_<file name>`.
    pub fn stored_name(prefix: &str, filename: &str) -> String {
        let base = Path::new(filename)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string());
        format!("{}_{}", prefix, base)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl Storage for LocalStorage {
    fn save(&self, key: &str, data: &mut dyn Read) -> Result<String> {
        let full = self.base_dir.join(key);
        if let Some(dir) = full.parent() {
            fs::create_dir_all(dir)?;
        }

        let mut out = File::create(&full)?;
        io::copy(data, &mut out)?;

        Ok(full.to_string_lossy().into_owned())
    }

    fn open(&self, id: &str) -> Result<Box<dyn Read + Send>> {
        let file = File::open(id).map_err(missing_as_not_found)?;
        Ok(Box::new(file))
    }

    fn delete(&self, id: &str) -> Result<()> {
        fs::remove_file(id).map_err(missing_as_not_found)?;
        Ok(())
    }

    fn exists(&self, id: &str) -> Result<bool> {
        match fs::metadata(id) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Fold the missing-file case into the error kind callers branch on.
fn missing_as_not_found(e: io::Error) -> VaultError {
    if e.kind() == io::ErrorKind::NotFound {
        VaultError::NotFound
    } else {
        VaultError::Io(e)
    }
}
