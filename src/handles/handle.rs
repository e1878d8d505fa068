//! A single cached file handle.

use std::fs::File;
use std::io::{self, Write};
use std::os::unix::fs::FileExt;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock, RwLockWriteGuard};

use crate::error::Result;

/// One open descriptor plus its access bookkeeping.
///
/// The file lock is the unit of I/O exclusion: reads take it shared, writes
/// and eviction take it exclusive. The access time is updated after every
/// completed operation and drives idle eviction.
pub(crate) struct FileHandle {
    file: RwLock<File>,
    last_access: Mutex<Instant>,
}

impl FileHandle {
    pub(crate) fn new(file: File) -> Self {
        Self {
            file: RwLock::new(file),
            last_access: Mutex::new(Instant::now()),
        }
    }

    /// Append `data` at end-of-file and flush it to stable storage.
    ///
    /// The underlying file must have been opened in append mode.
    pub(crate) fn append(&self, data: &[u8]) -> Result<()> {
        {
            let file = self.file.write();
            let mut out = &*file;
            out.write_all(data)?;
            file.sync_data()?;
        }
        self.touch();
        Ok(())
    }

    /// Write `data` at `offset` and flush it to stable storage.
    pub(crate) fn write_at(&self, data: &[u8], offset: u64) -> Result<()> {
        {
            let file = self.file.write();
            file.write_all_at(data, offset)?;
            file.sync_data()?;
        }
        self.touch();
        Ok(())
    }

    /// Read up to `size` bytes at `offset`.
    ///
    /// Stops at end-of-file: the returned buffer may be shorter than `size`
    /// and callers must not assume the full length came back.
    pub(crate) fn read_at(&self, offset: u64, size: usize) -> Result<Vec<u8>> {
        let buf = {
            let file = self.file.read();
            read_range(&file, offset, size)?
        };
        self.touch();
        Ok(buf)
    }

    /// Read the whole file from offset zero.
    pub(crate) fn read_all(&self) -> Result<Vec<u8>> {
        let buf = {
            let file = self.file.read();
            let len = file.metadata()?.len() as usize;
            read_range(&file, 0, len)?
        };
        self.touch();
        Ok(buf)
    }

    /// Time since the last completed operation on this handle.
    pub(crate) fn idle_for(&self) -> Duration {
        self.last_access.lock().elapsed()
    }

    /// Try to take exclusive access without blocking.
    ///
    /// Used by the sweeper: holding the guard excludes all in-flight I/O, so
    /// the descriptor can be dropped safely.
    pub(crate) fn try_exclusive(&self) -> Option<RwLockWriteGuard<'_, File>> {
        self.file.try_write()
    }

    fn touch(&self) {
        *self.last_access.lock() = Instant::now();
    }
}

/// Positioned read loop: fills `buf` until `size` bytes or end-of-file.
fn read_range(file: &File, offset: u64, size: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; size];
    let mut filled = 0;

    while filled < size {
        match file.read_at(&mut buf[filled..], offset + filled as u64) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    buf.truncate(filled);
    Ok(buf)
}
