//! Path -> handle cache with idle eviction.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::Result;

use super::handle::FileHandle;
use super::APPEND;

/// State shared between the cache front-end and the sweeper thread.
struct CacheInner {
    base_dir: PathBuf,
    handles: Mutex<HashMap<PathBuf, Arc<FileHandle>>>,
    idle_timeout: Duration,
}

/// The background sweeper: stop signal plus the thread to join.
struct SweeperTask {
    stop: Sender<()>,
    thread: JoinHandle<()>,
}

/// Bounded set of open file handles, keyed by path under a base directory.
///
/// Handles are created lazily on first access and die either through idle
/// eviction or [`HandleCache::release_all`]. Callers never hold raw
/// descriptors; all I/O goes through the cache.
pub struct HandleCache {
    inner: Arc<CacheInner>,
    sweeper: Mutex<Option<SweeperTask>>,
}

impl HandleCache {
    /// Create a cache rooted at `base_dir` and start its sweeper thread.
    pub fn new(
        base_dir: impl Into<PathBuf>,
        idle_timeout: Duration,
        sweep_interval: Duration,
    ) -> Result<Self> {
        let inner = Arc::new(CacheInner {
            base_dir: base_dir.into(),
            handles: Mutex::new(HashMap::new()),
            idle_timeout,
        });

        let (stop_tx, stop_rx) = channel::bounded(1);
        let sweep_inner = Arc::clone(&inner);
        let thread = std::thread::Builder::new()
            .name("blockvault-sweeper".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(sweep_interval) {
                    Err(RecvTimeoutError::Timeout) => sweep(&sweep_inner),
                    _ => break,
                }
            })?;

        Ok(Self {
            inner,
            sweeper: Mutex::new(Some(SweeperTask {
                stop: stop_tx,
                thread,
            })),
        })
    }

    /// Return the cached handle for `name`, opening the file if needed.
    ///
    /// Parent directories are created on demand. `append` selects append
    /// mode (all writes land at end-of-file) over random access; it only
    /// matters for the first open of a given path.
    pub(crate) fn open_or_create(&self, name: &str, append: bool) -> Result<Arc<FileHandle>> {
        let path = self.inner.base_dir.join(name);

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let mut handles = self.inner.handles.lock();
        if let Some(handle) = handles.get(&path) {
            return Ok(Arc::clone(handle));
        }

        let mut options = OpenOptions::new();
        options.read(true).create(true);
        if append {
            options.append(true);
        } else {
            options.write(true);
        }
        let file = options.open(&path)?;

        let handle = Arc::new(FileHandle::new(file));
        handles.insert(path, Arc::clone(&handle));
        Ok(handle)
    }

    /// Write `data` into the file called `name`.
    ///
    /// An `offset` of [`APPEND`] appends at end-of-file (used for the index
    /// log); any other value is a positioned write at that byte offset (used
    /// for block payloads). The data is flushed to stable storage before
    /// this returns.
    pub fn write_at(&self, name: &str, data: &[u8], offset: i64) -> Result<()> {
        if offset == APPEND {
            let handle = self.open_or_create(name, true)?;
            handle.append(data)
        } else {
            assert!(offset >= 0, "positioned write with negative offset");
            let handle = self.open_or_create(name, false)?;
            handle.write_at(data, offset as u64)
        }
    }

    /// Read up to `size` bytes at `offset` from the file called `name`.
    ///
    /// Short reads at end-of-file are returned as-is, not treated as errors.
    pub fn read_at(&self, name: &str, offset: i64, size: usize) -> Result<Vec<u8>> {
        assert!(offset >= 0, "read with negative offset");
        let handle = self.open_or_create(name, false)?;
        handle.read_at(offset as u64, size)
    }

    /// Read the whole file called `name` from offset zero.
    pub fn read_all(&self, name: &str) -> Result<Vec<u8>> {
        let handle = self.open_or_create(name, false)?;
        handle.read_all()
    }

    /// Number of handles currently open, for tests and diagnostics.
    pub fn open_handles(&self) -> usize {
        self.inner.handles.lock().len()
    }

    /// Stop the sweeper and drop every cached handle.
    ///
    /// Meant for clean shutdown rather than steady-state use; the cache
    /// still reopens files on demand afterwards.
    pub fn release_all(&self) {
        if let Some(task) = self.sweeper.lock().take() {
            let _ = task.stop.send(());
            let _ = task.thread.join();
        }

        let mut handles = self.inner.handles.lock();
        let released = handles.len();
        handles.clear();
        drop(handles);

        if released > 0 {
            info!(released, "released all file handles");
        }
    }
}

impl Drop for HandleCache {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// One pass over the handle table: close everything idle past the timeout.
///
/// A handle with in-flight I/O fails the `try_exclusive` probe and is left
/// for a later pass; its recent access time would keep it alive anyway.
fn sweep(inner: &CacheInner) {
    let mut handles = inner.handles.lock();
    handles.retain(|path, handle| {
        if handle.idle_for() <= inner.idle_timeout {
            return true;
        }
        match handle.try_exclusive() {
            Some(_guard) => {
                debug!(path = %path.display(), "closing idle file handle");
                false
            }
            None => true,
        }
    });
}
