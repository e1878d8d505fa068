//! Engine Module
//!
//! The block-packed storage engine facade that coordinates all components.
//!
//! ## Responsibilities
//! - Derive or accept storage ids
//! - Orchestrate reserve -> block write -> log append for saves
//! - Serve reads from the recorded byte ranges
//! - Rebuild index and allocator state from the log on startup
//!
//! ## Concurrency Model
//!
//! - Space allocation is the single global critical section; it only
//!   computes offsets, no I/O happens under the allocator lock
//! - Block and log files are written under their own handle locks; writes
//!   exclude, reads share
//! - The in-memory index is published only after the log append returned,
//!   so every entry a reader can see is already durable

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use crate::alloc::BlockAllocator;
use crate::config::Config;
use crate::error::{Result, VaultError};
use crate::handles::HandleCache;
use crate::id;
use crate::index::IndexStore;
use crate::store::Storage;

/// The block-packed storage engine.
///
/// An engine instance owns one allocator and one index store, and shares
/// one handle cache across all block and log accesses. Construct it with a
/// base directory and pass it by reference to all callers; independent
/// instances over different directories are fully isolated.
pub struct Engine {
    config: Config,
    allocator: BlockAllocator,
    handles: Arc<HandleCache>,
    index: IndexStore,
}

impl Engine {
    /// Open or create an engine rooted at the configured base directory.
    ///
    /// On startup:
    /// 1. Create the base directory
    /// 2. Replay the index log into the in-memory map
    /// 3. Restore the allocator from the last replayed record
    ///
    /// Failure to create the base directory or the log file aborts here;
    /// nothing can be made safe without them.
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.base_dir)?;

        let handles = Arc::new(HandleCache::new(
            &config.base_dir,
            config.idle_timeout,
            config.sweep_interval,
        )?);

        let allocator = BlockAllocator::new(config.block_size as i64);
        let index = IndexStore::new(Arc::clone(&handles));

        let stats = index.replay()?;
        if stats.records > 0 || stats.skipped > 0 {
            info!(
                records = stats.records,
                skipped = stats.skipped,
                "index log replayed"
            );
        }
        if let Some((block, end)) = stats.restore {
            allocator.restore(block, end);
        }

        Ok(Self {
            config,
            allocator,
            handles,
            index,
        })
    }

    /// Store `data` under a freshly generated id and return that id.
    pub fn write(&self, data: &[u8]) -> Result<String> {
        let id = id::random_id();
        self.write_with_id(&id, data)?;
        Ok(id)
    }

    /// Store `data` under the given id.
    ///
    /// The caller is responsible for id uniqueness. Writing an id twice
    /// appends a fresh record and the newer one wins on lookup, while the
    /// earlier payload's space is never reclaimed.
    pub fn write_with_id(&self, id: &str, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Err(VaultError::EmptyPayload);
        }
        if data.len() as u64 > self.config.block_size {
            return Err(VaultError::PayloadTooLarge {
                len: data.len() as u64,
                max: self.config.block_size,
            });
        }

        // 1. Reserve a disjoint range (offset arithmetic only)
        let span = self.allocator.reserve(data.len() as i64);

        // 2. Write the payload into the block at the reserved offset
        let block = block_file_name(span.block);
        self.handles.write_at(&block, data, span.start)?;

        // 3. Make the record durable, then publish it
        self.index.append(id, span)?;

        Ok(())
    }

    /// Read back the payload stored under `id`.
    ///
    /// The whole payload is materialized in memory; this engine does not
    /// stream.
    pub fn read(&self, id: &str) -> Result<Bytes> {
        let span = self.index.get(id).ok_or(VaultError::NotFound)?;

        let block = block_file_name(span.block);
        let data = self
            .handles
            .read_at(&block, span.start, span.len() as usize)?;

        Ok(Bytes::from(data))
    }

    /// Close every cached file handle and stop the background sweeper.
    ///
    /// For clean shutdown; files reopen on demand if the engine is used
    /// again afterwards.
    pub fn release_handles(&self) {
        self.handles.release_all();
    }

    // =========================================================================
    // Accessors (for testing and diagnostics)
    // =========================================================================

    /// Base directory holding blocks and the index log
    pub fn base_dir(&self) -> &Path {
        &self.config.base_dir
    }

    /// Configured block capacity in bytes
    pub fn block_size(&self) -> u64 {
        self.config.block_size
    }

    /// Number of ids currently indexed
    pub fn indexed_ids(&self) -> usize {
        self.index.len()
    }

    /// Number of file handles currently open
    pub fn open_handles(&self) -> usize {
        self.handles.open_handles()
    }

    /// Current allocator `(block, cursor)` position
    pub fn allocator_position(&self) -> (i64, i64) {
        self.allocator.position()
    }
}

impl Storage for Engine {
    /// Buffer the stream and store it under an id derived from `key`.
    fn save(&self, key: &str, data: &mut dyn Read) -> Result<String> {
        let mut buf = Vec::new();
        data.read_to_end(&mut buf)?;

        let id = id::storage_id(key);
        self.write_with_id(&id, &buf)?;
        Ok(id)
    }

    /// The payload is fully materialized before the reader is handed out.
    fn open(&self, id: &str) -> Result<Box<dyn Read + Send>> {
        let data = self.read(id)?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn delete(&self, _id: &str) -> Result<()> {
        Err(VaultError::Unsupported("delete"))
    }

    fn exists(&self, _id: &str) -> Result<bool> {
        Err(VaultError::Unsupported("exists"))
    }
}

/// Data file name for a block index: `block_<N>`
fn block_file_name(block: i64) -> String {
    format!("block_{}", block)
}
