//! Handle Cache Module
//!
//! Keeps one open file descriptor per block/log file and evicts handles
//! that have been idle too long.
//!
//! ## Responsibilities
//! - Open (and create) block and log files on first access
//! - Positioned and append writes, flushed to stable storage before return
//! - Positioned reads that tolerate short reads at end-of-file
//! - Idle-based eviction via a single background sweeper thread
//!
//! ## Concurrency
//! - One RwLock per handle: reads share, writes exclude
//! - The cache-level mutex only guards the path -> handle map
//! - The sweeper takes a handle's write lock before closing it, so a handle
//!   is never closed mid-operation

mod handle;
mod cache;

pub use cache::HandleCache;

/// Offset value that selects append semantics in [`HandleCache::write_at`].
pub const APPEND: i64 = -1;
