//! Durable id -> span index backed by an append-only log.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use crate::alloc::BlockSpan;
use crate::error::Result;
use crate::handles::{HandleCache, APPEND};

use super::record::{encode_line, parse_line};
use super::INDEX_LOG;

/// Outcome of an index replay.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplayStats {
    /// Records applied to the map
    pub records: usize,

    /// Malformed lines skipped
    pub skipped: usize,

    /// `(block, end)` of the last well-formed line in file order, if any;
    /// the allocator resumes from here
    pub restore: Option<(i64, i64)>,
}

/// In-memory id -> span map mirroring the `block_idx` log.
///
/// The log is the durable source of truth; the map is a cache that can
/// always be rebuilt from it and is the sole authority for serving reads.
pub struct IndexStore {
    map: RwLock<HashMap<String, BlockSpan>>,
    handles: Arc<HandleCache>,
}

impl IndexStore {
    pub fn new(handles: Arc<HandleCache>) -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
            handles,
        }
    }

    /// Append a record to the log, then publish it to the in-memory map.
    ///
    /// The map is only updated after the log write returned, so a reader
    /// can never observe an entry whose log line is not durable yet.
    pub fn append(&self, id: &str, span: BlockSpan) -> Result<()> {
        let line = encode_line(id, &span);
        self.handles.write_at(INDEX_LOG, line.as_bytes(), APPEND)?;

        self.map.write().insert(id.to_string(), span);
        Ok(())
    }

    /// Look up the span recorded for `id`.
    pub fn get(&self, id: &str) -> Option<BlockSpan> {
        self.map.read().get(id).copied()
    }

    /// Number of indexed ids.
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rebuild the map from the log.
    ///
    /// Creates the log file on first start. Malformed lines are counted and
    /// skipped rather than failing startup; a later line for the same id
    /// overrides an earlier one. The last well-formed line, in file order,
    /// becomes the allocator restore point.
    pub fn replay(&self) -> Result<ReplayStats> {
        // Also creates an empty log on first start; failing here is fatal
        // for the caller since no append can be made safe without the log.
        self.handles.open_or_create(INDEX_LOG, true)?;

        let content = self.handles.read_all(INDEX_LOG)?;
        let content = String::from_utf8_lossy(&content);

        let mut stats = ReplayStats::default();
        let mut map = self.map.write();
        map.clear();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match parse_line(line) {
                Some((id, span)) => {
                    map.insert(id, span);
                    stats.restore = Some((span.block, span.end));
                    stats.records += 1;
                }
                None => {
                    warn!(line, "skipping malformed index line");
                    stats.skipped += 1;
                }
            }
        }

        Ok(stats)
    }
}
