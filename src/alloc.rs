//! Block space allocator
//!
//! Hands out disjoint byte ranges inside fixed-capacity block files. Every
//! reservation goes through a single mutex; that critical section only
//! computes offsets, so it stays short even under heavy write contention.

use parking_lot::Mutex;

/// Location of one stored payload: a byte range inside a block file.
///
/// `start` is inclusive, `end` exclusive, both relative to the beginning of
/// the block file. Spans are immutable once handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    /// Sequential index of the block file (`block_<N>`)
    pub block: i64,
    /// First byte of the range
    pub start: i64,
    /// One past the last byte of the range
    pub end: i64,
}

impl BlockSpan {
    /// Length of the range in bytes
    pub fn len(&self) -> i64 {
        self.end - self.start
    }
}

/// Which block is current and how far it is filled.
struct AllocState {
    /// Index of the block currently being filled
    block: i64,
    /// Index of the last allocated byte in that block, -1 if none
    cursor: i64,
}

/// Hands out disjoint spans across a sequence of fixed-capacity blocks.
///
/// This is the single synchronization point that makes concurrent writers
/// safe: two `reserve` calls never return overlapping ranges, within a block
/// or across blocks, for the lifetime of the process.
pub struct BlockAllocator {
    state: Mutex<AllocState>,
    block_size: i64,
}

impl BlockAllocator {
    /// Create an allocator positioned at the start of block 0.
    pub fn new(block_size: i64) -> Self {
        assert!(block_size > 0, "block size must be positive");

        Self {
            state: Mutex::new(AllocState {
                block: 0,
                cursor: -1,
            }),
            block_size,
        }
    }

    /// Reserve `n` bytes and return the span they occupy.
    ///
    /// When the current block cannot fit `n` more bytes the allocator moves
    /// to a fresh block; a span never crosses a block boundary, even though
    /// that wastes the tail of the previous block.
    pub fn reserve(&self, n: i64) -> BlockSpan {
        assert!(n > 0, "reservation must cover at least one byte");
        assert!(
            n <= self.block_size,
            "reservation of {} bytes larger than a block",
            n
        );

        let mut state = self.state.lock();

        // cursor is the last used index, so `cursor + n` is the index the
        // final byte would land on
        if state.cursor + n > self.block_size - 1 {
            state.block += 1;
            state.cursor = -1;
        }

        let start = state.cursor + 1;
        let end = start + n;
        state.cursor = end - 1;

        BlockSpan {
            block: state.block,
            start,
            end,
        }
    }

    /// Restore the write position after an index replay.
    ///
    /// `last_end` is the exclusive end offset of the last record found in
    /// the log, in file order. Called exactly once at startup, before any
    /// `reserve`.
    pub fn restore(&self, block: i64, last_end: i64) {
        let mut state = self.state.lock();
        state.block = block;
        state.cursor = last_end - 1;
    }

    /// Current `(block, cursor)` pair, for tests and diagnostics.
    pub fn position(&self) -> (i64, i64) {
        let state = self.state.lock();
        (state.block, state.cursor)
    }
}
