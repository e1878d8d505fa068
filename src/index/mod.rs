//! Index Module
//!
//! Durable id -> location index: an append-only text log plus the
//! in-memory map rebuilt from it at startup.
//!
//! ## Log Format
//! ```text
//! <id>:<blockIndex>:<start>:<end>\n
//! ```
//! One record per line, integers in decimal, `start` inclusive, `end`
//! exclusive. The log is never rewritten in place; re-appending an id
//! overrides the earlier record at replay (last occurrence wins), though
//! the earlier record's block space is never reclaimed.

mod record;
mod store;

pub use store::{IndexStore, ReplayStats};

/// Name of the index log file under the base directory.
pub const INDEX_LOG: &str = "block_idx";
