//! # BlockVault
//!
//! An embedded block-packed binary storage engine with:
//! - Many payloads packed into large fixed-capacity block files
//! - A durable append-only index log replayed on startup
//! - Atomic space allocation shared across concurrent writers
//! - A bounded cache of open file handles with idle eviction
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  Storage trait                  │
//! │           (save / open / delete / exists)       │
//! └───────────────────────┬─────────────────────────┘
//!                         │
//! ┌───────────────────────▼─────────────────────────┐
//! │                     Engine                      │
//! │        reserve -> block write -> log append     │
//! └───────┬───────────────┬─────────────────┬───────┘
//!         │               │                 │
//!         ▼               ▼                 ▼
//!  ┌────────────┐  ┌─────────────┐  ┌─────────────┐
//!  │ Allocator  │  │ HandleCache │  │ IndexStore  │
//!  │  (Mutex)   │  │ (RwLock per │  │ (log + map) │
//!  │            │  │   handle)   │  │             │
//!  └────────────┘  └──────┬──────┘  └─────────────┘
//!                         │
//!                         ▼
//!              block_0  block_1  ...  block_idx
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod alloc;
pub mod handles;
pub mod id;
pub mod index;
pub mod store;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, VaultError};
pub use config::Config;
pub use engine::Engine;
pub use store::{LocalStorage, Storage};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of BlockVault
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
