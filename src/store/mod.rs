//! Storage Module
//!
//! The service-facing storage abstraction. Backends persist opaque byte
//! payloads under string ids; the surrounding application treats the id as
//! an opaque handle for later reads.
//!
//! Two backends exist:
//! - [`crate::engine::Engine`] — the block-packed engine (this crate's core)
//! - [`LocalStorage`] — one plain file per object, for simple deployments

mod local;

pub use local::LocalStorage;

use std::io::Read;

use crate::error::Result;

/// Uniform interface over storage backends.
///
/// Not every backend supports every operation; unsupported calls return
/// [`crate::error::VaultError::Unsupported`] rather than panicking, so the
/// caller decides whether that is fatal.
pub trait Storage {
    /// Persist everything `data` yields and return the id for later reads.
    fn save(&self, key: &str, data: &mut dyn Read) -> Result<String>;

    /// Open the payload stored under `id` for reading.
    fn open(&self, id: &str) -> Result<Box<dyn Read + Send>>;

    /// Remove the payload stored under `id`.
    fn delete(&self, id: &str) -> Result<()>;

    /// Whether a payload is stored under `id`.
    fn exists(&self, id: &str) -> Result<bool>;
}
