//! Configuration for BlockVault
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

/// Default capacity of one block file: 10 MiB of payload content.
pub const DEFAULT_BLOCK_SIZE: u64 = 10 * 1024 * 1024;

/// Main configuration for a BlockVault engine instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files.
    /// Internal structure:
    ///   {base_dir}/
    ///     ├── block_0, block_1, ...   (payload blocks)
    ///     └── block_idx               (index log)
    pub base_dir: PathBuf,

    /// Capacity of one block file in bytes. A payload never spans two
    /// blocks, so this is also the largest payload the engine accepts.
    pub block_size: u64,

    // -------------------------------------------------------------------------
    // Handle Cache Configuration
    // -------------------------------------------------------------------------
    /// How long a file handle may sit unused before the sweeper closes it
    pub idle_timeout: Duration,

    /// How often the sweeper scans the handle table
    pub sweep_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("./blockvault_data"),
            block_size: DEFAULT_BLOCK_SIZE,
            idle_timeout: Duration::from_secs(10 * 60),
            sweep_interval: Duration::from_secs(5),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the base directory (root for blocks and the index log)
    pub fn base_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.base_dir = path.into();
        self
    }

    /// Set the block capacity in bytes
    pub fn block_size(mut self, bytes: u64) -> Self {
        self.config.block_size = bytes;
        self
    }

    /// Set the handle idle timeout
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Set the sweeper scan interval
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = interval;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
