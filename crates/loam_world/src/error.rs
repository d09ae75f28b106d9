//! # World Error Types
//!
//! Errors that can cross the store/scheduler boundary. Chunk-level problems
//! (unknown labels, bad records) never surface here - they are logged and
//! skipped where they occur, so the tick loop always completes.

use thiserror::Error;

/// Errors from world persistence and configuration.
#[derive(Error, Debug)]
pub enum WorldError {
    /// Disk I/O failed (save/load/delete).
    #[error("world i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// Save file decompressed but did not parse as world data.
    #[error("corrupt world data: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Save file envelope could not be decompressed.
    #[error("corrupt world envelope: {0}")]
    Decompress(#[from] lz4_flex::block::DecompressError),

    /// World config file was present but malformed.
    #[error("invalid world config: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type for world operations.
pub type WorldResult<T> = Result<T, WorldError>;
