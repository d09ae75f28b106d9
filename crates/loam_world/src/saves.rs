//! # Save Browser Support
//!
//! Enumerates and deletes worlds in a saves directory, for the
//! world-selection menu. Enumeration reads only each file's metadata block;
//! a save that cannot be read is skipped with a warning so one bad file
//! never empties the list.

use std::fs;
use std::path::{Path, PathBuf};

use lz4_flex::decompress_size_prepended;
use serde::Deserialize;

use crate::error::WorldResult;
use crate::store::{WorldMetadata, BACKUP_EXTENSION, SAVE_EXTENSION};

/// One row of the world-selection menu.
#[derive(Clone, Debug)]
pub struct SaveSummary {
    /// World display name.
    pub world_name: String,
    /// Path of the save file.
    pub path: PathBuf,
    /// Last save time, Unix seconds.
    pub last_played: u64,
    /// Persisted chunk count at last save.
    pub chunk_count: usize,
    /// Save schema version.
    pub version: String,
}

/// Just enough of the save document to build a summary.
#[derive(Deserialize)]
struct MetadataOnly {
    metadata: WorldMetadata,
}

/// Lists every readable world in `dir`, most recently played first.
///
/// A missing directory yields an empty list; unreadable or corrupt saves are
/// skipped with a warning.
///
/// # Errors
///
/// Only if the directory exists but cannot be enumerated.
pub fn list_saves(dir: &Path) -> WorldResult<Vec<SaveSummary>> {
    let mut saves = Vec::new();
    if !dir.exists() {
        return Ok(saves);
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(SAVE_EXTENSION) {
            continue;
        }
        match read_summary(&path) {
            Ok(summary) => saves.push(summary),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping unreadable save");
            }
        }
    }

    saves.sort_by(|a, b| b.last_played.cmp(&a.last_played));
    Ok(saves)
}

/// Deletes a world's save file and its backup sibling, if present.
///
/// # Errors
///
/// On disk I/O failure removing the save file itself; a missing backup is
/// not an error.
pub fn delete_save(path: &Path) -> WorldResult<()> {
    fs::remove_file(path)?;
    let backup = path.with_extension(BACKUP_EXTENSION);
    if backup.exists() {
        fs::remove_file(&backup)?;
    }
    tracing::info!(path = %path.display(), "save deleted");
    Ok(())
}

fn read_summary(path: &Path) -> WorldResult<SaveSummary> {
    let compressed = fs::read(path)?;
    let body = decompress_size_prepended(&compressed)?;
    let parsed: MetadataOnly = serde_json::from_slice(&body)?;

    Ok(SaveSummary {
        world_name: parsed.metadata.world_name,
        path: path.to_path_buf(),
        last_played: parsed.metadata.last_modified,
        chunk_count: parsed.metadata.chunk_count,
        version: parsed.metadata.version,
    })
}
