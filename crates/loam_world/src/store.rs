//! # World Store
//!
//! Owns the authoritative map from chunk coordinate to serialized block
//! payload, the world metadata, and a bounded read cache. Persistence is
//! whole-world-granularity: one compressed JSON document per world,
//! `saves/<world_name>.dat`, with the previous generation rotated to
//! `<world_name>.dat.backup` before every overwrite.
//!
//! Failure policy: a corrupt or unreadable save degrades to a freshly
//! created world (logged, never fatal); save I/O failures are returned for
//! the caller to log - the in-memory world is unaffected either way.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use serde::{Deserialize, Serialize};

use loam_procedural::{ChunkCoord, WorldSeed};

use crate::chunk::BlockRecord;
use crate::error::WorldResult;

/// Save-file extension (without the dot).
pub const SAVE_EXTENSION: &str = "dat";

/// Extension of the rotated previous save generation.
pub const BACKUP_EXTENSION: &str = "dat.backup";

/// Schema version written into new saves.
pub const SAVE_VERSION: &str = "0.2.0";

/// Seed used when a world is created without an explicit one.
pub const DEFAULT_WORLD_SEED: u64 = 121_367;

/// Read-cache capacity, in chunk payloads.
const CACHE_CAPACITY: usize = 50;

/// World metadata block of the save file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorldMetadata {
    /// Display name; also the save file stem.
    pub world_name: String,
    /// Creation time, Unix seconds.
    pub created: u64,
    /// Last save time, Unix seconds.
    pub last_modified: u64,
    /// Number of persisted chunks, refreshed on save.
    #[serde(default)]
    pub chunk_count: usize,
    /// Schema version string.
    pub version: String,
}

/// Generation parameters block of the save file.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct WorldInfo {
    /// The world's generation seed, fixed at creation.
    seed: u64,
}

/// The whole save-file document.
#[derive(Serialize, Deserialize)]
struct WorldFile {
    /// `"{cx}_{cy}"` -> block records.
    chunks: HashMap<String, Vec<BlockRecord>>,
    world_info: WorldInfo,
    metadata: WorldMetadata,
}

/// Persistent world state plus its read accelerator.
pub struct WorldStore {
    world_file: PathBuf,
    data: WorldFile,
    /// Bounded read cache; a pure accelerator over `data.chunks`, filled on
    /// miss while under capacity and never evicted.
    cache: HashMap<ChunkCoord, Vec<BlockRecord>>,
}

impl WorldStore {
    /// Opens the world `world_name` under `saves_dir`, creating a fresh one
    /// if no save exists or the existing save cannot be read.
    ///
    /// # Errors
    ///
    /// Only if the saves directory itself cannot be created; save corruption
    /// is handled by falling back to a new world.
    pub fn load_or_create(
        saves_dir: &Path,
        world_name: &str,
        default_seed: WorldSeed,
    ) -> WorldResult<Self> {
        fs::create_dir_all(saves_dir)?;
        let world_file = saves_dir.join(format!("{world_name}.{SAVE_EXTENSION}"));

        let data = if world_file.exists() {
            match read_world_file(&world_file) {
                Ok(data) => {
                    tracing::info!(
                        world = world_name,
                        chunks = data.chunks.len(),
                        "world loaded"
                    );
                    data
                }
                Err(err) => {
                    tracing::warn!(
                        world = world_name,
                        error = %err,
                        "could not read save, falling back to a fresh world"
                    );
                    new_world_data(world_name, default_seed)
                }
            }
        } else {
            tracing::info!(world = world_name, "creating new world");
            new_world_data(world_name, default_seed)
        };

        Ok(Self {
            world_file,
            data,
            cache: HashMap::new(),
        })
    }

    /// The world's generation seed.
    #[must_use]
    pub fn seed(&self) -> WorldSeed {
        WorldSeed::new(self.data.world_info.seed)
    }

    /// Read accessor for the world metadata.
    #[must_use]
    pub fn world_info(&self) -> &WorldMetadata {
        &self.data.metadata
    }

    /// Number of chunks in the persisted map.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.data.chunks.len()
    }

    /// True if a payload for `coord` has ever been persisted.
    #[must_use]
    pub fn has_chunk(&self, coord: ChunkCoord) -> bool {
        self.data.chunks.contains_key(&coord.save_key())
    }

    /// Path of the world's save file.
    #[must_use]
    pub fn save_path(&self) -> &Path {
        &self.world_file
    }

    /// Fetches the persisted payload for a chunk, if any.
    ///
    /// Consults the bounded cache first; a miss falls back to the persisted
    /// map and populates the cache while under capacity. The answer is
    /// identical either way - the cache is never required for correctness.
    pub fn get_chunk_payload(&mut self, coord: ChunkCoord) -> Option<&[BlockRecord]> {
        if !self.cache.contains_key(&coord) {
            let key = coord.save_key();
            let payload = self.data.chunks.get(&key)?;
            if self.cache.len() < CACHE_CAPACITY {
                self.cache.insert(coord, payload.clone());
            } else {
                return self.data.chunks.get(&key).map(Vec::as_slice);
            }
        }
        self.cache.get(&coord).map(Vec::as_slice)
    }

    /// Persists the given chunk payloads and writes the save file.
    ///
    /// Every entry overwrites its slot in the persisted map (and refreshes
    /// any cached copy), `last_modified` and `chunk_count` are bumped, and
    /// the previous file generation is rotated to the backup path before the
    /// new one is written.
    ///
    /// # Errors
    ///
    /// On serialization or disk I/O failure. The in-memory world state is
    /// already updated and remains usable; the caller logs and carries on.
    pub fn save<I>(&mut self, chunks: I) -> WorldResult<()>
    where
        I: IntoIterator<Item = (ChunkCoord, Vec<BlockRecord>)>,
    {
        for (coord, payload) in chunks {
            if let Some(cached) = self.cache.get_mut(&coord) {
                cached.clone_from(&payload);
            }
            self.data.chunks.insert(coord.save_key(), payload);
        }

        self.data.metadata.last_modified = now_secs();
        self.data.metadata.chunk_count = self.data.chunks.len();

        if self.world_file.exists() {
            fs::copy(&self.world_file, self.backup_path())?;
        }

        let body = serde_json::to_vec(&self.data)?;
        fs::write(&self.world_file, compress_prepend_size(&body))?;

        tracing::info!(
            world = %self.data.metadata.world_name,
            chunks = self.data.chunks.len(),
            "world saved"
        );
        Ok(())
    }

    /// Path of the rotated previous save generation.
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        self.world_file.with_extension(BACKUP_EXTENSION)
    }
}

/// Reads and parses a compressed save file.
fn read_world_file(path: &Path) -> WorldResult<WorldFile> {
    let compressed = fs::read(path)?;
    let body = decompress_size_prepended(&compressed)?;
    Ok(serde_json::from_slice(&body)?)
}

/// Fresh world document with default metadata and an empty chunk map.
fn new_world_data(world_name: &str, seed: WorldSeed) -> WorldFile {
    let now = now_secs();
    WorldFile {
        chunks: HashMap::new(),
        world_info: WorldInfo { seed: seed.value() },
        metadata: WorldMetadata {
            world_name: world_name.to_owned(),
            created: now,
            last_modified: now,
            chunk_count: 0,
            version: SAVE_VERSION.to_owned(),
        },
    }
}

/// Current wall-clock time as whole Unix seconds.
fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_saves_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("loam_store_{tag}_{}", std::process::id()));
        fs::remove_dir_all(&dir).ok();
        dir
    }

    fn record(name: &str, x: i32, y: i32) -> BlockRecord {
        BlockRecord {
            name: name.to_owned(),
            x,
            y,
        }
    }

    #[test]
    fn test_fresh_world_defaults() {
        let dir = temp_saves_dir("fresh");
        let store =
            WorldStore::load_or_create(&dir, "alpha", WorldSeed::new(DEFAULT_WORLD_SEED)).unwrap();

        assert_eq!(store.seed().value(), DEFAULT_WORLD_SEED);
        assert_eq!(store.chunk_count(), 0);
        assert_eq!(store.world_info().world_name, "alpha");
        assert_eq!(store.world_info().version, SAVE_VERSION);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_and_reload_roundtrip() {
        let dir = temp_saves_dir("roundtrip");
        let coord = ChunkCoord::new(3, -1);
        let payload = vec![record("grass", 1440, -16), record("stone", 1456, -16)];

        {
            let mut store =
                WorldStore::load_or_create(&dir, "beta", WorldSeed::new(777)).unwrap();
            store.save([(coord, payload.clone())]).unwrap();
        }

        let mut reopened =
            WorldStore::load_or_create(&dir, "beta", WorldSeed::new(0)).unwrap();
        // Seed comes from the file, not the fallback argument.
        assert_eq!(reopened.seed().value(), 777);
        assert_eq!(reopened.chunk_count(), 1);
        assert_eq!(reopened.get_chunk_payload(coord), Some(payload.as_slice()));
        assert_eq!(reopened.get_chunk_payload(ChunkCoord::new(9, 9)), None);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_corrupt_save_falls_back_to_fresh_world() {
        let dir = temp_saves_dir("corrupt");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("gamma.dat"), b"definitely not lz4 world data").unwrap();

        let store = WorldStore::load_or_create(&dir, "gamma", WorldSeed::new(5)).unwrap();
        assert_eq!(store.chunk_count(), 0, "corrupt save must yield a fresh world");
        assert_eq!(store.seed().value(), 5);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_backup_rotation() {
        let dir = temp_saves_dir("backup");
        let mut store = WorldStore::load_or_create(&dir, "delta", WorldSeed::new(1)).unwrap();

        store
            .save([(ChunkCoord::new(0, 0), vec![record("dirt", 0, 480)])])
            .unwrap();
        assert!(!store.backup_path().exists(), "first save has nothing to rotate");

        let first_generation = fs::read(store.save_path()).unwrap();
        store
            .save([(ChunkCoord::new(1, 0), vec![record("stone", 480, 480)])])
            .unwrap();

        assert!(store.backup_path().exists());
        assert_eq!(
            fs::read(store.backup_path()).unwrap(),
            first_generation,
            "backup must hold the previous save generation"
        );

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_cache_serves_identical_data() {
        let dir = temp_saves_dir("cache");
        let coord = ChunkCoord::new(2, 2);
        let payload = vec![record("coal_ore", 960, 1024)];

        let mut store = WorldStore::load_or_create(&dir, "epsilon", WorldSeed::new(1)).unwrap();
        store.save([(coord, payload.clone())]).unwrap();

        // First read misses the cache, second hits it; both must agree.
        let from_map = store.get_chunk_payload(coord).map(<[BlockRecord]>::to_vec);
        let from_cache = store.get_chunk_payload(coord).map(<[BlockRecord]>::to_vec);
        assert_eq!(from_map, from_cache);
        assert_eq!(from_map.as_deref(), Some(payload.as_slice()));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_cache_stays_consistent_after_save() {
        let dir = temp_saves_dir("cache_save");
        let coord = ChunkCoord::new(0, 1);

        let mut store = WorldStore::load_or_create(&dir, "zeta", WorldSeed::new(1)).unwrap();
        store.save([(coord, vec![record("stone", 0, 960)])]).unwrap();

        // Warm the cache, then overwrite the payload via save.
        assert!(store.get_chunk_payload(coord).is_some());
        let updated = vec![record("stone", 0, 960), record("iron_ore", 16, 960)];
        store.save([(coord, updated.clone())]).unwrap();

        assert_eq!(
            store.get_chunk_payload(coord),
            Some(updated.as_slice()),
            "cached payloads must be refreshed by save"
        );

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_cache_capacity_is_bounded() {
        let dir = temp_saves_dir("cache_cap");
        let mut store = WorldStore::load_or_create(&dir, "eta", WorldSeed::new(1)).unwrap();

        // Persist more chunks than the cache can hold.
        let coords: Vec<ChunkCoord> = (0..(CACHE_CAPACITY as i32 + 10))
            .map(|i| ChunkCoord::new(i, 0))
            .collect();
        store
            .save(coords.iter().map(|&c| (c, vec![record("dirt", c.x * 480, 480)])))
            .unwrap();

        // Read them all; every read must succeed even once the cache is full.
        for &coord in &coords {
            assert!(store.get_chunk_payload(coord).is_some(), "miss at {coord:?}");
        }
        assert!(store.cache.len() <= CACHE_CAPACITY);

        fs::remove_dir_all(&dir).ok();
    }
}
