//! # Streaming Scheduler
//!
//! Keeps a Chebyshev square of chunks alive around the player, doing a
//! bounded amount of work per tick. Loads are nearest-first and capped by a
//! per-tick budget; overflow goes to a deduplicated FIFO that later ticks
//! drain. Unloads walk the active list in insertion order under their own
//! budget. The scheduler owns the store, the generator, and every
//! materialized chunk; chunks themselves never reach back into either.
//!
//! Single-threaded and synchronous. The desired set is snapshotted once per
//! tick, so a coordinate is never loaded and unloaded in the same tick.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use loam_procedural::{BlockKind, ChunkCoord, ChunkGenerator, GeneratorConfig};

use crate::chunk::{BlockGroups, BlockHandle, BlockRecord, Chunk};
use crate::error::WorldResult;
use crate::store::WorldStore;

/// Streaming knobs; all tunable from the world config file.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Chebyshev radius of the desired square around the player's chunk.
    pub render_distance: i32,
    /// Maximum chunk activations per tick, shared with the pending queue.
    pub load_budget: usize,
    /// Maximum chunk deactivations per tick.
    pub unload_budget: usize,
    /// Seconds of accumulated play time between automatic saves.
    pub autosave_interval_secs: f32,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            render_distance: 1,
            load_budget: 2,
            unload_budget: 2,
            autosave_interval_secs: 30.0,
        }
    }
}

/// What one tick actually did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Chunks activated this tick (fresh, rehydrated, or reawakened).
    pub loaded: usize,
    /// Chunks deactivated this tick.
    pub unloaded: usize,
    /// Chunks newly pushed to the pending queue.
    pub queued: usize,
    /// True if this tick ran an autosave.
    pub autosaved: bool,
}

/// Drives chunk lifecycle around a moving player.
pub struct StreamingScheduler {
    store: WorldStore,
    generator: ChunkGenerator,
    config: StreamingConfig,
    /// Every chunk ever materialized this session, active or dormant.
    chunks: HashMap<ChunkCoord, Chunk>,
    groups: BlockGroups,
    /// Active coords in activation order; unloading scans this front to
    /// back.
    active: Vec<ChunkCoord>,
    pending: VecDeque<ChunkCoord>,
    pending_set: HashSet<ChunkCoord>,
    autosave_accum: f32,
}

impl StreamingScheduler {
    /// Builds a scheduler over an opened store. The generator is seeded from
    /// the store, so a reloaded world regenerates identically.
    #[must_use]
    pub fn new(store: WorldStore, generator: GeneratorConfig, config: StreamingConfig) -> Self {
        let generator = ChunkGenerator::new(store.seed(), generator);
        Self {
            store,
            generator,
            config,
            chunks: HashMap::new(),
            groups: BlockGroups::new(),
            active: Vec::new(),
            pending: VecDeque::new(),
            pending_set: HashSet::new(),
            autosave_accum: 0.0,
        }
    }

    /// Advances the world by one frame.
    ///
    /// `player_px`/`player_py` is the player's world pixel position, `dt`
    /// the frame time in seconds.
    pub fn tick(&mut self, player_px: i32, player_py: i32, dt: f32) -> TickStats {
        let player = ChunkCoord::from_pixel_pos(player_px, player_py);
        let r = self.config.render_distance;

        let mut desired = Vec::with_capacity(((2 * r + 1) * (2 * r + 1)) as usize);
        for dy in -r..=r {
            for dx in -r..=r {
                desired.push(ChunkCoord::new(player.x + dx, player.y + dy));
            }
        }
        desired.sort_by_key(|c| c.distance_sq(player));
        let desired_set: HashSet<ChunkCoord> = desired.iter().copied().collect();

        let mut stats = TickStats::default();
        let mut budget = self.config.load_budget;

        // Nearest-first activation; overflow is queued for later ticks.
        for &coord in &desired {
            if self.is_active(coord) {
                continue;
            }
            if budget > 0 {
                self.activate_chunk(coord);
                budget -= 1;
                stats.loaded += 1;
            } else if self.pending_set.insert(coord) {
                self.pending.push_back(coord);
                stats.queued += 1;
            }
        }

        // Pending drains under the same budget. Entries that are no longer
        // desired (the player moved on) or got activated directly above are
        // discarded for free.
        while budget > 0 {
            let Some(coord) = self.pending.pop_front() else {
                break;
            };
            self.pending_set.remove(&coord);
            if !desired_set.contains(&coord) || self.is_active(coord) {
                continue;
            }
            self.activate_chunk(coord);
            budget -= 1;
            stats.loaded += 1;
        }

        // Budgeted unload in activation order. Not distance-prioritized:
        // any chunk outside the desired square is equally fine to drop.
        let mut unload_budget = self.config.unload_budget;
        let mut i = 0;
        while i < self.active.len() && unload_budget > 0 {
            let coord = self.active[i];
            if desired_set.contains(&coord) {
                i += 1;
                continue;
            }
            if let Some(chunk) = self.chunks.get_mut(&coord) {
                chunk.deactivate(&mut self.groups);
            }
            self.active.remove(i);
            unload_budget -= 1;
            stats.unloaded += 1;
        }

        self.autosave_accum += dt;
        if self.autosave_accum >= self.config.autosave_interval_secs {
            self.autosave_accum = 0.0;
            stats.autosaved = true;
            if let Err(err) = self.save_now() {
                tracing::warn!(error = %err, "autosave failed");
            }
        }

        stats
    }

    /// Mines the block behind `handle`. Returns the mined-item yield, or
    /// `None` for a stale handle.
    pub fn mine_block(&mut self, handle: BlockHandle) -> Option<BlockKind> {
        let chunk = self.chunks.get_mut(&handle.coord)?;
        chunk.remove_block(handle, &mut self.groups)
    }

    /// Places a block at a world pixel position. Fails if the owning chunk
    /// has never been materialized.
    pub fn place_block(&mut self, kind: BlockKind, px: i32, py: i32) -> Option<BlockHandle> {
        let coord = ChunkCoord::from_pixel_pos(px, py);
        let chunk = self.chunks.get_mut(&coord)?;
        Some(chunk.place_block(kind, px, py, &mut self.groups))
    }

    /// Saves every chunk materialized this session, then writes the file.
    ///
    /// # Errors
    ///
    /// On serialization or disk I/O failure.
    pub fn save_now(&mut self) -> WorldResult<()> {
        let payloads: Vec<(ChunkCoord, Vec<BlockRecord>)> = self
            .chunks
            .iter()
            .map(|(&coord, chunk)| (coord, chunk.to_save_payload()))
            .collect();
        self.store.save(payloads)
    }

    /// Active chunk coordinates, in activation order.
    #[must_use]
    pub fn active_chunks(&self) -> &[ChunkCoord] {
        &self.active
    }

    /// The live sprite and collider groups.
    #[must_use]
    pub fn groups(&self) -> &BlockGroups {
        &self.groups
    }

    /// Looks up a materialized chunk (active or dormant).
    #[must_use]
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &WorldStore {
        &self.store
    }

    fn is_active(&self, coord: ChunkCoord) -> bool {
        self.chunks.get(&coord).is_some_and(Chunk::is_active)
    }

    /// Materializes `coord` if this session has never seen it (saved payload
    /// wins over regeneration), then attaches its blocks.
    fn activate_chunk(&mut self, coord: ChunkCoord) {
        if !self.chunks.contains_key(&coord) {
            let chunk = match self.store.get_chunk_payload(coord) {
                Some(records) => Chunk::from_payload(coord, records),
                None => Chunk::from_grid(coord, &self.generator.generate(coord)),
            };
            tracing::debug!(chunk = ?coord, blocks = chunk.block_count(), "chunk materialized");
            self.chunks.insert(coord, chunk);
        }
        if let Some(chunk) = self.chunks.get_mut(&coord) {
            chunk.activate(&mut self.groups);
        }
        self.active.push(coord);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_procedural::{WorldSeed, CHUNK_PIXEL_SIZE};
    use std::path::PathBuf;

    fn temp_saves_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("loam_sched_{tag}_{}", std::process::id()));
        std::fs::remove_dir_all(&dir).ok();
        dir
    }

    fn scheduler(dir: &PathBuf, streaming: StreamingConfig) -> StreamingScheduler {
        let store = WorldStore::load_or_create(dir, "test", WorldSeed::new(121_343)).unwrap();
        StreamingScheduler::new(store, GeneratorConfig::default(), streaming)
    }

    /// Pixel position at the center of a chunk.
    fn center_px(coord: ChunkCoord) -> (i32, i32) {
        (
            coord.origin_px() + CHUNK_PIXEL_SIZE / 2,
            coord.origin_py() + CHUNK_PIXEL_SIZE / 2,
        )
    }

    #[test]
    fn test_tick_work_is_bounded_and_queue_dedups() {
        let dir = temp_saves_dir("bounded");
        let mut world = scheduler(
            &dir,
            StreamingConfig {
                render_distance: 1,
                load_budget: 2,
                ..StreamingConfig::default()
            },
        );
        let (px, py) = center_px(ChunkCoord::new(0, 0));

        // 9 desired, budget 2: 2 load now, 7 queue.
        let stats = world.tick(px, py, 0.016);
        assert_eq!(stats.loaded, 2);
        assert_eq!(stats.queued, 7);
        assert_eq!(world.active_chunks().len(), 2);

        // Standing still: later ticks chip away without re-queueing.
        let stats = world.tick(px, py, 0.016);
        assert_eq!(stats.loaded, 2);
        assert_eq!(stats.queued, 0, "already-queued coords must not re-queue");

        let mut total_loaded = 4;
        for _ in 0..10 {
            total_loaded += world.tick(px, py, 0.016).loaded;
        }
        assert_eq!(total_loaded, 9, "each desired chunk loads exactly once");
        assert_eq!(world.active_chunks().len(), 9);
        assert!(world.pending.is_empty(), "queue must drain to empty");

        let unique: HashSet<ChunkCoord> = world.active_chunks().iter().copied().collect();
        assert_eq!(unique.len(), 9, "active list must hold no duplicates");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_loads_are_nearest_first() {
        let dir = temp_saves_dir("nearest");
        let mut world = scheduler(
            &dir,
            StreamingConfig {
                render_distance: 1,
                load_budget: 1,
                ..StreamingConfig::default()
            },
        );
        let (px, py) = center_px(ChunkCoord::new(3, 2));

        world.tick(px, py, 0.016);
        assert_eq!(
            world.active_chunks(),
            &[ChunkCoord::new(3, 2)],
            "the player's own chunk loads before any neighbour"
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_stale_pending_entries_are_discarded() {
        let dir = temp_saves_dir("stale");
        let mut world = scheduler(
            &dir,
            StreamingConfig {
                render_distance: 1,
                load_budget: 2,
                unload_budget: 9,
                ..StreamingConfig::default()
            },
        );

        // Queue up neighbours of the origin, then teleport far away.
        let (px, py) = center_px(ChunkCoord::new(0, 0));
        world.tick(px, py, 0.016);
        assert_eq!(world.pending.len(), 7);

        let (fx, fy) = center_px(ChunkCoord::new(100, 100));
        // Far ticks load the new area; stale origin coords fall out of the
        // queue without consuming budget once the new area is saturated.
        for _ in 0..10 {
            world.tick(fx, fy, 0.016);
        }
        assert!(
            world.pending.is_empty(),
            "stale entries must not linger in the queue"
        );
        for coord in world.active_chunks() {
            assert!(
                (coord.x - 100).abs() <= 1 && (coord.y - 100).abs() <= 1,
                "origin chunk {coord:?} still active after teleport"
            );
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_dormant_chunk_is_reawakened_not_regenerated() {
        let dir = temp_saves_dir("dormant");
        let mut world = scheduler(
            &dir,
            StreamingConfig {
                render_distance: 1,
                load_budget: 16,
                unload_budget: 16,
                ..StreamingConfig::default()
            },
        );
        let home = ChunkCoord::new(0, 0);
        let (px, py) = center_px(home);
        world.tick(px, py, 0.016);

        // Mine one block from the home chunk.
        let handle = world.chunk(home).unwrap().blocks().next().unwrap().0;
        assert!(world.mine_block(handle).is_some());
        let count_after_mining = world.chunk(home).unwrap().block_count();

        // Walk far enough to unload home, then come back.
        let (fx, fy) = center_px(ChunkCoord::new(50, 0));
        for _ in 0..3 {
            world.tick(fx, fy, 0.016);
        }
        assert!(!world.chunk(home).unwrap().is_active());

        world.tick(px, py, 0.016);
        assert!(world.chunk(home).unwrap().is_active());
        assert_eq!(
            world.chunk(home).unwrap().block_count(),
            count_after_mining,
            "reactivation must not resurrect mined blocks"
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_mining_and_placing_update_groups() {
        let dir = temp_saves_dir("mine");
        let mut world = scheduler(
            &dir,
            StreamingConfig {
                load_budget: 16,
                ..StreamingConfig::default()
            },
        );
        let home = ChunkCoord::new(0, 0);
        let (px, py) = center_px(home);
        world.tick(px, py, 0.016);

        let (handle, block) = world.chunk(home).unwrap().blocks().next().unwrap();
        assert!(world.groups().sprites().contains(&handle));

        world.mine_block(handle);
        assert!(!world.groups().sprites().contains(&handle));
        assert!(!world.groups().colliders().contains(&handle));

        let placed = world
            .place_block(BlockKind::Stone, block.x, block.y)
            .unwrap();
        assert!(world.groups().colliders().contains(&placed));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_autosave_fires_once_past_the_interval() {
        let dir = temp_saves_dir("autosave");
        let mut world = scheduler(
            &dir,
            StreamingConfig {
                load_budget: 16,
                autosave_interval_secs: 30.0,
                ..StreamingConfig::default()
            },
        );
        let (px, py) = center_px(ChunkCoord::new(0, 0));

        let stats = world.tick(px, py, 15.5);
        assert!(!stats.autosaved);
        assert!(!world.store().save_path().exists(), "no save before 30s");

        // 15.5 + 15.5 = 31 seconds of play time.
        let stats = world.tick(px, py, 15.5);
        assert!(stats.autosaved, "autosave must fire past the interval");
        assert!(world.store().save_path().exists());
        assert!(world.store().chunk_count() > 0);

        // The accumulator reset; the next short tick stays quiet.
        let stats = world.tick(px, py, 1.0);
        assert!(!stats.autosaved, "autosave must fire exactly once per interval");

        std::fs::remove_dir_all(&dir).ok();
    }
}
