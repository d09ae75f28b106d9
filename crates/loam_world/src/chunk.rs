//! # Chunk Lifecycle
//!
//! A chunk is materialized exactly once - either generated from the seed or
//! rehydrated from a save payload - and afterwards only moves between Active
//! (blocks attached to the live world groups) and Dormant (blocks detached
//! but still owned). Reactivation reuses the same block list; regenerating a
//! previously-mined chunk would resurrect its blocks.
//!
//! The chunk never talks to the store or the generator itself: the scheduler
//! resolves payloads and grids and passes them in.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use loam_procedural::{BlockGroupId, BlockKind, ChunkCoord, ChunkGrid, CHUNK_SIZE, TILE_SIZE};

/// One block in the save file: label plus absolute tile-aligned pixel
/// position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Save label, see [`BlockKind::name`].
    pub name: String,
    /// World pixel X.
    pub x: i32,
    /// World pixel Y.
    pub y: i32,
}

/// Stable identity of a placed block, valid for the life of its chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockHandle {
    /// Owning chunk.
    pub coord: ChunkCoord,
    /// Slot in the chunk's block list.
    pub slot: u32,
}

/// A materialized block instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacedBlock {
    /// Block kind.
    pub kind: BlockKind,
    /// World pixel X (tile-aligned).
    pub x: i32,
    /// World pixel Y (tile-aligned).
    pub y: i32,
}

/// The live world's semantic groups.
///
/// The renderer iterates `sprites`, the physics step iterates `colliders`.
/// Membership is exactly the blocks of currently active chunks.
#[derive(Debug, Default)]
pub struct BlockGroups {
    sprites: HashSet<BlockHandle>,
    colliders: HashSet<BlockHandle>,
}

impl BlockGroups {
    /// Creates empty groups.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles of everything that gets drawn.
    #[must_use]
    pub fn sprites(&self) -> &HashSet<BlockHandle> {
        &self.sprites
    }

    /// Handles of everything the player collides with.
    #[must_use]
    pub fn colliders(&self) -> &HashSet<BlockHandle> {
        &self.colliders
    }

    fn attach(&mut self, kind: BlockKind, handle: BlockHandle) {
        for group in kind.groups() {
            match group {
                BlockGroupId::Sprites => self.sprites.insert(handle),
                BlockGroupId::Colliders => self.colliders.insert(handle),
            };
        }
    }

    fn detach(&mut self, handle: BlockHandle) {
        self.sprites.remove(&handle);
        self.colliders.remove(&handle);
    }
}

/// Chunk lifecycle state.
///
/// `Unloaded` has no representation: before materialization there is no
/// `Chunk` value at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    /// Freshly produced by the generator, not yet attached.
    Generated,
    /// Rehydrated from a save payload, not yet attached.
    Loaded,
    /// Blocks attached to the live world groups.
    Active,
    /// Materialized but detached.
    Dormant,
}

/// A materialized chunk: its coordinate, its block list, and where it is in
/// the lifecycle.
pub struct Chunk {
    coord: ChunkCoord,
    /// Slot-stable block storage; mined blocks leave a `None` hole so
    /// existing handles stay valid.
    blocks: Vec<Option<PlacedBlock>>,
    state: ChunkState,
}

impl Chunk {
    /// Materializes a chunk from generator output.
    ///
    /// Non-air cells become placed blocks at their world pixel positions;
    /// air is skipped entirely.
    #[must_use]
    pub fn from_grid(coord: ChunkCoord, grid: &ChunkGrid) -> Self {
        let blocks = grid
            .iter_solid()
            .map(|(x, y, kind)| {
                Some(PlacedBlock {
                    kind,
                    x: x as i32 * TILE_SIZE + coord.origin_px(),
                    y: (CHUNK_SIZE as i32 - y as i32) * TILE_SIZE + coord.origin_py(),
                })
            })
            .collect();

        Self {
            coord,
            blocks,
            state: ChunkState::Generated,
        }
    }

    /// Rehydrates a chunk from a save payload.
    ///
    /// A record whose label this build does not recognise is logged and
    /// skipped; one bad cell never aborts the chunk.
    #[must_use]
    pub fn from_payload(coord: ChunkCoord, records: &[BlockRecord]) -> Self {
        let mut blocks = Vec::with_capacity(records.len());
        for record in records {
            match BlockKind::from_name(&record.name) {
                Some(kind) => blocks.push(Some(PlacedBlock {
                    kind,
                    x: record.x,
                    y: record.y,
                })),
                None => {
                    tracing::warn!(
                        label = %record.name,
                        chunk = ?coord,
                        "skipping block record with unknown label"
                    );
                }
            }
        }

        Self {
            coord,
            blocks,
            state: ChunkState::Loaded,
        }
    }

    /// The chunk's coordinate.
    #[inline]
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> ChunkState {
        self.state
    }

    /// True while the chunk's blocks are attached to the live groups.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == ChunkState::Active
    }

    /// Number of live (non-mined) blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_some()).count()
    }

    /// Looks up a block by handle.
    #[must_use]
    pub fn block(&self, handle: BlockHandle) -> Option<PlacedBlock> {
        if handle.coord != self.coord {
            return None;
        }
        self.blocks.get(handle.slot as usize).copied().flatten()
    }

    /// Iterates live blocks as `(handle, block)`.
    pub fn blocks(&self) -> impl Iterator<Item = (BlockHandle, PlacedBlock)> + '_ {
        let coord = self.coord;
        self.blocks
            .iter()
            .enumerate()
            .filter_map(move |(slot, block)| {
                block.map(|b| {
                    (
                        BlockHandle {
                            coord,
                            slot: slot as u32,
                        },
                        b,
                    )
                })
            })
    }

    /// Attaches every live block to its registry groups.
    ///
    /// A no-op if the chunk is already active.
    pub fn activate(&mut self, groups: &mut BlockGroups) {
        if self.state == ChunkState::Active {
            return;
        }
        for (handle, block) in self.collect_blocks() {
            groups.attach(block.kind, handle);
        }
        self.state = ChunkState::Active;
    }

    /// Detaches every live block from the groups. Blocks stay owned by the
    /// chunk for later reactivation.
    pub fn deactivate(&mut self, groups: &mut BlockGroups) {
        if self.state != ChunkState::Active {
            return;
        }
        for (handle, _) in self.collect_blocks() {
            groups.detach(handle);
        }
        self.state = ChunkState::Dormant;
    }

    /// Removes a block (mining). Returns the mined-item yield, or `None` if
    /// the handle was stale.
    ///
    /// The block is detached from the groups immediately when the chunk is
    /// active.
    pub fn remove_block(
        &mut self,
        handle: BlockHandle,
        groups: &mut BlockGroups,
    ) -> Option<BlockKind> {
        if handle.coord != self.coord {
            return None;
        }
        let slot = self.blocks.get_mut(handle.slot as usize)?;
        let block = slot.take()?;
        if self.state == ChunkState::Active {
            groups.detach(handle);
        }
        block.kind.mined_yield()
    }

    /// Places a new block at a tile-aligned pixel position.
    ///
    /// Attached to the groups immediately when the chunk is active.
    pub fn place_block(
        &mut self,
        kind: BlockKind,
        x: i32,
        y: i32,
        groups: &mut BlockGroups,
    ) -> BlockHandle {
        let handle = BlockHandle {
            coord: self.coord,
            slot: self.blocks.len() as u32,
        };
        self.blocks.push(Some(PlacedBlock { kind, x, y }));
        if self.state == ChunkState::Active {
            groups.attach(kind, handle);
        }
        handle
    }

    /// Serializable payload of every currently-owned block, regardless of
    /// active/dormant state.
    #[must_use]
    pub fn to_save_payload(&self) -> Vec<BlockRecord> {
        self.blocks
            .iter()
            .flatten()
            .map(|block| BlockRecord {
                name: block.kind.name().to_owned(),
                x: block.x,
                y: block.y,
            })
            .collect()
    }

    fn collect_blocks(&self) -> Vec<(BlockHandle, PlacedBlock)> {
        self.blocks().collect()
    }
}
