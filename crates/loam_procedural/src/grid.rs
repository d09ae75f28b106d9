//! # Chunk Grid
//!
//! The generation output format: a fixed `CHUNK_SIZE` x `CHUNK_SIZE` grid of
//! optional block kinds. `None` is air and is never materialized.
//!
//! Indexing is `(x, y)` with `y` increasing *upward* from the chunk's bottom
//! row; the world layer maps cells to screen-space pixels (where the vertical
//! axis grows downward) when blocks are placed.

use crate::block::BlockKind;

/// Chunk width and height in tiles.
pub const CHUNK_SIZE: usize = 30;

/// Tile edge length in pixels.
pub const TILE_SIZE: i32 = 16;

/// Chunk edge length in pixels.
pub const CHUNK_PIXEL_SIZE: i32 = CHUNK_SIZE as i32 * TILE_SIZE;

/// Chunk coordinate (identifies a chunk in the world grid).
///
/// `y` follows the screen-space vertical axis: `y > 0` is underground,
/// `y < 0` is sky, `y == 0` is the surface band.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    /// Horizontal chunk index.
    pub x: i32,
    /// Vertical chunk index (positive is deeper).
    pub y: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Converts a world pixel position to the chunk containing it.
    #[inline]
    #[must_use]
    pub const fn from_pixel_pos(px: i32, py: i32) -> Self {
        Self {
            x: px.div_euclid(CHUNK_PIXEL_SIZE),
            y: py.div_euclid(CHUNK_PIXEL_SIZE),
        }
    }

    /// World pixel X of the chunk's left edge.
    #[inline]
    #[must_use]
    pub const fn origin_px(self) -> i32 {
        self.x * CHUNK_PIXEL_SIZE
    }

    /// World pixel Y of the chunk's top edge.
    #[inline]
    #[must_use]
    pub const fn origin_py(self) -> i32 {
        self.y * CHUNK_PIXEL_SIZE
    }

    /// Squared distance to another chunk coordinate, for load ordering.
    #[inline]
    #[must_use]
    pub const fn distance_sq(self, other: Self) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    /// Renders the save-map key for this coordinate (`"{cx}_{cy}"`).
    #[must_use]
    pub fn save_key(self) -> String {
        format!("{}_{}", self.x, self.y)
    }

    /// Parses a save-map key back into a coordinate.
    #[must_use]
    pub fn from_save_key(key: &str) -> Option<Self> {
        let (x, y) = key.split_once('_')?;
        Some(Self {
            x: x.parse().ok()?,
            y: y.parse().ok()?,
        })
    }
}

/// A fixed-size grid of block labels produced by the generator.
#[derive(Clone, PartialEq, Eq)]
pub struct ChunkGrid {
    cells: [[Option<BlockKind>; CHUNK_SIZE]; CHUNK_SIZE],
}

impl Default for ChunkGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkGrid {
    /// Creates an all-air grid.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cells: [[None; CHUNK_SIZE]; CHUNK_SIZE],
        }
    }

    /// Returns the cell at `(x, y)`, or air for out-of-bounds coordinates.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<BlockKind> {
        if x < CHUNK_SIZE && y < CHUNK_SIZE {
            self.cells[y][x]
        } else {
            None
        }
    }

    /// Sets the cell at `(x, y)`. Out-of-bounds writes are ignored.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, kind: Option<BlockKind>) {
        if x < CHUNK_SIZE && y < CHUNK_SIZE {
            self.cells[y][x] = kind;
        }
    }

    /// True if every cell is air.
    #[must_use]
    pub fn is_all_air(&self) -> bool {
        self.cells
            .iter()
            .all(|row| row.iter().all(Option::is_none))
    }

    /// Number of non-air cells.
    #[must_use]
    pub fn solid_count(&self) -> usize {
        self.cells
            .iter()
            .map(|row| row.iter().filter(|c| c.is_some()).count())
            .sum()
    }

    /// Iterates over all non-air cells as `(x, y, kind)`.
    pub fn iter_solid(&self) -> impl Iterator<Item = (usize, usize, BlockKind)> + '_ {
        self.cells.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(x, cell)| cell.map(|kind| (x, y, kind)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_air() {
        let grid = ChunkGrid::new();
        assert!(grid.is_all_air());
        assert_eq!(grid.solid_count(), 0);
    }

    #[test]
    fn test_set_get() {
        let mut grid = ChunkGrid::new();
        grid.set(3, 7, Some(BlockKind::Stone));

        assert_eq!(grid.get(3, 7), Some(BlockKind::Stone));
        assert_eq!(grid.get(7, 3), None);
        assert_eq!(grid.solid_count(), 1);
    }

    #[test]
    fn test_out_of_bounds_is_air() {
        let mut grid = ChunkGrid::new();
        grid.set(CHUNK_SIZE, 0, Some(BlockKind::Dirt));
        grid.set(0, CHUNK_SIZE, Some(BlockKind::Dirt));

        assert!(grid.is_all_air(), "out-of-bounds writes must be ignored");
        assert_eq!(grid.get(CHUNK_SIZE, CHUNK_SIZE), None);
    }

    #[test]
    fn test_coord_from_pixel_pos() {
        assert_eq!(ChunkCoord::from_pixel_pos(0, 0), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_pixel_pos(479, 479), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_pixel_pos(480, 480), ChunkCoord::new(1, 1));
        assert_eq!(ChunkCoord::from_pixel_pos(-1, -1), ChunkCoord::new(-1, -1));
        assert_eq!(
            ChunkCoord::from_pixel_pos(-480, -481),
            ChunkCoord::new(-1, -2)
        );
    }

    #[test]
    fn test_coord_save_key_roundtrip() {
        for coord in [
            ChunkCoord::new(0, 0),
            ChunkCoord::new(12, -7),
            ChunkCoord::new(-3, -5),
        ] {
            let key = coord.save_key();
            assert_eq!(ChunkCoord::from_save_key(&key), Some(coord));
        }
        assert_eq!(ChunkCoord::from_save_key("garbage"), None);
    }

    #[test]
    fn test_iter_solid() {
        let mut grid = ChunkGrid::new();
        grid.set(0, 0, Some(BlockKind::Grass));
        grid.set(29, 29, Some(BlockKind::DiamondOre));

        let cells: Vec<_> = grid.iter_solid().collect();
        assert_eq!(cells.len(), 2);
        assert!(cells.contains(&(0, 0, BlockKind::Grass)));
        assert!(cells.contains(&(29, 29, BlockKind::DiamondOre)));
    }
}
