//! # LOAM Procedural Generation
//!
//! Deterministic chunk generation for a 2D block world.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: same seed + same coordinate = same chunk, always
//! 2. **Pure**: no I/O, no globals; all tunables are injected via
//!    [`GeneratorConfig`]
//! 3. **Banded**: the chunk's vertical coordinate picks the algorithm -
//!    sky (air), surface (heightmap + trees), underground (caves + ores)
//! 4. **Infallible**: generation cannot fail for a valid coordinate
//!
//! ## Core Components
//!
//! - [`SimplexNoise`]: seeded 2D/3D noise in `[-1, 1]`
//! - [`BlockKind`]: the block registry - labels, groups, mined yields
//! - [`ChunkGenerator`]: coordinate -> [`ChunkGrid`] of block labels
//!
//! ## Example
//!
//! ```rust
//! use loam_procedural::{ChunkCoord, ChunkGenerator, GeneratorConfig, WorldSeed};
//!
//! let generator = ChunkGenerator::new(WorldSeed::new(121_343), GeneratorConfig::default());
//!
//! // Surface chunk at the origin: heightmap terrain plus trees.
//! let grid = generator.generate(ChunkCoord::new(0, 0));
//! assert!(grid.solid_count() > 0);
//!
//! // Sky chunks cost nothing.
//! assert!(generator.generate(ChunkCoord::new(0, -1)).is_all_air());
//! ```

pub mod block;
pub mod generator;
pub mod grid;
pub mod noise;

pub use block::{BlockGroupId, BlockKind, ALL_BLOCK_KINDS};
pub use generator::{ChunkGenerator, GeneratorConfig};
pub use grid::{ChunkCoord, ChunkGrid, CHUNK_PIXEL_SIZE, CHUNK_SIZE, TILE_SIZE};
pub use noise::{SimplexNoise, WorldSeed};
