//! # Chunk Generator
//!
//! Turns a (seed, chunk coordinate) pair into a grid of block labels.
//!
//! Three vertical bands, selected by the chunk's `y` coordinate:
//!
//! - `y < 0` (sky): all air, zero cost.
//! - `y == 0` (surface): noise heightmap columns (stone / dirt / grass),
//!   then a tree pass.
//! - `y > 0` (underground): cellular-automata cave carving over a stone
//!   field, then an ore pass gated by depth.
//!
//! Generation is pure: the same `(seed, coordinate, config)` always yields
//! the same grid, and it cannot fail for a valid coordinate. Random draws
//! (cave seeding, tree jitter) come from per-chunk ChaCha streams derived
//! from the world seed, never from ambient entropy.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::block::BlockKind;
use crate::grid::{ChunkCoord, ChunkGrid, CHUNK_SIZE};
use crate::noise::{SimplexNoise, WorldSeed};

/// Sub-seed purpose tags, one per independent noise/RNG stream.
mod purpose {
    pub const TERRAIN: u64 = 100;
    pub const ORE: u64 = 101;
    pub const TREE: u64 = 102;
    pub const CAVE_STREAM: u64 = 201;
    pub const TREE_STREAM: u64 = 202;
}

/// All generation tunables, injected at construction.
///
/// Deserializable so a world config file can override any of them; the
/// defaults reproduce the canonical terrain.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Horizontal frequency of the surface heightmap noise.
    pub surface_noise_scale: f64,
    /// Probability that an underground cell starts as stone.
    pub cave_fill_chance: f64,
    /// A stone cell with fewer live neighbours than this dies.
    pub cave_death_limit: u32,
    /// An air cell with more live neighbours than this becomes stone.
    pub cave_birth_limit: u32,
    /// Number of cellular-automaton smoothing iterations.
    pub cave_smoothing_steps: u32,
    /// Combined noise + jitter must exceed this for a tree to spawn.
    pub tree_threshold: f64,
    /// Minimum surface height (in tiles) a column needs to host a tree.
    pub tree_min_ground: usize,
    /// Chance that an individual canopy cell is left as a gap.
    pub tree_canopy_gap_chance: f64,
    /// Frequency of the 3D ore noise.
    pub ore_noise_scale: f64,
    /// Normalised noise threshold for coal.
    pub coal_threshold: f64,
    /// Normalised noise threshold for iron.
    pub iron_threshold: f64,
    /// Normalised noise threshold for gold.
    pub gold_threshold: f64,
    /// Normalised noise threshold for diamond.
    pub diamond_threshold: f64,
    /// Minimum chunk depth for coal.
    pub coal_min_depth: i32,
    /// Minimum chunk depth for iron.
    pub iron_min_depth: i32,
    /// Minimum chunk depth for gold.
    pub gold_min_depth: i32,
    /// Minimum chunk depth for diamond.
    pub diamond_min_depth: i32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            surface_noise_scale: 0.05,
            cave_fill_chance: 0.7,
            cave_death_limit: 5,
            cave_birth_limit: 6,
            cave_smoothing_steps: 4,
            tree_threshold: 0.6,
            tree_min_ground: 5,
            tree_canopy_gap_chance: 0.1,
            ore_noise_scale: 0.1,
            coal_threshold: 0.7,
            iron_threshold: 0.8,
            gold_threshold: 0.85,
            diamond_threshold: 0.9,
            coal_min_depth: 1,
            iron_min_depth: 2,
            gold_min_depth: 3,
            diamond_min_depth: 4,
        }
    }
}

/// Ore table row: `(kind, threshold, minimum depth)`, rarest first.
///
/// When a cell crosses several thresholds the rarest qualifying ore wins.
fn ore_table(config: &GeneratorConfig) -> [(BlockKind, f64, i32); 4] {
    [
        (
            BlockKind::DiamondOre,
            config.diamond_threshold,
            config.diamond_min_depth,
        ),
        (
            BlockKind::GoldOre,
            config.gold_threshold,
            config.gold_min_depth,
        ),
        (
            BlockKind::IronOre,
            config.iron_threshold,
            config.iron_min_depth,
        ),
        (
            BlockKind::CoalOre,
            config.coal_threshold,
            config.coal_min_depth,
        ),
    ]
}

/// Procedural chunk generator.
pub struct ChunkGenerator {
    seed: WorldSeed,
    config: GeneratorConfig,
    /// Surface heightmap noise.
    terrain_noise: SimplexNoise,
    /// 3D ore distribution noise.
    ore_noise: SimplexNoise,
    /// Tree placement noise (low frequency, clumps forests).
    tree_noise: SimplexNoise,
}

impl ChunkGenerator {
    /// Trunk height range for generated trees, in tiles.
    const TREE_MIN_HEIGHT: usize = 3;
    /// Upper bound of the trunk height range.
    const TREE_MAX_HEIGHT: usize = 5;
    /// Canopy radius in tiles.
    const CANOPY_RADIUS: i32 = 2;

    /// Creates a generator for the given seed and tunables.
    #[must_use]
    pub fn new(seed: WorldSeed, config: GeneratorConfig) -> Self {
        Self {
            terrain_noise: SimplexNoise::new(seed.derive(purpose::TERRAIN)),
            ore_noise: SimplexNoise::new(seed.derive(purpose::ORE)),
            tree_noise: SimplexNoise::new(seed.derive(purpose::TREE)),
            seed,
            config,
        }
    }

    /// Returns the world seed this generator was built from.
    #[inline]
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Generates the grid for a chunk coordinate.
    #[must_use]
    pub fn generate(&self, coord: ChunkCoord) -> ChunkGrid {
        if coord.y < 0 {
            // Sky: nothing to do.
            ChunkGrid::new()
        } else if coord.y == 0 {
            self.generate_surface(coord)
        } else {
            self.generate_underground(coord)
        }
    }

    /// Surface elevation for a column, in tiles above the chunk's bottom row.
    ///
    /// `h(x) = floor((noise2(world_x * scale, 0) + 1) * 10 + 5)`, which keeps
    /// the profile in `[5, 25]` and inside the 30-tile grid.
    #[must_use]
    pub fn column_height(&self, coord: ChunkCoord, local_x: usize) -> usize {
        let world_x = f64::from(coord.x) * CHUNK_SIZE as f64 + local_x as f64;
        let noise = self
            .terrain_noise
            .sample2(world_x * self.config.surface_noise_scale, 0.0);
        ((noise + 1.0) * 10.0 + 5.0).floor() as usize
    }

    fn generate_surface(&self, coord: ChunkCoord) -> ChunkGrid {
        let mut grid = ChunkGrid::new();
        let mut heights = [0usize; CHUNK_SIZE];

        for (x, height) in heights.iter_mut().enumerate() {
            *height = self.column_height(coord, x).min(CHUNK_SIZE);
            for y in 0..*height {
                let kind = if y + 5 < *height {
                    BlockKind::Stone
                } else if y + 1 == *height {
                    BlockKind::Grass
                } else {
                    BlockKind::Dirt
                };
                grid.set(x, y, Some(kind));
            }
        }

        self.plant_trees(&mut grid, coord, &heights);
        grid
    }

    /// Tree pass over a surface chunk.
    ///
    /// Per column, a low-frequency noise sample is blended with a jitter draw
    /// from the chunk's tree stream; crossing the threshold on high enough
    /// ground spawns a trunk plus canopy. The jitter is drawn for every
    /// column so the stream stays aligned regardless of outcomes.
    fn plant_trees(&self, grid: &mut ChunkGrid, coord: ChunkCoord, heights: &[usize; CHUNK_SIZE]) {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed.derive_coord(
            purpose::TREE_STREAM,
            coord.x,
            coord.y,
        ));

        for (x, &ground) in heights.iter().enumerate() {
            let world_x = f64::from(coord.x) * CHUNK_SIZE as f64 + x as f64;
            let clumping = (self.tree_noise.sample2(world_x * 0.1, 0.0) + 1.0) * 0.5;
            let jitter: f64 = rng.gen();
            let value = clumping * 0.7 + jitter * 0.3;

            if value > self.config.tree_threshold && ground >= self.config.tree_min_ground {
                self.place_tree(grid, x, ground, &mut rng);
            }
        }
    }

    /// Places one tree with its base on the grass cell of column `x`.
    fn place_tree(&self, grid: &mut ChunkGrid, x: usize, ground: usize, rng: &mut ChaCha8Rng) {
        let trunk_height = rng.gen_range(Self::TREE_MIN_HEIGHT..=Self::TREE_MAX_HEIGHT);

        // Trunk, clamped to the top of the grid.
        for y in ground..(ground + trunk_height).min(CHUNK_SIZE) {
            if grid.get(x, y).is_none() {
                grid.set(x, y, Some(BlockKind::Wood));
            }
        }

        // Roughly circular canopy centred on the trunk top, air cells only,
        // with a small chance per cell to leave a gap.
        let center_y = (ground + trunk_height) as i32;
        let r = Self::CANOPY_RADIUS;
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy > r * r + 1 {
                    continue;
                }
                let gap: f64 = rng.gen();
                if gap < self.config.tree_canopy_gap_chance {
                    continue;
                }
                let cx = x as i32 + dx;
                let cy = center_y + dy;
                if cx < 0 || cx >= CHUNK_SIZE as i32 || cy < 0 || cy >= CHUNK_SIZE as i32 {
                    continue;
                }
                if grid.get(cx as usize, cy as usize).is_none() {
                    grid.set(cx as usize, cy as usize, Some(BlockKind::Leaves));
                }
            }
        }
    }

    fn generate_underground(&self, coord: ChunkCoord) -> ChunkGrid {
        let alive = self.carve_caves(coord);

        let mut grid = ChunkGrid::new();
        for y in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                if alive[y][x] {
                    grid.set(x, y, Some(self.pick_ore(coord, x, y)));
                }
            }
        }
        grid
    }

    /// Cellular-automaton cave field: `true` cells are stone.
    ///
    /// Out-of-bounds neighbours count as alive, biasing chunk edges toward
    /// solid; chunk seams stay mostly closed without cross-chunk lookups.
    fn carve_caves(&self, coord: ChunkCoord) -> [[bool; CHUNK_SIZE]; CHUNK_SIZE] {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed.derive_coord(
            purpose::CAVE_STREAM,
            coord.x,
            coord.y,
        ));

        let mut alive = [[false; CHUNK_SIZE]; CHUNK_SIZE];
        for row in &mut alive {
            for cell in row.iter_mut() {
                *cell = rng.gen::<f64>() < self.config.cave_fill_chance;
            }
        }

        for _ in 0..self.config.cave_smoothing_steps {
            let mut next = [[false; CHUNK_SIZE]; CHUNK_SIZE];
            for y in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    let neighbours = count_alive_neighbours(&alive, x, y);
                    next[y][x] = if alive[y][x] {
                        neighbours >= self.config.cave_death_limit
                    } else {
                        neighbours > self.config.cave_birth_limit
                    };
                }
            }
            alive = next;
        }

        alive
    }

    /// Ore pass for one stone cell.
    ///
    /// Thresholds are checked rarest first (diamond, gold, iron, coal), each
    /// gated by its minimum depth, so a cell crossing several thresholds
    /// resolves to the rarest qualifying ore.
    fn pick_ore(&self, coord: ChunkCoord, x: usize, y: usize) -> BlockKind {
        let depth = coord.y;
        let world_x = f64::from(coord.x) * CHUNK_SIZE as f64 + x as f64;
        let world_y = f64::from(coord.y) * CHUNK_SIZE as f64 + y as f64;

        let sample = self.ore_noise.sample3(
            world_x * self.config.ore_noise_scale,
            world_y * self.config.ore_noise_scale,
            f64::from(depth) * self.config.ore_noise_scale,
        );
        let value = (sample + 1.0) * 0.5;

        for (kind, threshold, min_depth) in ore_table(&self.config) {
            if value > threshold && depth >= min_depth {
                return kind;
            }
        }
        BlockKind::Stone
    }
}

/// Counts live 8-neighbours of `(x, y)`, treating out-of-bounds as alive.
fn count_alive_neighbours(field: &[[bool; CHUNK_SIZE]; CHUNK_SIZE], x: usize, y: usize) -> u32 {
    let mut count = 0;
    for dy in -1i32..=1 {
        for dx in -1i32..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            if nx < 0 || nx >= CHUNK_SIZE as i32 || ny < 0 || ny >= CHUNK_SIZE as i32 {
                count += 1;
            } else if field[ny as usize][nx as usize] {
                count += 1;
            }
        }
    }
    count
}
