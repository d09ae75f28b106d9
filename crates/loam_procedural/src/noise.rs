//! # Simplex Noise
//!
//! The single source of pseudo-randomness for terrain shape and ore
//! thresholds. Everything here is a pure function of the world seed and the
//! sample coordinates.
//!
//! ## Determinism Guarantee
//!
//! Given the same [`WorldSeed`], `sample2` and `sample3` produce **exactly**
//! the same values on any platform, any time. Regenerating a chunk from the
//! seed must reproduce it bit for bit.

/// World seed for deterministic generation.
///
/// Fixed at world creation and never changes; all regeneration derives
/// from this value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives a sub-seed for a specific purpose (caves, ores, trees, ...).
    ///
    /// FNV-1a style mixing creates independent streams from one seed.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }

    /// Derives a raw stream seed for a (purpose, chunk coordinate) pair.
    ///
    /// Used to seed the per-chunk RNG streams (cave field seeding, tree
    /// jitter) so that regenerating a chunk replays the same draws.
    #[inline]
    #[must_use]
    pub const fn derive_coord(self, purpose: u64, cx: i32, cy: i32) -> u64 {
        let mixed = self
            .derive(purpose)
            .derive(cx as u64 ^ ((cy as u64) << 32));
        mixed.0
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(121_367)
    }
}

/// Pre-computed permutation table, built once per seed.
struct PermutationTable {
    /// 512-entry permutation (256 entries, doubled to avoid index wrapping).
    perm: [u8; 512],
}

/// 2D gradients: vertices of a regular 12-gon, collapsed to lattice vectors.
const GRAD2: [[i8; 2]; 12] = [
    [1, 0],
    [1, 1],
    [0, 1],
    [-1, 1],
    [-1, 0],
    [-1, -1],
    [0, -1],
    [1, -1],
    [1, 0],
    [0, 1],
    [-1, 0],
    [0, -1],
];

/// 3D gradients: the 12 edge midpoints of a cube.
const GRAD3: [[i8; 3]; 12] = [
    [1, 1, 0],
    [-1, 1, 0],
    [1, -1, 0],
    [-1, -1, 0],
    [1, 0, 1],
    [-1, 0, 1],
    [1, 0, -1],
    [-1, 0, -1],
    [0, 1, 1],
    [0, -1, 1],
    [0, 1, -1],
    [0, -1, -1],
];

impl PermutationTable {
    fn new(seed: WorldSeed) -> Self {
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().take(256).enumerate() {
            *slot = i as u8;
        }

        // Fisher-Yates shuffle driven by xorshift64 so the table is a pure
        // function of the seed.
        let mut state = seed.value() | 1;
        for i in (1..256).rev() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let j = (state as usize) % (i + 1);
            perm.swap(i, j);
        }

        for i in 0..256 {
            perm[256 + i] = perm[i];
        }

        Self { perm }
    }

    #[inline]
    fn get(&self, index: usize) -> u8 {
        self.perm[index & 511]
    }
}

/// 2D/3D simplex noise generator.
///
/// Produces smooth, continuous values in `[-1, 1]`. Sampling takes `&self`
/// and has no side effects, so concurrent reads are safe.
pub struct SimplexNoise {
    perm_table: PermutationTable,
}

impl SimplexNoise {
    /// Skewing factor for the 2D simplex grid: `(sqrt(3) - 1) / 2`.
    const F2: f64 = 0.366_025_403_784_439;
    /// Unskewing factor for the 2D simplex grid: `(3 - sqrt(3)) / 6`.
    const G2: f64 = 0.211_324_865_405_187;
    /// Skewing factor for the 3D simplex grid: `1 / 3`.
    const F3: f64 = 1.0 / 3.0;
    /// Unskewing factor for the 3D simplex grid: `1 / 6`.
    const G3: f64 = 1.0 / 6.0;

    /// Creates a new noise generator from a seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            perm_table: PermutationTable::new(seed),
        }
    }

    /// Samples 2D simplex noise at the given coordinates.
    ///
    /// Returns a value in `[-1, 1]`.
    #[must_use]
    pub fn sample2(&self, x: f64, y: f64) -> f64 {
        // Skew input coordinates onto the simplex grid.
        let skew = (x + y) * Self::F2;
        let i = fast_floor(x + skew);
        let j = fast_floor(y + skew);

        let unskew = f64::from(i + j) * Self::G2;
        let x0 = x - (f64::from(i) - unskew);
        let y0 = y - (f64::from(j) - unskew);

        // Upper or lower triangle of the simplex cell.
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - f64::from(i1) + Self::G2;
        let y1 = y0 - f64::from(j1) + Self::G2;
        let x2 = x0 - 1.0 + 2.0 * Self::G2;
        let y2 = y0 - 1.0 + 2.0 * Self::G2;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;

        let gi0 = self.perm_table.get(ii + self.perm_table.get(jj) as usize);
        let gi1 = self
            .perm_table
            .get(ii + i1 as usize + self.perm_table.get(jj + j1 as usize) as usize);
        let gi2 = self.perm_table.get(ii + 1 + self.perm_table.get(jj + 1) as usize);

        let n0 = corner2(x0, y0, gi0);
        let n1 = corner2(x1, y1, gi1);
        let n2 = corner2(x2, y2, gi2);

        // 70.0 normalizes the sum into [-1, 1].
        70.0 * (n0 + n1 + n2)
    }

    /// Samples 3D simplex noise at the given coordinates.
    ///
    /// Returns a value in `[-1, 1]`. Used for ore placement, where the third
    /// axis decorrelates neighbouring depth bands.
    #[must_use]
    #[allow(clippy::many_single_char_names, clippy::similar_names)]
    pub fn sample3(&self, x: f64, y: f64, z: f64) -> f64 {
        let skew = (x + y + z) * Self::F3;
        let i = fast_floor(x + skew);
        let j = fast_floor(y + skew);
        let k = fast_floor(z + skew);

        let unskew = f64::from(i + j + k) * Self::G3;
        let x0 = x - (f64::from(i) - unskew);
        let y0 = y - (f64::from(j) - unskew);
        let z0 = z - (f64::from(k) - unskew);

        // Rank the offsets to pick which simplex of the cube we are in.
        let (i1, j1, k1, i2, j2, k2) = if x0 >= y0 {
            if y0 >= z0 {
                (1, 0, 0, 1, 1, 0)
            } else if x0 >= z0 {
                (1, 0, 0, 1, 0, 1)
            } else {
                (0, 0, 1, 1, 0, 1)
            }
        } else if y0 < z0 {
            (0, 0, 1, 0, 1, 1)
        } else if x0 < z0 {
            (0, 1, 0, 0, 1, 1)
        } else {
            (0, 1, 0, 1, 1, 0)
        };

        let x1 = x0 - f64::from(i1) + Self::G3;
        let y1 = y0 - f64::from(j1) + Self::G3;
        let z1 = z0 - f64::from(k1) + Self::G3;
        let x2 = x0 - f64::from(i2) + 2.0 * Self::G3;
        let y2 = y0 - f64::from(j2) + 2.0 * Self::G3;
        let z2 = z0 - f64::from(k2) + 2.0 * Self::G3;
        let x3 = x0 - 1.0 + 3.0 * Self::G3;
        let y3 = y0 - 1.0 + 3.0 * Self::G3;
        let z3 = z0 - 1.0 + 3.0 * Self::G3;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let kk = (k & 255) as usize;

        let hash = |di: usize, dj: usize, dk: usize| {
            self.perm_table.get(
                ii + di
                    + self
                        .perm_table
                        .get(jj + dj + self.perm_table.get(kk + dk) as usize)
                        as usize,
            )
        };

        let gi0 = hash(0, 0, 0);
        let gi1 = hash(i1 as usize, j1 as usize, k1 as usize);
        let gi2 = hash(i2 as usize, j2 as usize, k2 as usize);
        let gi3 = hash(1, 1, 1);

        let n0 = corner3(x0, y0, z0, gi0);
        let n1 = corner3(x1, y1, z1, gi1);
        let n2 = corner3(x2, y2, z2, gi2);
        let n3 = corner3(x3, y3, z3, gi3);

        // 32.0 normalizes the sum into [-1, 1].
        32.0 * (n0 + n1 + n2 + n3)
    }
}

/// Contribution from one corner of a 2D simplex.
#[inline]
fn corner2(x: f64, y: f64, gradient_index: u8) -> f64 {
    let t = 0.5 - x * x - y * y;
    if t < 0.0 {
        0.0
    } else {
        let grad = GRAD2[(gradient_index % 12) as usize];
        let t2 = t * t;
        t2 * t2 * (x * f64::from(grad[0]) + y * f64::from(grad[1]))
    }
}

/// Contribution from one corner of a 3D simplex.
#[inline]
fn corner3(x: f64, y: f64, z: f64, gradient_index: u8) -> f64 {
    let t = 0.6 - x * x - y * y - z * z;
    if t < 0.0 {
        0.0
    } else {
        let grad = GRAD3[(gradient_index % 12) as usize];
        let t2 = t * t;
        t2 * t2 * (x * f64::from(grad[0]) + y * f64::from(grad[1]) + z * f64::from(grad[2]))
    }
}

/// Fast floor, avoids the `f64::floor` call in the hot path.
#[inline]
fn fast_floor(x: f64) -> i32 {
    let xi = x as i32;
    if x < f64::from(xi) {
        xi - 1
    } else {
        xi
    }
}
