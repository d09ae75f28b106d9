//! # Block Registry
//!
//! Every block behaviour the engine needs - live-world group membership,
//! mined-item yield, save-file label - hangs off one tagged enum and is
//! resolved by a single lookup. There is no runtime registry and no virtual
//! dispatch; the table below is the whole configuration.
//!
//! Air is deliberately *not* a variant: an empty grid cell is `None` and is
//! never materialized as a placed block.

use serde::{Deserialize, Serialize};

/// Semantic groups a placed block can belong to in the live world.
///
/// The renderer draws the sprite group; the physics step collides against
/// the collider group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockGroupId {
    /// Everything that gets drawn.
    Sprites,
    /// Everything the player and mobs collide with.
    Colliders,
}

/// Every block kind the generator can emit or a save file can contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// Surface layer of the heightmap.
    Grass,
    /// Subsurface filler between grass and stone.
    Dirt,
    /// Deep terrain and cave walls.
    Stone,
    /// Tree trunk.
    Wood,
    /// Tree canopy.
    Leaves,
    /// Most common ore.
    CoalOre,
    /// Mid-tier ore.
    IronOre,
    /// Rare ore.
    GoldOre,
    /// Rarest ore.
    DiamondOre,
}

/// All block kinds, in registry order.
pub const ALL_BLOCK_KINDS: [BlockKind; 9] = [
    BlockKind::Grass,
    BlockKind::Dirt,
    BlockKind::Stone,
    BlockKind::Wood,
    BlockKind::Leaves,
    BlockKind::CoalOre,
    BlockKind::IronOre,
    BlockKind::GoldOre,
    BlockKind::DiamondOre,
];

impl BlockKind {
    /// Stable label used as the `name` field of save-file block records.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Grass => "grass",
            Self::Dirt => "dirt",
            Self::Stone => "stone",
            Self::Wood => "wood",
            Self::Leaves => "leaves",
            Self::CoalOre => "coal_ore",
            Self::IronOre => "iron_ore",
            Self::GoldOre => "gold_ore",
            Self::DiamondOre => "diamond_ore",
        }
    }

    /// Resolves a save-file label back to a block kind.
    ///
    /// Returns `None` for labels this build does not know; callers skip the
    /// record and keep going (a bad cell never aborts a whole chunk).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "grass" => Some(Self::Grass),
            "dirt" => Some(Self::Dirt),
            "stone" => Some(Self::Stone),
            "wood" => Some(Self::Wood),
            "leaves" => Some(Self::Leaves),
            "coal_ore" => Some(Self::CoalOre),
            "iron_ore" => Some(Self::IronOre),
            "gold_ore" => Some(Self::GoldOre),
            "diamond_ore" => Some(Self::DiamondOre),
            _ => None,
        }
    }

    /// Live-world groups a block of this kind joins while its chunk is
    /// active.
    ///
    /// Leaves are drawn but not collided with, so the canopy can be walked
    /// through.
    #[must_use]
    pub const fn groups(self) -> &'static [BlockGroupId] {
        match self {
            Self::Leaves => &[BlockGroupId::Sprites],
            _ => &[BlockGroupId::Sprites, BlockGroupId::Colliders],
        }
    }

    /// Item put in the inventory when a block of this kind is mined.
    ///
    /// Grass drops dirt; leaves drop nothing; everything else drops itself.
    #[must_use]
    pub const fn mined_yield(self) -> Option<Self> {
        match self {
            Self::Grass => Some(Self::Dirt),
            Self::Leaves => None,
            other => Some(other),
        }
    }

    /// True for the ore kinds.
    #[must_use]
    pub const fn is_ore(self) -> bool {
        matches!(
            self,
            Self::CoalOre | Self::IronOre | Self::GoldOre | Self::DiamondOre
        )
    }
}
