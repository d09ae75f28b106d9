//! # LOAM World
//!
//! Chunk streaming and persistence on top of [`loam_procedural`]'s
//! deterministic generation.
//!
//! The [`StreamingScheduler`] is the session's entry point: it keeps a
//! square of chunks active around the player under per-tick work budgets,
//! materializes each chunk exactly once per session (saved payloads win over
//! regeneration), and autosaves the whole world on an interval. Saves are
//! compressed JSON documents with a rotated backup generation; a corrupt
//! save degrades to a fresh world instead of crashing.
//!
//! ```
//! use loam_procedural::{GeneratorConfig, WorldSeed};
//! use loam_world::{StreamingConfig, StreamingScheduler, WorldStore};
//!
//! let saves = std::env::temp_dir().join("loam_world_doc");
//! let store = WorldStore::load_or_create(&saves, "demo", WorldSeed::default())?;
//! let mut world = StreamingScheduler::new(
//!     store,
//!     GeneratorConfig::default(),
//!     StreamingConfig::default(),
//! );
//!
//! let stats = world.tick(240, 240, 0.016);
//! assert!(stats.loaded > 0);
//! # std::fs::remove_dir_all(&saves).ok();
//! # Ok::<(), loam_world::WorldError>(())
//! ```

pub mod chunk;
pub mod config;
pub mod error;
pub mod saves;
pub mod scheduler;
pub mod store;

pub use chunk::{BlockGroups, BlockHandle, BlockRecord, Chunk, ChunkState, PlacedBlock};
pub use config::WorldConfig;
pub use error::{WorldError, WorldResult};
pub use saves::{delete_save, list_saves, SaveSummary};
pub use scheduler::{StreamingConfig, StreamingScheduler, TickStats};
pub use store::{WorldMetadata, WorldStore, DEFAULT_WORLD_SEED, SAVE_VERSION};
