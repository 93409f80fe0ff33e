//! Undo/redo change journal for map editing.
//!
//! Editing tools never describe how to reverse what they do. Instead they
//! register each entity with the recording [`Action`] right before they
//! mutate it, and the action snapshots the entity's state. When the
//! gesture ends the action captures the state of every registered entity
//! again, so undo and redo are plain writes of stored snapshots.
//!
//! - [`EditableWorld`]: the world an action reads snapshots from and
//!   writes them back to
//! - [`Action`]: one atomic edit with its pre- and post-images
//! - [`ActionHistory`]: bounded undo/redo stacks and action merging
//! - [`ActionFlags`]: categories an action touched
//! - [`MemoryWorld`]: in-memory world for tests and headless tools
//!
//! # Entity keys
//!
//! Snapshots are keyed by stable ids ([`ChunkKey`], [`ObjectUid`]) rather
//! than references, so an action stays valid when chunks are unloaded or
//! objects are destroyed. Writes to an unloaded chunk are skipped by the
//! world. Objects recreated by undo or redo may come back under a new uid;
//! the history forwards that change to every other stored action.
//!
//! # Object operation logs
//!
//! Within one action an object may be added, transformed and removed any
//! number of times. Only the net effect is replayed, see [`NetEffect`].

mod action;
pub mod cache;
mod flags;
mod history;
mod memory;
mod object_ops;
mod table;
mod world;

pub use action::{Action, ActionState, UidRemap};
pub use cache::{
    AreaId, ChunkCache, ChunkFlags, Holes, LiquidLayer, LiquidLayers, ObjectInstanceCache,
    ShadowMapCache, TerrainCache, TextureChangeCache, VertexColorCache, VertexSelectionCache,
};
pub use flags::{ActionFlags, ModalityControllers};
pub use history::ActionHistory;
pub use memory::{ChunkState, MemoryWorld};
pub use object_ops::{NetEffect, ObjectOp, ObjectOpLog, resolve, try_resolve};
pub use table::{ChangeTable, Direction};
pub use world::{
    CHUNKS_PER_TILE_AXIS, ChunkKey, EditableWorld, ObjectUid, TILES_PER_AXIS, TileKey, VertexRef,
};
