//! Stable entity keys and the world collaborator interface.
//!
//! The action engine never holds references into the world. Chunks are
//! addressed by tile/chunk coordinates and objects by their unique id, so
//! an entity that is unloaded, destroyed or recreated while an action is
//! alive is simply absent when the action next looks it up.

use std::collections::BTreeSet;
use std::fmt;

use super::cache::{
    AreaId, ChunkFlags, Holes, LiquidLayers, ObjectInstanceCache, ShadowMapCache,
    TerrainCache, TextureChangeCache, VertexColorCache, VertexSelectionCache,
};
use super::flags::ActionFlags;

/// Number of map tiles along each axis of a world.
pub const TILES_PER_AXIS: u8 = 64;

/// Number of chunks along each axis of a tile.
pub const CHUNKS_PER_TILE_AXIS: u8 = 16;

/// Coordinates of a map tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    pub x: u8,
    pub z: u8,
}

impl TileKey {
    pub const fn new(x: u8, z: u8) -> Self {
        Self { x, z }
    }

    /// Whether the coordinates lie on the map grid.
    pub fn is_valid(self) -> bool {
        self.x < TILES_PER_AXIS && self.z < TILES_PER_AXIS
    }
}

/// Coordinates of a chunk: its tile plus its position inside the tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    pub tile: TileKey,
    pub x: u8,
    pub z: u8,
}

impl ChunkKey {
    pub const fn new(tile: TileKey, x: u8, z: u8) -> Self {
        Self { tile, x, z }
    }

    pub fn is_valid(self) -> bool {
        self.tile.is_valid() && self.x < CHUNKS_PER_TILE_AXIS && self.z < CHUNKS_PER_TILE_AXIS
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tile({}, {}) chunk({}, {})",
            self.tile.x, self.tile.z, self.x, self.z
        )
    }
}

/// A single terrain vertex, addressed by its chunk and vertex index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexRef {
    pub chunk: ChunkKey,
    pub index: u16,
}

/// Stable unique identifier of a placed object instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectUid(pub u32);

impl fmt::Display for ObjectUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The editable world an [`Action`](super::Action) records and restores.
///
/// Every getter returns `None` when the handle does not name a live
/// entity. Every setter is expected to mark the entity dirty for whatever
/// derived data the implementor owns (normals, bounding boxes, GPU
/// buffers); setters on missing entities are ignored.
pub trait EditableWorld {
    fn terrain(&self, chunk: ChunkKey) -> Option<TerrainCache>;
    fn set_terrain(&mut self, chunk: ChunkKey, cache: &TerrainCache);

    fn texture(&self, chunk: ChunkKey) -> Option<TextureChangeCache>;
    fn set_texture(&mut self, chunk: ChunkKey, cache: &TextureChangeCache);

    fn vertex_colors(&self, chunk: ChunkKey) -> Option<VertexColorCache>;
    fn set_vertex_colors(&mut self, chunk: ChunkKey, cache: &VertexColorCache);

    fn holes(&self, chunk: ChunkKey) -> Option<Holes>;
    fn set_holes(&mut self, chunk: ChunkKey, holes: Holes);

    fn area_id(&self, chunk: ChunkKey) -> Option<AreaId>;
    fn set_area_id(&mut self, chunk: ChunkKey, area_id: AreaId);

    fn chunk_flags(&self, chunk: ChunkKey) -> Option<ChunkFlags>;
    fn set_chunk_flags(&mut self, chunk: ChunkKey, flags: ChunkFlags);

    fn liquids(&self, chunk: ChunkKey) -> Option<LiquidLayers>;
    fn set_liquids(&mut self, chunk: ChunkKey, layers: &LiquidLayers);

    fn shadow_map(&self, chunk: ChunkKey) -> Option<ShadowMapCache>;
    fn set_shadow_map(&mut self, chunk: ChunkKey, cache: &ShadowMapCache);

    /// The current vertex selection. There is always one, possibly empty.
    fn vertex_selection(&self) -> VertexSelectionCache;
    fn restore_vertex_selection(&mut self, cache: &VertexSelectionCache);

    fn object(&self, uid: ObjectUid) -> Option<ObjectInstanceCache>;

    /// Creates an object from a snapshot, preferably under `uid`.
    ///
    /// Returns the uid the object actually received, which differs from
    /// `uid` when the world had to allocate a fresh one.
    fn spawn_object(&mut self, uid: ObjectUid, cache: &ObjectInstanceCache) -> ObjectUid;

    /// Destroys an object. Returns `false` if it did not exist.
    fn despawn_object(&mut self, uid: ObjectUid) -> bool;

    /// Overwrites an existing object's model and placement. Returns `false`
    /// if it did not exist.
    fn reposition_object(&mut self, uid: ObjectUid, cache: &ObjectInstanceCache) -> bool;

    /// Called once after an action has been undone or redone.
    ///
    /// `chunks` holds every chunk the action touched.
    fn refresh_after_apply(&mut self, _flags: ActionFlags, _chunks: &BTreeSet<ChunkKey>) {}
}
