//! In-memory [`EditableWorld`] for tests, benchmarks and headless tools.

use std::collections::{BTreeMap, BTreeSet};

use super::cache::{
    AreaId, ChunkFlags, Holes, LiquidLayers, ObjectInstanceCache, ShadowMapCache, TerrainCache,
    TextureChangeCache, VertexColorCache, VertexSelectionCache,
};
use super::flags::ActionFlags;
use super::world::{ChunkKey, EditableWorld, ObjectUid, VertexRef};
use crate::math;

/// Everything an action can snapshot about one chunk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkState {
    pub terrain: TerrainCache,
    pub texture: TextureChangeCache,
    pub vertex_colors: VertexColorCache,
    pub holes: Holes,
    pub area_id: AreaId,
    pub flags: ChunkFlags,
    pub liquids: LiquidLayers,
    pub shadows: ShadowMapCache,
}

/// A world held entirely in memory.
///
/// Tracks which chunks were written since the last [`take_dirty`](Self::take_dirty)
/// and every refresh notification it received.
#[derive(Debug)]
pub struct MemoryWorld {
    chunks: BTreeMap<ChunkKey, ChunkState>,
    objects: BTreeMap<ObjectUid, ObjectInstanceCache>,
    next_uid: u32,
    reuse_uids: bool,
    selection: VertexSelectionCache,
    dirty: BTreeSet<ChunkKey>,
    refreshes: Vec<(ActionFlags, BTreeSet<ChunkKey>)>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self {
            chunks: BTreeMap::new(),
            objects: BTreeMap::new(),
            next_uid: 1,
            reuse_uids: true,
            selection: VertexSelectionCache::default(),
            dirty: BTreeSet::new(),
            refreshes: Vec::new(),
        }
    }

    /// When disabled, [`spawn_object`](EditableWorld::spawn_object) always
    /// allocates a fresh uid, like a world whose uid counter never rewinds.
    pub fn set_reuse_uids(&mut self, reuse: bool) {
        self.reuse_uids = reuse;
    }

    // ----- chunks --------------------------------------------------------

    /// Loads a flat, untextured chunk. Existing chunks are left alone.
    pub fn load_chunk(&mut self, key: ChunkKey) {
        self.chunks.entry(key).or_default();
    }

    pub fn unload_chunk(&mut self, key: ChunkKey) -> Option<ChunkState> {
        self.chunks.remove(&key)
    }

    pub fn chunk(&self, key: ChunkKey) -> Option<&ChunkState> {
        self.chunks.get(&key)
    }

    /// Mutable access for tools. Marks the chunk dirty.
    pub fn chunk_mut(&mut self, key: ChunkKey) -> Option<&mut ChunkState> {
        let state = self.chunks.get_mut(&key)?;
        self.dirty.insert(key);
        Some(state)
    }

    pub fn chunk_keys(&self) -> impl Iterator<Item = ChunkKey> + '_ {
        self.chunks.keys().copied()
    }

    /// Chunks written since the last call.
    pub fn take_dirty(&mut self) -> BTreeSet<ChunkKey> {
        std::mem::take(&mut self.dirty)
    }

    /// Refresh notifications received so far, oldest first.
    pub fn refreshes(&self) -> &[(ActionFlags, BTreeSet<ChunkKey>)] {
        &self.refreshes
    }

    // ----- objects -------------------------------------------------------

    /// Creates an object under a fresh uid.
    pub fn place_object(&mut self, cache: ObjectInstanceCache) -> ObjectUid {
        let uid = ObjectUid(self.next_uid);
        self.next_uid = self.next_uid.saturating_add(1);
        self.objects.insert(uid, cache);
        uid
    }

    pub fn object_mut(&mut self, uid: ObjectUid) -> Option<&mut ObjectInstanceCache> {
        self.objects.get_mut(&uid)
    }

    pub fn delete_object(&mut self, uid: ObjectUid) -> Option<ObjectInstanceCache> {
        self.objects.remove(&uid)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectUid, &ObjectInstanceCache)> {
        self.objects.iter().map(|(uid, cache)| (*uid, cache))
    }

    // ----- selection -----------------------------------------------------

    /// Adds vertices of `chunk` to the selection and recomputes its center.
    pub fn select_vertices(&mut self, chunk: ChunkKey, indices: impl IntoIterator<Item = u16>) {
        let Some(state) = self.chunks.get(&chunk) else {
            return;
        };
        let positions = &state.terrain.positions;
        let count = positions.len();
        let mut added = false;
        for index in indices {
            if usize::from(index) < count {
                self.selection.vertices.insert(VertexRef { chunk, index });
                added = true;
            }
        }
        if !added {
            return;
        }
        self.selection.chunks.insert(chunk);
        self.selection.tiles.insert(chunk.tile);
        let chunks = &self.chunks;
        let selected: Vec<_> = self
            .selection
            .vertices
            .iter()
            .filter_map(|v| {
                chunks
                    .get(&v.chunk)
                    .map(|c| c.terrain.positions[usize::from(v.index)])
            })
            .collect();
        self.selection.center = math::centroid(&selected);
    }

    pub fn clear_selection(&mut self) {
        self.selection = VertexSelectionCache::default();
    }
}

impl Default for MemoryWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl EditableWorld for MemoryWorld {
    fn terrain(&self, chunk: ChunkKey) -> Option<TerrainCache> {
        self.chunk(chunk).map(|c| c.terrain.clone())
    }

    fn set_terrain(&mut self, chunk: ChunkKey, cache: &TerrainCache) {
        if let Some(c) = self.chunk_mut(chunk) {
            c.terrain.clone_from(cache);
        }
    }

    fn texture(&self, chunk: ChunkKey) -> Option<TextureChangeCache> {
        self.chunk(chunk).map(|c| c.texture.clone())
    }

    fn set_texture(&mut self, chunk: ChunkKey, cache: &TextureChangeCache) {
        if let Some(c) = self.chunk_mut(chunk) {
            c.texture.clone_from(cache);
        }
    }

    fn vertex_colors(&self, chunk: ChunkKey) -> Option<VertexColorCache> {
        self.chunk(chunk).map(|c| c.vertex_colors.clone())
    }

    fn set_vertex_colors(&mut self, chunk: ChunkKey, cache: &VertexColorCache) {
        if let Some(c) = self.chunk_mut(chunk) {
            c.vertex_colors.clone_from(cache);
        }
    }

    fn holes(&self, chunk: ChunkKey) -> Option<Holes> {
        self.chunk(chunk).map(|c| c.holes)
    }

    fn set_holes(&mut self, chunk: ChunkKey, holes: Holes) {
        if let Some(c) = self.chunk_mut(chunk) {
            c.holes = holes;
        }
    }

    fn area_id(&self, chunk: ChunkKey) -> Option<AreaId> {
        self.chunk(chunk).map(|c| c.area_id)
    }

    fn set_area_id(&mut self, chunk: ChunkKey, area_id: AreaId) {
        if let Some(c) = self.chunk_mut(chunk) {
            c.area_id = area_id;
        }
    }

    fn chunk_flags(&self, chunk: ChunkKey) -> Option<ChunkFlags> {
        self.chunk(chunk).map(|c| c.flags)
    }

    fn set_chunk_flags(&mut self, chunk: ChunkKey, flags: ChunkFlags) {
        if let Some(c) = self.chunk_mut(chunk) {
            c.flags = flags;
        }
    }

    fn liquids(&self, chunk: ChunkKey) -> Option<LiquidLayers> {
        self.chunk(chunk).map(|c| c.liquids.clone())
    }

    fn set_liquids(&mut self, chunk: ChunkKey, layers: &LiquidLayers) {
        if let Some(c) = self.chunk_mut(chunk) {
            c.liquids.clone_from(layers);
        }
    }

    fn shadow_map(&self, chunk: ChunkKey) -> Option<ShadowMapCache> {
        self.chunk(chunk).map(|c| c.shadows.clone())
    }

    fn set_shadow_map(&mut self, chunk: ChunkKey, cache: &ShadowMapCache) {
        if let Some(c) = self.chunk_mut(chunk) {
            c.shadows.clone_from(cache);
        }
    }

    fn vertex_selection(&self) -> VertexSelectionCache {
        self.selection.clone()
    }

    fn restore_vertex_selection(&mut self, cache: &VertexSelectionCache) {
        self.selection.clone_from(cache);
    }

    fn object(&self, uid: ObjectUid) -> Option<ObjectInstanceCache> {
        self.objects.get(&uid).cloned()
    }

    fn spawn_object(&mut self, uid: ObjectUid, cache: &ObjectInstanceCache) -> ObjectUid {
        if self.reuse_uids && !self.objects.contains_key(&uid) {
            self.next_uid = self.next_uid.max(uid.0.saturating_add(1));
            self.objects.insert(uid, cache.clone());
            return uid;
        }
        self.place_object(cache.clone())
    }

    fn despawn_object(&mut self, uid: ObjectUid) -> bool {
        self.objects.remove(&uid).is_some()
    }

    fn reposition_object(&mut self, uid: ObjectUid, cache: &ObjectInstanceCache) -> bool {
        match self.objects.get_mut(&uid) {
            Some(object) => {
                object.clone_from(cache);
                true
            }
            None => false,
        }
    }

    fn refresh_after_apply(&mut self, flags: ActionFlags, chunks: &BTreeSet<ChunkKey>) {
        self.refreshes.push((flags, chunks.clone()));
    }
}
