//! End-to-end tests for actions and the history driving a world.

use std::collections::BTreeSet;
use std::time::Duration;

use mapforge_core::HistoryConfig;
use mapforge_core::math::Vec3;
use mapforge_core::undo::cache::CHUNK_VERTICES;
use mapforge_core::undo::{
    Action, ActionFlags, ActionHistory, ActionState, AreaId, ChunkFlags, ChunkKey, EditableWorld,
    Holes, LiquidLayer, LiquidLayers, MemoryWorld, ModalityControllers, ObjectInstanceCache,
    ObjectOp, ObjectUid, ShadowMapCache, TerrainCache, TextureChangeCache, TileKey, VertexColorCache,
    VertexSelectionCache,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn chunk(x: u8, z: u8) -> ChunkKey {
    ChunkKey::new(TileKey::new(30, 31), x, z)
}

fn loaded(keys: &[ChunkKey]) -> MemoryWorld {
    let mut world = MemoryWorld::new();
    for &key in keys {
        world.load_chunk(key);
    }
    world
}

/// Raises every vertex of `key` with a simple cone falloff.
fn sculpt(world: &mut MemoryWorld, key: ChunkKey, strength: f32) {
    if let Some(state) = world.chunk_mut(key) {
        for (i, p) in state.terrain.positions.iter_mut().enumerate() {
            p.y += strength * (1.0 - i as f32 / CHUNK_VERTICES as f32);
        }
    }
}

fn heights(world: &MemoryWorld, key: ChunkKey) -> Vec<f32> {
    world
        .chunk(key)
        .map(|c| c.terrain.positions.iter().map(|p| p.y).collect())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Counting world
// ---------------------------------------------------------------------------

/// Forwards to a [`MemoryWorld`] and counts object lifecycle calls.
#[derive(Default)]
struct CountingWorld {
    inner: MemoryWorld,
    spawns: usize,
    despawns: usize,
    repositions: usize,
    /// Spawn into the lowest free uid, ignoring the requested one.
    lowest_free_uids: bool,
}

impl CountingWorld {
    fn lowest_free_uid(&self) -> ObjectUid {
        (1..)
            .map(ObjectUid)
            .find(|&uid| self.inner.object(uid).is_none())
            .unwrap_or(ObjectUid(u32::MAX))
    }

    fn filenames(&self) -> BTreeSet<(ObjectUid, String)> {
        self.inner
            .objects()
            .map(|(uid, object)| (uid, object.filename.clone()))
            .collect()
    }
}

impl EditableWorld for CountingWorld {
    fn terrain(&self, chunk: ChunkKey) -> Option<TerrainCache> {
        self.inner.terrain(chunk)
    }
    fn set_terrain(&mut self, chunk: ChunkKey, cache: &TerrainCache) {
        self.inner.set_terrain(chunk, cache)
    }
    fn texture(&self, chunk: ChunkKey) -> Option<TextureChangeCache> {
        self.inner.texture(chunk)
    }
    fn set_texture(&mut self, chunk: ChunkKey, cache: &TextureChangeCache) {
        self.inner.set_texture(chunk, cache)
    }
    fn vertex_colors(&self, chunk: ChunkKey) -> Option<VertexColorCache> {
        self.inner.vertex_colors(chunk)
    }
    fn set_vertex_colors(&mut self, chunk: ChunkKey, cache: &VertexColorCache) {
        self.inner.set_vertex_colors(chunk, cache)
    }
    fn holes(&self, chunk: ChunkKey) -> Option<Holes> {
        self.inner.holes(chunk)
    }
    fn set_holes(&mut self, chunk: ChunkKey, holes: Holes) {
        self.inner.set_holes(chunk, holes)
    }
    fn area_id(&self, chunk: ChunkKey) -> Option<AreaId> {
        self.inner.area_id(chunk)
    }
    fn set_area_id(&mut self, chunk: ChunkKey, area_id: AreaId) {
        self.inner.set_area_id(chunk, area_id)
    }
    fn chunk_flags(&self, chunk: ChunkKey) -> Option<ChunkFlags> {
        self.inner.chunk_flags(chunk)
    }
    fn set_chunk_flags(&mut self, chunk: ChunkKey, flags: ChunkFlags) {
        self.inner.set_chunk_flags(chunk, flags)
    }
    fn liquids(&self, chunk: ChunkKey) -> Option<LiquidLayers> {
        self.inner.liquids(chunk)
    }
    fn set_liquids(&mut self, chunk: ChunkKey, layers: &LiquidLayers) {
        self.inner.set_liquids(chunk, layers)
    }
    fn shadow_map(&self, chunk: ChunkKey) -> Option<ShadowMapCache> {
        self.inner.shadow_map(chunk)
    }
    fn set_shadow_map(&mut self, chunk: ChunkKey, cache: &ShadowMapCache) {
        self.inner.set_shadow_map(chunk, cache)
    }
    fn vertex_selection(&self) -> VertexSelectionCache {
        self.inner.vertex_selection()
    }
    fn restore_vertex_selection(&mut self, cache: &VertexSelectionCache) {
        self.inner.restore_vertex_selection(cache)
    }
    fn object(&self, uid: ObjectUid) -> Option<ObjectInstanceCache> {
        self.inner.object(uid)
    }
    fn spawn_object(&mut self, uid: ObjectUid, cache: &ObjectInstanceCache) -> ObjectUid {
        self.spawns += 1;
        let uid = if self.lowest_free_uids {
            self.lowest_free_uid()
        } else {
            uid
        };
        self.inner.spawn_object(uid, cache)
    }
    fn despawn_object(&mut self, uid: ObjectUid) -> bool {
        self.despawns += 1;
        self.inner.despawn_object(uid)
    }
    fn reposition_object(&mut self, uid: ObjectUid, cache: &ObjectInstanceCache) -> bool {
        self.repositions += 1;
        self.inner.reposition_object(uid, cache)
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[test]
fn registering_twice_keeps_one_pre_image() {
    init_logging();
    let c = chunk(0, 0);
    let mut world = loaded(&[c]);
    let mut action = Action::new();

    assert!(action.register_chunk_terrain_change(&world, c).unwrap());
    assert!(!action.register_chunk_terrain_change(&world, c).unwrap());
    assert_eq!(action.registered_count(ActionFlags::CHUNKS_TERRAIN), 1);

    sculpt(&mut world, c, 1.0);
    action.finish(&world).unwrap();
    assert_eq!(action.registered_count(ActionFlags::CHUNKS_TERRAIN), 1);
}

#[test]
fn pre_image_predates_every_sub_stroke() {
    init_logging();
    let c = chunk(1, 1);
    let mut world = loaded(&[c]);
    let original = heights(&world, c);
    let mut action = Action::new();

    // A stroke made of several dabs, each re-registering the chunk.
    for _ in 0..5 {
        action.register_chunk_terrain_change(&world, c).unwrap();
        sculpt(&mut world, c, 2.0);
    }
    action.finish(&world).unwrap();
    action.undo(&mut world, false).unwrap();
    assert_eq!(heights(&world, c), original);
}

#[test]
fn terrain_and_texture_flags_accumulate_alone() {
    init_logging();
    let a = chunk(2, 0);
    let b = chunk(3, 0);
    let world = loaded(&[a, b]);
    let mut action = Action::new();

    action.register_chunk_terrain_change(&world, a).unwrap();
    action.register_chunk_texture_change(&world, b).unwrap();
    assert_eq!(
        action.flags(),
        ActionFlags::CHUNKS_TERRAIN | ActionFlags::CHUNKS_TEXTURE
    );
    assert_eq!(action.label(), "Terrain, Texture");
}

// ---------------------------------------------------------------------------
// Undo / redo
// ---------------------------------------------------------------------------

#[test]
fn terrain_undo_redo_scenario() {
    init_logging();
    let c = chunk(4, 4);
    let mut world = loaded(&[c]);
    let h0 = world.terrain(c).unwrap();

    let mut action = Action::new();
    action.register_chunk_terrain_change(&world, c).unwrap();
    sculpt(&mut world, c, 7.5);
    let h1 = world.terrain(c).unwrap();
    assert_ne!(h0, h1);
    action.finish(&world).unwrap();
    assert_eq!(action.state(), ActionState::Finished);

    action.undo(&mut world, false).unwrap();
    assert_eq!(world.terrain(c).unwrap(), h0);
    assert_eq!(action.state(), ActionState::Undone);

    action.undo(&mut world, true).unwrap();
    assert_eq!(world.terrain(c).unwrap(), h1);

    action.undo(&mut world, true).unwrap();
    assert_eq!(world.terrain(c).unwrap(), h1);
    assert_eq!(action.state(), ActionState::Redone);
}

#[test]
fn every_chunk_category_round_trips() {
    init_logging();
    let c = chunk(5, 6);
    let mut world = loaded(&[c]);
    let before = world.chunk(c).unwrap().clone();

    let mut action = Action::new();
    action.register_all_chunk_changes(&world, c).unwrap();
    if let Some(state) = world.chunk_mut(c) {
        state.terrain = TerrainCache::flat(12.0);
        state.texture.textures.push("tileset/grass.blp".into());
        state.vertex_colors.colors[0] = Vec3::new(0.2, 0.4, 0.6);
        state.holes = Holes(0b1010);
        state.area_id = AreaId(77);
        state.flags |= ChunkFlags::HAS_SHADOWS;
        state.liquids = LiquidLayers(vec![LiquidLayer::flat(2, 3.0)]);
        state.shadows.texels[10] = 0xFF;
    }
    let after = world.chunk(c).unwrap().clone();
    action.finish(&world).unwrap();

    action.undo(&mut world, false).unwrap();
    assert_eq!(world.chunk(c).unwrap(), &before);
    action.undo(&mut world, true).unwrap();
    assert_eq!(world.chunk(c).unwrap(), &after);
    action.undo(&mut world, false).unwrap();
    action.undo(&mut world, false).unwrap();
    assert_eq!(world.chunk(c).unwrap(), &before);
}

#[test]
fn unloaded_chunk_is_skipped_on_apply() {
    init_logging();
    let a = chunk(0, 8);
    let b = chunk(1, 8);
    let mut world = loaded(&[a, b]);
    let mut action = Action::new();

    action.register_chunk_area_id_change(&world, a).unwrap();
    action.register_chunk_area_id_change(&world, b).unwrap();
    world.set_area_id(a, AreaId(1));
    world.set_area_id(b, AreaId(2));
    world.unload_chunk(b);
    action.finish(&world).unwrap();

    action.undo(&mut world, false).unwrap();
    assert_eq!(world.area_id(a), Some(AreaId(0)));
    assert_eq!(world.area_id(b), None);

    // Reloading brings the chunk back in its on-disk state; redo skips it.
    world.load_chunk(b);
    action.undo(&mut world, true).unwrap();
    assert_eq!(world.area_id(a), Some(AreaId(1)));
    assert_eq!(world.area_id(b), Some(AreaId(0)));
}

#[test]
fn refresh_reports_touched_chunks_and_flags() {
    init_logging();
    let a = chunk(9, 9);
    let b = chunk(10, 9);
    let mut world = loaded(&[a, b, chunk(11, 9)]);
    let mut action = Action::new();
    action.register_chunk_terrain_change(&world, a).unwrap();
    action.register_chunk_shadow_change(&world, b).unwrap();
    action.finish(&world).unwrap();

    action.undo(&mut world, false).unwrap();
    let (flags, chunks) = &world.refreshes()[0];
    assert_eq!(
        *flags,
        ActionFlags::CHUNKS_TERRAIN | ActionFlags::CHUNK_SHADOWS
    );
    assert_eq!(chunks, &BTreeSet::from([a, b]));
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

#[test]
fn added_then_removed_object_never_reaches_the_world() {
    init_logging();
    let mut world = CountingWorld::default();
    let mut action = Action::new();

    let uid = world
        .inner
        .place_object(ObjectInstanceCache::new("barrel.m2", Vec3::new(1.0, 2.0, 3.0)));
    action.register_object_added(&world, uid).unwrap();
    action.register_object_transformed(&world, uid).unwrap();
    action.register_object_removed(&world, uid).unwrap();
    world.inner.delete_object(uid);
    action.finish(&world).unwrap();

    action.undo(&mut world, false).unwrap();
    action.undo(&mut world, true).unwrap();
    assert_eq!(world.spawns, 0);
    assert_eq!(world.despawns, 0);
    assert_eq!(world.repositions, 0);
    assert_eq!(world.inner.object_count(), 0);
}

#[test]
fn removed_object_is_recreated_with_its_placement() {
    init_logging();
    let mut world = MemoryWorld::new();
    let mut placed = ObjectInstanceCache::new("statue.m2", Vec3::new(10.0, 0.0, 5.0));
    placed.dir = Vec3::new(0.0, 90.0, 0.0);
    placed.scale = 2.0;
    let uid = world.place_object(placed.clone());

    let mut action = Action::new();
    action.register_object_removed(&world, uid).unwrap();
    world.delete_object(uid);
    action.finish(&world).unwrap();

    action.undo(&mut world, false).unwrap();
    assert_eq!(world.object(uid), Some(placed));
    action.undo(&mut world, true).unwrap();
    assert!(world.object(uid).is_none());
}

#[test]
fn moved_object_restores_both_placements() {
    init_logging();
    let mut world = CountingWorld::default();
    let start = ObjectInstanceCache::new("lamp.m2", Vec3::zeros());
    let uid = world.inner.place_object(start.clone());

    let mut action = Action::new();
    for step in 1..=3 {
        action.register_object_transformed(&world, uid).unwrap();
        if let Some(object) = world.inner.object_mut(uid) {
            object.pos.x = step as f32;
        }
    }
    let end = world.object(uid).unwrap();
    action.finish(&world).unwrap();

    action.undo(&mut world, false).unwrap();
    assert_eq!(world.object(uid), Some(start));
    action.undo(&mut world, true).unwrap();
    assert_eq!(world.object(uid), Some(end));
    assert_eq!(world.spawns, 0);
    assert_eq!(world.repositions, 2);
}

#[test]
fn transformed_then_removed_object_returns_to_original_placement() {
    init_logging();
    let mut world = MemoryWorld::new();
    let original = ObjectInstanceCache::new("cart.m2", Vec3::new(1.0, 0.0, 1.0));
    let uid = world.place_object(original.clone());

    let mut action = Action::new();
    action.register_object_transformed(&world, uid).unwrap();
    if let Some(object) = world.object_mut(uid) {
        object.pos = Vec3::new(9.0, 0.0, 9.0);
    }
    action.register_object_removed(&world, uid).unwrap();
    world.delete_object(uid);
    action.finish(&world).unwrap();

    // Undo restores the placement from before the move, not before the delete.
    action.undo(&mut world, false).unwrap();
    assert_eq!(world.object(uid), Some(original));
    action.undo(&mut world, true).unwrap();
    assert!(world.object(uid).is_none());
    assert_eq!(world.object_count(), 0);
}

#[test]
fn removed_then_readded_object_is_repositioned() {
    init_logging();
    let mut world = CountingWorld::default();
    let before = ObjectInstanceCache::new("well.wmo", Vec3::new(2.0, 0.0, 2.0));
    let uid = world.inner.place_object(before.clone());

    let mut action = Action::new();
    action.register_object_removed(&world, uid).unwrap();
    world.inner.delete_object(uid);
    let after = ObjectInstanceCache::new("well.wmo", Vec3::new(6.0, 1.0, 2.0));
    assert_eq!(world.inner.spawn_object(uid, &after), uid);
    action.register_object_added(&world, uid).unwrap();
    action.finish(&world).unwrap();
    assert_eq!(action.object_ops(uid).map(<[_]>::len), Some(2));

    action.undo(&mut world, false).unwrap();
    assert_eq!(world.object(uid), Some(before));
    action.undo(&mut world, true).unwrap();
    assert_eq!(world.object(uid), Some(after));
    assert_eq!(world.spawns, 0);
    assert_eq!(world.despawns, 0);
    assert_eq!(world.repositions, 2);
}

#[test]
fn merged_transforms_keep_first_and_last_placement() {
    init_logging();
    let mut world = MemoryWorld::new();
    let start = ObjectInstanceCache::new("cart.m2", Vec3::zeros());
    let uid = world.place_object(start.clone());
    let window = Duration::from_secs(60);

    let drag = |world: &mut MemoryWorld, x: f32| {
        let mut action = Action::new();
        action.set_modality_controllers(ModalityControllers::LMB);
        action.register_object_transformed(&*world, uid).unwrap();
        if let Some(object) = world.object_mut(uid) {
            object.pos.x = x;
        }
        action.finish(&*world).unwrap();
        action
    };
    let mut first = drag(&mut world, 3.0);
    let second = drag(&mut world, 8.0);
    let end = world.object(uid).unwrap();

    assert!(first.merge(second, window).is_none());
    assert_eq!(
        first.object_ops(uid),
        Some(&[ObjectOp::Transformed, ObjectOp::Transformed][..])
    );

    first.undo(&mut world, false).unwrap();
    assert_eq!(world.object(uid), Some(start));
    first.undo(&mut world, true).unwrap();
    assert_eq!(world.object(uid), Some(end));
}

#[test]
fn recreated_uid_colliding_with_recorded_object_stays_consistent() {
    init_logging();
    let mut world = CountingWorld {
        lowest_free_uids: true,
        ..CountingWorld::default()
    };
    for name in ["a.m2", "gap.m2", "c.m2", "d.m2", "e.m2"] {
        world.inner.place_object(ObjectInstanceCache::new(name, Vec3::zeros()));
    }
    world.inner.delete_object(ObjectUid(2));

    // One action places an object into the freed uid 2 and deletes uid 5.
    let mut action = Action::new();
    let placed = ObjectInstanceCache::new("new.m2", Vec3::zeros());
    assert_eq!(world.inner.spawn_object(ObjectUid(2), &placed), ObjectUid(2));
    action.register_object_added(&world, ObjectUid(2)).unwrap();
    action.register_object_removed(&world, ObjectUid(5)).unwrap();
    world.inner.delete_object(ObjectUid(5));
    action.finish(&world).unwrap();
    let after = world.filenames();

    // Undo frees uid 2 before recreating uid 5, which the world puts at 2.
    let remaps = action.undo(&mut world, false).unwrap();
    let names: BTreeSet<_> = world.filenames().into_iter().map(|(_, n)| n).collect();
    assert_eq!(
        names,
        BTreeSet::from(["a.m2", "c.m2", "d.m2", "e.m2"].map(String::from))
    );
    assert_eq!(remaps.len(), 1);
    let recreated = remaps[0].new;
    assert_eq!(action.object_ops(recreated), Some(&[ObjectOp::Removed][..]));

    // Redo removes the recreated object and brings back the placed one.
    action.undo(&mut world, true).unwrap();
    let names: BTreeSet<_> = world.filenames().into_iter().map(|(_, n)| n).collect();
    let expected: BTreeSet<_> = after.into_iter().map(|(_, n)| n).collect();
    assert_eq!(names, expected);
    assert_eq!(world.inner.object_count(), 4);

    // And the cycle repeats cleanly.
    action.undo(&mut world, false).unwrap();
    assert!(world.filenames().iter().any(|(_, n)| n == "e.m2"));
    assert!(!world.filenames().iter().any(|(_, n)| n == "new.m2"));
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[test]
fn history_walks_a_session_back_and_forth() {
    init_logging();
    let c = chunk(7, 7);
    let mut world = loaded(&[c]);
    let mut history = ActionHistory::new(10);
    let mut snapshots = vec![heights(&world, c)];

    for _ in 0..4 {
        history
            .begin_action()
            .register_chunk_terrain_change(&world, c)
            .unwrap();
        sculpt(&mut world, c, 1.5);
        history.end_action(&world).unwrap();
        snapshots.push(heights(&world, c));
    }

    for expected in snapshots.iter().rev().skip(1) {
        history.undo(&mut world).unwrap();
        assert_eq!(&heights(&world, c), expected);
    }
    assert!(!history.can_undo());

    for expected in snapshots.iter().skip(1) {
        history.redo(&mut world).unwrap();
        assert_eq!(&heights(&world, c), expected);
    }
    assert!(!history.can_redo());
}

#[test]
fn merged_stroke_undoes_in_one_step() {
    init_logging();
    let config = HistoryConfig::from_toml_str("merge_window_ms = 60000").unwrap();
    let a = chunk(0, 12);
    let b = chunk(1, 12);
    let mut world = loaded(&[a, b]);
    let mut history = ActionHistory::with_config(&config);

    for key in [a, b, a] {
        let action = history.begin_action();
        action.set_modality_controllers(ModalityControllers::LMB);
        action.register_chunk_terrain_change(&world, key).unwrap();
        sculpt(&mut world, key, 1.0);
        history.end_action(&world).unwrap();
    }
    assert_eq!(history.undo_count(), 1);

    history.undo(&mut world).unwrap();
    assert!(heights(&world, a).iter().all(|&h| h == 0.0));
    assert!(heights(&world, b).iter().all(|&h| h == 0.0));
}

#[test]
fn history_keeps_object_uids_in_sync() {
    init_logging();
    let mut world = MemoryWorld::new();
    world.set_reuse_uids(false);
    let mut history = ActionHistory::new(10);

    let uid = world.place_object(ObjectInstanceCache::new("crate.m2", Vec3::zeros()));
    history
        .begin_action()
        .register_object_added(&world, uid)
        .unwrap();
    history.end_action(&world).unwrap();

    history
        .begin_action()
        .register_object_transformed(&world, uid)
        .unwrap();
    if let Some(object) = world.object_mut(uid) {
        object.pos = Vec3::new(4.0, 0.0, 4.0);
    }
    history.end_action(&world).unwrap();

    // Undo the move, then the placement; redo both. The placement redo
    // recreates the object under a fresh uid and the move must follow it.
    history.undo(&mut world).unwrap();
    history.undo(&mut world).unwrap();
    assert_eq!(world.object_count(), 0);
    history.redo(&mut world).unwrap();
    history.redo(&mut world).unwrap();

    let objects: Vec<_> = world.objects().collect();
    assert_eq!(objects.len(), 1);
    assert_ne!(objects[0].0, uid);
    assert_eq!(objects[0].1.pos, Vec3::new(4.0, 0.0, 4.0));
}
