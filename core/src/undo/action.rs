//! One atomic, undoable edit.
//!
//! An [`Action`] is created when an edit gesture begins. Tools call the
//! `register_*` methods *before* mutating an entity; the first registration
//! of an entity in a category captures its pre-image, later ones are
//! no-ops. [`Action::finish`] seals the action and captures post-images,
//! after which [`Action::undo`] can write either side back onto the world
//! any number of times.
//!
//! Objects are keyed by [`ObjectUid`] and carry an operation log so that an
//! add, transform and remove of the same object within one action collapse
//! into a single create, destroy or reposition on undo/redo.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::time::{Duration, Instant};

use super::cache::{
    AreaId, ChunkCache, ChunkFlags, Holes, LiquidLayers, ObjectInstanceCache, ShadowMapCache,
    TerrainCache, TextureChangeCache, VertexColorCache, VertexSelectionCache,
};
use super::flags::{ActionFlags, ModalityControllers};
use super::object_ops::{NetEffect, ObjectOp, ObjectOpLog};
use super::table::{ChangeTable, Direction};
use super::world::{ChunkKey, EditableWorld, ObjectUid};
use crate::error::{ActionError, ActionResult};

/// Lifecycle of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    /// Accepting registrations.
    Recording,
    /// Sealed, post-images captured, never applied.
    Finished,
    /// Pre-images were applied last.
    Undone,
    /// Post-images were applied last.
    Redone,
}

/// An object that received a new uid while being recreated.
///
/// Applied with [`Action::remap_uid`]: records under `old` move to `new` and
/// any record already under `new`, which names an object absent from the
/// world, moves to `old`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UidRemap {
    pub old: ObjectUid,
    pub new: ObjectUid,
}

/// One atomic, undoable edit operation.
pub struct Action {
    flags: ActionFlags,
    modality: ModalityControllers,
    state: ActionState,
    started_at: Instant,
    finished_at: Option<Instant>,

    terrain: ChangeTable<ChunkKey, TerrainCache>,
    texture: ChangeTable<ChunkKey, TextureChangeCache>,
    vertex_colors: ChangeTable<ChunkKey, VertexColorCache>,
    holes: ChangeTable<ChunkKey, Holes>,
    area_ids: ChangeTable<ChunkKey, AreaId>,
    chunk_flags: ChangeTable<ChunkKey, ChunkFlags>,
    liquids: ChangeTable<ChunkKey, LiquidLayers>,
    shadows: ChangeTable<ChunkKey, ShadowMapCache>,
    vertex_selection: ChangeTable<(), VertexSelectionCache>,

    /// Snapshot right after the first add, used when redo has nothing newer.
    added_objects: ChangeTable<ObjectUid, ObjectInstanceCache>,
    /// Snapshot right before the first removal.
    removed_objects: ChangeTable<ObjectUid, ObjectInstanceCache>,
    /// Snapshot before the first transform; post captured at finish.
    transformed_objects: ChangeTable<ObjectUid, ObjectInstanceCache>,
    /// Final state of every object that exists once the action finished.
    objects_post: HashMap<ObjectUid, ObjectInstanceCache>,
    object_ops: BTreeMap<ObjectUid, ObjectOpLog>,
}

/// Registers `chunk` in one chunk table and sets the category flag.
fn register_chunk<C, W>(
    table: &mut ChangeTable<ChunkKey, C>,
    flags: &mut ActionFlags,
    world: &W,
    chunk: ChunkKey,
) -> bool
where
    C: ChunkCache,
    W: EditableWorld + ?Sized,
{
    if !chunk.is_valid() {
        log::trace!("Ignoring registration of out-of-range chunk {chunk}");
        return false;
    }
    let captured = table.register(chunk, || C::capture(world, chunk));
    if table.contains(chunk) {
        *flags |= C::FLAG;
    } else {
        log::trace!("Ignoring registration of unloaded chunk {chunk}");
    }
    captured
}

fn finish_chunks<C, W>(table: &mut ChangeTable<ChunkKey, C>, world: &W)
where
    C: ChunkCache,
    W: EditableWorld + ?Sized,
{
    for chunk in table.capture_post(|key| C::capture(world, key)) {
        log::warn!("Chunk {chunk} unloaded before action finished; redo will skip it");
    }
}

fn restore_chunks<C, W>(table: &ChangeTable<ChunkKey, C>, world: &mut W, direction: Direction)
where
    C: ChunkCache,
    W: EditableWorld + ?Sized,
{
    for (chunk, cache) in table.entries(direction) {
        cache.restore(world, chunk);
    }
}

/// Recreates an object, or overwrites it if it is already present.
fn spawn_or_reposition<W: EditableWorld + ?Sized>(
    world: &mut W,
    uid: ObjectUid,
    cache: &ObjectInstanceCache,
) -> ObjectUid {
    if world.object(uid).is_some() {
        world.reposition_object(uid, cache);
        uid
    } else {
        world.spawn_object(uid, cache)
    }
}

impl Action {
    /// Starts a recording action with nothing registered.
    pub fn new() -> Self {
        Self {
            flags: ActionFlags::empty(),
            modality: ModalityControllers::empty(),
            state: ActionState::Recording,
            started_at: Instant::now(),
            finished_at: None,
            terrain: ChangeTable::new(),
            texture: ChangeTable::new(),
            vertex_colors: ChangeTable::new(),
            holes: ChangeTable::new(),
            area_ids: ChangeTable::new(),
            chunk_flags: ChangeTable::new(),
            liquids: ChangeTable::new(),
            shadows: ChangeTable::new(),
            vertex_selection: ChangeTable::new(),
            added_objects: ChangeTable::new(),
            removed_objects: ChangeTable::new(),
            transformed_objects: ChangeTable::new(),
            objects_post: HashMap::new(),
            object_ops: BTreeMap::new(),
        }
    }

    // ----- flags ---------------------------------------------------------

    /// Categories recorded so far.
    pub fn flags(&self) -> ActionFlags {
        self.flags
    }

    /// Replaces the recorded categories.
    pub fn set_flags(&mut self, flags: ActionFlags) {
        self.flags = flags;
    }

    /// Adds `flags` to the recorded categories.
    pub fn add_flags(&mut self, flags: ActionFlags) {
        self.flags |= flags;
    }

    /// Input held while the action was recorded. Only actions with the
    /// same non-empty modality merge.
    pub fn modality_controllers(&self) -> ModalityControllers {
        self.modality
    }

    /// Replaces the recorded modality.
    pub fn set_modality_controllers(&mut self, modality: ModalityControllers) {
        self.modality = modality;
    }

    /// Adds `modality` to the recorded modality.
    pub fn add_modality_controllers(&mut self, modality: ModalityControllers) {
        self.modality |= modality;
    }

    /// Where the action is in its record, undo and redo cycle.
    pub fn state(&self) -> ActionState {
        self.state
    }

    /// Returns `true` until [`finish`](Self::finish) succeeds.
    pub fn is_recording(&self) -> bool {
        self.state == ActionState::Recording
    }

    /// Returns `true` if no category has been recorded.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Names of the recorded categories, for history listings.
    pub fn label(&self) -> String {
        self.flags.describe()
    }

    fn ensure_recording(&self) -> ActionResult {
        if self.is_recording() {
            Ok(())
        } else {
            log::debug!("Rejected registration on sealed action ({})", self.label());
            Err(ActionError::Sealed)
        }
    }

    // ----- chunk registration ------------------------------------------

    /// Captures the terrain of `chunk` unless already registered.
    ///
    /// Returns `Ok(true)` if a pre-image was captured, `Ok(false)` if the
    /// chunk was already registered or is not loaded.
    pub fn register_chunk_terrain_change<W>(&mut self, world: &W, chunk: ChunkKey) -> ActionResult<bool>
    where
        W: EditableWorld + ?Sized,
    {
        self.ensure_recording()?;
        Ok(register_chunk(&mut self.terrain, &mut self.flags, world, chunk))
    }

    /// Captures the texture layers and alpha maps of `chunk`.
    pub fn register_chunk_texture_change<W>(&mut self, world: &W, chunk: ChunkKey) -> ActionResult<bool>
    where
        W: EditableWorld + ?Sized,
    {
        self.ensure_recording()?;
        Ok(register_chunk(&mut self.texture, &mut self.flags, world, chunk))
    }

    /// Captures the vertex colors of `chunk`.
    pub fn register_chunk_vertex_color_change<W>(
        &mut self,
        world: &W,
        chunk: ChunkKey,
    ) -> ActionResult<bool>
    where
        W: EditableWorld + ?Sized,
    {
        self.ensure_recording()?;
        Ok(register_chunk(&mut self.vertex_colors, &mut self.flags, world, chunk))
    }

    /// Captures the hole mask of `chunk`.
    pub fn register_chunk_hole_change<W>(&mut self, world: &W, chunk: ChunkKey) -> ActionResult<bool>
    where
        W: EditableWorld + ?Sized,
    {
        self.ensure_recording()?;
        Ok(register_chunk(&mut self.holes, &mut self.flags, world, chunk))
    }

    /// Captures the area id of `chunk`.
    pub fn register_chunk_area_id_change<W>(&mut self, world: &W, chunk: ChunkKey) -> ActionResult<bool>
    where
        W: EditableWorld + ?Sized,
    {
        self.ensure_recording()?;
        Ok(register_chunk(&mut self.area_ids, &mut self.flags, world, chunk))
    }

    /// Captures the flags of `chunk`.
    pub fn register_chunk_flag_change<W>(&mut self, world: &W, chunk: ChunkKey) -> ActionResult<bool>
    where
        W: EditableWorld + ?Sized,
    {
        self.ensure_recording()?;
        Ok(register_chunk(&mut self.chunk_flags, &mut self.flags, world, chunk))
    }

    /// Captures the liquid layers of `chunk`.
    pub fn register_chunk_liquid_change<W>(&mut self, world: &W, chunk: ChunkKey) -> ActionResult<bool>
    where
        W: EditableWorld + ?Sized,
    {
        self.ensure_recording()?;
        Ok(register_chunk(&mut self.liquids, &mut self.flags, world, chunk))
    }

    /// Captures the shadow map of `chunk`.
    ///
    /// Like the other `register_chunk_*` methods this returns `Ok(false)`
    /// for a chunk that is already registered or not loaded.
    pub fn register_chunk_shadow_change<W>(&mut self, world: &W, chunk: ChunkKey) -> ActionResult<bool>
    where
        W: EditableWorld + ?Sized,
    {
        self.ensure_recording()?;
        Ok(register_chunk(&mut self.shadows, &mut self.flags, world, chunk))
    }

    /// Registers every per-chunk category for `chunk`.
    ///
    /// Returns `Ok(true)` if any category captured a new pre-image.
    pub fn register_all_chunk_changes<W>(&mut self, world: &W, chunk: ChunkKey) -> ActionResult<bool>
    where
        W: EditableWorld + ?Sized,
    {
        self.ensure_recording()?;
        let flags = &mut self.flags;
        let captured = [
            register_chunk(&mut self.terrain, flags, world, chunk),
            register_chunk(&mut self.texture, flags, world, chunk),
            register_chunk(&mut self.vertex_colors, flags, world, chunk),
            register_chunk(&mut self.holes, flags, world, chunk),
            register_chunk(&mut self.area_ids, flags, world, chunk),
            register_chunk(&mut self.chunk_flags, flags, world, chunk),
            register_chunk(&mut self.liquids, flags, world, chunk),
            register_chunk(&mut self.shadows, flags, world, chunk),
        ];
        Ok(captured.contains(&true))
    }

    /// Captures the current vertex selection unless already registered.
    pub fn register_vertex_selection_change<W>(&mut self, world: &W) -> ActionResult<bool>
    where
        W: EditableWorld + ?Sized,
    {
        self.ensure_recording()?;
        self.flags |= ActionFlags::VERTEX_SELECTION;
        Ok(self
            .vertex_selection
            .register((), || Some(world.vertex_selection())))
    }

    // ----- object registration -----------------------------------------

    /// Records that `uid` was just created. Call after the object exists.
    pub fn register_object_added<W>(&mut self, world: &W, uid: ObjectUid) -> ActionResult<bool>
    where
        W: EditableWorld + ?Sized,
    {
        self.ensure_recording()?;
        let Some(snapshot) = world.object(uid) else {
            log::trace!("Ignoring add of unknown object {uid}");
            return Ok(false);
        };
        self.added_objects.register(uid, || Some(snapshot));
        self.push_object_op(uid, ObjectOp::Added);
        self.flags |= ActionFlags::OBJECTS_ADDED;
        Ok(true)
    }

    /// Records that `uid` is about to be destroyed. Call before removing it.
    pub fn register_object_removed<W>(&mut self, world: &W, uid: ObjectUid) -> ActionResult<bool>
    where
        W: EditableWorld + ?Sized,
    {
        self.ensure_recording()?;
        let Some(snapshot) = world.object(uid) else {
            log::trace!("Ignoring removal of unknown object {uid}");
            return Ok(false);
        };
        self.removed_objects.register(uid, || Some(snapshot));
        self.push_object_op(uid, ObjectOp::Removed);
        self.flags |= ActionFlags::OBJECTS_REMOVED;
        Ok(true)
    }

    /// Records that `uid` is about to be moved, rotated or scaled.
    ///
    /// Only the first call per object captures a pre-image.
    pub fn register_object_transformed<W>(&mut self, world: &W, uid: ObjectUid) -> ActionResult<bool>
    where
        W: EditableWorld + ?Sized,
    {
        self.ensure_recording()?;
        if world.object(uid).is_none() {
            log::trace!("Ignoring transform of unknown object {uid}");
            return Ok(false);
        }
        let captured = self.transformed_objects.register(uid, || world.object(uid));
        let repeated = self
            .object_ops
            .get(&uid)
            .and_then(|log| log.ops().last().copied())
            == Some(ObjectOp::Transformed);
        if !repeated {
            self.push_object_op(uid, ObjectOp::Transformed);
        }
        self.flags |= ActionFlags::OBJECTS_TRANSFORMED;
        Ok(captured)
    }

    fn push_object_op(&mut self, uid: ObjectUid, op: ObjectOp) {
        self.object_ops.entry(uid).or_default().push(op);
    }

    /// The operation log recorded for `uid`.
    pub fn object_ops(&self, uid: ObjectUid) -> Option<&[ObjectOp]> {
        self.object_ops.get(&uid).map(ObjectOpLog::ops)
    }

    /// Number of entities with a pre-image in a single category.
    pub fn registered_count(&self, category: ActionFlags) -> usize {
        match category {
            c if c == ActionFlags::CHUNKS_TERRAIN => self.terrain.len(),
            c if c == ActionFlags::CHUNKS_TEXTURE => self.texture.len(),
            c if c == ActionFlags::CHUNKS_VERTEX_COLOR => self.vertex_colors.len(),
            c if c == ActionFlags::CHUNKS_HOLES => self.holes.len(),
            c if c == ActionFlags::CHUNKS_AREAID => self.area_ids.len(),
            c if c == ActionFlags::CHUNKS_FLAGS => self.chunk_flags.len(),
            c if c == ActionFlags::CHUNKS_WATER => self.liquids.len(),
            c if c == ActionFlags::CHUNK_SHADOWS => self.shadows.len(),
            c if c == ActionFlags::VERTEX_SELECTION => self.vertex_selection.len(),
            c if c == ActionFlags::OBJECTS_ADDED => self.added_objects.len(),
            c if c == ActionFlags::OBJECTS_REMOVED => self.removed_objects.len(),
            c if c == ActionFlags::OBJECTS_TRANSFORMED => self.transformed_objects.len(),
            _ => 0,
        }
    }

    /// Every chunk registered in any chunk category.
    pub fn touched_chunks(&self) -> BTreeSet<ChunkKey> {
        let mut chunks = BTreeSet::new();
        chunks.extend(self.terrain.keys());
        chunks.extend(self.texture.keys());
        chunks.extend(self.vertex_colors.keys());
        chunks.extend(self.holes.keys());
        chunks.extend(self.area_ids.keys());
        chunks.extend(self.chunk_flags.keys());
        chunks.extend(self.liquids.keys());
        chunks.extend(self.shadows.keys());
        chunks
    }

    // ----- finish --------------------------------------------------------

    /// Seals the action and captures the post-image of every registered entity.
    pub fn finish<W>(&mut self, world: &W) -> ActionResult
    where
        W: EditableWorld + ?Sized,
    {
        if !self.is_recording() {
            return Err(ActionError::Sealed);
        }

        finish_chunks(&mut self.terrain, world);
        finish_chunks(&mut self.texture, world);
        finish_chunks(&mut self.vertex_colors, world);
        finish_chunks(&mut self.holes, world);
        finish_chunks(&mut self.area_ids, world);
        finish_chunks(&mut self.chunk_flags, world);
        finish_chunks(&mut self.liquids, world);
        finish_chunks(&mut self.shadows, world);
        self.vertex_selection
            .capture_post(|()| Some(world.vertex_selection()));

        // Transformed objects may legitimately be gone (removed later on).
        self.transformed_objects.capture_post(|uid| world.object(uid));

        self.objects_post.clear();
        for (&uid, log) in &self.object_ops {
            if !matches!(log.net_effect(uid), NetEffect::Created | NetEffect::Moved) {
                continue;
            }
            match world.object(uid) {
                Some(snapshot) => {
                    self.objects_post.insert(uid, snapshot);
                }
                None => log::warn!("Object {uid} vanished before action finished"),
            }
        }

        self.state = ActionState::Finished;
        self.finished_at = Some(Instant::now());
        log::debug!(
            "Finished action [{}]: {} chunks, {} objects",
            self.label(),
            self.touched_chunks().len(),
            self.object_ops.len()
        );
        Ok(())
    }

    // ----- undo / redo ---------------------------------------------------

    /// Writes pre-images (`redo == false`) or post-images (`redo == true`)
    /// back onto the world.
    ///
    /// Applying the same direction twice leaves the world as after the
    /// first call. Returns the uids that changed while recreating objects.
    pub fn undo<W>(&mut self, world: &mut W, redo: bool) -> ActionResult<Vec<UidRemap>>
    where
        W: EditableWorld + ?Sized,
    {
        if self.is_recording() {
            return Err(ActionError::NotFinished);
        }
        let direction = Direction::from_redo(redo);

        restore_chunks(&self.terrain, world, direction);
        restore_chunks(&self.texture, world, direction);
        restore_chunks(&self.vertex_colors, world, direction);
        restore_chunks(&self.holes, world, direction);
        restore_chunks(&self.area_ids, world, direction);
        restore_chunks(&self.chunk_flags, world, direction);
        restore_chunks(&self.liquids, world, direction);
        restore_chunks(&self.shadows, world, direction);
        for ((), selection) in self.vertex_selection.entries(direction) {
            world.restore_vertex_selection(selection);
        }

        let remaps = self.apply_objects(world, redo);

        world.refresh_after_apply(self.flags, &self.touched_chunks());
        self.state = if redo {
            ActionState::Redone
        } else {
            ActionState::Undone
        };
        log::debug!(
            "{} action [{}]",
            if redo { "Redid" } else { "Undid" },
            self.label()
        );
        Ok(remaps)
    }

    fn apply_objects<W>(&mut self, world: &mut W, redo: bool) -> Vec<UidRemap>
    where
        W: EditableWorld + ?Sized,
    {
        let mut pending: Vec<(ObjectUid, NetEffect)> = self
            .object_ops
            .iter()
            .map(|(&uid, log)| (uid, log.net_effect(uid)))
            .collect();

        let mut remaps = Vec::new();
        for i in 0..pending.len() {
            let (uid, effect) = pending[i];
            let current = match effect {
                NetEffect::Unchanged => uid,
                NetEffect::Created => self.handle_object_added(world, uid, redo),
                NetEffect::Destroyed => self.handle_object_removed(world, uid, redo),
                NetEffect::Moved => self.handle_object_transformed(world, uid, redo),
            };
            if current != uid {
                log::warn!("Object {uid} was recreated as {current}");
                self.remap_uid(uid, current);
                // A record still waiting under `current` now lives under `uid`.
                for entry in &mut pending[i + 1..] {
                    if entry.0 == current {
                        entry.0 = uid;
                    }
                }
                remaps.push(UidRemap { old: uid, new: current });
            }
        }
        remaps
    }

    /// State of `uid` before this action first touched it.
    fn object_pre_image(&self, uid: ObjectUid) -> Option<&ObjectInstanceCache> {
        match self.object_ops.get(&uid)?.first()? {
            ObjectOp::Added => None,
            ObjectOp::Removed => self.removed_objects.pre(uid),
            ObjectOp::Transformed => self.transformed_objects.pre(uid),
        }
    }

    /// State of `uid` once this action finished.
    fn object_post_image(&self, uid: ObjectUid) -> Option<&ObjectInstanceCache> {
        self.objects_post
            .get(&uid)
            .or_else(|| self.transformed_objects.post(uid))
            .or_else(|| self.added_objects.pre(uid))
    }

    /// Applies an object the action created: destroy on undo, recreate on redo.
    ///
    /// Returns the uid the object lives under afterwards.
    pub fn handle_object_added<W>(&self, world: &mut W, uid: ObjectUid, redo: bool) -> ObjectUid
    where
        W: EditableWorld + ?Sized,
    {
        if !redo {
            if !world.despawn_object(uid) {
                log::trace!("Object {uid} already absent");
            }
            return uid;
        }
        match self.object_post_image(uid) {
            Some(snapshot) => spawn_or_reposition(world, uid, snapshot),
            None => {
                log::warn!("No snapshot to recreate object {uid}");
                uid
            }
        }
    }

    /// Applies an object the action destroyed: recreate on undo, destroy on redo.
    pub fn handle_object_removed<W>(&self, world: &mut W, uid: ObjectUid, redo: bool) -> ObjectUid
    where
        W: EditableWorld + ?Sized,
    {
        if redo {
            if !world.despawn_object(uid) {
                log::trace!("Object {uid} already absent");
            }
            return uid;
        }
        match self.object_pre_image(uid) {
            Some(snapshot) => spawn_or_reposition(world, uid, snapshot),
            None => {
                log::warn!("No snapshot to recreate object {uid}");
                uid
            }
        }
    }

    /// Applies an object that existed before and after: restore its placement.
    pub fn handle_object_transformed<W>(
        &self,
        world: &mut W,
        uid: ObjectUid,
        redo: bool,
    ) -> ObjectUid
    where
        W: EditableWorld + ?Sized,
    {
        let snapshot = if redo {
            self.object_post_image(uid)
        } else {
            self.object_pre_image(uid)
        };
        match snapshot {
            Some(snapshot) => spawn_or_reposition(world, uid, snapshot),
            None => {
                log::warn!("No snapshot to reposition object {uid}");
                uid
            }
        }
    }

    /// Rewrites every reference to `old` so it addresses `new`.
    ///
    /// A record already under `new` belongs to an object the world no longer
    /// holds, since the world only hands out free uids. It moves to `old`.
    pub fn remap_uid(&mut self, old: ObjectUid, new: ObjectUid) {
        if old == new {
            return;
        }
        self.added_objects.swap_keys(old, new);
        self.removed_objects.swap_keys(old, new);
        self.transformed_objects.swap_keys(old, new);

        let at_old = self.objects_post.remove(&old);
        let at_new = self.objects_post.remove(&new);
        if let Some(snapshot) = at_old {
            self.objects_post.insert(new, snapshot);
        }
        if let Some(snapshot) = at_new {
            self.objects_post.insert(old, snapshot);
        }

        let at_old = self.object_ops.remove(&old);
        let at_new = self.object_ops.remove(&new);
        if let Some(log) = at_old {
            self.object_ops.insert(new, log);
        }
        if let Some(log) = at_new {
            self.object_ops.insert(old, log);
        }
    }

    // ----- merging -------------------------------------------------------

    /// Whether `later` may be folded into this action.
    ///
    /// Both must be finished and unapplied, share the same non-empty
    /// modality and categories, and `later` must have started no more than
    /// `window` after this one finished.
    pub fn can_merge(&self, later: &Action, window: Duration) -> bool {
        if window.is_zero()
            || self.state != ActionState::Finished
            || later.state != ActionState::Finished
            || self.modality.is_empty()
            || self.modality != later.modality
            || self.flags != later.flags
        {
            return false;
        }
        match self.finished_at {
            Some(finished) => later.started_at.saturating_duration_since(finished) <= window,
            None => false,
        }
    }

    /// Folds `later` into this action if [`can_merge`](Self::can_merge) allows it.
    ///
    /// Returns `None` when `later` was consumed, or gives it back.
    pub fn merge(&mut self, later: Action, window: Duration) -> Option<Action> {
        if !self.can_merge(&later, window) {
            return Some(later);
        }
        let Action {
            flags,
            finished_at,
            terrain,
            texture,
            vertex_colors,
            holes,
            area_ids,
            chunk_flags,
            liquids,
            shadows,
            vertex_selection,
            added_objects,
            removed_objects,
            transformed_objects,
            objects_post,
            object_ops,
            ..
        } = later;

        self.flags |= flags;
        self.finished_at = finished_at;
        self.terrain.absorb(terrain);
        self.texture.absorb(texture);
        self.vertex_colors.absorb(vertex_colors);
        self.holes.absorb(holes);
        self.area_ids.absorb(area_ids);
        self.chunk_flags.absorb(chunk_flags);
        self.liquids.absorb(liquids);
        self.shadows.absorb(shadows);
        self.vertex_selection.absorb(vertex_selection);
        self.added_objects.absorb(added_objects);
        self.removed_objects.absorb(removed_objects);
        self.transformed_objects.absorb(transformed_objects);
        self.objects_post.extend(objects_post);
        for (uid, log) in object_ops {
            self.object_ops.entry(uid).or_default().append(log);
        }
        None
    }
}

impl Default for Action {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("flags", &self.flags)
            .field("modality", &self.modality)
            .field("state", &self.state)
            .field("chunks", &self.touched_chunks().len())
            .field("objects", &self.object_ops.len())
            .finish()
    }
}
