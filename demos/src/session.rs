//! A scripted editing session over an in-memory world.
//!
//! Each method plays the role of one editor tool: it opens the history's
//! recording action, registers what it is about to touch, mutates the
//! world and closes the action again.

use mapforge_core::math::{self, Vec3};
use mapforge_core::undo::{
    ActionHistory, AreaId, ChunkKey, EditableWorld, MemoryWorld, ModalityControllers,
    ObjectInstanceCache, ObjectUid, TileKey,
};
use mapforge_core::{ActionResult, HistoryConfig};

/// Side length, in chunks, of the loaded area.
pub const LOADED_CHUNKS: u8 = 4;

/// A world, its history and the tools that edit it.
pub struct EditSession {
    world: MemoryWorld,
    history: ActionHistory,
    tile: TileKey,
}

/// Observable state after a session step.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub undo_steps: usize,
    pub redo_steps: usize,
    pub objects: usize,
    pub max_height: f32,
}

impl EditSession {
    pub fn new(config: &HistoryConfig) -> Self {
        let tile = TileKey::new(32, 32);
        let mut world = MemoryWorld::new();
        for x in 0..LOADED_CHUNKS {
            for z in 0..LOADED_CHUNKS {
                world.load_chunk(ChunkKey::new(tile, x, z));
            }
        }
        log::info!(
            "Session ready: {} chunks loaded, max_undo={}",
            usize::from(LOADED_CHUNKS) * usize::from(LOADED_CHUNKS),
            config.max_undo
        );
        Self {
            world,
            history: ActionHistory::with_config(config),
            tile,
        }
    }

    pub fn world(&self) -> &MemoryWorld {
        &self.world
    }

    pub fn history(&self) -> &ActionHistory {
        &self.history
    }

    fn chunk(&self, x: u8, z: u8) -> ChunkKey {
        ChunkKey::new(self.tile, x, z)
    }

    /// Raises a chunk and its loaded neighbours over several dabs.
    pub fn sculpt_stroke(&mut self, x: u8, z: u8, dabs: u32, strength: f32) -> ActionResult {
        let center = self.chunk(x, z);
        let (z0, z1) = (z.saturating_sub(1), z.saturating_add(1));
        let footprint: Vec<ChunkKey> = (x.saturating_sub(1)..=x.saturating_add(1))
            .flat_map(|cx| (z0..=z1).map(move |cz| (cx, cz)))
            .map(|(cx, cz)| self.chunk(cx, cz))
            .filter(|key| self.world.chunk(*key).is_some())
            .collect();

        let action = self.history.begin_action();
        action.set_modality_controllers(ModalityControllers::LMB);
        for _ in 0..dabs {
            for &key in &footprint {
                action.register_chunk_terrain_change(&self.world, key)?;
                let falloff = if key == center { 1.0 } else { 0.5 };
                if let Some(state) = self.world.chunk_mut(key) {
                    for p in state.terrain.positions.iter_mut() {
                        p.y += strength * falloff;
                    }
                }
            }
        }
        self.history.end_action(&self.world)
    }

    pub fn paint_area(&mut self, x: u8, z: u8, area: u32) -> ActionResult {
        let key = self.chunk(x, z);
        self.history
            .begin_action()
            .register_chunk_area_id_change(&self.world, key)?;
        self.world.set_area_id(key, AreaId(area));
        self.history.end_action(&self.world)
    }

    pub fn place_object(&mut self, filename: &str, pos: Vec3) -> ActionResult<ObjectUid> {
        let uid = self
            .world
            .place_object(ObjectInstanceCache::new(filename, pos));
        self.history
            .begin_action()
            .register_object_added(&self.world, uid)?;
        self.history.end_action(&self.world)?;
        Ok(uid)
    }

    /// Rotates an object around its vertical axis by `degrees`.
    pub fn rotate_object(&mut self, uid: ObjectUid, degrees: f32) -> ActionResult {
        self.history
            .begin_action()
            .register_object_transformed(&self.world, uid)?;
        if let Some(object) = self.world.object_mut(uid) {
            object.dir = math::wrap_degrees(object.dir + Vec3::new(0.0, degrees, 0.0));
        }
        self.history.end_action(&self.world)
    }

    pub fn delete_object(&mut self, uid: ObjectUid) -> ActionResult {
        self.history
            .begin_action()
            .register_object_removed(&self.world, uid)?;
        self.world.delete_object(uid);
        self.history.end_action(&self.world)
    }

    pub fn undo(&mut self) -> ActionResult {
        self.history.undo(&mut self.world)
    }

    pub fn redo(&mut self) -> ActionResult {
        self.history.redo(&mut self.world)
    }

    /// Undoes every step. Returns how many were undone.
    pub fn undo_all(&mut self) -> usize {
        let mut steps = 0;
        while self.history.undo(&mut self.world).is_ok() {
            steps += 1;
        }
        steps
    }

    pub fn summary(&self) -> SessionSummary {
        let max_height = self
            .world
            .chunk_keys()
            .filter_map(|key| self.world.chunk(key))
            .map(|state| state.terrain.height_range().1)
            .fold(f32::MIN, f32::max);
        SessionSummary {
            undo_steps: self.history.undo_count(),
            redo_steps: self.history.redo_count(),
            objects: self.world.object_count(),
            max_height,
        }
    }
}
