//! Snapshot value types captured by actions.
//!
//! Each chunk category has one snapshot type implementing [`ChunkCache`],
//! which ties it to its [`ActionFlags`] bit and to the pair of
//! [`EditableWorld`] calls that read and write it. Snapshots are plain
//! owned values: once captured they are never shared or mutated.

use std::collections::BTreeSet;
use std::fmt;

use bitflags::bitflags;

use super::flags::ActionFlags;
use super::world::{ChunkKey, EditableWorld, TileKey, VertexRef};
use crate::math::Vec3;

/// Vertices per chunk: a 9x9 outer grid interleaved with an 8x8 inner grid.
pub const CHUNK_VERTICES: usize = 9 * 9 + 8 * 8;

/// Width of a map tile in world units.
pub const TILE_SIZE: f32 = 1600.0 / 3.0;

/// Width of a chunk in world units.
pub const CHUNK_SIZE: f32 = TILE_SIZE / 16.0;

/// Texels in an alpha map (64x64, one byte each).
pub const ALPHA_MAP_SIZE: usize = 64 * 64;

/// Texels in a chunk shadow map (64x64, one byte each).
pub const SHADOW_MAP_SIZE: usize = 64 * 64;

/// Texture layers a chunk can blend.
pub const MAX_TEXTURE_LAYERS: usize = 4;

/// A per-chunk snapshot type.
pub trait ChunkCache: Clone + PartialEq + fmt::Debug {
    /// Category bit set when this snapshot type is registered.
    const FLAG: ActionFlags;

    /// Reads the current state of `chunk`, or `None` if the chunk is not loaded.
    fn capture<W: EditableWorld + ?Sized>(world: &W, chunk: ChunkKey) -> Option<Self>;

    /// Writes this snapshot back onto `chunk`.
    fn restore<W: EditableWorld + ?Sized>(&self, world: &mut W, chunk: ChunkKey);
}

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

/// Vertex positions and normals of a chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainCache {
    pub positions: Box<[Vec3; CHUNK_VERTICES]>,
    pub normals: Box<[Vec3; CHUNK_VERTICES]>,
}

impl TerrainCache {
    /// A flat chunk at `height`, laid out in chunk-local coordinates.
    pub fn flat(height: f32) -> Self {
        let unit = CHUNK_SIZE / 8.0;
        let mut positions = Box::new([Vec3::zeros(); CHUNK_VERTICES]);
        let mut index = 0;
        for row in 0..17 {
            let inner = row % 2 == 1;
            let (count, offset) = if inner { (8, 0.5) } else { (9, 0.0) };
            let z = (row / 2) as f32 * unit + offset * unit;
            for col in 0..count {
                let x = col as f32 * unit + offset * unit;
                positions[index] = Vec3::new(x, height, z);
                index += 1;
            }
        }
        Self {
            positions,
            normals: Box::new([Vec3::y(); CHUNK_VERTICES]),
        }
    }

    /// Lowest and highest vertex height.
    pub fn height_range(&self) -> (f32, f32) {
        self.positions
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)))
    }
}

impl Default for TerrainCache {
    fn default() -> Self {
        Self::flat(0.0)
    }
}

impl ChunkCache for TerrainCache {
    const FLAG: ActionFlags = ActionFlags::CHUNKS_TERRAIN;

    fn capture<W: EditableWorld + ?Sized>(world: &W, chunk: ChunkKey) -> Option<Self> {
        world.terrain(chunk)
    }

    fn restore<W: EditableWorld + ?Sized>(&self, world: &mut W, chunk: ChunkKey) {
        world.set_terrain(chunk, self);
    }
}

// ---------------------------------------------------------------------------
// Textures
// ---------------------------------------------------------------------------

/// One 64x64 alpha map blending a texture layer over the ones below it.
#[derive(Debug, Clone, PartialEq)]
pub struct Alphamap(pub Box<[u8; ALPHA_MAP_SIZE]>);

impl Alphamap {
    pub fn filled(value: u8) -> Self {
        Self(Box::new([value; ALPHA_MAP_SIZE]))
    }
}

/// Per-layer header of a chunk texture layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerInfo {
    pub texture_id: u32,
    pub flags: u32,
    pub ofs_alpha: u32,
    pub effect_id: u32,
}

/// The full texture stack of a chunk.
///
/// Layer 0 has no alpha map; layers 1..4 use `alphamaps[layer - 1]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureChangeCache {
    pub textures: Vec<String>,
    pub alphamaps: [Option<Alphamap>; MAX_TEXTURE_LAYERS - 1],
    /// High-precision blend weights kept while a paint stroke is in progress.
    pub tmp_edit_values: Option<Box<[[f32; MAX_TEXTURE_LAYERS]]>>,
    pub layers_info: [LayerInfo; MAX_TEXTURE_LAYERS],
}

impl TextureChangeCache {
    pub fn layer_count(&self) -> usize {
        self.textures.len()
    }
}

impl ChunkCache for TextureChangeCache {
    const FLAG: ActionFlags = ActionFlags::CHUNKS_TEXTURE;

    fn capture<W: EditableWorld + ?Sized>(world: &W, chunk: ChunkKey) -> Option<Self> {
        world.texture(chunk)
    }

    fn restore<W: EditableWorld + ?Sized>(&self, world: &mut W, chunk: ChunkKey) {
        world.set_texture(chunk, self);
    }
}

// ---------------------------------------------------------------------------
// Vertex colors
// ---------------------------------------------------------------------------

/// RGB vertex shading of a chunk. `1.0` is neutral.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexColorCache {
    pub colors: Box<[Vec3; CHUNK_VERTICES]>,
}

impl Default for VertexColorCache {
    fn default() -> Self {
        Self {
            colors: Box::new([Vec3::repeat(1.0); CHUNK_VERTICES]),
        }
    }
}

impl ChunkCache for VertexColorCache {
    const FLAG: ActionFlags = ActionFlags::CHUNKS_VERTEX_COLOR;

    fn capture<W: EditableWorld + ?Sized>(world: &W, chunk: ChunkKey) -> Option<Self> {
        world.vertex_colors(chunk)
    }

    fn restore<W: EditableWorld + ?Sized>(&self, world: &mut W, chunk: ChunkKey) {
        world.set_vertex_colors(chunk, self);
    }
}

// ---------------------------------------------------------------------------
// Holes, area id, flags
// ---------------------------------------------------------------------------

/// Hole bitmask. Low-resolution chunks use the low 16 bits (4x4), high
/// resolution chunks all 64 (8x8).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Holes(pub u64);

impl ChunkCache for Holes {
    const FLAG: ActionFlags = ActionFlags::CHUNKS_HOLES;

    fn capture<W: EditableWorld + ?Sized>(world: &W, chunk: ChunkKey) -> Option<Self> {
        world.holes(chunk)
    }

    fn restore<W: EditableWorld + ?Sized>(&self, world: &mut W, chunk: ChunkKey) {
        world.set_holes(chunk, *self);
    }
}

/// Zone identifier of a chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AreaId(pub u32);

impl ChunkCache for AreaId {
    const FLAG: ActionFlags = ActionFlags::CHUNKS_AREAID;

    fn capture<W: EditableWorld + ?Sized>(world: &W, chunk: ChunkKey) -> Option<Self> {
        world.area_id(chunk)
    }

    fn restore<W: EditableWorld + ?Sized>(&self, world: &mut W, chunk: ChunkKey) {
        world.set_area_id(chunk, *self);
    }
}

bitflags! {
    /// Chunk header flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ChunkFlags: u32 {
        const HAS_SHADOWS = 0x1;
        const IMPASSABLE = 0x2;
        const LIQUID_RIVER = 0x4;
        const LIQUID_OCEAN = 0x8;
        const LIQUID_MAGMA = 0x10;
        const LIQUID_SLIME = 0x20;
        const HAS_VERTEX_COLORS = 0x40;
        const DO_NOT_FIX_ALPHA_MAP = 0x8000;
        const HIGH_RES_HOLES = 0x10000;
    }
}

impl Default for ChunkFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl ChunkCache for ChunkFlags {
    const FLAG: ActionFlags = ActionFlags::CHUNKS_FLAGS;

    fn capture<W: EditableWorld + ?Sized>(world: &W, chunk: ChunkKey) -> Option<Self> {
        world.chunk_flags(chunk)
    }

    fn restore<W: EditableWorld + ?Sized>(&self, world: &mut W, chunk: ChunkKey) {
        world.set_chunk_flags(chunk, *self);
    }
}

// ---------------------------------------------------------------------------
// Liquids
// ---------------------------------------------------------------------------

/// One liquid layer covering (part of) a chunk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiquidLayer {
    pub liquid_type: u32,
    pub min_height: f32,
    pub max_height: f32,
    /// One bit per 8x8 sub-cell that this layer covers.
    pub subchunk_mask: u64,
    /// 9x9 vertex heights.
    pub heights: Vec<f32>,
    /// 9x9 vertex depths, used for shading.
    pub depths: Vec<u8>,
}

impl LiquidLayer {
    /// A layer covering the whole chunk at a constant height.
    pub fn flat(liquid_type: u32, height: f32) -> Self {
        Self {
            liquid_type,
            min_height: height,
            max_height: height,
            subchunk_mask: u64::MAX,
            heights: vec![height; 81],
            depths: vec![u8::MAX; 81],
        }
    }
}

/// All liquid layers of a chunk, bottom to top.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiquidLayers(pub Vec<LiquidLayer>);

impl ChunkCache for LiquidLayers {
    const FLAG: ActionFlags = ActionFlags::CHUNKS_WATER;

    fn capture<W: EditableWorld + ?Sized>(world: &W, chunk: ChunkKey) -> Option<Self> {
        world.liquids(chunk)
    }

    fn restore<W: EditableWorld + ?Sized>(&self, world: &mut W, chunk: ChunkKey) {
        world.set_liquids(chunk, self);
    }
}

// ---------------------------------------------------------------------------
// Shadows
// ---------------------------------------------------------------------------

/// Baked 64x64 shadow map of a chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowMapCache {
    pub texels: Box<[u8; SHADOW_MAP_SIZE]>,
}

impl Default for ShadowMapCache {
    fn default() -> Self {
        Self {
            texels: Box::new([0; SHADOW_MAP_SIZE]),
        }
    }
}

impl ChunkCache for ShadowMapCache {
    const FLAG: ActionFlags = ActionFlags::CHUNK_SHADOWS;

    fn capture<W: EditableWorld + ?Sized>(world: &W, chunk: ChunkKey) -> Option<Self> {
        world.shadow_map(chunk)
    }

    fn restore<W: EditableWorld + ?Sized>(&self, world: &mut W, chunk: ChunkKey) {
        world.set_shadow_map(chunk, self);
    }
}

// ---------------------------------------------------------------------------
// Selection and objects
// ---------------------------------------------------------------------------

/// The terrain vertex selection used by the vertex-transform tools.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexSelectionCache {
    pub tiles: BTreeSet<TileKey>,
    pub chunks: BTreeSet<ChunkKey>,
    /// Neighbouring chunks whose border normals depend on selected vertices.
    pub border_chunks: BTreeSet<ChunkKey>,
    pub vertices: BTreeSet<VertexRef>,
    pub center: Vec3,
}

impl VertexSelectionCache {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Model reference and placement of an object instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInstanceCache {
    pub filename: String,
    pub pos: Vec3,
    /// Orientation in degrees around each axis.
    pub dir: Vec3,
    pub scale: f32,
}

impl ObjectInstanceCache {
    pub fn new(filename: impl Into<String>, pos: Vec3) -> Self {
        Self {
            filename: filename.into(),
            pos,
            dir: Vec3::zeros(),
            scale: 1.0,
        }
    }
}
