//! Category and input-modality bitsets accumulated by an action.

use bitflags::bitflags;

bitflags! {
    /// Kinds of mutation an action has recorded.
    ///
    /// Bit values are stable and shared with the history display.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ActionFlags: u32 {
        const CHUNKS_TERRAIN = 0x1;
        const CHUNKS_AREAID = 0x2;
        const CHUNKS_HOLES = 0x4;
        const CHUNKS_VERTEX_COLOR = 0x8;
        const CHUNKS_WATER = 0x10;
        const CHUNKS_TEXTURE = 0x20;
        const OBJECTS_REMOVED = 0x40;
        const OBJECTS_ADDED = 0x80;
        const OBJECTS_TRANSFORMED = 0x100;
        const CHUNKS_FLAGS = 0x200;
        const VERTEX_SELECTION = 0x400;
        const CHUNK_SHADOWS = 0x800;
    }
}

impl Default for ActionFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl ActionFlags {
    /// Every per-chunk category.
    pub const ALL_CHUNKS: Self = Self::CHUNKS_TERRAIN
        .union(Self::CHUNKS_AREAID)
        .union(Self::CHUNKS_HOLES)
        .union(Self::CHUNKS_VERTEX_COLOR)
        .union(Self::CHUNKS_WATER)
        .union(Self::CHUNKS_TEXTURE)
        .union(Self::CHUNKS_FLAGS)
        .union(Self::CHUNK_SHADOWS);

    /// Every object lifecycle category.
    pub const ALL_OBJECTS: Self = Self::OBJECTS_ADDED
        .union(Self::OBJECTS_REMOVED)
        .union(Self::OBJECTS_TRANSFORMED);

    /// Human-readable name for a single category bit.
    pub fn category_name(self) -> Option<&'static str> {
        CATEGORY_NAMES
            .iter()
            .find(|(flag, _)| *flag == self)
            .map(|(_, name)| *name)
    }

    /// Comma-separated names of all set categories, or `"Empty"`.
    pub fn describe(self) -> String {
        if self.is_empty() {
            return "Empty".into();
        }
        self.iter()
            .filter_map(Self::category_name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

const CATEGORY_NAMES: [(ActionFlags, &str); 12] = [
    (ActionFlags::CHUNKS_TERRAIN, "Terrain"),
    (ActionFlags::CHUNKS_AREAID, "Area ID"),
    (ActionFlags::CHUNKS_HOLES, "Holes"),
    (ActionFlags::CHUNKS_VERTEX_COLOR, "Vertex color"),
    (ActionFlags::CHUNKS_WATER, "Water"),
    (ActionFlags::CHUNKS_TEXTURE, "Texture"),
    (ActionFlags::OBJECTS_REMOVED, "Object removed"),
    (ActionFlags::OBJECTS_ADDED, "Object added"),
    (ActionFlags::OBJECTS_TRANSFORMED, "Object transformed"),
    (ActionFlags::CHUNKS_FLAGS, "Chunk flags"),
    (ActionFlags::VERTEX_SELECTION, "Vertex selection"),
    (ActionFlags::CHUNK_SHADOWS, "Shadows"),
];

bitflags! {
    /// Input state active while an action was recorded.
    ///
    /// The action never interprets these; the history compares them to
    /// decide whether two adjacent actions belong to one gesture.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModalityControllers: u32 {
        const SHIFT = 0x1;
        const CTRL = 0x2;
        const SPACE = 0x4;
        const ALT = 0x8;
        const LMB = 0x10;
        const RMB = 0x20;
        const MMB = 0x40;
        const SCROLL = 0x80;
        const NUM = 0x100;
    }
}

impl Default for ModalityControllers {
    fn default() -> Self {
        Self::empty()
    }
}
