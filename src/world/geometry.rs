use bitflags::bitflags;
use hecs::Entity;
use smallvec::SmallVec;

use crate::sim::ThinkerId;
use crate::world::fixed::{Bam, Fixed};
use crate::world::texture::TextureId;

pub type SubsectorId = u16;
pub type LinedefId = u16;
pub type SegmentId = u16;
pub type VertexId = u16;
pub type SidedefId = u16;
pub type SectorId = u16;
pub type NodeId = u16;

/// Runtime snapshot of one map.
///
/// Everything except sector/line special state and the blockmap object
/// chains is read-only once [`Level::build_topology`] has run.
#[derive(Debug, Default)]
pub struct Level {
    pub name: String,
    pub things: Vec<Thing>,
    pub linedefs: Vec<Linedef>,
    pub sidedefs: Vec<Sidedef>,
    pub vertices: Vec<Vertex>,
    pub segs: Vec<Seg>,
    pub subsectors: Vec<Subsector>,
    pub nodes: Vec<Node>,
    pub sectors: Vec<Sector>,
    pub blockmap: Blockmap,
}

/*------------------------- map things -------------------------------*/

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct ThingOptions: u16 {
        const EASY       = 0x0001;
        const NORMAL     = 0x0002;
        const HARD       = 0x0004;
        const AMBUSH     = 0x0008;
        const NOT_SINGLE = 0x0010;
    }
}

/// Spawn record as stored in the THINGS lump (map units, degrees).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Thing {
    pub x: i16,
    pub y: i16,
    pub angle: i16,
    pub doomednum: i16,
    pub options: ThingOptions,
}

/*--------------------------- linedefs -------------------------------*/

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct LinedefFlags: u16 {
        const IMPASSABLE      = 0x0001;
        const BLOCK_MONSTERS  = 0x0002;
        const TWO_SIDED       = 0x0004;
        const UPPER_UNPEGGED  = 0x0008;
        const LOWER_UNPEGGED  = 0x0010;
        const SECRET          = 0x0020;
        const BLOCK_SOUND     = 0x0040;
        const NOT_ON_MAP      = 0x0080;
        const ALREADY_ON_MAP  = 0x0100;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SlopeType {
    #[default]
    Horizontal,
    Vertical,
    Positive,
    Negative,
}

/// Axis-aligned box in the classic top/bottom/left/right layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BBox {
    pub top: Fixed,
    pub bottom: Fixed,
    pub left: Fixed,
    pub right: Fixed,
}

impl Default for BBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl BBox {
    /// Inverted box every point grows.
    pub const EMPTY: BBox = BBox {
        top: Fixed::MIN,
        bottom: Fixed::MAX,
        left: Fixed::MAX,
        right: Fixed::MIN,
    };

    pub fn add_point(&mut self, x: Fixed, y: Fixed) {
        self.left = self.left.min(x);
        self.right = self.right.max(x);
        self.bottom = self.bottom.min(y);
        self.top = self.top.max(y);
    }
}

#[derive(Clone, Debug, Default)]
pub struct Linedef {
    pub v1: VertexId,
    pub v2: VertexId,
    pub dx: Fixed,
    pub dy: Fixed,
    pub flags: LinedefFlags,
    pub special: i16,
    pub tag: i16,
    /// `[front, back]`; a one-sided line has no back side.
    pub sides: [Option<SidedefId>; 2],
    pub slope: SlopeType,
    pub bbox: BBox,
    pub front_sector: Option<SectorId>,
    pub back_sector: Option<SectorId>,
}

/*--------------------------- sidedefs -------------------------------*/

#[derive(Clone, Debug, Default)]
pub struct Sidedef {
    pub texture_offset: Fixed,
    pub row_offset: Fixed,
    pub top: TextureId,
    pub bottom: TextureId,
    pub middle: TextureId,
    pub sector: SectorId,
}

/*----------------------- simple primitives --------------------------*/

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Vertex {
    pub x: Fixed,
    pub y: Fixed,
}

#[derive(Clone, Debug, Default)]
pub struct Seg {
    pub v1: VertexId,
    pub v2: VertexId,
    pub offset: Fixed,
    pub angle: Bam,
    pub sidedef: SidedefId,
    pub linedef: LinedefId,
    /// 0 = seg runs along the line's front side, 1 = back side
    pub side: u8,
    pub front_sector: SectorId,
    pub back_sector: Option<SectorId>,
}

#[derive(Clone, Debug, Default)]
pub struct Subsector {
    pub seg_count: u16,
    pub first_seg: SegmentId,
    /// resolved from the first seg by the topology pass
    pub sector: SectorId,
}

/// High bit of a node child marks a sub-sector leaf.
pub const SUBSECTOR_BIT: u16 = 0x8000;
pub const CHILD_MASK: u16 = 0x7FFF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeChild {
    Node(NodeId),
    Subsector(SubsectorId),
}

impl NodeChild {
    #[inline]
    pub fn from_raw(raw: u16) -> Self {
        if raw & SUBSECTOR_BIT != 0 {
            NodeChild::Subsector(raw & CHILD_MASK)
        } else {
            NodeChild::Node(raw)
        }
    }

    #[inline]
    pub fn to_raw(self) -> u16 {
        match self {
            NodeChild::Node(n) => n,
            NodeChild::Subsector(s) => s | SUBSECTOR_BIT,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub x: Fixed,
    pub y: Fixed,
    pub dx: Fixed,
    pub dy: Fixed,
    pub bbox: [BBox; 2],
    /// raw tagged children, `[right, left]`
    pub children: [u16; 2],
}

/*----------------------------- sectors ------------------------------*/

/// Sector bounds in blockmap cells, inclusive on every edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockBox {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

#[derive(Clone, Debug, Default)]
pub struct Sector {
    pub floor_height: Fixed,
    pub ceiling_height: Fixed,
    pub floor_pic: TextureId,
    pub ceiling_pic: TextureId,
    pub light_level: i16,
    pub special: i16,
    pub tag: i16,

    /* derived by the topology pass */
    /// (line, side) incidences; a line with this sector on both sides counts twice
    pub line_count: usize,
    /// distinct member lines in map order
    pub lines: Vec<LinedefId>,
    pub bbox: BBox,
    pub sound_origin: (Fixed, Fixed),
    pub block_box: BlockBox,

    /// mover currently owning this sector's planes
    pub special_data: Option<ThinkerId>,
}

/*----------------------------- blockmap -----------------------------*/

pub const MAPBLOCKUNITS: i32 = 128;
/// Fixed → block index shift.
pub const MAPBLOCKSHIFT: i32 = crate::world::fixed::FRACBITS + 7;

pub type BlockChain = SmallVec<[Entity; 4]>;

/// Uniform grid over the map.  The static part is the BLOCKMAP lump; the
/// per-cell object chains are maintained by the simulation.
#[derive(Debug, Default)]
pub struct Blockmap {
    pub origin_x: Fixed,
    pub origin_y: Fixed,
    pub width: i32,
    pub height: i32,
    /// entire lump, header included; cell offsets index into it
    pub lump: Vec<i16>,
    pub links: Vec<BlockChain>,
}

impl Blockmap {
    #[inline]
    pub fn cell_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    /// Cell index covering fixed-point `(x, y)`, if inside the grid.
    #[inline]
    pub fn cell_at(&self, x: Fixed, y: Fixed) -> Option<usize> {
        let bx = (x - self.origin_x).raw() >> MAPBLOCKSHIFT;
        let by = (y - self.origin_y).raw() >> MAPBLOCKSHIFT;
        self.cell(bx, by)
    }

    #[inline]
    pub fn cell(&self, bx: i32, by: i32) -> Option<usize> {
        ((0..self.width).contains(&bx) && (0..self.height).contains(&by))
            .then(|| (by * self.width + bx) as usize)
    }

    /// Line indices listed for one cell (leading 0 entry included, `-1`
    /// terminator excluded).
    pub fn cell_lines(&self, cell: usize) -> impl Iterator<Item = LinedefId> + '_ {
        let start = self.lump.get(4 + cell).map_or(self.lump.len(), |&o| o as u16 as usize);
        self.lump
            .get(start..)
            .unwrap_or(&[])
            .iter()
            .take_while(|&&v| v != -1)
            .map(|&v| v as u16)
    }
}
