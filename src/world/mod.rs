mod bsp;
pub mod fixed;
mod geometry;
mod texture;
mod topology;

pub use fixed::{ANGLETOFINESHIFT, Bam, FINEANGLES, FRACBITS, FRACUNIT, Fixed};

pub use geometry::{
    BBox, BlockBox, BlockChain, Blockmap, CHILD_MASK, Level, Linedef, LinedefFlags, LinedefId,
    MAPBLOCKSHIFT, MAPBLOCKUNITS, Node, NodeChild, NodeId, SUBSECTOR_BIT, Sector, SectorId, Seg,
    SegmentId, Sidedef, SidedefId, SlopeType, Subsector, SubsectorId, Thing, ThingOptions, Vertex,
    VertexId,
};

pub use texture::{NO_TEXTURE, TextureBank, TextureError, TextureId, TextureKind};

pub use topology::{MAXRADIUS, slope_of};
