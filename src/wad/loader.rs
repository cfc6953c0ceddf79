// ──────────────────────────────────────────────────────────────────────────
// wad/loader.rs
//
//  *   RawLevel   (wad::level)           ──╮
//  *   TextureBank (names → ids)           │   --->  world::geometry::Level
//                                          ╯          (topology derived)
//
// Every index stored in the lumps is checked against its target array
// before it is used; one bad reference makes the whole map unusable.
// ──────────────────────────────────────────────────────────────────────────

use crate::{
    wad::level::{self as raw_level, LevelError},
    wad::raw::{Wad, WadError},
    world::{
        Bam, BBox, BlockChain, Blockmap, Fixed, Level, Linedef, LinedefFlags, Node, NodeChild,
        Sector, Seg, Sidedef, Subsector, TextureBank, TextureKind, Thing, ThingOptions, Vertex,
    },
};
use thiserror::Error;

/*──────────────────────────── Error type ───────────────────────────*/

#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Wad(#[from] WadError),

    #[error(transparent)]
    Level(#[from] LevelError),

    #[error("{what} {index}: {target} index {value} out of range (have {len})")]
    BadReference {
        what: &'static str,
        index: usize,
        target: &'static str,
        value: i32,
        len: usize,
    },

    #[error("linedef {line} has no side {side}")]
    MissingSide { line: usize, side: usize },

    #[error("sub-sector {0} has no segs")]
    EmptySubsector(usize),

    #[error("blockmap: {0}")]
    BadBlockmap(String),

    #[error("sector {sector}: counted {expected} line incidences, grouped {actual}")]
    LineCountMismatch {
        sector: usize,
        expected: usize,
        actual: usize,
    },
}

/// Range-check a stored index.
fn check(
    what: &'static str,
    index: usize,
    target: &'static str,
    value: i32,
    len: usize,
) -> Result<u16, LoadError> {
    if value < 0 || value as usize >= len {
        return Err(LoadError::BadReference {
            what,
            index,
            target,
            value,
            len,
        });
    }
    Ok(value as u16)
}

/*====================================================================*/
/*                       Public API                                   */
/*====================================================================*/

/// Load the map at directory index `marker` into a `world::Level`.
///
/// Texture and flat names resolve through `bank`; unknown names become
/// [`NO_TEXTURE`](crate::world::NO_TEXTURE).
pub fn load_level(wad: &Wad, marker: usize, bank: &TextureBank) -> Result<Level, LoadError> {
    let raw = wad.parse_level(marker)?;

    let vertices: Vec<Vertex> = raw.vertices.iter().map(raw_to_geo::vertex_from).collect();

    let sectors: Vec<Sector> = raw
        .sectors
        .iter()
        .map(|s| raw_to_geo::sector_from(s, bank))
        .collect();

    let sidedefs: Vec<Sidedef> = raw
        .sidedefs
        .iter()
        .enumerate()
        .map(|(i, s)| raw_to_geo::sidedef_from(i, s, sectors.len(), bank))
        .collect::<Result<_, _>>()?;

    let linedefs: Vec<Linedef> = raw
        .linedefs
        .iter()
        .enumerate()
        .map(|(i, l)| raw_to_geo::linedef_from(i, l, vertices.len(), sidedefs.len()))
        .collect::<Result<_, _>>()?;

    let subsectors: Vec<Subsector> = raw
        .subsectors
        .iter()
        .enumerate()
        .map(|(i, s)| raw_to_geo::subsector_from(i, s, raw.segs.len()))
        .collect::<Result<_, _>>()?;

    let nodes: Vec<Node> = raw
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| raw_to_geo::node_from(i, n, raw.nodes.len(), subsectors.len()))
        .collect::<Result<_, _>>()?;

    let segs: Vec<Seg> = raw
        .segs
        .iter()
        .enumerate()
        .map(|(i, s)| raw_to_geo::seg_from(i, s, &vertices, &linedefs, &sidedefs))
        .collect::<Result<_, _>>()?;

    let blockmap = blockmap_from(raw.blockmap, linedefs.len())?;

    let things: Vec<Thing> = raw.things.iter().map(raw_to_geo::thing_from).collect();

    let mut level = Level {
        name: raw.name,
        things,
        linedefs,
        sidedefs,
        vertices,
        segs,
        subsectors,
        nodes,
        sectors,
        blockmap,
    };
    level.build_topology()?;

    log::info!(
        "loaded {}: {} vertices, {} lines, {} sectors, {} things, blockmap {}x{}",
        level.name,
        level.vertices.len(),
        level.linedefs.len(),
        level.sectors.len(),
        level.things.len(),
        level.blockmap.width,
        level.blockmap.height
    );
    Ok(level)
}

/*====================================================================*/
/*                  Raw → Geo helpers (local)                         */
/*====================================================================*/
mod raw_to_geo {
    use super::*;

    #[inline]
    fn fixed(v: i16) -> Fixed {
        Fixed::from_int(v as i32)
    }

    pub fn vertex_from(r: &raw_level::RawVertex) -> Vertex {
        Vertex {
            x: fixed(r.x),
            y: fixed(r.y),
        }
    }

    pub fn sector_from(r: &raw_level::RawSector, bank: &TextureBank) -> Sector {
        Sector {
            floor_height: fixed(r.floor_h),
            ceiling_height: fixed(r.ceil_h),
            floor_pic: bank.id_or_missing(TextureKind::Flat, Wad::lump_name_str(&r.floor_tex)),
            ceiling_pic: bank.id_or_missing(TextureKind::Flat, Wad::lump_name_str(&r.ceil_tex)),
            light_level: r.light,
            special: r.special,
            tag: r.tag,
            ..Sector::default()
        }
    }

    pub fn sidedef_from(
        i: usize,
        r: &raw_level::RawSidedef,
        num_sectors: usize,
        bank: &TextureBank,
    ) -> Result<Sidedef, LoadError> {
        let wall = |n: &[u8; 8]| bank.id_or_missing(TextureKind::Wall, Wad::lump_name_str(n));
        Ok(Sidedef {
            texture_offset: fixed(r.x_off),
            row_offset: fixed(r.y_off),
            top: wall(&r.top_tex),
            bottom: wall(&r.bottom_tex),
            middle: wall(&r.mid_tex),
            sector: check("sidedef", i, "sector", r.sector as i32, num_sectors)?,
        })
    }

    pub fn linedef_from(
        i: usize,
        r: &raw_level::RawLinedef,
        num_vertices: usize,
        num_sides: usize,
    ) -> Result<Linedef, LoadError> {
        if r.sidenum[0] == -1 {
            return Err(LoadError::MissingSide { line: i, side: 0 });
        }
        let front = check("linedef", i, "sidedef", r.sidenum[0] as i32, num_sides)?;
        let back = match r.sidenum[1] {
            -1 => None,
            s => Some(check("linedef", i, "sidedef", s as i32, num_sides)?),
        };
        Ok(Linedef {
            v1: check("linedef", i, "vertex", r.v1 as i32, num_vertices)?,
            v2: check("linedef", i, "vertex", r.v2 as i32, num_vertices)?,
            flags: LinedefFlags::from_bits_truncate(r.flags as u16),
            special: r.special,
            tag: r.tag,
            sides: [Some(front), back],
            ..Linedef::default()
        })
    }

    pub fn subsector_from(
        i: usize,
        r: &raw_level::RawSubsector,
        num_segs: usize,
    ) -> Result<Subsector, LoadError> {
        if r.seg_count <= 0 {
            return Err(LoadError::EmptySubsector(i));
        }
        let first = check("sub-sector", i, "seg", r.first_seg as i32, num_segs)?;
        check(
            "sub-sector",
            i,
            "seg",
            r.first_seg as i32 + r.seg_count as i32 - 1,
            num_segs,
        )?;
        Ok(Subsector {
            seg_count: r.seg_count as u16,
            first_seg: first,
            sector: 0,
        })
    }

    const BOXTOP: usize = 0;
    const BOXBOTTOM: usize = 1;
    const BOXLEFT: usize = 2;
    const BOXRIGHT: usize = 3;

    #[inline]
    fn raw_bbox(raw: &[i16; 4]) -> BBox {
        BBox {
            top: fixed(raw[BOXTOP]),
            bottom: fixed(raw[BOXBOTTOM]),
            left: fixed(raw[BOXLEFT]),
            right: fixed(raw[BOXRIGHT]),
        }
    }

    pub fn node_from(
        i: usize,
        r: &raw_level::RawNode,
        num_nodes: usize,
        num_subsectors: usize,
    ) -> Result<Node, LoadError> {
        for &child in &r.child {
            match NodeChild::from_raw(child) {
                NodeChild::Subsector(s) => {
                    check("node", i, "sub-sector", s as i32, num_subsectors)?;
                }
                // children always precede their parent, which keeps the tree acyclic
                NodeChild::Node(n) => {
                    check("node", i, "node", n as i32, i.min(num_nodes))?;
                }
            }
        }
        Ok(Node {
            x: fixed(r.x),
            y: fixed(r.y),
            dx: fixed(r.dx),
            dy: fixed(r.dy),
            bbox: [raw_bbox(&r.bbox[0]), raw_bbox(&r.bbox[1])],
            children: r.child,
        })
    }

    pub fn seg_from(
        i: usize,
        r: &raw_level::RawSeg,
        vertices: &[Vertex],
        lines: &[Linedef],
        sides: &[Sidedef],
    ) -> Result<Seg, LoadError> {
        let linedef = check("seg", i, "linedef", r.linedef as i32, lines.len())?;
        let side = check("seg", i, "side", r.side as i32, 2)? as usize;
        let line = &lines[linedef as usize];

        let sidedef = line.sides[side].ok_or(LoadError::MissingSide {
            line: linedef as usize,
            side,
        })?;
        let back_sector = match (line.flags.contains(LinedefFlags::TWO_SIDED), line.sides[side ^ 1]) {
            (true, Some(other)) => Some(sides[other as usize].sector),
            (true, None) => {
                log::warn!("linedef {linedef} is two-sided but has no side {}", side ^ 1);
                None
            }
            (false, _) => None,
        };

        Ok(Seg {
            v1: check("seg", i, "vertex", r.v1 as i32, vertices.len())?,
            v2: check("seg", i, "vertex", r.v2 as i32, vertices.len())?,
            offset: fixed(r.offset),
            angle: Bam::from_short(r.angle),
            sidedef,
            linedef,
            side: side as u8,
            front_sector: sides[sidedef as usize].sector,
            back_sector,
        })
    }

    pub fn thing_from(r: &raw_level::RawThing) -> Thing {
        Thing {
            x: r.x,
            y: r.y,
            angle: r.angle,
            doomednum: r.type_,
            options: ThingOptions::from_bits_truncate(r.options as u16),
        }
    }
}

/*====================================================================*/
/*                            Blockmap                                */
/*====================================================================*/

/// Validate the BLOCKMAP lump: header, one offset per cell, and every
/// cell list terminated before the end with only valid line indices.
fn blockmap_from(lump: Vec<i16>, num_lines: usize) -> Result<Blockmap, LoadError> {
    let bad = |msg: String| Err(LoadError::BadBlockmap(msg));

    if lump.len() < 4 {
        return bad(format!("lump holds {} entries, header needs 4", lump.len()));
    }
    let width = lump[2] as i32;
    let height = lump[3] as i32;
    if width <= 0 || height <= 0 {
        return bad(format!("grid is {width}x{height}"));
    }
    let cells = (width * height) as usize;
    if lump.len() < 4 + cells {
        return bad(format!("{cells} cells but only {} offsets", lump.len() - 4));
    }

    for cell in 0..cells {
        let start = lump[4 + cell] as u16 as usize;
        let Some(list) = lump.get(start..) else {
            return bad(format!("cell {cell} offset {start} past end"));
        };
        let Some(end) = list.iter().position(|&v| v == -1) else {
            return bad(format!("cell {cell} list is not terminated"));
        };
        if let Some(&li) = list[..end].iter().find(|&&v| v as u16 as usize >= num_lines) {
            return bad(format!("cell {cell} lists line {li}"));
        }
    }

    Ok(Blockmap {
        origin_x: Fixed::from_int(lump[0] as i32),
        origin_y: Fixed::from_int(lump[1] as i32),
        width,
        height,
        links: vec![BlockChain::new(); cells],
        lump,
    })
}

/*====================================================================*/
/*                               Tests                                */
/*====================================================================*/
