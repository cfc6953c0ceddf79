// ──────────────────────────────────────────────────────────────────────────
// wad/builder.rs
//
//  *   WadBuilder   named lumps            ──>  IWAD image (Vec<u8> / Wad)
//  *   MapBuilder   raw map records        ──>  the ten level lumps
//
// Tests and tools use these to produce maps without shipping a game WAD.
// ──────────────────────────────────────────────────────────────────────────

use crate::wad::{
    LEVEL_LUMPS, Wad, WadError,
    level::{
        RawLinedef, RawNode, RawSector, RawSeg, RawSidedef, RawSubsector, RawThing, RawVertex,
    },
};

/// Assembles an IWAD in memory, lumps in insertion order.
#[derive(Clone, Debug, Default)]
pub struct WadBuilder {
    lumps: Vec<(String, Vec<u8>)>,
}

impl WadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lump(mut self, name: &str, data: Vec<u8>) -> Self {
        self.lumps.push((name.to_ascii_uppercase(), data));
        self
    }

    /// Append the marker plus all ten lumps of `map`.
    pub fn map(mut self, map: &MapBuilder) -> Self {
        self.lumps.extend(map.encode());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let data_len: usize = self.lumps.iter().map(|(_, d)| d.len()).sum();
        let dir_offset = 12 + data_len;

        let mut out = Vec::with_capacity(dir_offset + self.lumps.len() * 16);
        out.extend_from_slice(b"IWAD");
        out.extend_from_slice(&(self.lumps.len() as u32).to_le_bytes());
        out.extend_from_slice(&(dir_offset as u32).to_le_bytes());

        let mut offsets = Vec::with_capacity(self.lumps.len());
        for (_, data) in &self.lumps {
            offsets.push(out.len() as u32);
            out.extend_from_slice(data);
        }

        for ((name, data), offset) in self.lumps.iter().zip(offsets) {
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            out.extend_from_slice(&name8(name));
        }
        out
    }

    pub fn into_wad(self) -> Result<Wad, WadError> {
        Wad::from_bytes(self.build())
    }
}

/// NUL-padded eight byte name.
pub fn name8(name: &str) -> [u8; 8] {
    let mut out = [0u8; 8];
    for (dst, src) in out.iter_mut().zip(name.bytes()) {
        *dst = src.to_ascii_uppercase();
    }
    out
}

/*====================================================================*/
/*                           Map records                              */
/*====================================================================*/

/// Raw map under construction.  Empty `segs`/`subsectors` are derived (one
/// sub-sector per sector) and a missing blockmap lists every line in every
/// cell, which is a valid if slow grid.
#[derive(Clone, Debug, Default)]
pub struct MapBuilder {
    pub name: String,
    pub things: Vec<RawThing>,
    pub vertices: Vec<RawVertex>,
    pub linedefs: Vec<RawLinedef>,
    pub sidedefs: Vec<RawSidedef>,
    pub sectors: Vec<RawSector>,
    pub segs: Vec<RawSeg>,
    pub subsectors: Vec<RawSubsector>,
    pub nodes: Vec<RawNode>,
    pub blockmap: Option<Vec<i16>>,
}

impl MapBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_uppercase(),
            ..Self::default()
        }
    }

    /// Square room with one sector, four one-sided walls and a player 1
    /// start in the middle.
    pub fn room(name: &str, x0: i16, y0: i16, x1: i16, y1: i16) -> Self {
        let mut m = Self::new(name);
        let s = m.sector(0, 128, 160);
        let v = [
            m.vertex(x0, y0),
            m.vertex(x0, y1),
            m.vertex(x1, y1),
            m.vertex(x1, y0),
        ];
        for i in 0..4 {
            let side = m.side(s, "STARTAN3");
            m.line(v[i], v[(i + 1) % 4], 0x0001, side, -1);
        }
        m.thing(x0 + (x1 - x0) / 2, y0 + (y1 - y0) / 2, 90, 1, 7);
        m
    }

    pub fn vertex(&mut self, x: i16, y: i16) -> i16 {
        self.vertices.push(RawVertex { x, y });
        (self.vertices.len() - 1) as i16
    }

    pub fn sector(&mut self, floor_h: i16, ceil_h: i16, light: i16) -> i16 {
        self.sectors.push(RawSector {
            floor_h,
            ceil_h,
            floor_tex: name8("FLOOR4_8"),
            ceil_tex: name8("CEIL3_5"),
            light,
            special: 0,
            tag: 0,
        });
        (self.sectors.len() - 1) as i16
    }

    pub fn side(&mut self, sector: i16, mid: &str) -> i16 {
        self.sidedefs.push(RawSidedef {
            x_off: 0,
            y_off: 0,
            top_tex: name8("-"),
            bottom_tex: name8("-"),
            mid_tex: name8(mid),
            sector,
        });
        (self.sidedefs.len() - 1) as i16
    }

    pub fn line(&mut self, v1: i16, v2: i16, flags: i16, front: i16, back: i16) -> i16 {
        self.linedefs.push(RawLinedef {
            v1,
            v2,
            flags,
            special: 0,
            tag: 0,
            sidenum: [front, back],
        });
        (self.linedefs.len() - 1) as i16
    }

    pub fn thing(&mut self, x: i16, y: i16, angle: i16, type_: i16, options: i16) {
        self.things.push(RawThing {
            x,
            y,
            angle,
            type_,
            options,
        });
    }

    /// The marker followed by the ten level lumps.
    pub fn encode(&self) -> Vec<(String, Vec<u8>)> {
        let (segs, subsectors) = if self.segs.is_empty() && self.subsectors.is_empty() {
            self.derive_subsectors()
        } else {
            (self.segs.clone(), self.subsectors.clone())
        };
        let blockmap = self.blockmap.clone().unwrap_or_else(|| self.full_blockmap());

        let mut lumps = vec![(self.name.clone(), Vec::new())];
        let data = [
            pack(&self.things, |b, t| {
                put(b, &[t.x, t.y, t.angle, t.type_, t.options])
            }),
            pack(&self.linedefs, |b, l| {
                put(
                    b,
                    &[l.v1, l.v2, l.flags, l.special, l.tag, l.sidenum[0], l.sidenum[1]],
                )
            }),
            pack(&self.sidedefs, |b, s| {
                put(b, &[s.x_off, s.y_off]);
                b.extend_from_slice(&s.top_tex);
                b.extend_from_slice(&s.bottom_tex);
                b.extend_from_slice(&s.mid_tex);
                put(b, &[s.sector]);
            }),
            pack(&self.vertices, |b, v| put(b, &[v.x, v.y])),
            pack(&segs, |b, s| {
                put(b, &[s.v1, s.v2, s.angle, s.linedef, s.side, s.offset])
            }),
            pack(&subsectors, |b, s| put(b, &[s.seg_count, s.first_seg])),
            pack(&self.nodes, |b, n| {
                put(b, &[n.x, n.y, n.dx, n.dy]);
                put(b, &n.bbox[0]);
                put(b, &n.bbox[1]);
                put(b, &[n.child[0] as i16, n.child[1] as i16]);
            }),
            pack(&self.sectors, |b, s| {
                put(b, &[s.floor_h, s.ceil_h]);
                b.extend_from_slice(&s.floor_tex);
                b.extend_from_slice(&s.ceil_tex);
                put(b, &[s.light, s.special, s.tag]);
            }),
            Vec::new(),
            pack(&blockmap, |b, v| put(b, &[*v])),
        ];
        for (name, bytes) in LEVEL_LUMPS.iter().zip(data) {
            lumps.push((name.to_string(), bytes));
        }
        lumps
    }

    fn derive_subsectors(&self) -> (Vec<RawSeg>, Vec<RawSubsector>) {
        let mut segs = Vec::new();
        let mut subsectors = Vec::new();
        for sector in 0..self.sectors.len() as i16 {
            let first = segs.len();
            for (li, l) in self.linedefs.iter().enumerate() {
                for side in 0..2 {
                    let sd = l.sidenum[side];
                    if sd < 0 || self.sidedefs.get(sd as usize).map(|s| s.sector) != Some(sector) {
                        continue;
                    }
                    let (v1, v2) = if side == 0 { (l.v1, l.v2) } else { (l.v2, l.v1) };
                    segs.push(RawSeg {
                        v1,
                        v2,
                        angle: 0,
                        linedef: li as i16,
                        side: side as i16,
                        offset: 0,
                    });
                }
            }
            if segs.len() > first {
                subsectors.push(RawSubsector {
                    seg_count: (segs.len() - first) as i16,
                    first_seg: first as i16,
                });
            }
        }
        (segs, subsectors)
    }

    fn full_blockmap(&self) -> Vec<i16> {
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (0i32, 0i32, 0i32, 0i32);
        if let Some(first) = self.vertices.first() {
            (min_x, min_y, max_x, max_y) = (
                first.x as i32,
                first.y as i32,
                first.x as i32,
                first.y as i32,
            );
        }
        for v in &self.vertices {
            min_x = min_x.min(v.x as i32);
            min_y = min_y.min(v.y as i32);
            max_x = max_x.max(v.x as i32);
            max_y = max_y.max(v.y as i32);
        }
        let org_x = min_x - 8;
        let org_y = min_y - 8;
        let width = ((max_x - org_x) >> 7) + 1;
        let height = ((max_y - org_y) >> 7) + 1;
        let cells = (width * height) as usize;

        let mut lump = vec![org_x as i16, org_y as i16, width as i16, height as i16];
        let list_start = (4 + cells) as i16;
        lump.extend(std::iter::repeat_n(list_start, cells));
        lump.push(0);
        lump.extend((0..self.linedefs.len()).map(|i| i as i16));
        lump.push(-1);
        lump
    }
}

fn put(buf: &mut Vec<u8>, values: &[i16]) {
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
}

fn pack<T>(items: &[T], mut f: impl FnMut(&mut Vec<u8>, &T)) -> Vec<u8> {
    let mut buf = Vec::new();
    for item in items {
        f(&mut buf, item);
    }
    buf
}
