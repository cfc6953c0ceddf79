use crate::wad::{Wad, WadError};
use bincode::Decode;
use once_cell::sync::Lazy;
use regex::Regex;

/*=======================================================================*/
/*                         Raw binary structs                            */
/*=======================================================================*/

#[repr(C)]
#[derive(Clone, Copy, Decode, Debug, Default, PartialEq, Eq)]
pub struct RawThing {
    pub x: i16,
    pub y: i16,
    pub angle: i16,
    pub type_: i16,
    pub options: i16,
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Debug, Default)]
pub struct RawLinedef {
    pub v1: i16,
    pub v2: i16,
    pub flags: i16,
    pub special: i16,
    pub tag: i16,
    pub sidenum: [i16; 2],
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Debug, Default)]
pub struct RawSidedef {
    pub x_off: i16,
    pub y_off: i16,
    pub top_tex: [u8; 8],
    pub bottom_tex: [u8; 8],
    pub mid_tex: [u8; 8],
    pub sector: i16,
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Debug, Default)]
pub struct RawVertex {
    pub x: i16,
    pub y: i16,
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Debug, Default)]
pub struct RawSeg {
    pub v1: i16,
    pub v2: i16,
    pub angle: i16,
    pub linedef: i16,
    pub side: i16,
    pub offset: i16,
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Debug, Default)]
pub struct RawSubsector {
    pub seg_count: i16,
    pub first_seg: i16,
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Debug, Default)]
pub struct RawNode {
    pub x: i16,
    pub y: i16,
    pub dx: i16,
    pub dy: i16,
    /// top, bottom, left, right – right child first
    pub bbox: [[i16; 4]; 2],
    pub child: [u16; 2],
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Debug, Default)]
pub struct RawSector {
    pub floor_h: i16,
    pub ceil_h: i16,
    pub floor_tex: [u8; 8],
    pub ceil_tex: [u8; 8],
    pub light: i16,
    pub special: i16,
    pub tag: i16,
}

/*=======================================================================*/
/*                     Aggregate returned by `parse_level`               */
/*=======================================================================*/
#[derive(Debug)]
pub struct RawLevel {
    pub name: String,
    pub things: Vec<RawThing>,
    pub linedefs: Vec<RawLinedef>,
    pub sidedefs: Vec<RawSidedef>,
    pub vertices: Vec<RawVertex>,
    pub segs: Vec<RawSeg>,
    pub subsectors: Vec<RawSubsector>,
    pub nodes: Vec<RawNode>,
    pub sectors: Vec<RawSector>,
    pub blockmap: Vec<i16>,
}

/// Lump order after a map marker.
pub const LEVEL_LUMPS: [&str; 10] = [
    "THINGS", "LINEDEFS", "SIDEDEFS", "VERTEXES", "SEGS", "SSECTORS", "NODES", "SECTORS",
    "REJECT", "BLOCKMAP",
];

/*=======================================================================*/
/*                                Errors                                 */
/*=======================================================================*/

#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("marker index {0} out of bounds")]
    MarkerOob(usize),

    #[error("no map named `{0}`")]
    UnknownMap(String),

    #[error("expected lump `{0}` not found after level marker")]
    Missing(&'static str),

    #[error(transparent)]
    Wad(#[from] WadError),
}

/*=======================================================================*/
/*                     Convenience helpers on `Wad`                      */
/*=======================================================================*/
impl Wad {
    /// Return directory indices of every map marker (`E#M#`, `MAP##`).
    pub fn level_indices(&self) -> Vec<usize> {
        static RE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"^(E[1-4]M[1-9]|MAP[0-3][0-9])$").expect("static map-marker regex")
        });

        self.lumps()
            .iter()
            .enumerate()
            .filter(|(_, l)| l.size == 0 && RE.is_match(Self::lump_name_str(&l.name)))
            .map(|(i, _)| i)
            .collect()
    }

    /// Directory index of the map marker `name` (`E1M1`, `MAP07`, …).
    pub fn level_index(&self, name: &str) -> Result<usize, LevelError> {
        self.find_lump(name)
            .ok_or_else(|| LevelError::UnknownMap(name.to_owned()))
    }

    /// Return the index of the lump `name` **immediately after** `start`.
    fn idx_of(&self, start: usize, name: &'static str) -> Result<usize, LevelError> {
        let l = self.lumps().get(start).ok_or(LevelError::Missing(name))?;
        match Self::lump_name_str(&l.name).eq_ignore_ascii_case(name) {
            true => Ok(start),
            false => Err(LevelError::Missing(name)),
        }
    }

    /// Decode the lumps that make up a classic Doom map.
    pub fn parse_level(&self, marker_idx: usize) -> Result<RawLevel, LevelError> {
        // --- bounds check on marker index --------------------------------
        if marker_idx >= self.lumps().len() {
            return Err(LevelError::MarkerOob(marker_idx));
        }

        // --- fixed lump order after marker -------------------------------
        let mut idx = [0usize; LEVEL_LUMPS.len()];
        for (slot, name) in LEVEL_LUMPS.iter().enumerate() {
            idx[slot] = self.idx_of(marker_idx + 1 + slot, name)?;
        }

        Ok(RawLevel {
            name: Self::lump_name_str(&self.lumps()[marker_idx].name).into(),
            things: self.lump_to_vec::<RawThing>(idx[0])?,
            linedefs: self.lump_to_vec::<RawLinedef>(idx[1])?,
            sidedefs: self.lump_to_vec::<RawSidedef>(idx[2])?,
            vertices: self.lump_to_vec::<RawVertex>(idx[3])?,
            segs: self.lump_to_vec::<RawSeg>(idx[4])?,
            subsectors: self.lump_to_vec::<RawSubsector>(idx[5])?,
            nodes: self.lump_to_vec::<RawNode>(idx[6])?,
            sectors: self.lump_to_vec::<RawSector>(idx[7])?,
            // REJECT (idx[8]) is only consulted by sight checks
            blockmap: self.lump_to_vec::<i16>(idx[9])?,
        })
    }
}

/*=======================================================================*/
/*                                Tests                                  */
/*=======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::wad::{MapBuilder, WadBuilder};

    fn room_wad() -> Wad {
        WadBuilder::new()
            .map(&MapBuilder::room("E1M1", 0, 0, 256, 256))
            .into_wad()
            .unwrap()
    }

    #[test]
    fn record_sizes_match_disk_layout() {
        use std::mem::size_of;
        assert_eq!(size_of::<RawThing>(), 10);
        assert_eq!(size_of::<RawVertex>(), 4);
        assert_eq!(size_of::<RawLinedef>(), 14);
        assert_eq!(size_of::<RawSidedef>(), 30);
        assert_eq!(size_of::<RawSector>(), 26);
        assert_eq!(size_of::<RawSubsector>(), 4);
        assert_eq!(size_of::<RawSeg>(), 12);
        assert_eq!(size_of::<RawNode>(), 28);
    }

    #[test]
    fn first_map_parses() {
        let wad = room_wad();
        let m0 = wad.level_indices()[0];
        let lvl = wad.parse_level(m0).expect("level decode");
        assert_eq!(lvl.name, "E1M1");
        assert_eq!(lvl.vertices.len(), 4);
        assert_eq!(lvl.linedefs.len(), 4);
        assert_eq!(lvl.things.first().unwrap().type_, 1); // Player 1 start
        assert_eq!(&lvl.blockmap[2..4], &[3, 3]);
    }

    #[test]
    fn bad_marker_oob() {
        let wad = room_wad();
        let err = wad.parse_level(wad.lumps().len() + 10).unwrap_err();
        assert!(matches!(err, LevelError::MarkerOob(_)));
    }

    #[test]
    fn missing_things_guard() {
        let wad = room_wad();
        // Starting at LINEDEFS makes the slot where THINGS belongs wrong.
        let idx = wad.level_indices()[0] + 1;
        let err = wad.parse_level(idx).unwrap_err();
        assert!(matches!(err, LevelError::Missing("THINGS")));
    }

    #[test]
    fn unknown_map_name() {
        let wad = room_wad();
        assert!(matches!(
            wad.level_index("E9M9"),
            Err(LevelError::UnknownMap(_))
        ));
        assert_eq!(wad.level_index("e1m1").unwrap(), 0);
    }
}
