pub mod anims;
pub mod flags;
pub mod mobjinfo;

pub use self::{
    anims::{ANIMDEFS, AnimDef, SWITCHES},
    flags::{MF_TRANSSHIFT, MobjFlags},
    mobjinfo::{MOBJINFO, MobjInfo},
};

use once_cell::sync::Lazy;
use std::collections::HashMap;

static BY_DOOMEDNUM: Lazy<HashMap<i16, &'static MobjInfo>> = Lazy::new(|| {
    let mut map = HashMap::with_capacity(MOBJINFO.len());
    for info in MOBJINFO {
        if info.doomednum >= 0 {
            map.insert(info.doomednum, info);
        }
    }
    map
});

/// Class spawned for a map thing of editor number `num`.
pub fn by_doomednum(num: i16) -> Option<&'static MobjInfo> {
    BY_DOOMEDNUM.get(&num).copied()
}

static BY_ID: Lazy<HashMap<&'static str, &'static MobjInfo>> =
    Lazy::new(|| MOBJINFO.iter().map(|info| (info.id, info)).collect());

pub fn by_id(id: &str) -> Option<&'static MobjInfo> {
    BY_ID.get(id).copied()
}

/// The player class (first table entry).
#[inline]
pub fn player_info() -> &'static MobjInfo {
    &MOBJINFO[0]
}
