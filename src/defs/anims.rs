//! Animated surface cycles and switch texture pairs.

/// One animation cycle: every name between `start` and `end` in the
/// texture or flat directory is a frame.
#[derive(Debug, Clone, Copy)]
pub struct AnimDef {
    pub is_texture: bool,
    pub end: &'static str,
    pub start: &'static str,
    pub speed: i32,
}

const fn flat(end: &'static str, start: &'static str) -> AnimDef {
    AnimDef {
        is_texture: false,
        end,
        start,
        speed: 8,
    }
}

const fn wall(end: &'static str, start: &'static str) -> AnimDef {
    AnimDef {
        is_texture: true,
        end,
        start,
        speed: 8,
    }
}

pub static ANIMDEFS: &[AnimDef] = &[
    flat("NUKAGE3", "NUKAGE1"),
    flat("FWATER4", "FWATER1"),
    flat("SWATER4", "SWATER1"),
    flat("LAVA4", "LAVA1"),
    flat("BLOOD3", "BLOOD1"),
    // commercial flats
    flat("RROCK08", "RROCK05"),
    flat("SLIME04", "SLIME01"),
    flat("SLIME08", "SLIME05"),
    flat("SLIME12", "SLIME09"),
    wall("BLODGR4", "BLODGR1"),
    wall("SLADRIP3", "SLADRIP1"),
    wall("BLODRIP4", "BLODRIP1"),
    wall("FIREWALL", "FIREWALA"),
    wall("GSTFONT3", "GSTFONT1"),
    wall("FIRELAVA", "FIRELAV3"),
    wall("FIREMAG3", "FIREMAG1"),
    wall("FIREBLU2", "FIREBLU1"),
    wall("ROCKRED3", "ROCKRED1"),
    wall("BFALL4", "BFALL1"),
    wall("SFALL4", "SFALL1"),
    wall("WFALL4", "WFALL1"),
    wall("DBRAIN4", "DBRAIN1"),
];

/// `(off, on, episode class)`; class 1 = shareware, 2 = registered,
/// 3 = commercial.
pub static SWITCHES: &[(&str, &str, u8)] = &[
    ("SW1BRCOM", "SW2BRCOM", 1),
    ("SW1BRN1", "SW2BRN1", 1),
    ("SW1BRN2", "SW2BRN2", 1),
    ("SW1BRNGN", "SW2BRNGN", 1),
    ("SW1BROWN", "SW2BROWN", 1),
    ("SW1COMM", "SW2COMM", 1),
    ("SW1COMP", "SW2COMP", 1),
    ("SW1DIRT", "SW2DIRT", 1),
    ("SW1EXIT", "SW2EXIT", 1),
    ("SW1GRAY", "SW2GRAY", 1),
    ("SW1GRAY1", "SW2GRAY1", 1),
    ("SW1METAL", "SW2METAL", 1),
    ("SW1PIPE", "SW2PIPE", 1),
    ("SW1SLAD", "SW2SLAD", 1),
    ("SW1STARG", "SW2STARG", 1),
    ("SW1STON1", "SW2STON1", 1),
    ("SW1STON2", "SW2STON2", 1),
    ("SW1STONE", "SW2STONE", 1),
    ("SW1STRTN", "SW2STRTN", 1),
    ("SW1BLUE", "SW2BLUE", 2),
    ("SW1CMT", "SW2CMT", 2),
    ("SW1GARG", "SW2GARG", 2),
    ("SW1GSTON", "SW2GSTON", 2),
    ("SW1HOT", "SW2HOT", 2),
    ("SW1LION", "SW2LION", 2),
    ("SW1SATYR", "SW2SATYR", 2),
    ("SW1SKIN", "SW2SKIN", 2),
    ("SW1VINE", "SW2VINE", 2),
    ("SW1WOOD", "SW2WOOD", 2),
    ("SW1PANEL", "SW2PANEL", 3),
    ("SW1ROCK", "SW2ROCK", 3),
    ("SW1MET2", "SW2MET2", 3),
    ("SW1WDMET", "SW2WDMET", 3),
    ("SW1BRIK", "SW2BRIK", 3),
    ("SW1MOD1", "SW2MOD1", 3),
    ("SW1ZIM", "SW2ZIM", 3),
    ("SW1STON6", "SW2STON6", 3),
    ("SW1TEK", "SW2TEK", 3),
    ("SW1MARB", "SW2MARB", 3),
    ("SW1SKULL", "SW2SKULL", 3),
];
