//! Static map-object classes.
//!
//! Only the fields the core simulation reads are kept: editor number,
//! spawn health, collision extent, flags and the tic length of the spawn
//! state (`-1` = the spawn state never expires).  Frame sequences live with
//! the external actor scripts.

use super::flags::MobjFlags;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MobjInfo {
    pub id: &'static str,
    /// Editor number used by map things; `-1` for runtime-only classes.
    pub doomednum: i16,
    pub spawn_health: i32,
    /// Map units.
    pub radius: i32,
    /// Map units.
    pub height: i32,
    pub flags: MobjFlags,
    pub spawn_tics: i32,
}

impl MobjInfo {
    #[inline]
    pub fn is_monster(&self) -> bool {
        self.flags.contains(MobjFlags::COUNTKILL) || self.id == "MT_SKULL"
    }
}

const fn info(
    id: &'static str,
    doomednum: i16,
    spawn_health: i32,
    radius: i32,
    height: i32,
    flags: MobjFlags,
    spawn_tics: i32,
) -> MobjInfo {
    MobjInfo {
        id,
        doomednum,
        spawn_health,
        radius,
        height,
        flags,
        spawn_tics,
    }
}

const NONE: MobjFlags = MobjFlags::empty();
const SOLID: MobjFlags = MobjFlags::SOLID;
const MONSTER: MobjFlags = MobjFlags::SOLID
    .union(MobjFlags::SHOOTABLE)
    .union(MobjFlags::COUNTKILL);
const FLYER: MobjFlags = MONSTER.union(MobjFlags::FLOAT).union(MobjFlags::NOGRAVITY);
const PICKUP: MobjFlags = MobjFlags::SPECIAL;
const BONUS: MobjFlags = MobjFlags::SPECIAL.union(MobjFlags::COUNTITEM);
const KEY: MobjFlags = MobjFlags::SPECIAL.union(MobjFlags::NOTDMATCH);
const HANGING: MobjFlags = MobjFlags::SPAWNCEILING.union(MobjFlags::NOGRAVITY);
const MARKER: MobjFlags = MobjFlags::NOBLOCKMAP.union(MobjFlags::NOSECTOR);

/// Index 0 is the player class; spawning code relies on it.
pub static MOBJINFO: &[MobjInfo] = &[
    info(
        "MT_PLAYER",
        -1,
        100,
        16,
        56,
        MobjFlags::SOLID
            .union(MobjFlags::SHOOTABLE)
            .union(MobjFlags::DROPOFF)
            .union(MobjFlags::PICKUP)
            .union(MobjFlags::NOTDMATCH),
        -1,
    ),
    /* ── monsters ─────────────────────────────────────────────────── */
    info("MT_POSSESSED", 3004, 20, 20, 56, MONSTER, 10),
    info("MT_SHOTGUY", 9, 30, 20, 56, MONSTER, 10),
    info("MT_VILE", 64, 700, 20, 56, MONSTER, 10),
    info("MT_UNDEAD", 66, 300, 20, 56, MONSTER, 10),
    info("MT_FATSO", 67, 600, 48, 64, MONSTER, 15),
    info("MT_CHAINGUY", 65, 70, 20, 56, MONSTER, 10),
    info("MT_TROOP", 3001, 60, 20, 56, MONSTER, 10),
    info("MT_SERGEANT", 3002, 150, 30, 56, MONSTER, 10),
    info("MT_SHADOWS", 58, 150, 30, 56, MONSTER.union(MobjFlags::SHADOW), 10),
    info("MT_HEAD", 3005, 400, 31, 56, FLYER, 10),
    info("MT_BRUISER", 3003, 1000, 24, 64, MONSTER, 10),
    info("MT_KNIGHT", 69, 500, 24, 64, MONSTER, 10),
    info(
        "MT_SKULL",
        3006,
        100,
        16,
        56,
        MobjFlags::SOLID
            .union(MobjFlags::SHOOTABLE)
            .union(MobjFlags::FLOAT)
            .union(MobjFlags::NOGRAVITY),
        10,
    ),
    info("MT_SPIDER", 7, 3000, 128, 100, MONSTER, 10),
    info("MT_BABY", 68, 500, 64, 64, MONSTER, 10),
    info("MT_CYBORG", 16, 4000, 40, 110, MONSTER, 10),
    info("MT_PAIN", 71, 400, 31, 56, FLYER, 10),
    info("MT_WOLFSS", 84, 50, 20, 56, MONSTER, 10),
    info("MT_KEEN", 72, 100, 16, 72, MONSTER.union(HANGING), -1),
    info(
        "MT_BOSSBRAIN",
        88,
        250,
        16,
        16,
        MobjFlags::SOLID.union(MobjFlags::SHOOTABLE),
        -1,
    ),
    info("MT_BOSSSPIT", 89, 1000, 20, 32, MARKER, 10),
    info("MT_BOSSTARGET", 87, 1000, 20, 32, MARKER, -1),
    info(
        "MT_BARREL",
        2035,
        20,
        10,
        42,
        MobjFlags::SOLID
            .union(MobjFlags::SHOOTABLE)
            .union(MobjFlags::NOBLOOD),
        6,
    ),
    info("MT_TELEPORTMAN", 14, 1000, 20, 16, MARKER, -1),
    info(
        "MT_TFOG",
        -1,
        1000,
        20,
        16,
        MobjFlags::NOBLOCKMAP.union(MobjFlags::NOGRAVITY),
        6,
    ),
    info("MT_BLOOD", -1, 1000, 20, 16, MobjFlags::NOBLOCKMAP, 8),
    /* ── armour, health, powerups ─────────────────────────────────── */
    info("MT_MISC0", 2018, 1000, 20, 16, PICKUP, 6),
    info("MT_MISC1", 2019, 1000, 20, 16, PICKUP, 6),
    info("MT_MISC2", 2014, 1000, 20, 16, BONUS, 6),
    info("MT_MISC3", 2015, 1000, 20, 16, BONUS, 6),
    info("MT_MISC10", 2011, 1000, 20, 16, PICKUP, -1),
    info("MT_MISC11", 2012, 1000, 20, 16, PICKUP, -1),
    info("MT_MISC12", 2013, 1000, 20, 16, BONUS, 6),
    info("MT_INV", 2022, 1000, 20, 16, BONUS, 6),
    info("MT_MISC13", 2023, 1000, 20, 16, BONUS, -1),
    info("MT_INS", 2024, 1000, 20, 16, BONUS, 6),
    info("MT_MISC14", 2025, 1000, 20, 16, PICKUP, -1),
    info("MT_MISC15", 2026, 1000, 20, 16, BONUS, 6),
    info("MT_MISC16", 2045, 1000, 20, 16, BONUS, 7),
    info("MT_MEGA", 83, 1000, 20, 16, BONUS, 6),
    /* ── keys ─────────────────────────────────────────────────────── */
    info("MT_MISC4", 5, 1000, 20, 16, KEY, 10),
    info("MT_MISC5", 13, 1000, 20, 16, KEY, 10),
    info("MT_MISC6", 6, 1000, 20, 16, KEY, 10),
    info("MT_MISC7", 39, 1000, 20, 16, KEY, 10),
    info("MT_MISC8", 38, 1000, 20, 16, KEY, 10),
    info("MT_MISC9", 40, 1000, 20, 16, KEY, 10),
    /* ── ammo and weapons ─────────────────────────────────────────── */
    info("MT_CLIP", 2007, 1000, 20, 16, PICKUP, -1),
    info("MT_MISC17", 2048, 1000, 20, 16, PICKUP, -1),
    info("MT_MISC18", 2010, 1000, 20, 16, PICKUP, -1),
    info("MT_MISC19", 2046, 1000, 20, 16, PICKUP, -1),
    info("MT_MISC20", 2047, 1000, 20, 16, PICKUP, -1),
    info("MT_MISC21", 17, 1000, 20, 16, PICKUP, -1),
    info("MT_MISC22", 2008, 1000, 20, 16, PICKUP, -1),
    info("MT_MISC23", 2049, 1000, 20, 16, PICKUP, -1),
    info("MT_MISC24", 8, 1000, 20, 16, PICKUP, -1),
    info("MT_MISC25", 2006, 1000, 20, 16, PICKUP, -1),
    info("MT_CHAINGUN", 2002, 1000, 20, 16, PICKUP, -1),
    info("MT_MISC26", 2005, 1000, 20, 16, PICKUP, -1),
    info("MT_MISC27", 2003, 1000, 20, 16, PICKUP, -1),
    info("MT_MISC28", 2004, 1000, 20, 16, PICKUP, -1),
    info("MT_SHOTGUN", 2001, 1000, 20, 16, PICKUP, -1),
    info("MT_SUPERSHOTGUN", 82, 1000, 20, 16, PICKUP, -1),
    /* ── decorations ──────────────────────────────────────────────── */
    info("MT_MISC29", 85, 1000, 16, 16, SOLID, 4),
    info("MT_MISC30", 86, 1000, 16, 16, SOLID, 4),
    info("MT_MISC31", 2028, 1000, 16, 16, SOLID, -1),
    info("MT_MISC32", 30, 1000, 16, 16, SOLID, -1),
    info("MT_MISC33", 31, 1000, 16, 16, SOLID, -1),
    info("MT_MISC34", 32, 1000, 16, 16, SOLID, -1),
    info("MT_MISC35", 33, 1000, 16, 16, SOLID, -1),
    info("MT_MISC36", 37, 1000, 16, 16, SOLID, -1),
    info("MT_MISC37", 36, 1000, 16, 16, SOLID, 14),
    info("MT_MISC38", 41, 1000, 16, 16, SOLID, 6),
    info("MT_MISC39", 42, 1000, 16, 16, SOLID, 6),
    info("MT_MISC40", 43, 1000, 16, 16, SOLID, -1),
    info("MT_MISC41", 44, 1000, 16, 16, SOLID, 4),
    info("MT_MISC42", 45, 1000, 16, 16, SOLID, 4),
    info("MT_MISC43", 46, 1000, 16, 16, SOLID, 4),
    info("MT_MISC44", 55, 1000, 16, 16, SOLID, 4),
    info("MT_MISC45", 56, 1000, 16, 16, SOLID, 4),
    info("MT_MISC46", 57, 1000, 16, 16, SOLID, 4),
    info("MT_MISC47", 47, 1000, 16, 16, SOLID, -1),
    info("MT_MISC48", 48, 1000, 16, 16, SOLID, 4),
    info("MT_MISC49", 34, 1000, 20, 16, NONE, -1),
    info("MT_MISC50", 35, 1000, 16, 16, SOLID, -1),
    info("MT_MISC51", 49, 1000, 16, 68, SOLID.union(HANGING), 10),
    info("MT_MISC52", 50, 1000, 16, 84, SOLID.union(HANGING), -1),
    info("MT_MISC53", 51, 1000, 16, 84, SOLID.union(HANGING), -1),
    info("MT_MISC54", 52, 1000, 16, 68, SOLID.union(HANGING), -1),
    info("MT_MISC55", 53, 1000, 16, 52, SOLID.union(HANGING), -1),
    info("MT_MISC56", 59, 1000, 20, 84, HANGING, -1),
    info("MT_MISC57", 60, 1000, 20, 68, HANGING, -1),
    info("MT_MISC58", 61, 1000, 20, 52, HANGING, -1),
    info("MT_MISC59", 62, 1000, 20, 52, HANGING, -1),
    info("MT_MISC60", 63, 1000, 20, 68, HANGING, 10),
    info("MT_MISC61", 22, 1000, 20, 16, NONE, -1),
    info("MT_MISC62", 15, 1000, 20, 16, NONE, -1),
    info("MT_MISC63", 18, 1000, 20, 16, NONE, -1),
    info("MT_MISC64", 21, 1000, 20, 16, NONE, -1),
    info("MT_MISC65", 23, 1000, 20, 16, NONE, -1),
    info("MT_MISC66", 20, 1000, 20, 16, NONE, -1),
    info("MT_MISC67", 19, 1000, 20, 16, NONE, -1),
    info("MT_MISC68", 10, 1000, 20, 16, NONE, -1),
    info("MT_MISC69", 12, 1000, 20, 16, NONE, -1),
    info("MT_MISC70", 28, 1000, 16, 16, SOLID, -1),
    info("MT_MISC71", 24, 1000, 20, 16, NONE, -1),
    info("MT_MISC72", 27, 1000, 16, 16, SOLID, -1),
    info("MT_MISC73", 29, 1000, 16, 16, SOLID, 6),
    info("MT_MISC74", 25, 1000, 16, 16, SOLID, -1),
    info("MT_MISC75", 26, 1000, 16, 16, SOLID, 8),
    info("MT_MISC76", 54, 1000, 32, 16, SOLID, -1),
    info("MT_MISC77", 70, 1000, 16, 16, SOLID, 4),
];
