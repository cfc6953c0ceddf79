use bitflags::bitflags;

bitflags! {
    /// Runtime behaviour bits of a map object.  Values match the classic
    /// `mobjflag_t` so map data and tables can be shared with other ports.
    #[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct MobjFlags: u32 {
        /* ── touch / collision ─────────────────────────────── */
        const SPECIAL        = 0x0000_0001;
        const SOLID          = 0x0000_0002;
        const SHOOTABLE      = 0x0000_0004;
        /// Not linked into sector thing lists (invisible).
        const NOSECTOR       = 0x0000_0008;
        /// Not linked into the blockmap object chains.
        const NOBLOCKMAP     = 0x0000_0010;

        /* ── spawn / AI modifiers ──────────────────────────── */
        const AMBUSH         = 0x0000_0020;
        const JUSTHIT        = 0x0000_0040;
        const JUSTATTACKED   = 0x0000_0080;
        /// Placed against the ceiling on spawn.
        const SPAWNCEILING   = 0x0000_0100;
        const NOGRAVITY      = 0x0000_0200;

        /* ── movement ──────────────────────────────────────── */
        const DROPOFF        = 0x0000_0400;
        const PICKUP         = 0x0000_0800;
        const NOCLIP         = 0x0000_1000;
        const SLIDE          = 0x0000_2000;
        const FLOAT          = 0x0000_4000;
        const TELEPORT       = 0x0000_8000;
        const MISSILE        = 0x0001_0000;
        const DROPPED        = 0x0002_0000;

        /* ── presentation / damage ─────────────────────────── */
        const SHADOW         = 0x0004_0000;
        const NOBLOOD        = 0x0008_0000;
        const CORPSE         = 0x0010_0000;
        const INFLOAT        = 0x0020_0000;

        /* ── level totals ──────────────────────────────────── */
        const COUNTKILL      = 0x0040_0000;
        const COUNTITEM      = 0x0080_0000;

        const SKULLFLY       = 0x0100_0000;
        /// Never spawned in deathmatch (keys, the player template).
        const NOTDMATCH      = 0x0200_0000;

        /// Two bits of player colour translation.
        const TRANSLATION    = 0x0C00_0000;
    }
}

pub const MF_TRANSSHIFT: u32 = 26;

impl MobjFlags {
    /// Colour translation for player `slot` (0 keeps the default palette).
    #[inline]
    pub fn with_translation(self, slot: usize) -> Self {
        let bits = ((slot as u32) << MF_TRANSSHIFT) & Self::TRANSLATION.bits();
        Self::from_bits_retain((self.bits() & !Self::TRANSLATION.bits()) | bits)
    }

    #[inline]
    pub fn translation(self) -> usize {
        ((self.bits() & Self::TRANSLATION.bits()) >> MF_TRANSSHIFT) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_packs_into_upper_bits() {
        let f = MobjFlags::SOLID.with_translation(3);
        assert_eq!(f.bits(), 0x0C00_0002);
        assert_eq!(f.translation(), 3);
        assert_eq!(f.with_translation(1).translation(), 1);
    }
}
