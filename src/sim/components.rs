use bitflags::bitflags;

use crate::defs::{MobjFlags, MobjInfo};
use crate::sim::ThinkerId;
use crate::world::{Bam, Fixed, SubsectorId, Thing};

/* ───────────────────────────── map objects ───────────────────────────── */

/// World-space position.  z is separate to match Doom's 2½-D maths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub x: Fixed,
    pub y: Fixed,
    pub z: Fixed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Momentum {
    pub x: Fixed,
    pub y: Fixed,
    pub z: Fixed,
}

impl Momentum {
    #[inline]
    pub fn zero_xy(&mut self) {
        self.x = Fixed::ZERO;
        self.y = Fixed::ZERO;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Angle(pub Bam);

#[derive(Debug, Clone, Copy)]
pub struct Subsector(pub SubsectorId);

#[derive(Debug, Copy, Clone)]
pub struct Class(pub &'static MobjInfo);

#[derive(Clone, Copy, Debug)]
pub struct ActorFlags(pub MobjFlags);

/// Collision extent plus the floor/ceiling heights under the object.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub radius: Fixed,
    pub height: Fixed,
    pub floor_z: Fixed,
    pub ceiling_z: Fixed,
}

#[derive(Debug, Clone, Copy)]
pub struct Health(pub i32);

/// Tics left in the current state; `-1` never expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tics(pub i32);

/// Blockmap cell the object is linked into.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockCell(pub Option<usize>);

#[derive(Debug, Clone, Copy)]
pub struct MobjThinker(pub ThinkerId);

/// Player slot an object last looked at; seeded at spawn.
#[derive(Debug, Clone, Copy)]
pub struct LastLook(pub i32);

/// Body of a player.  `moving` mirrors whether this tic's command asks for
/// movement, which suppresses the stop-speed snap.
#[derive(Debug, Clone, Copy)]
pub struct Pilot {
    pub player: usize,
    pub moving: bool,
}

/// Map thing an object was spawned from.
#[derive(Debug, Clone, Copy)]
pub struct SpawnSpot(pub Thing);

/* ───────────────────────────── tic commands ──────────────────────────── */

bitflags! {
    /// Button byte of a [`TicCmd`].  Besides the plain flags it packs a
    /// weapon number, or with `SPECIAL` set a special action and save slot.
    #[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Buttons: u8 {
        const ATTACK        = 0x01;
        const USE           = 0x02;
        const CHANGE        = 0x04;
        const WEAPON_MASK   = 0x38;
        const SPECIAL       = 0x80;

        const SPECIAL_MASK  = 0x03;
        const PAUSE         = 0x01;
        const SAVEGAME      = 0x02;
        const SAVE_MASK     = 0x1C;
    }
}

pub const BT_WEAPONSHIFT: u8 = 3;
pub const BTS_SAVESHIFT: u8 = 2;

impl Buttons {
    #[inline]
    pub fn weapon(self) -> usize {
        ((self.bits() & Self::WEAPON_MASK.bits()) >> BT_WEAPONSHIFT) as usize
    }

    #[inline]
    pub fn save_slot(self) -> usize {
        ((self.bits() & Self::SAVE_MASK.bits()) >> BTS_SAVESHIFT) as usize
    }

    pub fn change_weapon(weapon: usize) -> Self {
        Self::from_bits_retain(Self::CHANGE.bits() | ((weapon as u8) << BT_WEAPONSHIFT))
    }

    pub fn save_request(slot: usize) -> Self {
        Self::from_bits_retain(
            Self::SPECIAL.bits() | Self::SAVEGAME.bits() | ((slot as u8) << BTS_SAVESHIFT),
        )
    }

    pub fn pause_request() -> Self {
        Self::SPECIAL | Self::PAUSE
    }
}

/// One player's input for one tic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TicCmd {
    /// *2048 for move speed.
    pub forward_move: i8,
    pub side_move: i8,
    /// <<16 for angle delta.
    pub angle_turn: i16,
    pub buttons: Buttons,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_button_fields() {
        let b = Buttons::change_weapon(5) | Buttons::ATTACK;
        assert_eq!(b.bits(), 0x2D);
        assert_eq!(b.weapon(), 5);

        let s = Buttons::save_request(6);
        assert!(s.contains(Buttons::SPECIAL));
        assert_eq!(s.bits() & Buttons::SPECIAL_MASK.bits(), Buttons::SAVEGAME.bits());
        assert_eq!(s.save_slot(), 6);
    }
}
