//! Game configuration chosen before a session starts.

use crate::wad::Wad;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GameMode {
    /// First episode only.
    #[default]
    Shareware,
    /// Three episodes.
    Registered,
    /// Four episodes.
    Retail,
    /// Single 32-map run.
    Commercial,
}

impl GameMode {
    /// Guess the mode from the map markers an IWAD carries.
    pub fn detect(wad: &Wad) -> Self {
        if wad.find_lump("MAP01").is_some() {
            GameMode::Commercial
        } else if wad.find_lump("E4M1").is_some() {
            GameMode::Retail
        } else if wad.find_lump("E3M1").is_some() {
            GameMode::Registered
        } else {
            GameMode::Shareware
        }
    }

    /// Which switch textures exist: 1 shareware, 2 registered, 3 commercial.
    pub fn switch_class(self) -> u8 {
        match self {
            GameMode::Shareware => 1,
            GameMode::Registered | GameMode::Retail => 2,
            GameMode::Commercial => 3,
        }
    }

    pub fn episodes(self) -> u8 {
        match self {
            GameMode::Shareware | GameMode::Commercial => 1,
            GameMode::Registered => 3,
            GameMode::Retail => 4,
        }
    }

    /// Lump name of a level marker.
    pub fn map_name(self, episode: u8, map: u8) -> String {
        match self {
            GameMode::Commercial => format!("MAP{map:02}"),
            _ => format!("E{episode}M{map}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Skill {
    Baby,
    Easy,
    #[default]
    Medium,
    Hard,
    Nightmare,
}

impl Skill {
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => Skill::Baby,
            1 => Skill::Easy,
            2 => Skill::Medium,
            3 => Skill::Hard,
            4 => Skill::Nightmare,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Thing option bit that makes a map thing appear at this skill.
    pub fn thing_bit(self) -> u16 {
        match self {
            Skill::Baby | Skill::Easy => 1,
            Skill::Medium => 2,
            Skill::Hard | Skill::Nightmare => 4,
        }
    }
}

/// Everything the host decides before the first tic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOptions {
    pub mode: GameMode,
    pub skill: Skill,
    pub episode: u8,
    pub map: u8,
    /// 0 off, 1 classic, 2 altdeath.
    pub deathmatch: u8,
    pub respawn: bool,
    pub fast: bool,
    pub no_monsters: bool,
    /// Quit when a played demo ends instead of returning to the demo loop.
    pub single_demo: bool,
    pub max_demo_size: usize,
    pub netgame: bool,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            mode: GameMode::Shareware,
            skill: Skill::Medium,
            episode: 1,
            map: 1,
            deathmatch: 0,
            respawn: false,
            fast: false,
            no_monsters: false,
            single_demo: false,
            max_demo_size: 0x20000,
            netgame: false,
        }
    }
}
