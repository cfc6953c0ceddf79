//! Save slots.
//!
//! A save captures the session (skill, episode, map, participants, level
//! clock) and each player's inventory.  Loading rebuilds the level from the
//! archive and then restores those fields.  Where the bytes live is up to the
//! host through [`SaveGameStore`].

use std::{collections::HashMap, fs, io, path::PathBuf};

use bincode::{Decode, Encode, config};
use thiserror::Error;

use super::player::{MAXPLAYERS, NUMAMMO, NUMCARDS, NUMWEAPONS, Player, Weapon};

/// Slots the menu offers.
pub const SAVE_SLOTS: usize = 6;
/// Longest description the menu accepts.
pub const SAVESTRINGSIZE: usize = 24;
const SAVE_VERSION: &str = "version 109";

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("save slot {0} out of range")]
    BadSlot(usize),

    #[error("save slot {0} is empty")]
    EmptySlot(usize),

    #[error("save was written by `{0}`")]
    BadVersion(String),

    #[error(transparent)]
    Encode(#[from] bincode::error::EncodeError),

    #[error(transparent)]
    Decode(#[from] bincode::error::DecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
pub struct SavedPlayer {
    pub health: i32,
    pub armor_points: i32,
    pub armor_type: i32,
    pub cards: [bool; NUMCARDS],
    pub backpack: bool,
    pub ready_weapon: u8,
    pub weapon_owned: [bool; NUMWEAPONS],
    pub ammo: [i32; NUMAMMO],
    pub max_ammo: [i32; NUMAMMO],
    pub kill_count: i32,
    pub item_count: i32,
    pub secret_count: i32,
}

impl SavedPlayer {
    pub fn capture(p: &Player) -> Self {
        Self {
            health: p.health,
            armor_points: p.armor_points,
            armor_type: p.armor_type,
            cards: p.cards,
            backpack: p.backpack,
            ready_weapon: p.ready_weapon as u8,
            weapon_owned: p.weapon_owned,
            ammo: p.ammo,
            max_ammo: p.max_ammo,
            kill_count: p.kill_count,
            item_count: p.item_count,
            secret_count: p.secret_count,
        }
    }

    pub fn restore(&self, p: &mut Player) {
        p.health = self.health;
        p.armor_points = self.armor_points;
        p.armor_type = self.armor_type;
        p.cards = self.cards;
        p.backpack = self.backpack;
        p.ready_weapon = Weapon::from_index(self.ready_weapon as usize).unwrap_or_default();
        p.pending_weapon = None;
        p.weapon_owned = self.weapon_owned;
        p.ammo = self.ammo;
        p.max_ammo = self.max_ammo;
        p.kill_count = self.kill_count;
        p.item_count = self.item_count;
        p.secret_count = self.secret_count;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct SaveGame {
    pub version: String,
    pub description: String,
    pub skill: u8,
    pub episode: u8,
    pub map: u8,
    pub in_game: [bool; MAXPLAYERS],
    pub level_time: i32,
    pub players: Vec<SavedPlayer>,
}

impl SaveGame {
    pub fn new(description: &str) -> Self {
        let mut description = description.to_owned();
        description.truncate(SAVESTRINGSIZE);
        Self {
            version: SAVE_VERSION.to_owned(),
            description,
            skill: 0,
            episode: 1,
            map: 1,
            in_game: [false; MAXPLAYERS],
            level_time: 0,
            players: Vec::new(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SaveError> {
        Ok(bincode::encode_to_vec(self, config::standard())?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SaveError> {
        let (save, _): (SaveGame, usize) = bincode::decode_from_slice(bytes, config::standard())?;
        if save.version != SAVE_VERSION {
            return Err(SaveError::BadVersion(save.version));
        }
        Ok(save)
    }
}

/// Where save slots are kept.
pub trait SaveGameStore {
    fn write(&mut self, slot: usize, bytes: &[u8]) -> Result<(), SaveError>;
    fn read(&self, slot: usize) -> Result<Vec<u8>, SaveError>;
}

fn check_slot(slot: usize) -> Result<(), SaveError> {
    match slot < SAVE_SLOTS {
        true => Ok(()),
        false => Err(SaveError::BadSlot(slot)),
    }
}

/// Slots held in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySaves {
    slots: HashMap<usize, Vec<u8>>,
}

impl SaveGameStore for MemorySaves {
    fn write(&mut self, slot: usize, bytes: &[u8]) -> Result<(), SaveError> {
        check_slot(slot)?;
        self.slots.insert(slot, bytes.to_vec());
        Ok(())
    }

    fn read(&self, slot: usize) -> Result<Vec<u8>, SaveError> {
        check_slot(slot)?;
        self.slots.get(&slot).cloned().ok_or(SaveError::EmptySlot(slot))
    }
}

/// One `doomsav<N>.dsg` file per slot inside `dir`.
#[derive(Debug, Clone)]
pub struct DirSaves {
    dir: PathBuf,
}

impl DirSaves {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, slot: usize) -> PathBuf {
        self.dir.join(format!("doomsav{slot}.dsg"))
    }
}

impl SaveGameStore for DirSaves {
    fn write(&mut self, slot: usize, bytes: &[u8]) -> Result<(), SaveError> {
        check_slot(slot)?;
        fs::write(self.path(slot), bytes)?;
        Ok(())
    }

    fn read(&self, slot: usize) -> Result<Vec<u8>, SaveError> {
        check_slot(slot)?;
        match fs::read(self.path(slot)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(SaveError::EmptySlot(slot)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SaveGame {
        let mut p = Player::default();
        p.reborn();
        p.armor_points = 75;
        p.ammo[1] = 12;
        SaveGame {
            skill: 3,
            map: 4,
            in_game: [true, false, false, false],
            level_time: 1234,
            players: vec![SavedPlayer::capture(&p)],
            ..SaveGame::new("hangar")
        }
    }

    #[test]
    fn memory_slots() {
        let mut store = MemorySaves::default();
        assert!(matches!(store.read(2), Err(SaveError::EmptySlot(2))));
        store.write(2, &sample().to_bytes().expect("encode")).expect("write");
        let back = SaveGame::from_bytes(&store.read(2).expect("read")).expect("decode");
        assert_eq!(back, sample());
        assert!(matches!(store.write(SAVE_SLOTS, &[]), Err(SaveError::BadSlot(_))));
    }

    #[test]
    fn directory_slots() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = DirSaves::new(dir.path());
        assert!(matches!(store.read(0), Err(SaveError::EmptySlot(0))));
        store.write(0, &sample().to_bytes().expect("encode")).expect("write");
        assert!(dir.path().join("doomsav0.dsg").exists());
        let back = SaveGame::from_bytes(&store.read(0).expect("read")).expect("decode");
        assert_eq!(back.level_time, 1234);
    }

    #[test]
    fn foreign_version_is_refused() {
        let bytes = SaveGame {
            version: "version 666".into(),
            ..sample()
        }
        .to_bytes()
        .expect("encode");
        assert!(matches!(SaveGame::from_bytes(&bytes), Err(SaveError::BadVersion(v)) if v == "version 666"));
    }

    #[test]
    fn inventory_survives_capture() {
        let mut p = Player::default();
        p.reborn();
        p.weapon_owned[Weapon::Shotgun as usize] = true;
        p.ready_weapon = Weapon::Shotgun;
        let saved = SavedPlayer::capture(&p);

        let mut q = Player::default();
        q.reborn();
        saved.restore(&mut q);
        assert_eq!(q.ready_weapon, Weapon::Shotgun);
        assert!(q.weapon_owned[Weapon::Shotgun as usize]);
        assert_eq!(q.ammo, p.ammo);
    }
}
