// Name → id tables for wall textures and flats.
// The simulation only ever deals in `TextureId`; ids follow the order the
// names appear in the WAD so animation ranges stay contiguous.

use std::collections::HashMap;

use byteorder::{LittleEndian as LE, ReadBytesExt};

use crate::wad::{Wad, WadError};

/// Runtime handle for a texture or flat.
///
/// *Guaranteed* to remain stable for the lifetime of the bank.
pub type TextureId = u16;

/// `-` in a sidedef, or a name the bank does not know.
/// Always = 0 because every table reserves its first slot for it.
pub const NO_TEXTURE: TextureId = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureKind {
    Wall,
    Flat,
}

/// Things that can go wrong when building the bank.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error(transparent)]
    Wad(#[from] WadError),

    #[error("texture directory `{0}` is truncated")]
    Truncated(&'static str),

    #[error("`{0}` found without a matching end marker")]
    UnterminatedFlats(&'static str),
}

/// One namespace (walls or flats).  Later names shadow earlier ones, like
/// lump lookups do.
#[derive(Clone, Debug)]
struct NameTable {
    by_name: HashMap<String, TextureId>,
    names: Vec<String>,
}

impl NameTable {
    fn new() -> Self {
        Self {
            by_name: HashMap::new(),
            names: vec!["-".to_owned()],
        }
    }

    fn push(&mut self, name: &str) -> TextureId {
        let id = self.names.len() as TextureId;
        let name = name.to_ascii_uppercase();
        self.by_name.insert(name.clone(), id);
        self.names.push(name);
        id
    }

    fn id(&self, name: &str) -> Option<TextureId> {
        if name == "-" {
            return Some(NO_TEXTURE);
        }
        self.by_name.get(&name.to_ascii_uppercase()).copied()
    }
}

/// Wall texture and flat namespaces for one game WAD.
#[derive(Clone, Debug)]
pub struct TextureBank {
    walls: NameTable,
    flats: NameTable,
}

impl Default for TextureBank {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureBank {
    // ---------------------------------------------------------------------
    // Constructors
    // ---------------------------------------------------------------------

    /// Empty bank: every lookup resolves to [`NO_TEXTURE`].
    pub fn new() -> Self {
        Self {
            walls: NameTable::new(),
            flats: NameTable::new(),
        }
    }

    pub fn from_names(walls: &[&str], flats: &[&str]) -> Self {
        let mut bank = Self::new();
        for w in walls {
            bank.walls.push(w);
        }
        for f in flats {
            bank.flats.push(f);
        }
        bank
    }

    /// Read wall names from TEXTURE1/TEXTURE2 and every lump between
    /// `F_START` and `F_END` as a flat.
    pub fn from_wad(wad: &Wad) -> Result<Self, TextureError> {
        let mut bank = Self::new();

        for table in ["TEXTURE1", "TEXTURE2"] {
            let Some(idx) = wad.find_lump(table) else {
                continue;
            };
            for name in texture_dir_names(wad.lump_bytes(idx)?, table)? {
                bank.walls.push(&name);
            }
        }

        let start = wad.find_lump("F_START").or_else(|| wad.find_lump("FF_START"));
        if let Some(start) = start {
            let end = wad
                .lumps()
                .iter()
                .enumerate()
                .skip(start + 1)
                .find(|(_, l)| matches!(Wad::lump_name_str(&l.name), "F_END" | "FF_END"))
                .map(|(i, _)| i)
                .ok_or(TextureError::UnterminatedFlats("F_START"))?;
            for l in &wad.lumps()[start + 1..end] {
                bank.flats.push(Wad::lump_name_str(&l.name));
            }
        }

        log::debug!(
            "texture bank: {} walls, {} flats",
            bank.wall_count(),
            bank.flat_count()
        );
        Ok(bank)
    }

    // ---------------------------------------------------------------------
    // Query helpers
    // ---------------------------------------------------------------------

    /// Entries per namespace, the reserved slot included.
    pub fn wall_count(&self) -> usize {
        self.walls.names.len()
    }

    pub fn flat_count(&self) -> usize {
        self.flats.names.len()
    }

    pub fn id(&self, kind: TextureKind, name: &str) -> Option<TextureId> {
        match kind {
            TextureKind::Wall => self.walls.id(name),
            TextureKind::Flat => self.flats.id(name),
        }
    }

    /// Fallback-safe query: unknown names resolve to [`NO_TEXTURE`].
    pub fn id_or_missing(&self, kind: TextureKind, name: &str) -> TextureId {
        self.id(kind, name).unwrap_or_else(|| {
            log::warn!("unknown {kind:?} texture `{name}`");
            NO_TEXTURE
        })
    }

    pub fn name(&self, kind: TextureKind, id: TextureId) -> Option<&str> {
        let table = match kind {
            TextureKind::Wall => &self.walls,
            TextureKind::Flat => &self.flats,
        };
        table.names.get(id as usize).map(String::as_str)
    }
}

/// Names listed in a TEXTURE1/TEXTURE2 directory, in order.
fn texture_dir_names(bytes: &[u8], table: &'static str) -> Result<Vec<String>, TextureError> {
    let mut cur = bytes;
    let count = cur
        .read_i32::<LE>()
        .map_err(|_| TextureError::Truncated(table))?
        .max(0) as usize;

    let mut names = Vec::with_capacity(count);
    for _ in 0..count {
        let off = cur
            .read_i32::<LE>()
            .map_err(|_| TextureError::Truncated(table))? as usize;
        let raw: &[u8; 8] = bytes
            .get(off..)
            .and_then(|s| s.get(..8))
            .and_then(|s| s.try_into().ok())
            .ok_or(TextureError::Truncated(table))?;
        names.push(Wad::lump_name_str(raw).to_owned());
    }
    Ok(names)
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::wad::{WadBuilder, name8};

    fn texture_dir(names: &[&str]) -> Vec<u8> {
        let mut out = (names.len() as i32).to_le_bytes().to_vec();
        let base = 4 + names.len() * 4;
        for i in 0..names.len() {
            out.extend(((base + i * 22) as i32).to_le_bytes());
        }
        for n in names {
            out.extend(name8(n));
            out.extend([0u8; 14]); // masked, size, columndirectory, patchcount
        }
        out
    }

    #[test]
    fn lookup_by_kind() {
        let bank = TextureBank::from_names(&["STARTAN3", "SW1COMM"], &["NUKAGE1"]);
        assert_eq!(bank.id(TextureKind::Wall, "startan3"), Some(1));
        assert_eq!(bank.id(TextureKind::Wall, "SW1COMM"), Some(2));
        assert_eq!(bank.id(TextureKind::Flat, "NUKAGE1"), Some(1));
        assert_eq!(bank.id(TextureKind::Flat, "STARTAN3"), None);
        assert_eq!(bank.id(TextureKind::Wall, "-"), Some(NO_TEXTURE));
    }

    #[test]
    fn unknown_name_gets_reserved_id() {
        let bank = TextureBank::new();
        assert_eq!(
            bank.id_or_missing(TextureKind::Wall, "NO_SUCH_TEXTURE"),
            NO_TEXTURE
        );
    }

    #[test]
    fn reads_directories_and_flat_range() {
        let wad = WadBuilder::new()
            .lump("TEXTURE1", texture_dir(&["AASHITTY", "BIGDOOR1"]))
            .lump("TEXTURE2", texture_dir(&["ZZWOLF1"]))
            .lump("F_START", vec![])
            .lump("FLOOR0_1", vec![0; 4096])
            .lump("NUKAGE1", vec![0; 4096])
            .lump("F_END", vec![])
            .into_wad()
            .unwrap();
        let bank = TextureBank::from_wad(&wad).unwrap();
        assert_eq!(bank.wall_count(), 4);
        assert_eq!(bank.id(TextureKind::Wall, "ZZWOLF1"), Some(3));
        assert_eq!(bank.id(TextureKind::Flat, "NUKAGE1"), Some(2));
        assert_eq!(bank.name(TextureKind::Flat, 1), Some("FLOOR0_1"));
    }

    #[test]
    fn truncated_directory_is_rejected() {
        let mut dir = texture_dir(&["AASHITTY"]);
        dir.truncate(10);
        let wad = WadBuilder::new().lump("TEXTURE1", dir).into_wad().unwrap();
        assert!(matches!(
            TextureBank::from_wad(&wad),
            Err(TextureError::Truncated("TEXTURE1"))
        ));
    }
}
