//! # Doom WAD archive
//!
//! * Reads the entire IWAD/PWAD into RAM.
//! * Provides zero-copy access to individual lumps.
//! * Decodes binary lumps into typed vectors with **bincode 2**.

use bincode::{Decode, config, decode_from_slice};
use byteorder::{LittleEndian as LE, ReadBytesExt};
use std::{
    collections::HashMap,
    fs::File,
    io::{self, Read},
    mem,
    path::Path,
};
use thiserror::Error;

/// Size of one directory entry on disk.
pub const DIR_ENTRY_SIZE: usize = 16;

/// One entry in the lump directory (16 bytes on disk).
#[derive(Clone, Debug)]
pub struct LumpInfo {
    pub name: [u8; 8],
    pub offset: u32,
    pub size: u32,
}

/// Entire WAD in memory (raw bytes + parsed directory).
#[derive(Debug)]
pub struct Wad {
    lumps: Vec<LumpInfo>,
    bytes: Vec<u8>,
    by_name: HashMap<String, usize>,
}

/// Loader / decoding errors.
#[derive(Error, Debug)]
pub enum WadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("file is not an IWAD or PWAD")]
    BadMagic,

    #[error("directory extends beyond end of file")]
    DirectoryOutOfBounds,

    #[error("lump index {0} out of range")]
    BadIndex(usize),

    #[error("lump {name} (# {index}) slice {offset}+{size} past EOF ({file_size})")]
    BadOffset {
        index: usize,
        name: String,
        offset: u32,
        size: u32,
        file_size: usize,
    },

    #[error("lump {name} (# {index}) element {elem}: {source}")]
    BadElement {
        index: usize,
        name: String,
        elem: usize,
        source: bincode::error::DecodeError,
    },
}

impl Wad {
    // ------------------------------------------------------------------ //
    // Low-level helpers
    // ------------------------------------------------------------------ //

    /// Expose directory as a read-only slice
    pub fn lumps(&self) -> &[LumpInfo] {
        &self.lumps
    }

    /// Return &str view of an 8-byte lump name (trimmed at first NUL).
    pub fn lump_name_str(name: &[u8; 8]) -> &str {
        let end = name.iter().position(|&b| b == 0).unwrap_or(name.len());
        std::str::from_utf8(&name[..end]).unwrap_or("?")
    }

    /// Raw bytes of lump `idx` (slice into `self.bytes`).
    pub fn lump_bytes(&self, idx: usize) -> Result<&[u8], WadError> {
        let l = self.lumps.get(idx).ok_or(WadError::BadIndex(idx))?;
        let start = l.offset as usize;
        let end = start + l.size as usize;
        if end > self.bytes.len() {
            return Err(WadError::BadOffset {
                index: idx,
                name: Self::lump_name_str(&l.name).into(),
                offset: l.offset,
                size: l.size,
                file_size: self.bytes.len(),
            });
        }
        Ok(&self.bytes[start..end])
    }

    /// Find the last lump with `name`, ignoring ASCII case.
    pub fn find_lump(&self, name: &str) -> Option<usize> {
        self.by_name.get(&name.to_ascii_uppercase()).copied()
    }

    // ------------------------------------------------------------------ //
    // Generic decode helper
    // ------------------------------------------------------------------ //

    /// Decode lump `idx` as a packed array of `T`.
    ///
    /// The record count is `len / size_of::<T>()`; a trailing partial record
    /// is ignored, never rejected.
    pub fn lump_to_vec<T>(&self, idx: usize) -> Result<Vec<T>, WadError>
    where
        T: Decode<()>,
    {
        let bytes = self.lump_bytes(idx)?;
        let elem = mem::size_of::<T>();
        let count = bytes.len() / elem;

        let cfg = config::standard()
            .with_fixed_int_encoding()
            .with_little_endian();
        let mut out = Vec::with_capacity(count);
        let mut slice = &bytes[..count * elem];

        while !slice.is_empty() {
            let (val, read) =
                decode_from_slice::<T, _>(slice, cfg).map_err(|e| WadError::BadElement {
                    index: idx,
                    name: Self::lump_name_str(&self.lumps[idx].name).into(),
                    elem: out.len(),
                    source: e,
                })?;
            out.push(val);
            slice = &slice[read..];
        }
        Ok(out)
    }

    // ------------------------------------------------------------------ //
    // Loading
    // ------------------------------------------------------------------ //

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WadError> {
        let mut file = File::open(path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, WadError> {
        let mut header = bytes.as_slice();

        let mut magic = [0u8; 4];
        header.read_exact(&mut magic).map_err(|_| WadError::BadMagic)?;
        if &magic != b"IWAD" && &magic != b"PWAD" {
            return Err(WadError::BadMagic);
        }

        let num_lumps = header.read_u32::<LE>()?;
        let dir_offset = header.read_u32::<LE>()?;

        // directory bounds check
        let dir_end = dir_offset as usize + num_lumps as usize * DIR_ENTRY_SIZE;
        if dir_end > bytes.len() {
            return Err(WadError::DirectoryOutOfBounds);
        }

        // parse directory
        let mut lumps = Vec::with_capacity(num_lumps as usize);
        let mut cur = &bytes[dir_offset as usize..dir_end];

        for _ in 0..num_lumps {
            let off = cur.read_u32::<LE>()?;
            let size = cur.read_u32::<LE>()?;
            let mut name = [0u8; 8];
            cur.read_exact(&mut name)?;
            lumps.push(LumpInfo {
                name,
                offset: off,
                size,
            });
        }

        // validate each lump slice
        for (i, l) in lumps.iter().enumerate() {
            let end = l.offset as usize + l.size as usize;
            if end > bytes.len() {
                return Err(WadError::BadOffset {
                    index: i,
                    name: Self::lump_name_str(&l.name).into(),
                    offset: l.offset,
                    size: l.size,
                    file_size: bytes.len(),
                });
            }
        }

        // build name → idx map (later lumps shadow earlier ones)
        let mut by_name = HashMap::with_capacity(lumps.len());
        for (i, l) in lumps.iter().enumerate().rev() {
            by_name
                .entry(Self::lump_name_str(&l.name).to_ascii_uppercase())
                .or_insert(i);
        }

        log::debug!("WAD directory: {} lumps", lumps.len());

        Ok(Self {
            lumps,
            bytes,
            by_name,
        })
    }
}

// ==========================================================================
// Tests
// ==========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wad::WadBuilder;

    #[test]
    fn find_lump_by_name() {
        let wad = WadBuilder::new()
            .lump("PLAYPAL", vec![0; 768])
            .lump("COLORMAP", vec![0; 16])
            .into_wad()
            .unwrap();
        let idx = wad.find_lump("playpal").expect("PLAYPAL not found");
        assert_eq!(Wad::lump_name_str(&wad.lumps()[idx].name), "PLAYPAL");
        assert_eq!(wad.lump_bytes(idx).unwrap().len(), 768);
    }

    #[test]
    fn later_lumps_shadow_earlier_ones() {
        let wad = WadBuilder::new()
            .lump("DEMO1", vec![1])
            .lump("DEMO1", vec![2, 2])
            .into_wad()
            .unwrap();
        assert_eq!(wad.find_lump("DEMO1"), Some(1));
    }

    #[test]
    fn rejects_garbage_file() {
        let tmp = tempfile::NamedTempFile::new().expect("tempfile");
        std::fs::write(tmp.path(), b"NOTWAD_____").unwrap();
        let err = Wad::from_file(tmp.path()).unwrap_err();
        assert!(matches!(err, WadError::BadMagic));
    }

    #[test]
    fn opens_file_on_disk() {
        let tmp = tempfile::NamedTempFile::new().expect("tempfile");
        std::fs::write(tmp.path(), WadBuilder::new().lump("ENDOOM", vec![7; 4]).build()).unwrap();
        let wad = Wad::from_file(tmp.path()).unwrap();
        assert_eq!(wad.lumps().len(), 1);
    }

    #[test]
    fn directory_entry_out_of_bounds() {
        let mut wad = Vec::<u8>::new();
        wad.extend_from_slice(b"IWAD");
        wad.extend(&1u32.to_le_bytes()); // num_lumps
        wad.extend(&12u32.to_le_bytes()); // dir_offset

        wad.extend(&1_000u32.to_le_bytes()); // lump offset (past EOF)
        wad.extend(&4u32.to_le_bytes()); // lump size
        wad.extend(b"BAD\0\0\0\0\0");

        let err = Wad::from_bytes(wad).unwrap_err();
        assert!(matches!(err, WadError::BadOffset { index: 0, .. }));
    }

    #[test]
    fn lump_to_vec_ignores_trailing_partial_record() {
        #[repr(C)]
        #[derive(Clone, Copy, Debug, PartialEq, bincode::Decode)]
        struct Foo {
            a: i16,
            b: i16,
        }

        // [ (1,2), (3,4) ] + one stray byte
        let mut bytes = [1i16, 2, 3, 4]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect::<Vec<_>>();
        bytes.push(0xAA);

        let wad = WadBuilder::new().lump("FOO", bytes).into_wad().unwrap();
        let v: Vec<Foo> = wad.lump_to_vec(0).unwrap();
        assert_eq!(v, vec![Foo { a: 1, b: 2 }, Foo { a: 3, b: 4 }]);
    }

    #[test]
    fn empty_lump_decodes_to_empty_vec() {
        let wad = WadBuilder::new().lump("REJECT", vec![]).into_wad().unwrap();
        let v: Vec<i16> = wad.lump_to_vec(0).unwrap();
        assert!(v.is_empty());
    }
}
