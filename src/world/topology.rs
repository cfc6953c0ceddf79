// ──────────────────────────────────────────────────────────────────────────
// world/topology.rs
//
//  *   per line    slope class, bbox, front/back sector
//  *   per ssector owning sector (from its first seg)
//  *   per sector  member lines, bbox, sound origin, blockmap cell range
//
// plus the neighbourhood queries movers and lights ask of a sector.
// ──────────────────────────────────────────────────────────────────────────

use crate::wad::LoadError;
use crate::world::fixed::Fixed;
use crate::world::geometry::{
    BBox, BlockBox, Level, LinedefFlags, LinedefId, MAPBLOCKSHIFT, SectorId, SlopeType,
};

/// Radius of the largest actor; sector cell ranges grow by it.
pub const MAXRADIUS: Fixed = Fixed::from_int(32);

/// `dx == 0` wins over `dy == 0`, so a zero-length line is vertical.
pub fn slope_of(dx: Fixed, dy: Fixed) -> SlopeType {
    if dx.is_zero() {
        SlopeType::Vertical
    } else if dy.is_zero() {
        SlopeType::Horizontal
    } else if dy / dx > Fixed::ZERO {
        SlopeType::Positive
    } else {
        SlopeType::Negative
    }
}

#[inline]
fn clamp_cell(v: i32, n: i32) -> i32 {
    v.min(n - 1).max(0)
}

impl Level {
    /// Derive everything the raw lumps leave implicit.  Must run once, after
    /// every cross reference has been validated.
    pub fn build_topology(&mut self) -> Result<(), LoadError> {
        self.derive_lines();
        self.resolve_subsectors();
        self.group_lines()
    }

    /*------------------------- per line -----------------------------*/

    fn derive_lines(&mut self) {
        for line in &mut self.linedefs {
            let v1 = self.vertices[line.v1 as usize];
            let v2 = self.vertices[line.v2 as usize];
            line.dx = v2.x - v1.x;
            line.dy = v2.y - v1.y;
            line.slope = slope_of(line.dx, line.dy);

            line.bbox = BBox::EMPTY;
            line.bbox.add_point(v1.x, v1.y);
            line.bbox.add_point(v2.x, v2.y);

            line.front_sector = line.sides[0].map(|s| self.sidedefs[s as usize].sector);
            line.back_sector = line.sides[1].map(|s| self.sidedefs[s as usize].sector);
        }
    }

    fn resolve_subsectors(&mut self) {
        for ss in &mut self.subsectors {
            ss.sector = self.segs[ss.first_seg as usize].front_sector;
        }
    }

    /*------------------------- per sector ---------------------------*/

    fn group_lines(&mut self) -> Result<(), LoadError> {
        for sector in &mut self.sectors {
            sector.lines.clear();
            sector.line_count = 0;
            sector.bbox = BBox::EMPTY;
        }

        // Line-major: count (line, side) incidences and file each line once
        // under every sector it touches.
        for (li, line) in self.linedefs.iter().enumerate() {
            let v1 = self.vertices[line.v1 as usize];
            let v2 = self.vertices[line.v2 as usize];
            let mut last = None;
            for sec in [line.front_sector, line.back_sector].into_iter().flatten() {
                let sector = &mut self.sectors[sec as usize];
                sector.line_count += 1;
                if last == Some(sec) {
                    continue;
                }
                last = Some(sec);
                sector.lines.push(li as LinedefId);
                sector.bbox.add_point(v1.x, v1.y);
                sector.bbox.add_point(v2.x, v2.y);
            }
        }

        self.check_line_counts()?;

        // Sector-major: sound origin and blockmap cell range.
        let bm = &self.blockmap;
        for (si, sector) in self.sectors.iter_mut().enumerate() {
            if sector.lines.is_empty() {
                log::warn!("sector {si} has no lines");
                sector.block_box = BlockBox::default();
                continue;
            }

            let b = sector.bbox;
            sector.sound_origin = (
                Fixed(((b.left.raw() as i64 + b.right.raw() as i64) / 2) as i32),
                Fixed(((b.bottom.raw() as i64 + b.top.raw() as i64) / 2) as i32),
            );

            let cell = |v: Fixed| v.raw() >> MAPBLOCKSHIFT;
            sector.block_box = BlockBox {
                top: clamp_cell(cell(b.top - bm.origin_y + MAXRADIUS), bm.height),
                bottom: clamp_cell(cell(b.bottom - bm.origin_y - MAXRADIUS), bm.height),
                right: clamp_cell(cell(b.right - bm.origin_x + MAXRADIUS), bm.width),
                left: clamp_cell(cell(b.left - bm.origin_x - MAXRADIUS), bm.width),
            };
        }

        log::debug!(
            "grouped {} line incidences into {} sectors",
            self.sectors.iter().map(|s| s.line_count).sum::<usize>(),
            self.sectors.len()
        );
        Ok(())
    }

    /// Guard: every sector's `line_count` must equal the incidences its own
    /// member list accounts for.
    pub fn check_line_counts(&self) -> Result<(), LoadError> {
        for (si, sector) in self.sectors.iter().enumerate() {
            let grouped: usize = sector
                .lines
                .iter()
                .map(|&li| {
                    let l = &self.linedefs[li as usize];
                    let touches = |s: Option<SectorId>| s == Some(si as SectorId);
                    touches(l.front_sector) as usize + touches(l.back_sector) as usize
                })
                .sum();
            if grouped != sector.line_count {
                return Err(LoadError::LineCountMismatch {
                    sector: si,
                    expected: sector.line_count,
                    actual: grouped,
                });
            }
        }
        Ok(())
    }

    // ──────────────────────────────────────────────────────────────────
    //                   Sector neighbourhood queries
    // ──────────────────────────────────────────────────────────────────

    /// Sector on the other side of `line` from `sec`, if the line is
    /// two-sided.
    pub fn next_sector(&self, line: LinedefId, sec: SectorId) -> Option<SectorId> {
        let l = &self.linedefs[line as usize];
        if !l.flags.contains(LinedefFlags::TWO_SIDED) {
            return None;
        }
        if l.front_sector == Some(sec) {
            l.back_sector
        } else {
            l.front_sector
        }
    }

    fn neighbours(&self, sec: SectorId) -> impl Iterator<Item = SectorId> + '_ {
        self.sectors[sec as usize]
            .lines
            .iter()
            .filter_map(move |&l| self.next_sector(l, sec))
    }

    pub fn lowest_floor_surrounding(&self, sec: SectorId) -> Fixed {
        self.neighbours(sec)
            .map(|s| self.sectors[s as usize].floor_height)
            .fold(self.sectors[sec as usize].floor_height, Fixed::min)
    }

    pub fn highest_floor_surrounding(&self, sec: SectorId) -> Fixed {
        self.neighbours(sec)
            .map(|s| self.sectors[s as usize].floor_height)
            .fold(Fixed::from_int(-500), Fixed::max)
    }

    pub fn lowest_ceiling_surrounding(&self, sec: SectorId) -> Fixed {
        self.neighbours(sec)
            .map(|s| self.sectors[s as usize].ceiling_height)
            .fold(Fixed::MAX, Fixed::min)
    }

    pub fn highest_ceiling_surrounding(&self, sec: SectorId) -> Fixed {
        self.neighbours(sec)
            .map(|s| self.sectors[s as usize].ceiling_height)
            .fold(Fixed::ZERO, Fixed::max)
    }

    /// Dimmest neighbouring light, starting from `max`.
    pub fn min_surrounding_light(&self, sec: SectorId, max: i16) -> i16 {
        self.neighbours(sec)
            .map(|s| self.sectors[s as usize].light_level)
            .fold(max, i16::min)
    }

    pub fn sectors_with_tag(&self, tag: i16) -> impl Iterator<Item = SectorId> + '_ {
        self.sectors
            .iter()
            .enumerate()
            .filter(move |(_, s)| s.tag == tag)
            .map(|(i, _)| i as SectorId)
    }
}
