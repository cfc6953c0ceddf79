//! Sector lighting effects.

use super::world::World;
use crate::world::SectorId;

pub const GLOWSPEED: i16 = 8;
pub const STROBEBRIGHT: i32 = 5;
pub const FASTDARK: i32 = 15;
pub const SLOWDARK: i32 = 35;

const FLASH_MAX_TIME: i32 = 64;
const FLASH_MIN_TIME: i32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    /// Random flicker between the sector light and its dimmest neighbour.
    Flash { max_time: i32, min_time: i32 },
    Strobe { dark_time: i32, bright_time: i32 },
    Glow { direction: i8 },
    FireFlicker,
}

#[derive(Debug, Clone, Copy)]
pub struct Light {
    pub sector: SectorId,
    pub kind: LightKind,
    pub count: i32,
    pub min_light: i16,
    pub max_light: i16,
}

impl Light {
    pub fn think(&mut self, world: &mut World) {
        let Some(sector) = world.level.sectors.get_mut(self.sector as usize) else {
            return;
        };
        match &mut self.kind {
            LightKind::Flash { max_time, min_time } => {
                self.count -= 1;
                if self.count != 0 {
                    return;
                }
                if sector.light_level == self.max_light {
                    sector.light_level = self.min_light;
                    self.count = (world.rng.p_random() & *min_time) + 1;
                } else {
                    sector.light_level = self.max_light;
                    self.count = (world.rng.p_random() & *max_time) + 1;
                }
            }
            LightKind::Strobe {
                dark_time,
                bright_time,
            } => {
                self.count -= 1;
                if self.count != 0 {
                    return;
                }
                if sector.light_level == self.min_light {
                    sector.light_level = self.max_light;
                    self.count = *bright_time;
                } else {
                    sector.light_level = self.min_light;
                    self.count = *dark_time;
                }
            }
            LightKind::Glow { direction } => {
                if *direction < 0 {
                    sector.light_level -= GLOWSPEED;
                    if sector.light_level <= self.min_light {
                        sector.light_level += GLOWSPEED;
                        *direction = 1;
                    }
                } else {
                    sector.light_level += GLOWSPEED;
                    if sector.light_level >= self.max_light {
                        sector.light_level -= GLOWSPEED;
                        *direction = -1;
                    }
                }
            }
            LightKind::FireFlicker => {
                self.count -= 1;
                if self.count != 0 {
                    return;
                }
                let amount = ((world.rng.p_random() & 3) * 16) as i16;
                sector.light_level = if sector.light_level - amount < self.min_light {
                    self.min_light
                } else {
                    self.max_light - amount
                };
                self.count = 4;
            }
        }
    }
}

/* ───────────────────────────── spawners ───────────────────────────── */
// Each spawner clears the sector special it consumes.

pub fn flash(world: &mut World, sec: SectorId) -> Light {
    let level = &mut world.level;
    let max_light = level.sectors[sec as usize].light_level;
    let min_light = level.min_surrounding_light(sec, max_light);
    level.sectors[sec as usize].special = 0;
    Light {
        sector: sec,
        kind: LightKind::Flash {
            max_time: FLASH_MAX_TIME,
            min_time: FLASH_MIN_TIME,
        },
        count: (world.rng.p_random() & FLASH_MAX_TIME) + 1,
        min_light,
        max_light,
    }
}

pub fn strobe(world: &mut World, sec: SectorId, dark_time: i32, in_sync: bool) -> Light {
    let level = &mut world.level;
    let max_light = level.sectors[sec as usize].light_level;
    let mut min_light = level.min_surrounding_light(sec, max_light);
    if min_light == max_light {
        min_light = 0;
    }
    level.sectors[sec as usize].special = 0;
    let count = if in_sync {
        1
    } else {
        (world.rng.p_random() & 7) + 1
    };
    Light {
        sector: sec,
        kind: LightKind::Strobe {
            dark_time,
            bright_time: STROBEBRIGHT,
        },
        count,
        min_light,
        max_light,
    }
}

pub fn glow(world: &mut World, sec: SectorId) -> Light {
    let level = &mut world.level;
    let max_light = level.sectors[sec as usize].light_level;
    let min_light = level.min_surrounding_light(sec, max_light);
    level.sectors[sec as usize].special = 0;
    Light {
        sector: sec,
        kind: LightKind::Glow { direction: -1 },
        count: 0,
        min_light,
        max_light,
    }
}

pub fn fire_flicker(world: &mut World, sec: SectorId) -> Light {
    let level = &mut world.level;
    let max_light = level.sectors[sec as usize].light_level;
    let min_light = level.min_surrounding_light(sec, max_light) + 16;
    level.sectors[sec as usize].special = 0;
    Light {
        sector: sec,
        kind: LightKind::FireFlicker,
        count: 4,
        min_light,
        max_light,
    }
}
