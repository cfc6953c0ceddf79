//! Level specials: animated surfaces, switches, scrolling walls and the
//! sector effects armed when a level loads.

use thiserror::Error;

use super::lights::{self, FASTDARK, SLOWDARK};
use super::movers::{self, MAXCEILINGS, MAXPLATS};
use super::options::GameMode;
use super::thinker::{ThinkerId, ThinkerKind};
use super::world::World;
use crate::defs::{ANIMDEFS, SWITCHES};
use crate::world::{FRACUNIT, Fixed, LinedefId, TextureBank, TextureId, TextureKind};

pub const MAXBUTTONS: usize = 16;
/// Tics a repeatable switch stays pressed.
pub const BUTTONTIME: i32 = 35;
pub const MAXLINEANIMS: usize = 64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecialsError {
    #[error("no button slots left")]
    NoButtonSlots,

    #[error("animation {start}..{end} has fewer than two frames")]
    BadAnimCycle {
        start: &'static str,
        end: &'static str,
    },

    #[error("animation end `{0}` not found")]
    MissingTexture(&'static str),

    #[error("no more platform slots")]
    NoPlatSlots,
}

/* ─────────────────────────── per-game tables ─────────────────────────── */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anim {
    pub kind: TextureKind,
    /// last frame
    pub pic: TextureId,
    pub base: TextureId,
    pub num_pics: i32,
    pub speed: i32,
}

/// Animation cycles and switch pairs present in one texture bank.
#[derive(Debug, Clone, Default)]
pub struct SpecialDefs {
    pub anims: Vec<Anim>,
    /// `off, on` texture pairs, flattened so that `i ^ 1` is the partner.
    pub switches: Vec<TextureId>,
    wall_count: usize,
    flat_count: usize,
}

impl SpecialDefs {
    pub fn new(bank: &TextureBank, mode: GameMode) -> Result<Self, SpecialsError> {
        let mut anims = Vec::new();
        for def in ANIMDEFS {
            let kind = if def.is_texture {
                TextureKind::Wall
            } else {
                TextureKind::Flat
            };
            let Some(base) = bank.id(kind, def.start) else {
                continue;
            };
            let pic = bank
                .id(kind, def.end)
                .ok_or(SpecialsError::MissingTexture(def.end))?;
            let num_pics = pic as i32 - base as i32 + 1;
            if num_pics < 2 {
                return Err(SpecialsError::BadAnimCycle {
                    start: def.start,
                    end: def.end,
                });
            }
            anims.push(Anim {
                kind,
                pic,
                base,
                num_pics,
                speed: def.speed,
            });
        }

        let class = mode.switch_class();
        let mut switches = Vec::new();
        for &(off, on, ep) in SWITCHES.iter().filter(|s| s.2 <= class) {
            match (bank.id(TextureKind::Wall, off), bank.id(TextureKind::Wall, on)) {
                (Some(a), Some(b)) => switches.extend([a, b]),
                _ => log::debug!("switch {off}/{on} (class {ep}) not in this game"),
            }
        }

        log::debug!(
            "{} animations, {} switches",
            anims.len(),
            switches.len() / 2
        );
        Ok(Self {
            anims,
            switches,
            wall_count: bank.wall_count(),
            flat_count: bank.flat_count(),
        })
    }
}

/* ─────────────────────────── per-level state ─────────────────────────── */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonPart {
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Button {
    pub line: LinedefId,
    pub part: ButtonPart,
    /// texture restored when the timer runs out
    pub texture: TextureId,
    pub timer: i32,
}

#[derive(Debug, Clone, Default)]
pub struct Specials {
    pub defs: SpecialDefs,
    pub wall_translation: Vec<TextureId>,
    pub flat_translation: Vec<TextureId>,
    pub buttons: [Option<Button>; MAXBUTTONS],
    /// lines whose front texture scrolls
    pub scrollers: Vec<LinedefId>,
    pub active_plats: [Option<ThinkerId>; MAXPLATS],
    pub active_ceilings: [Option<ThinkerId>; MAXCEILINGS],
}

impl Specials {
    pub fn new(defs: SpecialDefs) -> Self {
        let identity = |n: usize| (0..n).map(|i| i as TextureId).collect();
        Self {
            wall_translation: identity(defs.wall_count),
            flat_translation: identity(defs.flat_count),
            defs,
            ..Self::default()
        }
    }

    /// Frame currently shown for `id`.
    pub fn translate(&self, kind: TextureKind, id: TextureId) -> TextureId {
        let table = match kind {
            TextureKind::Wall => &self.wall_translation,
            TextureKind::Flat => &self.flat_translation,
        };
        table.get(id as usize).copied().unwrap_or(id)
    }
}

/* ────────────────────────────── level load ───────────────────────────── */

/// Arm sector lighting, doors and secrets; collect scrolling lines.
pub(crate) fn spawn_specials(world: &mut World) {
    for sec in 0..world.level.sectors.len() as u16 {
        let light = match world.level.sectors[sec as usize].special {
            1 => Some(lights::flash(world, sec)),
            2 => Some(lights::strobe(world, sec, FASTDARK, false)),
            3 => Some(lights::strobe(world, sec, SLOWDARK, false)),
            4 => {
                let l = lights::strobe(world, sec, FASTDARK, false);
                // still hurts
                world.level.sectors[sec as usize].special = 4;
                Some(l)
            }
            8 => Some(lights::glow(world, sec)),
            9 => {
                world.totals.secrets += 1;
                None
            }
            10 => {
                movers::spawn_door_close_in_30(world, sec);
                None
            }
            12 => Some(lights::strobe(world, sec, SLOWDARK, true)),
            13 => Some(lights::strobe(world, sec, FASTDARK, true)),
            14 => {
                movers::spawn_door_raise_in_5_mins(world, sec);
                None
            }
            17 => Some(lights::fire_flicker(world, sec)),
            _ => None,
        };
        if let Some(light) = light {
            world.thinkers.add(ThinkerKind::Light(light));
        }
    }

    let specials = &mut world.specials;
    specials.scrollers.clear();
    for (i, line) in world.level.linedefs.iter().enumerate() {
        if line.special == 48 {
            if specials.scrollers.len() == MAXLINEANIMS {
                log::warn!("too many scrolling lines, {i} ignored");
                continue;
            }
            specials.scrollers.push(i as LinedefId);
        }
    }
    specials.active_plats = [None; MAXPLATS];
    specials.active_ceilings = [None; MAXCEILINGS];
    specials.buttons = [None; MAXBUTTONS];

    log::debug!(
        "specials armed: {} thinkers, {} scrollers, {} secrets",
        world.thinkers.len(),
        world.specials.scrollers.len(),
        world.totals.secrets
    );
}

/* ────────────────────────────── per tic ──────────────────────────────── */

pub(crate) fn update_specials(world: &mut World) {
    let time = world.level_time;
    let specials = &mut world.specials;

    for anim in &specials.defs.anims {
        let table = match anim.kind {
            TextureKind::Wall => &mut specials.wall_translation,
            TextureKind::Flat => &mut specials.flat_translation,
        };
        for i in anim.base as i32..=anim.pic as i32 {
            let frame = anim.base as i32 + (time / anim.speed + i) % anim.num_pics;
            if let Some(slot) = table.get_mut(i as usize) {
                *slot = frame as TextureId;
            }
        }
    }

    for &line in &specials.scrollers {
        let side = world.level.linedefs[line as usize].sides[0];
        if let Some(side) = side {
            world.level.sidedefs[side as usize].texture_offset += Fixed(FRACUNIT);
        }
    }

    for slot in specials.buttons.iter_mut() {
        let Some(button) = slot else {
            continue;
        };
        button.timer -= 1;
        if button.timer > 0 {
            continue;
        }
        let side = world.level.linedefs[button.line as usize].sides[0];
        if let Some(side) = side {
            let side = &mut world.level.sidedefs[side as usize];
            match button.part {
                ButtonPart::Top => side.top = button.texture,
                ButtonPart::Middle => side.middle = button.texture,
                ButtonPart::Bottom => side.bottom = button.texture,
            }
        }
        *slot = None;
    }
}

/* ────────────────────────────── switches ─────────────────────────────── */

/// Flip the switch texture on `line`'s front side.  A switch that can be
/// used again pops back after [`BUTTONTIME`] tics.
pub fn change_switch_texture(
    world: &mut World,
    line: LinedefId,
    use_again: bool,
) -> Result<(), SpecialsError> {
    let Some(l) = world.level.linedefs.get_mut(line as usize) else {
        return Ok(());
    };
    if !use_again {
        l.special = 0;
    }
    let Some(side) = l.sides[0] else {
        return Ok(());
    };

    let sd = &world.level.sidedefs[side as usize];
    let (top, mid, bottom) = (sd.top, sd.middle, sd.bottom);
    let switches = &world.specials.defs.switches;
    let hit = switches.iter().enumerate().find_map(|(i, &tex)| {
        let part = if tex == top {
            ButtonPart::Top
        } else if tex == mid {
            ButtonPart::Middle
        } else if tex == bottom {
            ButtonPart::Bottom
        } else {
            return None;
        };
        Some((part, tex, switches[i ^ 1]))
    });
    let Some((part, tex, partner)) = hit else {
        return Ok(());
    };

    let sd = &mut world.level.sidedefs[side as usize];
    match part {
        ButtonPart::Top => sd.top = partner,
        ButtonPart::Middle => sd.middle = partner,
        ButtonPart::Bottom => sd.bottom = partner,
    }
    if use_again {
        start_button(world, line, part, tex)?;
    }
    Ok(())
}

fn start_button(
    world: &mut World,
    line: LinedefId,
    part: ButtonPart,
    texture: TextureId,
) -> Result<(), SpecialsError> {
    let buttons = &mut world.specials.buttons;
    if buttons.iter().flatten().any(|b| b.line == line) {
        return Ok(());
    }
    let slot = buttons
        .iter_mut()
        .find(|b| b.is_none())
        .ok_or(SpecialsError::NoButtonSlots)?;
    *slot = Some(Button {
        line,
        part,
        texture,
        timer: BUTTONTIME,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Random;
    use crate::wad::{MapBuilder, WadBuilder, load_level};

    fn bank() -> TextureBank {
        TextureBank::from_names(
            &["STARTAN3", "SW1STRTN", "SW2STRTN", "SW1LION", "SW2LION"],
            &["FLOOR4_8", "CEIL3_5", "NUKAGE1", "NUKAGE2", "NUKAGE3"],
        )
    }

    fn world_with(map: &MapBuilder, mode: GameMode) -> World {
        let wad = WadBuilder::new().map(map).into_wad().expect("wad");
        let bank = bank();
        let level = load_level(&wad, 0, &bank).expect("level");
        let defs = SpecialDefs::new(&bank, mode).expect("defs");
        World::new(level, Random::new(), Specials::new(defs))
    }

    #[test]
    fn defs_follow_bank_and_mode() {
        let defs = SpecialDefs::new(&bank(), GameMode::Shareware).expect("defs");
        assert_eq!(defs.anims.len(), 1);
        assert_eq!(defs.anims[0].num_pics, 3);
        // the lion switch is registered-only
        assert_eq!(defs.switches, vec![2, 3]);
        let defs = SpecialDefs::new(&bank(), GameMode::Registered).expect("defs");
        assert_eq!(defs.switches, vec![2, 3, 4, 5]);
    }

    #[test]
    fn reversed_cycle_is_fatal() {
        let bank = TextureBank::from_names(&[], &["NUKAGE3", "NUKAGE1"]);
        assert_eq!(
            SpecialDefs::new(&bank, GameMode::Shareware).err(),
            Some(SpecialsError::BadAnimCycle {
                start: "NUKAGE1",
                end: "NUKAGE3"
            })
        );
        let bank = TextureBank::from_names(&[], &["NUKAGE1"]);
        assert_eq!(
            SpecialDefs::new(&bank, GameMode::Shareware).err(),
            Some(SpecialsError::MissingTexture("NUKAGE3"))
        );
    }

    #[test]
    fn flats_cycle_every_eight_tics() {
        let mut w = world_with(&MapBuilder::room("E1M1", 0, 0, 128, 128), GameMode::Shareware);
        let nukage1 = 3;
        update_specials(&mut w);
        assert_eq!(w.specials.translate(TextureKind::Flat, nukage1), 3);
        w.level_time = 8;
        update_specials(&mut w);
        assert_eq!(w.specials.translate(TextureKind::Flat, nukage1), 4);
        assert_eq!(w.specials.translate(TextureKind::Flat, 5), 3);
        w.level_time = 24;
        update_specials(&mut w);
        assert_eq!(w.specials.translate(TextureKind::Flat, nukage1), 3);
        // untouched names translate to themselves
        assert_eq!(w.specials.translate(TextureKind::Flat, 1), 1);
    }

    #[test]
    fn repeatable_switch_pops_back() {
        let mut m = MapBuilder::room("E1M1", 0, 0, 128, 128);
        m.sidedefs[0].mid_tex = crate::wad::name8("SW1STRTN");
        let mut w = world_with(&m, GameMode::Shareware);
        w.level.linedefs[0].special = 62;

        change_switch_texture(&mut w, 0, true).expect("switch");
        assert_eq!(w.level.sidedefs[0].middle, 3);
        assert_eq!(w.level.linedefs[0].special, 62);
        // pressing again while down starts no second timer
        change_switch_texture(&mut w, 0, true).expect("switch");
        assert_eq!(w.specials.buttons.iter().flatten().count(), 1);

        for _ in 0..BUTTONTIME {
            update_specials(&mut w);
        }
        assert_eq!(w.level.sidedefs[0].middle, 2);
        assert!(w.specials.buttons.iter().all(Option::is_none));
    }

    #[test]
    fn one_shot_switch_clears_special() {
        let mut m = MapBuilder::room("E1M1", 0, 0, 128, 128);
        m.sidedefs[1].mid_tex = crate::wad::name8("SW1STRTN");
        let mut w = world_with(&m, GameMode::Shareware);
        w.level.linedefs[1].special = 11;
        change_switch_texture(&mut w, 1, false).expect("switch");
        assert_eq!(w.level.linedefs[1].special, 0);
        assert_eq!(w.level.sidedefs[1].middle, 3);
        assert!(w.specials.buttons.iter().all(Option::is_none));
    }

    #[test]
    fn button_slots_run_out() {
        let mut m = MapBuilder::room("E1M1", 0, 0, 128, 128);
        m.sidedefs[0].mid_tex = crate::wad::name8("SW1STRTN");
        let mut w = world_with(&m, GameMode::Shareware);
        for (i, b) in w.specials.buttons.iter_mut().enumerate() {
            *b = Some(Button {
                line: 100 + i as LinedefId,
                part: ButtonPart::Top,
                texture: 0,
                timer: BUTTONTIME,
            });
        }
        assert_eq!(
            change_switch_texture(&mut w, 0, true),
            Err(SpecialsError::NoButtonSlots)
        );
    }

    #[test]
    fn sector_specials_arm_thinkers() {
        let mut m = MapBuilder::room("E1M1", 0, 0, 128, 128);
        m.linedefs[2].special = 48;
        let mut w = world_with(&m, GameMode::Shareware);
        w.level.sectors[0].special = 9;
        w.spawn_specials();
        assert_eq!(w.totals.secrets, 1);
        assert_eq!(w.level.sectors[0].special, 9);
        assert_eq!(w.specials.scrollers, vec![2]);
        assert!(w.thinkers.is_empty());

        let before = w.level.sidedefs[2].texture_offset;
        w.run_tic();
        assert_eq!(w.level.sidedefs[2].texture_offset, before + Fixed(FRACUNIT));

        w.level.sectors[0].special = 4;
        w.spawn_specials();
        assert_eq!(w.level.sectors[0].special, 4);
        assert_eq!(w.thinkers.len(), 1);

        w.level.sectors[0].special = 14;
        w.spawn_specials();
        assert_eq!(w.level.sectors[0].special, 0);
        assert!(w.level.sectors[0].special_data.is_some());
    }
}
