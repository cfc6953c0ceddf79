//! Moving sector planes: doors, platforms and crushing ceilings.

use hecs::Entity;

use super::components::{ActorFlags, Bounds, Health, Momentum, Position};
use super::mob::{self, height_clip};
use super::specials::SpecialsError;
use super::thinker::{ThinkerId, ThinkerKind};
use super::world::World;
use crate::defs::{MobjFlags, by_id};
use crate::world::{Fixed, FRACUNIT, SectorId};

pub const VDOORSPEED: Fixed = Fixed(FRACUNIT * 2);
pub const VDOORWAIT: i32 = 150;
pub const PLATSPEED: Fixed = Fixed(FRACUNIT);
pub const PLATWAIT: i32 = 3;
pub const CEILSPEED: Fixed = Fixed(FRACUNIT);
pub const MAXPLATS: usize = 30;
pub const MAXCEILINGS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResult {
    Ok,
    Crushed,
    PastDest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    Floor,
    Ceiling,
}

/* ───────────────────────────── plane motion ───────────────────────────── */

fn height_mut(world: &mut World, sec: SectorId, plane: Plane) -> &mut Fixed {
    let s = &mut world.level.sectors[sec as usize];
    match plane {
        Plane::Floor => &mut s.floor_height,
        Plane::Ceiling => &mut s.ceiling_height,
    }
}

/// Step one plane of `sec` toward `dest`.  Objects that would no longer
/// fit push the plane back, unless `crush` lets a floor rise or a ceiling
/// lower through them.
pub fn move_plane(
    world: &mut World,
    sec: SectorId,
    speed: Fixed,
    dest: Fixed,
    crush: bool,
    plane: Plane,
    direction: i32,
) -> MoveResult {
    let last = *height_mut(world, sec, plane);

    let overshoots = if direction < 0 {
        last - speed < dest
    } else {
        last + speed > dest
    };
    if overshoots {
        *height_mut(world, sec, plane) = dest;
        if change_sector(world, sec, crush) {
            *height_mut(world, sec, plane) = last;
            change_sector(world, sec, crush);
        }
        return MoveResult::PastDest;
    }

    let next = if direction < 0 { last - speed } else { last + speed };
    *height_mut(world, sec, plane) = next;
    let blocked = change_sector(world, sec, crush);

    // a rising ceiling never meets resistance
    if plane == Plane::Ceiling && direction > 0 {
        return MoveResult::Ok;
    }
    if !blocked {
        return MoveResult::Ok;
    }
    // a falling floor has nothing to crush, a crushing mover keeps going
    let presses = (plane == Plane::Floor) == (direction > 0);
    if presses && crush {
        return MoveResult::Crushed;
    }
    *height_mut(world, sec, plane) = last;
    change_sector(world, sec, crush);
    MoveResult::Crushed
}

/// Re-fit every object in the sector's block box.  Returns true if any
/// shootable object no longer fits.
pub fn change_sector(world: &mut World, sec: SectorId, crush: bool) -> bool {
    let bb = world.level.sectors[sec as usize].block_box;
    let mut things: Vec<Entity> = Vec::new();
    for bx in bb.left..=bb.right {
        for by in bb.bottom..=bb.top {
            if let Some(cell) = world.level.blockmap.cell(bx, by) {
                things.extend_from_slice(world.level.blockmap.objects(cell));
            }
        }
    }

    let mut no_fit = false;
    for e in things {
        if world.ecs.contains(e) && squash(world, e, crush) {
            no_fit = true;
        }
    }
    no_fit
}

fn squash(world: &mut World, e: Entity, crush: bool) -> bool {
    if height_clip(world, e) {
        return false;
    }
    let Ok((health, flags, b)) = world
        .ecs
        .query_one_mut::<(&Health, &mut ActorFlags, &mut Bounds)>(e)
    else {
        return false;
    };

    if health.0 <= 0 {
        // crunched to gibs
        flags.0.remove(MobjFlags::SOLID);
        b.height = Fixed::ZERO;
        b.radius = Fixed::ZERO;
        return false;
    }
    if flags.0.contains(MobjFlags::DROPPED) {
        mob::remove_mobj(world, e);
        return false;
    }
    if !flags.0.contains(MobjFlags::SHOOTABLE) {
        return false;
    }

    if crush && world.level_time & 3 == 0 {
        mob::damage_mobj(world, e, 10);
        spray_blood(world, e);
    }
    true
}

fn spray_blood(world: &mut World, e: Entity) {
    let Some(blood) = by_id("MT_BLOOD") else {
        return;
    };
    let Ok((x, y, z)) = world
        .ecs
        .query_one_mut::<(&Position, &Bounds)>(e)
        .map(|(p, b)| (p.x, p.y, p.z + Fixed(b.height.raw() / 2)))
    else {
        return;
    };
    let spray = mob::spawn_mobj(world, x, y, z, blood);
    let mx = (world.rng.p_random() - world.rng.p_random()) << 12;
    let my = (world.rng.p_random() - world.rng.p_random()) << 12;
    if let Ok(mut m) = world.ecs.get::<&mut Momentum>(spray) {
        m.x = Fixed(mx);
        m.y = Fixed(my);
    }
}

/* ─────────────────────────────── doors ──────────────────────────────── */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorKind {
    /// Open, wait, close.
    Normal,
    Close,
    Open,
    Close30ThenOpen,
    RaiseIn5Mins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorDir {
    Down,
    Waiting,
    Up,
    /// Before the first move of a delayed door.
    InitialWait,
}

#[derive(Debug, Clone, Copy)]
pub struct Door {
    pub kind: DoorKind,
    pub sector: SectorId,
    pub top_height: Fixed,
    pub speed: Fixed,
    pub direction: DoorDir,
    pub top_wait: i32,
    pub top_countdown: i32,
}

impl Door {
    pub fn think(&mut self, world: &mut World, me: ThinkerId) {
        match self.direction {
            DoorDir::Waiting => {
                self.top_countdown -= 1;
                if self.top_countdown == 0 {
                    match self.kind {
                        DoorKind::Normal => self.direction = DoorDir::Down,
                        DoorKind::Close30ThenOpen => self.direction = DoorDir::Up,
                        _ => {}
                    }
                }
            }
            DoorDir::InitialWait => {
                self.top_countdown -= 1;
                if self.top_countdown == 0 && self.kind == DoorKind::RaiseIn5Mins {
                    self.direction = DoorDir::Up;
                    self.kind = DoorKind::Normal;
                }
            }
            DoorDir::Down => {
                let floor = world.level.sectors[self.sector as usize].floor_height;
                let res = move_plane(world, self.sector, self.speed, floor, false, Plane::Ceiling, -1);
                match res {
                    MoveResult::PastDest => match self.kind {
                        DoorKind::Normal | DoorKind::Close => finish(world, self.sector, me),
                        DoorKind::Close30ThenOpen => {
                            self.direction = DoorDir::Waiting;
                            self.top_countdown = 35 * 30;
                        }
                        _ => {}
                    },
                    MoveResult::Crushed if self.kind != DoorKind::Close => {
                        self.direction = DoorDir::Up;
                    }
                    _ => {}
                }
            }
            DoorDir::Up => {
                let res = move_plane(
                    world,
                    self.sector,
                    self.speed,
                    self.top_height,
                    false,
                    Plane::Ceiling,
                    1,
                );
                if res == MoveResult::PastDest {
                    match self.kind {
                        DoorKind::Normal => {
                            self.direction = DoorDir::Waiting;
                            self.top_countdown = self.top_wait;
                        }
                        DoorKind::Close30ThenOpen | DoorKind::Open => {
                            finish(world, self.sector, me)
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

fn finish(world: &mut World, sec: SectorId, me: ThinkerId) {
    world.level.sectors[sec as usize].special_data = None;
    world.thinkers.remove(me);
}

fn attach(world: &mut World, sec: SectorId, kind: ThinkerKind) -> ThinkerId {
    let id = world.thinkers.add(kind);
    world.level.sectors[sec as usize].special_data = Some(id);
    id
}

/// Sector special 10: the door closes after 30 seconds and stays shut.
pub fn spawn_door_close_in_30(world: &mut World, sec: SectorId) {
    world.level.sectors[sec as usize].special = 0;
    let door = Door {
        kind: DoorKind::Normal,
        sector: sec,
        top_height: Fixed::ZERO,
        speed: VDOORSPEED,
        direction: DoorDir::Waiting,
        top_wait: 0,
        top_countdown: 30 * 35,
    };
    attach(world, sec, ThinkerKind::Door(door));
}

/// Sector special 14: the door opens after five minutes, then behaves as a
/// normal door.
pub fn spawn_door_raise_in_5_mins(world: &mut World, sec: SectorId) {
    world.level.sectors[sec as usize].special = 0;
    let top_height = world.level.lowest_ceiling_surrounding(sec) - Fixed::from_int(4);
    let door = Door {
        kind: DoorKind::RaiseIn5Mins,
        sector: sec,
        top_height,
        speed: VDOORSPEED,
        direction: DoorDir::InitialWait,
        top_wait: VDOORWAIT,
        top_countdown: 5 * 60 * 35,
    };
    attach(world, sec, ThinkerKind::Door(door));
}

/* ───────────────────────────── platforms ────────────────────────────── */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatKind {
    PerpetualRaise,
    DownWaitUpStay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatStatus {
    Up,
    Down,
    Waiting,
    InStasis,
}

#[derive(Debug, Clone, Copy)]
pub struct Plat {
    pub kind: PlatKind,
    pub sector: SectorId,
    pub speed: Fixed,
    pub low: Fixed,
    pub high: Fixed,
    pub wait: i32,
    pub count: i32,
    pub status: PlatStatus,
    pub old_status: PlatStatus,
    pub crush: bool,
    pub tag: i16,
}

impl Plat {
    pub fn think(&mut self, world: &mut World, me: ThinkerId) {
        match self.status {
            PlatStatus::Up => {
                let res = move_plane(world, self.sector, self.speed, self.high, self.crush, Plane::Floor, 1);
                if res == MoveResult::Crushed && !self.crush {
                    self.count = self.wait;
                    self.status = PlatStatus::Down;
                } else if res == MoveResult::PastDest {
                    self.count = self.wait;
                    self.status = PlatStatus::Waiting;
                    if self.kind == PlatKind::DownWaitUpStay {
                        remove_active_plat(world, self.sector, me);
                    }
                }
            }
            PlatStatus::Down => {
                let res = move_plane(world, self.sector, self.speed, self.low, false, Plane::Floor, -1);
                if res == MoveResult::PastDest {
                    self.count = self.wait;
                    self.status = PlatStatus::Waiting;
                }
            }
            PlatStatus::Waiting => {
                self.count -= 1;
                if self.count == 0 {
                    let floor = world.level.sectors[self.sector as usize].floor_height;
                    self.status = if floor == self.low {
                        PlatStatus::Up
                    } else {
                        PlatStatus::Down
                    };
                }
            }
            PlatStatus::InStasis => {}
        }
    }
}

fn remove_active_plat(world: &mut World, sec: SectorId, me: ThinkerId) {
    let slot = world
        .specials
        .active_plats
        .iter_mut()
        .find(|s| **s == Some(me));
    match slot {
        Some(slot) => {
            *slot = None;
            finish(world, sec, me);
        }
        None => log::warn!("finished platform was not in the active list"),
    }
}

/// Start platforms in every idle sector tagged `tag`.  Returns whether any
/// platform was started (or reactivated).
pub fn do_plat(world: &mut World, tag: i16, kind: PlatKind) -> Result<bool, SpecialsError> {
    let mut started = false;
    if kind == PlatKind::PerpetualRaise {
        started |= activate_in_stasis(world, tag);
    }

    let tagged: Vec<SectorId> = world.level.sectors_with_tag(tag).collect();
    for sec in tagged {
        if world.level.sectors[sec as usize].special_data.is_some() {
            continue;
        }
        let Some(free) = world.specials.active_plats.iter().position(Option::is_none) else {
            return Err(SpecialsError::NoPlatSlots);
        };
        started = true;

        let floor = world.level.sectors[sec as usize].floor_height;
        let low = world.level.lowest_floor_surrounding(sec).min(floor);
        let (speed, high, status) = match kind {
            PlatKind::DownWaitUpStay => (Fixed(PLATSPEED.raw() * 4), floor, PlatStatus::Down),
            PlatKind::PerpetualRaise => {
                let high = world.level.highest_floor_surrounding(sec).max(floor);
                let status = if world.rng.p_random() & 1 == 0 {
                    PlatStatus::Up
                } else {
                    PlatStatus::Down
                };
                (PLATSPEED, high, status)
            }
        };
        let plat = Plat {
            kind,
            sector: sec,
            speed,
            low,
            high,
            wait: 35 * PLATWAIT,
            count: 0,
            status,
            old_status: status,
            crush: false,
            tag,
        };
        let id = attach(world, sec, ThinkerKind::Plat(plat));
        world.specials.active_plats[free] = Some(id);
    }
    Ok(started)
}

fn tagged_plats(world: &World, tag: i16) -> Vec<ThinkerId> {
    world
        .specials
        .active_plats
        .iter()
        .flatten()
        .copied()
        .filter(|&id| matches!(world.thinkers.get(id), Some(ThinkerKind::Plat(p)) if p.tag == tag))
        .collect()
}

fn activate_in_stasis(world: &mut World, tag: i16) -> bool {
    let mut any = false;
    for id in tagged_plats(world, tag) {
        let Some(ThinkerKind::Plat(p)) = world.thinkers.get_mut(id) else {
            continue;
        };
        if p.status == PlatStatus::InStasis {
            p.status = p.old_status;
            any = true;
        }
    }
    any
}

/// Freeze every moving platform tagged `tag`.
pub fn stop_plat(world: &mut World, tag: i16) -> bool {
    let mut any = false;
    for id in tagged_plats(world, tag) {
        let Some(ThinkerKind::Plat(p)) = world.thinkers.get_mut(id) else {
            continue;
        };
        if p.status != PlatStatus::InStasis {
            p.old_status = p.status;
            p.status = PlatStatus::InStasis;
            any = true;
        }
    }
    any
}

/* ────────────────────────────── ceilings ────────────────────────────── */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeilingKind {
    LowerToFloor,
    RaiseToHighest,
    LowerAndCrush,
    CrushAndRaise,
    FastCrushAndRaise,
}

#[derive(Debug, Clone, Copy)]
pub struct Ceiling {
    pub kind: CeilingKind,
    pub sector: SectorId,
    pub bottom_height: Fixed,
    pub top_height: Fixed,
    pub speed: Fixed,
    pub crush: bool,
    /// 1 up, -1 down, 0 in stasis.
    pub direction: i32,
    pub old_direction: i32,
    pub tag: i16,
}

impl Ceiling {
    pub fn think(&mut self, world: &mut World, me: ThinkerId) {
        match self.direction {
            1 => {
                let res = move_plane(
                    world,
                    self.sector,
                    self.speed,
                    self.top_height,
                    false,
                    Plane::Ceiling,
                    1,
                );
                if res == MoveResult::PastDest {
                    match self.kind {
                        CeilingKind::RaiseToHighest => remove_ceiling(world, self.sector, me),
                        CeilingKind::CrushAndRaise | CeilingKind::FastCrushAndRaise => {
                            self.direction = -1
                        }
                        _ => {}
                    }
                }
            }
            -1 => {
                let res = move_plane(
                    world,
                    self.sector,
                    self.speed,
                    self.bottom_height,
                    self.crush,
                    Plane::Ceiling,
                    -1,
                );
                match res {
                    MoveResult::PastDest => match self.kind {
                        CeilingKind::CrushAndRaise => {
                            self.speed = CEILSPEED;
                            self.direction = 1;
                        }
                        CeilingKind::FastCrushAndRaise => self.direction = 1,
                        CeilingKind::LowerAndCrush | CeilingKind::LowerToFloor => {
                            remove_ceiling(world, self.sector, me)
                        }
                        CeilingKind::RaiseToHighest => {}
                    },
                    MoveResult::Crushed => {
                        if matches!(
                            self.kind,
                            CeilingKind::CrushAndRaise | CeilingKind::LowerAndCrush
                        ) {
                            self.speed = Fixed(CEILSPEED.raw() / 8);
                        }
                    }
                    MoveResult::Ok => {}
                }
            }
            _ => {}
        }
    }
}

fn remove_ceiling(world: &mut World, sec: SectorId, me: ThinkerId) {
    for slot in world.specials.active_ceilings.iter_mut() {
        if *slot == Some(me) {
            *slot = None;
        }
    }
    finish(world, sec, me);
}

fn tagged_ceilings(world: &World, tag: i16) -> Vec<ThinkerId> {
    world
        .specials
        .active_ceilings
        .iter()
        .flatten()
        .copied()
        .filter(|&id| matches!(world.thinkers.get(id), Some(ThinkerKind::Ceiling(c)) if c.tag == tag))
        .collect()
}

/// Start ceilings in every idle sector tagged `tag`.  Crushers first wake
/// any stopped crusher with the same tag.
pub fn do_ceiling(world: &mut World, tag: i16, kind: CeilingKind) -> bool {
    let mut started = false;
    if matches!(kind, CeilingKind::CrushAndRaise | CeilingKind::FastCrushAndRaise) {
        for id in tagged_ceilings(world, tag) {
            let Some(ThinkerKind::Ceiling(c)) = world.thinkers.get_mut(id) else {
                continue;
            };
            if c.direction == 0 {
                c.direction = c.old_direction;
                started = true;
            }
        }
    }

    let tagged: Vec<SectorId> = world.level.sectors_with_tag(tag).collect();
    for sec in tagged {
        let s = &world.level.sectors[sec as usize];
        if s.special_data.is_some() {
            continue;
        }
        started = true;
        let (floor, ceiling) = (s.floor_height, s.ceiling_height);
        let eight = Fixed::from_int(8);

        let mut c = Ceiling {
            kind,
            sector: sec,
            bottom_height: floor,
            top_height: ceiling,
            speed: CEILSPEED,
            crush: false,
            direction: -1,
            old_direction: -1,
            tag: s.tag,
        };
        match kind {
            CeilingKind::FastCrushAndRaise => {
                c.crush = true;
                c.bottom_height = floor + eight;
                c.speed = Fixed(CEILSPEED.raw() * 2);
            }
            CeilingKind::CrushAndRaise => {
                c.crush = true;
                c.bottom_height = floor + eight;
            }
            CeilingKind::LowerAndCrush => c.bottom_height = floor + eight,
            CeilingKind::LowerToFloor => {}
            CeilingKind::RaiseToHighest => {
                c.top_height = world.level.highest_ceiling_surrounding(sec);
                c.direction = 1;
            }
        }
        c.old_direction = c.direction;

        let id = attach(world, sec, ThinkerKind::Ceiling(c));
        match world.specials.active_ceilings.iter_mut().find(|s| s.is_none()) {
            Some(slot) => *slot = Some(id),
            None => log::debug!("ceiling in sector {sec} is untracked"),
        }
    }
    started
}

/// Put every moving crusher tagged `tag` in stasis.
pub fn crush_stop(world: &mut World, tag: i16) -> bool {
    let mut any = false;
    for id in tagged_ceilings(world, tag) {
        let Some(ThinkerKind::Ceiling(c)) = world.thinkers.get_mut(id) else {
            continue;
        };
        if c.direction != 0 {
            c.old_direction = c.direction;
            c.direction = 0;
            any = true;
        }
    }
    any
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Random, Specials, thinker};
    use crate::wad::{MapBuilder, WadBuilder, load_level};
    use crate::world::TextureBank;

    /// A 64×64 lift (sector 1, tag 7) inside a 256×256 room.
    fn lift_world() -> World {
        let mut m = MapBuilder::new("MAP01");
        let outer = m.sector(0, 192, 160);
        let lift = m.sector(64, 192, 160);
        m.sectors[lift as usize].tag = 7;
        let o = [(0, 0), (0, 256), (256, 256), (256, 0)].map(|(x, y)| m.vertex(x, y));
        let i = [(96, 96), (96, 160), (160, 160), (160, 96)].map(|(x, y)| m.vertex(x, y));
        for k in 0..4 {
            let s = m.side(outer, "STARTAN3");
            m.line(o[k], o[(k + 1) % 4], 1, s, -1);
        }
        for k in 0..4 {
            let front = m.side(outer, "-");
            let back = m.side(lift, "-");
            m.line(i[(k + 1) % 4], i[k], 4, front, back);
        }
        let wad = WadBuilder::new().map(&m).into_wad().expect("wad");
        let bank = TextureBank::from_names(&["STARTAN3"], &["FLOOR4_8", "CEIL3_5"]);
        let level = load_level(&wad, 0, &bank).expect("level");
        World::new(level, Random::new(), Specials::default())
    }

    fn floor(w: &World, sec: usize) -> i32 {
        w.level.sectors[sec].floor_height.to_int()
    }

    #[test]
    fn plane_reports_past_dest() {
        let mut w = lift_world();
        w.level.sectors[1].floor_height = Fixed::ZERO;
        let r = move_plane(&mut w, 1, Fixed::from_int(8), Fixed::from_int(20), false, Plane::Floor, 1);
        assert_eq!(r, MoveResult::Ok);
        assert_eq!(floor(&w, 1), 8);
        move_plane(&mut w, 1, Fixed::from_int(8), Fixed::from_int(20), false, Plane::Floor, 1);
        let r = move_plane(&mut w, 1, Fixed::from_int(8), Fixed::from_int(20), false, Plane::Floor, 1);
        assert_eq!(r, MoveResult::PastDest);
        assert_eq!(floor(&w, 1), 20);
    }

    #[test]
    fn lift_goes_down_waits_and_returns() {
        let mut w = lift_world();
        assert_eq!(do_plat(&mut w, 7, PlatKind::DownWaitUpStay), Ok(true));
        assert!(w.level.sectors[1].special_data.is_some());
        assert_eq!(w.specials.active_plats.iter().flatten().count(), 1);

        // 64 units at 4 per tic, then 105 tics of waiting
        for _ in 0..16 {
            thinker::run(&mut w);
        }
        assert_eq!(floor(&w, 1), 0);
        thinker::run(&mut w);
        assert_eq!(floor(&w, 1), 0);

        let mut tics = 0;
        while w.level.sectors[1].special_data.is_some() && tics < 400 {
            thinker::run(&mut w);
            tics += 1;
        }
        assert_eq!(floor(&w, 1), 64);
        assert!(w.specials.active_plats.iter().all(Option::is_none));
    }

    #[test]
    fn busy_sector_is_skipped() {
        let mut w = lift_world();
        assert_eq!(do_plat(&mut w, 7, PlatKind::PerpetualRaise), Ok(true));
        assert_eq!(do_plat(&mut w, 7, PlatKind::PerpetualRaise), Ok(false));
        assert_eq!(w.thinkers.len(), 1);
    }

    #[test]
    fn stopped_plat_resumes_on_perpetual_raise() {
        let mut w = lift_world();
        assert_eq!(do_plat(&mut w, 7, PlatKind::PerpetualRaise), Ok(true));

        // catch it between the outer floor (0) and its start height (64)
        let mut tics = 0;
        while !(0 < floor(&w, 1) && floor(&w, 1) < 64) && tics < 400 {
            thinker::run(&mut w);
            tics += 1;
        }
        let before = floor(&w, 1);
        assert!(0 < before && before < 64, "plat never left its stops");

        assert!(stop_plat(&mut w, 7));
        for _ in 0..5 {
            thinker::run(&mut w);
        }
        assert_eq!(floor(&w, 1), before);

        assert_eq!(do_plat(&mut w, 7, PlatKind::PerpetualRaise), Ok(true));
        let Some(ThinkerKind::Plat(p)) = w.thinkers.get(w.specials.active_plats[0].expect("slot")) else {
            panic!("plat thinker missing");
        };
        assert_ne!(p.status, PlatStatus::InStasis);
        thinker::run(&mut w);
        assert_ne!(floor(&w, 1), before);
    }

    #[test]
    fn plat_slots_run_out() {
        let mut w = lift_world();
        let ids: Vec<_> = (0..MAXPLATS)
            .map(|_| Some(w.thinkers.add(ThinkerKind::Custom(Box::new(Idle)))))
            .collect();
        w.specials.active_plats.copy_from_slice(&ids);
        assert_eq!(
            do_plat(&mut w, 7, PlatKind::DownWaitUpStay),
            Err(SpecialsError::NoPlatSlots)
        );
    }

    struct Idle;
    impl crate::sim::Think for Idle {
        fn think(&mut self, _: &mut World, _: ThinkerId) {}
    }

    #[test]
    fn ceiling_lowers_to_floor_and_finishes() {
        let mut w = lift_world();
        assert!(do_ceiling(&mut w, 7, CeilingKind::LowerToFloor));
        for _ in 0..128 {
            thinker::run(&mut w);
        }
        assert_eq!(w.level.sectors[1].ceiling_height, Fixed::from_int(64));
        thinker::run(&mut w);
        assert!(w.level.sectors[1].special_data.is_none());
        assert!(w.specials.active_ceilings.iter().all(Option::is_none));
    }

    #[test]
    fn crusher_stops_and_restarts() {
        let mut w = lift_world();
        assert!(do_ceiling(&mut w, 7, CeilingKind::CrushAndRaise));
        thinker::run(&mut w);
        let h = w.level.sectors[1].ceiling_height;
        assert!(crush_stop(&mut w, 7));
        assert!(!crush_stop(&mut w, 7));
        thinker::run(&mut w);
        assert_eq!(w.level.sectors[1].ceiling_height, h);
        assert!(do_ceiling(&mut w, 7, CeilingKind::CrushAndRaise));
        thinker::run(&mut w);
        assert_eq!(w.level.sectors[1].ceiling_height, h - CEILSPEED);
    }

    #[test]
    fn ceiling_crushes_shootable_object() {
        let mut w = lift_world();
        let imp = crate::defs::by_doomednum(3001).expect("imp");
        let e = mob::spawn_mobj(&mut w, Fixed::from_int(128), Fixed::from_int(128), Fixed::ZERO, imp);
        // no BSP: every point resolves to sub-sector 0, so put the imp's
        // sector ceiling right on top of it
        w.level.sectors[0].ceiling_height = Fixed::from_int(56);
        w.level.sectors[0].tag = 9;
        assert!(do_ceiling(&mut w, 9, CeilingKind::CrushAndRaise));
        let before = w.ecs.get::<&Health>(e).expect("health").0;
        for _ in 0..8 {
            thinker::run(&mut w);
        }
        assert!(w.ecs.get::<&Health>(e).expect("health").0 < before);
    }
}
