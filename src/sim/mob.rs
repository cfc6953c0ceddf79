//! Map object spawning, blockmap linking and the per-object thinker.

use hecs::Entity;

use super::components::{
    ActorFlags, Angle, BlockCell, Bounds, Class, Health, LastLook, Momentum, MobjThinker, Pilot,
    Position, Subsector, Tics,
};
use super::player::MAXPLAYERS;
use super::thinker::{ThinkerId, ThinkerKind};
use super::world::World;
use crate::defs::{MobjFlags, MobjInfo};
use crate::world::{Bam, FRACUNIT, Fixed, Level, MAXRADIUS, MAPBLOCKSHIFT, SubsectorId};

/// Spawn height sentinels.
pub const ONFLOORZ: Fixed = Fixed::MIN;
pub const ONCEILINGZ: Fixed = Fixed::MAX;

pub const GRAVITY: Fixed = Fixed(FRACUNIT);
pub const FRICTION: Fixed = Fixed(0xE800);
pub const STOPSPEED: Fixed = Fixed(0x1000);
pub const MAXMOVE: Fixed = Fixed::from_int(30);

/// Floor and ceiling of the sector owning `ss`.
pub(crate) fn planes(level: &Level, ss: SubsectorId) -> (Fixed, Fixed) {
    level
        .subsectors
        .get(ss as usize)
        .and_then(|s| level.sectors.get(s.sector as usize))
        .map_or((Fixed::ZERO, Fixed::ZERO), |s| {
            (s.floor_height, s.ceiling_height)
        })
}

/// Create a map object of class `info` and register its thinker.
///
/// Consumes one play-random byte, like every classic spawn.
pub fn spawn_mobj(world: &mut World, x: Fixed, y: Fixed, z: Fixed, info: &'static MobjInfo) -> Entity {
    let last_look = world.rng.p_random() % MAXPLAYERS as i32;
    let ss = world.level.point_in_subsector(x, y);
    let (floor_z, ceiling_z) = planes(&world.level, ss);
    let height = Fixed::from_int(info.height);

    let z = if z == ONFLOORZ {
        floor_z
    } else if z == ONCEILINGZ {
        ceiling_z - height
    } else {
        z
    };

    let e = world.ecs.spawn((
        Position { x, y, z },
        Momentum::default(),
        Angle(Bam(0)),
        Subsector(ss),
        Class(info),
        ActorFlags(info.flags),
        Bounds {
            radius: Fixed::from_int(info.radius),
            height,
            floor_z,
            ceiling_z,
        },
        Health(info.spawn_health),
        Tics(info.spawn_tics),
        BlockCell(None),
        LastLook(last_look),
    ));
    link(world, e, x, y);

    let id = world.thinkers.add(ThinkerKind::Mobj(e));
    let _ = world.ecs.insert_one(e, MobjThinker(id));
    e
}

/// Remove an object from the world and condemn its thinker.
pub fn remove_mobj(world: &mut World, e: Entity) {
    unlink(world, e);
    if let Ok(t) = world.ecs.get::<&MobjThinker>(e).map(|t| t.0) {
        world.thinkers.remove(t);
    }
    let _ = world.ecs.despawn(e);
}

/* ─────────────────────────── blockmap links ─────────────────────────── */

fn link(world: &mut World, e: Entity, x: Fixed, y: Fixed) {
    let Ok(flags) = world.ecs.get::<&ActorFlags>(e).map(|f| f.0) else {
        return;
    };
    if flags.contains(MobjFlags::NOBLOCKMAP) {
        return;
    }
    let cell = world.level.blockmap.cell_at(x, y);
    if let Some(cell) = cell {
        world.level.blockmap.link(cell, e);
    }
    if let Ok(mut bc) = world.ecs.get::<&mut BlockCell>(e) {
        bc.0 = cell;
    }
}

fn unlink(world: &mut World, e: Entity) {
    let Ok(cell) = world.ecs.get::<&mut BlockCell>(e).map(|mut c| c.0.take()) else {
        return;
    };
    if let Some(cell) = cell {
        world.level.blockmap.unlink(cell, e);
    }
}

/// Move `e` to `(x, y)`: relink, refresh sub-sector and plane heights.
pub fn set_position(world: &mut World, e: Entity, x: Fixed, y: Fixed) {
    unlink(world, e);
    let ss = world.level.point_in_subsector(x, y);
    let (floor_z, ceiling_z) = planes(&world.level, ss);
    if let Ok((pos, sub, b)) = world
        .ecs
        .query_one_mut::<(&mut Position, &mut Subsector, &mut Bounds)>(e)
    {
        pos.x = x;
        pos.y = y;
        sub.0 = ss;
        b.floor_z = floor_z;
        b.ceiling_z = ceiling_z;
    }
    link(world, e, x, y);
}

/// Objects linked into the cells a box of half-size `radius + MAXRADIUS`
/// around `(x, y)` touches.
pub fn objects_near(world: &World, x: Fixed, y: Fixed, radius: Fixed) -> Vec<Entity> {
    let bm = &world.level.blockmap;
    let reach = radius + MAXRADIUS;
    let xl = (x - reach - bm.origin_x).raw() >> MAPBLOCKSHIFT;
    let xh = (x + reach - bm.origin_x).raw() >> MAPBLOCKSHIFT;
    let yl = (y - reach - bm.origin_y).raw() >> MAPBLOCKSHIFT;
    let yh = (y + reach - bm.origin_y).raw() >> MAPBLOCKSHIFT;

    let mut out = Vec::new();
    for by in yl..=yh {
        for bx in xl..=xh {
            if let Some(cell) = bm.cell(bx, by) {
                out.extend_from_slice(bm.objects(cell));
            }
        }
    }
    out
}

/// True if no other solid object overlaps `mover` placed at `(x, y)`.
/// Wall clipping belongs to the movement scripts and is not checked.
pub fn position_clear(world: &World, mover: Entity, x: Fixed, y: Fixed) -> bool {
    let radius = world
        .ecs
        .get::<&Bounds>(mover)
        .map_or(Fixed::ZERO, |b| b.radius);

    objects_near(world, x, y, radius).into_iter().all(|other| {
        if other == mover {
            return true;
        }
        let Ok(mut q) = world.ecs.query_one::<(&Position, &Bounds, &ActorFlags)>(other) else {
            return true;
        };
        let Some((p, b, f)) = q.get() else {
            return true;
        };
        if !f.0.contains(MobjFlags::SOLID) {
            return true;
        }
        let block = b.radius + radius;
        (p.x - x).abs() >= block || (p.y - y).abs() >= block
    })
}

/// Re-read plane heights after a sector moved.  Returns whether the object
/// still fits between floor and ceiling.
pub(crate) fn height_clip(world: &mut World, e: Entity) -> bool {
    let Ok(ss) = world.ecs.get::<&Subsector>(e).map(|s| s.0) else {
        return true;
    };
    let (floor, ceiling) = planes(&world.level, ss);
    let Ok((pos, b)) = world.ecs.query_one_mut::<(&mut Position, &mut Bounds)>(e) else {
        return true;
    };
    let on_floor = pos.z == b.floor_z;
    b.floor_z = floor;
    b.ceiling_z = ceiling;
    if on_floor {
        pos.z = floor;
    } else if pos.z + b.height > ceiling {
        pos.z = ceiling - b.height;
    }
    ceiling - floor >= b.height
}

/// Subtract `amount` health from a shootable object.  Reaching zero turns
/// it into a corpse; otherwise the pain roll is consumed (the pain state
/// itself belongs to the actor script).
pub fn damage_mobj(world: &mut World, e: Entity, amount: i32) {
    let Ok((health, flags, b, class, pilot)) = world.ecs.query_one_mut::<(
        &mut Health,
        &mut ActorFlags,
        &mut Bounds,
        &Class,
        Option<&Pilot>,
    )>(e) else {
        return;
    };
    if !flags.0.contains(MobjFlags::SHOOTABLE) || health.0 <= 0 {
        return;
    }

    health.0 -= amount;
    if health.0 > 0 {
        world.rng.p_random();
        return;
    }

    flags.0.remove(MobjFlags::SHOOTABLE | MobjFlags::FLOAT | MobjFlags::SKULLFLY);
    if class.0.id != "MT_SKULL" {
        flags.0.remove(MobjFlags::NOGRAVITY);
    }
    flags.0.insert(MobjFlags::CORPSE | MobjFlags::DROPOFF);
    if pilot.is_some() {
        flags.0.remove(MobjFlags::SOLID);
    }
    b.height = Fixed(b.height.raw() >> 2);
}

/* ─────────────────────────── mobj thinker ───────────────────────────── */

pub(crate) fn mobj_think(world: &mut World, e: Entity, me: ThinkerId) {
    let Ok((mom, flags)) = world
        .ecs
        .query_one_mut::<(&Momentum, &ActorFlags)>(e)
        .map(|(m, f)| (*m, f.0))
    else {
        world.thinkers.remove(me);
        return;
    };

    if !mom.x.is_zero() || !mom.y.is_zero() || flags.contains(MobjFlags::SKULLFLY) {
        xy_movement(world, e);
    }

    let airborne = world
        .ecs
        .query_one_mut::<(&Position, &Bounds, &Momentum)>(e)
        .map(|(p, b, m)| p.z != b.floor_z || !m.z.is_zero())
        .unwrap_or(false);
    if airborne {
        z_movement(world, e);
    }

    let expired = match world.ecs.get::<&mut Tics>(e) {
        Ok(mut t) if t.0 != -1 => {
            t.0 -= 1;
            t.0 == 0
        }
        _ => false,
    };
    if expired {
        world.state_expired(e, me);
    }
}

fn xy_movement(world: &mut World, e: Entity) {
    let Ok((pos, mom, flags, b, pilot)) = world.ecs.query_one_mut::<(
        &Position,
        &mut Momentum,
        &ActorFlags,
        &Bounds,
        Option<&Pilot>,
    )>(e) else {
        return;
    };

    mom.x = mom.x.clamp(-MAXMOVE, MAXMOVE);
    mom.y = mom.y.clamp(-MAXMOVE, MAXMOVE);
    let (nx, ny) = (pos.x + mom.x, pos.y + mom.y);

    let sliding = !flags.0.intersects(MobjFlags::MISSILE | MobjFlags::SKULLFLY);
    if sliding && pos.z <= b.floor_z {
        let moving = pilot.is_some_and(|p| p.moving);
        let slow = mom.x > -STOPSPEED
            && mom.x < STOPSPEED
            && mom.y > -STOPSPEED
            && mom.y < STOPSPEED;
        if slow && !moving {
            mom.zero_xy();
        } else {
            mom.x = mom.x * FRICTION;
            mom.y = mom.y * FRICTION;
        }
    }

    set_position(world, e, nx, ny);
}

fn z_movement(world: &mut World, e: Entity) {
    let Ok((pos, mom, flags, b)) = world
        .ecs
        .query_one_mut::<(&mut Position, &mut Momentum, &ActorFlags, &Bounds)>(e)
    else {
        return;
    };

    pos.z += mom.z;

    if pos.z <= b.floor_z {
        if mom.z < Fixed::ZERO {
            mom.z = Fixed::ZERO;
        }
        pos.z = b.floor_z;
    } else if !flags.0.contains(MobjFlags::NOGRAVITY) {
        if mom.z.is_zero() {
            mom.z = -(GRAVITY + GRAVITY);
        } else {
            mom.z -= GRAVITY;
        }
    }

    if pos.z + b.height > b.ceiling_z {
        if mom.z > Fixed::ZERO {
            mom.z = Fixed::ZERO;
        }
        pos.z = b.ceiling_z - b.height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::by_doomednum;
    use crate::sim::{Random, Specials};
    use crate::wad::{MapBuilder, WadBuilder, load_level};
    use crate::world::TextureBank;

    fn room_world() -> World {
        let m = MapBuilder::room("E1M1", 0, 0, 256, 256);
        let wad = WadBuilder::new().map(&m).into_wad().expect("wad");
        let level = load_level(&wad, 0, &TextureBank::new()).expect("level");
        World::new(level, Random::new(), Specials::default())
    }

    fn at(units: i32) -> Fixed {
        Fixed::from_int(units)
    }

    #[test]
    fn spawn_links_and_registers_thinker() {
        let mut w = room_world();
        let imp = by_doomednum(3001).expect("imp");
        let e = spawn_mobj(&mut w, at(64), at(64), ONFLOORZ, imp);

        assert_eq!(w.rng.play_index(), 1);
        assert_eq!(w.thinkers.len(), 1);
        let cell = w.ecs.get::<&BlockCell>(e).map(|c| c.0).expect("cell");
        assert_eq!(cell, w.level.blockmap.cell_at(at(64), at(64)));
        assert_eq!(w.level.blockmap.objects(cell.expect("in grid")), &[e]);
        let b = *w.ecs.get::<&Bounds>(e).expect("bounds");
        assert_eq!(b.ceiling_z, at(128));
    }

    #[test]
    fn ceiling_spawn_hangs_from_ceiling() {
        let mut w = room_world();
        let keen = by_doomednum(72).expect("keen");
        let e = spawn_mobj(&mut w, at(64), at(64), ONCEILINGZ, keen);
        assert_eq!(w.ecs.get::<&Position>(e).expect("pos").z, at(128 - 72));
    }

    #[test]
    fn friction_then_stop() {
        let mut w = room_world();
        let imp = by_doomednum(3001).expect("imp");
        let e = spawn_mobj(&mut w, at(64), at(64), ONFLOORZ, imp);
        w.ecs.get::<&mut Momentum>(e).expect("mom").x = at(2);

        crate::sim::thinker::run(&mut w);
        let pos = *w.ecs.get::<&Position>(e).expect("pos");
        assert_eq!(pos.x, at(66));
        assert_eq!(w.ecs.get::<&Momentum>(e).expect("mom").x, at(2) * FRICTION);

        w.ecs.get::<&mut Momentum>(e).expect("mom").x = Fixed(STOPSPEED.raw() - 1);
        crate::sim::thinker::run(&mut w);
        assert!(w.ecs.get::<&Momentum>(e).expect("mom").x.is_zero());
    }

    #[test]
    fn falls_under_gravity_and_lands() {
        let mut w = room_world();
        let imp = by_doomednum(3001).expect("imp");
        let e = spawn_mobj(&mut w, at(64), at(64), at(4), imp);

        crate::sim::thinker::run(&mut w);
        let m = *w.ecs.get::<&Momentum>(e).expect("mom");
        assert_eq!(m.z, at(-2));

        crate::sim::thinker::run(&mut w);
        crate::sim::thinker::run(&mut w);
        assert_eq!(w.ecs.get::<&Position>(e).expect("pos").z, Fixed::ZERO);
        assert!(w.ecs.get::<&Momentum>(e).expect("mom").z.is_zero());
    }

    #[test]
    fn state_timer_expires_without_script() {
        let mut w = room_world();
        let barrel = by_doomednum(2035).expect("barrel");
        let e = spawn_mobj(&mut w, at(64), at(64), ONFLOORZ, barrel);
        for _ in 0..6 {
            crate::sim::thinker::run(&mut w);
        }
        assert_eq!(*w.ecs.get::<&Tics>(e).expect("tics"), Tics(-1));
    }

    #[test]
    fn removal_unlinks_and_condemns() {
        let mut w = room_world();
        let imp = by_doomednum(3001).expect("imp");
        let e = spawn_mobj(&mut w, at(64), at(64), ONFLOORZ, imp);
        let cell = w.level.blockmap.cell_at(at(64), at(64)).expect("cell");
        remove_mobj(&mut w, e);
        assert!(w.level.blockmap.objects(cell).is_empty());
        assert!(!w.ecs.contains(e));
        crate::sim::thinker::run(&mut w);
        assert!(w.thinkers.is_empty());
    }

    #[test]
    fn overlap_check_sees_solid_neighbours() {
        let mut w = room_world();
        let imp = by_doomednum(3001).expect("imp");
        let a = spawn_mobj(&mut w, at(64), at(64), ONFLOORZ, imp);
        let b = spawn_mobj(&mut w, at(200), at(200), ONFLOORZ, imp);
        assert!(!position_clear(&w, b, at(80), at(64)));
        assert!(position_clear(&w, b, at(120), at(64)));
        assert!(position_clear(&w, a, at(64), at(64)));
    }
}
