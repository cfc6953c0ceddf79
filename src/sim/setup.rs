//! Populating a freshly loaded level: map things, player bodies and
//! respawns.

use hecs::Entity;
use thiserror::Error;

use super::components::{ActorFlags, Angle, Health, Pilot, SpawnSpot, Tics};
use super::mob::{self, ONCEILINGZ, ONFLOORZ};
use super::options::{GameMode, Skill};
use super::player::{MAXPLAYERS, NUMCARDS, Player, PlayerState, VIEWHEIGHT};
use super::world::{BODYQUESIZE, MAX_DEATHMATCH_STARTS, World};
use crate::defs::{MobjFlags, by_doomednum, by_id, player_info};
use crate::world::{Bam, Fixed, Thing, ThingOptions};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpawnError {
    #[error("unknown thing type {doomednum} at ({x}, {y})")]
    UnknownThing { doomednum: i16, x: i16, y: i16 },

    #[error("only {0} deathmatch spots, 4 required")]
    TooFewDeathmatchStarts(usize),
}

/// Session switches that decide which map things appear.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpawnRules {
    pub mode: GameMode,
    pub skill: Skill,
    pub deathmatch: u8,
    pub netgame: bool,
    pub no_monsters: bool,
    pub in_game: [bool; MAXPLAYERS],
}

/// Things only the commercial game has; older games stop reading the
/// thing list at the first one.
const COMMERCIAL_ONLY: [i16; 10] = [68, 64, 88, 89, 69, 67, 71, 65, 66, 84];

/// Spawn every map thing, then the deathmatch bodies.
pub fn populate(
    world: &mut World,
    players: &mut [Player; MAXPLAYERS],
    rules: &SpawnRules,
) -> Result<(), SpawnError> {
    let things = world.level.things.clone();
    for thing in &things {
        if rules.mode != GameMode::Commercial && COMMERCIAL_ONLY.contains(&thing.doomednum) {
            log::warn!(
                "thing type {} belongs to the commercial game, remaining things skipped",
                thing.doomednum
            );
            break;
        }
        spawn_map_thing(world, players, rules, thing)?;
    }

    if rules.deathmatch != 0 {
        for slot in (0..MAXPLAYERS).filter(|&i| rules.in_game[i]) {
            players[slot].mo = None;
            deathmatch_spawn(world, players, rules, slot)?;
        }
    }
    log::info!(
        "level populated: {} objects, {} kills, {} items",
        world.ecs.len(),
        world.totals.kills,
        world.totals.items
    );
    Ok(())
}

pub fn spawn_map_thing(
    world: &mut World,
    players: &mut [Player; MAXPLAYERS],
    rules: &SpawnRules,
    thing: &Thing,
) -> Result<(), SpawnError> {
    match thing.doomednum {
        11 => {
            if world.deathmatch_starts.len() < MAX_DEATHMATCH_STARTS {
                world.deathmatch_starts.push(*thing);
            }
            return Ok(());
        }
        n @ 1..=4 => {
            let slot = n as usize - 1;
            world.player_starts[slot] = Some(*thing);
            if rules.deathmatch == 0 && rules.in_game[slot] {
                spawn_player(world, &mut players[slot], slot, thing, false);
            }
            return Ok(());
        }
        n if n <= 0 => {
            log::debug!("thing of type {n} ignored");
            return Ok(());
        }
        _ => {}
    }

    if !rules.netgame && thing.options.contains(ThingOptions::NOT_SINGLE) {
        return Ok(());
    }
    if thing.options.bits() & rules.skill.thing_bit() == 0 {
        return Ok(());
    }

    let info = by_doomednum(thing.doomednum).ok_or(SpawnError::UnknownThing {
        doomednum: thing.doomednum,
        x: thing.x,
        y: thing.y,
    })?;
    if rules.deathmatch != 0 && info.flags.contains(MobjFlags::NOTDMATCH) {
        return Ok(());
    }
    if rules.no_monsters && info.is_monster() {
        return Ok(());
    }

    let z = if info.flags.contains(MobjFlags::SPAWNCEILING) {
        ONCEILINGZ
    } else {
        ONFLOORZ
    };
    let e = mob::spawn_mobj(
        world,
        Fixed::from_int(thing.x as i32),
        Fixed::from_int(thing.y as i32),
        z,
        info,
    );

    if info.spawn_tics > 0 {
        let tics = 1 + world.rng.p_random() % info.spawn_tics;
        if let Ok(mut t) = world.ecs.get::<&mut Tics>(e) {
            *t = Tics(tics);
        }
    }
    if info.flags.contains(MobjFlags::COUNTKILL) {
        world.totals.kills += 1;
    }
    if info.flags.contains(MobjFlags::COUNTITEM) {
        world.totals.items += 1;
    }
    if let Ok((angle, flags)) = world.ecs.query_one_mut::<(&mut Angle, &mut ActorFlags)>(e) {
        angle.0 = Bam::from_degrees_snapped(thing.angle);
        if thing.options.contains(ThingOptions::AMBUSH) {
            flags.0.insert(MobjFlags::AMBUSH);
        }
    }
    let _ = world.ecs.insert_one(e, SpawnSpot(*thing));
    Ok(())
}

/// Give player `slot` a body at `spot`.
pub fn spawn_player(
    world: &mut World,
    player: &mut Player,
    slot: usize,
    spot: &Thing,
    deathmatch: bool,
) -> Entity {
    if player.state == PlayerState::Reborn {
        player.reborn();
    }

    let e = mob::spawn_mobj(
        world,
        Fixed::from_int(spot.x as i32),
        Fixed::from_int(spot.y as i32),
        ONFLOORZ,
        player_info(),
    );
    if let Ok((angle, flags, health)) = world
        .ecs
        .query_one_mut::<(&mut Angle, &mut ActorFlags, &mut Health)>(e)
    {
        angle.0 = Bam::from_degrees_snapped(spot.angle);
        // player 1 keeps the green palette
        flags.0 = flags.0.with_translation(slot);
        health.0 = player.health;
    }
    let _ = world.ecs.insert(
        e,
        (
            Pilot {
                player: slot,
                moving: false,
            },
            SpawnSpot(*spot),
        ),
    );

    player.mo = Some(e);
    player.state = PlayerState::Live;
    player.damage_count = 0;
    player.bonus_count = 0;
    player.view_height = VIEWHEIGHT;
    if deathmatch {
        player.cards = [true; NUMCARDS];
    }
    e
}

/// Whether player `slot` may spawn at `spot`.  A body left from a previous
/// life goes to the corpse queue and a teleport fog marks the spot.
pub fn check_spot(
    world: &mut World,
    players: &[Player; MAXPLAYERS],
    slot: usize,
    spot: &Thing,
) -> bool {
    let x = Fixed::from_int(spot.x as i32);
    let y = Fixed::from_int(spot.y as i32);

    let Some(body) = players[slot].mo else {
        // first spawn of the level: only avoid other fresh players
        return players[..slot].iter().all(|p| {
            let Some(mo) = p.mo else {
                return true;
            };
            world
                .ecs
                .get::<&super::Position>(mo)
                .map_or(true, |pos| pos.x != x || pos.y != y)
        });
    };
    if !mob::position_clear(world, body, x, y) {
        return false;
    }

    let slot_in_queue = world.body_queue_slot % BODYQUESIZE;
    if world.body_queue_slot >= BODYQUESIZE {
        if let Some(old) = world.body_queue[slot_in_queue].take() {
            if world.ecs.contains(old) {
                mob::remove_mobj(world, old);
            }
        }
    }
    world.body_queue[slot_in_queue] = Some(body);
    world.body_queue_slot += 1;

    let ss = world.level.point_in_subsector(x, y);
    let floor = mob::planes(&world.level, ss).0;
    let an = Bam::from_degrees_snapped(spot.angle);
    let twenty = Fixed::from_int(20);
    if let Some(fog) = by_id("MT_TFOG") {
        mob::spawn_mobj(world, x + twenty * an.cos(), y + twenty * an.sin(), floor, fog);
    }
    true
}

/// Pick a random deathmatch start for `slot`; after 20 failed tries the
/// player's own start is used even if occupied.
pub fn deathmatch_spawn(
    world: &mut World,
    players: &mut [Player; MAXPLAYERS],
    rules: &SpawnRules,
    slot: usize,
) -> Result<(), SpawnError> {
    let selections = world.deathmatch_starts.len();
    if selections < 4 {
        return Err(SpawnError::TooFewDeathmatchStarts(selections));
    }
    for _ in 0..20 {
        let i = world.rng.p_random() as usize % selections;
        let mut spot = world.deathmatch_starts[i];
        if check_spot(world, players, slot, &spot) {
            spot.doomednum = slot as i16 + 1;
            world.deathmatch_starts[i] = spot;
            spawn_player(world, &mut players[slot], slot, &spot, rules.deathmatch != 0);
            return Ok(());
        }
    }

    log::debug!("no free deathmatch spot for player {slot}, using own start");
    match world.player_starts[slot] {
        Some(spot) => {
            spawn_player(world, &mut players[slot], slot, &spot, rules.deathmatch != 0);
        }
        None => log::warn!("player {slot} has no start spot"),
    }
    Ok(())
}

/// Respawn a dead player inside a running multiplayer level.  Single
/// player games reload the level instead, which the caller handles.
pub fn respawn(
    world: &mut World,
    players: &mut [Player; MAXPLAYERS],
    rules: &SpawnRules,
    slot: usize,
) -> Result<(), SpawnError> {
    // the corpse stays behind
    if let Some(mo) = players[slot].mo {
        let _ = world.ecs.remove_one::<Pilot>(mo);
    }

    if rules.deathmatch != 0 {
        return deathmatch_spawn(world, players, rules, slot);
    }

    if let Some(own) = world.player_starts[slot] {
        if check_spot(world, players, slot, &own) {
            spawn_player(world, &mut players[slot], slot, &own, false);
            return Ok(());
        }
    }
    for other in 0..MAXPLAYERS {
        let Some(spot) = world.player_starts[other] else {
            continue;
        };
        if check_spot(world, players, slot, &spot) {
            spawn_player(world, &mut players[slot], slot, &spot, false);
            return Ok(());
        }
    }
    match world.player_starts[slot] {
        Some(own) => {
            spawn_player(world, &mut players[slot], slot, &own, false);
        }
        None => log::warn!("player {slot} has no start spot"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Random, Specials};
    use crate::wad::{MapBuilder, WadBuilder, load_level};
    use crate::world::TextureBank;

    fn world_from(map: &MapBuilder) -> World {
        let wad = WadBuilder::new().map(map).into_wad().expect("wad");
        let level = load_level(&wad, 0, &TextureBank::new()).expect("level");
        World::new(level, Random::new(), Specials::default())
    }

    fn single() -> SpawnRules {
        SpawnRules {
            in_game: [true, false, false, false],
            ..SpawnRules::default()
        }
    }

    fn fresh_players() -> [Player; MAXPLAYERS] {
        std::array::from_fn(|_| {
            let mut p = Player::default();
            p.reborn();
            p
        })
    }

    #[test]
    fn player_start_spawns_body() {
        let mut w = world_from(&MapBuilder::room("E1M1", 0, 0, 256, 256));
        let mut players = fresh_players();
        populate(&mut w, &mut players, &single()).expect("populate");
        let mo = players[0].mo.expect("body");
        assert_eq!(w.ecs.get::<&Angle>(mo).expect("angle").0, Bam::ANG90);
        assert_eq!(w.ecs.get::<&Pilot>(mo).expect("pilot").player, 0);
        assert_eq!(players[0].view_height, VIEWHEIGHT);
        assert!(w.player_starts[0].is_some());
        assert!(players[1].mo.is_none());
    }

    #[test]
    fn skill_and_multiplayer_filters() {
        let mut m = MapBuilder::room("E1M1", 0, 0, 512, 512);
        m.thing(64, 64, 0, 3001, 0x04); // hard only
        m.thing(96, 64, 0, 3001, 0x02 | 0x10); // multiplayer only
        m.thing(128, 64, 0, 2014, 0x07); // health bonus
        m.thing(160, 64, 0, 3001, 0x07);
        let mut w = world_from(&m);
        let mut players = fresh_players();
        populate(&mut w, &mut players, &single()).expect("populate");
        assert_eq!(w.totals.kills, 1);
        assert_eq!(w.totals.items, 1);
        assert_eq!(w.ecs.len(), 3);

        let mut w = world_from(&m);
        let rules = SpawnRules {
            no_monsters: true,
            ..single()
        };
        populate(&mut w, &mut fresh_players(), &rules).expect("populate");
        assert_eq!(w.totals.kills, 0);
    }

    #[test]
    fn unknown_thing_is_fatal() {
        let mut m = MapBuilder::room("E1M1", 0, 0, 256, 256);
        m.thing(10, 20, 0, 4242, 7);
        let mut w = world_from(&m);
        assert_eq!(
            populate(&mut w, &mut fresh_players(), &single()),
            Err(SpawnError::UnknownThing {
                doomednum: 4242,
                x: 10,
                y: 20
            })
        );
    }

    #[test]
    fn commercial_things_end_the_list_in_older_games() {
        let mut m = MapBuilder::room("E1M1", 0, 0, 256, 256);
        m.thing(64, 64, 0, 84, 7); // wolfenstein ss
        m.thing(96, 96, 0, 2014, 7);
        let mut w = world_from(&m);
        populate(&mut w, &mut fresh_players(), &single()).expect("populate");
        assert_eq!(w.totals.items, 0);
    }

    #[test]
    fn deathmatch_needs_four_starts() {
        let mut m = MapBuilder::room("E1M1", 0, 0, 512, 512);
        for i in 0..3 {
            m.thing(64 + 100 * i, 64, 0, 11, 7);
        }
        let mut w = world_from(&m);
        let rules = SpawnRules {
            deathmatch: 1,
            netgame: true,
            ..single()
        };
        let mut players = fresh_players();
        assert_eq!(
            populate(&mut w, &mut players, &rules),
            Err(SpawnError::TooFewDeathmatchStarts(3))
        );
        assert!(players[0].mo.is_none());
        assert!(w.ecs.is_empty());
    }

    #[test]
    fn deathmatch_spawn_uses_a_start() {
        let mut m = MapBuilder::room("E1M1", 0, 0, 512, 512);
        for i in 0..4 {
            m.thing(64 + 100 * i, 64, 0, 11, 7);
        }
        let mut w = world_from(&m);
        let rules = SpawnRules {
            deathmatch: 1,
            netgame: true,
            ..single()
        };
        let mut players = fresh_players();
        populate(&mut w, &mut players, &rules).expect("populate");
        let mo = players[0].mo.expect("body");
        let pos = *w.ecs.get::<&super::super::Position>(mo).expect("pos");
        assert_eq!(pos.y, Fixed::from_int(64));
        assert!(players[0].cards.iter().all(|&c| c));
        assert_eq!(w.deathmatch_starts.len(), 4);
    }

    #[test]
    fn netgame_respawn_leaves_corpse() {
        let mut w = world_from(&MapBuilder::room("E1M1", 0, 0, 256, 256));
        let rules = SpawnRules {
            netgame: true,
            ..single()
        };
        let mut players = fresh_players();
        populate(&mut w, &mut players, &rules).expect("populate");
        let old = players[0].mo.expect("body");
        players[0].state = PlayerState::Reborn;
        respawn(&mut w, &mut players, &rules, 0).expect("respawn");
        let new = players[0].mo.expect("body");
        assert_ne!(old, new);
        assert!(w.ecs.contains(old));
        assert!(w.ecs.get::<&Pilot>(old).is_err());
        assert_eq!(w.body_queue[0], Some(old));
        assert_eq!(players[0].state, PlayerState::Live);
    }
}
