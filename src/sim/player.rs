//! Per-player state that survives level loads, and the player's own
//! per-tic think.

use hecs::Entity;

use super::components::{ActorFlags, Angle, Bounds, Buttons, Health, Momentum, Pilot, Position, Subsector, TicCmd};
use super::mob::damage_mobj;
use super::options::{GameMode, Skill};
use super::world::{LevelExit, World};
use crate::defs::MobjFlags;
use crate::world::{ANGLETOFINESHIFT, Bam, FINEANGLES, FRACUNIT, Fixed};

pub const MAXPLAYERS: usize = 4;
pub const MAXHEALTH: i32 = 100;
pub const VIEWHEIGHT: Fixed = Fixed::from_int(41);
/// 16 pixels of bob
pub const MAXBOB: Fixed = Fixed(0x10_0000);

pub const NUMWEAPONS: usize = 9;
pub const NUMAMMO: usize = 4;
pub const NUMPOWERS: usize = 6;
pub const NUMCARDS: usize = 6;

/// Clip, shell, cell, missile.
pub const MAX_AMMO: [i32; NUMAMMO] = [200, 50, 300, 50];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlayerState {
    #[default]
    Live,
    Dead,
    /// Waiting to be respawned at the start of the next tic.
    Reborn,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Weapon {
    Fist,
    #[default]
    Pistol,
    Shotgun,
    Chaingun,
    Missile,
    Plasma,
    Bfg,
    Chainsaw,
    SuperShotgun,
}

impl Weapon {
    pub const ALL: [Weapon; NUMWEAPONS] = [
        Weapon::Fist,
        Weapon::Pistol,
        Weapon::Shotgun,
        Weapon::Chaingun,
        Weapon::Missile,
        Weapon::Plasma,
        Weapon::Bfg,
        Weapon::Chainsaw,
        Weapon::SuperShotgun,
    ];

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Power {
    Invulnerability,
    Strength,
    Invisibility,
    IronFeet,
    AllMap,
    Infrared,
}

#[derive(Debug, Clone, Default)]
pub struct Player {
    pub mo: Option<Entity>,
    pub state: PlayerState,
    pub cmd: TicCmd,

    pub view_z: Fixed,
    pub view_height: Fixed,
    pub delta_view_height: Fixed,
    pub bob: Fixed,

    pub health: i32,
    pub armor_points: i32,
    /// 0 none, 1 green, 2 blue
    pub armor_type: i32,
    pub powers: [i32; NUMPOWERS],
    pub cards: [bool; NUMCARDS],
    pub backpack: bool,
    pub frags: [i32; MAXPLAYERS],

    pub ready_weapon: Weapon,
    pub pending_weapon: Option<Weapon>,
    pub weapon_owned: [bool; NUMWEAPONS],
    pub ammo: [i32; NUMAMMO],
    pub max_ammo: [i32; NUMAMMO],

    /// true while the button is held, so holding it fires once
    pub attack_down: bool,
    pub use_down: bool,
    /// bumped on every fresh USE press
    pub use_presses: u32,

    pub kill_count: i32,
    pub item_count: i32,
    pub secret_count: i32,
    pub damage_count: i32,
    pub bonus_count: i32,
    pub did_secret: bool,
}

impl Player {
    /// Fresh inventory for a new life.  Frags and level counters survive.
    pub fn reborn(&mut self) {
        let frags = self.frags;
        let (kills, items, secrets) = (self.kill_count, self.item_count, self.secret_count);

        *self = Player {
            frags,
            kill_count: kills,
            item_count: items,
            secret_count: secrets,
            // nothing fires on the first tic of a new life
            use_down: true,
            attack_down: true,
            state: PlayerState::Live,
            health: MAXHEALTH,
            ready_weapon: Weapon::Pistol,
            pending_weapon: Some(Weapon::Pistol),
            max_ammo: MAX_AMMO,
            ..Player::default()
        };
        self.weapon_owned[Weapon::Fist as usize] = true;
        self.weapon_owned[Weapon::Pistol as usize] = true;
        self.ammo[0] = 50;
    }

    /// Strip per-level items when a level is left.
    pub fn finish_level(&mut self, world: &mut World) {
        self.powers = [0; NUMPOWERS];
        self.cards = [false; NUMCARDS];
        self.damage_count = 0;
        self.bonus_count = 0;
        if let Some(mo) = self.mo {
            if let Ok(mut f) = world.ecs.get::<&mut ActorFlags>(mo) {
                f.0.remove(MobjFlags::SHADOW);
            }
        }
    }

    pub fn power(&self, p: Power) -> i32 {
        self.powers[p as usize]
    }

    /* ───────────────────────────── think ───────────────────────────── */

    pub fn think(&mut self, world: &mut World, mode: GameMode) {
        let Some(mo) = self.mo else {
            return;
        };
        if !world.ecs.contains(mo) {
            self.mo = None;
            return;
        }
        self.sync_health(world, mo);

        let moving = self.cmd.forward_move != 0 || self.cmd.side_move != 0;
        if let Ok(mut pilot) = world.ecs.get::<&mut Pilot>(mo) {
            pilot.moving = moving;
        }

        if let Ok(mut f) = world.ecs.get::<&mut ActorFlags>(mo) {
            if f.0.contains(MobjFlags::JUSTATTACKED) {
                // a punch or chainsaw hit lunges forward
                self.cmd.angle_turn = 0;
                self.cmd.forward_move = (0xC800 / 512) as i8;
                self.cmd.side_move = 0;
                f.0.remove(MobjFlags::JUSTATTACKED);
            }
        }

        if self.state == PlayerState::Dead {
            self.death_think(world, mo);
            return;
        }

        let on_ground = self.move_player(world, mo);
        self.calc_height(world, mo, on_ground);
        self.in_special_sector(world, mo);

        if self.cmd.buttons.contains(Buttons::SPECIAL) {
            self.cmd.buttons = Buttons::empty();
        }
        if self.cmd.buttons.contains(Buttons::CHANGE) {
            self.change_weapon(self.cmd.buttons.weapon(), mode);
        }

        if self.cmd.buttons.contains(Buttons::USE) {
            if !self.use_down {
                self.use_presses += 1;
                self.use_down = true;
            }
        } else {
            self.use_down = false;
        }
        self.attack_down = self.cmd.buttons.contains(Buttons::ATTACK);

        self.tick_counters(world, mo);
    }

    fn sync_health(&mut self, world: &mut World, mo: Entity) {
        let Ok(h) = world.ecs.get::<&Health>(mo).map(|h| h.0) else {
            return;
        };
        self.health = h.max(0);
        if h <= 0 && self.state == PlayerState::Live {
            log::debug!("player died");
            self.state = PlayerState::Dead;
        }
    }

    fn change_weapon(&mut self, index: usize, mode: GameMode) {
        let Some(mut new) = Weapon::from_index(index) else {
            return;
        };
        let owned = |w: Weapon| self.weapon_owned[w as usize];

        if new == Weapon::Fist
            && owned(Weapon::Chainsaw)
            && !(self.ready_weapon == Weapon::Chainsaw && self.power(Power::Strength) != 0)
        {
            new = Weapon::Chainsaw;
        }
        if mode == GameMode::Commercial
            && new == Weapon::Shotgun
            && owned(Weapon::SuperShotgun)
            && self.ready_weapon != Weapon::SuperShotgun
        {
            new = Weapon::SuperShotgun;
        }

        if owned(new) && new != self.ready_weapon {
            // no plasma or BFG in shareware
            let restricted = matches!(new, Weapon::Plasma | Weapon::Bfg);
            if !restricted || mode != GameMode::Shareware {
                self.pending_weapon = Some(new);
            }
        }
    }

    fn move_player(&mut self, world: &mut World, mo: Entity) -> bool {
        let cmd = self.cmd;
        let Ok((angle, pos, b, mom)) = world
            .ecs
            .query_one_mut::<(&mut Angle, &Position, &Bounds, &mut Momentum)>(mo)
        else {
            return false;
        };
        angle.0 = angle.0.wrapping_add(Bam((cmd.angle_turn as i32 as u32) << 16));
        let on_ground = pos.z <= b.floor_z;

        if cmd.forward_move != 0 && on_ground {
            thrust(mom, angle.0, Fixed(cmd.forward_move as i32 * 2048));
        }
        if cmd.side_move != 0 && on_ground {
            let right = Bam(angle.0.0.wrapping_sub(Bam::ANG90.0));
            thrust(mom, right, Fixed(cmd.side_move as i32 * 2048));
        }
        on_ground
    }

    /// View height with walking bob.
    fn calc_height(&mut self, world: &World, mo: Entity, on_ground: bool) {
        let Ok(mut q) = world.ecs.query_one::<(&Position, &Bounds, &Momentum)>(mo) else {
            return;
        };
        let Some((pos, b, mom)) = q.get() else {
            return;
        };

        self.bob = Fixed(((mom.x * mom.x) + (mom.y * mom.y)).raw() >> 2).min(MAXBOB);
        let ceiling_limit = b.ceiling_z - Fixed::from_int(4);

        if !on_ground {
            self.view_z = pos.z + self.view_height;
            return;
        }

        let fine = (FINEANGLES / 20 * world.level_time as usize) & (FINEANGLES - 1);
        let phase = Bam((fine as u32) << ANGLETOFINESHIFT).sin();
        let bob = Fixed(self.bob.raw() / 2) * phase;

        if self.state == PlayerState::Live {
            self.view_height += self.delta_view_height;
            if self.view_height > VIEWHEIGHT {
                self.view_height = VIEWHEIGHT;
                self.delta_view_height = Fixed::ZERO;
            }
            let half = Fixed(VIEWHEIGHT.raw() / 2);
            if self.view_height < half {
                self.view_height = half;
                if self.delta_view_height <= Fixed::ZERO {
                    self.delta_view_height = Fixed(1);
                }
            }
            if !self.delta_view_height.is_zero() {
                self.delta_view_height += Fixed(FRACUNIT / 4);
                if self.delta_view_height.is_zero() {
                    self.delta_view_height = Fixed(1);
                }
            }
        }
        self.view_z = (pos.z + self.view_height + bob).min(ceiling_limit);
    }

    fn death_think(&mut self, world: &mut World, mo: Entity) {
        let six = Fixed::from_int(6);
        if self.view_height > six {
            self.view_height -= Fixed(FRACUNIT);
        }
        if self.view_height < six {
            self.view_height = six;
        }
        self.delta_view_height = Fixed::ZERO;

        let on_ground = world
            .ecs
            .query_one_mut::<(&Position, &Bounds)>(mo)
            .map(|(p, b)| p.z <= b.floor_z)
            .unwrap_or(false);
        self.calc_height(world, mo, on_ground);

        if self.damage_count > 0 {
            self.damage_count -= 1;
        }
        if self.cmd.buttons.contains(Buttons::USE) {
            self.state = PlayerState::Reborn;
        }
    }

    /// Damage floors, secrets and the exit floor.
    fn in_special_sector(&mut self, world: &mut World, mo: Entity) {
        let Ok((ss, z)) = world
            .ecs
            .query_one_mut::<(&Subsector, &Position)>(mo)
            .map(|(s, p)| (s.0, p.z))
        else {
            return;
        };
        let Some(sec) = world.level.subsectors.get(ss as usize).map(|s| s.sector) else {
            return;
        };
        let sector = &world.level.sectors[sec as usize];
        let special = sector.special;
        if special == 0 || z != sector.floor_height {
            return;
        }

        let hurts_now = world.level_time & 0x1F == 0;
        let iron_feet = self.power(Power::IronFeet) != 0;
        match special {
            5 if !iron_feet && hurts_now => self.damage(world, mo, 10),
            7 if !iron_feet && hurts_now => self.damage(world, mo, 5),
            16 | 4 => {
                if (!iron_feet || world.rng.p_random() < 5) && hurts_now {
                    self.damage(world, mo, 20);
                }
            }
            9 => {
                self.secret_count += 1;
                world.level.sectors[sec as usize].special = 0;
            }
            11 => {
                if hurts_now {
                    self.damage(world, mo, 20);
                }
                if self.health <= 10 {
                    world.exit_request = Some(LevelExit::Normal);
                }
            }
            5 | 7 => {}
            other => log::warn!("unknown player sector special {other} in sector {sec}"),
        }
    }

    /// Armor absorbs part of the hit; the rest goes to the body.
    pub fn damage(&mut self, world: &mut World, mo: Entity, mut amount: i32) {
        if world.skill == Skill::Baby {
            amount >>= 1;
        }
        let on_exit_floor = world
            .ecs
            .get::<&Subsector>(mo)
            .ok()
            .and_then(|s| world.level.subsectors.get(s.0 as usize))
            .is_some_and(|s| world.level.sectors[s.sector as usize].special == 11);
        if on_exit_floor && amount >= self.health {
            amount = self.health - 1;
        }
        if amount < 1000 && self.power(Power::Invulnerability) != 0 {
            return;
        }

        if self.armor_type != 0 {
            let mut saved = if self.armor_type == 1 { amount / 3 } else { amount / 2 };
            if self.armor_points <= saved {
                saved = self.armor_points;
                self.armor_type = 0;
            }
            self.armor_points -= saved;
            amount -= saved;
        }
        self.health = (self.health - amount).max(0);
        self.damage_count = (self.damage_count + amount).min(100);
        damage_mobj(world, mo, amount);
        self.sync_health(world, mo);
    }

    fn tick_counters(&mut self, world: &mut World, mo: Entity) {
        let p = &mut self.powers;
        if p[Power::Strength as usize] != 0 {
            // counts up, used for the berserk fade
            p[Power::Strength as usize] += 1;
        }
        for power in [Power::Invulnerability, Power::Infrared, Power::IronFeet] {
            if p[power as usize] > 0 {
                p[power as usize] -= 1;
            }
        }
        let invis = &mut p[Power::Invisibility as usize];
        if *invis > 0 {
            *invis -= 1;
            if *invis == 0 {
                if let Ok(mut f) = world.ecs.get::<&mut ActorFlags>(mo) {
                    f.0.remove(MobjFlags::SHADOW);
                }
            }
        }
        if self.damage_count > 0 {
            self.damage_count -= 1;
        }
        if self.bonus_count > 0 {
            self.bonus_count -= 1;
        }
    }
}

fn thrust(mom: &mut Momentum, angle: Bam, mv: Fixed) {
    mom.x += mv * angle.cos();
    mom.y += mv * angle.sin();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Random, Specials, setup};
    use crate::wad::{MapBuilder, WadBuilder, load_level};
    use crate::world::TextureBank;

    fn world_with_player() -> (World, Player) {
        let wad = WadBuilder::new()
            .map(&MapBuilder::room("E1M1", 0, 0, 256, 256))
            .into_wad()
            .expect("wad");
        let level = load_level(&wad, 0, &TextureBank::new()).expect("level");
        let mut w = World::new(level, Random::new(), Specials::default());
        let mut p = Player::default();
        p.reborn();
        let spot = w.level.things[0];
        setup::spawn_player(&mut w, &mut p, 0, &spot, false);
        (w, p)
    }

    #[test]
    fn reborn_keeps_frags_and_counters() {
        let mut p = Player {
            frags: [1, 2, 3, 4],
            kill_count: 7,
            health: 3,
            ammo: [1, 2, 3, 4],
            ..Player::default()
        };
        p.cards[0] = true;
        p.reborn();
        assert_eq!(p.frags, [1, 2, 3, 4]);
        assert_eq!(p.kill_count, 7);
        assert_eq!(p.health, MAXHEALTH);
        assert_eq!(p.ammo, [50, 0, 0, 0]);
        assert_eq!(p.max_ammo, MAX_AMMO);
        assert!(!p.cards[0]);
        assert!(p.weapon_owned[Weapon::Fist as usize] && p.weapon_owned[Weapon::Pistol as usize]);
        assert!(p.use_down && p.attack_down);
    }

    #[test]
    fn forward_command_thrusts_along_angle() {
        let (mut w, mut p) = world_with_player();
        let mo = p.mo.expect("body");
        p.cmd.forward_move = 50;
        p.think(&mut w, GameMode::Shareware);
        let mom = *w.ecs.get::<&Momentum>(mo).expect("momentum");
        // spawned facing 90 degrees: all thrust goes into y
        assert!(mom.y > Fixed::from_int(1));
        assert!(mom.x.abs() < Fixed(FRACUNIT / 64));
    }

    #[test]
    fn turning_accumulates() {
        let (mut w, mut p) = world_with_player();
        let mo = p.mo.expect("body");
        let before = w.ecs.get::<&Angle>(mo).expect("angle").0;
        p.cmd.angle_turn = 0x4000;
        p.think(&mut w, GameMode::Shareware);
        let after = w.ecs.get::<&Angle>(mo).expect("angle").0;
        assert_eq!(after.0.wrapping_sub(before.0), 0x4000_0000);
    }

    #[test]
    fn use_press_is_edge_triggered() {
        let (mut w, mut p) = world_with_player();
        p.use_down = false;
        p.cmd.buttons = Buttons::USE;
        p.think(&mut w, GameMode::Shareware);
        p.think(&mut w, GameMode::Shareware);
        assert_eq!(p.use_presses, 1);
        p.cmd.buttons = Buttons::empty();
        p.think(&mut w, GameMode::Shareware);
        p.cmd.buttons = Buttons::USE;
        p.think(&mut w, GameMode::Shareware);
        assert_eq!(p.use_presses, 2);
    }

    #[test]
    fn weapon_change_rules() {
        let mut p = Player::default();
        p.reborn();
        p.weapon_owned[Weapon::Plasma as usize] = true;
        p.weapon_owned[Weapon::Chainsaw as usize] = true;
        p.pending_weapon = None;

        p.change_weapon(Weapon::Plasma as usize, GameMode::Shareware);
        assert_eq!(p.pending_weapon, None);
        p.change_weapon(Weapon::Plasma as usize, GameMode::Registered);
        assert_eq!(p.pending_weapon, Some(Weapon::Plasma));
        p.change_weapon(Weapon::Fist as usize, GameMode::Registered);
        assert_eq!(p.pending_weapon, Some(Weapon::Chainsaw));
    }

    #[test]
    fn dead_player_asks_for_reborn_on_use() {
        let (mut w, mut p) = world_with_player();
        let mo = p.mo.expect("body");
        p.damage(&mut w, mo, 200);
        assert_eq!(p.health, 0);
        assert_eq!(p.state, PlayerState::Dead);

        p.cmd.buttons = Buttons::empty();
        p.think(&mut w, GameMode::Shareware);
        assert_eq!(p.state, PlayerState::Dead);
        assert_eq!(p.view_height, VIEWHEIGHT - Fixed(FRACUNIT));
        p.cmd.buttons = Buttons::USE;
        p.think(&mut w, GameMode::Shareware);
        assert_eq!(p.state, PlayerState::Reborn);
    }

    #[test]
    fn armor_soaks_damage() {
        let (mut w, mut p) = world_with_player();
        let mo = p.mo.expect("body");
        p.armor_type = 1;
        p.armor_points = 100;
        p.damage(&mut w, mo, 30);
        assert_eq!(p.armor_points, 90);
        assert_eq!(p.health, 80);
        assert_eq!(w.ecs.get::<&Health>(mo).expect("health").0, 80);
    }

    #[test]
    fn secret_floor_counts_once() {
        let (mut w, mut p) = world_with_player();
        w.level.sectors[0].special = 9;
        p.think(&mut w, GameMode::Shareware);
        p.think(&mut w, GameMode::Shareware);
        assert_eq!(p.secret_count, 1);
        assert_eq!(w.level.sectors[0].special, 0);
    }

    #[test]
    fn exit_floor_ends_level_when_weak() {
        let (mut w, mut p) = world_with_player();
        w.level.sectors[0].special = 11;
        p.think(&mut w, GameMode::Shareware);
        assert_eq!(p.health, 80);
        assert_eq!(w.exit_request, None);
        let mo = p.mo.expect("body");
        p.damage(&mut w, mo, 75);
        p.think(&mut w, GameMode::Shareware);
        assert_eq!(w.exit_request, Some(LevelExit::Normal));
    }
}
