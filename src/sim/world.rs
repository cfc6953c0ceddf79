//! Per-level simulation context.
//!
//! A `World` is built when a level loads and dropped when the next one
//! loads.  Everything a thinker may touch hangs off it, so independent
//! worlds can coexist (tests run several side by side).

use hecs::Entity;

use super::options::Skill;
use super::player::MAXPLAYERS;
use super::random::Random;
use super::specials::Specials;
use super::thinker::{ThinkerId, Thinkers};
use crate::world::{Level, Thing};

/// Deathmatch start slots kept per level.
pub const MAX_DEATHMATCH_STARTS: usize = 10;
/// Player corpses kept before the oldest is removed.
pub const BODYQUESIZE: usize = 32;

/// Countable things present at level start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelTotals {
    pub kills: i32,
    pub items: i32,
    pub secrets: i32,
}

/// Exit requested from inside a level tic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelExit {
    Normal,
    Secret,
}

/// Frame-sequence logic supplied by the host.  Called when an object's
/// state timer reaches zero; returns `false` if the object was removed.
pub trait ActorScript {
    fn state_expired(&mut self, world: &mut World, actor: Entity, me: ThinkerId) -> bool;
}

pub struct World {
    pub level: Level,
    pub ecs: hecs::World,
    pub thinkers: Thinkers,
    pub specials: Specials,
    pub rng: Random,
    pub level_time: i32,
    pub player_starts: [Option<Thing>; MAXPLAYERS],
    pub deathmatch_starts: Vec<Thing>,
    pub totals: LevelTotals,
    pub skill: Skill,
    /// picked up by the game loop once the tic is over
    pub exit_request: Option<LevelExit>,
    pub(crate) body_queue: [Option<Entity>; BODYQUESIZE],
    pub(crate) body_queue_slot: usize,
    script: Option<Box<dyn ActorScript>>,
}

impl World {
    pub fn new(level: Level, rng: Random, specials: Specials) -> Self {
        Self {
            level,
            ecs: hecs::World::new(),
            thinkers: Thinkers::new(),
            specials,
            rng,
            level_time: 0,
            player_starts: [None; MAXPLAYERS],
            deathmatch_starts: Vec::new(),
            totals: LevelTotals::default(),
            skill: Skill::default(),
            exit_request: None,
            body_queue: [None; BODYQUESIZE],
            body_queue_slot: 0,
            script: None,
        }
    }

    /// A world with no geometry; enough to drive the scheduler.
    pub fn empty() -> Self {
        Self::new(Level::default(), Random::new(), Specials::default())
    }

    pub fn set_actor_script(&mut self, script: Box<dyn ActorScript>) {
        self.script = Some(script);
    }

    /// Hand a state expiry to the actor script.  Without one, the object
    /// simply stays in its current state.
    pub(crate) fn state_expired(&mut self, actor: Entity, me: ThinkerId) -> bool {
        match self.script.take() {
            Some(mut script) => {
                let alive = script.state_expired(self, actor, me);
                if self.script.is_none() {
                    self.script = Some(script);
                }
                alive
            }
            None => {
                if let Ok(mut tics) = self.ecs.get::<&mut super::Tics>(actor) {
                    tics.0 = -1;
                }
                true
            }
        }
    }

    /// Hook the level's special effects up.  Runs once right after things
    /// have been spawned.
    pub fn spawn_specials(&mut self) {
        super::specials::spawn_specials(self);
    }

    /// Everything a level tic does after the players have thought.
    pub fn run_tic(&mut self) {
        super::thinker::run(self);
        super::specials::update_specials(self);
        self.level_time += 1;
    }
}
