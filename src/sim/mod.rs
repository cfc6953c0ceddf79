mod components;
pub mod demo;
pub mod game;
pub mod lights;
pub mod mob;
pub mod movers;
pub mod options;
pub mod player;
mod random;
pub mod save;
pub mod setup;
pub mod specials;
pub mod thinker;
mod tic;
mod world;

pub use components::{
    ActorFlags, Angle, BT_WEAPONSHIFT, BTS_SAVESHIFT, BlockCell, Bounds, Buttons, Class, Health,
    LastLook, Momentum, MobjThinker, Pilot, Position, SpawnSpot, Subsector, TicCmd, Tics,
};
pub use demo::{DemoError, DemoHeader, DemoPlayback, DemoRecorder, RecordStatus};
pub use game::{DemoSource, Game, GameAction, GameError, GameState, Intermission, TICRATE};
pub use options::{GameMode, GameOptions, Skill};
pub use player::{MAXPLAYERS, Player, PlayerState, Weapon};
pub use random::Random;
pub use save::{DirSaves, MemorySaves, SaveError, SaveGame, SaveGameStore};
pub use setup::{SpawnError, SpawnRules};
pub use specials::{SpecialDefs, Specials, SpecialsError};
pub use thinker::{Think, ThinkerId, ThinkerKind, Thinkers};
pub use tic::TicRunner;
pub use world::{ActorScript, LevelExit, LevelTotals, World};
