//! Deterministic Doom level loading and tic simulation.
//!
//! * [`wad`]: archive access and the map loader.
//! * [`world`]: fixed-point math, level geometry and topology.
//! * [`sim`]: thinkers, players, specials, demos and the game ticker.
//! * [`defs`]: static object and animation tables.

pub mod defs;
pub mod sim;
pub mod wad;
pub mod world;
