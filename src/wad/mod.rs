pub mod builder;
pub mod level;
pub mod loader;
pub mod raw;

pub use builder::{MapBuilder, WadBuilder, name8};
pub use level::{LEVEL_LUMPS, LevelError};
pub use loader::{LoadError, load_level};
pub use raw::{Wad, WadError};
