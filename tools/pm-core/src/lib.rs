//! Resource compiler for SMS Puzzle Maker projects.
//!
//! A [`Project`] goes in, a paged resource image comes out, ready to be
//! appended to the base program:
//!
//! ```text
//! Project -> main.pal / main.til / main.atr / project.inf / levelNNN.map
//!         -> paged file system image -> base program ++ image
//! ```
//!
//! Every stage is a pure function of its input, so the same project always
//! produces byte-identical output.

pub mod attributes;
pub mod error;
pub mod interchange;
pub mod map_record;
pub mod palette;
pub mod project;
pub mod resource;
pub mod rom;
pub mod tile;
pub mod tileset;
pub mod vfs;

pub use error::{Error, Result};
pub use project::{Map, Project, Rgb, Tile, TileSet};
pub use resource::{Resource, ResourceConfig, build_resource};
pub use rom::{BaseImageSource, FileBaseImage, MemoryBaseImage, compose_rom};
pub use vfs::{ResourceImage, VfsBuilder};
