//! The project snapshot handed over by the editor, and the normalization
//! applied to it before anything is encoded.

use std::collections::{BTreeMap, HashSet};

use log::debug;

use crate::attributes::TileAttribute;
use crate::error::{Error, Result};
use crate::tile::TILE_SIZE;

pub const APP_NAME: &str = "SMS-Puzzle-Maker";
pub const APP_VERSION: &str = "0.20.0";
pub const FORMAT_VERSION: &str = "0.1.0";

pub const DEFAULT_MAP_WIDTH: usize = 16;
pub const DEFAULT_MAP_HEIGHT: usize = 9;
pub const DEFAULT_PROJECT_NAME: &str = "Unnamed Project";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// An 8x8 grid of palette indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tile {
    pub pixels: [[u8; TILE_SIZE]; TILE_SIZE],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
    pub format: String,
}

impl Default for ToolInfo {
    fn default() -> Self {
        Self {
            name: APP_NAME.to_string(),
            version: APP_VERSION.to_string(),
            format: FORMAT_VERSION.to_string(),
        }
    }
}

/// Editor canvas options. Only the map dimensions reach the resource image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub tile_zoom: u32,
    pub tile_size: u32,
    pub map_width: usize,
    pub map_height: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            tile_zoom: 1,
            tile_size: 16,
            map_width: DEFAULT_MAP_WIDTH,
            map_height: DEFAULT_MAP_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectInfo {
    pub name: String,
    /// Anything else the editor stored; carried through untouched.
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// One level.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Map {
    /// `0` means the map has not been given an id yet.
    pub id: u32,
    pub name: String,
    /// Row-major meta-tile references, `0` is an empty cell.
    pub tile_indexes: Vec<Vec<u32>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TileSet {
    pub name: String,
    /// Where the editor loaded the source image from. Not encoded.
    pub src: Option<String>,
    pub palette: Vec<Rgb>,
    pub tiles: Vec<Tile>,
    /// Grid width in 8x8 tiles.
    pub map_w: usize,
    /// Grid height in 8x8 tiles.
    pub map_h: usize,
    /// References into `tiles`, `map_h` rows of `map_w`. `None` lays the
    /// tiles out in order, row by row.
    pub map: Option<Vec<Vec<usize>>>,
    /// One entry per meta-tile slot; `None` marks a slot the editor never
    /// filled in.
    pub attributes: Vec<Option<TileAttribute>>,
}

impl TileSet {
    /// Which tile sits at grid position (`col`, `row`), if any.
    pub fn tile_ref(&self, col: usize, row: usize) -> Option<usize> {
        if col >= self.map_w || row >= self.map_h {
            return None;
        }
        let idx = match &self.map {
            Some(map) => *map.get(row)?.get(col)?,
            None => row * self.map_w + col,
        };
        (idx < self.tiles.len()).then_some(idx)
    }

    pub fn blocks_wide(&self) -> usize {
        self.map_w.div_ceil(2)
    }

    pub fn blocks_high(&self) -> usize {
        self.map_h.div_ceil(2)
    }

    /// Number of 2x2 meta-tiles, which is also the number of attribute slots.
    pub fn meta_tile_count(&self) -> usize {
        self.blocks_wide() * self.blocks_high()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Project {
    pub tool: ToolInfo,
    pub options: Options,
    pub maps: Vec<Map>,
    pub tile_set: TileSet,
    pub project_info: ProjectInfo,
}

impl Project {
    /// Returns a copy with every map id assigned, every map named and every
    /// grid sized to the configured dimensions, plus a dense attribute list.
    pub fn normalized(&self) -> Result<Project> {
        let maps = normalize_maps(&self.maps, self.options.map_width, self.options.map_height)?;

        let slots = self.tile_set.meta_tile_count();
        let attributes = crate::attributes::normalize(&self.tile_set.attributes, slots)
            .into_iter()
            .map(Some)
            .collect();

        let mut project_info = self.project_info.clone();
        if project_info.name.trim().is_empty() {
            project_info.name = DEFAULT_PROJECT_NAME.to_string();
        }

        Ok(Project {
            tool: self.tool.clone(),
            options: self.options.clone(),
            maps,
            tile_set: TileSet {
                attributes,
                ..self.tile_set.clone()
            },
            project_info,
        })
    }
}

/// Pads with empty cells or truncates so the grid is exactly `width` x `height`.
pub fn normalize_grid(grid: &[Vec<u32>], width: usize, height: usize) -> Vec<Vec<u32>> {
    (0..height)
        .map(|row| {
            let src = grid.get(row).map(Vec::as_slice).unwrap_or_default();
            (0..width).map(|col| src.get(col).copied().unwrap_or(0)).collect()
        })
        .collect()
}

/// Assigns ids to unassigned maps, names unnamed ones and normalizes grids.
///
/// Ids are handed out in list order, each one past the largest id seen so
/// far. Two maps claiming the same id is an error.
pub fn normalize_maps(maps: &[Map], width: usize, height: usize) -> Result<Vec<Map>> {
    let mut seen = HashSet::new();
    for map in maps.iter().filter(|m| m.id > 0) {
        if !seen.insert(map.id) {
            return Err(Error::malformed(format!("map id {} is used more than once", map.id)));
        }
    }

    let mut max_id = maps.iter().map(|m| m.id).max().unwrap_or(0);
    maps.iter()
        .map(|map| {
            let id = if map.id > 0 {
                map.id
            } else {
                max_id = max_id
                    .checked_add(1)
                    .ok_or_else(|| Error::malformed("ran out of map ids"))?;
                debug!("assigned id {max_id} to unnamed map");
                max_id
            };
            let name = if map.name.is_empty() {
                format!("Unnamed {id}")
            } else {
                map.name.clone()
            };
            Ok(Map {
                id,
                name,
                tile_indexes: normalize_grid(&map.tile_indexes, width, height),
            })
        })
        .collect()
}
