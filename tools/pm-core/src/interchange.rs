//! The editor's `.project.json` document, format `0.1.0`.
//!
//! The editor writes whatever its in-memory state happens to hold: sparse
//! rows come out as `null`, unassigned ids as `0` or negative numbers, and
//! attribute records may be missing fields. Everything here is lenient about
//! that and hands a clean [`Project`] to the encoder.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::attributes::TileAttribute;
use crate::error::{Error, Result};
use crate::project::{
    APP_NAME, FORMAT_VERSION, Map, Options, Project, ProjectInfo, Rgb, Tile, TileSet, ToolInfo,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectDoc {
    tool: ToolDoc,
    #[serde(default)]
    project_info: ProjectInfoDoc,
    #[serde(default)]
    options: OptionsDoc,
    #[serde(default)]
    maps: Vec<MapDoc>,
    tile_set: TileSetDoc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToolDoc {
    name: String,
    #[serde(default)]
    version: String,
    format: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ProjectInfoDoc {
    #[serde(default)]
    name: String,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct OptionsDoc {
    tile_zoom: u32,
    tile_size: u32,
    map_width: usize,
    map_height: usize,
}

impl Default for OptionsDoc {
    fn default() -> Self {
        Options::default().into()
    }
}

impl From<Options> for OptionsDoc {
    fn from(o: Options) -> Self {
        Self {
            tile_zoom: o.tile_zoom,
            tile_size: o.tile_size,
            map_width: o.map_width,
            map_height: o.map_height,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapDoc {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tile_indexes: Vec<Option<Vec<Option<u32>>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TileSetDoc {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    src: Option<String>,
    #[serde(default)]
    attributes: Vec<Option<AttributeDoc>>,
    for_master_system: MasterSystemDoc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MasterSystemDoc {
    #[serde(default)]
    palettes: Vec<Vec<[u8; 3]>>,
    #[serde(default)]
    tiles: Vec<TileDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    map: Option<Vec<Vec<usize>>>,
    #[serde(rename = "mapW")]
    map_w: usize,
    #[serde(rename = "mapH")]
    map_h: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TileDoc {
    pixels: [[u8; 8]; 8],
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AttributeDoc {
    tile_index: usize,
    is_solid: bool,
    is_player_start: bool,
    is_player_end: bool,
    is_pushable: bool,
}

impl From<AttributeDoc> for TileAttribute {
    fn from(a: AttributeDoc) -> Self {
        Self {
            tile_index: a.tile_index,
            is_solid: a.is_solid,
            is_player_start: a.is_player_start,
            is_player_end: a.is_player_end,
            is_pushable: a.is_pushable,
        }
    }
}

impl From<TileAttribute> for AttributeDoc {
    fn from(a: TileAttribute) -> Self {
        Self {
            tile_index: a.tile_index,
            is_solid: a.is_solid,
            is_player_start: a.is_player_start,
            is_player_end: a.is_player_end,
            is_pushable: a.is_pushable,
        }
    }
}

impl MapDoc {
    fn into_map(self) -> Result<Map> {
        let id = match self.id {
            Some(id) if id > 0 => u32::try_from(id)
                .map_err(|_| Error::malformed(format!("map id {id} is out of range")))?,
            _ => 0,
        };
        let tile_indexes: Vec<Vec<u32>> = self
            .tile_indexes
            .into_iter()
            .map(|row| row.unwrap_or_default().into_iter().map(|t| t.unwrap_or(0)).collect())
            .collect();
        Ok(Map {
            id,
            name: self.name.unwrap_or_default(),
            tile_indexes,
        })
    }
}

impl ProjectDoc {
    fn into_project(self) -> Result<Project> {
        if self.tool.name != APP_NAME {
            return Err(Error::malformed(format!(
                "this does not seem to be a {APP_NAME} project (tool is {:?})",
                self.tool.name
            )));
        }
        if self.tool.format != FORMAT_VERSION {
            return Err(Error::malformed(format!("unknown format: {}", self.tool.format)));
        }

        let sms = self.tile_set.for_master_system;
        let palette = sms
            .palettes
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|[r, g, b]| Rgb::new(r, g, b))
            .collect();

        Ok(Project {
            tool: ToolInfo {
                name: self.tool.name,
                version: self.tool.version,
                format: self.tool.format,
            },
            options: Options {
                tile_zoom: self.options.tile_zoom,
                tile_size: self.options.tile_size,
                map_width: self.options.map_width,
                map_height: self.options.map_height,
            },
            maps: self
                .maps
                .into_iter()
                .map(MapDoc::into_map)
                .collect::<Result<_>>()?,
            tile_set: TileSet {
                name: self.tile_set.name.unwrap_or_default(),
                src: self.tile_set.src,
                palette,
                tiles: sms.tiles.into_iter().map(|t| Tile { pixels: t.pixels }).collect(),
                map_w: sms.map_w,
                map_h: sms.map_h,
                map: sms.map,
                attributes: self
                    .tile_set
                    .attributes
                    .into_iter()
                    .map(|a| a.map(TileAttribute::from))
                    .collect(),
            },
            project_info: ProjectInfo {
                name: self.project_info.name,
                extra: self.project_info.extra,
            },
        })
    }

    fn from_project(project: &Project) -> Self {
        let ts = &project.tile_set;
        Self {
            tool: ToolDoc {
                name: project.tool.name.clone(),
                version: project.tool.version.clone(),
                format: project.tool.format.clone(),
            },
            project_info: ProjectInfoDoc {
                name: project.project_info.name.clone(),
                extra: project.project_info.extra.clone(),
            },
            options: project.options.clone().into(),
            maps: project
                .maps
                .iter()
                .map(|m| MapDoc {
                    id: Some(m.id as i64),
                    name: Some(m.name.clone()),
                    tile_indexes: m
                        .tile_indexes
                        .iter()
                        .map(|row| Some(row.iter().copied().map(Some).collect()))
                        .collect(),
                })
                .collect(),
            tile_set: TileSetDoc {
                name: Some(ts.name.clone()),
                src: ts.src.clone(),
                attributes: ts.attributes.iter().map(|a| a.map(AttributeDoc::from)).collect(),
                for_master_system: MasterSystemDoc {
                    palettes: vec![ts.palette.iter().map(|c| [c.r, c.g, c.b]).collect()],
                    tiles: ts.tiles.iter().map(|t| TileDoc { pixels: t.pixels }).collect(),
                    map: ts.map.clone(),
                    map_w: ts.map_w,
                    map_h: ts.map_h,
                },
            },
        }
    }
}

/// Parses a project document.
pub fn from_json(json: &str) -> Result<Project> {
    serde_json::from_str::<ProjectDoc>(json)?.into_project()
}

/// Serializes a project in the editor's format.
pub fn to_json(project: &Project) -> Result<String> {
    Ok(serde_json::to_string_pretty(&ProjectDoc::from_project(project))?)
}
