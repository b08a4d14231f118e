//! Turns a project into the named files the base program expects, and those
//! files into a resource image.
//!
//! | file            | contents                                    |
//! |-----------------|---------------------------------------------|
//! | `main.pal`      | 16 color registers                          |
//! | `main.til`      | pattern table, 4 patterns per meta-tile     |
//! | `main.atr`      | one flag byte per meta-tile                 |
//! | `project.inf`   | tool name, tool version, project name (C strings) |
//! | `levelNNN.map`  | one record per map, numbered from 1         |

use std::collections::BTreeMap;

use log::{debug, info};

use crate::attributes::{TileAttribute, encode_attributes};
use crate::error::Result;
use crate::map_record::{encode_map, map_file_name};
use crate::palette::encode_palette;
use crate::project::Project;
use crate::tileset::assemble_tileset;
use crate::vfs::{DEFAULT_BASE_PAGE, DEFAULT_MAGIC, VfsBuilder};

pub const PALETTE_FILE: &str = "main.pal";
pub const TILES_FILE: &str = "main.til";
pub const ATTRIBUTES_FILE: &str = "main.atr";
pub const PROJECT_INFO_FILE: &str = "project.inf";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceConfig {
    /// ROM bank the image is loaded at; page numbers in the file table count
    /// from here.
    pub base_page: u16,
    /// Up to four bytes written at the start of the image.
    pub magic: String,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            base_page: DEFAULT_BASE_PAGE,
            magic: DEFAULT_MAGIC.to_string(),
        }
    }
}

/// Everything one build produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub files: BTreeMap<String, Vec<u8>>,
    pub image: Vec<u8>,
}

/// NUL-terminated tool name, tool version and project name, back to back.
pub fn encode_project_info(project: &Project) -> Vec<u8> {
    [
        project.tool.name.as_str(),
        project.tool.version.as_str(),
        project.project_info.name.as_str(),
    ]
    .iter()
    .flat_map(|s| s.bytes().filter(|&b| b != 0).chain([0]))
    .collect()
}

/// Encodes every part of the project into named files.
///
/// The project is normalized first, so unassigned ids, short grids and
/// missing attributes are all dealt with here.
pub fn build_files(project: &Project) -> Result<BTreeMap<String, Vec<u8>>> {
    let project = project.normalized()?;
    let (width, height) = (project.options.map_width, project.options.map_height);

    let mut files = BTreeMap::new();
    files.insert(
        PALETTE_FILE.to_string(),
        encode_palette(&project.tile_set.palette).to_vec(),
    );
    files.insert(TILES_FILE.to_string(), assemble_tileset(&project.tile_set)?);

    let attributes: Vec<TileAttribute> =
        project.tile_set.attributes.iter().flatten().copied().collect();
    files.insert(ATTRIBUTES_FILE.to_string(), encode_attributes(&attributes));
    files.insert(PROJECT_INFO_FILE.to_string(), encode_project_info(&project));

    for (i, map) in project.maps.iter().enumerate() {
        let name = map_file_name(i + 1);
        debug!("{name}: map {} {:?}", map.id, map.name);
        files.insert(name, encode_map(map, width, height)?);
    }

    Ok(files)
}

/// Builds the full resource image for `project`.
pub fn build_resource(project: &Project, config: &ResourceConfig) -> Result<Resource> {
    let builder = VfsBuilder::new(&config.magic, config.base_page)?;
    let files = build_files(project)?;
    let image = builder.build(&files)?;

    info!(
        "resource image: {} files, {} pages, crc32 {:08X}",
        files.len(),
        image.len() / crate::vfs::PAGE_SIZE,
        crc32fast::hash(&image)
    );
    Ok(Resource { files, image })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{Map, ProjectInfo};

    #[test]
    fn project_info_is_three_c_strings() {
        let project = Project {
            project_info: ProjectInfo {
                name: "Boxes".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            encode_project_info(&project),
            b"SMS-Puzzle-Maker\x000.20.0\x00Boxes\x00"
        );
    }

    #[test]
    fn map_files_follow_list_position() {
        let project = Project {
            maps: vec![
                Map {
                    id: 9,
                    ..Default::default()
                },
                Map::default(),
            ],
            ..Default::default()
        };
        let files = build_files(&project).unwrap();
        let names: Vec<_> = files.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            ["level001.map", "level002.map", "main.atr", "main.pal", "main.til", "project.inf"]
        );
        // second map had no id and got the next one
        assert_eq!(files["level002.map"][..2], [10, 0]);
    }
}
