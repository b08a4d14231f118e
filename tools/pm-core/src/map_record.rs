//! Level records.
//!
//! ```text
//! +0   u16  id
//! +2   u16  width
//! +4   u16  height
//! +6   [u8; 32] name, NUL padded
//! +38  [u8; width * height] tile indexes, row-major
//! ```

use crate::error::{Error, Result};
use crate::project::Map;

pub const MAP_NAME_LEN: usize = 32;
pub const MAP_HEADER_LEN: usize = 6 + MAP_NAME_LEN;

/// `level001.map` for the first map in the list, whatever its id.
pub fn map_file_name(ordinal: usize) -> String {
    format!("level{ordinal:03}.map")
}

fn to_u16(what: &str, value: usize) -> Result<u16> {
    u16::try_from(value).map_err(|_| Error::unsupported(what, value, u16::MAX as usize))
}

/// Latin-1 bytes of the name, at most 31 of them so a NUL always follows.
/// Characters outside Latin-1 become `?`.
fn encode_name(name: &str) -> [u8; MAP_NAME_LEN] {
    let mut out = [0u8; MAP_NAME_LEN];
    for (dst, c) in out[..MAP_NAME_LEN - 1].iter_mut().zip(name.chars()) {
        *dst = u8::try_from(c as u32).unwrap_or(b'?');
    }
    out
}

/// Encode one map. The grid must already be `width` x `height`; see
/// [`crate::project::normalize_grid`].
pub fn encode_map(map: &Map, width: usize, height: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(MAP_HEADER_LEN + width * height);
    out.extend_from_slice(&to_u16("map id", map.id as usize)?.to_le_bytes());
    out.extend_from_slice(&to_u16("map width", width)?.to_le_bytes());
    out.extend_from_slice(&to_u16("map height", height)?.to_le_bytes());
    out.extend_from_slice(&encode_name(&map.name));

    for row in &map.tile_indexes {
        for &idx in row {
            let byte = u8::try_from(idx).map_err(|_| {
                Error::unsupported(
                    format!("tile index in map {}", map.id),
                    idx as usize,
                    u8::MAX as usize,
                )
            })?;
            out.push(byte);
        }
    }
    Ok(out)
}
