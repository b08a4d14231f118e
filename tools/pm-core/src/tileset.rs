//! Tile pattern table assembly.
//!
//! The base program draws meta-tile `n` from patterns `4n..4n+3` as
//!
//! ```text
//! 4n+0  4n+2
//! 4n+1  4n+3
//! ```
//!
//! so each 2x2 block of the tile set grid is emitted column by column, and
//! blocks are walked row-major.

use log::debug;

use crate::error::Result;
use crate::project::TileSet;
use crate::tile::{BLANK_TILE, EncodedTile, encode_tile};

/// Offsets of the four tiles inside a block, in emission order.
const BLOCK_ORDER: [(usize, usize); 4] = [(0, 0), (0, 1), (1, 0), (1, 1)];

/// Encoded tiles in pattern table order. Cells past the grid edge or
/// referring to a missing tile come out blank.
pub fn assemble_tiles(tile_set: &TileSet) -> Result<Vec<EncodedTile>> {
    let colors = tile_set.palette.len();
    let encoded = tile_set
        .tiles
        .iter()
        .map(|tile| encode_tile(tile, colors))
        .collect::<Result<Vec<_>>>()?;

    let mut out = Vec::with_capacity(tile_set.meta_tile_count() * BLOCK_ORDER.len());
    for block_row in 0..tile_set.blocks_high() {
        for block_col in 0..tile_set.blocks_wide() {
            for (dx, dy) in BLOCK_ORDER {
                let tile = tile_set
                    .tile_ref(block_col * 2 + dx, block_row * 2 + dy)
                    .map_or(BLANK_TILE, |idx| encoded[idx]);
                out.push(tile);
            }
        }
    }

    debug!(
        "assembled {} patterns from {} source tiles ({}x{} grid)",
        out.len(),
        tile_set.tiles.len(),
        tile_set.map_w,
        tile_set.map_h
    );
    Ok(out)
}

/// The pattern table as it is stored in `main.til`.
pub fn assemble_tileset(tile_set: &TileSet) -> Result<Vec<u8>> {
    let tiles = assemble_tiles(tile_set)?;
    Ok(bytemuck::cast_slice(&tiles).to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::project::{Rgb, Tile};
    use crate::tile::{TILE_BYTES, decode_tile};

    fn solid(index: u8) -> Tile {
        Tile {
            pixels: [[index; 8]; 8],
        }
    }

    fn grid(w: usize, h: usize) -> TileSet {
        TileSet {
            palette: (0..16).map(|i| Rgb::new(i * 16, i * 16, i * 16)).collect(),
            tiles: (0..(w * h) as u8).map(|i| solid(i + 1)).collect(),
            map_w: w,
            map_h: h,
            ..Default::default()
        }
    }

    fn colors(tiles: &[EncodedTile]) -> Vec<u8> {
        tiles.iter().map(|t| decode_tile(t).pixels[0][0]).collect()
    }

    #[test]
    fn blocks_are_emitted_column_major_inside() {
        // 4x2 grid, colors numbered row-major from 1:
        //   1 2 3 4
        //   5 6 7 8
        let tiles = assemble_tiles(&grid(4, 2)).unwrap();
        assert_eq!(colors(&tiles), [1, 5, 2, 6, 3, 7, 4, 8]);
    }

    #[test]
    fn odd_dimensions_are_padded_with_blank_tiles() {
        // 3x3 grid:
        //   1 2 3
        //   4 5 6
        //   7 8 9
        let tiles = assemble_tiles(&grid(3, 3)).unwrap();
        assert_eq!(tiles.len(), 16);
        assert_eq!(
            colors(&tiles),
            [1, 4, 2, 5, 3, 6, 0, 0, 7, 0, 8, 0, 9, 0, 0, 0]
        );
    }

    #[test]
    fn explicit_map_is_followed() {
        let mut tile_set = grid(2, 2);
        tile_set.map = Some(vec![vec![3, 3], vec![0, 9]]);
        let tiles = assemble_tiles(&tile_set).unwrap();
        // 9 is not a tile, so it turns blank
        assert_eq!(colors(&tiles), [4, 1, 4, 0]);
    }

    #[test]
    fn byte_stream_is_tiles_back_to_back() {
        let bytes = assemble_tileset(&grid(2, 2)).unwrap();
        assert_eq!(bytes.len(), 4 * TILE_BYTES);
        // tile 1 (index 1 everywhere) only lights plane 0
        assert_eq!(bytes[0..4], [0xFF, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn tiles_are_checked_against_the_tile_set_palette() {
        let mut tile_set = grid(2, 2);
        tile_set.palette.truncate(3);
        let err = assemble_tiles(&tile_set).unwrap_err();
        // tile 3 is filled with index 3, one past the last color
        assert!(matches!(err, Error::MalformedProject(_)));
    }
}
