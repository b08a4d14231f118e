//! 4bpp planar tile encoding.
//!
//! Each 8 pixel row becomes four bytes, one per bitplane, with the leftmost
//! pixel in bit 7. Rows are stored top to bottom, so a tile is 32 bytes.
//!
//! No palette index is treated as transparent here: index 0 is the backdrop
//! color only because the VDP draws it that way, and every index is encoded
//! verbatim.

use bit_field::BitField;

use crate::error::{Error, Result};
use crate::palette::PALETTE_SLOTS;
use crate::project::Tile;

pub const TILE_SIZE: usize = 8;
pub const BITPLANES: usize = 4;
pub const TILE_BYTES: usize = TILE_SIZE * BITPLANES;

pub type EncodedTile = [u8; TILE_BYTES];

pub const BLANK_TILE: EncodedTile = [0; TILE_BYTES];

fn encode_row(row: &[u8; TILE_SIZE]) -> [u8; BITPLANES] {
    let mut planes = [0u8; BITPLANES];
    for (col, &pixel) in row.iter().enumerate() {
        for (plane_idx, plane) in planes.iter_mut().enumerate() {
            plane.set_bit(7 - col, pixel.get_bit(plane_idx));
        }
    }
    planes
}

/// Encode one tile into its planar form.
///
/// `colors` is the length of the palette the tile is drawn with. A pixel
/// past it, or past the 16 hardware slots, is an error.
pub fn encode_tile(tile: &Tile, colors: usize) -> Result<EncodedTile> {
    let limit = colors.min(PALETTE_SLOTS);
    let mut out = BLANK_TILE;
    for (y, row) in tile.pixels.iter().enumerate() {
        if let Some(x) = row.iter().position(|&p| p as usize >= limit) {
            return Err(Error::malformed(format!(
                "pixel ({x}, {y}) uses palette index {}, only 0..{limit} exist",
                row[x]
            )));
        }
        out[y * BITPLANES..(y + 1) * BITPLANES].copy_from_slice(&encode_row(row));
    }
    Ok(out)
}

/// Rebuild the index grid from an encoded tile.
pub fn decode_tile(encoded: &EncodedTile) -> Tile {
    let mut tile = Tile::default();
    for (row, planes) in tile.pixels.iter_mut().zip(encoded.chunks_exact(BITPLANES)) {
        for (col, pixel) in row.iter_mut().enumerate() {
            for (plane_idx, plane) in planes.iter().enumerate() {
                pixel.set_bit(plane_idx, plane.get_bit(7 - col));
            }
        }
    }
    tile
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(index: u8) -> Tile {
        Tile {
            pixels: [[index; TILE_SIZE]; TILE_SIZE],
        }
    }

    #[test]
    fn index_zero_encodes_to_zero() {
        assert_eq!(encode_tile(&filled(0), PALETTE_SLOTS).unwrap(), BLANK_TILE);
    }

    #[test]
    fn index_fifteen_sets_every_plane() {
        assert_eq!(encode_tile(&filled(15), PALETTE_SLOTS).unwrap(), [0xFF; TILE_BYTES]);
    }

    #[test]
    fn planes_follow_index_bits() {
        let mut tile = Tile::default();
        // leftmost pixel of the first row: index 0b0101
        tile.pixels[0][0] = 5;
        // rightmost pixel of the last row: index 0b1010
        tile.pixels[7][7] = 10;

        let encoded = encode_tile(&tile, PALETTE_SLOTS).unwrap();
        assert_eq!(encoded[0..4], [0x80, 0x00, 0x80, 0x00]);
        assert_eq!(encoded[28..32], [0x00, 0x01, 0x00, 0x01]);
        assert!(encoded[4..28].iter().all(|&b| b == 0));
    }

    #[test]
    fn index_fourteen_is_not_transparent() {
        let encoded = encode_tile(&filled(14), PALETTE_SLOTS).unwrap();
        for row in encoded.chunks_exact(BITPLANES) {
            assert_eq!(row, [0x00, 0xFF, 0xFF, 0xFF]);
        }
    }

    #[test]
    fn decode_inverts_encode() {
        let mut tile = Tile::default();
        for (y, row) in tile.pixels.iter_mut().enumerate() {
            for (x, pixel) in row.iter_mut().enumerate() {
                *pixel = ((y * 3 + x * 5) % 16) as u8;
            }
        }
        assert_eq!(decode_tile(&encode_tile(&tile, PALETTE_SLOTS).unwrap()), tile);
    }

    #[test]
    fn out_of_palette_index_is_rejected() {
        let mut tile = Tile::default();
        tile.pixels[2][3] = 16;
        assert!(matches!(
            encode_tile(&tile, PALETTE_SLOTS),
            Err(Error::MalformedProject(_))
        ));
    }

    #[test]
    fn index_past_a_short_palette_is_rejected() {
        assert!(encode_tile(&filled(2), 3).is_ok());
        let err = encode_tile(&filled(9), 3).unwrap_err();
        assert!(err.to_string().contains("palette index 9, only 0..3 exist"));
    }

    #[test]
    fn long_palettes_are_still_capped_at_sixteen() {
        assert!(encode_tile(&filled(16), 40).is_err());
    }
}
