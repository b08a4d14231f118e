//! Color register encoding.
//!
//! The VDP stores colors as `--BBGGRR`: two bits per channel. Full precision
//! channels are reduced by dropping their low six bits, no dithering and no
//! perceptual weighting.

use log::debug;

use crate::project::Rgb;

/// Number of color registers in one hardware palette.
pub const PALETTE_SLOTS: usize = 16;

#[inline(always)]
const fn to_2bpp(channel: u8) -> u8 {
    channel >> 6
}

/// Encode a single color into its register value.
pub const fn encode_color(color: Rgb) -> u8 {
    to_2bpp(color.r) | (to_2bpp(color.g) << 2) | (to_2bpp(color.b) << 4)
}

/// Encode a palette into exactly [`PALETTE_SLOTS`] register values.
///
/// Short palettes are zero padded at the end; entries past the last slot are
/// ignored.
pub fn encode_palette(palette: &[Rgb]) -> [u8; PALETTE_SLOTS] {
    if palette.len() > PALETTE_SLOTS {
        debug!(
            "palette has {} colors, ignoring the last {}",
            palette.len(),
            palette.len() - PALETTE_SLOTS
        );
    }

    let mut registers = [0u8; PALETTE_SLOTS];
    for (register, &color) in registers.iter_mut().zip(palette) {
        *register = encode_color(color);
    }
    registers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_is_all_channels_max() {
        assert_eq!(encode_color(Rgb::new(255, 255, 255)), 0x3F);
    }

    #[test]
    fn channels_are_truncated_not_rounded() {
        assert_eq!(encode_color(Rgb::new(0, 128, 64)), 0x18);
        assert_eq!(encode_color(Rgb::new(63, 127, 191)), 0b10_01_00);
    }

    #[test]
    fn top_bits_are_always_clear() {
        for v in (0..=255u16).step_by(17) {
            let v = v as u8;
            let byte = encode_color(Rgb::new(v, 255 - v, v.wrapping_mul(3)));
            assert_eq!(byte & 0xC0, 0);
        }
    }

    #[test]
    fn short_palette_is_zero_padded() {
        let encoded = encode_palette(&[Rgb::new(255, 0, 0), Rgb::new(0, 0, 255)]);
        assert_eq!(encoded[..2], [0x03, 0x30]);
        assert!(encoded[2..].iter().all(|&b| b == 0));
    }

    #[test]
    fn long_palette_is_truncated() {
        let palette = vec![Rgb::new(255, 255, 255); PALETTE_SLOTS + 4];
        assert_eq!(encode_palette(&palette), [0x3F; PALETTE_SLOTS]);
    }
}
