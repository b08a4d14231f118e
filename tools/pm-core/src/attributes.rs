//! Per meta-tile gameplay flags, packed one byte per tile.

use bit_field::BitField;
use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileFlag {
    Solid,
    PlayerStart,
    PlayerEnd,
    Pushable,
}

/// Bit `n` of an attribute byte holds `FLAG_ORDER[n]`. The base program tests
/// these bits directly, so the order never changes.
pub const FLAG_ORDER: [TileFlag; 4] = [
    TileFlag::Solid,
    TileFlag::PlayerStart,
    TileFlag::PlayerEnd,
    TileFlag::Pushable,
];

impl TileFlag {
    pub fn bit(self) -> usize {
        FLAG_ORDER
            .iter()
            .position(|&f| f == self)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileAttribute {
    /// 1-based meta-tile slot.
    pub tile_index: usize,
    pub is_solid: bool,
    pub is_player_start: bool,
    pub is_player_end: bool,
    pub is_pushable: bool,
}

impl TileAttribute {
    pub fn flag(&self, flag: TileFlag) -> bool {
        match flag {
            TileFlag::Solid => self.is_solid,
            TileFlag::PlayerStart => self.is_player_start,
            TileFlag::PlayerEnd => self.is_player_end,
            TileFlag::Pushable => self.is_pushable,
        }
    }

    pub fn encode(&self) -> u8 {
        FLAG_ORDER.iter().fold(0u8, |mut byte, &flag| {
            byte.set_bit(flag.bit(), self.flag(flag));
            byte
        })
    }
}

/// What the first slots hold when the editor has nothing for them: a floor
/// tile, the player start, the exit and a wall.
fn starter_attribute(slot: usize) -> Option<TileAttribute> {
    let mut attr = TileAttribute {
        tile_index: slot + 1,
        ..Default::default()
    };
    match slot {
        0 => {}
        1 => attr.is_player_start = true,
        2 => attr.is_player_end = true,
        3 => attr.is_solid = true,
        _ => return None,
    }
    Some(attr)
}

/// Produces exactly `slots` records numbered 1..=`slots`.
///
/// Missing records past the starter slots copy the record before them.
/// Carrying forward is kept because existing projects rely on it; an
/// explicit default record would be clearer.
pub fn normalize(attributes: &[Option<TileAttribute>], slots: usize) -> Vec<TileAttribute> {
    let mut out: Vec<TileAttribute> = Vec::with_capacity(slots);
    for slot in 0..slots {
        let given = attributes.get(slot).copied().flatten();
        if given.is_none() {
            trace!("attribute slot {} missing, filled in", slot + 1);
        }
        let record = given
            .or_else(|| starter_attribute(slot))
            .or_else(|| out.last().copied())
            .unwrap_or_default();
        out.push(TileAttribute {
            tile_index: slot + 1,
            ..record
        });
    }
    out
}

/// One byte per record, in slot order.
pub fn encode_attributes(attributes: &[TileAttribute]) -> Vec<u8> {
    attributes.iter().map(TileAttribute::encode).collect()
}
