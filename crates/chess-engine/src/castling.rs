//! Castling availability flags.

use chess_core::{CastleSide, Color, File, Square};

/// Which castling moves each side may still make, one bit per side and wing.
///
/// Bit `2 * color + wing`, so White queenside is bit 0 and Black kingside
/// is bit 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    #[inline]
    const fn bit(color: Color, wing: CastleSide) -> u8 {
        1 << (color.index() * 2 + wing.index())
    }

    /// Builds rights from a `[color][wing]` availability grid.
    pub fn from_flags(flags: [[bool; 2]; 2]) -> Self {
        let mut rights = CastlingRights::NONE;
        for color in Color::ALL {
            for wing in CastleSide::ALL {
                if flags[color.index()][wing.index()] {
                    rights.0 |= Self::bit(color, wing);
                }
            }
        }
        rights
    }

    /// The inverse of [`CastlingRights::from_flags`].
    pub fn to_flags(self) -> [[bool; 2]; 2] {
        let mut flags = [[false; 2]; 2];
        for color in Color::ALL {
            for wing in CastleSide::ALL {
                flags[color.index()][wing.index()] = self.has(color, wing);
            }
        }
        flags
    }

    #[inline]
    pub const fn has(self, color: Color, wing: CastleSide) -> bool {
        self.0 & Self::bit(color, wing) != 0
    }

    #[inline]
    pub fn revoke(&mut self, color: Color, wing: CastleSide) {
        self.0 &= !Self::bit(color, wing);
    }

    #[inline]
    pub fn revoke_color(&mut self, color: Color) {
        for wing in CastleSide::ALL {
            self.revoke(color, wing);
        }
    }

    /// Drops every right that depends on a piece standing on `sq`. Called for
    /// both the origin and the destination of each move, so a king or rook
    /// moving away and a rook being captured at home are both covered.
    pub fn touch(&mut self, sq: Square) {
        for color in Color::ALL {
            if sq.rank() != color.back_rank() {
                continue;
            }
            match sq.file() {
                File::E => self.revoke_color(color),
                File::A => self.revoke(color, CastleSide::Queenside),
                File::H => self.revoke(color, CastleSide::Kingside),
                _ => {}
            }
        }
    }

    /// Bit index of each right currently held, ascending.
    pub fn indices(self) -> impl Iterator<Item = usize> {
        (0..4).filter(move |i| self.0 & (1 << i) != 0)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}
