//! Precomputed attack sets for every piece kind on every square.
//!
//! Knights, kings and pawns move along fixed patterns, so their sets depend
//! only on the square. Bishops and rooks are looked up through magic hashing
//! of the board occupancy (see [`magics`]). Queens take the union of both.

pub mod magics;

use crate::Bitboard;
use chess_core::{Color, Square};
use magics::{Slider, SliderTable};
use std::fmt;
use std::sync::OnceLock;

pub use magics::{relevance_mask, trace_attacks};

/// The fixed-pattern maps, one 64-entry table each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonSliderMap {
    WhitePawnPush,
    WhitePawnCapture,
    BlackPawnPush,
    BlackPawnCapture,
    Knight,
    King,
}

impl NonSliderMap {
    pub const ALL: [NonSliderMap; 6] = [
        NonSliderMap::WhitePawnPush,
        NonSliderMap::WhitePawnCapture,
        NonSliderMap::BlackPawnPush,
        NonSliderMap::BlackPawnCapture,
        NonSliderMap::Knight,
        NonSliderMap::King,
    ];

    const fn pawn_push(color: Color) -> Self {
        match color {
            Color::White => NonSliderMap::WhitePawnPush,
            Color::Black => NonSliderMap::BlackPawnPush,
        }
    }

    const fn pawn_capture(color: Color) -> Self {
        match color {
            Color::White => NonSliderMap::WhitePawnCapture,
            Color::Black => NonSliderMap::BlackPawnCapture,
        }
    }

    fn targets(self, sq: Square) -> Bitboard {
        const KNIGHT: [(i8, i8); 8] = [(1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1), (-1, 2)];
        const KING: [(i8, i8); 8] = [(0, 1), (1, 1), (1, 0), (1, -1), (0, -1), (-1, -1), (-1, 0), (-1, 1)];

        let steps: &[(i8, i8)] = match self {
            NonSliderMap::WhitePawnPush => return pawn_push_targets(Color::White, sq),
            NonSliderMap::BlackPawnPush => return pawn_push_targets(Color::Black, sq),
            // Capture maps cover every square: they are also read backwards
            // to find pawns attacking a square.
            NonSliderMap::WhitePawnCapture => &[(-1, 1), (1, 1)],
            NonSliderMap::BlackPawnCapture => &[(-1, -1), (1, -1)],
            NonSliderMap::Knight => &KNIGHT,
            NonSliderMap::King => &KING,
        };
        steps
            .iter()
            .filter_map(|&(df, dr)| sq.offset(df, dr))
            .fold(Bitboard::EMPTY, |bb, to| bb | Bitboard::from_square(to))
    }
}

// A pawn never stands on its own back rank, so that rank gets no targets.
fn pawn_push_targets(color: Color, sq: Square) -> Bitboard {
    if sq.rank() == color.back_rank() {
        return Bitboard::EMPTY;
    }
    let dr = color.forward() / 8;
    let mut targets = Bitboard::EMPTY;
    if let Some(single) = sq.offset(0, dr) {
        targets.set(single);
        if sq.rank() == color.pawn_rank() {
            if let Some(double) = single.offset(0, dr) {
                targets.set(double);
            }
        }
    }
    targets
}

/// Every lookup table needed for move generation. Immutable once built.
pub struct AttackTables {
    non_slider: [[Bitboard; 64]; 6],
    bishop: SliderTable,
    rook: SliderTable,
}

static SHARED: OnceLock<AttackTables> = OnceLock::new();

impl AttackTables {
    /// Builds every table from scratch.
    pub fn new() -> Self {
        let mut non_slider = [[Bitboard::EMPTY; 64]; 6];
        for (i, map) in NonSliderMap::ALL.into_iter().enumerate() {
            for sq in Square::all() {
                non_slider[i][sq.index() as usize] = map.targets(sq);
            }
        }
        let tables = AttackTables {
            non_slider,
            bishop: SliderTable::build(Slider::Bishop),
            rook: SliderTable::build(Slider::Rook),
        };
        tracing::debug!(
            bishop_entries = tables.bishop.len(),
            rook_entries = tables.rook.len(),
            "attack tables built"
        );
        tables
    }

    /// The process-wide instance, built on first use.
    pub fn shared() -> &'static AttackTables {
        SHARED.get_or_init(AttackTables::new)
    }

    #[inline]
    pub fn non_slider(&self, map: NonSliderMap, sq: Square) -> Bitboard {
        self.non_slider[map as usize][sq.index() as usize]
    }

    /// Squares a pawn of `color` on `sq` may advance to, ignoring occupancy.
    #[inline]
    pub fn pawn_pushes(&self, color: Color, sq: Square) -> Bitboard {
        self.non_slider(NonSliderMap::pawn_push(color), sq)
    }

    /// Diagonal squares a pawn of `color` on `sq` captures on.
    #[inline]
    pub fn pawn_captures(&self, color: Color, sq: Square) -> Bitboard {
        self.non_slider(NonSliderMap::pawn_capture(color), sq)
    }

    #[inline]
    pub fn knight(&self, sq: Square) -> Bitboard {
        self.non_slider(NonSliderMap::Knight, sq)
    }

    #[inline]
    pub fn king(&self, sq: Square) -> Bitboard {
        self.non_slider(NonSliderMap::King, sq)
    }

    #[inline]
    pub fn bishop(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        self.bishop.attacks(sq, occupied)
    }

    #[inline]
    pub fn rook(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        self.rook.attacks(sq, occupied)
    }

    #[inline]
    pub fn queen(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        self.bishop(sq, occupied) | self.rook(sq, occupied)
    }
}

impl Default for AttackTables {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AttackTables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttackTables")
            .field("bishop_entries", &self.bishop.len())
            .field("rook_entries", &self.rook.len())
            .finish_non_exhaustive()
    }
}
