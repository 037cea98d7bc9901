//! Move representation.

use crate::{Color, File, Piece, Square};
use std::fmt;

/// The wing a castling move is made on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CastleSide {
    Queenside = 0,
    Kingside = 1,
}

impl CastleSide {
    /// Both wings, in generation order.
    pub const ALL: [CastleSide; 2] = [CastleSide::Queenside, CastleSide::Kingside];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Square the king lands on.
    #[inline]
    pub const fn king_to(self, color: Color) -> Square {
        let file = match self {
            CastleSide::Queenside => File::C,
            CastleSide::Kingside => File::G,
        };
        Square::new(file, color.back_rank())
    }

    /// Square the rook starts on.
    #[inline]
    pub const fn rook_from(self, color: Color) -> Square {
        let file = match self {
            CastleSide::Queenside => File::A,
            CastleSide::Kingside => File::H,
        };
        Square::new(file, color.back_rank())
    }

    /// Square the rook lands on (the square the king passes over).
    #[inline]
    pub const fn rook_to(self, color: Color) -> Square {
        let file = match self {
            CastleSide::Queenside => File::D,
            CastleSide::Kingside => File::F,
        };
        Square::new(file, color.back_rank())
    }
}

/// A move, described completely enough to apply and undo it without
/// consulting the position it was generated from.
///
/// En passant captures carry `en_passant = true` and no `captured` kind; the
/// captured pawn is implied. Castling moves are king moves with `castling`
/// set.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    side: Color,
    piece: Piece,
    from: Square,
    to: Square,
    captured: Option<Piece>,
    promotion: Option<Piece>,
    en_passant: bool,
    castling: Option<CastleSide>,
}

impl Move {
    /// A placeholder move; never produced by generation.
    pub const NULL: Move = Move::quiet(Color::White, Piece::Pawn, Square::A1, Square::A1);

    /// A non-capturing move of `piece` from `from` to `to`.
    #[inline]
    pub const fn quiet(side: Color, piece: Piece, from: Square, to: Square) -> Self {
        Move {
            side,
            piece,
            from,
            to,
            captured: None,
            promotion: None,
            en_passant: false,
            castling: None,
        }
    }

    /// A move that removes the opposing `captured` piece from `to`.
    #[inline]
    pub const fn capture(side: Color, piece: Piece, from: Square, to: Square, captured: Piece) -> Self {
        let mut m = Self::quiet(side, piece, from, to);
        m.captured = Some(captured);
        m
    }

    /// A pawn capture onto the en-passant target square.
    #[inline]
    pub const fn en_passant(side: Color, from: Square, to: Square) -> Self {
        let mut m = Self::quiet(side, Piece::Pawn, from, to);
        m.en_passant = true;
        m
    }

    /// A castling move for `side` on the given wing.
    #[inline]
    pub const fn castle(side: Color, wing: CastleSide) -> Self {
        let from = Square::new(File::E, side.back_rank());
        let mut m = Self::quiet(side, Piece::King, from, wing.king_to(side));
        m.castling = Some(wing);
        m
    }

    /// Returns this move with the pawn promoting to `piece` on arrival.
    #[inline]
    pub const fn with_promotion(mut self, piece: Piece) -> Self {
        self.promotion = Some(piece);
        self
    }

    #[inline]
    pub const fn side(self) -> Color {
        self.side
    }

    #[inline]
    pub const fn piece(self) -> Piece {
        self.piece
    }

    #[inline]
    pub const fn from(self) -> Square {
        self.from
    }

    #[inline]
    pub const fn to(self) -> Square {
        self.to
    }

    /// Kind removed from the destination square, if any. `None` for en passant.
    #[inline]
    pub const fn captured(self) -> Option<Piece> {
        self.captured
    }

    #[inline]
    pub const fn promotion(self) -> Option<Piece> {
        self.promotion
    }

    #[inline]
    pub const fn is_en_passant(self) -> bool {
        self.en_passant
    }

    #[inline]
    pub const fn castling(self) -> Option<CastleSide> {
        self.castling
    }

    /// True for ordinary captures and en passant.
    #[inline]
    pub const fn is_capture(self) -> bool {
        self.captured.is_some() || self.en_passant
    }

    /// True for a pawn advancing two ranks from its start rank.
    #[inline]
    pub const fn is_double_push(self) -> bool {
        matches!(self.piece, Piece::Pawn) && self.from.index().abs_diff(self.to.index()) == 16
    }

    /// The square a double push passes over, which becomes the en-passant
    /// target for the opponent's reply.
    #[inline]
    pub const fn passed_square(self) -> Option<Square> {
        if self.is_double_push() {
            Some(Square::from_index_masked((self.from.index() + self.to.index()) / 2))
        } else {
            None
        }
    }

    /// Coordinate notation, e.g. `e2e4` or `e7e8q`.
    pub fn to_uci(self) -> String {
        match self.promotion {
            Some(p) => format!("{}{}{}", self.from, self.to, p.letter()),
            None => format!("{}{}", self.from, self.to),
        }
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({} {} {}", self.side, self.piece, self.to_uci())?;
        if let Some(captured) = self.captured {
            write!(f, " x{}", captured)?;
        }
        if self.en_passant {
            write!(f, " ep")?;
        }
        if let Some(wing) = self.castling {
            write!(f, " {:?}", wing)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uci())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rank;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    #[test]
    fn quiet_move_fields() {
        let m = Move::quiet(Color::White, Piece::Knight, Square::G1, sq("f3"));
        assert_eq!(m.side(), Color::White);
        assert_eq!(m.piece(), Piece::Knight);
        assert_eq!(m.from(), Square::G1);
        assert_eq!(m.to(), sq("f3"));
        assert!(!m.is_capture());
        assert_eq!(m.promotion(), None);
        assert_eq!(m.castling(), None);
    }

    #[test]
    fn capture_and_en_passant_flags() {
        let c = Move::capture(Color::White, Piece::Pawn, sq("e4"), sq("d5"), Piece::Pawn);
        assert!(c.is_capture());
        assert!(!c.is_en_passant());

        let ep = Move::en_passant(Color::White, sq("e5"), sq("d6"));
        assert!(ep.is_capture());
        assert!(ep.is_en_passant());
        assert_eq!(ep.captured(), None);
    }

    #[test]
    fn double_push_passed_square() {
        let white = Move::quiet(Color::White, Piece::Pawn, sq("e2"), sq("e4"));
        assert!(white.is_double_push());
        assert_eq!(white.passed_square(), Some(sq("e3")));

        let black = Move::quiet(Color::Black, Piece::Pawn, sq("d7"), sq("d5"));
        assert_eq!(black.passed_square(), Some(sq("d6")));

        let single = Move::quiet(Color::White, Piece::Pawn, sq("e2"), sq("e3"));
        assert!(!single.is_double_push());

        let rook = Move::quiet(Color::White, Piece::Rook, Square::A1, sq("a3"));
        assert!(!rook.is_double_push());
    }

    #[test]
    fn castle_geometry() {
        let m = Move::castle(Color::Black, CastleSide::Kingside);
        assert_eq!(m.from(), Square::E8);
        assert_eq!(m.to(), Square::G8);
        assert_eq!(m.piece(), Piece::King);
        assert_eq!(CastleSide::Queenside.rook_from(Color::White), Square::A1);
        assert_eq!(CastleSide::Queenside.rook_to(Color::White), Square::D1);
        assert_eq!(CastleSide::Kingside.rook_to(Color::Black), Square::F8);
        assert_eq!(CastleSide::Queenside.king_to(Color::Black).rank(), Rank::R8);
    }

    #[test]
    fn uci_text() {
        let m = Move::quiet(Color::White, Piece::Pawn, sq("e2"), sq("e4"));
        assert_eq!(m.to_uci(), "e2e4");
        let promo = Move::quiet(Color::White, Piece::Pawn, sq("e7"), sq("e8")).with_promotion(Piece::Queen);
        assert_eq!(promo.to_string(), "e7e8q");
        assert_eq!(format!("{:?}", promo), "Move(white pawn e7e8q)");
    }

    #[test]
    fn promotions_differ_only_in_kind() {
        let base = Move::quiet(Color::Black, Piece::Pawn, sq("b2"), sq("b1"));
        let n = base.with_promotion(Piece::Knight);
        let q = base.with_promotion(Piece::Queen);
        assert_ne!(n, q);
        assert_eq!(n.from(), q.from());
        assert_eq!(n.to(), q.to());
    }
}
