//! The mutable board state.
//!
//! A [`Position`] keeps the same information twice: bitboards per piece kind
//! and per side for set arithmetic, and a square-indexed mailbox for O(1)
//! "what stands here" queries. Every mutation goes through `put` and
//! `remove`, which update both views and the signatures together.
//!
//! Moves are applied in place. Each applied move pushes an undo record, so a
//! search can walk down and back up the tree on a single position.

use crate::attacks::AttackTables;
use crate::error::{CastlingBlocked, IllegalMove, PositionError};
use crate::zobrist::ZOBRIST;
use crate::{Bitboard, CastlingRights};
use chess_core::{CastleSide, Color, Fen, File, Move, Piece, Rank, Square};
use std::fmt;

/// State that a move overwrites and that cannot be rederived when taking it
/// back.
#[derive(Debug, Clone, Copy)]
struct Undo {
    /// `None` for a null move.
    mv: Option<Move>,
    castling: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
    signature: u64,
    pawn_signature: u64,
}

#[derive(Clone)]
pub struct Position {
    tables: &'static AttackTables,
    pieces: [Bitboard; 6],
    sides: [Bitboard; 2],
    mailbox: [Option<(Piece, Color)>; 64],
    side_to_move: Color,
    castling: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
    signature: u64,
    pawn_signature: u64,
    history: Vec<Undo>,
}

impl Position {
    /// A board with no pieces, White to move.
    pub fn empty() -> Self {
        Position {
            tables: AttackTables::shared(),
            pieces: [Bitboard::EMPTY; 6],
            sides: [Bitboard::EMPTY; 2],
            mailbox: [None; 64],
            side_to_move: Color::White,
            castling: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            signature: 0,
            pawn_signature: 0,
            history: Vec::new(),
        }
    }

    /// The standard starting position.
    pub fn startpos() -> Self {
        Self::from_fen(Fen::STARTPOS).expect("start position FEN is valid")
    }

    /// Builds a position from FEN text.
    ///
    /// Besides FEN syntax this requires one king per side, no pawns on the
    /// first or eighth rank, an en-passant target that an enemy pawn really
    /// just passed over, and the side that just moved not being in check.
    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        let fen = Fen::parse(fen)?;
        let mut pos = Position::empty();

        for sq in Square::all() {
            if let Some((piece, color)) = fen.placement[sq.index() as usize] {
                if piece == Piece::Pawn && matches!(sq.rank(), Rank::R1 | Rank::R8) {
                    return Err(PositionError::PawnOnBackRank(sq));
                }
                pos.put(piece, color, sq);
            }
        }
        for color in Color::ALL {
            match pos.pieces(Piece::King, Some(color)).count() {
                0 => return Err(PositionError::MissingKing(color)),
                1 => {}
                _ => return Err(PositionError::MultipleKings(color)),
            }
        }

        if let Some(target) = fen.en_passant {
            if !pos.passed_by_enemy_pawn(fen.side_to_move, target) {
                return Err(PositionError::InvalidEnPassant(target));
            }
        }

        pos.side_to_move = fen.side_to_move;
        pos.castling = CastlingRights::from_flags(fen.castling);
        pos.en_passant = fen.en_passant;
        pos.halfmove_clock = fen.halfmove_clock;
        pos.fullmove_number = fen.fullmove_number;
        pos.signature = pos.compute_signature();

        if pos.in_check(pos.side_to_move.opposite()) {
            return Err(PositionError::OpponentInCheck);
        }
        Ok(pos)
    }

    // The target must be empty, on the rank behind the enemy's double-push
    // rank, with the enemy pawn that made the push right in front of it.
    fn passed_by_enemy_pawn(&self, mover: Color, target: Square) -> bool {
        let enemy = mover.opposite();
        let passed_rank = match mover {
            Color::White => Rank::R6,
            Color::Black => Rank::R3,
        };
        target.rank() == passed_rank
            && self.piece_at(target).is_none()
            && target.offset(0, enemy.forward() / 8).and_then(|pawn| self.piece_at(pawn)) == Some((Piece::Pawn, enemy))
    }

    pub fn to_fen(&self) -> String {
        Fen {
            placement: self.mailbox,
            side_to_move: self.side_to_move,
            castling: self.castling.to_flags(),
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        }
        .to_string()
    }

    #[inline]
    pub fn tables(&self) -> &'static AttackTables {
        self.tables
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Incremental signature of the whole position.
    #[inline]
    pub fn signature(&self) -> u64 {
        self.signature
    }

    /// Incremental signature of the pawns alone.
    #[inline]
    pub fn pawn_signature(&self) -> u64 {
        self.pawn_signature
    }

    /// Number of moves (including null moves) that can be taken back.
    #[inline]
    pub fn ply_count(&self) -> usize {
        self.history.len()
    }

    /// Occupant of `sq`, from the mailbox.
    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<(Piece, Color)> {
        self.mailbox[sq.index() as usize]
    }

    /// Squares holding `piece`, optionally restricted to one side.
    #[inline]
    pub fn pieces(&self, piece: Piece, side: Option<Color>) -> Bitboard {
        let all = self.pieces[piece.index()];
        match side {
            Some(color) => all & self.sides[color.index()],
            None => all,
        }
    }

    #[inline]
    pub fn side_pieces(&self, color: Color) -> Bitboard {
        self.sides[color.index()]
    }

    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.sides[0] | self.sides[1]
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces(Piece::King, Some(color)).lsb()
    }

    /// Squares a `piece` of `side` standing on `sq` could move to, before
    /// removing squares held by its own side.
    ///
    /// Pawns are filtered by occupancy: pushes only onto empty squares (a
    /// double push also needs the square in between empty), diagonals only
    /// onto enemy pieces. En passant is not included.
    pub fn attack_mask(&self, side: Color, sq: Square, piece: Piece) -> Bitboard {
        let occupied = self.occupied();
        match piece {
            Piece::Pawn => {
                let blocked_ahead = sq
                    .offset(0, side.forward() / 8)
                    .map_or(true, |ahead| occupied.contains(ahead));
                let pushes = if blocked_ahead {
                    Bitboard::EMPTY
                } else {
                    self.tables.pawn_pushes(side, sq) & !occupied
                };
                let captures = self.tables.pawn_captures(side, sq) & self.sides[side.opposite().index()];
                pushes | captures
            }
            Piece::Knight => self.tables.knight(sq),
            Piece::Bishop => self.tables.bishop(sq, occupied),
            Piece::Rook => self.tables.rook(sq, occupied),
            Piece::Queen => self.tables.queen(sq, occupied),
            Piece::King => self.tables.king(sq),
        }
    }

    /// Pieces of side `by` that attack `sq`.
    pub fn attackers_to(&self, sq: Square, by: Color) -> Bitboard {
        let occupied = self.occupied();
        let t = self.tables;
        let diagonal = self.pieces(Piece::Bishop, Some(by)) | self.pieces(Piece::Queen, Some(by));
        let straight = self.pieces(Piece::Rook, Some(by)) | self.pieces(Piece::Queen, Some(by));

        // A pawn of `by` attacks `sq` exactly when a pawn of the other side
        // on `sq` would attack it.
        (t.pawn_captures(by.opposite(), sq) & self.pieces(Piece::Pawn, Some(by)))
            | (t.knight(sq) & self.pieces(Piece::Knight, Some(by)))
            | (t.king(sq) & self.pieces(Piece::King, Some(by)))
            | (t.bishop(sq, occupied) & diagonal)
            | (t.rook(sq, occupied) & straight)
    }

    #[inline]
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        self.attackers_to(sq, by).is_not_empty()
    }

    /// True if `color`'s king is attacked. A side without a king is never in
    /// check.
    pub fn in_check(&self, color: Color) -> bool {
        self.king_square(color)
            .is_some_and(|king| self.is_square_attacked(king, color.opposite()))
    }

    /// Why `side` may not castle on `wing` right now, or `None` if it may
    /// (landing in check is caught when the move is applied).
    pub fn castling_obstacle(&self, side: Color, wing: CastleSide) -> Option<CastlingBlocked> {
        let king_from = Square::new(File::E, side.back_rank());
        let rook_from = wing.rook_from(side);
        if !self.castling.has(side, wing)
            || self.piece_at(king_from) != Some((Piece::King, side))
            || self.piece_at(rook_from) != Some((Piece::Rook, side))
        {
            return Some(CastlingBlocked::NoRight);
        }

        let (low, high) = if rook_from < king_from {
            (rook_from.index(), king_from.index())
        } else {
            (king_from.index(), rook_from.index())
        };
        if ((low + 1)..high).filter_map(Square::from_index).any(|sq| self.piece_at(sq).is_some()) {
            return Some(CastlingBlocked::PathBlocked);
        }

        let enemy = side.opposite();
        if self.is_square_attacked(king_from, enemy) {
            return Some(CastlingBlocked::KingInCheck);
        }
        if self.is_square_attacked(wing.rook_to(side), enemy) {
            return Some(CastlingBlocked::TransitAttacked);
        }
        None
    }

    /// Applies `mv` in place.
    ///
    /// The move is first checked against the board (right side, right
    /// piece, reachable destination, consistent capture and promotion, legal
    /// castling or en passant). It is then made, and if it leaves the
    /// mover's king attacked it is taken back and
    /// [`IllegalMove::LeavesKingInCheck`] is returned. On any error the
    /// position is unchanged.
    pub fn apply_move(&mut self, mv: Move) -> Result<(), IllegalMove> {
        if let Err(reason) = self.check_move(mv) {
            tracing::trace!(%mv, %reason, "move rejected");
            return Err(reason);
        }
        self.make(mv);
        debug_assert_eq!(self.validate(), Ok(()));
        if self.in_check(mv.side()) {
            self.undo_move();
            tracing::trace!(%mv, reason = %IllegalMove::LeavesKingInCheck, "move rejected");
            return Err(IllegalMove::LeavesKingInCheck);
        }
        Ok(())
    }

    fn check_move(&self, mv: Move) -> Result<(), IllegalMove> {
        let side = mv.side();
        if side != self.side_to_move {
            return Err(IllegalMove::NotSideToMove(side));
        }
        match self.piece_at(mv.from()) {
            None => return Err(IllegalMove::EmptyOrigin(mv.from())),
            Some((found, found_side)) if found != mv.piece() || found_side != side => {
                return Err(IllegalMove::PieceMismatch {
                    square: mv.from(),
                    expected: mv.piece(),
                    expected_side: side,
                    found,
                    found_side,
                })
            }
            Some(_) => {}
        }

        if let Some(wing) = mv.castling() {
            if mv != Move::castle(side, wing) {
                return Err(IllegalMove::Unreachable {
                    piece: mv.piece(),
                    from: mv.from(),
                    to: mv.to(),
                });
            }
            return match self.castling_obstacle(side, wing) {
                Some(reason) => Err(IllegalMove::Castling { side, wing, reason }),
                None => Ok(()),
            };
        }

        let target = self.piece_at(mv.to());
        if matches!(target, Some((_, owner)) if owner == side) {
            return Err(IllegalMove::OwnPieceOnDestination(mv.to()));
        }

        if mv.is_en_passant() {
            let valid = mv.piece() == Piece::Pawn
                && mv.captured().is_none()
                && self.en_passant == Some(mv.to())
                && target.is_none()
                && self.tables.pawn_captures(side, mv.from()).contains(mv.to())
                && self.piece_at(Self::en_passant_victim(mv)) == Some((Piece::Pawn, side.opposite()));
            if !valid {
                return Err(IllegalMove::InvalidEnPassant(mv.to()));
            }
        } else {
            let actual = target.map(|(piece, _)| piece);
            if mv.captured() != actual {
                return Err(IllegalMove::CaptureMismatch {
                    square: mv.to(),
                    claimed: mv.captured(),
                    actual,
                });
            }
            if !self.attack_mask(side, mv.from(), mv.piece()).contains(mv.to()) {
                return Err(IllegalMove::Unreachable {
                    piece: mv.piece(),
                    from: mv.from(),
                    to: mv.to(),
                });
            }
        }

        let must_promote = mv.piece() == Piece::Pawn && mv.to().rank() == side.promotion_rank();
        let promotion_ok = match mv.promotion() {
            Some(kind) => must_promote && kind.is_promotable(),
            None => !must_promote,
        };
        if !promotion_ok {
            return Err(IllegalMove::InvalidPromotion {
                to: mv.to(),
                promotion: mv.promotion(),
            });
        }
        Ok(())
    }

    fn push_undo(&mut self, mv: Option<Move>) {
        self.history.push(Undo {
            mv,
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            signature: self.signature,
            pawn_signature: self.pawn_signature,
        });
    }

    // Makes a move that has passed `check_move`.
    fn make(&mut self, mv: Move) {
        self.push_undo(Some(mv));
        let side = mv.side();

        self.signature ^= ZOBRIST.castling(self.castling) ^ ZOBRIST.en_passant(self.en_passant);

        if mv.is_en_passant() {
            self.remove(Self::en_passant_victim(mv));
        } else if mv.captured().is_some() {
            self.remove(mv.to());
        }
        self.remove(mv.from());
        self.put(mv.promotion().unwrap_or(mv.piece()), side, mv.to());

        if let Some(wing) = mv.castling() {
            self.remove(wing.rook_from(side));
            self.put(Piece::Rook, side, wing.rook_to(side));
        }

        self.castling.touch(mv.from());
        self.castling.touch(mv.to());
        self.en_passant = mv.passed_square();

        if mv.piece() == Piece::Pawn || mv.is_capture() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if side == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }

        self.side_to_move = side.opposite();
        self.signature ^= ZOBRIST.black_to_move() ^ ZOBRIST.castling(self.castling) ^ ZOBRIST.en_passant(self.en_passant);
    }

    // The pawn taken en passant stands beside the capturing pawn, on the
    // destination file.
    fn en_passant_victim(mv: Move) -> Square {
        mv.to().with_rank(mv.from().rank())
    }

    /// Takes back the last move made with [`Position::apply_move`] and
    /// returns it. Returns `None`, changing nothing, if there is no such
    /// move or the last entry is a null move.
    pub fn undo_move(&mut self) -> Option<Move> {
        let mv = self.history.last()?.mv?;
        let undo = self.history.pop()?;
        let side = mv.side();
        let enemy = side.opposite();

        if let Some(wing) = mv.castling() {
            self.remove(wing.rook_to(side));
            self.put(Piece::Rook, side, wing.rook_from(side));
        }
        self.remove(mv.to());
        self.put(mv.piece(), side, mv.from());
        if mv.is_en_passant() {
            self.put(Piece::Pawn, enemy, Self::en_passant_victim(mv));
        } else if let Some(captured) = mv.captured() {
            self.put(captured, enemy, mv.to());
        }

        self.side_to_move = side;
        self.restore(undo);
        debug_assert_eq!(self.validate(), Ok(()));
        Some(mv)
    }

    /// Passes the turn without moving. Clears the en-passant target.
    pub fn apply_null_move(&mut self) {
        self.push_undo(None);
        self.signature ^= ZOBRIST.en_passant(self.en_passant) ^ ZOBRIST.black_to_move();
        self.en_passant = None;
        self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        if self.side_to_move == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }
        self.side_to_move = self.side_to_move.opposite();
    }

    /// Takes back a null move. Returns false, changing nothing, if the last
    /// history entry is not a null move.
    pub fn undo_null_move(&mut self) -> bool {
        match self.history.last() {
            Some(undo) if undo.mv.is_none() => {}
            _ => return false,
        }
        if let Some(undo) = self.history.pop() {
            self.side_to_move = self.side_to_move.opposite();
            self.restore(undo);
        }
        true
    }

    fn restore(&mut self, undo: Undo) {
        self.castling = undo.castling;
        self.en_passant = undo.en_passant;
        self.halfmove_clock = undo.halfmove_clock;
        self.fullmove_number = undo.fullmove_number;
        self.signature = undo.signature;
        self.pawn_signature = undo.pawn_signature;
    }

    fn put(&mut self, piece: Piece, color: Color, sq: Square) {
        let slot = &mut self.mailbox[sq.index() as usize];
        debug_assert!(slot.is_none(), "put on occupied square {}", sq);
        *slot = Some((piece, color));
        self.pieces[piece.index()].set(sq);
        self.sides[color.index()].set(sq);
        let key = ZOBRIST.piece(piece, color, sq);
        self.signature ^= key;
        if piece == Piece::Pawn {
            self.pawn_signature ^= key;
        }
    }

    fn remove(&mut self, sq: Square) {
        // An empty square here means the mailbox and the move disagree, which
        // check_move rules out.
        let Some((piece, color)) = self.mailbox[sq.index() as usize].take() else {
            panic!("remove from empty square {}", sq);
        };
        self.pieces[piece.index()].clear(sq);
        self.sides[color.index()].clear(sq);
        let key = ZOBRIST.piece(piece, color, sq);
        self.signature ^= key;
        if piece == Piece::Pawn {
            self.pawn_signature ^= key;
        }
    }

    /// Signature recomputed from scratch.
    pub fn compute_signature(&self) -> u64 {
        let mut signature = Square::all()
            .filter_map(|sq| self.piece_at(sq).map(|(piece, color)| ZOBRIST.piece(piece, color, sq)))
            .fold(0, |acc, key| acc ^ key);
        if self.side_to_move == Color::Black {
            signature ^= ZOBRIST.black_to_move();
        }
        signature ^ ZOBRIST.castling(self.castling) ^ ZOBRIST.en_passant(self.en_passant)
    }

    /// Pawn signature recomputed from scratch.
    pub fn compute_pawn_signature(&self) -> u64 {
        Color::ALL
            .into_iter()
            .flat_map(|color| {
                self.pieces(Piece::Pawn, Some(color))
                    .into_iter()
                    .map(move |sq| ZOBRIST.piece(Piece::Pawn, color, sq))
            })
            .fold(0, |acc, key| acc ^ key)
    }

    /// Checks that the two board views and both signatures agree.
    pub fn validate(&self) -> Result<(), PositionError> {
        let inconsistent = |msg: String| -> Result<(), PositionError> { Err(PositionError::Inconsistent(msg)) };

        if (self.sides[0] & self.sides[1]).is_not_empty() {
            return inconsistent("side boards overlap".into());
        }
        let mut union = Bitboard::EMPTY;
        for piece in Piece::ALL {
            let board = self.pieces[piece.index()];
            if (union & board).is_not_empty() {
                return inconsistent(format!("{} board overlaps another kind", piece));
            }
            union |= board;
        }
        if union != self.occupied() {
            return inconsistent("piece boards and side boards disagree".into());
        }
        for sq in Square::all() {
            let from_boards = Piece::ALL.into_iter().find(|p| self.pieces[p.index()].contains(sq)).and_then(|p| {
                Color::ALL
                    .into_iter()
                    .find(|c| self.sides[c.index()].contains(sq))
                    .map(|c| (p, c))
            });
            if from_boards != self.piece_at(sq) {
                return inconsistent(format!("mailbox disagrees with bitboards on {}", sq));
            }
        }
        if self.signature != self.compute_signature() {
            return inconsistent("stale signature".into());
        }
        if self.pawn_signature != self.compute_pawn_signature() {
            return inconsistent("stale pawn signature".into());
        }
        Ok(())
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::startpos()
    }
}

// History is how we got here, not where we are.
impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.pieces == other.pieces
            && self.sides == other.sides
            && self.mailbox == other.mailbox
            && self.side_to_move == other.side_to_move
            && self.castling == other.castling
            && self.en_passant == other.en_passant
            && self.halfmove_clock == other.halfmove_clock
            && self.fullmove_number == other.fullmove_number
            && self.signature == other.signature
            && self.pawn_signature == other.pawn_signature
    }
}

impl Eq for Position {}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Position")
            .field("fen", &self.to_fen())
            .field("signature", &format_args!("{:#018x}", self.signature))
            .field("ply_count", &self.history.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    #[test]
    fn startpos_fen_roundtrip() {
        assert_eq!(Position::startpos().to_fen(), Fen::STARTPOS);
        assert_eq!(Position::default(), Position::startpos());
    }

    #[test]
    fn custom_fen_roundtrip() {
        for fen in [
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
            "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w - - 0 1",
        ] {
            assert_eq!(pos(fen).to_fen(), fen);
        }
    }

    #[test]
    fn rejects_structurally_broken_positions() {
        assert_eq!(
            Position::from_fen("8/8/8/8/8/8/8/K7 w - - 0 1").unwrap_err(),
            PositionError::MissingKing(Color::Black)
        );
        assert_eq!(
            Position::from_fen("k6k/8/8/8/8/8/8/K7 w - - 0 1").unwrap_err(),
            PositionError::MultipleKings(Color::Black)
        );
        assert_eq!(
            Position::from_fen("k7/8/8/8/8/8/8/K6P w - - 0 1").unwrap_err(),
            PositionError::PawnOnBackRank(Square::H1)
        );
        assert_eq!(
            Position::from_fen("k7/8/8/8/8/8/8/K6r b - - 0 1").unwrap_err(),
            PositionError::OpponentInCheck
        );
        assert!(matches!(Position::from_fen("garbage"), Err(PositionError::Fen(_))));
    }

    #[test]
    fn queries_on_startpos() {
        let p = Position::startpos();
        assert_eq!(p.piece_at(Square::E1), Some((Piece::King, Color::White)));
        assert_eq!(p.piece_at(Square::E8), Some((Piece::King, Color::Black)));
        assert_eq!(p.piece_at(sq("e4")), None);
        assert_eq!(p.occupied().count(), 32);
        assert_eq!(p.pieces(Piece::Pawn, Some(Color::White)).count(), 8);
        assert_eq!(p.pieces(Piece::Pawn, None).count(), 16);
        assert_eq!(p.side_pieces(Color::Black).count(), 16);
        assert_eq!(p.king_square(Color::White), Some(Square::E1));
        assert!(!p.in_check(Color::White));
        assert!(p.validate().is_ok());
    }

    #[test]
    fn pawn_attack_mask_filters_by_occupancy() {
        let p = pos("4k3/8/8/8/8/3p4/3PP3/4K3 w - - 0 1");
        // d2 is blocked by d3; e2 can single or double push.
        assert_eq!(p.attack_mask(Color::White, sq("d2"), Piece::Pawn), Bitboard::EMPTY);
        let e2 = p.attack_mask(Color::White, sq("e2"), Piece::Pawn);
        assert_eq!(e2, Bitboard::from_square(sq("e3")) | Bitboard::from_square(sq("e4")) | Bitboard::from_square(sq("d3")));
    }

    #[test]
    fn double_push_needs_both_squares_empty() {
        let p = pos("4k3/8/8/8/8/4n3/4P3/4K3 w - - 0 1");
        assert!(p.attack_mask(Color::White, sq("e2"), Piece::Pawn).is_empty());
        let p = pos("4k3/8/8/8/4n3/8/4P3/4K3 w - - 0 1");
        assert_eq!(p.attack_mask(Color::White, sq("e2"), Piece::Pawn), Bitboard::from_square(sq("e3")));
    }

    #[test]
    fn queen_mask_is_union_of_slider_masks() {
        let p = pos("4k3/8/8/3p4/8/1P1Q4/8/4K3 w - - 0 1");
        let d3 = sq("d3");
        assert_eq!(
            p.attack_mask(Color::White, d3, Piece::Queen),
            p.attack_mask(Color::White, d3, Piece::Bishop) | p.attack_mask(Color::White, d3, Piece::Rook)
        );
    }

    #[test]
    fn attackers_to_finds_every_kind() {
        let p = pos("4k3/8/8/2n5/3r4/4P3/8/1B2K3 w - - 0 1");
        let d4 = sq("d4");
        assert_eq!(p.attackers_to(d4, Color::White), Bitboard::from_square(sq("e3")));
        assert!(p.attackers_to(sq("e3"), Color::Black).is_empty());
        assert!(p.attackers_to(sq("d3"), Color::Black).contains(sq("c5")));
        assert!(p.attackers_to(sq("d1"), Color::Black).contains(d4));
        assert!(p.attackers_to(sq("e4"), Color::White).contains(Square::B1));
        assert!(p.is_square_attacked(sq("f2"), Color::White));
    }

    #[test]
    fn apply_and_undo_simple_move() {
        let mut p = Position::startpos();
        let before = p.clone();
        let e4 = Move::quiet(Color::White, Piece::Pawn, sq("e2"), sq("e4"));
        p.apply_move(e4).unwrap();
        assert_eq!(p.side_to_move(), Color::Black);
        assert_eq!(p.en_passant(), Some(sq("e3")));
        assert_eq!(p.piece_at(sq("e4")), Some((Piece::Pawn, Color::White)));
        assert_eq!(p.to_fen(), "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1");
        assert_eq!(p.signature(), p.compute_signature());
        assert!(p.validate().is_ok());

        assert_eq!(p.undo_move(), Some(e4));
        assert_eq!(p, before);
        assert_eq!(p.undo_move(), None);
    }

    #[test]
    fn en_passant_target_lasts_one_move() {
        let mut p = Position::startpos();
        p.apply_move(Move::quiet(Color::White, Piece::Pawn, sq("e2"), sq("e4"))).unwrap();
        p.apply_move(Move::quiet(Color::Black, Piece::Knight, Square::G8, sq("f6"))).unwrap();
        assert_eq!(p.en_passant(), None);
    }

    #[test]
    fn en_passant_capture_removes_passed_pawn() {
        let mut p = pos("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2");
        let before = p.clone();
        let ep = Move::en_passant(Color::White, sq("e5"), sq("d6"));
        p.apply_move(ep).unwrap();
        assert_eq!(p.piece_at(sq("d5")), None);
        assert_eq!(p.piece_at(sq("d6")), Some((Piece::Pawn, Color::White)));
        assert_eq!(p.pawn_signature(), p.compute_pawn_signature());
        p.undo_move();
        assert_eq!(p, before);
    }

    #[test]
    fn en_passant_without_target_is_rejected() {
        let mut p = pos("4k3/8/8/3pP3/8/8/8/4K3 w - - 0 2");
        let ep = Move::en_passant(Color::White, sq("e5"), sq("d6"));
        assert_eq!(p.apply_move(ep), Err(IllegalMove::InvalidEnPassant(sq("d6"))));
        assert_eq!(p.ply_count(), 0);
    }

    #[test]
    fn fen_en_passant_target_must_follow_a_double_push() {
        for (fen, target) in [
            // Wrong rank for the side to move, and occupied.
            ("4k3/8/8/8/8/3p4/4P3/4K3 w - d3 0 1", "d3"),
            // No pawn in front of the target.
            ("4k3/8/8/4P3/8/8/8/4K3 w - d6 0 1", "d6"),
            ("4k3/8/8/8/3p4/8/8/4K3 b - e3 0 1", "e3"),
            // Target square occupied.
            ("4k3/8/3p4/3p4/8/8/8/4K3 w - d6 0 1", "d6"),
            // The pawn in front belongs to the mover.
            ("4k3/8/8/3P4/8/8/8/4K3 w - d6 0 1", "d6"),
        ] {
            assert_eq!(
                Position::from_fen(fen).unwrap_err(),
                PositionError::InvalidEnPassant(sq(target)),
                "{fen}"
            );
        }
    }

    #[test]
    fn accepted_en_passant_targets_yield_applicable_moves() {
        for fen in [
            "4k3/8/8/3Pp3/8/8/8/4K3 w - e6 0 1",
            "4k3/8/8/8/3pP3/8/8/4K3 b - e3 0 1",
        ] {
            let mut p = pos(fen);
            let side = p.side_to_move();
            let moves = crate::movegen::generate_moves(&p, side);
            let ep: Vec<Move> = moves.as_slice().iter().copied().filter(|mv| mv.is_en_passant()).collect();
            assert_eq!(ep.len(), 1, "{fen}");
            p.apply_move(ep[0]).unwrap();
            assert_eq!(p.signature(), p.compute_signature());
        }
    }

    #[test]
    fn promotion_replaces_pawn() {
        let mut p = pos("3rk3/2P5/8/8/8/8/8/4K3 w - - 0 1");
        let mv = Move::capture(Color::White, Piece::Pawn, sq("c7"), sq("d8"), Piece::Rook).with_promotion(Piece::Queen);
        p.apply_move(mv).unwrap();
        assert_eq!(p.piece_at(sq("d8")), Some((Piece::Queen, Color::White)));
        assert!(p.pieces(Piece::Pawn, None).is_empty());
        assert!(p.in_check(Color::Black));
        assert!(p.validate().is_ok());
    }

    #[test]
    fn castling_moves_both_pieces_and_clears_rights() {
        let mut p = pos("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let before = p.clone();
        p.apply_move(Move::castle(Color::White, CastleSide::Kingside)).unwrap();
        assert_eq!(p.piece_at(Square::G1), Some((Piece::King, Color::White)));
        assert_eq!(p.piece_at(Square::F1), Some((Piece::Rook, Color::White)));
        assert_eq!(p.piece_at(Square::H1), None);
        assert!(!p.castling().has(Color::White, CastleSide::Queenside));
        assert!(p.castling().has(Color::Black, CastleSide::Kingside));
        assert_eq!(p.signature(), p.compute_signature());

        p.apply_move(Move::castle(Color::Black, CastleSide::Queenside)).unwrap();
        assert_eq!(p.piece_at(Square::C8), Some((Piece::King, Color::Black)));
        assert_eq!(p.piece_at(Square::D8), Some((Piece::Rook, Color::Black)));
        assert!(p.castling().is_empty());

        p.undo_move();
        p.undo_move();
        assert_eq!(p, before);
    }

    #[test]
    fn capturing_a_home_rook_removes_the_right() {
        let mut p = pos("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        p.apply_move(Move::capture(Color::White, Piece::Rook, Square::A1, Square::A8, Piece::Rook)).unwrap();
        assert!(!p.castling().has(Color::Black, CastleSide::Queenside));
        assert!(!p.castling().has(Color::White, CastleSide::Queenside));
        assert!(p.castling().has(Color::Black, CastleSide::Kingside));
    }

    #[test]
    fn castling_obstacles() {
        let blocked = pos("r3k2r/8/8/8/8/8/8/RN2K1NR w KQkq - 0 1");
        assert_eq!(blocked.castling_obstacle(Color::White, CastleSide::Kingside), Some(CastlingBlocked::PathBlocked));
        assert_eq!(blocked.castling_obstacle(Color::White, CastleSide::Queenside), Some(CastlingBlocked::PathBlocked));

        let checked = pos("4k3/8/8/8/8/8/4r3/R3K2R w KQ - 0 1");
        assert_eq!(checked.castling_obstacle(Color::White, CastleSide::Kingside), Some(CastlingBlocked::KingInCheck));

        let transit = pos("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert_eq!(transit.castling_obstacle(Color::White, CastleSide::Kingside), Some(CastlingBlocked::TransitAttacked));
        assert_eq!(transit.castling_obstacle(Color::White, CastleSide::Queenside), None);

        let no_right = pos("4k3/8/8/8/8/8/8/R3K2R w K - 0 1");
        assert_eq!(no_right.castling_obstacle(Color::White, CastleSide::Queenside), Some(CastlingBlocked::NoRight));

        // b1 may be attacked: only the king's path matters.
        let b1_attacked = pos("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1");
        assert_eq!(b1_attacked.castling_obstacle(Color::White, CastleSide::Queenside), None);
    }

    #[test]
    fn castling_into_check_is_rejected() {
        let mut p = pos("4k1r1/8/8/8/8/8/8/4K2R w K - 0 1");
        let before = p.clone();
        assert_eq!(
            p.apply_move(Move::castle(Color::White, CastleSide::Kingside)),
            Err(IllegalMove::LeavesKingInCheck)
        );
        assert_eq!(p, before);
    }

    #[test]
    fn self_check_is_rejected_and_reverted() {
        // The e2 bishop is pinned against the king by the e8 rook.
        let mut p = pos("k3r3/8/8/8/8/8/4B3/4K3 w - - 0 1");
        let before = p.clone();
        let mv = Move::quiet(Color::White, Piece::Bishop, sq("e2"), sq("d3"));
        assert_eq!(p.apply_move(mv), Err(IllegalMove::LeavesKingInCheck));
        assert_eq!(p, before);
        assert_eq!(p.ply_count(), 0);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn inconsistent_moves_are_rejected() {
        let mut p = Position::startpos();
        let before = p.clone();
        let cases = [
            (Move::quiet(Color::White, Piece::Pawn, sq("e3"), sq("e4")), IllegalMove::EmptyOrigin(sq("e3"))),
            (
                Move::quiet(Color::Black, Piece::Pawn, sq("e7"), sq("e5")),
                IllegalMove::NotSideToMove(Color::Black),
            ),
            (
                Move::quiet(Color::White, Piece::Bishop, Square::G1, sq("f3")),
                IllegalMove::PieceMismatch {
                    square: Square::G1,
                    expected: Piece::Bishop,
                    expected_side: Color::White,
                    found: Piece::Knight,
                    found_side: Color::White,
                },
            ),
            (
                Move::quiet(Color::White, Piece::Rook, Square::A1, sq("a2")),
                IllegalMove::OwnPieceOnDestination(sq("a2")),
            ),
            (
                Move::quiet(Color::White, Piece::Pawn, sq("e2"), sq("e5")),
                IllegalMove::Unreachable {
                    piece: Piece::Pawn,
                    from: sq("e2"),
                    to: sq("e5"),
                },
            ),
            (
                Move::capture(Color::White, Piece::Pawn, sq("e2"), sq("e3"), Piece::Pawn),
                IllegalMove::CaptureMismatch {
                    square: sq("e3"),
                    claimed: Some(Piece::Pawn),
                    actual: None,
                },
            ),
            (
                Move::en_passant(Color::White, sq("e2"), sq("d3")),
                IllegalMove::InvalidEnPassant(sq("d3")),
            ),
            (
                Move::castle(Color::White, CastleSide::Kingside),
                IllegalMove::Castling {
                    side: Color::White,
                    wing: CastleSide::Kingside,
                    reason: CastlingBlocked::PathBlocked,
                },
            ),
            (
                Move::quiet(Color::White, Piece::Pawn, sq("e2"), sq("e3")).with_promotion(Piece::Queen),
                IllegalMove::InvalidPromotion {
                    to: sq("e3"),
                    promotion: Some(Piece::Queen),
                },
            ),
        ];
        for (mv, expected) in cases {
            assert_eq!(p.apply_move(mv), Err(expected), "{:?}", mv);
            assert_eq!(p, before);
        }
    }

    #[test]
    fn promotion_is_required_on_last_rank() {
        let mut p = pos("4k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let bare = Move::quiet(Color::White, Piece::Pawn, sq("a7"), sq("a8"));
        assert!(matches!(p.apply_move(bare), Err(IllegalMove::InvalidPromotion { .. })));
        assert!(matches!(
            p.apply_move(bare.with_promotion(Piece::King)),
            Err(IllegalMove::InvalidPromotion { .. })
        ));
        assert!(p.apply_move(bare.with_promotion(Piece::Knight)).is_ok());
    }

    #[test]
    fn null_move_roundtrip() {
        let mut p = pos("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1");
        let before = p.clone();
        p.apply_null_move();
        assert_eq!(p.side_to_move(), Color::White);
        assert_eq!(p.en_passant(), None);
        assert_eq!(p.signature(), p.compute_signature());
        assert_eq!(p.undo_move(), None, "undo_move leaves null moves alone");
        assert!(p.undo_null_move());
        assert_eq!(p, before);
        assert!(!p.undo_null_move());
    }

    #[test]
    fn clocks_advance() {
        let mut p = Position::startpos();
        p.apply_move(Move::quiet(Color::White, Piece::Knight, Square::G1, sq("f3"))).unwrap();
        assert_eq!(p.halfmove_clock(), 1);
        assert_eq!(p.fullmove_number(), 1);
        p.apply_move(Move::quiet(Color::Black, Piece::Pawn, sq("e7"), sq("e5"))).unwrap();
        assert_eq!(p.halfmove_clock(), 0);
        assert_eq!(p.fullmove_number(), 2);
    }

    #[test]
    fn clocks_saturate_instead_of_overflowing() {
        let mut p = pos("4k3/8/8/8/8/8/8/4K3 b - - 4294967295 4294967295");
        p.apply_move(Move::quiet(Color::Black, Piece::King, Square::E8, Square::D8)).unwrap();
        assert_eq!(p.halfmove_clock(), u32::MAX);
        assert_eq!(p.fullmove_number(), u32::MAX);
        p.apply_null_move();
        p.apply_null_move();
        assert_eq!(p.halfmove_clock(), u32::MAX);
        assert_eq!(p.fullmove_number(), u32::MAX);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "mailbox disagrees")]
    fn debug_builds_catch_a_corrupted_mailbox() {
        let mut p = Position::startpos();
        p.mailbox[sq("h2").index() as usize] = None;
        let _ = p.apply_move(Move::quiet(Color::White, Piece::Pawn, sq("e2"), sq("e4")));
    }

    #[test]
    fn transposed_positions_share_a_signature() {
        let mut a = Position::startpos();
        let mut b = Position::startpos();
        let nf3 = Move::quiet(Color::White, Piece::Knight, Square::G1, sq("f3"));
        let nc3 = Move::quiet(Color::White, Piece::Knight, Square::B1, sq("c3"));
        let nf6 = Move::quiet(Color::Black, Piece::Knight, Square::G8, sq("f6"));
        let nc6 = Move::quiet(Color::Black, Piece::Knight, Square::B8, sq("c6"));
        for mv in [nf3, nf6, nc3, nc6] {
            a.apply_move(mv).unwrap();
        }
        for mv in [nc3, nc6, nf3, nf6] {
            b.apply_move(mv).unwrap();
        }
        assert_eq!(a.signature(), b.signature());
        assert_eq!(a.to_fen(), b.to_fen());
        assert_ne!(a.signature(), Position::startpos().signature());
        assert_eq!(a.pawn_signature(), Position::startpos().pawn_signature());
        assert_eq!(Square::new(File::C, Rank::R3), sq("c3"));
    }
}
