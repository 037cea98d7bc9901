//! Pseudo-legal move generation.
//!
//! Generation never mutates the position and never checks king safety;
//! [`Position::apply_move`] rejects moves that leave the mover in check.
//! [`legal_moves`] combines the two when a filtered list is needed.

pub mod perft;

use crate::{Bitboard, Position};
use chess_core::{CastleSide, Color, Move, Piece, Square};

pub use perft::{perft, perft_divide, perft_with_budget};

/// A list of moves with a fixed maximum capacity.
///
/// No chess position has more than 218 legal moves, and the pseudo-legal
/// count stays well below 256, so a fixed array avoids heap allocation.
#[derive(Clone)]
pub struct MoveList {
    moves: [Move; Self::MAX_MOVES],
    len: usize,
}

impl MoveList {
    pub const MAX_MOVES: usize = 256;

    #[inline]
    pub const fn new() -> Self {
        MoveList {
            moves: [Move::NULL; Self::MAX_MOVES],
            len: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, m: Move) {
        debug_assert!(self.len < Self::MAX_MOVES);
        self.moves[self.len] = m;
        self.len += 1;
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn contains(&self, m: &Move) -> bool {
        self.as_slice().contains(m)
    }

    /// Keeps only the moves for which `f` returns true, preserving order.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&Move) -> bool,
    {
        let mut write = 0;
        for read in 0..self.len {
            if f(&self.moves[read]) {
                self.moves[write] = self.moves[read];
                write += 1;
            }
        }
        self.len = write;
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<usize> for MoveList {
    type Output = Move;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.as_slice()[index]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl std::fmt::Debug for MoveList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// Outcome of inspecting the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    /// In check with at least one legal reply.
    Check,
    Checkmate,
    Stalemate,
    /// 150 plies without a capture or pawn move.
    SeventyFiveMoveDraw,
}

/// Plies without a capture or pawn move after which the game is drawn.
pub const SEVENTY_FIVE_MOVE_PLIES: u32 = 150;

/// All pseudo-legal moves for `side`.
///
/// Order: by ascending origin square, then ascending destination, with the
/// four promotions of one pawn move in the order knight, bishop, rook, queen;
/// then en passant captures; then castling, queenside first. En passant and
/// castling are only generated when `side` is the side to move.
pub fn generate_moves(position: &Position, side: Color) -> MoveList {
    let mut moves = MoveList::new();
    generate(position, side, !position.side_pieces(side), &mut moves);
    if side == position.side_to_move() {
        generate_en_passant(position, side, &mut moves);
        generate_castling(position, side, &mut moves);
    }
    moves
}

/// The captures among [`generate_moves`], in the same order, without
/// castling. Captures that promote are included with every promotion kind.
pub fn generate_captures(position: &Position, side: Color) -> MoveList {
    let mut moves = MoveList::new();
    generate(position, side, position.side_pieces(side.opposite()), &mut moves);
    if side == position.side_to_move() {
        generate_en_passant(position, side, &mut moves);
    }
    moves
}

/// Moves for the side to move that do not leave its king in check.
pub fn legal_moves(position: &mut Position) -> MoveList {
    let mut moves = generate_moves(position, position.side_to_move());
    moves.retain(|&mv| {
        let ok = position.apply_move(mv).is_ok();
        if ok {
            position.undo_move();
        }
        ok
    });
    moves
}

/// Checkmate, stalemate and check are decided before the move-count draw.
pub fn game_status(position: &mut Position) -> GameStatus {
    let side = position.side_to_move();
    let any_legal = generate_moves(position, side).as_slice().iter().any(|&mv| {
        let ok = position.apply_move(mv).is_ok();
        if ok {
            position.undo_move();
        }
        ok
    });

    match (position.in_check(side), any_legal) {
        (true, false) => GameStatus::Checkmate,
        (true, true) => GameStatus::Check,
        (false, false) => GameStatus::Stalemate,
        (false, true) if position.halfmove_clock() >= SEVENTY_FIVE_MOVE_PLIES => GameStatus::SeventyFiveMoveDraw,
        (false, true) => GameStatus::Ongoing,
    }
}

// Main pass: every piece of `side`, destinations restricted to `targets`.
fn generate(position: &Position, side: Color, targets: Bitboard, moves: &mut MoveList) {
    let own = position.side_pieces(side);
    for from in own {
        let Some((piece, _)) = position.piece_at(from) else {
            continue;
        };
        let reachable = position.attack_mask(side, from, piece) & !own & targets;
        for to in reachable {
            let captured = position.piece_at(to).map(|(kind, _)| kind);
            let mv = match captured {
                Some(kind) => Move::capture(side, piece, from, to, kind),
                None => Move::quiet(side, piece, from, to),
            };
            if piece == Piece::Pawn && to.rank() == side.promotion_rank() {
                for promotion in Piece::PROMOTIONS {
                    moves.push(mv.with_promotion(promotion));
                }
            } else {
                moves.push(mv);
            }
        }
    }
}

// Pawns that attack the target square are exactly the squares an enemy pawn
// standing on the target would attack.
fn generate_en_passant(position: &Position, side: Color, moves: &mut MoveList) {
    let Some(target) = position.en_passant() else {
        return;
    };
    let capturers = position.tables().pawn_captures(side.opposite(), target) & position.pieces(Piece::Pawn, Some(side));
    for from in capturers {
        moves.push(Move::en_passant(side, from, target));
    }
}

fn generate_castling(position: &Position, side: Color, moves: &mut MoveList) {
    for wing in CastleSide::ALL {
        if position.castling_obstacle(side, wing).is_none() {
            moves.push(Move::castle(side, wing));
        }
    }
}

/// Finds the generated move for `side` matching coordinate notation such as
/// `e2e4` or `e7e8q`.
pub fn find_move(position: &Position, side: Color, uci: &str) -> Option<Move> {
    generate_moves(position, side)
        .as_slice()
        .iter()
        .copied()
        .find(|mv| mv.to_uci() == uci)
}

/// Squares attacked by any piece of `side`, with pawns counted on their
/// capture diagonals whether or not an enemy stands there.
pub fn attacked_squares(position: &Position, side: Color) -> Bitboard {
    Square::all()
        .filter(|&sq| position.is_square_attacked(sq, side))
        .fold(Bitboard::EMPTY, |acc, sq| acc | Bitboard::from_square(sq))
}
