//! Error types for the engine.

use chess_core::{CastleSide, Color, FenError, Piece, Square};
use std::fmt;
use thiserror::Error;

/// Why a castling move was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastlingBlocked {
    /// The right was lost, or king and rook are not on their home squares.
    NoRight,
    /// A piece stands between king and rook.
    PathBlocked,
    KingInCheck,
    /// The square the king crosses is attacked.
    TransitAttacked,
}

impl fmt::Display for CastlingBlocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CastlingBlocked::NoRight => "castling right not held",
            CastlingBlocked::PathBlocked => "path between king and rook is blocked",
            CastlingBlocked::KingInCheck => "king is in check",
            CastlingBlocked::TransitAttacked => "king would cross an attacked square",
        })
    }
}

/// A move that cannot be applied to the current position. The position is
/// left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IllegalMove {
    #[error("no piece on {0}")]
    EmptyOrigin(Square),

    #[error("it is not {0}'s turn")]
    NotSideToMove(Color),

    #[error("expected {expected_side} {expected} on {square}, found {found_side} {found}")]
    PieceMismatch {
        square: Square,
        expected: Piece,
        expected_side: Color,
        found: Piece,
        found_side: Color,
    },

    #[error("{0} is occupied by a piece of the moving side")]
    OwnPieceOnDestination(Square),

    #[error("capture on {square} does not match the board (move says {claimed:?}, board has {actual:?})")]
    CaptureMismatch {
        square: Square,
        claimed: Option<Piece>,
        actual: Option<Piece>,
    },

    #[error("{piece} on {from} cannot reach {to}")]
    Unreachable { piece: Piece, from: Square, to: Square },

    #[error("invalid promotion to {promotion:?} on {to}")]
    InvalidPromotion { to: Square, promotion: Option<Piece> },

    #[error("no en passant capture available on {0}")]
    InvalidEnPassant(Square),

    #[error("{side} cannot castle {wing:?}: {reason}")]
    Castling {
        side: Color,
        wing: CastleSide,
        reason: CastlingBlocked,
    },

    #[error("move leaves the king in check")]
    LeavesKingInCheck,
}

/// Failure to build a position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error(transparent)]
    Fen(#[from] FenError),

    #[error("{0} has no king")]
    MissingKing(Color),

    #[error("{0} has more than one king")]
    MultipleKings(Color),

    #[error("pawn on back rank square {0}")]
    PawnOnBackRank(Square),

    #[error("{0} is not a square an enemy pawn just passed over")]
    InvalidEnPassant(Square),

    #[error("the side not to move is in check")]
    OpponentInCheck,

    #[error("inconsistent position state: {0}")]
    Inconsistent(String),
}

/// What tripped a [`SearchBudget`](crate::SearchBudget).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Deadline,
    NodeLimit,
    Stopped,
}

/// Returned when a budget runs out mid-search. Nothing about the position
/// or the caches is corrupted; the caller keeps its last complete result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("search cancelled ({0:?})")]
pub struct SearchCancelled(pub CancelReason);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_readable() {
        let e = IllegalMove::EmptyOrigin(Square::E1);
        assert_eq!(e.to_string(), "no piece on e1");

        let e = IllegalMove::Castling {
            side: Color::White,
            wing: CastleSide::Kingside,
            reason: CastlingBlocked::TransitAttacked,
        };
        assert_eq!(e.to_string(), "white cannot castle Kingside: king would cross an attacked square");

        assert_eq!(IllegalMove::LeavesKingInCheck.to_string(), "move leaves the king in check");
    }

    #[test]
    fn fen_errors_convert() {
        let e: PositionError = FenError::InvalidPartCount(2).into();
        assert!(matches!(e, PositionError::Fen(_)));
        assert_eq!(SearchCancelled(CancelReason::Deadline).to_string(), "search cancelled (Deadline)");
    }
}
