//! Bitboard chess engine core.
//!
//! This crate provides:
//! - [`Bitboard`] - 64-bit square sets with the usual set operations
//! - [`AttackTables`] - precomputed pawn, knight and king maps plus magic
//!   bitboard lookups for sliding pieces
//! - [`Position`] - board state with incremental signatures, move application
//!   that validates before mutating, and exact undo
//! - [`movegen`] - pseudo-legal move generation, legality filtering and perft
//! - [`TranspositionTable`] and [`PawnStructureCache`] - fixed-size result
//!   caches for a search
//! - [`SearchBudget`] - cooperative cancellation by deadline, node count or
//!   an external stop signal
//!
//! # Architecture
//!
//! Squares are numbered from a1 = 0 to h8 = 63 and bit `n` of a [`Bitboard`]
//! is square `n`. A [`Position`] keeps one bitboard per piece kind, one per
//! side, and a square-indexed mirror of the same information. Moves are
//! applied in place and recorded on an undo stack; a move that would leave
//! the mover's king attacked is taken back and reported as
//! [`IllegalMove::LeavesKingInCheck`].
//!
//! The attack tables are built once per process and shared by every position.
//!
//! # Example
//!
//! ```
//! use chess_engine::movegen::{generate_moves, perft};
//! use chess_engine::Position;
//!
//! let mut position = Position::startpos();
//! assert_eq!(generate_moves(&position, position.side_to_move()).len(), 20);
//! assert_eq!(perft(&mut position, 2), 400);
//!
//! let mv = chess_engine::movegen::find_move(&position, position.side_to_move(), "e2e4").unwrap();
//! position.apply_move(mv).unwrap();
//! assert_eq!(
//!     position.to_fen(),
//!     "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
//! );
//! ```

pub mod attacks;
mod bitboard;
mod budget;
mod castling;
mod config;
mod error;
pub mod movegen;
mod pawn_cache;
mod position;
mod tt;
mod zobrist;

pub use attacks::AttackTables;
pub use bitboard::{Bitboard, BitboardIter, Subsets};
pub use budget::{SearchBudget, StopHandle};
pub use castling::CastlingRights;
pub use config::{ConfigError, EngineConfig};
pub use error::{CancelReason, CastlingBlocked, IllegalMove, PositionError, SearchCancelled};
pub use movegen::{generate_captures, generate_moves, legal_moves, GameStatus, MoveList};
pub use pawn_cache::PawnStructureCache;
pub use position::Position;
pub use tt::{NodeKind, TableEntry, TableHit, TableStats, TranspositionTable};
pub use zobrist::{ZobristKeys, ZOBRIST};
