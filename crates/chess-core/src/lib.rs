//! Core value types for chess.
//!
//! This crate provides the board-independent vocabulary shared by the engine:
//! - [`Color`] and [`Piece`] for sides and piece kinds
//! - [`Square`], [`File`], and [`Rank`] for board coordinates
//! - [`Move`] and [`CastleSide`] for move descriptions
//! - [`Fen`] for parsing and writing FEN records

mod color;
mod fen;
mod mov;
mod piece;
mod square;

pub use color::Color;
pub use fen::{Fen, FenError};
pub use mov::{CastleSide, Move};
pub use piece::Piece;
pub use square::{File, Rank, Square};
