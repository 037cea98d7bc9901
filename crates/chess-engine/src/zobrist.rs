//! Zobrist keys for position signatures.
//!
//! A signature is the XOR of one key per (kind, side, square) occupant, plus
//! keys for the side to move, each castling right held, and the en-passant
//! file. XOR makes it incremental: moving a piece is two XORs. The pawn
//! signature uses only the pawn occupant keys.

use crate::CastlingRights;
use chess_core::{Color, Piece, Square};

/// The key set. Generated at compile time from a fixed seed, so signatures
/// are stable across runs.
pub struct ZobristKeys {
    pieces: [[[u64; 64]; 2]; 6],
    black_to_move: u64,
    castling: [u64; 4],
    en_passant: [u64; 8],
}

const fn xorshift(mut x: u64) -> u64 {
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x
}

impl ZobristKeys {
    const fn generate() -> Self {
        let mut state = 0x9E37_79B9_7F4A_7C15u64;
        let mut pieces = [[[0u64; 64]; 2]; 6];
        let mut castling = [0u64; 4];
        let mut en_passant = [0u64; 8];

        let mut piece = 0;
        while piece < 6 {
            let mut color = 0;
            while color < 2 {
                let mut square = 0;
                while square < 64 {
                    state = xorshift(state);
                    pieces[piece][color][square] = state;
                    square += 1;
                }
                color += 1;
            }
            piece += 1;
        }

        state = xorshift(state);
        let black_to_move = state;

        let mut i = 0;
        while i < 4 {
            state = xorshift(state);
            castling[i] = state;
            i += 1;
        }

        let mut i = 0;
        while i < 8 {
            state = xorshift(state);
            en_passant[i] = state;
            i += 1;
        }

        ZobristKeys {
            pieces,
            black_to_move,
            castling,
            en_passant,
        }
    }

    #[inline]
    pub const fn piece(&self, piece: Piece, color: Color, square: Square) -> u64 {
        self.pieces[piece.index()][color.index()][square.index() as usize]
    }

    #[inline]
    pub const fn black_to_move(&self) -> u64 {
        self.black_to_move
    }

    /// XOR of the keys of every right held.
    pub fn castling(&self, rights: CastlingRights) -> u64 {
        rights.indices().fold(0, |acc, i| acc ^ self.castling[i])
    }

    #[inline]
    pub fn en_passant(&self, target: Option<Square>) -> u64 {
        match target {
            Some(sq) => self.en_passant[sq.file().index() as usize],
            None => 0,
        }
    }
}

pub static ZOBRIST: ZobristKeys = ZobristKeys::generate();
