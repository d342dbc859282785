use std::fmt;

use thiserror::Error;

use study_core::{CastlingRights, Color, FenError, FenFields, File, Piece, Rank, Square, START_FEN};

use crate::bitboard::Bitboard;
use crate::{movegen, zobrist};

/// Why a FEN string did not produce a usable position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    /// The text is not syntactically valid FEN.
    #[error(transparent)]
    MalformedFen(#[from] FenError),
    /// The described board breaks the one-king-per-side invariant.
    #[error("invalid position: {0} has {1} kings, expected exactly one")]
    KingCount(Color, u32),
}

/// A complete chess position.
///
/// Immutable by convention: [`movegen::play`] returns a fresh value rather
/// than mutating in place, so tree nodes can share positions freely.
#[derive(Clone, PartialEq, Eq)]
pub struct Position {
    /// Occupancy per piece kind, both colors mixed.
    pub(crate) pieces: [Bitboard; 6],
    /// Occupancy per color, all piece kinds mixed.
    pub(crate) colors: [Bitboard; 2],
    pub side_to_move: Color,
    pub castling: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

impl Position {
    /// Builds a position from FEN, enforcing the king-count invariant.
    pub fn from_fen(fen: &str) -> Result<Position, PositionError> {
        let fields = FenFields::parse(fen)?;
        let mut position = Position {
            pieces: [Bitboard::EMPTY; 6],
            colors: [Bitboard::EMPTY; 2],
            side_to_move: fields.side_to_move,
            castling: fields.castling,
            en_passant: fields.en_passant,
            halfmove_clock: fields.halfmove_clock,
            fullmove_number: fields.fullmove_number,
        };
        for (square, piece, color) in fields.placement {
            position.put(square, piece, color);
        }
        for color in Color::ALL {
            let kings = position.pieces_of(Piece::King, color).count();
            if kings != 1 {
                return Err(PositionError::KingCount(color, kings));
            }
        }
        Ok(position)
    }

    /// The standard starting position.
    pub fn startpos() -> Position {
        Position::from_fen(START_FEN).expect("standard start FEN is valid")
    }

    /// Emits FEN. Round-trips byte for byte through [`Position::from_fen`].
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(64);
        for rank_index in (0..8usize).rev() {
            let rank = Rank::ALL[rank_index];
            let mut empty = 0u8;
            for file in File::ALL {
                match self.piece_at(Square::new(file, rank)) {
                    Some((piece, color)) => {
                        if empty > 0 {
                            fen.push((b'0' + empty) as char);
                            empty = 0;
                        }
                        fen.push(piece.to_fen_char(color));
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push((b'0' + empty) as char);
            }
            if rank_index > 0 {
                fen.push('/');
            }
        }
        fen.push(' ');
        fen.push(self.side_to_move.fen_char());
        fen.push(' ');
        fen.push_str(&self.castling.to_fen());
        fen.push(' ');
        match self.en_passant {
            Some(square) => fen.push_str(&square.to_algebraic()),
            None => fen.push('-'),
        }
        fen.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        fen
    }

    /// What stands on `square`, if anything.
    pub fn piece_at(&self, square: Square) -> Option<(Piece, Color)> {
        let color = if self.colors[0].contains(square) {
            Color::White
        } else if self.colors[1].contains(square) {
            Color::Black
        } else {
            return None;
        };
        for piece in Piece::ALL {
            if self.pieces[piece.index()].contains(square) {
                return Some((piece, color));
            }
        }
        None
    }

    /// Squares holding `piece` of `color`.
    #[inline]
    pub fn pieces_of(&self, piece: Piece, color: Color) -> Bitboard {
        self.pieces[piece.index()] & self.colors[color.index()]
    }

    /// All occupied squares.
    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.colors[0] | self.colors[1]
    }

    /// Squares occupied by `color`.
    #[inline]
    pub fn occupied_by(&self, color: Color) -> Bitboard {
        self.colors[color.index()]
    }

    /// Where `color`'s king stands. `None` only for boards built by internal
    /// mutation before validation.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces_of(Piece::King, color).lsb()
    }

    /// Hash for repetition detection over (placement, side to move, castling
    /// rights, usable en-passant square).
    ///
    /// The en-passant component participates only when an en-passant capture
    /// is actually legal, so positions that differ just by an unusable
    /// target square count as repeats, matching over-the-board rules.
    pub fn repetition_key(&self) -> u64 {
        let live_en_passant =
            self.en_passant.is_some() && movegen::has_legal_en_passant(self);
        zobrist::hash(self, live_en_passant)
    }

    pub(crate) fn put(&mut self, square: Square, piece: Piece, color: Color) {
        self.pieces[piece.index()].set(square);
        self.colors[color.index()].set(square);
    }

    pub(crate) fn remove(&mut self, square: Square, piece: Piece, color: Color) {
        self.pieces[piece.index()].clear(square);
        self.colors[color.index()].clear(square);
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({})", self.to_fen())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}
