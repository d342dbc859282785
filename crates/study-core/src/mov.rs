use std::fmt;

use crate::piece::Piece;
use crate::square::Square;

/// What kind of move a [`Move`] encodes, beyond its two squares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    Normal = 0,
    DoublePush = 1,
    CastleShort = 2,
    CastleLong = 3,
    EnPassant = 4,
    PromoteKnight = 5,
    PromoteBishop = 6,
    PromoteRook = 7,
    PromoteQueen = 8,
}

impl MoveKind {
    /// The promoted-to piece, for the four promotion kinds.
    pub const fn promotion(self) -> Option<Piece> {
        match self {
            MoveKind::PromoteKnight => Some(Piece::Knight),
            MoveKind::PromoteBishop => Some(Piece::Bishop),
            MoveKind::PromoteRook => Some(Piece::Rook),
            MoveKind::PromoteQueen => Some(Piece::Queen),
            _ => None,
        }
    }

    /// The promotion kind that produces `piece`, if `piece` is a legal
    /// promotion target.
    pub const fn promoting_to(piece: Piece) -> Option<MoveKind> {
        match piece {
            Piece::Knight => Some(MoveKind::PromoteKnight),
            Piece::Bishop => Some(MoveKind::PromoteBishop),
            Piece::Rook => Some(MoveKind::PromoteRook),
            Piece::Queen => Some(MoveKind::PromoteQueen),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_promotion(self) -> bool {
        self.promotion().is_some()
    }

    #[inline]
    pub const fn is_castle(self) -> bool {
        matches!(self, MoveKind::CastleShort | MoveKind::CastleLong)
    }

    const fn from_bits(bits: u16) -> MoveKind {
        match bits {
            1 => MoveKind::DoublePush,
            2 => MoveKind::CastleShort,
            3 => MoveKind::CastleLong,
            4 => MoveKind::EnPassant,
            5 => MoveKind::PromoteKnight,
            6 => MoveKind::PromoteBishop,
            7 => MoveKind::PromoteRook,
            8 => MoveKind::PromoteQueen,
            _ => MoveKind::Normal,
        }
    }
}

/// A move packed into 16 bits: origin in bits 0-5, destination in bits 6-11,
/// kind in bits 12-15.
///
/// Values carrying a meaningful kind come from the move generator; parsing
/// UCI yields only the squares and any promotion piece, and must be resolved
/// against the legal move list before being applied.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move(u16);

impl Move {
    /// Placeholder move (a1 to a1). Never legal; used to fill buffers.
    pub const NULL: Move = Move(0);

    #[inline]
    pub const fn new(from: Square, to: Square, kind: MoveKind) -> Move {
        Move((from.index() as u16) | ((to.index() as u16) << 6) | ((kind as u16) << 12))
    }

    #[inline]
    pub const fn plain(from: Square, to: Square) -> Move {
        Move::new(from, to, MoveKind::Normal)
    }

    #[inline]
    pub const fn from(self) -> Square {
        // Masked to 6 bits, always in range.
        unsafe { Square::from_index_unchecked((self.0 & 0x3f) as u8) }
    }

    #[inline]
    pub const fn to(self) -> Square {
        unsafe { Square::from_index_unchecked(((self.0 >> 6) & 0x3f) as u8) }
    }

    #[inline]
    pub const fn kind(self) -> MoveKind {
        MoveKind::from_bits(self.0 >> 12)
    }

    /// Long algebraic (UCI) text: `e2e4`, `e7e8q`.
    pub fn to_uci(self) -> String {
        let mut s = String::with_capacity(5);
        s.push(self.from().file().to_char());
        s.push(self.from().rank().to_char());
        s.push(self.to().file().to_char());
        s.push(self.to().rank().to_char());
        if let Some(piece) = self.kind().promotion() {
            s.push(piece.uci_char());
        }
        s
    }

    /// Parses UCI text into squares plus an optional promotion.
    ///
    /// The result has kind `Normal` or a promotion kind; whether the move is
    /// a castle, double push, or en passant can only be decided against a
    /// position, which is the validator's job.
    pub fn from_uci(s: &str) -> Option<Move> {
        if s.len() != 4 && s.len() != 5 {
            return None;
        }
        let from = Square::from_algebraic(s.get(0..2)?)?;
        let to = Square::from_algebraic(s.get(2..4)?)?;
        let kind = match s.as_bytes().get(4) {
            None => MoveKind::Normal,
            Some(&c) => {
                let piece = match c {
                    b'n' => Piece::Knight,
                    b'b' => Piece::Bishop,
                    b'r' => Piece::Rook,
                    b'q' => Piece::Queen,
                    _ => return None,
                };
                match MoveKind::promoting_to(piece) {
                    Some(kind) => kind,
                    None => return None,
                }
            }
        };
        Some(Move::new(from, to, kind))
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({}, {:?})", self.to_uci(), self.kind())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}
