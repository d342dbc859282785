use std::fmt;

use crate::color::Color;
use crate::square::Square;

/// The four castling permissions, packed into one byte.
///
/// Rights are only ever cleared, never restored: a right disappears when the
/// king or the relevant rook leaves its home square, or when a rook is
/// captured on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CastlingRights(u8);

impl CastlingRights {
    const WHITE_SHORT: u8 = 0b0001;
    const WHITE_LONG: u8 = 0b0010;
    const BLACK_SHORT: u8 = 0b0100;
    const BLACK_LONG: u8 = 0b1000;

    pub const NONE: CastlingRights = CastlingRights(0);
    pub const FULL: CastlingRights = CastlingRights(0b1111);

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Raw bit pattern, stable across the four flags. Used as a table index
    /// when hashing positions.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// May `color` still castle kingside?
    #[inline]
    pub const fn has_short(self, color: Color) -> bool {
        let flag = match color {
            Color::White => Self::WHITE_SHORT,
            Color::Black => Self::BLACK_SHORT,
        };
        self.0 & flag != 0
    }

    /// May `color` still castle queenside?
    #[inline]
    pub const fn has_long(self, color: Color) -> bool {
        let flag = match color {
            Color::White => Self::WHITE_LONG,
            Color::Black => Self::BLACK_LONG,
        };
        self.0 & flag != 0
    }

    pub const fn with_short(self, color: Color) -> CastlingRights {
        let flag = match color {
            Color::White => Self::WHITE_SHORT,
            Color::Black => Self::BLACK_SHORT,
        };
        CastlingRights(self.0 | flag)
    }

    pub const fn with_long(self, color: Color) -> CastlingRights {
        let flag = match color {
            Color::White => Self::WHITE_LONG,
            Color::Black => Self::BLACK_LONG,
        };
        CastlingRights(self.0 | flag)
    }

    /// Rights invalidated by any traffic on `square`. Covers the king homes
    /// (both rights), the rook homes (one right each), and everything else
    /// (no rights).
    const fn square_mask(square: Square) -> u8 {
        match square.index() {
            0 => Self::WHITE_LONG,                     // a1
            4 => Self::WHITE_SHORT | Self::WHITE_LONG, // e1
            7 => Self::WHITE_SHORT,                    // h1
            56 => Self::BLACK_LONG,                    // a8
            60 => Self::BLACK_SHORT | Self::BLACK_LONG, // e8
            63 => Self::BLACK_SHORT,                   // h8
            _ => 0,
        }
    }

    /// Clears whatever rights a move touching `square` forfeits. Move
    /// application calls this for both the origin and the destination, which
    /// handles king moves, rook moves, and rook captures uniformly.
    #[inline]
    pub const fn cleared_for(self, square: Square) -> CastlingRights {
        CastlingRights(self.0 & !Self::square_mask(square))
    }

    /// FEN castling field, `-` when no rights remain.
    pub fn to_fen(self) -> String {
        if self.is_empty() {
            return "-".to_string();
        }
        let mut s = String::with_capacity(4);
        if self.0 & Self::WHITE_SHORT != 0 {
            s.push('K');
        }
        if self.0 & Self::WHITE_LONG != 0 {
            s.push('Q');
        }
        if self.0 & Self::BLACK_SHORT != 0 {
            s.push('k');
        }
        if self.0 & Self::BLACK_LONG != 0 {
            s.push('q');
        }
        s
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}
