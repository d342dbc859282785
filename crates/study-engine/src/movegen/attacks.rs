//! Attack lookups. Leaper targets (knight, king, pawn) are tables built at
//! compile time; sliders walk their rays against the blocker set at call
//! time.

use study_core::{Color, Square};

use crate::bitboard::Bitboard;

const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (2, 1),
    (1, 2),
    (-1, 2),
    (-2, 1),
    (-2, -1),
    (-1, -2),
    (1, -2),
    (2, -1),
];

const KING_DELTAS: [(i8, i8); 8] = [
    (1, -1),
    (1, 0),
    (1, 1),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

const fn jump_table(deltas: [(i8, i8); 8]) -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    let mut square = 0usize;
    while square < 64 {
        let rank = (square / 8) as i8;
        let file = (square % 8) as i8;
        let mut bits = 0u64;
        let mut i = 0;
        while i < 8 {
            let r = rank + deltas[i].0;
            let f = file + deltas[i].1;
            if r >= 0 && r < 8 && f >= 0 && f < 8 {
                bits |= 1u64 << (r * 8 + f);
            }
            i += 1;
        }
        table[square] = Bitboard(bits);
        square += 1;
    }
    table
}

const fn pawn_tables() -> [[Bitboard; 64]; 2] {
    let mut table = [[Bitboard::EMPTY; 64]; 2];
    let mut square = 0usize;
    while square < 64 {
        let rank = (square / 8) as i8;
        let file = (square % 8) as i8;
        let mut color = 0usize;
        while color < 2 {
            let forward = if color == 0 { 1i8 } else { -1i8 };
            let mut bits = 0u64;
            let r = rank + forward;
            if r >= 0 && r < 8 {
                if file > 0 {
                    bits |= 1u64 << (r * 8 + file - 1);
                }
                if file < 7 {
                    bits |= 1u64 << (r * 8 + file + 1);
                }
            }
            table[color][square] = Bitboard(bits);
            color += 1;
        }
        square += 1;
    }
    table
}

const KNIGHT_ATTACKS: [Bitboard; 64] = jump_table(KNIGHT_DELTAS);
const KING_ATTACKS: [Bitboard; 64] = jump_table(KING_DELTAS);
const PAWN_ATTACKS: [[Bitboard; 64]; 2] = pawn_tables();

#[inline]
pub fn knight(square: Square) -> Bitboard {
    KNIGHT_ATTACKS[square.index()]
}

#[inline]
pub fn king(square: Square) -> Bitboard {
    KING_ATTACKS[square.index()]
}

/// Squares a pawn of `color` on `square` attacks (captures only, not
/// pushes).
#[inline]
pub fn pawn(color: Color, square: Square) -> Bitboard {
    PAWN_ATTACKS[color.index()][square.index()]
}

pub fn bishop(square: Square, occupied: Bitboard) -> Bitboard {
    rays(square, occupied, BISHOP_DIRS)
}

pub fn rook(square: Square, occupied: Bitboard) -> Bitboard {
    rays(square, occupied, ROOK_DIRS)
}

pub fn queen(square: Square, occupied: Bitboard) -> Bitboard {
    bishop(square, occupied) | rook(square, occupied)
}

fn rays(square: Square, occupied: Bitboard, dirs: [(i8, i8); 4]) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    let rank = square.rank().index() as i8;
    let file = square.file().index() as i8;
    for (dr, df) in dirs {
        let mut r = rank + dr;
        let mut f = file + df;
        while (0..8).contains(&r) && (0..8).contains(&f) {
            // In bounds by the loop condition.
            let target = unsafe { Square::from_index_unchecked((r * 8 + f) as u8) };
            attacks.set(target);
            if occupied.contains(target) {
                break;
            }
            r += dr;
            f += df;
        }
    }
    attacks
}
