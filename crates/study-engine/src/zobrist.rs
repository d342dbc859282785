//! Zobrist keys for repetition detection.
//!
//! The tables are filled at compile time from a splitmix64 stream, so every
//! build hashes identically without carrying literal key tables around.

use study_core::{Color, Piece};

use crate::position::Position;

const SEED: u64 = 0xb5ad_4ece_da1c_e2a9;

struct Keys {
    pieces: [[[u64; 64]; 2]; 6],
    black_to_move: u64,
    /// Indexed by the packed castling-rights nibble.
    castling: [u64; 16],
    en_passant_file: [u64; 8],
}

const fn next(state: u64) -> (u64, u64) {
    let state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    (state, z ^ (z >> 31))
}

const fn generate() -> Keys {
    let mut state = SEED;
    let mut pieces = [[[0u64; 64]; 2]; 6];
    let mut piece = 0;
    while piece < 6 {
        let mut color = 0;
        while color < 2 {
            let mut square = 0;
            while square < 64 {
                let (next_state, value) = next(state);
                state = next_state;
                pieces[piece][color][square] = value;
                square += 1;
            }
            color += 1;
        }
        piece += 1;
    }

    let (next_state, black_to_move) = next(state);
    state = next_state;

    let mut castling = [0u64; 16];
    let mut i = 0;
    while i < 16 {
        let (next_state, value) = next(state);
        state = next_state;
        castling[i] = value;
        i += 1;
    }

    let mut en_passant_file = [0u64; 8];
    let mut i = 0;
    while i < 8 {
        let (next_state, value) = next(state);
        state = next_state;
        en_passant_file[i] = value;
        i += 1;
    }

    Keys {
        pieces,
        black_to_move,
        castling,
        en_passant_file,
    }
}

const KEYS: Keys = generate();

/// Hashes placement, side to move, and castling rights; the en-passant file
/// participates only when the caller says the target square is usable.
pub(crate) fn hash(position: &Position, include_en_passant: bool) -> u64 {
    let mut h = 0u64;
    for piece in Piece::ALL {
        for color in Color::ALL {
            for square in position.pieces_of(piece, color) {
                h ^= KEYS.pieces[piece.index()][color.index()][square.index()];
            }
        }
    }
    if position.side_to_move == Color::Black {
        h ^= KEYS.black_to_move;
    }
    h ^= KEYS.castling[position.castling.bits() as usize];
    if include_en_passant {
        if let Some(square) = position.en_passant {
            h ^= KEYS.en_passant_file[square.file().index()];
        }
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::{play, validate};
    use study_core::Square;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    #[test]
    fn identical_positions_hash_identically() {
        let a = Position::startpos();
        let b = Position::startpos();
        assert_eq!(hash(&a, false), hash(&b, false));
    }

    #[test]
    fn side_to_move_changes_the_hash() {
        let white = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let black = Position::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 0 1").unwrap();
        assert_ne!(hash(&white, false), hash(&black, false));
    }

    #[test]
    fn clocks_do_not_change_the_hash() {
        let a = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let b = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 37 90").unwrap();
        assert_eq!(hash(&a, false), hash(&b, false));
    }

    #[test]
    fn knight_shuffle_returns_to_the_start_hash() {
        let start = Position::startpos();
        let mut position = start.clone();
        for (from, to) in [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")] {
            let mv = validate(&position, sq(from), sq(to), None).unwrap();
            position = play(&position, mv);
        }
        assert_ne!(position, start, "clocks differ after the shuffle");
        assert_eq!(hash(&position, false), hash(&start, false));
    }
}
