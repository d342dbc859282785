//! Node-count validation for the move generator.

use crate::movegen::{legal_moves, play};
use crate::position::Position;

/// Counts leaf nodes of the legal move tree to `depth` plies.
pub fn perft(position: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = legal_moves(position);
    if depth == 1 {
        return moves.len() as u64;
    }
    moves
        .iter()
        .map(|mv| perft(&play(position, mv), depth - 1))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_counts(fen: &str, expected: &[u64]) {
        let position = Position::from_fen(fen).unwrap();
        for (i, &nodes) in expected.iter().enumerate() {
            let depth = i as u32 + 1;
            assert_eq!(
                perft(&position, depth),
                nodes,
                "perft({depth}) of {fen}"
            );
        }
    }

    #[test]
    fn startpos() {
        assert_counts(
            study_core::START_FEN,
            &[20, 400, 8_902, 197_281],
        );
    }

    #[test]
    fn castling_heavy_middlegame() {
        assert_counts(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            &[48, 2_039, 97_862],
        );
    }

    #[test]
    fn en_passant_pins_endgame() {
        assert_counts(
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            &[14, 191, 2_812, 43_238],
        );
    }

    #[test]
    fn promotion_heavy_position() {
        assert_counts(
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            &[6, 264, 9_467],
        );
    }

    #[test]
    fn mirrored_tactics_position() {
        assert_counts(
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
            &[44, 1_486, 62_379],
        );
    }
}
