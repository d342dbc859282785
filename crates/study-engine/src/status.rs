//! Terminal-state classification.

use study_core::{Color, Piece};

use crate::bitboard::Bitboard;
use crate::movegen::{in_check, legal_moves};
use crate::position::Position;

/// Where a game line stands. Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    Active,
    Checkmate { winner: Color },
    Stalemate,
    Draw(DrawReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawReason {
    FiftyMove,
    ThreefoldRepetition,
    InsufficientMaterial,
}

impl GameStatus {
    #[inline]
    pub const fn is_over(self) -> bool {
        !matches!(self, GameStatus::Active)
    }
}

/// Classifies `position`, given the repetition keys of every position on
/// the line so far, the evaluated position included.
///
/// Checkmate and stalemate are decided before any draw rule, so a mate
/// delivered on the hundredth halfmove is still a mate.
pub fn game_status(position: &Position, history: &[u64]) -> GameStatus {
    if legal_moves(position).is_empty() {
        return if in_check(position) {
            GameStatus::Checkmate {
                winner: position.side_to_move.opposite(),
            }
        } else {
            GameStatus::Stalemate
        };
    }
    if position.halfmove_clock >= 100 {
        return GameStatus::Draw(DrawReason::FiftyMove);
    }
    let key = position.repetition_key();
    if history.iter().filter(|&&k| k == key).count() >= 3 {
        return GameStatus::Draw(DrawReason::ThreefoldRepetition);
    }
    if insufficient_material(position) {
        return GameStatus::Draw(DrawReason::InsufficientMaterial);
    }
    GameStatus::Active
}

/// The closed dead-position table: king vs king, king and one minor vs
/// king, and same-complex bishop vs bishop. Anything else, including two
/// knights, counts as playable.
fn insufficient_material(position: &Position) -> bool {
    let heavy = position.pieces[Piece::Pawn.index()]
        | position.pieces[Piece::Rook.index()]
        | position.pieces[Piece::Queen.index()];
    if heavy.any() {
        return false;
    }
    let knights = position.pieces[Piece::Knight.index()];
    let bishops = position.pieces[Piece::Bishop.index()];
    match (knights | bishops).count() {
        0 => true,
        1 => true,
        2 => {
            knights.is_empty()
                && position.pieces_of(Piece::Bishop, Color::White).count() == 1
                && position.pieces_of(Piece::Bishop, Color::Black).count() == 1
                // Both on dark squares or both on light squares.
                && (bishops & Bitboard::DARK_SQUARES).count() != 1
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::{play, validate};
    use study_core::Square;

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    fn play_line(start: &Position, line: &[(&str, &str)]) -> (Position, Vec<u64>) {
        let mut position = start.clone();
        let mut keys = vec![position.repetition_key()];
        for (from, to) in line {
            let from = Square::from_algebraic(from).unwrap();
            let to = Square::from_algebraic(to).unwrap();
            let mv = validate(&position, from, to, None).unwrap();
            position = play(&position, mv);
            keys.push(position.repetition_key());
        }
        (position, keys)
    }

    #[test]
    fn fresh_game_is_active() {
        let position = Position::startpos();
        let keys = [position.repetition_key()];
        assert_eq!(game_status(&position, &keys), GameStatus::Active);
        assert!(!GameStatus::Active.is_over());
    }

    #[test]
    fn fools_mate_is_checkmate_for_black() {
        let (position, keys) = play_line(
            &Position::startpos(),
            &[("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")],
        );
        assert_eq!(
            game_status(&position, &keys),
            GameStatus::Checkmate {
                winner: Color::Black
            }
        );
    }

    #[test]
    fn stalemate_when_not_in_check() {
        let position = pos("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        assert_eq!(
            game_status(&position, &[position.repetition_key()]),
            GameStatus::Stalemate
        );
    }

    #[test]
    fn hundred_halfmoves_draw_the_game() {
        let position = pos("r3k3/8/8/8/8/8/8/4K2R w - - 100 80");
        assert_eq!(
            game_status(&position, &[position.repetition_key()]),
            GameStatus::Draw(DrawReason::FiftyMove)
        );
        let position = pos("r3k3/8/8/8/8/8/8/4K2R w - - 99 80");
        assert_eq!(
            game_status(&position, &[position.repetition_key()]),
            GameStatus::Active
        );
    }

    #[test]
    fn mate_beats_the_clock() {
        // Back-rank mate delivered exactly as the clock reaches 100.
        let position = pos("R5k1/5ppp/8/8/8/8/8/6K1 b - - 100 120");
        assert_eq!(
            game_status(&position, &[position.repetition_key()]),
            GameStatus::Checkmate {
                winner: Color::White
            }
        );
    }

    #[test]
    fn threefold_repetition_across_different_shuffles() {
        // The start tuple recurs after a kingside knight shuffle and again
        // after a queenside one: three sightings via two different orders.
        let (position, keys) = play_line(
            &Position::startpos(),
            &[
                ("g1", "f3"),
                ("g8", "f6"),
                ("f3", "g1"),
                ("f6", "g8"),
                ("b1", "c3"),
                ("b8", "c6"),
                ("c3", "b1"),
                ("c6", "b8"),
            ],
        );
        assert_eq!(
            game_status(&position, &keys),
            GameStatus::Draw(DrawReason::ThreefoldRepetition)
        );
        // Two sightings are not enough.
        let (position, keys) = play_line(
            &Position::startpos(),
            &[("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")],
        );
        assert_eq!(game_status(&position, &keys), GameStatus::Active);
    }

    #[test]
    fn bare_kings_are_a_draw() {
        let position = pos("4k3/8/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(
            game_status(&position, &[position.repetition_key()]),
            GameStatus::Draw(DrawReason::InsufficientMaterial)
        );
    }

    #[test]
    fn king_and_minor_is_a_draw() {
        for fen in [
            "4k3/8/8/8/8/8/8/2B1K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/1N2K3 b - - 0 1",
        ] {
            let position = pos(fen);
            assert_eq!(
                game_status(&position, &[position.repetition_key()]),
                GameStatus::Draw(DrawReason::InsufficientMaterial),
                "{fen}"
            );
        }
    }

    #[test]
    fn bishop_pair_complexes_decide() {
        // a1 and c7 are both dark squares.
        let same = pos("4k3/2b5/8/8/8/8/8/B3K3 w - - 0 1");
        assert_eq!(
            game_status(&same, &[same.repetition_key()]),
            GameStatus::Draw(DrawReason::InsufficientMaterial)
        );
        // b7 is light; the bishops could in principle meet.
        let opposite = pos("4k3/1b6/8/8/8/8/8/B3K3 w - - 0 1");
        assert_eq!(
            game_status(&opposite, &[opposite.repetition_key()]),
            GameStatus::Active
        );
    }

    #[test]
    fn playable_material_is_not_a_draw() {
        for fen in [
            // Knight against knight stays out of the closed table.
            "4k3/8/8/8/8/8/1n6/1N2K3 w - - 0 1",
            // A lone pawn can still win.
            "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1",
            // Rooks are never dead.
            "4k3/8/8/8/8/8/8/R3K3 w - - 0 1",
            // Two bishops on one side are not in the table.
            "4k3/8/8/8/8/8/8/B1B1K3 w - - 0 1",
        ] {
            let position = pos(fen);
            assert_eq!(
                game_status(&position, &[position.repetition_key()]),
                GameStatus::Active,
                "{fen}"
            );
        }
    }
}
