//! Standard algebraic notation for validated moves.

use study_core::{Move, MoveKind, Piece};

use crate::movegen::{in_check, legal_moves, play};
use crate::position::Position;

/// Renders a legal move in SAN, including minimal disambiguation and a
/// check or mate suffix.
///
/// `mv` must be legal in `position`; the renderer looks the moved piece up
/// on the board and ranks rivals against the legal move list.
pub fn san(position: &Position, mv: Move) -> String {
    let mut text = match mv.kind() {
        MoveKind::CastleShort => "O-O".to_string(),
        MoveKind::CastleLong => "O-O-O".to_string(),
        _ => {
            let (piece, _) = position.piece_at(mv.from()).expect("SAN needs the moved piece");
            let is_capture =
                position.piece_at(mv.to()).is_some() || mv.kind() == MoveKind::EnPassant;
            let mut s = String::with_capacity(7);
            if piece == Piece::Pawn {
                if is_capture {
                    s.push(mv.from().file().to_char());
                }
            } else {
                s.push(piece.san_letter());
                s.push_str(&disambiguation(position, mv, piece));
            }
            if is_capture {
                s.push('x');
            }
            s.push_str(&mv.to().to_algebraic());
            if let Some(promoted) = mv.kind().promotion() {
                s.push('=');
                s.push(promoted.san_letter());
            }
            s
        }
    };

    let after = play(position, mv);
    if in_check(&after) {
        text.push(if legal_moves(&after).is_empty() { '#' } else { '+' });
    }
    text
}

/// Smallest qualifier separating `mv` from other legal moves of the same
/// piece kind to the same square: file first, then rank, then both.
fn disambiguation(position: &Position, mv: Move, piece: Piece) -> String {
    let mut rivals = false;
    let mut share_file = false;
    let mut share_rank = false;
    for other in &legal_moves(position) {
        if other == mv || other.to() != mv.to() || other.from() == mv.from() {
            continue;
        }
        match position.piece_at(other.from()) {
            Some((p, _)) if p == piece => {
                rivals = true;
                if other.from().file() == mv.from().file() {
                    share_file = true;
                }
                if other.from().rank() == mv.from().rank() {
                    share_rank = true;
                }
            }
            _ => {}
        }
    }
    if !rivals {
        String::new()
    } else if !share_file {
        mv.from().file().to_char().to_string()
    } else if !share_rank {
        mv.from().rank().to_char().to_string()
    } else {
        mv.from().to_algebraic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::validate;
    use study_core::Square;

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    fn render(position: &Position, from: &str, to: &str) -> String {
        let from = Square::from_algebraic(from).unwrap();
        let to = Square::from_algebraic(to).unwrap();
        san(position, validate(position, from, to, None).unwrap())
    }

    #[test]
    fn pawn_and_piece_moves() {
        let start = Position::startpos();
        assert_eq!(render(&start, "e2", "e4"), "e4");
        assert_eq!(render(&start, "g1", "f3"), "Nf3");
    }

    #[test]
    fn captures() {
        let position = pos("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2");
        assert_eq!(render(&position, "e4", "d5"), "exd5");
    }

    #[test]
    fn en_passant_reads_like_a_pawn_capture() {
        let position = pos("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2");
        assert_eq!(render(&position, "e5", "d6"), "exd6");
    }

    #[test]
    fn castling_text() {
        let position = pos("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert_eq!(render(&position, "e1", "g1"), "O-O");
        assert_eq!(render(&position, "e1", "c1"), "O-O-O");
    }

    #[test]
    fn promotion_with_equals_sign() {
        let position = pos("4k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(render(&position, "a7", "a8"), "a8=Q");
        let mv = validate(
            &position,
            Square::from_algebraic("a7").unwrap(),
            Square::from_algebraic("a8").unwrap(),
            Some(Piece::Knight),
        )
        .unwrap();
        assert_eq!(san(&position, mv), "a8=N");
    }

    #[test]
    fn file_disambiguation_between_knights() {
        let position = pos("4k3/8/8/8/8/5N2/8/1N2K3 w - - 0 1");
        assert_eq!(render(&position, "b1", "d2"), "Nbd2");
        assert_eq!(render(&position, "f3", "d2"), "Nfd2");
    }

    #[test]
    fn rank_disambiguation_between_rooks() {
        let position = pos("4k3/8/8/R7/8/8/8/R3K3 w - - 0 1");
        assert_eq!(render(&position, "a1", "a3"), "R1a3");
        assert_eq!(render(&position, "a5", "a3"), "R5a3");
    }

    #[test]
    fn no_disambiguation_when_the_rival_is_pinned() {
        // Both knights eye d2, but the f8 rook pins the f3 knight to the f1
        // king, so only Nb1 can legally go there and no qualifier is
        // needed.
        let position = pos("4kr2/8/8/8/8/5N2/8/1N3K2 w - - 0 1");
        assert_eq!(render(&position, "b1", "d2"), "Nd2");
    }

    #[test]
    fn check_and_mate_suffixes() {
        let position = pos("4k3/8/8/8/7q/8/8/R3K3 b - - 0 1");
        assert_eq!(render(&position, "h4", "e4"), "Qe4+");

        // Fool's mate.
        let mut position = Position::startpos();
        for (from, to) in [("f2", "f3"), ("e7", "e5"), ("g2", "g4")] {
            let from = Square::from_algebraic(from).unwrap();
            let to = Square::from_algebraic(to).unwrap();
            position = play(&position, validate(&position, from, to, None).unwrap());
        }
        assert_eq!(render(&position, "d8", "h4"), "Qh4#");
    }
}
