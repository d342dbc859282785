//! Legal move generation and validation.
//!
//! Generation is two-phase: each piece kind contributes its pseudo-legal
//! moves, then a filter pass applies every candidate to a scratch position
//! and drops the ones that leave the mover's own king attacked. Castling is
//! gated up front (rights, empty path, no attacked transit square) so the
//! filter only has to handle ordinary self-check.

pub mod attacks;
pub mod perft;

use std::fmt;

use thiserror::Error;

use study_core::{Color, File, Move, MoveKind, Piece, Square};

use crate::bitboard::Bitboard;
use crate::position::Position;

const MAX_MOVES: usize = 256;

/// Fixed-capacity move buffer. 256 slots is comfortably above the known
/// maximum for reachable chess positions.
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    len: usize,
}

impl MoveList {
    pub const fn new() -> MoveList {
        MoveList {
            moves: [Move::NULL; MAX_MOVES],
            len: 0,
        }
    }

    fn push(&mut self, mv: Move) {
        debug_assert!(self.len < MAX_MOVES);
        self.moves[self.len] = mv;
        self.len += 1;
    }

    fn retain(&mut self, mut keep: impl FnMut(Move) -> bool) {
        let mut kept = 0;
        for i in 0..self.len {
            if keep(self.moves[i]) {
                self.moves[kept] = self.moves[i];
                kept += 1;
            }
        }
        self.len = kept;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }

    pub fn iter(&self) -> impl Iterator<Item = Move> + '_ {
        self.as_slice().iter().copied()
    }
}

impl Default for MoveList {
    fn default() -> MoveList {
        MoveList::new()
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = Move;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Move>>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter().copied()
    }
}

impl fmt::Debug for MoveList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|mv| mv.to_uci()))
            .finish()
    }
}

/// Every legal move for the side to move. Order is unspecified.
pub fn legal_moves(position: &Position) -> MoveList {
    let mut list = MoveList::new();
    pawn_moves(position, &mut list);
    knight_moves(position, &mut list);
    slider_moves(position, &mut list);
    king_moves(position, &mut list);
    castle_moves(position, &mut list);

    let us = position.side_to_move;
    list.retain(|mv| {
        let after = play(position, mv);
        match after.king_square(us) {
            Some(king) => !attacked(&after, king, us.opposite()),
            None => false,
        }
    });
    list
}

/// Is `square` attacked by any piece of `by`?
pub fn attacked(position: &Position, square: Square, by: Color) -> bool {
    let them = position.occupied_by(by);
    let occupied = position.occupied();

    // A pawn of `by` attacks `square` exactly when a pawn of the other
    // color standing on `square` would attack the pawn's square.
    if (attacks::pawn(by.opposite(), square) & position.pieces[Piece::Pawn.index()] & them).any()
    {
        return true;
    }
    if (attacks::knight(square) & position.pieces[Piece::Knight.index()] & them).any() {
        return true;
    }
    if (attacks::king(square) & position.pieces[Piece::King.index()] & them).any() {
        return true;
    }
    let diagonal = position.pieces[Piece::Bishop.index()] | position.pieces[Piece::Queen.index()];
    if (attacks::bishop(square, occupied) & diagonal & them).any() {
        return true;
    }
    let straight = position.pieces[Piece::Rook.index()] | position.pieces[Piece::Queen.index()];
    (attacks::rook(square, occupied) & straight & them).any()
}

/// Is the side to move currently in check?
pub fn in_check(position: &Position) -> bool {
    match position.king_square(position.side_to_move) {
        Some(king) => attacked(position, king, position.side_to_move.opposite()),
        None => false,
    }
}

pub(crate) fn has_legal_en_passant(position: &Position) -> bool {
    position.en_passant.is_some()
        && legal_moves(position)
            .iter()
            .any(|mv| mv.kind() == MoveKind::EnPassant)
}

/// How [`validate_with`] treats a promotion request that names no piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromotionPolicy {
    /// Promote to a queen when the caller does not say otherwise.
    #[default]
    QueenByDefault,
    /// Refuse to guess; the caller must name the piece.
    Explicit,
}

/// A promotion move was requested without naming the promotion piece, and
/// the caller opted out of queen-defaulting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("move {from}{to} promotes and needs an explicit piece")]
pub struct AmbiguousPromotion {
    pub from: Square,
    pub to: Square,
}

/// Resolves a (from, to, promotion) request against the legal moves.
///
/// `None` means the request is not a legal move. A promotion with no piece
/// named resolves to the queen promotion. A named promotion piece on a
/// non-promotion move is ignored.
pub fn validate(
    position: &Position,
    from: Square,
    to: Square,
    promotion: Option<Piece>,
) -> Option<Move> {
    validate_with(position, from, to, promotion, PromotionPolicy::QueenByDefault).unwrap_or(None)
}

/// [`validate`] with an explicit promotion policy. Only
/// [`PromotionPolicy::Explicit`] can produce the error.
pub fn validate_with(
    position: &Position,
    from: Square,
    to: Square,
    promotion: Option<Piece>,
    policy: PromotionPolicy,
) -> Result<Option<Move>, AmbiguousPromotion> {
    let mut queen_default = None;
    for mv in &legal_moves(position) {
        if mv.from() != from || mv.to() != to {
            continue;
        }
        match mv.kind().promotion() {
            None => return Ok(Some(mv)),
            Some(piece) => match promotion {
                Some(wanted) if piece == wanted => return Ok(Some(mv)),
                Some(_) => {}
                None => {
                    if piece == Piece::Queen {
                        queen_default = Some(mv);
                    }
                }
            },
        }
    }
    match queen_default {
        Some(mv) => match policy {
            PromotionPolicy::QueenByDefault => Ok(Some(mv)),
            PromotionPolicy::Explicit => Err(AmbiguousPromotion { from, to }),
        },
        None => Ok(None),
    }
}

/// Applies a legal move and returns the resulting position.
///
/// The move must come from [`legal_moves`] or [`validate`] for this
/// position; feeding anything else is a programming error.
pub fn play(position: &Position, mv: Move) -> Position {
    let mut next = position.clone();
    let us = position.side_to_move;
    let from = mv.from();
    let to = mv.to();
    let (piece, _) = position.piece_at(from).expect("move origin holds a piece");

    let mut is_capture = false;
    if let Some((victim, owner)) = position.piece_at(to) {
        next.remove(to, victim, owner);
        is_capture = true;
    }
    next.remove(from, piece, us);

    match mv.kind() {
        MoveKind::EnPassant => {
            if let Some(victim) = offset(to, -pawn_advance(us)) {
                next.remove(victim, Piece::Pawn, us.opposite());
            }
            next.put(to, Piece::Pawn, us);
            is_capture = true;
        }
        MoveKind::CastleShort => {
            next.put(to, Piece::King, us);
            let rank = us.back_rank();
            next.remove(Square::new(File::H, rank), Piece::Rook, us);
            next.put(Square::new(File::F, rank), Piece::Rook, us);
        }
        MoveKind::CastleLong => {
            next.put(to, Piece::King, us);
            let rank = us.back_rank();
            next.remove(Square::new(File::A, rank), Piece::Rook, us);
            next.put(Square::new(File::D, rank), Piece::Rook, us);
        }
        kind => {
            let placed = kind.promotion().unwrap_or(piece);
            next.put(to, placed, us);
        }
    }

    next.castling = next.castling.cleared_for(from).cleared_for(to);
    next.en_passant = if mv.kind() == MoveKind::DoublePush {
        offset(from, pawn_advance(us))
    } else {
        None
    };
    next.halfmove_clock = if piece == Piece::Pawn || is_capture {
        0
    } else {
        position.halfmove_clock + 1
    };
    if us == Color::Black {
        next.fullmove_number += 1;
    }
    next.side_to_move = us.opposite();
    next
}

fn pawn_moves(position: &Position, list: &mut MoveList) {
    let us = position.side_to_move;
    let enemies = position.occupied_by(us.opposite());
    let occupied = position.occupied();
    let forward = pawn_advance(us);

    for from in position.pieces_of(Piece::Pawn, us) {
        if let Some(ahead) = offset(from, forward) {
            if !occupied.contains(ahead) {
                push_pawn(list, us, from, ahead);
                if from.rank() == us.pawn_start_rank() {
                    if let Some(two_ahead) = offset(ahead, forward) {
                        if !occupied.contains(two_ahead) {
                            list.push(Move::new(from, two_ahead, MoveKind::DoublePush));
                        }
                    }
                }
            }
        }
        for to in attacks::pawn(us, from) & enemies {
            push_pawn(list, us, from, to);
        }
        if let Some(target) = position.en_passant {
            if attacks::pawn(us, from).contains(target) {
                list.push(Move::new(from, target, MoveKind::EnPassant));
            }
        }
    }
}

fn push_pawn(list: &mut MoveList, us: Color, from: Square, to: Square) {
    if to.rank() == us.promotion_rank() {
        for kind in [
            MoveKind::PromoteQueen,
            MoveKind::PromoteRook,
            MoveKind::PromoteBishop,
            MoveKind::PromoteKnight,
        ] {
            list.push(Move::new(from, to, kind));
        }
    } else {
        list.push(Move::plain(from, to));
    }
}

fn knight_moves(position: &Position, list: &mut MoveList) {
    let us = position.side_to_move;
    let own = position.occupied_by(us);
    for from in position.pieces_of(Piece::Knight, us) {
        for to in attacks::knight(from) & !own {
            list.push(Move::plain(from, to));
        }
    }
}

fn slider_moves(position: &Position, list: &mut MoveList) {
    let us = position.side_to_move;
    let own = position.occupied_by(us);
    let occupied = position.occupied();
    let sliders: [(Piece, fn(Square, Bitboard) -> Bitboard); 3] = [
        (Piece::Bishop, attacks::bishop),
        (Piece::Rook, attacks::rook),
        (Piece::Queen, attacks::queen),
    ];
    for (piece, attack) in sliders {
        for from in position.pieces_of(piece, us) {
            for to in attack(from, occupied) & !own {
                list.push(Move::plain(from, to));
            }
        }
    }
}

fn king_moves(position: &Position, list: &mut MoveList) {
    let us = position.side_to_move;
    let own = position.occupied_by(us);
    for from in position.pieces_of(Piece::King, us) {
        for to in attacks::king(from) & !own {
            list.push(Move::plain(from, to));
        }
    }
}

fn castle_moves(position: &Position, list: &mut MoveList) {
    let us = position.side_to_move;
    let them = us.opposite();
    let rank = us.back_rank();
    let king_home = Square::new(File::E, rank);

    // Rights can outlive a scrambled board in hand-written FENs; require the
    // actual king and rook placement before generating anything.
    if position.pieces_of(Piece::King, us) != Bitboard::from_square(king_home) {
        return;
    }
    if attacked(position, king_home, them) {
        return;
    }
    let occupied = position.occupied();
    let rooks = position.pieces_of(Piece::Rook, us);

    if position.castling.has_short(us) && rooks.contains(Square::new(File::H, rank)) {
        let f = Square::new(File::F, rank);
        let g = Square::new(File::G, rank);
        if !occupied.contains(f)
            && !occupied.contains(g)
            && !attacked(position, f, them)
            && !attacked(position, g, them)
        {
            list.push(Move::new(king_home, g, MoveKind::CastleShort));
        }
    }
    if position.castling.has_long(us) && rooks.contains(Square::new(File::A, rank)) {
        let d = Square::new(File::D, rank);
        let c = Square::new(File::C, rank);
        let b = Square::new(File::B, rank);
        if !occupied.contains(d)
            && !occupied.contains(c)
            && !occupied.contains(b)
            && !attacked(position, d, them)
            && !attacked(position, c, them)
        {
            list.push(Move::new(king_home, c, MoveKind::CastleLong));
        }
    }
}

#[inline]
const fn pawn_advance(color: Color) -> i8 {
    match color {
        Color::White => 8,
        Color::Black => -8,
    }
}

fn offset(square: Square, delta: i8) -> Option<Square> {
    let index = square.index() as i8 + delta;
    if (0..64).contains(&index) {
        Square::from_index(index as u8)
    } else {
        None
    }
}
