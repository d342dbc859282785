//! Chess rules on bitboards.
//!
//! This crate owns the rules heart of the system: [`Position`] plus the
//! pure functions that interrogate it. [`legal_moves`] produces every move
//! the side to move may play, [`validate`] turns a from/to intent into a
//! fully qualified [`Move`](study_core::Move), [`play`] applies one, and
//! [`game_status`] classifies the result. Positions are cheap to clone and
//! every operation returns a fresh value, so callers can branch a game tree
//! without undo bookkeeping.

pub mod bitboard;
pub mod movegen;
pub mod position;
pub mod san;
pub mod status;
mod zobrist;

pub use bitboard::Bitboard;
pub use movegen::{
    attacked, in_check, legal_moves, perft::perft, play, validate, validate_with,
    AmbiguousPromotion, MoveList, PromotionPolicy,
};
pub use position::{Position, PositionError};
pub use san::san;
pub use status::{game_status, DrawReason, GameStatus};
