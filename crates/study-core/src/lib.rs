//! Core chess vocabulary shared by the study board crates.
//!
//! This crate defines the plain value types every layer above speaks in:
//! colors, piece kinds, squares, castling rights, the packed [`Move`]
//! representation with its UCI codec, and the typed FEN field parser. It
//! holds no board state and applies no rules; legality lives in the engine
//! crate.

pub mod castling;
pub mod color;
pub mod fen;
pub mod mov;
pub mod piece;
pub mod square;

pub use castling::CastlingRights;
pub use color::Color;
pub use fen::{FenError, FenFields, START_FEN};
pub use mov::{Move, MoveKind};
pub use piece::Piece;
pub use square::{File, Rank, Square};
