use thiserror::Error;

use crate::castling::CastlingRights;
use crate::color::Color;
use crate::piece::Piece;
use crate::square::{File, Rank, Square};

/// FEN for the standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Why a FEN string failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("FEN has {0} fields, expected 6")]
    FieldCount(usize),
    #[error("bad piece placement: {0}")]
    BadPlacement(String),
    #[error("bad side to move: {0:?}")]
    BadSideToMove(String),
    #[error("bad castling field: {0:?}")]
    BadCastling(String),
    #[error("bad en passant field: {0:?}")]
    BadEnPassant(String),
    #[error("bad halfmove clock: {0:?}")]
    BadHalfmoveClock(String),
    #[error("bad fullmove number: {0:?}")]
    BadFullmoveNumber(String),
}

/// The six FEN fields, parsed into typed values.
///
/// Parsing checks syntax only: field count, rank shapes, piece letters, and
/// token forms. Whether the described position is playable (king counts and
/// so on) is the board constructor's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenFields {
    pub placement: Vec<(Square, Piece, Color)>,
    pub side_to_move: Color,
    pub castling: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

impl FenFields {
    pub fn parse(fen: &str) -> Result<FenFields, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(FenError::FieldCount(fields.len()));
        }
        Ok(FenFields {
            placement: parse_placement(fields[0])?,
            side_to_move: parse_side(fields[1])?,
            castling: parse_castling(fields[2])?,
            en_passant: parse_en_passant(fields[3])?,
            halfmove_clock: fields[4]
                .parse()
                .map_err(|_| FenError::BadHalfmoveClock(fields[4].to_string()))?,
            fullmove_number: fields[5]
                .parse()
                .map_err(|_| FenError::BadFullmoveNumber(fields[5].to_string()))?,
        })
    }
}

fn parse_placement(text: &str) -> Result<Vec<(Square, Piece, Color)>, FenError> {
    let rows: Vec<&str> = text.split('/').collect();
    if rows.len() != 8 {
        return Err(FenError::BadPlacement(format!(
            "{} ranks, expected 8",
            rows.len()
        )));
    }
    let mut placement = Vec::with_capacity(32);
    for (row_index, row) in rows.iter().enumerate() {
        // FEN lists ranks from the top, so rank 8 comes first.
        let rank = Rank::ALL[7 - row_index];
        let mut file = 0u8;
        for c in row.chars() {
            if let Some(skip) = c.to_digit(10) {
                if skip == 0 {
                    return Err(FenError::BadPlacement(format!(
                        "zero skip in rank {}",
                        rank.to_char()
                    )));
                }
                file += skip as u8;
                if file > 8 {
                    return Err(FenError::BadPlacement(format!(
                        "rank {} overflows",
                        rank.to_char()
                    )));
                }
            } else if let Some((piece, color)) = Piece::from_fen_char(c) {
                match File::from_index(file) {
                    Some(f) => placement.push((Square::new(f, rank), piece, color)),
                    None => {
                        return Err(FenError::BadPlacement(format!(
                            "rank {} overflows",
                            rank.to_char()
                        )))
                    }
                }
                file += 1;
            } else {
                return Err(FenError::BadPlacement(format!("invalid letter {c:?}")));
            }
        }
        if file != 8 {
            return Err(FenError::BadPlacement(format!(
                "rank {} covers {} files, expected 8",
                rank.to_char(),
                file
            )));
        }
    }
    Ok(placement)
}

fn parse_side(text: &str) -> Result<Color, FenError> {
    let mut chars = text.chars();
    match (chars.next().and_then(Color::from_fen_char), chars.next()) {
        (Some(color), None) => Ok(color),
        _ => Err(FenError::BadSideToMove(text.to_string())),
    }
}

fn parse_castling(text: &str) -> Result<CastlingRights, FenError> {
    if text == "-" {
        return Ok(CastlingRights::NONE);
    }
    if text.is_empty() || text.len() > 4 {
        return Err(FenError::BadCastling(text.to_string()));
    }
    let mut rights = CastlingRights::NONE;
    for c in text.chars() {
        rights = match c {
            'K' => rights.with_short(Color::White),
            'Q' => rights.with_long(Color::White),
            'k' => rights.with_short(Color::Black),
            'q' => rights.with_long(Color::Black),
            _ => return Err(FenError::BadCastling(text.to_string())),
        };
    }
    Ok(rights)
}

fn parse_en_passant(text: &str) -> Result<Option<Square>, FenError> {
    if text == "-" {
        return Ok(None);
    }
    match Square::from_algebraic(text) {
        // The target square is always behind a just-pushed pawn.
        Some(square) if matches!(square.rank(), Rank::R3 | Rank::R6) => Ok(Some(square)),
        _ => Err(FenError::BadEnPassant(text.to_string())),
    }
}
