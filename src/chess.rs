//! Chess rules integration with shakmaty.
//!
//! All legality decisions (move generation, check, mate, stalemate,
//! insufficient material) are made by shakmaty. This module adapts it to
//! the string/square vocabulary used by the API and the session controller.

use serde::{Deserialize, Serialize};
use shakmaty::{
    fen::Fen,
    san::{San, SanPlus},
    uci::UciMove,
    CastlingMode, Chess, EnPassantMode, Move, Position, Role,
};
use std::str::FromStr;
use thiserror::Error;

pub use shakmaty::{Color, Square};

/// Errors that can occur during chess operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChessError {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("invalid UCI move: {0}")]
    InvalidUciMove(String),

    #[error("invalid SAN move: {0}")]
    InvalidSan(String),

    #[error("illegal move: {0}")]
    IllegalMove(String),

    #[error("invalid square: {0}")]
    InvalidSquare(String),
}

/// A move that has been applied to a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayedMove {
    /// Standard UCI notation (castling as king move, e.g. `e1g1`)
    pub uci: String,
    /// SAN with check/mate suffix
    pub san: String,
    pub fen_before: String,
    pub fen_after: String,
}

/// A chess position backed by shakmaty.
#[derive(Debug, Clone, Default)]
pub struct ChessPosition {
    position: Chess,
}

impl ChessPosition {
    /// Standard starting position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let fen: Fen = fen
            .trim()
            .parse()
            .map_err(|e| ChessError::InvalidFen(format!("{e}")))?;
        let position: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| ChessError::InvalidFen(format!("{e}")))?;
        Ok(Self { position })
    }

    pub fn to_fen(&self) -> String {
        Fen::from_position(self.position.clone(), EnPassantMode::Legal).to_string()
    }

    /// Placement, side to move, castling rights and en passant square.
    ///
    /// Two positions with the same key are the same position for the
    /// repetition rule.
    pub fn repetition_key(&self) -> String {
        self.to_fen()
            .split(' ')
            .take(4)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    pub fn is_check(&self) -> bool {
        self.position.is_check()
    }

    pub fn is_checkmate(&self) -> bool {
        self.position.is_checkmate()
    }

    pub fn is_stalemate(&self) -> bool {
        self.position.is_stalemate()
    }

    pub fn is_insufficient_material(&self) -> bool {
        self.position.is_insufficient_material()
    }

    /// Plies since the last capture or pawn move.
    pub fn halfmove_clock(&self) -> u32 {
        self.position.halfmoves()
    }

    pub fn fullmove_number(&self) -> u32 {
        self.position.fullmoves().get()
    }

    /// Color of the piece on `square`, if any.
    pub fn piece_color_at(&self, square: Square) -> Option<Color> {
        self.position.board().color_at(square)
    }

    /// Legal moves in standard UCI notation.
    pub fn legal_uci_moves(&self) -> Vec<String> {
        self.position
            .legal_moves()
            .iter()
            .map(|m| UciMove::from_move(m, CastlingMode::Standard).to_string())
            .collect()
    }

    /// Destination squares of the legal moves starting on `from`.
    ///
    /// Castling is reported as the king's destination square.
    pub fn destinations(&self, from: Square) -> Vec<Square> {
        let mut squares: Vec<Square> = self
            .position
            .legal_moves()
            .iter()
            .filter_map(|m| match UciMove::from_move(m, CastlingMode::Standard) {
                UciMove::Normal {
                    from: origin, to, ..
                } if origin == from => Some(to),
                _ => None,
            })
            .collect();
        squares.sort();
        squares.dedup();
        squares
    }

    /// Find the legal move from `from` to `to`, promoting to a queen when
    /// the move is a promotion.
    pub fn find_move(&self, from: Square, to: Square) -> Option<String> {
        let candidates: Vec<UciMove> = self
            .position
            .legal_moves()
            .iter()
            .map(|m| UciMove::from_move(m, CastlingMode::Standard))
            .filter(|uci| {
                matches!(uci, UciMove::Normal { from: f, to: t, .. } if *f == from && *t == to)
            })
            .collect();

        candidates
            .iter()
            .find(|uci| {
                matches!(
                    uci,
                    UciMove::Normal {
                        promotion: Some(Role::Queen),
                        ..
                    }
                )
            })
            .or_else(|| candidates.first())
            .map(|uci| uci.to_string())
    }

    /// Validate and apply a move given in UCI notation.
    pub fn play_uci(&mut self, uci: &str) -> Result<PlayedMove, ChessError> {
        let parsed = UciMove::from_str(uci.trim())
            .map_err(|_| ChessError::InvalidUciMove(uci.to_string()))?;
        let m = parsed
            .to_move(&self.position)
            .map_err(|_| ChessError::IllegalMove(uci.to_string()))?;
        Ok(self.apply(&m))
    }

    /// Validate and apply a move given in SAN (check/mate suffix optional).
    pub fn play_san(&mut self, san: &str) -> Result<PlayedMove, ChessError> {
        let parsed =
            SanPlus::from_str(san.trim()).map_err(|_| ChessError::InvalidSan(san.to_string()))?;
        let m = parsed
            .san
            .to_move(&self.position)
            .map_err(|_| ChessError::IllegalMove(san.to_string()))?;
        Ok(self.apply(&m))
    }

    /// Apply a move already known to be legal here.
    fn apply(&mut self, m: &Move) -> PlayedMove {
        let fen_before = self.to_fen();
        let san = San::from_move(&self.position, m).to_string();
        let uci = UciMove::from_move(m, CastlingMode::Standard).to_string();

        self.position.play_unchecked(m);

        let suffix = if self.position.is_checkmate() {
            "#"
        } else if self.position.is_check() {
            "+"
        } else {
            ""
        };

        PlayedMove {
            uci,
            san: format!("{san}{suffix}"),
            fen_before,
            fen_after: self.to_fen(),
        }
    }
}

/// Parse a square name such as `e4`.
pub fn parse_square(name: &str) -> Result<Square, ChessError> {
    name.trim()
        .parse()
        .map_err(|_| ChessError::InvalidSquare(name.to_string()))
}
