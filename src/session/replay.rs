//! Step through a stored game.

use super::pgn::san_tokens;
use crate::chess::{ChessError, ChessPosition, PlayedMove};

/// A parsed game that can be viewed at any ply.
///
/// Built from its own scratch position, so viewing a stored game never
/// touches a live session.
#[derive(Debug, Clone)]
pub struct Replay {
    start_fen: String,
    moves: Vec<PlayedMove>,
    ply: usize,
}

impl Replay {
    /// Parse movetext from the standard starting position.
    pub fn from_pgn(pgn: &str) -> Result<Self, ChessError> {
        let mut scratch = ChessPosition::new();
        let start_fen = scratch.to_fen();
        let moves = san_tokens(pgn)
            .iter()
            .map(|san| scratch.play_san(san))
            .collect::<Result<Vec<_>, _>>()?;
        let ply = moves.len();

        Ok(Self {
            start_fen,
            moves,
            ply,
        })
    }

    /// Number of plies in the game.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn moves(&self) -> &[PlayedMove] {
        &self.moves
    }

    /// Current ply (0 = starting position).
    pub fn ply(&self) -> usize {
        self.ply
    }

    /// FEN after `ply` half-moves, clamped to the game length.
    pub fn fen_at(&self, ply: usize) -> &str {
        match ply.min(self.moves.len()) {
            0 => &self.start_fen,
            n => &self.moves[n - 1].fen_after,
        }
    }

    /// Jump to `ply` and return the position there.
    pub fn seek(&mut self, ply: usize) -> Result<ChessPosition, ChessError> {
        self.ply = ply.min(self.moves.len());
        ChessPosition::from_fen(self.fen_at(self.ply))
    }

    pub fn step_forward(&mut self) -> Option<&PlayedMove> {
        if self.ply < self.moves.len() {
            self.ply += 1;
            Some(&self.moves[self.ply - 1])
        } else {
            None
        }
    }

    pub fn step_back(&mut self) -> Option<&PlayedMove> {
        if self.ply > 0 {
            self.ply -= 1;
            Some(&self.moves[self.ply])
        } else {
            None
        }
    }
}
