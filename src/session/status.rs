//! End-of-game detection.

use crate::chess::{ChessPosition, Color};
use std::collections::HashMap;

/// Plies without capture or pawn move that end the game.
const FIFTY_MOVE_PLIES: u32 = 100;
/// Occurrences of one position that end the game.
const REPETITION_LIMIT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawReason {
    FiftyMoveRule,
    Stalemate,
    InsufficientMaterial,
    ThreefoldRepetition,
}

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Checkmate { winner: Color },
    Resignation { winner: Color },
    Draw { reason: DrawReason },
}

impl GameOutcome {
    pub fn winner(self) -> Option<Color> {
        match self {
            GameOutcome::Checkmate { winner } | GameOutcome::Resignation { winner } => Some(winner),
            GameOutcome::Draw { .. } => None,
        }
    }

    /// PGN result token.
    pub fn result_token(self) -> &'static str {
        match self.winner() {
            Some(Color::White) => "1-0",
            Some(Color::Black) => "0-1",
            None => "1/2-1/2",
        }
    }
}

/// Position occurrence counts, keyed by [`ChessPosition::repetition_key`].
#[derive(Debug, Clone, Default)]
pub struct RepetitionTable {
    counts: HashMap<String, u32>,
}

impl RepetitionTable {
    pub fn record(&mut self, position: &ChessPosition) -> u32 {
        let count = self.counts.entry(position.repetition_key()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn forget(&mut self, position: &ChessPosition) {
        let key = position.repetition_key();
        if let Some(count) = self.counts.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(&key);
            }
        }
    }

    pub fn count(&self, position: &ChessPosition) -> u32 {
        self.counts
            .get(&position.repetition_key())
            .copied()
            .unwrap_or(0)
    }
}

/// Decide whether `position` ends the game.
///
/// Checked in order: checkmate, fifty-move rule, stalemate, insufficient
/// material, threefold repetition.
pub fn detect_outcome(position: &ChessPosition, repetitions: &RepetitionTable) -> Option<GameOutcome> {
    if position.is_checkmate() {
        return Some(GameOutcome::Checkmate {
            winner: !position.turn(),
        });
    }

    let reason = if position.halfmove_clock() >= FIFTY_MOVE_PLIES {
        DrawReason::FiftyMoveRule
    } else if position.is_stalemate() {
        DrawReason::Stalemate
    } else if position.is_insufficient_material() {
        DrawReason::InsufficientMaterial
    } else if repetitions.count(position) >= REPETITION_LIMIT {
        DrawReason::ThreefoldRepetition
    } else {
        return None;
    };
    Some(GameOutcome::Draw { reason })
}
