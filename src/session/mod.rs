//! Game-session controller.
//!
//! A [`GameSession`] owns one in-progress game: the live position, move
//! history, whose turn it is, the click-to-move state and the end-of-game
//! status. Every operation takes `&mut self`, so one session never sees
//! overlapping input.
//!
//! Engine replies, coach analysis and saving go through the [`EngineApi`]
//! and [`GameRecorder`] traits (implemented by [`crate::client::ApiClient`]).

mod controller;
pub mod pgn;
pub mod replay;
pub mod selection;
pub mod status;

pub use controller::{EngineApi, GameRecorder, ReplySource, TurnReport};
pub use pgn::{opponent_label, GameSummary};
pub use replay::Replay;
pub use selection::{Click, Selection};
pub use status::{detect_outcome, DrawReason, GameOutcome, RepetitionTable};

use crate::chess::{ChessError, ChessPosition, Color, PlayedMove, Square};
use crate::client::ClientError;
use crate::models::{GameMode, GameResult};
use crate::services::MoveQuality;
use std::collections::HashMap;

/// Lowest and highest selectable engine level.
pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 20;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0}")]
    IllegalMove(#[from] ChessError),

    #[error("Not your turn")]
    WrongTurn,

    #[error("Game is over")]
    GameOver,

    #[error("Waiting for a decision on the coach's feedback")]
    DecisionPending,

    #[error("No coach decision is pending")]
    NoDecisionPending,

    #[error("Nothing to take back")]
    NothingToUndo,

    #[error("No legal moves")]
    NoLegalMoves,

    #[error(transparent)]
    Api(#[from] ClientError),
}

/// Coach verdict on the human's last move.
#[derive(Debug, Clone, PartialEq)]
pub struct CoachFeedback {
    pub quality: MoveQuality,
    pub delta: f64,
    pub eval_before: Option<f64>,
    pub eval_after: Option<f64>,
    /// What the engine would have played instead (UCI)
    pub better_move: String,
}

/// Engine reply held back while the human decides on coach feedback.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDecision {
    pub feedback: CoachFeedback,
    /// Reply to play on accept (UCI)
    pub reply: String,
    pub reply_source: ReplySource,
}

/// Outcome of the at-most-once save.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveState {
    #[default]
    NotSaved,
    /// Saved with this record id.
    Saved(String),
    /// The one attempt failed; it is not retried.
    Failed(String),
}

/// Static options chosen when the game starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub mode: GameMode,
    /// Side the local player controls in bot/coach modes
    pub human_color: Color,
    /// Engine level, used as the requested search depth
    pub level: u8,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            mode: GameMode::Bot,
            human_color: Color::White,
            level: 10,
        }
    }
}

/// One game in progress.
#[derive(Debug, Clone)]
pub struct GameSession {
    options: SessionOptions,
    position: ChessPosition,
    /// Position before each played move, for takebacks
    snapshots: Vec<ChessPosition>,
    moves: Vec<PlayedMove>,
    repetitions: RepetitionTable,
    selection: Selection,
    outcome: Option<GameOutcome>,
    pending: Option<PendingDecision>,
    last_feedback: Option<CoachFeedback>,
    save_state: SaveState,
    /// Hint per position (FEN to UCI)
    hints: HashMap<String, String>,
}

impl GameSession {
    pub fn new(mut options: SessionOptions) -> Self {
        options.level = options.level.clamp(MIN_LEVEL, MAX_LEVEL);
        let position = ChessPosition::new();
        let mut repetitions = RepetitionTable::default();
        repetitions.record(&position);

        Self {
            options,
            position,
            snapshots: Vec::new(),
            moves: Vec::new(),
            repetitions,
            selection: Selection::default(),
            outcome: None,
            pending: None,
            last_feedback: None,
            save_state: SaveState::NotSaved,
            hints: HashMap::new(),
        }
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    pub fn mode(&self) -> GameMode {
        self.options.mode
    }

    pub fn position(&self) -> &ChessPosition {
        &self.position
    }

    pub fn fen(&self) -> String {
        self.position.to_fen()
    }

    pub fn moves(&self) -> &[PlayedMove] {
        &self.moves
    }

    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn pending_decision(&self) -> Option<&PendingDecision> {
        self.pending.as_ref()
    }

    /// Feedback on the most recent human move in coach mode, if any.
    pub fn last_feedback(&self) -> Option<&CoachFeedback> {
        self.last_feedback.as_ref()
    }

    pub fn save_state(&self) -> &SaveState {
        &self.save_state
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    fn engine_plays(&self) -> bool {
        self.options.mode != GameMode::Friend
    }

    /// Whether the local player may move now.
    pub fn is_human_turn(&self) -> bool {
        !self.engine_plays() || self.position.turn() == self.options.human_color
    }

    fn check_can_act(&self) -> Result<(), SessionError> {
        if self.outcome.is_some() {
            return Err(SessionError::GameOver);
        }
        if self.pending.is_some() {
            return Err(SessionError::DecisionPending);
        }
        Ok(())
    }

    /// Handle a click on `square`.
    ///
    /// Returns [`Click::Move`] when a move was chosen; pass it to
    /// [`GameSession::play_move`].
    pub fn click(&mut self, square: Square) -> Result<Click, SessionError> {
        self.check_can_act()?;
        if !self.is_human_turn() {
            self.selection.clear();
            return Err(SessionError::WrongTurn);
        }

        let to_move = self.position.turn();
        let click = self
            .selection
            .click(&self.position, square, |color| color == to_move);
        Ok(click)
    }

    /// Apply a legal move, update repetition counts and detect game end.
    fn apply(&mut self, uci: &str) -> Result<PlayedMove, SessionError> {
        let before = self.position.clone();
        let played = self.position.play_uci(uci)?;

        self.snapshots.push(before);
        self.moves.push(played.clone());
        self.repetitions.record(&self.position);
        self.selection.clear();
        self.outcome = detect_outcome(&self.position, &self.repetitions);

        Ok(played)
    }

    /// Pop the last ply.
    fn unapply(&mut self) -> Option<PlayedMove> {
        let previous = self.snapshots.pop()?;
        self.repetitions.forget(&self.position);
        self.position = previous;
        self.outcome = None;
        self.selection.clear();
        self.moves.pop()
    }

    /// Take back the last turn: the engine reply and the human move, or a
    /// single ply in friend mode. Returns the number of plies removed.
    pub fn takeback(&mut self) -> Result<usize, SessionError> {
        self.check_can_act()?;

        let plies = if !self.engine_plays() {
            1
        } else if self.position.turn() == self.options.human_color {
            2
        } else {
            1
        };
        if self.moves.len() < plies {
            return Err(SessionError::NothingToUndo);
        }

        for _ in 0..plies {
            self.unapply();
        }
        self.last_feedback = None;
        Ok(plies)
    }

    /// Result from the local player's side (White's in friend mode).
    pub fn result(&self) -> Option<GameResult> {
        let outcome = self.outcome?;
        let viewpoint = if self.engine_plays() {
            self.options.human_color
        } else {
            Color::White
        };
        Some(match outcome.winner() {
            None => GameResult::Draw,
            Some(winner) if winner == viewpoint => GameResult::Win,
            Some(_) => GameResult::Loss,
        })
    }

    /// Movetext of the game so far, with a result token once it is over.
    pub fn pgn(&self) -> String {
        let sans: Vec<&str> = self.moves.iter().map(|m| m.san.as_str()).collect();
        pgn::movetext(&sans, self.outcome.map(GameOutcome::result_token))
    }

    /// Summary to store, available once the game is over.
    pub fn summary(&self) -> Option<GameSummary> {
        Some(GameSummary {
            opponent: opponent_label(self.options.mode, self.options.level),
            mode: self.options.mode,
            result: self.result()?,
            pgn: self.pgn(),
            moves_count: self.moves.len() as u32,
        })
    }
}
