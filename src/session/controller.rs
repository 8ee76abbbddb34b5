//! Engine and coach orchestration for a [`GameSession`].

use super::{CoachFeedback, GameSession, GameSummary, PendingDecision, SaveState, SessionError};
use crate::chess::{ChessError, PlayedMove};
use crate::client::ClientError;
use crate::models::{GameMode, GameRecord};
use crate::services::{EngineMove, MoveAnalysis};
use crate::session::GameOutcome;
use async_trait::async_trait;
use rand::seq::SliceRandom;

/// Engine proxy as seen by a session.
#[async_trait]
pub trait EngineApi: Send + Sync {
    async fn best_move(&self, fen: &str, depth: u8) -> Result<EngineMove, ClientError>;

    async fn analyze(
        &self,
        fen_before: &str,
        fen_after: &str,
        depth: u8,
    ) -> Result<MoveAnalysis, ClientError>;
}

/// Where finished games are stored.
#[async_trait]
pub trait GameRecorder: Send + Sync {
    async fn save_game(&self, summary: &GameSummary) -> Result<GameRecord, ClientError>;
}

/// Who picked the engine side's move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Engine,
    /// Engine failed or suggested an illegal move
    RandomFallback,
}

/// What happened during one call into the session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TurnReport {
    /// The local player's move
    pub played: Option<PlayedMove>,
    /// Coach verdict on `played`
    pub feedback: Option<CoachFeedback>,
    /// The engine side's move
    pub reply: Option<PlayedMove>,
    pub reply_source: Option<ReplySource>,
    /// The reply is held until `accept_reply` or `undo_mistake`
    pub awaiting_decision: bool,
    pub outcome: Option<GameOutcome>,
}

impl GameSession {
    /// Let the engine open the game when the local player has Black.
    pub async fn start<E, R>(&mut self, engine: &E, recorder: &R) -> Result<TurnReport, SessionError>
    where
        E: EngineApi + ?Sized,
        R: GameRecorder + ?Sized,
    {
        self.check_can_act()?;
        let mut report = TurnReport::default();
        if !self.is_human_turn() {
            let (reply, source) = self.choose_reply(engine).await?;
            self.play_reply(&reply, source, recorder, &mut report).await?;
        }
        Ok(report)
    }

    /// Play the local player's move (UCI), then the engine's answer in
    /// bot/coach modes.
    ///
    /// In coach mode a mistake or blunder holds the answer back; the session
    /// then only accepts [`GameSession::accept_reply`] or
    /// [`GameSession::undo_mistake`].
    pub async fn play_move<E, R>(
        &mut self,
        uci: &str,
        engine: &E,
        recorder: &R,
    ) -> Result<TurnReport, SessionError>
    where
        E: EngineApi + ?Sized,
        R: GameRecorder + ?Sized,
    {
        self.check_can_act()?;
        if !self.is_human_turn() {
            return Err(SessionError::WrongTurn);
        }

        let played = self.apply(uci)?;
        self.last_feedback = None;
        let mut report = TurnReport {
            played: Some(played.clone()),
            ..TurnReport::default()
        };

        if self.outcome.is_some() {
            self.finish(recorder).await;
            report.outcome = self.outcome;
            return Ok(report);
        }
        if !self.engine_plays() {
            return Ok(report);
        }

        let feedback = if self.options.mode == GameMode::Coach {
            self.review(engine, &played).await
        } else {
            None
        };
        self.last_feedback = feedback.clone();
        report.feedback = feedback.clone();

        let (reply, reply_source) = self.choose_reply(engine).await?;
        match feedback {
            Some(feedback) if feedback.quality.needs_review() => {
                tracing::debug!(
                    quality = ?feedback.quality,
                    delta = feedback.delta,
                    "Holding engine reply for review"
                );
                self.pending = Some(PendingDecision {
                    feedback,
                    reply,
                    reply_source,
                });
                report.awaiting_decision = true;
            }
            _ => {
                self.play_reply(&reply, reply_source, recorder, &mut report)
                    .await?;
            }
        }

        Ok(report)
    }

    /// Keep the flagged move and let the held reply be played.
    pub async fn accept_reply<R>(&mut self, recorder: &R) -> Result<TurnReport, SessionError>
    where
        R: GameRecorder + ?Sized,
    {
        let pending = self.pending.take().ok_or(SessionError::NoDecisionPending)?;
        let mut report = TurnReport::default();
        self.play_reply(&pending.reply, pending.reply_source, recorder, &mut report)
            .await?;
        Ok(report)
    }

    /// Take back the flagged move and discard the held reply.
    pub fn undo_mistake(&mut self) -> Result<PlayedMove, SessionError> {
        self.pending.take().ok_or(SessionError::NoDecisionPending)?;
        self.last_feedback = None;
        self.unapply().ok_or(SessionError::NothingToUndo)
    }

    /// Engine's best move for the local player here (UCI), cached per position.
    pub async fn hint<E>(&mut self, engine: &E) -> Result<String, SessionError>
    where
        E: EngineApi + ?Sized,
    {
        self.check_can_act()?;
        if !self.is_human_turn() {
            return Err(SessionError::WrongTurn);
        }

        let fen = self.position.to_fen();
        if let Some(hint) = self.hints.get(&fen) {
            return Ok(hint.clone());
        }

        let suggestion = engine.best_move(&fen, self.options.level).await?;
        if !self.position.legal_uci_moves().contains(&suggestion.bestmove) {
            return Err(ChessError::IllegalMove(suggestion.bestmove).into());
        }
        self.hints.insert(fen, suggestion.bestmove.clone());
        Ok(suggestion.bestmove)
    }

    /// Resign for the local player (the side to move in friend mode).
    pub async fn resign<R>(&mut self, recorder: &R) -> Result<GameOutcome, SessionError>
    where
        R: GameRecorder + ?Sized,
    {
        if self.outcome.is_some() {
            return Err(SessionError::GameOver);
        }

        let loser = if self.engine_plays() {
            self.options.human_color
        } else {
            self.position.turn()
        };
        let outcome = GameOutcome::Resignation { winner: !loser };
        self.pending = None;
        self.selection.clear();
        self.outcome = Some(outcome);

        self.finish(recorder).await;
        Ok(outcome)
    }

    async fn play_reply<R>(
        &mut self,
        uci: &str,
        source: ReplySource,
        recorder: &R,
        report: &mut TurnReport,
    ) -> Result<(), SessionError>
    where
        R: GameRecorder + ?Sized,
    {
        let reply = self.apply(uci)?;
        report.reply = Some(reply);
        report.reply_source = Some(source);

        if self.outcome.is_some() {
            self.finish(recorder).await;
            report.outcome = self.outcome;
        }
        Ok(())
    }

    /// Ask the engine for its move, falling back to a random legal move.
    async fn choose_reply<E>(&self, engine: &E) -> Result<(String, ReplySource), SessionError>
    where
        E: EngineApi + ?Sized,
    {
        let fen = self.position.to_fen();
        match engine.best_move(&fen, self.options.level).await {
            Ok(m) if self.position.legal_uci_moves().contains(&m.bestmove) => {
                return Ok((m.bestmove, ReplySource::Engine));
            }
            Ok(m) => {
                tracing::warn!(bestmove = %m.bestmove, fen = %fen, "Engine move is illegal here");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Engine unavailable");
            }
        }

        let fallback = self.random_move()?;
        tracing::info!(uci = %fallback, "Playing random fallback move");
        Ok((fallback, ReplySource::RandomFallback))
    }

    fn random_move(&self) -> Result<String, SessionError> {
        self.position
            .legal_uci_moves()
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(SessionError::NoLegalMoves)
    }

    /// Coach analysis of the local player's move. Failure means no feedback.
    async fn review<E>(&self, engine: &E, played: &PlayedMove) -> Option<CoachFeedback>
    where
        E: EngineApi + ?Sized,
    {
        let analysis = match engine
            .analyze(&played.fen_before, &played.fen_after, self.options.level)
            .await
        {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!(error = %e, uci = %played.uci, "Move analysis failed");
                return None;
            }
        };

        let quality = analysis.classification?;
        let delta = analysis.delta?;
        Some(CoachFeedback {
            quality,
            delta,
            eval_before: analysis.eval_before,
            eval_after: analysis.eval_after,
            better_move: analysis.best_move,
        })
    }

    /// Save the finished game. Runs at most once per session.
    async fn finish<R>(&mut self, recorder: &R)
    where
        R: GameRecorder + ?Sized,
    {
        if self.save_state != SaveState::NotSaved {
            return;
        }
        let Some(summary) = self.summary() else {
            return;
        };

        self.save_state = match recorder.save_game(&summary).await {
            Ok(record) => {
                tracing::info!(game_id = %record.id, result = summary.result.as_str(), "Game saved");
                SaveState::Saved(record.id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to save game");
                SaveState::Failed(e.to_string())
            }
        };
    }
}
