// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Game-session controller tests with scripted engine and recorder.

use async_trait::async_trait;
use chess_coach::chess::{parse_square, ChessPosition, Color};
use chess_coach::client::ClientError;
use chess_coach::models::{GameMode, GameRecord, GameResult};
use chess_coach::services::engine::classify_delta;
use chess_coach::services::{EngineMove, MoveAnalysis, MoveQuality};
use chess_coach::session::{
    Click, EngineApi, GameOutcome, GameRecorder, GameSession, GameSummary, Replay, ReplySource,
    SaveState, SessionError, SessionOptions,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Engine that plays queued moves; an empty queue or `None` is a failure.
#[derive(Default)]
struct ScriptedEngine {
    replies: Mutex<VecDeque<Option<&'static str>>>,
    /// Delta reported by analysis; `None` makes analysis fail
    delta: Mutex<Option<f64>>,
    best_move_calls: AtomicUsize,
}

impl ScriptedEngine {
    fn with_replies(replies: &[Option<&'static str>]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().copied().collect()),
            ..Self::default()
        }
    }

    fn set_delta(&self, delta: Option<f64>) {
        *self.delta.lock().unwrap() = delta;
    }
}

#[async_trait]
impl EngineApi for ScriptedEngine {
    async fn best_move(&self, _fen: &str, _depth: u8) -> Result<EngineMove, ClientError> {
        self.best_move_calls.fetch_add(1, Ordering::SeqCst);
        match self.replies.lock().unwrap().pop_front().flatten() {
            Some(bestmove) => Ok(EngineMove {
                bestmove: bestmove.to_string(),
                evaluation: Some(0.0),
                mate: None,
            }),
            None => Err(ClientError::Connectivity("engine offline".to_string())),
        }
    }

    async fn analyze(
        &self,
        _fen_before: &str,
        _fen_after: &str,
        _depth: u8,
    ) -> Result<MoveAnalysis, ClientError> {
        match *self.delta.lock().unwrap() {
            Some(delta) => Ok(MoveAnalysis {
                eval_before: Some(0.3),
                eval_after: Some(0.3 + delta),
                best_move: "d2d4".to_string(),
                mate_before: None,
                mate_after: None,
                delta: Some(delta),
                classification: Some(classify_delta(delta)),
            }),
            None => Err(ClientError::Connectivity("engine offline".to_string())),
        }
    }
}

#[derive(Default)]
struct Recorder {
    saved: Mutex<Vec<GameSummary>>,
    fail: bool,
}

#[async_trait]
impl GameRecorder for Recorder {
    async fn save_game(&self, summary: &GameSummary) -> Result<GameRecord, ClientError> {
        if self.fail {
            return Err(ClientError::Server {
                status: 500,
                code: "database_error".to_string(),
                message: "database_error".to_string(),
            });
        }
        let mut saved = self.saved.lock().unwrap();
        saved.push(summary.clone());
        Ok(GameRecord {
            id: format!("game-{}", saved.len()),
            username: "magnus".to_string(),
            opponent: summary.opponent.clone(),
            mode: summary.mode,
            result: summary.result,
            pgn: summary.pgn.clone(),
            moves_count: summary.moves_count,
            date: "2026-01-01T00:00:00.000Z".to_string(),
        })
    }
}

fn session(mode: GameMode) -> GameSession {
    GameSession::new(SessionOptions {
        mode,
        human_color: Color::White,
        level: 10,
    })
}

#[tokio::test]
async fn test_bot_replies_after_human_move() {
    let engine = ScriptedEngine::with_replies(&[Some("e7e5")]);
    let recorder = Recorder::default();
    let mut game = session(GameMode::Bot);

    let report = game.play_move("e2e4", &engine, &recorder).await.unwrap();

    assert_eq!(report.played.unwrap().san, "e4");
    assert_eq!(report.reply.unwrap().uci, "e7e5");
    assert_eq!(report.reply_source, Some(ReplySource::Engine));
    assert_eq!(game.turn(), Color::White);
    assert_eq!(game.pgn(), "1. e4 e5");
}

#[tokio::test]
async fn test_click_flow_into_move() {
    let engine = ScriptedEngine::with_replies(&[Some("e7e5")]);
    let recorder = Recorder::default();
    let mut game = session(GameMode::Bot);

    let e2 = parse_square("e2").unwrap();
    let e4 = parse_square("e4").unwrap();
    assert!(matches!(game.click(e2).unwrap(), Click::Selected { .. }));
    let Click::Move(uci) = game.click(e4).unwrap() else {
        panic!("expected a move");
    };
    game.play_move(&uci, &engine, &recorder).await.unwrap();

    assert_eq!(game.moves().len(), 2);
}

#[tokio::test]
async fn test_engine_failure_falls_back_to_random_move() {
    let engine = ScriptedEngine::with_replies(&[None]);
    let recorder = Recorder::default();
    let mut game = session(GameMode::Bot);

    let report = game.play_move("d2d4", &engine, &recorder).await.unwrap();

    assert_eq!(report.reply_source, Some(ReplySource::RandomFallback));
    let reply = report.reply.unwrap();
    let after_d4 = ChessPosition::from_fen(&reply.fen_before).unwrap();
    assert!(after_d4.legal_uci_moves().contains(&reply.uci));
    assert_eq!(game.turn(), Color::White);
}

#[tokio::test]
async fn test_illegal_engine_move_falls_back() {
    // e2e4 is White's move; it is illegal for Black to play.
    let engine = ScriptedEngine::with_replies(&[Some("e2e4")]);
    let recorder = Recorder::default();
    let mut game = session(GameMode::Bot);

    let report = game.play_move("d2d4", &engine, &recorder).await.unwrap();
    assert_eq!(report.reply_source, Some(ReplySource::RandomFallback));
    assert_eq!(game.moves().len(), 2);
}

#[tokio::test]
async fn test_wrong_turn_and_illegal_move_rejected() {
    let engine = ScriptedEngine::default();
    let recorder = Recorder::default();
    let mut game = session(GameMode::Friend);

    assert!(matches!(
        game.play_move("e7e5", &engine, &recorder).await,
        Err(SessionError::IllegalMove(_))
    ));
    assert!(game.moves().is_empty());

    let mut black = GameSession::new(SessionOptions {
        mode: GameMode::Bot,
        human_color: Color::Black,
        level: 5,
    });
    assert!(matches!(
        black.play_move("e2e4", &engine, &recorder).await,
        Err(SessionError::WrongTurn)
    ));
}

#[tokio::test]
async fn test_engine_opens_when_human_is_black() {
    let engine = ScriptedEngine::with_replies(&[Some("c2c4")]);
    let recorder = Recorder::default();
    let mut game = GameSession::new(SessionOptions {
        mode: GameMode::Bot,
        human_color: Color::Black,
        level: 5,
    });

    let report = game.start(&engine, &recorder).await.unwrap();
    assert_eq!(report.reply.unwrap().san, "c4");
    assert!(game.is_human_turn());
}

#[tokio::test]
async fn test_coach_gate_undo() {
    let engine = ScriptedEngine::with_replies(&[Some("e7e5"), Some("e7e5")]);
    engine.set_delta(Some(-2.5));
    let recorder = Recorder::default();
    let mut game = session(GameMode::Coach);

    let report = game.play_move("f2f3", &engine, &recorder).await.unwrap();
    assert!(report.awaiting_decision);
    assert!(report.reply.is_none());
    let pending = game.pending_decision().unwrap();
    assert_eq!(pending.feedback.quality, MoveQuality::Blunder);
    assert_eq!(pending.feedback.better_move, "d2d4");
    assert_eq!(pending.reply, "e7e5");

    // Only undo or accept while the decision is open
    assert!(matches!(
        game.play_move("e2e4", &engine, &recorder).await,
        Err(SessionError::DecisionPending)
    ));
    assert!(matches!(game.takeback(), Err(SessionError::DecisionPending)));
    assert!(matches!(
        game.click(parse_square("e2").unwrap()),
        Err(SessionError::DecisionPending)
    ));

    let undone = game.undo_mistake().unwrap();
    assert_eq!(undone.uci, "f2f3");
    assert!(game.moves().is_empty());
    assert_eq!(game.fen(), ChessPosition::new().to_fen());
    assert!(game.pending_decision().is_none());

    engine.set_delta(Some(-0.1));
    let report = game.play_move("e2e4", &engine, &recorder).await.unwrap();
    assert!(!report.awaiting_decision);
    assert_eq!(report.feedback.unwrap().quality, MoveQuality::Good);
    assert_eq!(game.moves().len(), 2);
}

#[tokio::test]
async fn test_coach_gate_accept() {
    let engine = ScriptedEngine::with_replies(&[Some("e7e5")]);
    engine.set_delta(Some(-1.4));
    let recorder = Recorder::default();
    let mut game = session(GameMode::Coach);

    let report = game.play_move("a2a3", &engine, &recorder).await.unwrap();
    assert!(report.awaiting_decision);
    assert_eq!(report.feedback.unwrap().quality, MoveQuality::Mistake);

    let report = game.accept_reply(&recorder).await.unwrap();
    assert_eq!(report.reply.unwrap().uci, "e7e5");
    assert_eq!(game.moves().len(), 2);
    assert!(matches!(
        game.accept_reply(&recorder).await,
        Err(SessionError::NoDecisionPending)
    ));
}

#[tokio::test]
async fn test_coach_analysis_failure_continues() {
    let engine = ScriptedEngine::with_replies(&[Some("e7e5")]);
    engine.set_delta(None);
    let recorder = Recorder::default();
    let mut game = session(GameMode::Coach);

    let report = game.play_move("e2e4", &engine, &recorder).await.unwrap();
    assert!(report.feedback.is_none());
    assert!(!report.awaiting_decision);
    assert_eq!(game.moves().len(), 2);
}

#[tokio::test]
async fn test_checkmate_saves_exactly_once() {
    // Fool's mate with the engine playing Black.
    let engine = ScriptedEngine::with_replies(&[Some("e7e5"), Some("d8h4")]);
    let recorder = Recorder::default();
    let mut game = session(GameMode::Bot);

    game.play_move("f2f3", &engine, &recorder).await.unwrap();
    let report = game.play_move("g2g4", &engine, &recorder).await.unwrap();

    assert_eq!(
        report.outcome,
        Some(GameOutcome::Checkmate {
            winner: Color::Black
        })
    );
    assert_eq!(game.save_state(), &SaveState::Saved("game-1".to_string()));

    assert!(matches!(
        game.resign(&recorder).await,
        Err(SessionError::GameOver)
    ));
    assert!(matches!(
        game.play_move("a2a3", &engine, &recorder).await,
        Err(SessionError::GameOver)
    ));

    let saved = recorder.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].result, GameResult::Loss);
    assert_eq!(saved[0].opponent, "Stockfish (Level 10)");
    assert_eq!(saved[0].mode, GameMode::Bot);
    assert_eq!(saved[0].moves_count, 4);
    assert_eq!(saved[0].pgn, "1. f3 e5 2. g4 Qh4# 0-1");
}

#[tokio::test]
async fn test_failed_save_not_retried() {
    let engine = ScriptedEngine::default();
    let recorder = Recorder {
        fail: true,
        ..Recorder::default()
    };
    let mut game = session(GameMode::Friend);

    game.play_move("e2e4", &engine, &recorder).await.unwrap();
    let outcome = game.resign(&recorder).await.unwrap();

    assert_eq!(
        outcome,
        GameOutcome::Resignation {
            winner: Color::White
        }
    );
    assert!(matches!(game.save_state(), SaveState::Failed(_)));
    assert_eq!(game.summary().unwrap().result, GameResult::Win);
}

#[tokio::test]
async fn test_resign_in_bot_mode_is_loss() {
    let recorder = Recorder::default();
    let mut game = session(GameMode::Coach);

    game.resign(&recorder).await.unwrap();

    let saved = recorder.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].result, GameResult::Loss);
    assert_eq!(saved[0].opponent, "Coach");
    assert_eq!(saved[0].pgn, "0-1");
}

#[tokio::test]
async fn test_hint_cached_per_position() {
    let engine = ScriptedEngine::with_replies(&[Some("g1f3")]);
    let mut game = session(GameMode::Bot);

    assert_eq!(game.hint(&engine).await.unwrap(), "g1f3");
    assert_eq!(game.hint(&engine).await.unwrap(), "g1f3");
    assert_eq!(engine.best_move_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_takeback_full_turn_in_bot_mode() {
    let engine = ScriptedEngine::with_replies(&[Some("e7e5")]);
    let recorder = Recorder::default();
    let mut game = session(GameMode::Bot);

    game.play_move("e2e4", &engine, &recorder).await.unwrap();
    assert_eq!(game.takeback().unwrap(), 2);
    assert!(game.moves().is_empty());
    assert!(game.is_human_turn());
}

#[tokio::test]
async fn test_replay_does_not_touch_live_session() {
    let engine = ScriptedEngine::with_replies(&[Some("e7e5"), Some("b8c6")]);
    let recorder = Recorder::default();
    let mut game = session(GameMode::Bot);
    game.play_move("e2e4", &engine, &recorder).await.unwrap();
    game.play_move("g1f3", &engine, &recorder).await.unwrap();
    let live_fen = game.fen();

    let mut replay = Replay::from_pgn(&game.pgn()).unwrap();
    assert_eq!(replay.len(), 4);
    let start = replay.seek(0).unwrap();
    assert_eq!(start.to_fen(), ChessPosition::new().to_fen());
    replay.step_forward();

    assert_eq!(game.fen(), live_fen);
    assert_eq!(game.moves().len(), 4);
}
