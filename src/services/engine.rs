// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Chess engine API client (stockfish.online compatible).
//!
//! Handles:
//! - Depth clamping to the range the remote service accepts
//! - Normalizing mate scores onto the evaluation scale
//! - Before/after analysis of a single move for coach feedback

use crate::chess::{ChessPosition, Color};
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Remote service minimum.
pub const MIN_DEPTH: u8 = 5;
/// Latency cap.
pub const MAX_DEPTH: u8 = 15;
/// Used when the caller gives no usable depth.
pub const DEFAULT_DEPTH: i64 = 10;

/// Evaluation assigned to "mate in 0"; mate in N sits N pawns below it.
const MATE_SCORE: f64 = 100.0;

const MISTAKE_THRESHOLD: f64 = -1.0;
const BLUNDER_THRESHOLD: f64 = -2.0;

/// Clamp a requested depth to `[MIN_DEPTH, MAX_DEPTH]`.
///
/// A missing or zero depth means "use the default".
pub fn clamp_depth(requested: Option<i64>) -> u8 {
    let depth = match requested {
        Some(d) if d != 0 => d,
        _ => DEFAULT_DEPTH,
    };
    depth.clamp(i64::from(MIN_DEPTH), i64::from(MAX_DEPTH)) as u8
}

/// Map a mate distance onto the evaluation scale.
///
/// Positive N (forced win) gives `100 - N`, otherwise `-100 - N`.
pub fn mate_to_evaluation(mate: i32) -> f64 {
    if mate > 0 {
        MATE_SCORE - f64::from(mate)
    } else {
        -MATE_SCORE - f64::from(mate)
    }
}

/// Coach verdict on a single move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum MoveQuality {
    Good,
    Mistake,
    Blunder,
}

impl MoveQuality {
    /// Whether the coach should stop and ask before continuing.
    pub fn needs_review(self) -> bool {
        !matches!(self, MoveQuality::Good)
    }
}

/// Classify an evaluation change seen from the mover's side.
pub fn classify_delta(delta: f64) -> MoveQuality {
    if delta <= BLUNDER_THRESHOLD {
        MoveQuality::Blunder
    } else if delta <= MISTAKE_THRESHOLD {
        MoveQuality::Mistake
    } else {
        MoveQuality::Good
    }
}

/// Normalized engine answer for one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EngineMove {
    /// Best move in UCI notation
    pub bestmove: String,
    /// Pawn units from White's side; mate scores folded in
    pub evaluation: Option<f64>,
    pub mate: Option<i32>,
}

/// Before/after comparison of one move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MoveAnalysis {
    pub eval_before: Option<f64>,
    pub eval_after: Option<f64>,
    /// Engine's choice in the position before the move
    pub best_move: String,
    pub mate_before: Option<i32>,
    pub mate_after: Option<i32>,
    /// Evaluation change for the side that moved
    pub delta: Option<f64>,
    pub classification: Option<MoveQuality>,
}

/// Raw response from the remote engine.
#[derive(Debug, Deserialize)]
struct RawEngineResponse {
    success: bool,
    #[serde(default)]
    evaluation: Option<f64>,
    #[serde(default)]
    mate: Option<i32>,
    /// "bestmove e2e4 ponder e7e5"
    #[serde(default)]
    bestmove: Option<String>,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl RawEngineResponse {
    fn into_engine_move(self) -> Result<EngineMove, AppError> {
        if !self.success {
            return Err(AppError::EngineApi(
                self.error
                    .or(self.data)
                    .unwrap_or_else(|| "Failed to fetch best move".to_string()),
            ));
        }

        let bestmove = self
            .bestmove
            .as_deref()
            .and_then(|text| text.split_whitespace().nth(1))
            .filter(|m| *m != "(none)")
            .ok_or_else(|| AppError::EngineApi("Engine returned no best move".to_string()))?
            .to_string();

        let evaluation = match self.mate {
            Some(mate) => Some(mate_to_evaluation(mate)),
            None => self.evaluation,
        };

        Ok(EngineMove {
            bestmove,
            evaluation,
            mate: self.mate,
        })
    }
}

/// Engine API client.
#[derive(Clone)]
pub struct EngineService {
    http: reqwest::Client,
    base_url: String,
}

impl EngineService {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client init failed: {}", e)))?;
        Ok(Self { http, base_url })
    }

    /// Ask the engine for the best move in `fen`.
    pub async fn best_move(
        &self,
        fen: &str,
        requested_depth: Option<i64>,
    ) -> Result<EngineMove, AppError> {
        ChessPosition::from_fen(fen).map_err(|e| AppError::BadRequest(e.to_string()))?;
        self.query(fen, clamp_depth(requested_depth)).await
    }

    /// Evaluate the positions before and after a move concurrently.
    pub async fn analyze_move(
        &self,
        fen_before: &str,
        fen_after: &str,
        requested_depth: Option<i64>,
    ) -> Result<MoveAnalysis, AppError> {
        let mover = ChessPosition::from_fen(fen_before)
            .map_err(|e| AppError::BadRequest(format!("fenBefore: {}", e)))?
            .turn();
        ChessPosition::from_fen(fen_after)
            .map_err(|e| AppError::BadRequest(format!("fenAfter: {}", e)))?;

        let depth = clamp_depth(requested_depth);
        let (before, after) = tokio::try_join!(
            self.query(fen_before, depth),
            self.query(fen_after, depth)
        )?;

        let delta = match (before.evaluation, after.evaluation) {
            (Some(b), Some(a)) => Some(match mover {
                Color::White => a - b,
                Color::Black => b - a,
            }),
            _ => None,
        };

        Ok(MoveAnalysis {
            eval_before: before.evaluation,
            eval_after: after.evaluation,
            best_move: before.bestmove,
            mate_before: before.mate,
            mate_after: after.mate,
            delta,
            classification: delta.map(classify_delta),
        })
    }

    async fn query(&self, fen: &str, depth: u8) -> Result<EngineMove, AppError> {
        tracing::debug!(fen, depth, "Querying engine");

        let response = self
            .http
            .get(&self.base_url)
            .query(&[("fen", fen.to_string()), ("depth", depth.to_string())])
            .send()
            .await
            .map_err(|e| AppError::EngineApi(format!("Engine request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::EngineApi(format!("HTTP {}: {}", status, body)));
        }

        let raw: RawEngineResponse = response
            .json()
            .await
            .map_err(|e| AppError::EngineApi(format!("JSON parse error: {}", e)))?;

        raw.into_engine_move()
    }
}
