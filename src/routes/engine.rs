// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Engine proxy routes.

use crate::error::{AppError, Result};
use crate::services::{EngineMove, MoveAnalysis};
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/stockfish/get-move", post(get_move))
        .route("/api/stockfish/analyze-move", post(analyze_move))
}

/// Search depth as sent by clients: a number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DepthParam {
    Int(i64),
    Float(f64),
    Text(String),
}

impl DepthParam {
    /// Requested depth, or `None` when it can't be read as a number.
    pub fn requested(&self) -> Option<i64> {
        match self {
            DepthParam::Int(d) => Some(*d),
            DepthParam::Float(d) if d.is_finite() => Some(d.trunc() as i64),
            DepthParam::Float(_) => None,
            DepthParam::Text(s) => leading_int(s),
        }
    }
}

/// Leading integer of a string, so "7.5" reads as 7 and "12abc" as 12.
fn leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let digits_start = usize::from(text.starts_with(['-', '+']));
    let digits_end = text[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(text.len(), |i| digits_start + i);
    if digits_end == digits_start {
        return None;
    }
    text[..digits_end].parse().ok()
}

fn requested_depth(depth: &Option<DepthParam>) -> Option<i64> {
    depth.as_ref().and_then(DepthParam::requested)
}

#[derive(Debug, Deserialize)]
pub struct GetMoveRequest {
    pub fen: String,
    #[serde(default)]
    pub depth: Option<DepthParam>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeMoveRequest {
    pub fen_before: String,
    pub fen_after: String,
    #[serde(default)]
    pub depth: Option<DepthParam>,
}

async fn get_move(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(body), _): WithRejection<Json<GetMoveRequest>, AppError>,
) -> Result<Json<EngineMove>> {
    let engine_move = state
        .engine
        .best_move(&body.fen, requested_depth(&body.depth))
        .await?;
    Ok(Json(engine_move))
}

async fn analyze_move(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(body), _): WithRejection<Json<AnalyzeMoveRequest>, AppError>,
) -> Result<Json<MoveAnalysis>> {
    let analysis = state
        .engine
        .analyze_move(
            &body.fen_before,
            &body.fen_after,
            requested_depth(&body.depth),
        )
        .await?;
    if let Some(quality) = analysis.classification {
        tracing::debug!(
            delta = analysis.delta,
            classification = ?quality,
            "Move analyzed"
        );
    }
    Ok(Json(analysis))
}
