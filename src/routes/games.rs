// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Game record routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{GameMode, GameRecord, GameResult};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// History list size.
pub const HISTORY_LIMIT: u32 = 10;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/games/history/{username}", get(get_history))
        .route("/api/games/history/game/{game_id}", get(get_game))
}

/// Routes requiring a session; auth is layered on in routes/mod.rs.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/games/save", post(save_game))
}

/// Body of a save request. `mode` and `result` are parsed by hand so the
/// error names the accepted values.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveGameRequest {
    #[validate(length(min = 1, max = 100))]
    pub opponent: String,
    pub mode: String,
    pub result: String,
    #[validate(length(max = 200_000))]
    pub pgn: String,
    pub moves_count: u32,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SaveGameResponse {
    pub success: bool,
    pub game: GameRecord,
}

/// Store a finished game for the caller and fold it into their stats.
///
/// Both writes land together or not at all.
async fn save_game(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Json(body), _): WithRejection<Json<SaveGameRequest>, AppError>,
) -> Result<(StatusCode, Json<SaveGameResponse>)> {
    if let Some(claimed) = body.username.as_deref() {
        if claimed != auth.username {
            return Err(AppError::Forbidden(
                "Cannot save a game for another user".to_string(),
            ));
        }
    }
    body.validate()?;

    let mode: GameMode = body.mode.parse().map_err(AppError::BadRequest)?;
    let result: GameResult = body.result.parse().map_err(AppError::BadRequest)?;

    let game = GameRecord {
        id: uuid::Uuid::new_v4().to_string(),
        username: auth.username.clone(),
        opponent: body.opponent,
        mode,
        result,
        pgn: body.pgn,
        moves_count: body.moves_count,
        date: now_rfc3339(),
    };

    let owner_found = state.db.record_game(&game).await?;
    if !owner_found {
        tracing::warn!(
            username = %game.username,
            game_id = %game.id,
            "Game saved without stats: user not found"
        );
    }
    tracing::info!(
        username = %game.username,
        game_id = %game.id,
        mode = %game.mode,
        result = game.result.as_str(),
        "Game saved"
    );

    Ok((
        StatusCode::CREATED,
        Json(SaveGameResponse {
            success: true,
            game,
        }),
    ))
}

/// Most recent games for a user, newest first.
async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<Vec<GameRecord>>> {
    let games = state.db.recent_games(&username, HISTORY_LIMIT).await?;
    Ok(Json(games))
}

async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<String>,
) -> Result<Json<GameRecord>> {
    let game = state
        .db
        .get_game(&game_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Game {} not found", game_id)))?;
    Ok(Json(game))
}
