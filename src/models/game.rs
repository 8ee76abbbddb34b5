//! Finished-game record for storage and API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// How the game was played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum GameMode {
    /// Against the remote engine
    Bot,
    /// Against the engine, with mistake/blunder feedback
    Coach,
    /// Two players sharing one board
    Friend,
}

impl GameMode {
    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::Bot => "bot",
            GameMode::Coach => "coach",
            GameMode::Friend => "friend",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bot" => Ok(GameMode::Bot),
            "coach" => Ok(GameMode::Coach),
            "friend" => Ok(GameMode::Friend),
            other => Err(format!("unknown game mode: {other}")),
        }
    }
}

/// Result from the saving user's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum GameResult {
    Win,
    Loss,
    Draw,
}

impl GameResult {
    pub fn as_str(self) -> &'static str {
        match self {
            GameResult::Win => "win",
            GameResult::Loss => "loss",
            GameResult::Draw => "draw",
        }
    }
}

impl FromStr for GameResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "win" => Ok(GameResult::Win),
            "loss" => Ok(GameResult::Loss),
            "draw" => Ok(GameResult::Draw),
            other => Err(format!("unknown game result: {other}")),
        }
    }
}

/// Stored game record in the `games` collection (document ID = `id`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GameRecord {
    /// UUID v4
    pub id: String,
    /// Owner of the record
    pub username: String,
    /// Opponent label, e.g. "Stockfish (Level 10)"
    pub opponent: String,
    pub mode: GameMode,
    pub result: GameResult,
    /// Full PGN movetext
    pub pgn: String,
    /// Number of plies played
    pub moves_count: u32,
    /// When the game was saved (RFC3339, millisecond precision)
    pub date: String,
}
