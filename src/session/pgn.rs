//! PGN movetext and game summaries.

use crate::models::{GameMode, GameResult};
use serde::Serialize;

/// Result tokens that may terminate movetext.
const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

/// Render SAN moves as numbered movetext, e.g. `1. e4 e5 2. Nf3 1-0`.
pub fn movetext<S: AsRef<str>>(sans: &[S], result_token: Option<&str>) -> String {
    let mut parts = Vec::with_capacity(sans.len() + sans.len() / 2 + 1);
    for (ply, san) in sans.iter().enumerate() {
        if ply % 2 == 0 {
            parts.push(format!("{}.", ply / 2 + 1));
        }
        parts.push(san.as_ref().to_string());
    }
    if let Some(token) = result_token {
        parts.push(token.to_string());
    }
    parts.join(" ")
}

/// Drop a leading move number; "1.e4" is legal movetext too.
fn strip_move_number(word: &str) -> &str {
    let rest = word.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() < word.len() && rest.starts_with('.') {
        rest.trim_start_matches('.')
    } else {
        word
    }
}

/// Extract the SAN moves from movetext.
///
/// Skips move numbers (`12.` and `12...`), result tokens, `{comments}`,
/// and tag pair lines. Zero-style castling is read as `O-O`.
pub fn san_tokens(pgn: &str) -> Vec<String> {
    let mut sans = Vec::new();
    let mut in_comment = false;

    for line in pgn.lines() {
        if line.trim_start().starts_with('[') {
            continue;
        }
        for word in line.split_whitespace() {
            if in_comment {
                if word.ends_with('}') {
                    in_comment = false;
                }
                continue;
            }
            if word.starts_with('{') {
                in_comment = !word.ends_with('}');
                continue;
            }
            if RESULT_TOKENS.contains(&word) {
                continue;
            }
            let san = strip_move_number(word);
            if san.is_empty() {
                continue;
            }
            if san.starts_with("0-0") {
                sans.push(san.replace('0', "O"));
            } else {
                sans.push(san.to_string());
            }
        }
    }

    sans
}

/// What gets saved when a session ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub opponent: String,
    pub mode: GameMode,
    pub result: GameResult,
    pub pgn: String,
    pub moves_count: u32,
}

/// Label shown as the opponent in game history.
pub fn opponent_label(mode: GameMode, level: u8) -> String {
    match mode {
        GameMode::Bot => format!("Stockfish (Level {level})"),
        GameMode::Coach => "Coach".to_string(),
        GameMode::Friend => "Friend".to_string(),
    }
}
