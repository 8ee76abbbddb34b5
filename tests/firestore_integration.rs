// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running and
//! `FIRESTORE_EMULATOR_HOST` to be set; otherwise they are skipped.

use chess_coach::error::AppError;
use chess_coach::models::{GameMode, GameRecord, GameResult, User};
use chess_coach::time_utils::now_rfc3339;

mod common;
use common::test_db;

/// Unique suffix so repeated runs against one emulator don't collide.
fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}

fn test_user(username: &str) -> User {
    User::new(
        username.to_string(),
        format!("{}@example.com", username),
        "pbkdf2-sha256$1000$00$00".to_string(),
        &now_rfc3339(),
    )
}

fn test_game(username: &str, date: &str) -> GameRecord {
    GameRecord {
        id: uuid::Uuid::new_v4().to_string(),
        username: username.to_string(),
        opponent: "Coach".to_string(),
        mode: GameMode::Coach,
        result: GameResult::Win,
        pgn: "1. e4 e5 1-0".to_string(),
        moves_count: 2,
        date: date.to_string(),
    }
}

#[tokio::test]
async fn test_create_and_read_user() {
    require_emulator!();
    let db = test_db().await;
    let username = unique("user");

    db.create_user(&test_user(&username)).await.unwrap();

    let stored = db.get_user(&username).await.unwrap().unwrap();
    assert_eq!(stored.username, username);
    assert_eq!(stored.elo, 1200);
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    require_emulator!();
    let db = test_db().await;
    let username = unique("dup");

    db.create_user(&test_user(&username)).await.unwrap();

    let mut again = test_user(&username);
    again.email = format!("{}@other.example.com", username);
    let err = db.create_user(&again).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_duplicate_email_rolls_back_user() {
    require_emulator!();
    let db = test_db().await;
    let first = unique("first");
    let second = unique("second");

    db.create_user(&test_user(&first)).await.unwrap();

    let mut clash = test_user(&second);
    clash.email = format!("{}@EXAMPLE.com", first);
    let err = db.create_user(&clash).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert!(db.get_user(&second).await.unwrap().is_none());
}

#[tokio::test]
async fn test_recent_games_newest_first() {
    require_emulator!();
    let db = test_db().await;
    let username = unique("history");

    let dates = [
        "2026-01-01T10:00:00.000Z",
        "2026-01-03T10:00:00.000Z",
        "2026-01-02T10:00:00.000Z",
    ];
    for date in dates {
        db.record_game(&test_game(&username, date)).await.unwrap();
    }

    let games = db.recent_games(&username, 2).await.unwrap();
    assert_eq!(games.len(), 2);
    assert_eq!(games[0].date, "2026-01-03T10:00:00.000Z");
    assert_eq!(games[1].date, "2026-01-02T10:00:00.000Z");

    let fetched = db.get_game(&games[0].id).await.unwrap().unwrap();
    assert_eq!(fetched, games[0]);
}

#[tokio::test]
async fn test_email_with_slash_registers() {
    require_emulator!();
    let db = test_db().await;
    let username = unique("slash");

    let mut user = test_user(&username);
    user.email = format!("a/{}@example.com", username);
    db.create_user(&user).await.unwrap();

    let mut clash = test_user(&unique("slash2"));
    clash.email = user.email.to_uppercase();
    let err = db.create_user(&clash).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}
