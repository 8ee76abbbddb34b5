//! In-process document store.
//!
//! Mirrors the Firestore layout (users keyed by username, email claims,
//! games keyed by id) for local development and tests.

use crate::db::email_key;
use crate::error::AppError;
use crate::models::{GameRecord, ProfileUpdate, User};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Inner {
    users: DashMap<String, User>,
    /// email key -> username
    emails: DashMap<String, String>,
    /// game id -> (insertion sequence, record)
    games: DashMap<String, (u64, GameRecord)>,
    next_seq: AtomicU64,
}

/// In-memory database. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    inner: Arc<Inner>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_user(&self, username: &str) -> Option<User> {
        self.inner.users.get(username).map(|u| u.clone())
    }

    /// Insert a new user; `Conflict` if the username or email is taken.
    ///
    /// The username entry is held while the email is claimed, so the pair is
    /// reserved atomically.
    pub fn create_user(&self, user: &User) -> Result<(), AppError> {
        match self.inner.users.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "Username '{}' is already taken",
                user.username
            ))),
            Entry::Vacant(user_slot) => match self.inner.emails.entry(email_key(&user.email)) {
                Entry::Occupied(_) => Err(AppError::Conflict(format!(
                    "Email '{}' is already registered",
                    user.email
                ))),
                Entry::Vacant(email_slot) => {
                    email_slot.insert(user.username.clone());
                    user_slot.insert(user.clone());
                    Ok(())
                }
            },
        }
    }

    /// Apply profile edits under the user's entry lock.
    pub fn update_profile(
        &self,
        username: &str,
        update: &ProfileUpdate,
        now: &str,
    ) -> Option<User> {
        let mut user = self.inner.users.get_mut(username)?;
        user.apply_profile(update, now);
        Some(user.clone())
    }

    /// Store a game and fold it into its owner's counters. Returns whether
    /// the owner existed.
    pub fn record_game(&self, game: &GameRecord) -> Result<bool, AppError> {
        self.create_game(game)?;
        match self.inner.users.get_mut(&game.username) {
            Some(mut user) => {
                user.record_game(game.result, &game.date);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn create_game(&self, game: &GameRecord) -> Result<(), AppError> {
        let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed);
        match self.inner.games.entry(game.id.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "Game '{}' already exists",
                game.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert((seq, game.clone()));
                Ok(())
            }
        }
    }

    pub fn get_game(&self, game_id: &str) -> Option<GameRecord> {
        self.inner.games.get(game_id).map(|g| g.1.clone())
    }

    /// Most recent games for a user, newest first. Ties on `date` fall back
    /// to insertion order.
    pub fn recent_games(&self, username: &str, limit: u32) -> Vec<GameRecord> {
        let mut games: Vec<(u64, GameRecord)> = self
            .inner
            .games
            .iter()
            .filter(|entry| entry.1.username == username)
            .map(|entry| entry.value().clone())
            .collect();

        games.sort_by(|(seq_a, a), (seq_b, b)| b.date.cmp(&a.date).then(seq_b.cmp(seq_a)));
        games
            .into_iter()
            .take(limit as usize)
            .map(|(_, game)| game)
            .collect()
    }
}
