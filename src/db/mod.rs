//! Database layer (Firestore, or in-memory for development and tests).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::config::{Config, DbBackend};
use crate::error::AppError;
use crate::models::{GameRecord, ProfileUpdate, User};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Email uniqueness claims (keyed by hex of the lowercased email)
    pub const USER_EMAILS: &str = "user_emails";
    pub const GAMES: &str = "games";
}

/// Normalized key used for email uniqueness.
pub(crate) fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Document store used by the API.
#[derive(Clone)]
pub enum Db {
    Firestore(FirestoreDb),
    Memory(MemoryDb),
}

impl Db {
    /// Connect to the backend selected in config.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        match config.db_backend {
            DbBackend::Firestore => Ok(Db::Firestore(
                FirestoreDb::new(&config.gcp_project_id).await?,
            )),
            DbBackend::Memory => {
                tracing::warn!("Using in-memory database; data is lost on restart");
                Ok(Db::Memory(MemoryDb::new()))
            }
        }
    }

    pub fn memory() -> Self {
        Db::Memory(MemoryDb::new())
    }

    pub async fn get_user(&self, username: &str) -> Result<Option<User>, AppError> {
        match self {
            Db::Firestore(db) => db.get_user(username).await,
            Db::Memory(db) => Ok(db.get_user(username)),
        }
    }

    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        match self {
            Db::Firestore(db) => db.create_user(user).await,
            Db::Memory(db) => db.create_user(user),
        }
    }

    /// Apply profile edits; `None` if the user doesn't exist.
    pub async fn update_profile(
        &self,
        username: &str,
        update: &ProfileUpdate,
        now: &str,
    ) -> Result<Option<User>, AppError> {
        match self {
            Db::Firestore(db) => db.update_profile(username, update, now).await,
            Db::Memory(db) => Ok(db.update_profile(username, update, now)),
        }
    }

    /// Store a game and update its owner's stats as one write. Returns
    /// whether the owner existed.
    pub async fn record_game(&self, game: &GameRecord) -> Result<bool, AppError> {
        match self {
            Db::Firestore(db) => db.record_game(game).await,
            Db::Memory(db) => db.record_game(game),
        }
    }

    pub async fn get_game(&self, game_id: &str) -> Result<Option<GameRecord>, AppError> {
        match self {
            Db::Firestore(db) => db.get_game(game_id).await,
            Db::Memory(db) => Ok(db.get_game(game_id)),
        }
    }

    pub async fn recent_games(
        &self,
        username: &str,
        limit: u32,
    ) -> Result<Vec<GameRecord>, AppError> {
        match self {
            Db::Firestore(db) => db.recent_games(username, limit).await,
            Db::Memory(db) => Ok(db.recent_games(username, limit)),
        }
    }
}
