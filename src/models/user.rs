//! User model for storage and API.

use crate::models::GameResult;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Starting rating for every time control.
pub const DEFAULT_RATING: u32 = 1200;

fn default_rating() -> u32 {
    DEFAULT_RATING
}

fn default_country() -> Option<String> {
    Some("India".to_string())
}

/// User account stored in the `users` collection (document ID = username).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub email: String,
    /// Encoded salted credential, see `services::password`
    pub password_hash: String,

    // ─── Ratings ─────────────────────────────────────────────────
    #[serde(default = "default_rating")]
    pub elo: u32,
    #[serde(default = "default_rating")]
    pub rapid: u32,
    #[serde(default = "default_rating")]
    pub blitz: u32,
    #[serde(default = "default_rating")]
    pub bullet: u32,

    // ─── Aggregates ──────────────────────────────────────────────
    #[serde(default)]
    pub games_played: u32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub draws: u32,
    /// Percentage of games won, two decimals
    #[serde(default)]
    pub win_rate: f64,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub last_game: Option<String>,

    // ─── Profile ─────────────────────────────────────────────────
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_country")]
    pub country: Option<String>,

    pub created_at: String,
    pub updated_at: String,
}

impl User {
    /// A freshly registered account with default ratings and empty counters.
    pub fn new(
        username: String,
        email: String,
        password_hash: String,
        now: &str,
    ) -> Self {
        Self {
            username,
            email,
            password_hash,
            elo: DEFAULT_RATING,
            rapid: DEFAULT_RATING,
            blitz: DEFAULT_RATING,
            bullet: DEFAULT_RATING,
            games_played: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            win_rate: 0.0,
            longest_streak: 0,
            current_streak: 0,
            last_game: None,
            profile_picture: None,
            bio: None,
            location: None,
            country: default_country(),
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    /// Fold a finished game into the aggregate counters.
    ///
    /// The streak counts consecutive wins; a loss or draw resets it.
    pub fn record_game(&mut self, result: GameResult, now: &str) {
        self.games_played += 1;
        match result {
            GameResult::Win => {
                self.wins += 1;
                self.current_streak += 1;
                self.longest_streak = self.longest_streak.max(self.current_streak);
            }
            GameResult::Loss => {
                self.losses += 1;
                self.current_streak = 0;
            }
            GameResult::Draw => {
                self.draws += 1;
                self.current_streak = 0;
            }
        }

        let rate = f64::from(self.wins) / f64::from(self.games_played) * 100.0;
        self.win_rate = (rate * 100.0).round() / 100.0;
        self.last_game = Some(now.to_string());
        self.updated_at = now.to_string();
    }
}

/// Requested profile changes. `None` leaves a field alone; an empty string
/// clears it.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub profile_picture: Option<String>,
    pub country: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
}

fn apply_field(target: &mut Option<String>, update: Option<&String>) {
    if let Some(value) = update {
        let value = value.trim();
        *target = if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        };
    }
}

impl User {
    /// Apply profile edits; counters and credentials are untouched.
    pub fn apply_profile(&mut self, update: &ProfileUpdate, now: &str) {
        apply_field(&mut self.profile_picture, update.profile_picture.as_ref());
        apply_field(&mut self.country, update.country.as_ref());
        apply_field(&mut self.bio, update.bio.as_ref());
        apply_field(&mut self.location, update.location.as_ref());
        self.updated_at = now.to_string();
    }
}

/// User document as returned by the API (credentials stripped).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PublicUser {
    pub username: String,
    pub email: String,
    pub elo: u32,
    pub rapid: u32,
    pub blitz: u32,
    pub bullet: u32,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub win_rate: f64,
    pub longest_streak: u32,
    pub current_streak: u32,
    pub last_game: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub country: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            email: user.email,
            elo: user.elo,
            rapid: user.rapid,
            blitz: user.blitz,
            bullet: user.bullet,
            games_played: user.games_played,
            wins: user.wins,
            losses: user.losses,
            draws: user.draws,
            win_rate: user.win_rate,
            longest_streak: user.longest_streak,
            current_streak: user.current_streak,
            last_game: user.last_game,
            profile_picture: user.profile_picture,
            bio: user.bio,
            location: user.location,
            country: user.country,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
