// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (account and profile storage, keyed by username)
//! - Email claims (uniqueness of registered emails)
//! - Games (finished game records)

use crate::db::{collections, email_key};
use crate::error::AppError;
use crate::models::{GameRecord, ProfileUpdate, User};
use firestore::errors::{BackoffError, FirestoreError};
use firestore::paths_camel_case;
use serde::{Deserialize, Serialize};

/// Marker document reserving an email address for one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmailClaim {
    username: String,
}

/// Document ID of an email claim. Hex keeps `/` and other characters that
/// are legal in an address out of the document path.
fn email_claim_id(email: &str) -> String {
    hex::encode(email_key(email))
}

/// User fields written when a game is recorded.
fn stats_fields() -> Vec<String> {
    paths_camel_case!(User::{
        games_played,
        wins,
        losses,
        draws,
        win_rate,
        longest_streak,
        current_streak,
        last_game,
        updated_at
    })
}

/// User fields written by a profile edit.
fn profile_fields() -> Vec<String> {
    paths_camel_case!(User::{profile_picture, country, bio, location, updated_at})
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by username.
    pub async fn get_user(&self, username: &str) -> Result<Option<User>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(username)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user, failing with `Conflict` if the username or email is taken.
    ///
    /// Both documents are written with create-only semantics, so concurrent
    /// registrations for the same name resolve to exactly one winner.
    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let inserted: Result<User, FirestoreError> = self
            .client
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.username)
            .object(user)
            .execute()
            .await;

        match inserted {
            Ok(_) => {}
            Err(FirestoreError::DataConflictError(_)) => {
                return Err(AppError::Conflict(format!(
                    "Username '{}' is already taken",
                    user.username
                )));
            }
            Err(e) => return Err(AppError::Database(e.to_string())),
        }

        let claim = EmailClaim {
            username: user.username.clone(),
        };
        let claimed: Result<EmailClaim, FirestoreError> = self
            .client
            .fluent()
            .insert()
            .into(collections::USER_EMAILS)
            .document_id(email_claim_id(&user.email))
            .object(&claim)
            .execute()
            .await;

        match claimed {
            Ok(_) => Ok(()),
            Err(err) => {
                // Release the username so the account can be registered again.
                if let Err(e) = self.delete_user(&user.username).await {
                    tracing::error!(
                        username = %user.username,
                        error = %e,
                        "Failed to roll back user after email claim failure"
                    );
                }
                match err {
                    FirestoreError::DataConflictError(_) => Err(AppError::Conflict(format!(
                        "Email '{}' is already registered",
                        user.email
                    ))),
                    other => Err(AppError::Database(other.to_string())),
                }
            }
        }
    }

    /// Apply profile edits to a user, writing only the profile fields.
    ///
    /// Runs in a transaction so a concurrent game save can't be undone by a
    /// stale read. Returns `None` if the user doesn't exist.
    pub async fn update_profile(
        &self,
        username: &str,
        update: &ProfileUpdate,
        now: &str,
    ) -> Result<Option<User>, AppError> {
        self.client
            .run_transaction(|db, transaction| {
                let username = username.to_string();
                let update = update.clone();
                let now = now.to_string();
                Box::pin(async move {
                    let current: Option<User> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USERS)
                        .obj()
                        .one(&username)
                        .await?;
                    let Some(mut user) = current else {
                        return Ok::<_, BackoffError<FirestoreError>>(None);
                    };

                    user.apply_profile(&update, &now);
                    db.fluent()
                        .update()
                        .fields(profile_fields())
                        .in_col(collections::USERS)
                        .document_id(&username)
                        .object(&user)
                        .add_to_transaction(transaction)?;
                    Ok(Some(user))
                })
            })
            .await
            .map_err(|e| AppError::Database(format!("Profile transaction failed: {}", e)))
    }

    async fn delete_user(&self, username: &str) -> Result<(), AppError> {
        self.client
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(username)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Game Operations ─────────────────────────────────────────

    /// Store a finished game and fold it into its owner's counters.
    ///
    /// The user read registers the document with the transaction; if another
    /// save commits first, Firestore aborts this one and it is retried with
    /// fresh counters. Returns whether the owner existed.
    pub async fn record_game(&self, game: &GameRecord) -> Result<bool, AppError> {
        self.client
            .run_transaction(|db, transaction| {
                let game = game.clone();
                Box::pin(async move {
                    let owner: Option<User> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USERS)
                        .obj()
                        .one(&game.username)
                        .await?;

                    db.fluent()
                        .update()
                        .in_col(collections::GAMES)
                        .document_id(&game.id)
                        .object(&game)
                        .add_to_transaction(transaction)?;

                    let Some(mut owner) = owner else {
                        return Ok::<_, BackoffError<FirestoreError>>(false);
                    };
                    owner.record_game(game.result, &game.date);
                    db.fluent()
                        .update()
                        .fields(stats_fields())
                        .in_col(collections::USERS)
                        .document_id(&owner.username)
                        .object(&owner)
                        .add_to_transaction(transaction)?;
                    Ok(true)
                })
            })
            .await
            .map_err(|e| AppError::Database(format!("Game transaction failed: {}", e)))
    }

    /// Get a game by ID.
    pub async fn get_game(&self, game_id: &str) -> Result<Option<GameRecord>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::GAMES)
            .obj()
            .one(game_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most recent games for a user, newest first.
    pub async fn recent_games(
        &self,
        username: &str,
        limit: u32,
    ) -> Result<Vec<GameRecord>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::GAMES)
            .filter(|q| q.field("username").eq(username))
            .order_by([("date", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
