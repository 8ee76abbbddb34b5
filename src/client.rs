// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP client for the chess-coach API.
//!
//! Used by the game-session controller to reach the engine proxy and to
//! store finished games.

use crate::models::{GameRecord, PublicUser};
use crate::services::{EngineMove, MoveAnalysis};
use crate::session::{EngineApi, GameRecorder, GameSummary};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Cannot reach server: {0}")]
    Connectivity(String),

    /// Non-2xx response; `message` is the server's explanation.
    #[error("{message}")]
    Server {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Not logged in")]
    NotLoggedIn,
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Connectivity(e.to_string())
        }
    }
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthBody {
    user: PublicUser,
    token: String,
}

#[derive(Debug, Deserialize)]
struct SaveBody {
    game: GameRecord,
}

/// API client holding the session token once logged in.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Connectivity(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Reuse a token from an earlier login.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self.token.as_deref().ok_or(ClientError::NotLoggedIn)?;
        Ok(request.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => {
                let message = body.details.unwrap_or_else(|| body.error.clone());
                (body.error, message)
            }
            Err(_) => ("http_error".to_string(), format!("HTTP {}", status)),
        };
        Err(ClientError::Server {
            status: status.as_u16(),
            code,
            message,
        })
    }

    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<PublicUser, ClientError> {
        let request = self.http.post(self.url("/api/auth/register")).json(&json!({
            "username": username,
            "email": email,
            "password": password,
        }));
        let body: AuthBody = Self::send(request).await?;
        self.token = Some(body.token);
        Ok(body.user)
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<PublicUser, ClientError> {
        let request = self.http.post(self.url("/api/auth/login")).json(&json!({
            "username": username,
            "password": password,
        }));
        let body: AuthBody = Self::send(request).await?;
        self.token = Some(body.token);
        Ok(body.user)
    }

    /// Forget the token locally.
    pub fn logout(&mut self) {
        self.token = None;
    }

    pub async fn profile(&self, username: &str) -> Result<PublicUser, ClientError> {
        Self::send(self.http.get(self.url(&format!("/api/auth/user/{}", username)))).await
    }

    pub async fn get_move(&self, fen: &str, depth: u8) -> Result<EngineMove, ClientError> {
        let request = self
            .http
            .post(self.url("/api/stockfish/get-move"))
            .json(&json!({ "fen": fen, "depth": depth }));
        Self::send(request).await
    }

    pub async fn analyze_move(
        &self,
        fen_before: &str,
        fen_after: &str,
        depth: u8,
    ) -> Result<MoveAnalysis, ClientError> {
        let request = self
            .http
            .post(self.url("/api/stockfish/analyze-move"))
            .json(&json!({
                "fenBefore": fen_before,
                "fenAfter": fen_after,
                "depth": depth,
            }));
        Self::send(request).await
    }

    pub async fn save_game(&self, summary: &GameSummary) -> Result<GameRecord, ClientError> {
        let request = self.authorized(self.http.post(self.url("/api/games/save")))?;
        let body: SaveBody = Self::send(request.json(summary)).await?;
        Ok(body.game)
    }

    pub async fn history(&self, username: &str) -> Result<Vec<GameRecord>, ClientError> {
        Self::send(
            self.http
                .get(self.url(&format!("/api/games/history/{}", username))),
        )
        .await
    }

    pub async fn game(&self, game_id: &str) -> Result<GameRecord, ClientError> {
        Self::send(
            self.http
                .get(self.url(&format!("/api/games/history/game/{}", game_id))),
        )
        .await
    }
}

#[async_trait]
impl EngineApi for ApiClient {
    async fn best_move(&self, fen: &str, depth: u8) -> Result<EngineMove, ClientError> {
        self.get_move(fen, depth).await
    }

    async fn analyze(
        &self,
        fen_before: &str,
        fen_after: &str,
        depth: u8,
    ) -> Result<MoveAnalysis, ClientError> {
        self.analyze_move(fen_before, fen_after, depth).await
    }
}

#[async_trait]
impl GameRecorder for ApiClient {
    async fn save_game(&self, summary: &GameSummary) -> Result<GameRecord, ClientError> {
        ApiClient::save_game(self, summary).await
    }
}
