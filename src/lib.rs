// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Chess-Coach: play against an engine, a friend, or a coach that flags
//! mistakes, and keep a history of finished games.
//!
//! This crate provides the backend API (accounts, game records, engine
//! proxy) and the game-session controller that drives one game against it.

pub mod chess;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod time_utils;

use config::Config;
use db::Db;
use services::{EngineService, PasswordHasher};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub engine: EngineService,
    pub passwords: PasswordHasher,
}

impl AppState {
    /// Build state from config around an already-connected database.
    pub fn new(config: Config, db: Db) -> Result<Self, error::AppError> {
        let engine = EngineService::new(config.engine_api_url.clone(), config.engine_timeout)?;
        let passwords = PasswordHasher::new(config.password_iterations)
            .map_err(|e| error::AppError::Internal(e.into()))?;
        Ok(Self {
            config,
            db,
            engine,
            passwords,
        })
    }
}
