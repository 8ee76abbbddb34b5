// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod game;
pub mod user;

pub use game::{GameMode, GameRecord, GameResult};
pub use user::{ProfileUpdate, PublicUser, User};
