// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod engine;
pub mod password;

pub use engine::{EngineMove, EngineService, MoveAnalysis, MoveQuality};
pub use password::PasswordHasher;
