// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Salted password hashing (PBKDF2-HMAC-SHA256 via `ring`).
//!
//! Credentials are stored as `pbkdf2-sha256$<iterations>$<salt hex>$<hash hex>`
//! so the iteration count can be raised without invalidating old accounts.

use ring::rand::{SecureRandom, SystemRandom};
use ring::{digest, pbkdf2};
use std::num::NonZeroU32;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const CREDENTIAL_LEN: usize = digest::SHA256_OUTPUT_LEN;

/// Production iteration count.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("random number generator failure")]
    Rng,

    #[error("iteration count must be non-zero")]
    ZeroIterations,
}

/// Hashes new passwords and verifies stored credentials.
#[derive(Clone)]
pub struct PasswordHasher {
    iterations: NonZeroU32,
    rng: SystemRandom,
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Result<Self, PasswordError> {
        Ok(Self {
            iterations: NonZeroU32::new(iterations).ok_or(PasswordError::ZeroIterations)?,
            rng: SystemRandom::new(),
        })
    }

    /// Hash a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let mut salt = [0u8; SALT_LEN];
        self.rng.fill(&mut salt).map_err(|_| PasswordError::Rng)?;

        let mut credential = [0u8; CREDENTIAL_LEN];
        pbkdf2::derive(
            ALGORITHM,
            self.iterations,
            &salt,
            password.as_bytes(),
            &mut credential,
        );

        Ok(format!(
            "{}${}${}${}",
            SCHEME,
            self.iterations,
            hex::encode(salt),
            hex::encode(credential)
        ))
    }

    /// Check a password against a stored credential string.
    ///
    /// Malformed credentials never verify.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        let parts: Vec<&str> = stored.split('$').collect();
        let [scheme, iterations, salt, credential] = parts.as_slice() else {
            return false;
        };
        if *scheme != SCHEME {
            return false;
        }

        let Some(iterations) = iterations.parse::<u32>().ok().and_then(NonZeroU32::new) else {
            return false;
        };
        let (Ok(salt), Ok(credential)) = (hex::decode(salt), hex::decode(credential)) else {
            return false;
        };

        pbkdf2::verify(
            ALGORITHM,
            iterations,
            &salt,
            password.as_bytes(),
            &credential,
        )
        .is_ok()
    }
}
