// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Random token generation and password hashing.

use crate::error::AppError;
use ring::rand::{SecureRandom, SystemRandom};

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

fn rng_error() -> AppError {
    AppError::Internal(anyhow::anyhow!("System RNG failure"))
}

/// Fill a buffer of `len` random bytes.
pub fn random_bytes(len: usize) -> Result<Vec<u8>, AppError> {
    let mut bytes = vec![0u8; len];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| rng_error())?;
    Ok(bytes)
}

/// Random `[A-Za-z0-9]` string of exactly `len` characters.
pub fn random_alphanumeric(len: usize) -> Result<String, AppError> {
    // 248 is the largest multiple of 62 below 256; rejecting above it keeps
    // the distribution uniform.
    const LIMIT: u8 = 248;
    let rng = SystemRandom::new();
    let mut out = String::with_capacity(len);
    let mut buf = [0u8; 64];

    while out.len() < len {
        rng.fill(&mut buf).map_err(|_| rng_error())?;
        for &b in buf.iter().filter(|&&b| b < LIMIT) {
            if out.len() == len {
                break;
            }
            out.push(ALPHANUMERIC[(b % 62) as usize] as char);
        }
    }

    Ok(out)
}

/// Random lowercase hex string encoding `len` bytes.
pub fn random_hex(len: usize) -> Result<String, AppError> {
    Ok(hex::encode(random_bytes(len)?))
}

/// Hash a password with bcrypt (random per-hash salt) on the blocking pool.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
}

/// Check a password against a stored bcrypt hash.
///
/// A malformed stored hash is reported as a mismatch.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_string();
    let hash = hash.to_string();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Hashing task failed: {}", e)))?;

    match verified {
        Ok(matches) => Ok(matches),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            Ok(false)
        }
    }
}
