use std::collections::HashMap;

use axum::http::{HeaderMap, header::AUTHORIZATION};
use chrono::{DateTime, TimeDelta, Utc};
use log::debug;
use sha2::{Digest as _, Sha256};

use crate::error::ApiError;

const SALT_LEN: usize = 16;

/// A random 128-bit identifier in hex.
#[must_use]
pub fn new_id() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

/// Hashes `password` with a fresh salt into `salt$digest`.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let salt: [u8; SALT_LEN] = rand::random();
    format!("{}${}", hex::encode(salt), digest(&salt, password))
}

#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt) else {
        return false;
    };
    digest(&salt, password) == expected
}

fn digest(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// The token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split_once(' '))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::Unauthorized)
}

#[derive(Debug, Clone)]
struct Session {
    user_id: String,
    expires_at: DateTime<Utc>,
}

/// Issued session tokens, kept in memory.
#[derive(Debug)]
pub struct SessionStore {
    ttl: TimeDelta,
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    #[must_use]
    pub fn new(ttl: TimeDelta) -> Self {
        Self {
            ttl,
            sessions: HashMap::new(),
        }
    }

    pub fn issue(&mut self, user_id: &str, now: DateTime<Utc>) -> String {
        self.sessions.retain(|_, session| session.expires_at > now);
        let token = format!("{}{}", new_id(), new_id());
        self.sessions.insert(
            token.clone(),
            Session {
                user_id: user_id.to_owned(),
                expires_at: now + self.ttl,
            },
        );
        token
    }

    /// The user a live token belongs to. Expired tokens are dropped.
    pub fn resolve(&mut self, token: &str, now: DateTime<Utc>) -> Option<String> {
        let session = self.sessions.get(token)?;
        if session.expires_at <= now {
            debug!("session token expired");
            self.sessions.remove(token);
            return None;
        }
        Some(session.user_id.clone())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.sessions.len()
    }
}
