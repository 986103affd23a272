// Admin authentication
// Opaque in-memory tokens gating ingestion, deletion, and listing

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Issues and verifies opaque admin session tokens.
///
/// Tokens are random and held in memory only, so every process restart
/// invalidates all sessions. That is acceptable for a single-admin,
/// low-churn deployment; a distributed deployment would need signed tokens
/// instead.
#[derive(Debug)]
pub struct AuthService {
    admin_password: String,
    tokens: HashMap<String, DateTime<Utc>>,
    token_lifetime: Duration,
}

impl AuthService {
    #[inline]
    pub fn new(admin_password: String) -> Self {
        Self {
            admin_password,
            tokens: HashMap::new(),
            token_lifetime: Duration::hours(TOKEN_LIFETIME_HOURS),
        }
    }

    #[inline]
    pub fn with_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }

    /// Check a password attempt against the configured admin password.
    #[inline]
    pub fn check_password(&self, attempt: &str) -> bool {
        // Compare every byte to keep timing independent of the match prefix
        let expected = self.admin_password.as_bytes();
        let attempt = attempt.as_bytes();
        if expected.len() != attempt.len() {
            return false;
        }
        expected
            .iter()
            .zip(attempt.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }

    /// Issue a fresh admin token with the configured lifetime.
    #[inline]
    pub fn issue_token(&mut self) -> String {
        let token = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + self.token_lifetime;
        self.tokens.insert(token.clone(), expires_at);
        debug!("Issued admin token expiring at {}", expires_at);
        token
    }

    /// Verify a token: it must have been issued here and not be expired.
    #[inline]
    pub fn verify(&self, token: &str) -> bool {
        self.tokens
            .get(token)
            .is_some_and(|expires_at| *expires_at > Utc::now())
    }

    /// Drop expired tokens from the session table.
    #[inline]
    pub fn revoke_expired(&mut self) {
        let now = Utc::now();
        self.tokens.retain(|_, expires_at| *expires_at > now);
    }
}
