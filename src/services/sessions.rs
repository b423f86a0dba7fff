//! Operator session store.
//!
//! Process-local map from session token to expiry instant. Nothing is
//! persisted, so a restart logs everybody out. Entries are keyed by the
//! SHA-256 digest of the token, the raw token only ever lives with the client.
//!
//! Lock discipline: `validate` takes the read lock and may run in parallel;
//! `issue`, `revoke` and `sweep` take the write lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;

/// Session lifetime in seconds (24 hours).
pub const SESSION_TTL_SECS: i64 = 86_400;

const TOKEN_BYTES: usize = 32;

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn generate_token() -> Result<String, AppError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AppError::Internal(format!("Failed to create session: {}", e)))?;
    Ok(hex::encode(bytes))
}

#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, DateTime<Utc>>>,
    ttl: chrono::Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: chrono::Duration::seconds(SESSION_TTL_SECS),
        }
    }

    /// Creates a session valid for 24 hours and returns its token
    /// (64 hex characters).
    pub async fn issue(&self) -> Result<String, AppError> {
        self.issue_at(Utc::now()).await
    }

    pub(crate) async fn issue_at(&self, now: DateTime<Utc>) -> Result<String, AppError> {
        let token = generate_token()?;
        self.sessions
            .write()
            .await
            .insert(hash_token(&token), now + self.ttl);
        Ok(token)
    }

    /// True iff the token is known and its expiry is strictly after now.
    pub async fn validate(&self, token: &str) -> bool {
        self.validate_at(token, Utc::now()).await
    }

    pub(crate) async fn validate_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.sessions
            .read()
            .await
            .get(&hash_token(token))
            .is_some_and(|expiry| *expiry > now)
    }

    /// Removes the session. Unknown tokens are ignored.
    pub async fn revoke(&self, token: &str) {
        self.sessions.write().await.remove(&hash_token(token));
    }

    /// Drops every session whose expiry is at or before now and returns how
    /// many were removed.
    pub async fn sweep(&self) -> usize {
        self.sweep_at(Utc::now()).await
    }

    pub(crate) async fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, expiry| *expiry > now);
        before - sessions.len()
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    #[cfg(test)]
    async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Background task that sweeps expired sessions on a fixed interval until
/// [`SessionSweeper::shutdown`] is called.
#[derive(Debug)]
pub struct SessionSweeper {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

impl SessionSweeper {
    pub fn spawn(store: Arc<SessionStore>, every: Duration) -> Self {
        let stop = CancellationToken::new();
        let stopped = stop.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = store.sweep().await;
                        if removed > 0 {
                            tracing::info!(removed, "Expired sessions swept");
                        } else {
                            tracing::debug!("Session sweep found nothing to remove");
                        }
                    }
                    _ = stopped.cancelled() => break,
                }
            }

            tracing::debug!("Session sweeper stopped");
        });

        Self { stop, handle }
    }

    /// Signals the task to stop and waits for it to finish.
    pub async fn shutdown(self) {
        self.stop.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "Session sweeper did not stop cleanly");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issued_token_is_256_bits_of_hex() {
        let store = SessionStore::new();
        let a = store.issue().await.unwrap();
        let b = store.issue().await.unwrap();

        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn valid_until_just_before_24_hours() {
        let store = SessionStore::new();
        let issued = Utc::now();
        let token = store.issue_at(issued).await.unwrap();
        let day = chrono::Duration::seconds(SESSION_TTL_SECS);

        assert!(store.validate_at(&token, issued).await);
        assert!(store.validate_at(&token, issued + day - chrono::Duration::milliseconds(1)).await);
        assert!(!store.validate_at(&token, issued + day).await);
        assert!(!store.validate_at(&token, issued + day + chrono::Duration::hours(1)).await);
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let store = SessionStore::new();
        store.issue().await.unwrap();

        assert!(!store.validate("deadbeef").await);
        assert!(!store.validate("").await);
    }

    #[tokio::test]
    async fn revoke_is_immediate_and_idempotent() {
        let store = SessionStore::new();
        let token = store.issue().await.unwrap();

        store.revoke(&token).await;
        assert!(!store.validate(&token).await);
        store.revoke(&token).await;
        store.revoke("never-issued").await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_entries() {
        let store = SessionStore::new();
        let now = Utc::now();
        let day = chrono::Duration::seconds(SESSION_TTL_SECS);
        store.issue_at(now - day - chrono::Duration::seconds(1)).await.unwrap();
        // Expires exactly now: swept.
        store.issue_at(now - day).await.unwrap();
        let live = store.issue_at(now).await.unwrap();

        assert_eq!(store.sweep_at(now).await, 2);
        assert_eq!(store.len().await, 1);
        assert!(store.validate_at(&live, now).await);
    }

    #[tokio::test]
    async fn map_does_not_hold_raw_tokens() {
        let store = SessionStore::new();
        let token = store.issue().await.unwrap();

        let sessions = store.sessions.read().await;
        assert!(!sessions.contains_key(&token));
        assert!(sessions.contains_key(&hash_token(&token)));
    }

    #[tokio::test]
    async fn parallel_validation_shares_the_lock() {
        let store = Arc::new(SessionStore::new());
        let token = store.issue().await.unwrap();

        let checks = (0..16).map(|_| {
            let store = Arc::clone(&store);
            let token = token.clone();
            tokio::spawn(async move { store.validate(&token).await })
        });
        for check in checks.collect::<Vec<_>>() {
            assert!(check.await.unwrap());
        }
    }

    #[tokio::test]
    async fn sweeper_reclaims_and_stops() {
        let store = Arc::new(SessionStore::new());
        let long_ago = Utc::now() - chrono::Duration::days(2);
        store.issue_at(long_ago).await.unwrap();
        let live = store.issue().await.unwrap();

        let sweeper = SessionSweeper::spawn(Arc::clone(&store), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(store.len().await, 1);
        assert!(store.validate(&live).await);

        tokio::time::timeout(Duration::from_secs(1), sweeper.shutdown())
            .await
            .expect("sweeper should stop promptly");
    }
}
