/// Token revocation (logout)
///
/// Session tokens are stateless, so logging out means remembering the
/// token's `jti` until the token would have expired anyway. The Auth Gate
/// consults this list after signature verification.
///
/// # Backends
///
/// - [`RedisRevocationList`]: `SET revoked:{jti} 1 EX {ttl}`; Redis drops
///   the entry when the token expires. Shared by every API instance.
/// - [`MemoryRevocationList`]: in-process map, swept by
///   [`MemoryRevocationList::purge_expired`]. Single-instance only.
///
/// Entries for tokens without an expiry are kept indefinitely.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::token::VerifiedToken;
use crate::redis::{RedisClient, RedisClientError};

/// Revocation backend errors
#[derive(Debug, thiserror::Error)]
pub enum RevocationError {
    /// Backend could not be reached or rejected the command
    #[error("Revocation backend error: {0}")]
    Backend(String),
}

impl From<RedisClientError> for RevocationError {
    fn from(err: RedisClientError) -> Self {
        RevocationError::Backend(err.to_string())
    }
}

impl From<redis::RedisError> for RevocationError {
    fn from(err: redis::RedisError) -> Self {
        RevocationError::Backend(err.to_string())
    }
}

/// Denylist of revoked token ids
#[async_trait]
pub trait RevocationList: Send + Sync {
    /// Revokes `token` until its expiry
    async fn revoke(&self, token: &VerifiedToken) -> Result<(), RevocationError>;

    /// Whether `token_id` has been revoked
    async fn is_revoked(&self, token_id: Uuid) -> Result<bool, RevocationError>;
}

/// In-process revocation list
///
/// Maps token id to its expiry (Unix seconds, `None` = never). Expired
/// entries are treated as absent and removed by `purge_expired`.
#[derive(Debug, Clone, Default)]
pub struct MemoryRevocationList {
    entries: Arc<RwLock<HashMap<Uuid, Option<i64>>>>,
}

impl MemoryRevocationList {
    /// Creates an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops entries whose token has expired and returns how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now().timestamp();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, exp| exp.map_or(true, |exp| exp > now));
        before - entries.len()
    }

    /// Number of tracked entries, including ones not yet purged
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the list tracks no entries
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl RevocationList for MemoryRevocationList {
    async fn revoke(&self, token: &VerifiedToken) -> Result<(), RevocationError> {
        self.entries
            .write()
            .await
            .insert(token.token_id, token.expires_at);
        Ok(())
    }

    async fn is_revoked(&self, token_id: Uuid) -> Result<bool, RevocationError> {
        let now = Utc::now().timestamp();
        let entries = self.entries.read().await;
        Ok(matches!(entries.get(&token_id), Some(exp) if exp.map_or(true, |exp| exp > now)))
    }
}

/// Redis-backed revocation list
#[derive(Clone)]
pub struct RedisRevocationList {
    client: RedisClient,
}

impl RedisRevocationList {
    /// Wraps a connected Redis client
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    fn key(token_id: Uuid) -> String {
        format!("revoked:{}", token_id)
    }

    /// Runs a command under the client's command timeout
    async fn bounded<T>(
        &self,
        command: impl std::future::Future<Output = redis::RedisResult<T>>,
    ) -> Result<T, RevocationError> {
        match tokio::time::timeout(self.client.config().command_timeout(), command).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(RedisClientError::Timeout.into()),
        }
    }
}

#[async_trait]
impl RevocationList for RedisRevocationList {
    async fn revoke(&self, token: &VerifiedToken) -> Result<(), RevocationError> {
        let mut conn = self.client.get_connection();
        let key = Self::key(token.token_id);

        match token.remaining_lifetime() {
            // Already expired; the gate will reject it without our help
            Some(left) if left.num_seconds() <= 0 => {}
            Some(left) => {
                let ttl = left.num_seconds() as u64;
                let _: () = self.bounded(conn.set_ex(&key, 1u8, ttl)).await?;
            }
            None => {
                let _: () = self.bounded(conn.set(&key, 1u8)).await?;
            }
        }

        Ok(())
    }

    async fn is_revoked(&self, token_id: Uuid) -> Result<bool, RevocationError> {
        let mut conn = self.client.get_connection();
        let exists: bool = self.bounded(conn.exists(Self::key(token_id))).await?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(expires_at: Option<i64>) -> VerifiedToken {
        VerifiedToken {
            subject_id: 1,
            token_id: Uuid::new_v4(),
            issued_at: Utc::now().timestamp(),
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_revoke_and_check() {
        let list = MemoryRevocationList::new();
        let revoked = token(Some(Utc::now().timestamp() + 3600));
        let other = token(Some(Utc::now().timestamp() + 3600));

        list.revoke(&revoked).await.unwrap();

        assert!(list.is_revoked(revoked.token_id).await.unwrap());
        assert!(!list.is_revoked(other.token_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_without_expiry_is_permanent() {
        let list = MemoryRevocationList::new();
        let revoked = token(None);

        list.revoke(&revoked).await.unwrap();

        assert_eq!(list.purge_expired().await, 0);
        assert!(list.is_revoked(revoked.token_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let list = MemoryRevocationList::new();
        let now = Utc::now().timestamp();
        let stale = token(Some(now - 10));
        let live = token(Some(now + 3600));

        list.revoke(&stale).await.unwrap();
        list.revoke(&live).await.unwrap();
        assert_eq!(list.len().await, 2);

        // Expired entries already read as not revoked before purging
        assert!(!list.is_revoked(stale.token_id).await.unwrap());

        assert_eq!(list.purge_expired().await, 1);
        assert_eq!(list.len().await, 1);
        assert!(list.is_revoked(live.token_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let list = MemoryRevocationList::new();
        let clone = list.clone();
        let revoked = token(None);

        clone.revoke(&revoked).await.unwrap();
        assert!(list.is_revoked(revoked.token_id).await.unwrap());
        assert!(!list.is_empty().await);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis (set REDIS_URL)"]
    async fn test_redis_revocation() {
        use crate::redis::RedisConfig;

        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let client = RedisClient::new(RedisConfig::new(url)).await.unwrap();
        let list = RedisRevocationList::new(client);

        let revoked = token(Some(Utc::now().timestamp() + 60));
        list.revoke(&revoked).await.unwrap();

        assert!(list.is_revoked(revoked.token_id).await.unwrap());
        assert!(!list.is_revoked(Uuid::new_v4()).await.unwrap());
    }
}
