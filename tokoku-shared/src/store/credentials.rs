/// Credential Store
///
/// Persists username + password-hash pairs and enforces username
/// uniqueness. The uniqueness check lives inside the backend's write path
/// (a unique constraint for PostgreSQL, a single locked check-and-insert
/// for memory), so concurrent registrations of one name yield exactly one
/// success.
///
/// # Example
///
/// ```
/// use tokoku_shared::store::{CredentialStore, MemoryCredentialStore, StoreError};
///
/// # async fn example() -> Result<(), StoreError> {
/// let store = MemoryCredentialStore::new();
/// let user = store.insert("alice", "$argon2id$...").await?;
///
/// assert!(matches!(
///     store.insert("alice", "$argon2id$...").await,
///     Err(StoreError::DuplicateUsername)
/// ));
/// assert_eq!(store.find_by_username("alice").await?.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::models::user::{CreateUser, User, USERNAME_UNIQUE_CONSTRAINT};

/// Credential store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The username is already registered
    #[error("Username already exists")]
    DuplicateUsername,

    /// Backend failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence seam for credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Inserts a credential, failing with `DuplicateUsername` if the name is taken
    async fn insert(&self, username: &str, password_hash: &str) -> Result<User, StoreError>;

    /// Looks up a credential by exact username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Looks up a credential by id
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;
}

/// PostgreSQL-backed store over the `users` table
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_duplicate_username(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation()
                && db_err
                    .constraint()
                    .map_or(true, |name| name == USERNAME_UNIQUE_CONSTRAINT)
        }
        _ => false,
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn insert(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let data = CreateUser {
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };

        User::create(&self.pool, data).await.map_err(|e| {
            if is_duplicate_username(&e) {
                StoreError::DuplicateUsername
            } else {
                StoreError::Database(e)
            }
        })
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_username(&self.pool, username).await?)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    by_id: HashMap<i64, User>,
    by_username: HashMap<String, i64>,
}

/// In-process store, for tests and local runs without a database
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes a credential, returning `true` if it existed
    pub async fn remove(&self, id: i64) -> bool {
        let mut state = self.state.lock().await;
        match state.by_id.remove(&id) {
            Some(user) => {
                state.by_username.remove(&user.username);
                true
            }
            None => false,
        }
    }

    /// Number of stored credentials
    pub async fn len(&self) -> usize {
        self.state.lock().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.by_id.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut state = self.state.lock().await;

        if state.by_username.contains_key(username) {
            return Err(StoreError::DuplicateUsername);
        }

        state.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: state.next_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };

        state.by_username.insert(user.username.clone(), user.id);
        state.by_id.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .by_username
            .get(username)
            .and_then(|id| state.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.state.lock().await.by_id.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryCredentialStore::new();
        let alice = store.insert("alice", "hash-a").await.unwrap();
        let bob = store.insert("bob", "hash-b").await.unwrap();

        assert_ne!(alice.id, bob.id);

        let found = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, alice.id);
        assert_eq!(found.password_hash, "hash-a");

        let found = store.find_by_id(bob.id).await.unwrap().unwrap();
        assert_eq!(found.username, "bob");
    }

    #[tokio::test]
    async fn test_missing_lookups() {
        let store = MemoryCredentialStore::new();
        assert!(store.find_by_username("nobody").await.unwrap().is_none());
        assert!(store.find_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let store = MemoryCredentialStore::new();
        store.insert("alice", "hash-1").await.unwrap();

        let err = store.insert("alice", "hash-2").await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUsername));

        // First registration is untouched
        let found = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.password_hash, "hash-1");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_usernames_are_case_sensitive() {
        let store = MemoryCredentialStore::new();
        store.insert("alice", "h").await.unwrap();
        assert!(store.insert("Alice", "h").await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicate_registrations() {
        let store = MemoryCredentialStore::new();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.insert("carol", &format!("hash-{}", i)).await })
            })
            .collect();

        let mut successes = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(StoreError::DuplicateUsername) => duplicates += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(duplicates, 15);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = MemoryCredentialStore::new();
        let user = store.insert("dave", "h").await.unwrap();

        assert!(store.remove(user.id).await);
        assert!(!store.remove(user.id).await);
        assert!(store.find_by_username("dave").await.unwrap().is_none());
        assert!(store.is_empty().await);

        // Name is free again
        assert!(store.insert("dave", "h").await.is_ok());
    }
}
