/// Redis integration
///
/// Redis backs the token revocation list when `REDIS_URL` is configured.
/// Keys expire on their own, so the denylist never needs sweeping.
///
/// # Example
///
/// ```no_run
/// use tokoku_shared::redis::{RedisClient, RedisConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RedisClient::new(RedisConfig::new("redis://localhost:6379")).await?;
/// assert!(client.ping().await?);
/// # Ok(())
/// # }
/// ```

pub mod client;

pub use client::{RedisClient, RedisClientError, RedisConfig};
