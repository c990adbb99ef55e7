use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};

use crate::cache::{SharedStore, StoreError};

/// Redis rejects `EX 0` and expiries whose millisecond form overflows.
const MAX_EXPIRY_SECS: u64 = u32::MAX as u64;

/// [`SharedStore`] backed by a Redis connection manager.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(unavailable)?;
        let connection = tokio::time::timeout(timeout, client.get_connection_manager())
            .await
            .map_err(|_| StoreError::Unavailable(format!("connect timed out after {timeout:?}")))?
            .map_err(unavailable)?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl SharedStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut connection = self.connection.clone();
        connection.get(key).await.map_err(unavailable)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        connection
            .set::<_, _, ()>(key, value)
            .await
            .map_err(unavailable)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        connection
            .expire::<_, ()>(key, expiry_seconds(ttl) as i64)
            .await
            .map_err(unavailable)
    }

    /// Single `SET key value EX secs`, so the key never lands without a TTL.
    async fn set_with_expiry(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        connection
            .set_ex::<_, _, ()>(key, value, expiry_seconds(ttl))
            .await
            .map_err(unavailable)
    }
}

fn expiry_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().clamp(1, MAX_EXPIRY_SECS)
}

fn unavailable(err: redis::RedisError) -> StoreError {
    StoreError::Unavailable(err.to_string())
}
