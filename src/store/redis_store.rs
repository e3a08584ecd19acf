// src/store/redis_store.rs
use super::SharedStore;
use crate::utils::error::StoreError;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;

/// [`SharedStore`] backed by Redis
///
/// Uses a connection manager, so a Redis restart surfaces as failed calls
/// (degraded reads, fatal loop errors) until the connection comes back.
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    /// Connects to `redis://{host}:{port}/`
    ///
    /// # Errors
    /// Returns [`StoreError::Backend`] if the server cannot be reached.
    pub async fn connect(host: &str, port: u16) -> Result<Self, StoreError> {
        let client = redis::Client::open(format!("redis://{}:{}/", host, port))?;
        let manager = ConnectionManager::new(client).await?;
        log::info!("Connected to shared store at {}:{}", host, port);
        Ok(RedisStore { manager })
    }
}

impl SharedStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut con = self.manager.clone();
        let value: Option<String> = con.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut con = self.manager.clone();
        let _: () = con.set(key, value).await?;
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        let mut con = self.manager.clone();
        let _: () = con.set_ex(key, value, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut con = self.manager.clone();
        let value: i64 = con.incr(key, 1).await?;
        Ok(value)
    }

    async fn push_capped(
        &self,
        key: &str,
        value: String,
        cap: usize,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut con = self.manager.clone();
        let keep_from = -(cap.max(1) as isize);
        let _: () = redis::pipe()
            .atomic()
            .rpush(key, value)
            .ignore()
            .ltrim(key, keep_from, -1)
            .ignore()
            .expire(key, ttl.as_secs().max(1) as i64)
            .ignore()
            .query_async(&mut con)
            .await?;
        Ok(())
    }

    async fn list(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let mut con = self.manager.clone();
        let values: Vec<String> = con.lrange(key, 0, -1).await?;
        Ok(values)
    }

    async fn delete(&self, keys: &[&str]) -> Result<(), StoreError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut con = self.manager.clone();
        let _: () = con.del(keys).await?;
        Ok(())
    }
}
