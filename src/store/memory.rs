// src/store/memory.rs
use super::SharedStore;
use crate::utils::error::StoreError;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    List(VecDeque<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// In-process [`SharedStore`] with TTL expiry
///
/// Clones share the same map. [`MemoryStore::set_available`] makes every
/// operation fail with [`StoreError::Unavailable`], which is how degraded
/// reads are exercised without a real outage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Creates an empty, available store
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles simulated availability
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock()
            .map(|map| map.values().filter(|e| e.is_live(now)).count())
            .unwrap_or(0)
    }

    /// `true` if no live keys are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        // a poisoned map is still structurally valid
        Ok(self.entries.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Locks the map for a write, dropping every expired entry
    ///
    /// Result keys are written once and never read back, so expiry can't
    /// wait for the key to be touched again.
    fn lock_for_write(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, StoreError> {
        let mut map = self.lock()?;
        let now = Instant::now();
        map.retain(|_, e| e.is_live(now));
        Ok(map)
    }

    /// Locks the map and drops whatever expired under `key`
    fn lock_live(&self, key: &str) -> Result<MutexGuard<'_, HashMap<String, Entry>>, StoreError> {
        let mut map = self.lock()?;
        let now = Instant::now();
        if map.get(key).is_some_and(|e| !e.is_live(now)) {
            map.remove(key);
        }
        Ok(map)
    }
}

impl SharedStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let map = self.lock_live(key)?;
        match map.get(key).map(|e| &e.value) {
            Some(Value::Text(s)) => Ok(Some(s.clone())),
            Some(Value::List(_)) => Err(StoreError::Parse {
                key: key.to_string(),
                value: "<list>".to_string(),
            }),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut map = self.lock_for_write()?;
        map.insert(
            key.to_string(),
            Entry {
                value: Value::Text(value),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        let mut map = self.lock_for_write()?;
        map.insert(
            key.to_string(),
            Entry {
                value: Value::Text(value),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut map = self.lock_for_write()?;
        let current = match map.get(key).map(|e| &e.value) {
            None => 0,
            Some(Value::Text(s)) => s.parse::<i64>().map_err(|_| StoreError::Parse {
                key: key.to_string(),
                value: s.clone(),
            })?,
            Some(Value::List(_)) => {
                return Err(StoreError::Parse {
                    key: key.to_string(),
                    value: "<list>".to_string(),
                });
            }
        };
        let next = current + 1;
        let expires_at = map.get(key).and_then(|e| e.expires_at);
        map.insert(
            key.to_string(),
            Entry {
                value: Value::Text(next.to_string()),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn push_capped(
        &self,
        key: &str,
        value: String,
        cap: usize,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut map = self.lock_for_write()?;
        let entry = map.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::List(VecDeque::new()),
            expires_at: None,
        });
        let Value::List(list) = &mut entry.value else {
            return Err(StoreError::Parse {
                key: key.to_string(),
                value: "<text>".to_string(),
            });
        };
        list.push_back(value);
        while list.len() > cap {
            list.pop_front();
        }
        entry.expires_at = Some(Instant::now() + ttl);
        Ok(())
    }

    async fn list(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let map = self.lock_live(key)?;
        match map.get(key).map(|e| &e.value) {
            Some(Value::List(list)) => Ok(list.iter().cloned().collect()),
            Some(Value::Text(s)) => Err(StoreError::Parse {
                key: key.to_string(),
                value: s.clone(),
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn delete(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut map = self.lock()?;
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn incr_starts_from_zero() {
        let store = MemoryStore::new();
        assert_eq!(store.incr("n").await.unwrap(), 1);
        assert_eq!(store.incr("n").await.unwrap(), 2);
        assert_eq!(store.get("n").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn incr_rejects_non_integer() {
        let store = MemoryStore::new();
        store.set("n", "abc".into()).await.unwrap();
        assert!(matches!(
            store.incr("n").await,
            Err(StoreError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn expired_values_disappear() {
        let store = MemoryStore::new();
        store
            .set_ex("k", "v".into(), Duration::from_millis(30))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn writes_purge_expired_keys_never_read_again() {
        let store = MemoryStore::new();
        for block in 0..1000 {
            store
                .set_ex(&format!("result:{}", block), "r".into(), Duration::from_millis(1))
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        store.set("active", "1".into()).await.unwrap();
        store.incr("total").await.unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.entries.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn push_capped_keeps_newest() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .push_capped("l", i.to_string(), 3, Duration::from_secs(60))
                .await
                .unwrap();
        }
        assert_eq!(store.list("l").await.unwrap(), vec!["2", "3", "4"]);
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set("k", "v".into()).await.unwrap();
        store.set_available(false);
        assert!(matches!(store.get("k").await, Err(StoreError::Unavailable)));
        assert!(store.incr("n").await.is_err());
        store.set_available(true);
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn delete_ignores_missing_keys() {
        let store = MemoryStore::new();
        store.set("a", "1".into()).await.unwrap();
        store.delete(&["a", "missing"]).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
    }
}
