use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::models::Movement;

const MOVEMENTS_KEY: &str = "movements";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub cached_at: DateTime<Utc>,
    pub ttl_secs: u64,
    pub data: T,
}

impl<T> CachedData<T> {
    pub fn new(data: T, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            cached_at: now,
            ttl_secs: ttl.as_secs(),
            data,
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.cached_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.age(now) > chrono::Duration::seconds(self.ttl_secs as i64)
    }
}

/// JSON file cache, one `<key>.json` per entry.
pub struct CacheManager {
    cache_dir: PathBuf,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf, default_ttl: Duration) -> Result<Self> {
        Self::with_clock(cache_dir, default_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        cache_dir: PathBuf,
        default_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir).with_context(|| {
            format!("Failed to create cache directory: {}", cache_dir.display())
        })?;
        Ok(Self {
            cache_dir,
            default_ttl,
            clock,
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", key))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", key))?;

        Ok(Some(cached))
    }

    /// Fresh cached data for `key`. Missing, expired and unreadable entries
    /// are all a miss.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let cached = match self.load::<T>(key) {
            Ok(Some(cached)) => cached,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "Ignoring unreadable cache entry");
                return None;
            }
        };

        let now = self.clock.now();
        if cached.is_expired(now) {
            debug!(key, age_secs = cached.age(now).num_seconds(), "Cache entry expired");
            return None;
        }
        debug!(key, "Cache hit");
        Some(cached.data)
    }

    /// Store `data` under `key`; `ttl` falls back to the manager's default.
    pub fn set<T: Serialize>(&self, key: &str, data: &T, ttl: Option<Duration>) -> Result<()> {
        let cached = CachedData::new(data, ttl.unwrap_or(self.default_ttl), self.clock.now());
        let path = self.cache_path(key);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write cache file: {}", key))?;
        debug!(key, ttl_secs = cached.ttl_secs, "Cache entry stored");
        Ok(())
    }

    pub fn invalidate(&self, key: &str) -> Result<()> {
        let path = self.cache_path(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove cache file: {}", key))?;
        }
        Ok(())
    }

    /// Remove every cache entry.
    pub fn clear(&self) -> Result<()> {
        for entry in std::fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    // ===== Movements =====

    pub fn load_movements(&self) -> Option<Vec<Movement>> {
        self.get(MOVEMENTS_KEY)
    }

    pub fn save_movements(&self, movements: &[Movement]) -> Result<()> {
        self.set(MOVEMENTS_KEY, &movements, None)
    }

    pub fn invalidate_movements(&self) -> Result<()> {
        self.invalidate(MOVEMENTS_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use tempfile::TempDir;

    fn manager(ttl_secs: u64) -> (TempDir, Arc<ManualClock>, CacheManager) {
        let dir = TempDir::new().expect("temp dir");
        let clock = Arc::new(ManualClock::default());
        let cache = CacheManager::with_clock(
            dir.path().join("cache"),
            Duration::from_secs(ttl_secs),
            clock.clone(),
        )
        .expect("cache manager");
        (dir, clock, cache)
    }

    #[test]
    fn test_get_returns_fresh_entry() {
        let (_dir, _clock, cache) = manager(60);
        cache.set("numbers", &vec![1, 2, 3], None).unwrap();
        assert_eq!(cache.get::<Vec<i32>>("numbers"), Some(vec![1, 2, 3]));
        assert!(cache.cache_dir().join("numbers.json").exists());
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let (_dir, clock, cache) = manager(60);
        cache.set("numbers", &vec![1], None).unwrap();

        clock.advance(chrono::Duration::seconds(60));
        assert!(cache.get::<Vec<i32>>("numbers").is_some());

        clock.advance(chrono::Duration::seconds(1));
        assert!(cache.get::<Vec<i32>>("numbers").is_none());
    }

    #[test]
    fn test_explicit_ttl_overrides_default() {
        let (_dir, clock, cache) = manager(60);
        cache
            .set("long", &"kept", Some(Duration::from_secs(3600)))
            .unwrap();
        clock.advance(chrono::Duration::seconds(600));
        assert_eq!(cache.get::<String>("long").as_deref(), Some("kept"));
    }

    #[test]
    fn test_corrupt_file_is_a_miss() {
        let (_dir, _clock, cache) = manager(60);
        std::fs::write(cache.cache_dir().join("broken.json"), "{not json").unwrap();
        assert!(cache.get::<Vec<i32>>("broken").is_none());
        assert!(cache.get::<Vec<i32>>("absent").is_none());
    }

    #[test]
    fn test_invalidate_and_clear() {
        let (_dir, _clock, cache) = manager(60);
        cache.set("a", &1, None).unwrap();
        cache.set("b", &2, None).unwrap();

        cache.invalidate("a").unwrap();
        cache.invalidate("never-written").unwrap();
        assert!(cache.get::<i32>("a").is_none());
        assert_eq!(cache.get::<i32>("b"), Some(2));

        cache.clear().unwrap();
        assert!(cache.get::<i32>("b").is_none());
    }
}
