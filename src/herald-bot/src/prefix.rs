//! Per-guild command prefixes with a write-through cache.
//!
//! The cache is authoritative once populated: a guild's prefix is read from
//! the [`PrefixStore`] at most once per cache entry.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::error::BotResult;

/// External persistence for guild prefixes.
#[async_trait]
pub trait PrefixStore: Send + Sync {
    /// Stored prefix of `guild`; `None` or an empty string if unset.
    async fn read_prefix(&self, guild: &str) -> BotResult<Option<String>>;

    /// Persist the prefix of `guild`.
    async fn write_prefix(&self, guild: &str, prefix: &str) -> BotResult<()>;
}

/// Resolves the command prefix of a guild.
pub struct PrefixResolver {
    default_prefix: String,
    cache: DashMap<String, String>,
    store: Option<Arc<dyn PrefixStore>>,
}

impl std::fmt::Debug for PrefixResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefixResolver")
            .field("default_prefix", &self.default_prefix)
            .field("cached", &self.cache.len())
            .field("store", &self.store.is_some())
            .finish()
    }
}

impl PrefixResolver {
    /// Resolver without persistence; every guild uses `default_prefix`.
    pub fn new(default_prefix: impl Into<String>) -> Self {
        Self {
            default_prefix: default_prefix.into(),
            cache: DashMap::new(),
            store: None,
        }
    }

    /// Resolver backed by `store`.
    pub fn with_store(default_prefix: impl Into<String>, store: Arc<dyn PrefixStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::new(default_prefix)
        }
    }

    pub fn default_prefix(&self) -> &str {
        &self.default_prefix
    }

    /// Prefix of `guild`.
    ///
    /// A cache miss reads the store once; an empty read writes the default
    /// back and caches it. Without a store the default is returned and
    /// nothing is cached.
    pub async fn get_prefix(&self, guild: &str) -> BotResult<String> {
        if let Some(prefix) = self.cache.get(guild) {
            return Ok(prefix.value().clone());
        }

        let Some(store) = &self.store else {
            return Ok(self.default_prefix.clone());
        };

        let prefix = match store.read_prefix(guild).await? {
            Some(prefix) if !prefix.is_empty() => prefix,
            _ => {
                debug!(guild, prefix = %self.default_prefix, "No stored prefix, writing default");
                store.write_prefix(guild, &self.default_prefix).await?;
                self.default_prefix.clone()
            }
        };

        self.cache.insert(guild.to_string(), prefix.clone());
        Ok(prefix)
    }

    /// Change the prefix of `guild`.
    ///
    /// The cache is updated before the store is written, so a failed write
    /// still leaves the new prefix in effect for this process.
    pub async fn set_prefix(&self, guild: &str, prefix: impl Into<String>) -> BotResult<()> {
        let prefix = prefix.into();
        self.cache.insert(guild.to_string(), prefix.clone());
        debug!(guild, prefix = %prefix, "Prefix updated");

        if let Some(store) = &self.store {
            store.write_prefix(guild, &prefix).await?;
        }
        Ok(())
    }

    /// Drop the cached prefix of `guild`; the next lookup reads the store.
    pub fn invalidate(&self, guild: &str) -> bool {
        self.cache.remove(guild).is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::BotError;

    #[derive(Default)]
    struct MemoryStore {
        prefixes: Mutex<HashMap<String, String>>,
        reads: AtomicUsize,
        writes: AtomicUsize,
        fail_writes: bool,
    }

    #[async_trait]
    impl PrefixStore for MemoryStore {
        async fn read_prefix(&self, guild: &str) -> BotResult<Option<String>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.prefixes.lock().unwrap().get(guild).cloned())
        }

        async fn write_prefix(&self, guild: &str, prefix: &str) -> BotResult<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes {
                return Err(BotError::Persistence("read-only store".to_string()));
            }
            self.prefixes
                .lock()
                .unwrap()
                .insert(guild.to_string(), prefix.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_no_store_uses_default() {
        let resolver = PrefixResolver::new("!");

        assert_eq!(resolver.get_prefix("g1").await.unwrap(), "!");
        assert!(!resolver.invalidate("g1"));
    }

    #[tokio::test]
    async fn test_miss_reads_once_and_writes_default() {
        let store = Arc::new(MemoryStore::default());
        let resolver = PrefixResolver::with_store("!", store.clone());

        assert_eq!(resolver.get_prefix("g1").await.unwrap(), "!");
        assert_eq!(resolver.get_prefix("g1").await.unwrap(), "!");

        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
        assert_eq!(
            store.prefixes.lock().unwrap().get("g1").map(String::as_str),
            Some("!")
        );
    }

    #[tokio::test]
    async fn test_stored_prefix_is_cached() {
        let store = Arc::new(MemoryStore::default());
        store
            .prefixes
            .lock()
            .unwrap()
            .insert("g1".to_string(), "$".to_string());
        let resolver = PrefixResolver::with_store("!", store.clone());

        assert_eq!(resolver.get_prefix("g1").await.unwrap(), "$");
        assert_eq!(resolver.get_prefix("g1").await.unwrap(), "$");
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_set_then_get_skips_read() {
        let store = Arc::new(MemoryStore::default());
        let resolver = PrefixResolver::with_store("!", store.clone());

        resolver.set_prefix("g1", "?").await.unwrap();

        assert_eq!(resolver.get_prefix("g1").await.unwrap(), "?");
        assert_eq!(store.reads.load(Ordering::SeqCst), 0);
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_set_without_store_is_cached() {
        let resolver = PrefixResolver::new("!");
        resolver.set_prefix("g1", "?").await.unwrap();

        assert_eq!(resolver.get_prefix("g1").await.unwrap(), "?");
        assert_eq!(resolver.get_prefix("g2").await.unwrap(), "!");
    }

    #[tokio::test]
    async fn test_failed_write_surfaces_but_cache_updates() {
        let store = Arc::new(MemoryStore {
            fail_writes: true,
            ..MemoryStore::default()
        });
        let resolver = PrefixResolver::with_store("!", store);

        let err = resolver.set_prefix("g1", "?").await.unwrap_err();
        assert!(matches!(err, BotError::Persistence(_)));
        assert_eq!(resolver.get_prefix("g1").await.unwrap(), "?");
    }

    #[tokio::test]
    async fn test_invalidate_forces_reread() {
        let store = Arc::new(MemoryStore::default());
        let resolver = PrefixResolver::with_store("!", store.clone());

        resolver.get_prefix("g1").await.unwrap();
        assert!(resolver.invalidate("g1"));
        resolver.get_prefix("g1").await.unwrap();

        assert_eq!(store.reads.load(Ordering::SeqCst), 2);
    }
}
