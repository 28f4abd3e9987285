//! JSON file prefix storage.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use herald_bot::{BotError, BotResult, PrefixStore};
use tokio::sync::Mutex;
use tracing::debug;

/// Stores guild prefixes as a JSON object `{ "guild": "prefix" }`.
#[derive(Debug)]
pub struct JsonPrefixStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonPrefixStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> BotResult<BTreeMap<String, String>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&text).map_err(|e| {
            BotError::Persistence(format!("Invalid prefix file {}: {}", self.path.display(), e))
        })
    }
}

#[async_trait]
impl PrefixStore for JsonPrefixStore {
    async fn read_prefix(&self, guild: &str) -> BotResult<Option<String>> {
        Ok(self.load().await?.remove(guild))
    }

    async fn write_prefix(&self, guild: &str, prefix: &str) -> BotResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut prefixes = self.load().await?;
        prefixes.insert(guild.to_string(), prefix.to_string());

        let json = serde_json::to_string_pretty(&prefixes)
            .map_err(|e| BotError::Persistence(e.to_string()))?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, json).await?;

        debug!(guild, prefix, path = %self.path.display(), "Stored prefix");
        Ok(())
    }
}
