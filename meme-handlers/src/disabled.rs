//! Disabled meme keywords, persisted as a JSON array of strings.

use memebot_core::{MemebotError, Result};
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Set of keywords the meme handler must ignore. Every mutation is written to disk
/// before the call returns; a failed write leaves the in-memory set unchanged.
pub struct DisabledSet {
    path: PathBuf,
    names: RwLock<Vec<String>>,
}

impl DisabledSet {
    /// Load from `path`. A missing file is an empty set.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let names = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Vec<String>>(&bytes).map_err(|e| {
                MemebotError::Serialization(format!("{}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), count = names.len(), "Loaded disabled memes");
        Ok(Self {
            path,
            names: RwLock::new(names),
        })
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.names.read().await.iter().any(|n| n == name)
    }

    pub async fn list(&self) -> Vec<String> {
        self.names.read().await.clone()
    }

    /// Returns false when `name` was already disabled.
    pub async fn disable(&self, name: &str) -> Result<bool> {
        let mut names = self.names.write().await;
        if names.iter().any(|n| n == name) {
            return Ok(false);
        }
        let mut next = names.clone();
        next.push(name.to_string());
        self.persist(&next).await?;
        *names = next;
        Ok(true)
    }

    /// Returns false when `name` was not disabled.
    pub async fn enable(&self, name: &str) -> Result<bool> {
        let mut names = self.names.write().await;
        if !names.iter().any(|n| n == name) {
            return Ok(false);
        }
        let next: Vec<String> = names.iter().filter(|n| *n != name).cloned().collect();
        self.persist(&next).await?;
        *names = next;
        Ok(true)
    }

    async fn persist(&self, names: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(names)
            .map_err(|e| MemebotError::Serialization(e.to_string()))?;
        if let Err(e) = tokio::fs::write(&self.path, json).await {
            warn!(path = %self.path.display(), error = %e, "Failed to persist disabled memes");
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let set = DisabledSet::load(dir.path().join("none.json")).await.unwrap();
        assert!(set.list().await.is_empty());
        assert!(!set.contains("摸").await);
    }

    /// **Test: disable/enable round-trip survives a reload from disk.**
    #[tokio::test]
    async fn test_disable_enable_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("disabled.json");

        let set = DisabledSet::load(&path).await.unwrap();
        assert!(set.disable("摸").await.unwrap());
        assert!(!set.disable("摸").await.unwrap());
        assert!(set.disable("打拳").await.unwrap());

        let reloaded = DisabledSet::load(&path).await.unwrap();
        assert_eq!(reloaded.list().await, vec!["摸", "打拳"]);

        assert!(reloaded.enable("摸").await.unwrap());
        assert!(!reloaded.enable("摸").await.unwrap());

        let reloaded = DisabledSet::load(&path).await.unwrap();
        assert_eq!(reloaded.list().await, vec!["打拳"]);
    }

    /// **Test: a failed write keeps memory in step with disk.**
    ///
    /// **Setup:** Load from `dir/blocker/disabled.json`, then turn `dir/blocker` into a file.
    /// **Action:** disable a new name; then restore the directory, disable, and break it again to enable.
    /// **Expected:** Both failing calls return Err and leave `contains` as it was.
    #[tokio::test]
    async fn test_failed_persist_leaves_set_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        let set = DisabledSet::load(blocker.join("disabled.json")).await.unwrap();

        std::fs::write(&blocker, "x").unwrap();
        assert!(set.disable("摸").await.is_err());
        assert!(!set.contains("摸").await);
        assert!(set.list().await.is_empty());

        std::fs::remove_file(&blocker).unwrap();
        assert!(set.disable("摸").await.unwrap());

        std::fs::remove_dir_all(&blocker).unwrap();
        std::fs::write(&blocker, "x").unwrap();
        assert!(set.enable("摸").await.is_err());
        assert!(set.contains("摸").await);
    }

    #[tokio::test]
    async fn test_invalid_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disabled.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(DisabledSet::load(&path).await.is_err());
    }
}
