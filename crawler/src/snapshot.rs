//! JSON snapshots on disk that make every fetch stage resumable.
//!
//! A snapshot that exists is trusted as-is; delete the file to force a refetch.

use std::{
    future::Future,
    path::{Path, PathBuf},
};

use anyhow::Context;
use futures::future::try_join_all;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot<T> {
    Cached(T),
    Fresh(T),
}

impl<T> Snapshot<T> {
    pub fn is_cached(&self) -> bool {
        matches!(self, Snapshot::Cached(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Snapshot::Cached(value) | Snapshot::Fresh(value) => value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    pub async fn exists(&self, key: &str) -> bool {
        tokio::fs::try_exists(self.path(key))
            .await
            .unwrap_or_default()
    }

    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<T> {
        let path = self.path(key);
        let content = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_slice(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Pretty-printed JSON, replacing any previous file atomically.
    pub async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> anyhow::Result<()> {
        let content = serde_json::to_vec_pretty(value)
            .with_context(|| format!("Failed to serialize {key}"))?;
        write_atomic(&self.path(key), &content).await
    }

    pub async fn save_text(&self, key: &str, content: &str) -> anyhow::Result<()> {
        write_atomic(&self.path(key), content.as_bytes()).await
    }

    /// Returns the stored snapshot, or runs `fetch` and stores its result.
    ///
    /// `fetch` is not called when the snapshot exists. Nothing is written when it fails.
    pub async fn load_or_fetch<T, F, Fut>(&self, key: &str, fetch: F) -> anyhow::Result<Snapshot<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if self.exists(key).await {
            info!("{key} already exists. Skipping fetch");
            return Ok(Snapshot::Cached(self.load(key).await?));
        }

        let value = fetch().await?;
        self.save(key, &value).await?;
        debug!("Saved {key}");
        Ok(Snapshot::Fresh(value))
    }

    /// Batch form of [`Self::load_or_fetch`], one snapshot per item, returned in item order.
    ///
    /// Missing snapshots are fetched concurrently. A single failure fails the batch, and fresh
    /// snapshots are only written once every fetch has succeeded.
    pub async fn load_or_fetch_each<'a, I, T, K, F, Fut>(
        &self,
        items: &'a [I],
        key: K,
        fetch: F,
    ) -> anyhow::Result<Vec<Snapshot<T>>>
    where
        T: Serialize + DeserializeOwned,
        K: Fn(&I) -> String,
        F: Fn(&'a I) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let mut cached = Vec::with_capacity(items.len());
        for item in items {
            cached.push(self.exists(&key(item)).await);
        }

        let missing: Vec<&'a I> = items
            .iter()
            .zip(&cached)
            .filter(|(_, cached)| !**cached)
            .map(|(item, _)| item)
            .collect();
        let mut fetched = try_join_all(missing.into_iter().map(&fetch))
            .await?
            .into_iter();

        let mut snapshots = Vec::with_capacity(items.len());
        for (item, cached) in items.iter().zip(cached) {
            let key = key(item);
            if cached {
                info!("{key} already exists. Skipping fetch");
                snapshots.push(Snapshot::Cached(self.load(&key).await?));
                continue;
            }

            let value = fetched
                .next()
                .context("Fetched fewer values than requested")?;
            self.save(&key, &value).await?;
            debug!("Saved {key}");
            snapshots.push(Snapshot::Fresh(value));
        }

        Ok(snapshots)
    }
}

/// Writes `<file>.tmp` next to `path` and renames it over `path`.
pub async fn write_atomic(path: &Path, content: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut tmp_name = path
        .file_name()
        .with_context(|| format!("{} is not a file path", path.display()))?
        .to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp, content)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
    }
    Ok(())
}
