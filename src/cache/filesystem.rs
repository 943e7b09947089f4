// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! Filesystem-based cache implementation
//!
//! Stores each entry as a raw blob under `<cache_dir>/<2-char prefix>/`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{Cache, CacheStats};
use crate::errors::AssetflowError;

/// Filesystem-based cache
pub struct FilesystemCache {
    cache_dir: PathBuf,
}

impl FilesystemCache {
    /// Create a new filesystem cache
    pub fn new(cache_dir: PathBuf) -> Result<Self, AssetflowError> {
        if !cache_dir.exists() {
            std::fs::create_dir_all(&cache_dir).map_err(|e| AssetflowError::Cache {
                message: format!("Failed to create cache directory: {}", e),
            })?;
        }

        Ok(Self { cache_dir })
    }

    /// Get path for a cache entry
    fn cache_path(&self, key: &str) -> PathBuf {
        // Use first 2 chars as directory for better filesystem performance
        let (prefix, rest) = key.split_at(2.min(key.len()));
        self.cache_dir.join(prefix).join(format!("{}.bin", rest))
    }

    /// Count and size entries recursively
    fn walk(path: &Path, stats: &mut CacheStats) -> Result<(), AssetflowError> {
        let entries = std::fs::read_dir(path).map_err(|e| AssetflowError::Cache {
            message: format!("Failed to read directory: {}", e),
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| AssetflowError::Cache {
                message: format!("Failed to read entry: {}", e),
            })?;

            let path = entry.path();
            if path.is_dir() {
                Self::walk(&path, stats)?;
            } else if path.extension().and_then(|e| e.to_str()) == Some("bin") {
                stats.entries += 1;
                stats.size_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Cache for FilesystemCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AssetflowError> {
        let path = self.cache_path(key);

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AssetflowError::Cache {
                message: format!("Failed to read cache entry: {}", e),
            }),
        }
    }

    async fn store(&self, key: &str, data: &[u8]) -> Result<(), AssetflowError> {
        let path = self.cache_path(key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| AssetflowError::Cache {
                message: format!("Failed to create cache directory: {}", e),
            })?;
        }

        // Write then rename so a concurrent reader never sees a partial blob
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, data).await.map_err(|e| AssetflowError::Cache {
            message: format!("Failed to write cache entry: {}", e),
        })?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| AssetflowError::Cache {
            message: format!("Failed to write cache entry: {}", e),
        })?;

        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats, AssetflowError> {
        let mut stats = CacheStats::default();
        if self.cache_dir.exists() {
            Self::walk(&self.cache_dir, &mut stats)?;
        }
        Ok(stats)
    }
}
