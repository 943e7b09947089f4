// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! `img`: compress images into the output tree

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{Action, TaskContext, TaskReport};
use crate::cache::{Cache, ContentHasher, FilesystemCache};
use crate::errors::AssetflowError;
use crate::transforms::{compress_image, compression_tag, read_sources, write_outputs};

pub struct Images {
    pattern: String,
    dest: PathBuf,
}

impl Images {
    pub fn new(pattern: impl Into<String>, dest: PathBuf) -> Self {
        Self {
            pattern: pattern.into(),
            dest,
        }
    }
}

async fn compress(path: &Path, data: Vec<u8>) -> Result<Vec<u8>, AssetflowError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || compress_image(&path, &data))
        .await
        .map_err(|e| AssetflowError::Io {
            message: format!("image worker failed: {e}"),
        })?
}

#[async_trait]
impl Action for Images {
    fn name(&self) -> String {
        format!("{} → imagemin", self.pattern)
    }

    async fn run(&self, ctx: &TaskContext<'_>) -> Result<TaskReport, AssetflowError> {
        let mut files = read_sources(&ctx.config.root, &self.pattern, None)?;

        let cache = if ctx.config.cache.enabled {
            Some(FilesystemCache::new(ctx.config.cache_path())?)
        } else {
            None
        };

        let mut hits = 0usize;
        for file in &mut files {
            let key = ContentHasher::key_for(compression_tag(&file.path), &file.contents);

            if let Some(ref cache) = cache {
                if let Some(data) = cache.get(&key).await? {
                    file.contents = data;
                    hits += 1;
                    continue;
                }
            }

            let original = std::mem::take(&mut file.contents);
            file.contents = compress(&file.path, original).await?;

            if let Some(ref cache) = cache {
                // A cache that cannot be written only costs a recompression
                if let Err(e) = cache.store(&key, &file.contents).await {
                    tracing::warn!("image cache store failed: {e}");
                }
            }
        }

        if let Some(ref cache) = cache {
            let stats = cache.stats().await?;
            tracing::debug!(
                hits,
                entries = stats.entries,
                size = %stats.formatted_size(),
                "image cache"
            );
        }

        let outputs = write_outputs(&files, &self.dest).await?;
        Ok(TaskReport::with_outputs(outputs))
    }
}
