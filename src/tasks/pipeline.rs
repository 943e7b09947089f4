// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! Read → transform → write tasks (`assets`, `styles`, `scripts`)

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{Action, TaskContext, TaskReport};
use crate::errors::AssetflowError;
use crate::transforms::{read_sources, write_outputs, Pipeline};

/// Runs a [`Pipeline`] over the files matching a glob
pub struct PipelineAction {
    pattern: String,
    pipeline: Arc<Pipeline>,
    dest: PathBuf,
    /// Only pick up files modified since the previous run
    incremental: bool,
}

impl PipelineAction {
    pub fn new(pattern: impl Into<String>, pipeline: Pipeline, dest: &Path) -> Self {
        Self {
            pattern: pattern.into(),
            pipeline: Arc::new(pipeline),
            dest: dest.to_path_buf(),
            incremental: false,
        }
    }

    pub fn incremental(mut self) -> Self {
        self.incremental = true;
        self
    }
}

#[async_trait]
impl Action for PipelineAction {
    fn name(&self) -> String {
        let stages = self.pipeline.stage_names();
        if stages.is_empty() {
            format!("copy {}", self.pattern)
        } else {
            format!("{} → {}", self.pattern, stages.join(" → "))
        }
    }

    async fn run(&self, ctx: &TaskContext<'_>) -> Result<TaskReport, AssetflowError> {
        let since = if self.incremental { ctx.last_run } else { None };
        let root = ctx.config.root.clone();
        let pattern = self.pattern.clone();
        let pipeline = Arc::clone(&self.pipeline);

        // Compilers and minifiers are CPU-bound
        let files = tokio::task::spawn_blocking(move || {
            let files = read_sources(&root, &pattern, since)?;
            pipeline.run(files)
        })
        .await
        .map_err(|e| AssetflowError::Io {
            message: format!("pipeline worker failed: {e}"),
        })??;

        let outputs = write_outputs(&files, &self.dest).await?;
        Ok(TaskReport::with_outputs(outputs))
    }
}
