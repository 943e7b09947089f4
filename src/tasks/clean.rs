// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! `clean`: delete the output directory

use async_trait::async_trait;

use super::{Action, TaskContext, TaskReport};
use crate::errors::AssetflowError;

pub struct Clean;

#[async_trait]
impl Action for Clean {
    fn name(&self) -> String {
        "delete output".into()
    }

    async fn run(&self, ctx: &TaskContext<'_>) -> Result<TaskReport, AssetflowError> {
        let output = ctx.config.output_path();

        match tokio::fs::remove_dir_all(&output).await {
            Ok(()) => tracing::debug!(path = %output.display(), "removed output directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(AssetflowError::write_failed(&output, e)),
        }

        Ok(TaskReport::default())
    }
}
