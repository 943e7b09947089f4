// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! `serve`: static server over the output directory with live reload

use async_trait::async_trait;
use colored::Colorize;
use std::time::Duration;

use super::{Action, TaskContext, TaskReport};
use crate::errors::AssetflowError;
use crate::server::{DevServer, LiveReload};
use crate::watcher::DirWatcher;

#[derive(Debug, Default)]
pub struct Serve;

#[async_trait]
impl Action for Serve {
    fn name(&self) -> String {
        "serve with live reload".to_string()
    }

    async fn run(&self, ctx: &TaskContext<'_>) -> Result<TaskReport, AssetflowError> {
        let config = ctx.config;
        let out_dir = config.output_path();

        tokio::fs::create_dir_all(&out_dir)
            .await
            .map_err(|e| AssetflowError::write_failed(&out_dir, e))?;

        let reload = LiveReload::new();
        let server = DevServer::bind(&config.server, out_dir.clone(), reload.clone()).await?;
        let addr = server.local_addr();

        let mut watcher = DirWatcher::new(&out_dir, Duration::from_millis(config.watch.debounce_ms))?;
        let notifier = reload.clone();
        tokio::spawn(async move {
            while let Some(changed) = watcher.next_batch().await {
                let clients = notifier.reload();
                tracing::info!(files = changed.len(), clients, "output changed, reloading");
            }
        });

        println!(
            "{} http://{} ({})",
            "Serving".bold(),
            addr,
            out_dir.display()
        );

        server.serve().await;
        Ok(TaskReport::default())
    }
}
