// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! Debounced recursive directory watching
//!
//! Shared by the `watch` task (source tree) and the dev server (output
//! tree). Events are forwarded onto a tokio channel so consumers can await
//! them without blocking the runtime.

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEventKind, Debouncer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use crate::errors::AssetflowError;

/// A live watcher; dropping it stops the watch
pub struct DirWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
    rx: UnboundedReceiver<DebounceEventResult>,
}

impl DirWatcher {
    /// Watch `dir` recursively, batching events within `debounce`
    pub fn new(dir: &Path, debounce: Duration) -> Result<Self, AssetflowError> {
        let (tx, rx) = unbounded_channel();

        let mut debouncer = new_debouncer(debounce, move |result: DebounceEventResult| {
            // Receiver gone means the watch is shutting down
            let _ = tx.send(result);
        })
        .map_err(|e| AssetflowError::Watch {
            message: format!("Failed to create file watcher: {}", e),
        })?;

        debouncer
            .watcher()
            .watch(dir, RecursiveMode::Recursive)
            .map_err(|e| AssetflowError::Watch {
                message: format!("Failed to start watching '{}': {}", dir.display(), e),
            })?;

        Ok(Self {
            _debouncer: debouncer,
            rx,
        })
    }

    /// Next batch of changed paths; `None` once the watcher has stopped.
    ///
    /// Watcher errors are logged and skipped.
    pub async fn next_batch(&mut self) -> Option<Vec<PathBuf>> {
        loop {
            match self.rx.recv().await? {
                Ok(events) => {
                    let paths: Vec<PathBuf> = events
                        .into_iter()
                        .filter(|e| matches!(e.kind, DebouncedEventKind::Any))
                        .map(|e| e.path)
                        .collect();
                    if !paths.is_empty() {
                        return Some(paths);
                    }
                }
                Err(e) => tracing::warn!("watch error: {e}"),
            }
        }
    }
}
