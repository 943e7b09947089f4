// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! `watch`: re-run tasks when sources change

use async_trait::async_trait;
use colored::Colorize;
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{Action, TaskContext, TaskReport};
use crate::config::BuildConfig;
use crate::errors::AssetflowError;
use crate::graph::{TaskId, TaskRunner};
use crate::watcher::DirWatcher;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Re-run `task` when a path matching `pattern` changes
#[derive(Debug, Clone)]
pub struct WatchRule {
    pub pattern: Pattern,
    pub task: TaskId,
}

impl WatchRule {
    pub fn new(pattern: &str, task: TaskId) -> Result<Self, AssetflowError> {
        Ok(Self {
            pattern: Pattern::new(pattern)?,
            task,
        })
    }

    pub fn matches(&self, relative: &Path) -> bool {
        self.pattern.matches_path_with(relative, MATCH_OPTIONS)
    }
}

pub struct Watch {
    rules: Vec<WatchRule>,
}

impl Watch {
    pub fn new(config: &BuildConfig) -> Result<Self, AssetflowError> {
        Ok(Self {
            rules: vec![
                WatchRule::new(&config.source_glob("styles/*.*"), TaskId::Styles)?,
                WatchRule::new(&config.source_glob("js/*.js"), TaskId::Scripts)?,
                WatchRule::new(&config.source_glob("assets/**/*.*"), TaskId::Assets)?,
            ],
        })
    }

    /// Tasks to re-run for a batch of changed paths, once each, in rule order
    pub fn tasks_for(&self, root: &Path, changed: &[PathBuf]) -> Vec<TaskId> {
        let relative: Vec<&Path> = changed
            .iter()
            .map(|p| p.strip_prefix(root).unwrap_or(p))
            .collect();

        self.rules
            .iter()
            .filter(|rule| relative.iter().any(|p| rule.matches(p)))
            .map(|rule| rule.task)
            .fold(Vec::new(), |mut tasks, task| {
                if !tasks.contains(&task) {
                    tasks.push(task);
                }
                tasks
            })
    }

    /// Re-run the tasks a batch of changes maps to.
    ///
    /// Failures have already been reported by the runner's notifier; they
    /// never end the watch. Returns each task with whether it succeeded.
    pub async fn handle_changes(
        &self,
        runner: &TaskRunner,
        root: &Path,
        changed: &[PathBuf],
    ) -> Vec<(TaskId, bool)> {
        let tasks = self.tasks_for(root, changed);
        let mut outcomes = Vec::with_capacity(tasks.len());

        for task in tasks {
            let ok = match runner.run(task).await {
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!(task = %task, "re-run failed: {e}");
                    false
                }
            };
            outcomes.push((task, ok));
        }

        outcomes
    }
}

#[async_trait]
impl Action for Watch {
    fn name(&self) -> String {
        let rules: Vec<String> = self
            .rules
            .iter()
            .map(|r| format!("{} ⇒ {}", r.pattern, r.task))
            .collect();
        format!("watch {}", rules.join(", "))
    }

    async fn run(&self, ctx: &TaskContext<'_>) -> Result<TaskReport, AssetflowError> {
        let config = ctx.config;
        let source = config.source_path();
        // notify reports canonical paths on some platforms
        let root = config.root.canonicalize().unwrap_or_else(|_| config.root.clone());

        let mut watcher = DirWatcher::new(&source, Duration::from_millis(config.watch.debounce_ms))?;

        println!(
            "{} {} (debounce: {}ms)",
            "Watching".bold(),
            source.display(),
            config.watch.debounce_ms
        );

        while let Some(changed) = watcher.next_batch().await {
            let changed: Vec<PathBuf> = changed
                .into_iter()
                .map(|p| match p.strip_prefix(&root) {
                    Ok(rel) => rel.to_path_buf(),
                    Err(_) => p.strip_prefix(&config.root).map(Path::to_path_buf).unwrap_or(p),
                })
                .collect();

            tracing::info!(files = changed.len(), "change detected");
            for path in &changed {
                tracing::debug!(path = %path.display(), "changed");
            }

            self.handle_changes(ctx.runner, Path::new(""), &changed).await;
        }

        Err(AssetflowError::Watch {
            message: "file watcher stopped unexpectedly".into(),
        })
    }
}
