// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! Build tasks
//!
//! This module provides the [`Action`] trait and the fixed set of tasks:
//! `clean`, `assets`, `img`, `styles`, `scripts`, `build`, `watch`, `serve`
//! and `default`. Pipelines that depend on the build mode are assembled
//! here, once, from the [`BuildConfig`].

mod clean;
mod images;
mod pipeline;
mod serve;
mod watch;

#[cfg(test)]
pub(crate) mod testing;

pub use clean::Clean;
pub use images::Images;
pub use pipeline::PipelineAction;
pub use serve::Serve;
pub use watch::{Watch, WatchRule};

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use crate::config::BuildConfig;
use crate::errors::AssetflowError;
use crate::graph::{Step, Task, TaskGraph, TaskId, TaskRunner};
use crate::transforms::{
    Autoprefix, Concat, MinifyCss, MinifyJs, Pipeline, Rename, Sass, SourceMapInit,
    SourceMapWrite, Tee, Transpile,
};

/// What a finished action produced
#[derive(Debug, Clone, Default)]
pub struct TaskReport {
    /// Files written
    pub outputs: Vec<PathBuf>,
    /// Filled in by the runner
    pub duration: Duration,
}

impl TaskReport {
    pub fn with_outputs(outputs: Vec<PathBuf>) -> Self {
        Self {
            outputs,
            duration: Duration::ZERO,
        }
    }
}

/// Everything an action can see while running
pub struct TaskContext<'a> {
    pub task: TaskId,
    pub config: &'a BuildConfig,
    /// For actions that re-invoke other tasks
    pub runner: &'a TaskRunner,
    /// Start of this task's previous invocation, if any
    pub last_run: Option<SystemTime>,
}

/// The unit of work behind a task
#[async_trait]
pub trait Action: Send + Sync {
    /// Short description used in plans, e.g. `sass → autoprefix`
    fn name(&self) -> String;

    async fn run(&self, ctx: &TaskContext<'_>) -> Result<TaskReport, AssetflowError>;
}

/// Style pipeline for the configured mode
pub fn styles_pipeline(config: &BuildConfig) -> Result<Pipeline, AssetflowError> {
    let dev = config.mode.is_dev();
    let browsers = &config.styles.browsers;

    let minified = Pipeline::new()
        .pipe(MinifyCss::new(browsers)?)
        .pipe(Rename::suffix(".min"));

    Ok(Pipeline::new()
        .pipe_if(dev, SourceMapInit)
        .pipe(Sass::new().load_path(config.source_path().join("styles")))
        .pipe(Autoprefix::new(browsers)?)
        .pipe_if(!dev, Tee(minified))
        .pipe_if(dev, SourceMapWrite))
}

/// Script pipeline for the configured mode
pub fn scripts_pipeline(config: &BuildConfig) -> Pipeline {
    let dev = config.mode.is_dev();

    let minified = Pipeline::new()
        .pipe(MinifyJs)
        .pipe(Rename::suffix(".min"));

    Pipeline::new()
        .pipe_if(dev, SourceMapInit)
        .pipe(Transpile)
        .pipe(Concat::new("script.js"))
        .pipe_if(!dev, Tee(minified))
        .pipe_if(dev, SourceMapWrite)
}

/// Register every task for the given configuration
pub fn register_tasks(config: &BuildConfig) -> Result<TaskGraph, AssetflowError> {
    let output = config.output_path();
    let mut graph = TaskGraph::new();

    graph.register(Task::action(TaskId::Clean, Clean))?;

    graph.register(Task::action(
        TaskId::Assets,
        PipelineAction::new(config.source_glob("assets/*.html"), Pipeline::new(), &output)
            .incremental(),
    ))?;

    graph.register(Task::action(
        TaskId::Img,
        Images::new(config.source_glob("assets/img/**/*.*"), output.join("img")),
    ))?;

    graph.register(Task::action(
        TaskId::Styles,
        PipelineAction::new(
            config.source_glob("styles/style.scss"),
            styles_pipeline(config)?,
            &output,
        ),
    ))?;

    graph.register(Task::action(
        TaskId::Scripts,
        PipelineAction::new(config.source_glob("js/*.js"), scripts_pipeline(config), &output),
    ))?;

    graph.register(Task::composite(
        TaskId::Build,
        Step::series([
            TaskId::Clean.into(),
            Step::parallel([
                TaskId::Styles.into(),
                TaskId::Scripts.into(),
                TaskId::Img.into(),
                TaskId::Assets.into(),
            ]),
        ]),
    ))?;

    graph.register(Task::action(TaskId::Watch, Watch::new(config)?))?;
    graph.register(Task::action(TaskId::Serve, Serve))?;

    graph.register(Task::composite(
        TaskId::Default,
        Step::series([
            TaskId::Build.into(),
            Step::parallel([TaskId::Watch.into(), TaskId::Serve.into()]),
        ]),
    ))?;

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildMode;

    #[test]
    fn test_all_tasks_resolve() {
        for mode in [BuildMode::Development, BuildMode::Production] {
            let config = BuildConfig::new("/project", mode);
            let graph = register_tasks(&config).unwrap();
            graph.validate().unwrap();

            for id in TaskId::ALL {
                assert!(graph.contains(id), "{id} not registered");
            }
            let deps = |id| graph.get(id).unwrap().dependency_ids();
            assert!(deps(TaskId::Build).contains(&TaskId::Clean));
            assert!(deps(TaskId::Default).contains(&TaskId::Build));
            assert!(deps(TaskId::Styles).is_empty());
        }
    }

    #[test]
    fn test_styles_pipeline_per_mode() {
        let dev = styles_pipeline(&BuildConfig::new(".", BuildMode::Development)).unwrap();
        assert_eq!(
            dev.stage_names(),
            vec!["sourcemaps-init", "sass", "autoprefix", "sourcemaps-write"]
        );

        let prod = styles_pipeline(&BuildConfig::new(".", BuildMode::Production)).unwrap();
        assert_eq!(prod.stage_names(), vec!["sass", "autoprefix", "tee"]);
    }

    #[test]
    fn test_scripts_pipeline_per_mode() {
        let dev = scripts_pipeline(&BuildConfig::new(".", BuildMode::Development));
        assert_eq!(
            dev.stage_names(),
            vec!["sourcemaps-init", "scripts", "concat", "sourcemaps-write"]
        );

        let prod = scripts_pipeline(&BuildConfig::new(".", BuildMode::Production));
        assert_eq!(prod.stage_names(), vec!["scripts", "concat", "tee"]);
    }
}
