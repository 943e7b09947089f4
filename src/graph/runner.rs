// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! Task runner
//!
//! Executes a task's dependency composition depth-first, then its action.
//! Parallel groups are polled concurrently on the current runtime and always
//! awaited in full before the first failure is reported.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use colored::Colorize;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use tokio::sync::{Mutex, RwLock};

use super::{Step, TaskGraph, TaskId};
use crate::config::BuildConfig;
use crate::errors::AssetflowError;
use crate::notifier::Notifier;
use crate::tasks::{TaskContext, TaskReport};
use crate::utils::{print_error, print_info, print_success};

/// Lifecycle of a task invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// Outcome of a successful [`TaskRunner::run`]
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Reports of every action that ran, in completion order
    pub reports: Vec<(TaskId, TaskReport)>,
    pub duration: Duration,
}

impl RunSummary {
    /// All files written during the run
    pub fn outputs(&self) -> Vec<&PathBuf> {
        self.reports
            .iter()
            .flat_map(|(_, report)| report.outputs.iter())
            .collect()
    }
}

/// Reports collected during one [`TaskRunner::run`]
type Reports = Mutex<Vec<(TaskId, TaskReport)>>;

/// Runs tasks from a validated [`TaskGraph`]
pub struct TaskRunner {
    graph: TaskGraph,
    config: Arc<BuildConfig>,
    notifier: Arc<dyn Notifier>,
    states: RwLock<HashMap<TaskId, TaskState>>,
    last_runs: RwLock<HashMap<TaskId, SystemTime>>,
}

impl TaskRunner {
    /// Create a runner; fails if the graph has dangling references or cycles
    pub fn new(
        graph: TaskGraph,
        config: Arc<BuildConfig>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, AssetflowError> {
        graph.validate()?;

        let states = graph.tasks().map(|t| (t.id, TaskState::Pending)).collect();

        Ok(Self {
            graph,
            config,
            notifier,
            states: RwLock::new(states),
            last_runs: RwLock::new(HashMap::new()),
        })
    }

    /// Current state of a task
    pub async fn state(&self, id: TaskId) -> Option<TaskState> {
        self.states.read().await.get(&id).copied()
    }

    /// Start time of the task's previous invocation
    pub async fn last_run(&self, id: TaskId) -> Option<SystemTime> {
        self.last_runs.read().await.get(&id).copied()
    }

    /// Render the execution plan for a task
    pub fn plan(&self, id: TaskId) -> Result<String, AssetflowError> {
        let task = self.graph.get(id).ok_or_else(|| AssetflowError::UnknownDependency {
            task: "<cli>".to_string(),
            dependency: id.to_string(),
        })?;

        let mut out = String::new();
        match (&task.dependencies, &task.action) {
            (Some(step), Some(action)) => {
                out.push_str(&format!("{} → {} ({})", step.describe(), id, action.name()));
            }
            (Some(step), None) => out.push_str(&step.describe()),
            (None, Some(action)) => out.push_str(&format!("{} ({})", id, action.name())),
            (None, None) => out.push_str(id.name()),
        }
        Ok(out)
    }

    /// Run a task and everything it depends on
    pub async fn run(&self, id: TaskId) -> Result<RunSummary, AssetflowError> {
        let start = Instant::now();

        if !self.graph.contains(id) {
            return Err(AssetflowError::UnknownDependency {
                task: "<cli>".to_string(),
                dependency: id.to_string(),
            });
        }

        let reports = Reports::default();
        self.run_task(id, &reports).await?;

        Ok(RunSummary {
            reports: reports.into_inner(),
            duration: start.elapsed(),
        })
    }

    fn run_task<'a>(
        &'a self,
        id: TaskId,
        reports: &'a Reports,
    ) -> BoxFuture<'a, Result<(), AssetflowError>> {
        async move {
            let Some(task) = self.graph.get(id) else {
                return Err(AssetflowError::UnknownDependency {
                    task: "<runner>".to_string(),
                    dependency: id.to_string(),
                });
            };

            self.set_state(id, TaskState::Running).await;

            if let Some(ref deps) = task.dependencies {
                if let Err(e) = self.run_step(deps, reports).await {
                    self.set_state(id, TaskState::Failed).await;
                    return Err(e);
                }
            }

            let Some(ref action) = task.action else {
                self.set_state(id, TaskState::Succeeded).await;
                return Ok(());
            };

            let last_run = self.last_runs.write().await.insert(id, SystemTime::now());
            let ctx = TaskContext {
                task: id,
                config: &self.config,
                runner: self,
                last_run,
            };

            print_info(&format!("{}...", id.name()));
            let started = Instant::now();

            match action.run(&ctx).await {
                Ok(mut report) => {
                    report.duration = started.elapsed();
                    print_success(&format!(
                        "{} ({:.2}s)",
                        id.name().bold(),
                        report.duration.as_secs_f64()
                    ));
                    tracing::debug!(task = %id, outputs = report.outputs.len(), "task finished");
                    reports.lock().await.push((id, report));
                    self.set_state(id, TaskState::Succeeded).await;
                    Ok(())
                }
                Err(e) => {
                    print_error(&format!("{} failed", id.name().bold()));
                    self.notifier.notify(id.title(), &e.to_string());
                    self.set_state(id, TaskState::Failed).await;
                    Err(e.in_task(id.name()))
                }
            }
        }
        .boxed()
    }

    fn run_step<'a>(
        &'a self,
        step: &'a Step,
        reports: &'a Reports,
    ) -> BoxFuture<'a, Result<(), AssetflowError>> {
        async move {
            match step {
                Step::Task(id) => self.run_task(*id, reports).await,
                Step::Series(steps) => {
                    for step in steps {
                        self.run_step(step, reports).await?;
                    }
                    Ok(())
                }
                Step::Parallel(steps) => {
                    let results = join_all(steps.iter().map(|s| self.run_step(s, reports))).await;
                    results.into_iter().collect::<Result<Vec<_>, _>>().map(|_| ())
                }
            }
        }
        .boxed()
    }

    async fn set_state(&self, id: TaskId, state: TaskState) {
        tracing::trace!(task = %id, ?state, "state change");
        self.states.write().await.insert(id, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Task;
    use crate::notifier::RecordingNotifier;
    use crate::tasks::testing::{FailingAction, RecordingAction};
    use std::sync::Mutex as StdMutex;

    fn runner_with(graph: TaskGraph) -> (TaskRunner, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let config = Arc::new(BuildConfig::new(".", Default::default()));
        let runner = TaskRunner::new(graph, config, notifier.clone()).unwrap();
        (runner, notifier)
    }

    #[tokio::test]
    async fn test_series_then_parallel_order() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut graph = TaskGraph::new();
        for id in [TaskId::Clean, TaskId::Styles, TaskId::Scripts, TaskId::Img] {
            graph
                .register(Task::action(id, RecordingAction::new(id, log.clone())))
                .unwrap();
        }
        graph
            .register(Task::composite(
                TaskId::Build,
                Step::series([
                    TaskId::Clean.into(),
                    Step::parallel([
                        TaskId::Styles.into(),
                        TaskId::Scripts.into(),
                        TaskId::Img.into(),
                    ]),
                ]),
            ))
            .unwrap();

        let (runner, _) = runner_with(graph);
        let summary = runner.run(TaskId::Build).await.unwrap();

        let log = log.lock().unwrap().clone();
        assert_eq!(log.len(), 4);
        assert_eq!(log[0], TaskId::Clean);
        assert_eq!(summary.reports.len(), 4);
        assert_eq!(runner.state(TaskId::Build).await, Some(TaskState::Succeeded));
    }

    #[tokio::test]
    async fn test_parallel_waits_for_all_members() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut graph = TaskGraph::new();
        graph
            .register(Task::action(TaskId::Styles, FailingAction))
            .unwrap();
        graph
            .register(Task::action(
                TaskId::Scripts,
                RecordingAction::new(TaskId::Scripts, log.clone()),
            ))
            .unwrap();
        graph
            .register(Task::composite(
                TaskId::Build,
                Step::parallel([TaskId::Styles.into(), TaskId::Scripts.into()]),
            ))
            .unwrap();

        let (runner, notifier) = runner_with(graph);
        let err = runner.run(TaskId::Build).await.unwrap_err();

        assert!(matches!(&err, AssetflowError::TaskExecution { task, .. } if task == "styles"));
        assert_eq!(log.lock().unwrap().as_slice(), &[TaskId::Scripts]);
        assert_eq!(runner.state(TaskId::Styles).await, Some(TaskState::Failed));
        assert_eq!(runner.state(TaskId::Scripts).await, Some(TaskState::Succeeded));
        assert_eq!(runner.state(TaskId::Build).await, Some(TaskState::Failed));
        assert_eq!(notifier.titles(), vec!["Styles".to_string()]);
    }

    #[tokio::test]
    async fn test_series_stops_on_failure() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut graph = TaskGraph::new();
        graph.register(Task::action(TaskId::Clean, FailingAction)).unwrap();
        graph
            .register(Task::action(
                TaskId::Styles,
                RecordingAction::new(TaskId::Styles, log.clone()),
            ))
            .unwrap();
        graph
            .register(Task::composite(
                TaskId::Build,
                Step::series([TaskId::Clean.into(), TaskId::Styles.into()]),
            ))
            .unwrap();

        let (runner, _) = runner_with(graph);
        assert!(runner.run(TaskId::Build).await.is_err());
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(runner.state(TaskId::Styles).await, Some(TaskState::Pending));
    }

    #[tokio::test]
    async fn test_last_run_recorded() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut graph = TaskGraph::new();
        graph
            .register(Task::action(
                TaskId::Assets,
                RecordingAction::new(TaskId::Assets, log.clone()),
            ))
            .unwrap();

        let (runner, _) = runner_with(graph);
        assert!(runner.last_run(TaskId::Assets).await.is_none());
        runner.run(TaskId::Assets).await.unwrap();
        assert!(runner.last_run(TaskId::Assets).await.is_some());
    }

    #[tokio::test]
    async fn test_each_run_reports_only_its_own_actions() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut graph = TaskGraph::new();
        for id in [TaskId::Clean, TaskId::Styles] {
            graph
                .register(Task::action(id, RecordingAction::new(id, log.clone())))
                .unwrap();
        }
        graph
            .register(Task::composite(
                TaskId::Build,
                Step::series([TaskId::Clean.into(), TaskId::Styles.into()]),
            ))
            .unwrap();

        let (runner, _) = runner_with(graph);
        for _ in 0..3 {
            let summary = runner.run(TaskId::Styles).await.unwrap();
            assert_eq!(summary.reports.len(), 1);
            assert_eq!(summary.reports[0].0, TaskId::Styles);
        }

        let summary = runner.run(TaskId::Build).await.unwrap();
        let ids: Vec<_> = summary.reports.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![TaskId::Clean, TaskId::Styles]);
    }

    #[test]
    fn test_runner_rejects_dangling_reference() {
        let mut graph = TaskGraph::new();
        graph
            .register(Task::composite(TaskId::Default, Step::Task(TaskId::Build)))
            .unwrap();

        let config = Arc::new(BuildConfig::new(".", Default::default()));
        let result = TaskRunner::new(graph, config, Arc::new(RecordingNotifier::default()));
        assert!(matches!(result, Err(AssetflowError::UnknownDependency { .. })));
    }
}
