// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! Task graph
//!
//! Tasks are identified by [`TaskId`] rather than free-form strings. A task
//! either runs an [`Action`], composes other tasks through a [`Step`], or
//! both (dependencies first, then the action).

mod dag;
mod runner;

pub use dag::DagBuilder;
pub use runner::{RunSummary, TaskRunner, TaskState};

use clap::ValueEnum;
use std::collections::BTreeMap;

use crate::errors::AssetflowError;
use crate::tasks::Action;

/// Every task the runner knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum)]
pub enum TaskId {
    Clean,
    Assets,
    Img,
    Styles,
    Scripts,
    Build,
    Watch,
    Serve,
    Default,
}

impl TaskId {
    /// All task ids in declaration order
    pub const ALL: [TaskId; 9] = [
        Self::Clean,
        Self::Assets,
        Self::Img,
        Self::Styles,
        Self::Scripts,
        Self::Build,
        Self::Watch,
        Self::Serve,
        Self::Default,
    ];

    /// Command-line name
    pub fn name(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Assets => "assets",
            Self::Img => "img",
            Self::Styles => "styles",
            Self::Scripts => "scripts",
            Self::Build => "build",
            Self::Watch => "watch",
            Self::Serve => "serve",
            Self::Default => "default",
        }
    }

    /// Title used for failure notifications
    pub fn title(self) -> &'static str {
        match self {
            Self::Clean => "Clean",
            Self::Assets => "Assets",
            Self::Img => "Images",
            Self::Styles => "Styles",
            Self::Scripts => "Scripts",
            Self::Build => "Build",
            Self::Watch => "Watch",
            Self::Serve => "Serve",
            Self::Default => "Default",
        }
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Composition of task invocations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Run a single task (and its own dependencies)
    Task(TaskId),
    /// Run each step to completion before starting the next
    Series(Vec<Step>),
    /// Start all steps together and wait for every one of them
    Parallel(Vec<Step>),
}

impl Step {
    pub fn series(steps: impl IntoIterator<Item = Step>) -> Self {
        Self::Series(steps.into_iter().collect())
    }

    pub fn parallel(steps: impl IntoIterator<Item = Step>) -> Self {
        Self::Parallel(steps.into_iter().collect())
    }

    /// Tasks referenced anywhere in this step, in order of appearance
    pub fn referenced(&self) -> Vec<TaskId> {
        let mut out = Vec::new();
        self.collect_referenced(&mut out);
        out
    }

    fn collect_referenced(&self, out: &mut Vec<TaskId>) {
        match self {
            Self::Task(id) => out.push(*id),
            Self::Series(steps) | Self::Parallel(steps) => {
                for step in steps {
                    step.collect_referenced(out);
                }
            }
        }
    }

    /// Compact rendering: `clean → [styles | scripts]`
    pub fn describe(&self) -> String {
        match self {
            Self::Task(id) => id.name().to_string(),
            Self::Series(steps) => steps
                .iter()
                .map(Step::describe)
                .collect::<Vec<_>>()
                .join(" → "),
            Self::Parallel(steps) => format!(
                "[{}]",
                steps
                    .iter()
                    .map(Step::describe)
                    .collect::<Vec<_>>()
                    .join(" | ")
            ),
        }
    }
}

impl From<TaskId> for Step {
    fn from(id: TaskId) -> Self {
        Self::Task(id)
    }
}

/// A registered task
pub struct Task {
    pub id: TaskId,
    /// Run before the action
    pub dependencies: Option<Step>,
    pub action: Option<Box<dyn Action>>,
}

impl Task {
    /// Task that only runs an action
    pub fn action(id: TaskId, action: impl Action + 'static) -> Self {
        Self {
            id,
            dependencies: None,
            action: Some(Box::new(action)),
        }
    }

    /// Task that only composes other tasks
    pub fn composite(id: TaskId, step: Step) -> Self {
        Self {
            id,
            dependencies: Some(step),
            action: None,
        }
    }

    /// Direct dependencies
    pub fn dependency_ids(&self) -> Vec<TaskId> {
        self.dependencies
            .as_ref()
            .map(Step::referenced)
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("dependencies", &self.dependencies)
            .field("action", &self.action.as_ref().map(|a| a.name()))
            .finish()
    }
}

/// Registry of tasks
#[derive(Debug, Default)]
pub struct TaskGraph {
    tasks: BTreeMap<TaskId, Task>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task; ids must be unique
    pub fn register(&mut self, task: Task) -> Result<(), AssetflowError> {
        if self.tasks.contains_key(&task.id) {
            return Err(AssetflowError::DuplicateTask {
                task: task.id.to_string(),
            });
        }
        self.tasks.insert(task.id, task);
        Ok(())
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Check for dangling references and cycles
    pub fn validate(&self) -> Result<(), AssetflowError> {
        DagBuilder::build(self).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::testing::NoopAction;

    #[test]
    fn test_duplicate_registration() {
        let mut graph = TaskGraph::new();
        graph.register(Task::action(TaskId::Clean, NoopAction)).unwrap();

        let result = graph.register(Task::action(TaskId::Clean, NoopAction));
        assert!(matches!(result, Err(AssetflowError::DuplicateTask { task }) if task == "clean"));
    }

    #[test]
    fn test_describe() {
        let step = Step::series([
            Step::Task(TaskId::Clean),
            Step::parallel([TaskId::Styles.into(), TaskId::Scripts.into()]),
        ]);
        assert_eq!(step.describe(), "clean → [styles | scripts]");
        assert_eq!(
            step.referenced(),
            vec![TaskId::Clean, TaskId::Styles, TaskId::Scripts]
        );
    }

    #[test]
    fn test_task_names_round_trip_through_clap() {
        for id in TaskId::ALL {
            let parsed = TaskId::from_str(id.name(), false).unwrap();
            assert_eq!(parsed, id);
        }
    }
}
