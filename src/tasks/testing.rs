// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! Test doubles for actions

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{Action, TaskContext, TaskReport};
use crate::errors::AssetflowError;
use crate::graph::TaskId;

/// Succeeds without doing anything
pub struct NoopAction;

#[async_trait]
impl Action for NoopAction {
    fn name(&self) -> String {
        "noop".into()
    }

    async fn run(&self, _ctx: &TaskContext<'_>) -> Result<TaskReport, AssetflowError> {
        Ok(TaskReport::default())
    }
}

/// Always fails with a transform error
pub struct FailingAction;

#[async_trait]
impl Action for FailingAction {
    fn name(&self) -> String {
        "fail".into()
    }

    async fn run(&self, _ctx: &TaskContext<'_>) -> Result<TaskReport, AssetflowError> {
        Err(AssetflowError::transform_failed(
            "sass",
            "style.scss",
            "expected \"}\"".into(),
        ))
    }
}

/// Appends its id to a shared log after yielding once
pub struct RecordingAction {
    id: TaskId,
    log: Arc<Mutex<Vec<TaskId>>>,
}

impl RecordingAction {
    pub fn new(id: TaskId, log: Arc<Mutex<Vec<TaskId>>>) -> Self {
        Self { id, log }
    }
}

#[async_trait]
impl Action for RecordingAction {
    fn name(&self) -> String {
        format!("record {}", self.id)
    }

    async fn run(&self, _ctx: &TaskContext<'_>) -> Result<TaskReport, AssetflowError> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        if let Ok(mut log) = self.log.lock() {
            log.push(self.id);
        }
        Ok(TaskReport::default())
    }
}
