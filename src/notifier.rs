// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! Failure notifications
//!
//! Task failures are reported to a [`Notifier`] with a task-scoped title so
//! long-running watch sessions surface a bad edit without exiting.

use colored::Colorize;
use std::sync::Mutex;

/// Sink for user-visible failure messages
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Prints a titled banner to stderr and logs the failure
#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, title: &str, message: &str) {
        tracing::error!(title, "{message}");
        eprintln!();
        eprintln!("{} {}", "✗".red(), title.red().bold());
        for line in message.lines() {
            eprintln!("  {}", line.dimmed());
        }
        eprintln!();
    }
}

/// Keeps every notification in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn titles(&self) -> Vec<String> {
        self.messages().into_iter().map(|(title, _)| title).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push((title.to_string(), message.to_string()));
        }
    }
}
