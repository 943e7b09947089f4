// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! Run command - execute one task

use colored::Colorize;
use miette::Result;
use std::sync::Arc;

use crate::config::{BuildConfig, BuildMode};
use crate::graph::{TaskId, TaskRunner};
use crate::notifier::TerminalNotifier;
use crate::tasks::register_tasks;
use crate::utils::{dimmed, print_success};

/// Load configuration from the working directory and run `task`
pub async fn run(task: TaskId, verbose: bool) -> Result<()> {
    let working_dir = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;

    let mode = BuildMode::from_env();
    let config = BuildConfig::load(&working_dir, mode)?;
    tracing::debug!(?config, "configuration loaded");

    let graph = register_tasks(&config)?;
    let runner = TaskRunner::new(graph, Arc::new(config), Arc::new(TerminalNotifier))?;

    println!(
        "{} {} {}",
        "Running".bold(),
        task.name().cyan(),
        dimmed(&format!("({mode})"))
    );
    if verbose {
        println!("  {}", dimmed(&runner.plan(task)?));
    }
    println!();

    let summary = runner.run(task).await?;

    println!();
    print_success(&format!(
        "{} finished in {:.2}s",
        task.name(),
        summary.duration.as_secs_f64()
    ));

    if verbose {
        for output in summary.outputs() {
            println!("    {}", dimmed(&output.display().to_string()));
        }
    }

    Ok(())
}
