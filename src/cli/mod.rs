// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! Command-line interface
//!
//! `assetflow [TASK]`: run one task (and everything it depends on).

pub mod run;

use clap::Parser;
use std::path::PathBuf;

use crate::graph::TaskId;

/// Front-end asset build runner
#[derive(Parser, Debug)]
#[clap(
    name = "assetflow",
    version,
    about = "Build, watch and serve front-end assets",
    long_about = None,
    after_help = "Examples:\n\
        assetflow                       Build, then watch and serve\n\
        assetflow build                 Clean and rebuild public/\n\
        NODE_ENV=production assetflow build\n\
                                        Minified build without source maps\n\n\
        Settings are read from .assetflow.yaml when present."
)]
pub struct Cli {
    /// Task to run
    #[clap(value_enum, default_value = "default")]
    pub task: TaskId,

    /// Print the execution plan and written files
    #[clap(short, long)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}
