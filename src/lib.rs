// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! # assetflow - front-end asset build runner
//!
//! `assetflow` compiles Sass, bundles scripts, compresses images and copies
//! static pages into `public/`, then watches the sources and serves the
//! result with live reload.
//!
//! ## Features
//!
//! - **Task graph** - named tasks composed in series and in parallel,
//!   validated for unknown dependencies and cycles before anything runs
//! - **Mode-aware pipelines** - source maps in development, minified
//!   `.min` copies in production (`NODE_ENV`)
//! - **Image cache** - compressed images are keyed by content hash
//! - **Watch and serve** - failures are reported and the session keeps going
//!
//! ## Quick Start
//!
//! ```bash
//! # Build, then watch and serve on http://127.0.0.1:3000
//! assetflow
//!
//! # Production build
//! NODE_ENV=production assetflow build
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod graph;
pub mod notifier;
pub mod server;
pub mod tasks;
pub mod transforms;
pub mod utils;
pub mod watcher;

// Re-export commonly used types
pub use config::{BuildConfig, BuildMode};
pub use errors::{AssetflowError, AssetflowResult};
pub use graph::{TaskId, TaskRunner};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
