// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! Error types
//!
//! Every failure carries a diagnostic code and, where we can guess one,
//! a hint pointing at the file or setting to fix.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for assetflow operations
pub type AssetflowResult<T> = Result<T, AssetflowError>;

/// Main error type for assetflow
#[derive(Error, Debug, Diagnostic)]
pub enum AssetflowError {
    // ─────────────────────────────────────────────────────────────────────────
    // Task Graph Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Task '{task}' is already registered")]
    #[diagnostic(
        code(assetflow::duplicate_task),
        help("Each task may only be registered once")
    )]
    DuplicateTask { task: String },

    #[error("Task '{task}' depends on unknown task '{dependency}'")]
    #[diagnostic(
        code(assetflow::unknown_dependency),
        help("Register '{dependency}' before running '{task}'")
    )]
    UnknownDependency { task: String, dependency: String },

    #[error("Circular dependency detected: {}", tasks.join(" → "))]
    #[diagnostic(
        code(assetflow::circular_dependency),
        help("Review the task compositions to remove the cycle")
    )]
    CircularDependency { tasks: Vec<String> },

    #[error("Task '{task}' failed: {cause}")]
    #[diagnostic(code(assetflow::task_failed))]
    TaskExecution {
        task: String,
        #[source]
        cause: Box<AssetflowError>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Transform Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("{step} failed on '{file}': {message}")]
    #[diagnostic(code(assetflow::transform_failed))]
    TransformFailed {
        step: String,
        file: PathBuf,
        message: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // File Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("File not found: {path}")]
    #[diagnostic(code(assetflow::file_not_found))]
    FileNotFound {
        path: PathBuf,
        #[help]
        help: Option<String>,
    },

    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(assetflow::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(assetflow::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    #[error("Glob pattern error: {message}")]
    #[diagnostic(code(assetflow::glob_error))]
    GlobPattern { message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Invalid configuration: {reason}")]
    #[diagnostic(code(assetflow::invalid_config))]
    InvalidConfig {
        reason: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Runtime Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Cache error: {message}")]
    #[diagnostic(code(assetflow::cache_error))]
    Cache { message: String },

    #[error("Server error: {message}")]
    #[diagnostic(code(assetflow::server_error))]
    Server { message: String },

    #[error("Watch error: {message}")]
    #[diagnostic(code(assetflow::watch_error))]
    Watch { message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(assetflow::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(assetflow::yaml_error))]
    Yaml { message: String },
}

impl From<std::io::Error> for AssetflowError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for AssetflowError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<glob::PatternError> for AssetflowError {
    fn from(e: glob::PatternError) -> Self {
        Self::GlobPattern { message: e.to_string() }
    }
}

impl From<notify::Error> for AssetflowError {
    fn from(e: notify::Error) -> Self {
        Self::Watch { message: e.to_string() }
    }
}

impl AssetflowError {
    /// Create a transform failure with a hint derived from the message
    pub fn transform_failed(step: &str, file: impl Into<PathBuf>, message: String) -> Self {
        let help = Self::generate_help_for_step(step, &message);
        Self::TransformFailed {
            step: step.to_string(),
            file: file.into(),
            message,
            help,
        }
    }

    /// Wrap an action failure with the task that raised it.
    ///
    /// Errors that already carry a task are returned unchanged so nested
    /// compositions never double-wrap.
    pub fn in_task(self, task: &str) -> Self {
        match self {
            Self::TaskExecution { .. } => self,
            cause => Self::TaskExecution {
                task: task.to_string(),
                cause: Box::new(cause),
            },
        }
    }

    /// The innermost error, skipping task wrappers
    pub fn root_cause(&self) -> &AssetflowError {
        match self {
            Self::TaskExecution { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// Create a file write error
    pub fn write_failed(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::FileWriteError {
            path: path.into(),
            error: error.to_string(),
        }
    }

    /// Create a file read error
    pub fn read_failed(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::FileReadError {
            path: path.into(),
            error: error.to_string(),
        }
    }

    fn generate_help_for_step(step: &str, message: &str) -> Option<String> {
        match step {
            "sass" => Self::parse_sass_error(message),
            "scripts" | "minify-js" => Self::parse_script_error(message),
            _ => None,
        }
    }

    fn parse_sass_error(message: &str) -> Option<String> {
        if message.contains("expected \";\"") || message.contains("expected \"{\"") {
            Some("A declaration or block is not terminated. Check the line reported above.".into())
        } else if message.contains("Undefined variable") {
            Some("A $variable is used before it is declared or imported.".into())
        } else if message.contains("Can't find stylesheet to import") {
            Some("Imports resolve relative to the styles directory. Check the partial's name.".into())
        } else {
            None
        }
    }

    fn parse_script_error(message: &str) -> Option<String> {
        if message.contains("Unexpected eof") {
            Some("The file ends inside a block or expression. Look for a missing brace.".into())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_task_wraps_once() {
        let err = AssetflowError::Io { message: "boom".into() }
            .in_task("styles")
            .in_task("build");

        match &err {
            AssetflowError::TaskExecution { task, .. } => assert_eq!(task, "styles"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(err.root_cause(), AssetflowError::Io { .. }));
    }

    #[test]
    fn test_sass_help() {
        let err = AssetflowError::transform_failed(
            "sass",
            "src/styles/style.scss",
            "Error: Undefined variable.".into(),
        );
        let AssetflowError::TransformFailed { help, .. } = err else {
            panic!("expected transform failure");
        };
        assert!(help.is_some());
    }

    #[test]
    fn test_cycle_message() {
        let err = AssetflowError::CircularDependency {
            tasks: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Circular dependency detected: a → b → a");
    }
}
