// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! File transforms
//!
//! A [`Pipeline`] is an ordered list of [`Transform`]s applied to in-memory
//! files. Each stage returns a `Result`; the first failure stops the
//! pipeline. Reading sources and writing outputs sit outside the pipeline
//! ([`read_sources`] / [`write_outputs`]).

mod concat;
mod css;
mod image;
mod rename;
mod sass;
mod script;
mod sourcemap;

pub use concat::Concat;
pub use css::{Autoprefix, MinifyCss};
pub use image::{compress_image, compression_tag};
pub use rename::Rename;
pub use sass::Sass;
pub use script::{MinifyJs, Transpile};
pub use self::sourcemap::{SourceMap, SourceMapInit, SourceMapWrite};

use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use crate::errors::AssetflowError;

/// A file flowing through a pipeline
#[derive(Debug, Clone)]
pub struct FileBuf {
    /// Absolute path; renamed by transforms
    pub path: PathBuf,
    /// Glob base the output path is computed against
    pub base: PathBuf,
    pub contents: Vec<u8>,
    /// Present once a source map has been initialised
    pub source_map: Option<SourceMap>,
}

impl FileBuf {
    pub fn new(path: impl Into<PathBuf>, base: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            base: base.into(),
            contents,
            source_map: None,
        }
    }

    /// Path relative to the glob base
    pub fn relative(&self) -> PathBuf {
        self.path
            .strip_prefix(&self.base)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(self.path.file_name().unwrap_or_default()))
    }

    /// Relative path with `/` separators, as used inside source maps
    pub fn relative_url(&self) -> String {
        self.relative()
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Contents as UTF-8 text
    pub fn text(&self, step: &str) -> Result<&str, AssetflowError> {
        std::str::from_utf8(&self.contents).map_err(|e| {
            AssetflowError::transform_failed(step, &self.path, format!("not valid UTF-8: {e}"))
        })
    }

    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// One step of a pipeline
pub trait Transform: Send + Sync {
    /// Name used in error messages and plans
    fn name(&self) -> &'static str;

    fn apply(&self, files: Vec<FileBuf>) -> Result<Vec<FileBuf>, AssetflowError>;
}

/// Ordered composition of transforms
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Transform>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage
    pub fn pipe(mut self, transform: impl Transform + 'static) -> Self {
        self.stages.push(Box::new(transform));
        self
    }

    /// Append a stage only when `condition` holds
    pub fn pipe_if(self, condition: bool, transform: impl Transform + 'static) -> Self {
        if condition {
            self.pipe(transform)
        } else {
            self
        }
    }

    /// Stage names, in order
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn run(&self, mut files: Vec<FileBuf>) -> Result<Vec<FileBuf>, AssetflowError> {
        for stage in &self.stages {
            if files.is_empty() {
                break;
            }
            tracing::trace!(stage = stage.name(), files = files.len(), "applying transform");
            files = stage.apply(files)?;
        }
        Ok(files)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.stage_names()).finish()
    }
}

/// Passes its input through and also emits an inner pipeline's output
pub struct Tee(pub Pipeline);

impl Transform for Tee {
    fn name(&self) -> &'static str {
        "tee"
    }

    fn apply(&self, files: Vec<FileBuf>) -> Result<Vec<FileBuf>, AssetflowError> {
        let branch = self.0.run(files.clone())?;
        let mut out = files;
        out.extend(branch);
        Ok(out)
    }
}

fn has_wildcard(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

/// Leading directories of a glob that contain no wildcard
pub fn glob_base(pattern: &Path) -> PathBuf {
    let mut base = PathBuf::new();
    for component in pattern.components() {
        if let Component::Normal(part) = component {
            if has_wildcard(&part.to_string_lossy()) {
                return base;
            }
        }
        base.push(component);
    }
    base.parent().map(Path::to_path_buf).unwrap_or(base)
}

/// Read the files matching `pattern` (relative to `root`).
///
/// Wildcard patterns may match nothing; a literal path must exist. With
/// `since`, only files modified after that instant are returned.
pub fn read_sources(
    root: &Path,
    pattern: &str,
    since: Option<SystemTime>,
) -> Result<Vec<FileBuf>, AssetflowError> {
    let full = root.join(pattern);

    let (base, mut paths) = if has_wildcard(pattern) {
        // The root is a literal path; only `pattern` may hold wildcards
        let full_pattern = if Path::new(pattern).is_absolute() {
            pattern.to_string()
        } else {
            let root = root.to_string_lossy();
            format!(
                "{}/{}",
                glob::Pattern::escape(root.trim_end_matches('/')),
                pattern
            )
        };
        let paths: Vec<PathBuf> = glob::glob(&full_pattern)?
            .filter_map(Result::ok)
            .filter(|p| p.is_file())
            .collect();
        (root.join(glob_base(Path::new(pattern))), paths)
    } else {
        if !full.is_file() {
            return Err(AssetflowError::FileNotFound {
                path: full,
                help: Some(format!("Expected a source file at '{pattern}'")),
            });
        }
        let base = full.parent().map(Path::to_path_buf).unwrap_or_default();
        (base, vec![full])
    };

    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        if let Some(since) = since {
            let modified = std::fs::metadata(&path)
                .and_then(|m| m.modified())
                .map_err(|e| AssetflowError::read_failed(&path, e))?;
            if modified <= since {
                continue;
            }
        }

        let contents = std::fs::read(&path).map_err(|e| AssetflowError::read_failed(&path, e))?;
        files.push(FileBuf::new(path, &base, contents));
    }

    Ok(files)
}

/// Write files below `out_dir`, keeping their path relative to the glob base
pub async fn write_outputs(
    files: &[FileBuf],
    out_dir: &Path,
) -> Result<Vec<PathBuf>, AssetflowError> {
    let mut written = Vec::with_capacity(files.len());

    for file in files {
        let target = out_dir.join(file.relative());
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AssetflowError::write_failed(parent, e))?;
        }
        tokio::fs::write(&target, &file.contents)
            .await
            .map_err(|e| AssetflowError::write_failed(&target, e))?;
        written.push(target);
    }

    Ok(written)
}
