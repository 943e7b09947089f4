// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! Sass compilation via grass

use std::path::PathBuf;

use super::{FileBuf, Transform};
use crate::errors::AssetflowError;

/// Compile `.scss` files to CSS
#[derive(Debug, Default)]
pub struct Sass {
    /// Extra directories searched by `@import`/`@use`
    load_paths: Vec<PathBuf>,
}

impl Sass {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.load_paths.push(path.into());
        self
    }

    fn compile(&self, file: &FileBuf) -> Result<String, AssetflowError> {
        let input = file.text(self.name())?;

        let mut options = grass::Options::default().style(grass::OutputStyle::Expanded);
        if let Some(dir) = file.path.parent() {
            options = options.load_path(dir);
        }
        for path in &self.load_paths {
            options = options.load_path(path);
        }

        grass::from_string(input.to_owned(), &options)
            .map_err(|e| AssetflowError::transform_failed(self.name(), &file.path, e.to_string()))
    }
}

impl Transform for Sass {
    fn name(&self) -> &'static str {
        "sass"
    }

    fn apply(&self, files: Vec<FileBuf>) -> Result<Vec<FileBuf>, AssetflowError> {
        let mut out = Vec::with_capacity(files.len());

        for mut file in files {
            // Partials are only reachable through imports
            if file.file_name().starts_with('_') {
                continue;
            }

            let css = self.compile(&file)?;
            file.source_map = file.source_map.as_ref().map(|m| m.collapse(&css));
            file.contents = css.into_bytes();
            file.path.set_extension("css");
            out.push(file);
        }

        Ok(out)
    }
}
