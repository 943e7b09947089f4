// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! File renaming

use super::{FileBuf, Transform};
use crate::errors::AssetflowError;

/// Insert a suffix before the extension: `style.css` → `style.min.css`
#[derive(Debug)]
pub struct Rename {
    suffix: String,
}

impl Rename {
    pub fn suffix(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    fn renamed(&self, file: &FileBuf) -> String {
        let stem = file
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        match file.extension() {
            Some(ext) => format!("{stem}{}.{ext}", self.suffix),
            None => format!("{stem}{}", self.suffix),
        }
    }
}

impl Transform for Rename {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn apply(&self, files: Vec<FileBuf>) -> Result<Vec<FileBuf>, AssetflowError> {
        Ok(files
            .into_iter()
            .map(|mut file| {
                let name = self.renamed(&file);
                file.path.set_file_name(name);
                file
            })
            .collect())
    }
}
