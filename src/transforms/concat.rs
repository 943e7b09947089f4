// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! Concatenation of a file set into one file

use super::{FileBuf, SourceMap, Transform};
use crate::errors::AssetflowError;

/// Join every input, in order, separated by `\n`
#[derive(Debug)]
pub struct Concat {
    file_name: String,
}

impl Concat {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

impl Transform for Concat {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn apply(&self, files: Vec<FileBuf>) -> Result<Vec<FileBuf>, AssetflowError> {
        let Some(first) = files.first() else {
            return Ok(files);
        };
        let base = first.base.clone();
        let mapped = files.iter().any(|f| f.source_map.is_some());

        let mut contents = Vec::new();
        let mut maps = Vec::with_capacity(files.len());

        for (i, mut file) in files.into_iter().enumerate() {
            if i > 0 {
                contents.push(b'\n');
            }
            if mapped {
                let map = match file.source_map.take() {
                    Some(map) => map,
                    None => SourceMap::unmapped(file.text(self.name())?.split('\n').count()),
                };
                maps.push(map);
            }
            contents.extend_from_slice(&file.contents);
        }

        let mut out = FileBuf::new(base.join(&self.file_name), base, contents);
        if mapped {
            out.source_map = Some(SourceMap::concat(maps));
        }

        Ok(vec![out])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::{SourceMapInit, Transform};

    fn js(name: &str, code: &str) -> FileBuf {
        FileBuf::new(format!("/p/js/{name}"), "/p/js", code.as_bytes().to_vec())
    }

    #[test]
    fn test_concat_joins_in_order() {
        let out = Concat::new("script.js")
            .apply(vec![js("a.js", "a();"), js("b.js", "b();")])
            .unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].relative_url(), "script.js");
        assert_eq!(out[0].contents, b"a();\nb();");
        assert!(out[0].source_map.is_none());
    }

    #[test]
    fn test_concat_empty_emits_nothing() {
        assert!(Concat::new("script.js").apply(vec![]).unwrap().is_empty());
    }

    #[test]
    fn test_concat_merges_maps() {
        let files = SourceMapInit
            .apply(vec![js("a.js", "a();\n"), js("b.js", "b();")])
            .unwrap();
        let out = Concat::new("script.js").apply(files).unwrap();

        let map = out[0].source_map.as_ref().unwrap();
        let text = String::from_utf8(out[0].contents.clone()).unwrap();
        assert_eq!(map.line_count(), text.split('\n').count());
        assert_eq!(map.lookup(2), Some(("b.js", 0)));
    }
}
