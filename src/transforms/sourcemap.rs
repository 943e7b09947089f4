// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! Line-granular source maps (revision 3)
//!
//! Every generated line maps to at most one original line. That is exact for
//! concatenation and pass-through steps; steps that rewrite a file wholesale
//! (Sass, prefixing) collapse the map onto the start of the original source.

use sourcemap::SourceMapBuilder;

use super::{FileBuf, Transform};
use crate::errors::AssetflowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineMapping {
    source: u32,
    line: u32,
}

/// Mapping from generated lines back to original sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMap {
    sources: Vec<String>,
    sources_content: Vec<String>,
    lines: Vec<Option<LineMapping>>,
}

fn line_count(text: &str) -> usize {
    text.split('\n').count()
}

impl SourceMap {
    /// Each line of `content` maps to itself
    pub fn identity(source: &str, content: &str) -> Self {
        let lines = (0..line_count(content) as u32)
            .map(|line| Some(LineMapping { source: 0, line }))
            .collect();
        Self {
            sources: vec![source.to_string()],
            sources_content: vec![content.to_string()],
            lines,
        }
    }

    /// No mappings for `count` generated lines
    pub fn unmapped(count: usize) -> Self {
        Self {
            sources: Vec::new(),
            sources_content: Vec::new(),
            lines: vec![None; count],
        }
    }

    /// Re-target the map at a wholesale rewrite of the file.
    ///
    /// Sources are kept; every generated line points at the start of the
    /// first source.
    pub fn collapse(&self, generated: &str) -> Self {
        let count = line_count(generated);
        let mapping = self.lines.iter().flatten().next().map(|m| LineMapping {
            source: m.source,
            line: 0,
        });
        Self {
            sources: self.sources.clone(),
            sources_content: self.sources_content.clone(),
            lines: vec![mapping; count],
        }
    }

    /// Maps of files joined with `\n`, in order
    pub fn concat(parts: impl IntoIterator<Item = SourceMap>) -> Self {
        let mut out = Self::unmapped(0);

        for part in parts {
            let mut remap = Vec::with_capacity(part.sources.len());
            for (name, content) in part.sources.iter().zip(&part.sources_content) {
                let idx = match out.sources.iter().position(|s| s == name) {
                    Some(idx) => idx,
                    None => {
                        out.sources.push(name.clone());
                        out.sources_content.push(content.clone());
                        out.sources.len() - 1
                    }
                };
                remap.push(idx as u32);
            }

            out.lines.extend(part.lines.into_iter().map(|m| {
                m.map(|m| LineMapping {
                    source: remap[m.source as usize],
                    line: m.line,
                })
            }));
        }

        out
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Original `(source, line)` for a zero-based generated line
    pub fn lookup(&self, generated_line: usize) -> Option<(&str, u32)> {
        let mapping = self.lines.get(generated_line).copied().flatten()?;
        Some((self.sources[mapping.source as usize].as_str(), mapping.line))
    }

    /// Map for a rewrite of the file this map describes.
    ///
    /// `origins[i]` is the line of the current file that generated line `i`
    /// came from.
    pub fn remap(&self, origins: &[Option<u32>]) -> Self {
        Self {
            sources: self.sources.clone(),
            sources_content: self.sources_content.clone(),
            lines: origins
                .iter()
                .map(|origin| origin.and_then(|line| self.lines.get(line as usize).copied().flatten()))
                .collect(),
        }
    }

    /// Serialize as a revision 3 JSON document, one segment at column 0
    /// per mapped line
    pub fn to_json(&self, file: &str) -> Result<Vec<u8>, sourcemap::Error> {
        let mut builder = SourceMapBuilder::new(Some(file));
        let ids: Vec<u32> = self
            .sources
            .iter()
            .zip(&self.sources_content)
            .map(|(name, content)| {
                let id = builder.add_source(name);
                builder.set_source_contents(id, Some(content));
                id
            })
            .collect();

        for (generated, mapping) in self.lines.iter().enumerate() {
            if let Some(m) = mapping {
                builder.add_raw(
                    generated as u32,
                    0,
                    m.line,
                    0,
                    Some(ids[m.source as usize]),
                    None,
                    false,
                );
            }
        }

        let mut json = Vec::new();
        builder.into_sourcemap().to_writer(&mut json)?;
        Ok(json)
    }
}

/// Start tracking each file against its own lines
pub struct SourceMapInit;

impl Transform for SourceMapInit {
    fn name(&self) -> &'static str {
        "sourcemaps-init"
    }

    fn apply(&self, files: Vec<FileBuf>) -> Result<Vec<FileBuf>, AssetflowError> {
        files
            .into_iter()
            .map(|mut file| {
                let map = SourceMap::identity(&file.relative_url(), file.text(self.name())?);
                file.source_map = Some(map);
                Ok(file)
            })
            .collect()
    }
}

/// Emit `<file>.map` next to each mapped file and link it from the file
pub struct SourceMapWrite;

impl Transform for SourceMapWrite {
    fn name(&self) -> &'static str {
        "sourcemaps-write"
    }

    fn apply(&self, files: Vec<FileBuf>) -> Result<Vec<FileBuf>, AssetflowError> {
        let mut out = Vec::with_capacity(files.len() * 2);

        for mut file in files {
            let Some(map) = file.source_map.take() else {
                out.push(file);
                continue;
            };

            let name = file.file_name();
            let map_name = format!("{name}.map");
            let comment = if file.extension() == Some("css") {
                format!("\n/*# sourceMappingURL={map_name} */\n")
            } else {
                format!("\n//# sourceMappingURL={map_name}\n")
            };

            let json = map
                .to_json(&name)
                .map_err(|e| AssetflowError::transform_failed(self.name(), &file.path, e.to_string()))?;
            let mut map_path = file.path.clone().into_os_string();
            map_path.push(".map");

            file.contents.extend_from_slice(comment.as_bytes());
            let map_file = FileBuf::new(map_path, &file.base, json);
            out.push(file);
            out.push(map_file);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(map: &SourceMap) -> sourcemap::SourceMap {
        sourcemap::SourceMap::from_slice(&map.to_json("out.js").unwrap()).unwrap()
    }

    #[test]
    fn test_identity_mappings() {
        let map = SourceMap::identity("a.js", "a();\nb();");
        let decoded = decode(&map);

        assert_eq!(decoded.get_file(), Some("out.js"));
        let token = decoded.lookup_token(1, 0).unwrap();
        assert_eq!(token.get_source(), Some("a.js"));
        assert_eq!(token.get_src_line(), 1);
        assert_eq!(decoded.get_source_contents(0), Some("a();\nb();"));
    }

    #[test]
    fn test_remap_follows_origins() {
        let map = SourceMap::identity("a.js", "a;\n\nb;");
        let remapped = map.remap(&[Some(0), Some(2), None]);
        assert_eq!(remapped.line_count(), 3);
        assert_eq!(remapped.lookup(1), Some(("a.js", 2)));
        assert_eq!(remapped.lookup(2), None);
    }

    #[test]
    fn test_concat_offsets_sources() {
        let a = SourceMap::identity("a.js", "a();");
        let b = SourceMap::identity("b.js", "b();\nc();");
        let map = SourceMap::concat([a, b]);

        assert_eq!(map.sources(), &["a.js".to_string(), "b.js".to_string()]);
        assert_eq!(map.line_count(), 3);
        assert_eq!(map.lookup(0), Some(("a.js", 0)));
        assert_eq!(map.lookup(2), Some(("b.js", 1)));

        let decoded = decode(&map);
        let token = decoded.lookup_token(2, 0).unwrap();
        assert_eq!(token.get_source(), Some("b.js"));
        assert_eq!(token.get_src_line(), 1);
    }

    #[test]
    fn test_collapse_points_at_first_source() {
        let map = SourceMap::identity("style.scss", "$c: red;\na { color: $c; }");
        let collapsed = map.collapse("a {\n  color: red;\n}\n");
        assert_eq!(collapsed.line_count(), 4);
        assert_eq!(collapsed.lookup(3), Some(("style.scss", 0)));
    }

    #[test]
    fn test_write_emits_sibling_map() {
        let mut file = FileBuf::new("/p/style.css", "/p", b"a{}".to_vec());
        file.source_map = Some(SourceMap::identity("style.scss", "a{}"));

        let out = SourceMapWrite.apply(vec![file]).unwrap();
        assert_eq!(out.len(), 2);
        assert!(String::from_utf8_lossy(&out[0].contents)
            .ends_with("/*# sourceMappingURL=style.css.map */\n"));
        assert_eq!(out[1].relative_url(), "style.css.map");

        let json: serde_json::Value = serde_json::from_slice(&out[1].contents).unwrap();
        assert_eq!(json["version"], 3);
        assert_eq!(json["file"], "style.css");
        assert_eq!(json["sources"][0], "style.scss");
    }
}
