// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! Vendor prefixing and CSS minification via lightningcss

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use std::collections::HashMap;
use std::path::Path;

use super::{FileBuf, Transform};
use crate::errors::AssetflowError;

/// Resolve browserslist queries such as `last 15 versions`
fn resolve_browsers(queries: &[String]) -> Result<Option<Browsers>, AssetflowError> {
    Browsers::from_browserslist(queries).map_err(|e| AssetflowError::InvalidConfig {
        reason: format!("invalid browserslist query: {e}"),
        help: Some("See https://browsersl.ist for the query syntax".into()),
    })
}

/// Full lightningcss pass: prefixing, rule merging and minified printing
fn minify(
    step: &str,
    path: &Path,
    code: &str,
    browsers: Option<Browsers>,
) -> Result<String, AssetflowError> {
    let targets = Targets {
        browsers,
        ..Targets::default()
    };
    let fail = |message: String| AssetflowError::transform_failed(step, path, message);

    let options = ParserOptions {
        filename: path.display().to_string(),
        ..ParserOptions::default()
    };
    let mut sheet = StyleSheet::parse(code, options).map_err(|e| fail(e.to_string()))?;

    sheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| fail(e.to_string()))?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| fail(e.to_string()))?;

    Ok(printed.code)
}

/// Prefixed and fallback forms lightningcss emits ahead of `decl`.
///
/// The declaration itself (printed last) is not returned. Anything that
/// fails to parse on its own yields nothing.
fn fallbacks(decl: &str, targets: Targets) -> Vec<String> {
    let code = format!("a{{{decl}}}");
    let Ok(mut sheet) = StyleSheet::parse(&code, ParserOptions::default()) else {
        return Vec::new();
    };
    let minified = sheet.minify(MinifyOptions {
        targets,
        ..MinifyOptions::default()
    });
    let printed = minified.ok().and_then(|_| {
        sheet
            .to_css(PrinterOptions {
                targets,
                ..PrinterOptions::default()
            })
            .ok()
    });
    let Some(printed) = printed else {
        return Vec::new();
    };

    let mut decls: Vec<String> = printed
        .code
        .lines()
        .map(str::trim)
        .filter(|line| line.ends_with(';'))
        .map(String::from)
        .collect();
    decls.pop();
    decls
}

fn is_declaration(line: &str) -> bool {
    line.ends_with(';')
        && line.contains(':')
        && !line.starts_with('@')
        && !line.starts_with("/*")
        && !line.contains('{')
}

/// Add vendor prefixes for the configured browsers.
///
/// Works line by line on expanded output: prefixed declarations are inserted
/// above the declaration they come from and every original line is kept as
/// written, so rules are never merged or rewritten.
#[derive(Debug)]
pub struct Autoprefix {
    browsers: Option<Browsers>,
}

impl Autoprefix {
    pub fn new(queries: &[String]) -> Result<Self, AssetflowError> {
        Ok(Self {
            browsers: resolve_browsers(queries)?,
        })
    }

    /// Prefixed text plus, per output line, the input line it came from
    fn prefix(&self, css: &str) -> (String, Vec<Option<u32>>) {
        let targets = Targets {
            browsers: self.browsers,
            ..Targets::default()
        };
        let mut seen: HashMap<&str, Vec<String>> = HashMap::new();
        let mut lines = Vec::new();
        let mut origins = Vec::new();

        for (index, line) in css.split('\n').enumerate() {
            let trimmed = line.trim();
            if is_declaration(trimmed) {
                let indent = &line[..line.len() - line.trim_start().len()];
                let extra = seen
                    .entry(trimmed)
                    .or_insert_with(|| fallbacks(trimmed, targets));
                for decl in extra.iter() {
                    lines.push(format!("{indent}{decl}"));
                    origins.push(Some(index as u32));
                }
            }
            lines.push(line.to_string());
            origins.push(Some(index as u32));
        }

        (lines.join("\n"), origins)
    }
}

impl Transform for Autoprefix {
    fn name(&self) -> &'static str {
        "autoprefix"
    }

    fn apply(&self, files: Vec<FileBuf>) -> Result<Vec<FileBuf>, AssetflowError> {
        files
            .into_iter()
            .map(|mut file| {
                let (css, origins) = self.prefix(file.text(self.name())?);
                file.source_map = file.source_map.as_ref().map(|m| m.remap(&origins));
                file.contents = css.into_bytes();
                Ok(file)
            })
            .collect()
    }
}

/// Minify stylesheets; drops any source map
#[derive(Debug)]
pub struct MinifyCss {
    browsers: Option<Browsers>,
}

impl MinifyCss {
    pub fn new(queries: &[String]) -> Result<Self, AssetflowError> {
        Ok(Self {
            browsers: resolve_browsers(queries)?,
        })
    }
}

impl Transform for MinifyCss {
    fn name(&self) -> &'static str {
        "minify-css"
    }

    fn apply(&self, files: Vec<FileBuf>) -> Result<Vec<FileBuf>, AssetflowError> {
        files
            .into_iter()
            .map(|mut file| {
                let css = minify(
                    self.name(),
                    &file.path,
                    file.text(self.name())?,
                    self.browsers,
                )?;
                file.source_map = None;
                file.contents = css.into_bytes();
                Ok(file)
            })
            .collect()
    }
}
