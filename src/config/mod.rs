// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! Build configuration
//!
//! A `BuildConfig` is assembled once at startup from defaults, the optional
//! `.assetflow.yaml` file and the `NODE_ENV` build mode. It is immutable
//! afterwards and handed to task registration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::AssetflowError;

/// Name of the optional project configuration file
pub const CONFIG_FILE: &str = ".assetflow.yaml";

/// Environment variable selecting the build mode
pub const MODE_ENV_VAR: &str = "NODE_ENV";

/// Development vs production switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// Unminified output with source maps
    #[default]
    Development,
    /// Additional `.min` outputs, no source maps
    Production,
}

impl BuildMode {
    /// Derive the mode from the value of `NODE_ENV`.
    ///
    /// Unset or `dev` selects development, anything else production.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            None | Some("dev") => Self::Development,
            Some(_) => Self::Production,
        }
    }

    /// Read `NODE_ENV` from the process environment
    pub fn from_env() -> Self {
        let value = std::env::var(MODE_ENV_VAR).ok();
        Self::from_env_value(value.as_deref())
    }

    pub fn is_dev(self) -> bool {
        self == Self::Development
    }
}

impl std::fmt::Display for BuildMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Complete build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Build mode (never read from the file)
    #[serde(skip)]
    pub mode: BuildMode,

    /// Project root all relative paths resolve against
    #[serde(skip)]
    pub root: PathBuf,

    /// Source tree
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Output tree, deleted by `clean`
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Development server
    #[serde(default)]
    pub server: ServerConfig,

    /// File watcher
    #[serde(default)]
    pub watch: WatchConfig,

    /// Style pipeline settings
    #[serde(default)]
    pub styles: StylesConfig,

    /// Image cache
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Development server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// File watcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Debounce delay in milliseconds
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce(),
        }
    }
}

/// Style pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StylesConfig {
    /// Browserslist queries used for vendor prefixing
    #[serde(default = "default_browsers")]
    pub browsers: Vec<String>,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            browsers: default_browsers(),
        }
    }
}

/// Image cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Enable caching of compressed images
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cache directory
    #[serde(default = "default_cache_dir")]
    pub directory: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: default_cache_dir(),
        }
    }
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("src")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_debounce() -> u64 {
    200
}

fn default_browsers() -> Vec<String> {
    vec!["last 15 versions".to_string(), "> 1%".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".assetflow/cache")
}

impl BuildConfig {
    /// Default configuration rooted at `root`
    pub fn new(root: impl Into<PathBuf>, mode: BuildMode) -> Self {
        Self {
            mode,
            root: root.into(),
            source_dir: default_source_dir(),
            output_dir: default_output_dir(),
            server: ServerConfig::default(),
            watch: WatchConfig::default(),
            styles: StylesConfig::default(),
            cache: CacheConfig::default(),
        }
    }

    /// Load `.assetflow.yaml` from `root` if present, otherwise defaults
    pub fn load(root: &Path, mode: BuildMode) -> Result<Self, AssetflowError> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::new(root, mode));
        }

        let content =
            std::fs::read_to_string(&path).map_err(|e| AssetflowError::read_failed(&path, e))?;
        let mut config = Self::from_yaml(&content)?;
        config.root = root.to_path_buf();
        config.mode = mode;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from YAML; an empty document yields defaults
    pub fn from_yaml(yaml: &str) -> Result<Self, AssetflowError> {
        if yaml.trim().is_empty() {
            return Ok(Self::new(PathBuf::new(), BuildMode::default()));
        }
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    fn validate(&self) -> Result<(), AssetflowError> {
        if self.source_dir == self.output_dir {
            return Err(AssetflowError::InvalidConfig {
                reason: "source_dir and output_dir are the same directory".into(),
                help: Some("`clean` deletes output_dir; point it somewhere else".into()),
            });
        }
        if self.styles.browsers.is_empty() {
            return Err(AssetflowError::InvalidConfig {
                reason: "styles.browsers is empty".into(),
                help: Some("Use e.g. [\"last 15 versions\", \"> 1%\"]".into()),
            });
        }
        Ok(())
    }

    /// Absolute source directory
    pub fn source_path(&self) -> PathBuf {
        self.root.join(&self.source_dir)
    }

    /// Absolute output directory
    pub fn output_path(&self) -> PathBuf {
        self.root.join(&self.output_dir)
    }

    /// Absolute image cache directory
    pub fn cache_path(&self) -> PathBuf {
        self.root.join(&self.cache.directory)
    }

    /// Glob relative to the project root, e.g. `src/js/*.js`
    pub fn source_glob(&self, relative: &str) -> String {
        self.source_dir.join(relative).to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_env_value() {
        assert_eq!(BuildMode::from_env_value(None), BuildMode::Development);
        assert_eq!(BuildMode::from_env_value(Some("dev")), BuildMode::Development);
        assert_eq!(BuildMode::from_env_value(Some("prod")), BuildMode::Production);
        assert_eq!(BuildMode::from_env_value(Some("")), BuildMode::Production);
    }

    #[test]
    fn test_parse_partial_config() {
        let yaml = r#"
output_dir: dist
server:
  port: 8080
"#;
        let config = BuildConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("dist"));
        assert_eq!(config.source_dir, PathBuf::from("src"));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.watch.debounce_ms, 200);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result = BuildConfig::from_yaml("outptu_dir: dist\n");
        assert!(matches!(result, Err(AssetflowError::Yaml { .. })));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig::load(dir.path(), BuildMode::Production).unwrap();
        assert_eq!(config.mode, BuildMode::Production);
        assert_eq!(config.output_path(), dir.path().join("public"));
    }

    #[test]
    fn test_load_rejects_same_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "source_dir: web\noutput_dir: web\n").unwrap();
        let result = BuildConfig::load(dir.path(), BuildMode::Development);
        assert!(matches!(result, Err(AssetflowError::InvalidConfig { .. })));
    }
}
