//! Run configuration (`probe.config.json`).
//!
//! Every field has a default, so a partial file (or none at all) is valid:
//!
//! ```json
//! {
//!   "include": ["assembly/__tests__/**/*.spec.ts"],
//!   "disclude": ["node_modules"],
//!   "outputBinary": false,
//!   "performance": { "enabled": true, "maxSamples": 1000 },
//!   "imports": { "env": { "seed": 42 } }
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::host::{ImportConstants, PerformanceConfig};

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "probe.config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Configuration {
    /// Glob patterns of entry files.
    pub include: Vec<String>,
    /// Regexes; entry files whose path matches any of them are dropped.
    pub disclude: Vec<String>,
    pub performance: PerformanceConfig,
    /// Write the binaries emitted while loading each entry file next to it.
    pub output_binary: bool,
    /// Custom imports for every module without its own `.imports` file.
    pub imports: ImportConstants,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            include: vec!["assembly/__tests__/**/*.spec.ts".to_string()],
            disclude: vec!["node_modules".to_string()],
            performance: PerformanceConfig::default(),
            output_binary: false,
            imports: ImportConstants::new(),
        }
    }
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include(mut self, include: Vec<String>) -> Self {
        self.include = include;
        self
    }

    pub fn with_disclude(mut self, disclude: Vec<String>) -> Self {
        self.disclude = disclude;
        self
    }

    pub fn with_performance(mut self, performance: PerformanceConfig) -> Self {
        self.performance = performance;
        self
    }

    pub fn with_output_binary(mut self, output_binary: bool) -> Self {
        self.output_binary = output_binary;
        self
    }

    pub fn with_imports(mut self, imports: ImportConstants) -> Self {
        self.imports = imports;
        self
    }

    /// Parse configuration text. `path` is only used for error messages.
    pub fn from_json(text: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, path)
    }

    /// Load `path`, or [`DEFAULT_CONFIG_FILE`] when `path` is `None`.
    ///
    /// A missing default file yields the defaults; a missing explicit file is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        match Self::load(&default) {
            Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(file = DEFAULT_CONFIG_FILE, "no configuration file; using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================
    // Defaults
    // ========================================

    #[test]
    fn test_default_config() {
        let config = Configuration::default();
        assert_eq!(config.include, vec!["assembly/__tests__/**/*.spec.ts"]);
        assert_eq!(config.disclude, vec!["node_modules"]);
        assert!(!config.output_binary);
        assert!(!config.performance.enabled);
        assert!(config.imports.is_empty());
    }

    #[test]
    fn test_builder_chain() {
        let config = Configuration::new()
            .with_include(vec!["tests/*.spec".to_string()])
            .with_output_binary(true);
        assert_eq!(config.include, vec!["tests/*.spec"]);
        assert!(config.output_binary);
    }

    // ========================================
    // Parsing
    // ========================================

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Configuration::from_json(r#"{ "outputBinary": true }"#, Path::new("p.json")).unwrap();
        assert!(config.output_binary);
        assert_eq!(config.disclude, vec!["node_modules"]);
    }

    #[test]
    fn test_nested_sections() {
        let text = r#"{
            "include": ["a/**/*.spec"],
            "performance": { "enabled": true, "maxSamples": 12, "reportVariance": true },
            "imports": { "env": { "seed": 3 } }
        }"#;
        let config = Configuration::from_json(text, Path::new("p.json")).unwrap();
        assert!(config.performance.enabled);
        assert_eq!(config.performance.max_samples, 12);
        assert!(config.performance.report_variance);
        assert!(config.performance.report_average);
        assert_eq!(config.imports["env"]["seed"], 3.0);
    }

    #[test]
    fn test_malformed_file() {
        let err = Configuration::from_json("{ include: ", Path::new("bad.json")).unwrap_err();
        assert!(err.to_string().starts_with("failed to parse `bad.json`"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = Configuration::load_or_default(Some(Path::new("does/not/exist.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
