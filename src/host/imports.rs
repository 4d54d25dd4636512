//! Custom (per-suite) imports.
//!
//! A suite may import host functions beyond the standard surface, typically to mock something. They come from the
//! `imports` section of the configuration or, for a single test file, from a `<stem>.imports` JSON file beside it:
//!
//! ```json
//! { "env": { "seed": 42 } }
//! ```
//!
//! Each entry becomes a function returning that number. Functions can also be registered programmatically.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use probe_core::ImportName;

use crate::error::ConfigError;

/// Host function backing a custom import.
pub type ImportFn = Rc<dyn Fn(&[f64]) -> f64>;

/// `{ module: { name: value } }` as found in configuration files.
pub type ImportConstants = BTreeMap<String, BTreeMap<String, f64>>;

#[derive(Clone, Default)]
pub struct CustomImports {
    functions: BTreeMap<ImportName, ImportFn>,
}

impl std::fmt::Debug for CustomImports {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.functions.keys().map(ToString::to_string)).finish()
    }
}

impl CustomImports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_constants(constants: &ImportConstants) -> Self {
        let mut imports = Self::new();
        for (module, names) in constants {
            for (name, value) in names {
                imports.insert_constant(module, name, *value);
            }
        }
        imports
    }

    /// Read a `.imports` file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let constants: ImportConstants = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_constants(&constants))
    }

    /// Where the per-file imports of `entry` live: `dir/<stem>.imports`.
    pub fn sidecar_path(entry: &Path) -> PathBuf {
        entry.with_extension("imports")
    }

    /// Imports for `entry`: its sidecar file if one exists, otherwise `fallback`.
    pub fn for_entry(entry: &Path, fallback: &CustomImports) -> Result<Self, ConfigError> {
        let sidecar = Self::sidecar_path(entry);
        if sidecar.is_file() {
            tracing::debug!(file = %sidecar.display(), "using per-file imports");
            Self::load_file(&sidecar)
        } else {
            Ok(fallback.clone())
        }
    }

    pub fn insert(&mut self, module: &str, name: &str, function: impl Fn(&[f64]) -> f64 + 'static) -> &mut Self {
        self.functions.insert(ImportName::new(module, name), Rc::new(function));
        self
    }

    pub fn insert_constant(&mut self, module: &str, name: &str, value: f64) -> &mut Self {
        self.insert(module, name, move |_| value)
    }

    pub fn contains(&self, import: &ImportName) -> bool {
        self.functions.contains_key(import)
    }

    pub fn call(&self, import: &ImportName, args: &[f64]) -> Option<f64> {
        self.functions.get(import).map(|function| function(args))
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_become_functions() {
        let mut constants = ImportConstants::new();
        constants.entry("env".to_string()).or_default().insert("seed".to_string(), 42.0);
        let imports = CustomImports::from_constants(&constants);
        assert_eq!(imports.call(&ImportName::new("env", "seed"), &[1.0, 2.0]), Some(42.0));
        assert_eq!(imports.call(&ImportName::new("env", "other"), &[]), None);
    }

    #[test]
    fn test_programmatic_import() {
        let mut imports = CustomImports::new();
        imports.insert("math", "add", |args| args.iter().sum());
        assert_eq!(imports.call(&ImportName::new("math", "add"), &[1.0, 2.0]), Some(3.0));
        assert!(imports.contains(&ImportName::new("math", "add")));
        assert_eq!(format!("{imports:?}"), "{\"math.add\"}");
    }

    #[test]
    fn test_sidecar_path_replaces_extension() {
        assert_eq!(
            CustomImports::sidecar_path(Path::new("tests/math.spec.ts")),
            PathBuf::from("tests/math.spec.imports")
        );
    }

    #[test]
    fn test_sidecar_file_replaces_fallback() {
        let dir = std::env::temp_dir().join(format!("probe_imports_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let entry = dir.join("suite.spec");
        fs::write(dir.join("suite.imports"), r#"{ "env": { "seed": 7 } }"#).unwrap();

        let mut fallback = CustomImports::new();
        fallback.insert_constant("env", "fallback", 1.0);

        let imports = CustomImports::for_entry(&entry, &fallback).unwrap();
        assert_eq!(imports.call(&ImportName::new("env", "seed"), &[]), Some(7.0));
        assert!(!imports.contains(&ImportName::new("env", "fallback")));

        let other = CustomImports::for_entry(&dir.join("none.spec"), &fallback).unwrap();
        assert!(other.contains(&ImportName::new("env", "fallback")));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_malformed_sidecar_is_a_parse_error() {
        let dir = std::env::temp_dir().join(format!("probe_imports_bad_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("bad.imports"), "{ not json").unwrap();
        let err = CustomImports::for_entry(&dir.join("bad.spec"), &CustomImports::new()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        fs::remove_dir_all(&dir).unwrap();
    }
}
