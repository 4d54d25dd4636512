//! Entry file discovery.
//!
//! Discovery is a boundary: the aggregator only needs an ordered, duplicate-free list of entry files. The default
//! implementation expands glob patterns; explicit file arguments bypass globbing.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::ConfigError;
use crate::host::NameFilter;

/// Finds the entry files of a run.
pub trait EntryDiscovery {
    fn discover(&self) -> Result<Vec<PathBuf>, ConfigError>;
}

/// Expands `include` globs, then drops paths matching a `disclude` regex or failing the file filter.
#[derive(Debug, Clone)]
pub struct GlobDiscovery {
    include: Vec<String>,
    disclude: Vec<Regex>,
    file_filter: NameFilter,
    root: Option<PathBuf>,
}

impl GlobDiscovery {
    pub fn new(include: &[String], disclude: &[String]) -> Result<Self, ConfigError> {
        let disclude = disclude
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::Regex {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            include: include.to_vec(),
            disclude,
            file_filter: NameFilter::all(),
            root: None,
        })
    }

    pub fn with_file_filter(mut self, filter: NameFilter) -> Self {
        self.file_filter = filter;
        self
    }

    /// Resolve relative patterns against `root` instead of the working directory.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    fn keep(&self, path: &Path) -> bool {
        let text = path.to_string_lossy();
        !self.disclude.iter().any(|regex| regex.is_match(&text)) && self.file_filter.matches(&text)
    }
}

impl EntryDiscovery for GlobDiscovery {
    fn discover(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let mut found = Vec::new();
        for pattern in &self.include {
            let full = match &self.root {
                Some(root) => root.join(pattern).to_string_lossy().into_owned(),
                None => pattern.clone(),
            };
            let paths = glob::glob(&full).map_err(|source| ConfigError::Glob {
                pattern: full.clone(),
                source,
            })?;
            for entry in paths {
                match entry {
                    Ok(path) if self.keep(&path) => found.push(path),
                    Ok(path) => tracing::debug!(file = %path.display(), "entry file excluded"),
                    Err(err) => tracing::warn!(%err, "unreadable path while expanding `{full}`"),
                }
            }
        }
        Ok(dedupe(found))
    }
}

/// Explicitly listed entry files.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    files: Vec<PathBuf>,
    file_filter: NameFilter,
}

impl StaticDiscovery {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files,
            file_filter: NameFilter::all(),
        }
    }

    pub fn with_file_filter(mut self, filter: NameFilter) -> Self {
        self.file_filter = filter;
        self
    }
}

impl EntryDiscovery for StaticDiscovery {
    fn discover(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let kept = self
            .files
            .iter()
            .filter(|path| self.file_filter.matches(&path.to_string_lossy()))
            .cloned()
            .collect();
        Ok(dedupe(kept))
    }
}

/// Remove duplicates, keeping the first occurrence.
fn dedupe(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths.into_iter().filter(|path| seen.insert(path.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("probe_discovery_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("suite")).unwrap();
        fs::create_dir_all(dir.join("node_modules")).unwrap();
        for file in ["suite/a.spec.ts", "suite/b.spec.ts", "suite/helper.ts", "node_modules/c.spec.ts"] {
            fs::write(dir.join(file), "").unwrap();
        }
        dir
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_glob_include_and_disclude() {
        let dir = scratch("glob");
        let discovery = GlobDiscovery::new(&["**/*.spec.ts".to_string()], &["node_modules".to_string()])
            .unwrap()
            .with_root(&dir);
        let found = discovery.discover().unwrap();
        assert_eq!(names(&found), vec!["a.spec.ts", "b.spec.ts"]);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_overlapping_patterns_are_deduplicated() {
        let dir = scratch("dedupe");
        let include = vec!["suite/a.spec.ts".to_string(), "suite/*.spec.ts".to_string()];
        let found = GlobDiscovery::new(&include, &[]).unwrap().with_root(&dir).discover().unwrap();
        assert_eq!(names(&found), vec!["a.spec.ts", "b.spec.ts"]);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_file_filter() {
        let dir = scratch("filter");
        let found = GlobDiscovery::new(&["suite/*.spec.ts".to_string()], &[])
            .unwrap()
            .with_root(&dir)
            .with_file_filter(NameFilter::new("b\\.spec").unwrap())
            .discover()
            .unwrap();
        assert_eq!(names(&found), vec!["b.spec.ts"]);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_invalid_disclude_regex() {
        let err = GlobDiscovery::new(&[], &["(".to_string()]).unwrap_err();
        assert!(matches!(err, ConfigError::Regex { .. }));
    }

    #[test]
    fn test_static_discovery_keeps_order_and_dedupes() {
        let files = vec![PathBuf::from("b.spec"), PathBuf::from("a.spec"), PathBuf::from("b.spec")];
        let found = StaticDiscovery::new(files).discover().unwrap();
        assert_eq!(found, vec![PathBuf::from("b.spec"), PathBuf::from("a.spec")]);
    }
}
