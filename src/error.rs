//! Error types of the host.
//!
//! [`StructuralError`]s stop a module from being instantiated or run at all; any of them fails the run.
//! [`ConfigError`]s come from loading configuration, filters and custom import files.

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use probe_core::LoadError;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum StructuralError {
    #[error("failed to load `{file}`: {source}")]
    #[diagnostic(code(probe::load), help("check that the entry file compiles on its own"))]
    Load {
        file: String,
        #[source]
        source: LoadError,
    },

    #[error("`{file}` requires import `{import}`, which is not provided")]
    #[diagnostic(
        code(probe::missing_import),
        help("add it to the `imports` configuration or to a `.imports` file beside the test file")
    )]
    MissingImport { file: String, import: String },

    #[error("`{file}` does not export `{export}`")]
    #[diagnostic(code(probe::missing_export), help("the module was not built against the probe guest runtime"))]
    MissingExport { file: String, export: String },

    #[error("`{file}` trapped outside of any test or hook: {message}")]
    #[diagnostic(code(probe::runtime))]
    Runtime { file: String, message: String, stack: String },

    #[error("invalid custom imports for `{file}`: {source}")]
    #[diagnostic(code(probe::imports))]
    Imports {
        file: String,
        #[source]
        source: ConfigError,
    },

    #[error("failed to write `{}`: {source}", path.display())]
    #[diagnostic(code(probe::artifact))]
    Artifact {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StructuralError {
    /// The entry file the error belongs to, if any.
    pub fn file(&self) -> Option<&str> {
        match self {
            StructuralError::Load { file, .. }
            | StructuralError::MissingImport { file, .. }
            | StructuralError::MissingExport { file, .. }
            | StructuralError::Runtime { file, .. }
            | StructuralError::Imports { file, .. } => Some(file),
            StructuralError::Artifact { .. } => None,
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read `{}`: {source}", path.display())]
    #[diagnostic(code(probe::config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse `{}`: {source}", path.display())]
    #[diagnostic(code(probe::config::parse))]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid regular expression `{pattern}`: {source}")]
    #[diagnostic(code(probe::config::regex))]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid glob pattern `{pattern}`: {source}")]
    #[diagnostic(code(probe::config::glob))]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}
