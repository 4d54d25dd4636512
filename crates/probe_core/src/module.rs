//! The guest export surface and the loader contract.
//!
//! Compiling an entry file into a module is an external concern. The host only needs something that turns an
//! entry path into a [`GuestModule`] ([`ModuleLoader`]) and, optionally, the binary artifacts produced on the way.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::handle::FnHandle;
use crate::imports::{HostImports, ImportName};
use crate::memory::{MemoryError, Pointer};
use crate::trap::Trap;

/// The guest's "invoke by handle" capability (`__call`).
///
/// This is the only way the host can make guest code run.
pub trait Invoke {
    fn invoke(&mut self, handle: FnHandle, host: &mut dyn HostImports) -> Result<(), Trap>;
}

/// A loaded, not yet instantiated, guest module.
pub trait GuestModule: Invoke {
    /// Diagnostic name (usually the entry file).
    fn name(&self) -> &str;

    /// Imports the module expects the host to link.
    fn imports(&self) -> Vec<ImportName>;

    /// Exported entry points (see [`REQUIRED_EXPORTS`](crate::REQUIRED_EXPORTS)).
    fn exports(&self) -> Vec<String>;

    /// `__run`: execute registration code, then the guest runner, to completion.
    ///
    /// An `Err` means the guest trapped outside of any crash-isolated call.
    fn run(&mut self, host: &mut dyn HostImports) -> Result<(), Trap>;

    /// `__getString`: decode the string at `ptr` in the module's memory.
    fn get_string(&self, ptr: Pointer) -> Result<String, MemoryError>;
}

/// A binary emitted while loading an entry file (for example the compiled module itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// File extension without the dot, e.g. `wasm`.
    pub extension: String,
    pub contents: Vec<u8>,
}

impl Artifact {
    pub fn new(extension: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            extension: extension.into(),
            contents,
        }
    }

    /// Where the artifact lands when written beside its entry file: `dir/stem.extension`.
    pub fn output_path(&self, entry: &Path) -> PathBuf {
        entry.with_extension(&self.extension)
    }
}

/// What a loader hands back for one entry file.
pub struct LoadedModule {
    pub module: Box<dyn GuestModule>,
    pub artifacts: Vec<Artifact>,
}

/// Errors raised while turning an entry file into a module.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no module is available for `{}`", .0.display())]
    NotFound(PathBuf),

    #[error("compilation failed: {0}")]
    Compile(String),

    #[error("no output binary was emitted")]
    NoBinary,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Compiles or otherwise produces a guest module for an entry file.
pub trait ModuleLoader {
    fn load(&mut self, entry: &Path) -> Result<LoadedModule, LoadError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_output_path_replaces_extension() {
        let artifact = Artifact::new("wasm", vec![0, 97, 115, 109]);
        assert_eq!(
            artifact.output_path(Path::new("tests/math.spec.ts")),
            PathBuf::from("tests/math.spec.wasm")
        );
    }

    #[test]
    fn test_load_error_messages() {
        let err = LoadError::NotFound(PathBuf::from("a.spec"));
        assert_eq!(err.to_string(), "no module is available for `a.spec`");
        assert_eq!(LoadError::NoBinary.to_string(), "no output binary was emitted");
    }
}
