//! An in-process guest module backed by Rust closures, and a loader that maps entry paths to suites.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use probe_core::{
    Artifact, ENV_NAMESPACE, FnHandle, Frame, GuestModule, HostImports, IMPORT_NAMESPACE, ImportName, Invoke,
    LinearMemory, LoadError, LoadedModule, MemoryError, ModuleLoader, Pointer, REQUIRED_EXPORTS, STANDARD_IMPORTS,
    Trap, TrapCode,
};

use crate::env::Env;
use crate::runner::GuestRunner;
use crate::session::{FunctionTable, Session};

/// Name of the runner's own frame; hosts hide it from stack traces.
pub const RUNNER_FRAME: &str = "~lib/probe/runner::__run";

/// Registration code of a suite.
pub type SuiteFn = Rc<dyn Fn(&mut Session)>;

/// A guest module whose test bodies are native closures.
pub struct NativeModule {
    name: String,
    suite: SuiteFn,
    extra_imports: Vec<ImportName>,
    missing_exports: Vec<String>,
    memory: LinearMemory,
    table: FunctionTable,
    frames: Vec<Frame>,
}

impl NativeModule {
    pub fn new(name: impl Into<String>, suite: impl Fn(&mut Session) + 'static) -> Self {
        Self::from_suite(name, Rc::new(suite))
    }

    pub fn from_suite(name: impl Into<String>, suite: SuiteFn) -> Self {
        Self {
            name: name.into(),
            suite,
            extra_imports: Vec::new(),
            missing_exports: Vec::new(),
            memory: LinearMemory::new(),
            table: FunctionTable::default(),
            frames: Vec::new(),
        }
    }

    /// Declare an import beyond the standard set (a custom import, or one the host cannot satisfy).
    pub fn require_import(mut self, module: &str, name: &str) -> Self {
        self.extra_imports.push(ImportName::new(module, name));
        self
    }

    /// Drop one of the required exports from the module's export list.
    pub fn without_export(mut self, name: &str) -> Self {
        self.missing_exports.push(name.to_string());
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.memory = LinearMemory::with_max_pages(max_pages);
        self
    }

    fn callee(&mut self) -> Callee<'_> {
        let base = self.frames.len();
        Callee {
            table: &self.table,
            memory: &mut self.memory,
            frames: &mut self.frames,
            base,
        }
    }
}

impl Invoke for NativeModule {
    fn invoke(&mut self, handle: FnHandle, host: &mut dyn HostImports) -> Result<(), Trap> {
        self.callee().invoke(handle, host)
    }
}

impl GuestModule for NativeModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn imports(&self) -> Vec<ImportName> {
        STANDARD_IMPORTS
            .iter()
            .map(|name| ImportName::new(IMPORT_NAMESPACE, *name))
            .chain(std::iter::once(ImportName::new(ENV_NAMESPACE, "abort")))
            .chain(self.extra_imports.iter().cloned())
            .collect()
    }

    fn exports(&self) -> Vec<String> {
        REQUIRED_EXPORTS
            .iter()
            .copied()
            .filter(|name| !self.missing_exports.iter().any(|missing| missing == name))
            .map(str::to_string)
            .collect()
    }

    fn run(&mut self, host: &mut dyn HostImports) -> Result<(), Trap> {
        let mut session = Session::new();
        (self.suite)(&mut session);
        let (registry, table) = session.finish()?;
        self.table = table;
        tracing::debug!(module = %self.name, functions = self.table.len(), "registration complete");

        self.frames.clear();
        self.frames.push(Frame::internal(RUNNER_FRAME));
        let mut callee = self.callee();
        GuestRunner::new(&registry).run(&mut callee, host);
        self.frames.clear();
        Ok(())
    }

    fn get_string(&self, ptr: Pointer) -> Result<String, MemoryError> {
        self.memory.read_string(ptr)
    }
}

/// Borrowed view of a module used while its runner is active: the table is shared, memory and frames are not.
struct Callee<'m> {
    table: &'m FunctionTable,
    memory: &'m mut LinearMemory,
    frames: &'m mut Vec<Frame>,
    /// Stack depth outside any guest callable. A callable that unwound leaves stale frames above it.
    base: usize,
}

impl Invoke for Callee<'_> {
    fn invoke(&mut self, handle: FnHandle, host: &mut dyn HostImports) -> Result<(), Trap> {
        if handle.is_none() {
            return Ok(());
        }
        self.frames.truncate(self.base);
        let table = self.table;
        let function = table.get(handle).ok_or_else(|| {
            Trap::new(TrapCode::IndirectCallToNull, format!("{handle} is not in the function table"))
                .with_frames(self.frames.clone())
        })?;

        self.frames.push(Frame::guest(function.label()));
        let result = {
            let mut env = Env::new(&mut *self.memory, host, &mut *self.frames);
            function.call(&mut env)
        };
        self.frames.truncate(self.base);
        result
    }
}

enum Entry {
    Suite(SuiteFn),
    Module(Box<dyn Fn() -> NativeModule>),
    Broken(String),
}

/// Maps entry paths to native suites.
///
/// ```ignore
/// let mut loader = NativeLoader::new();
/// loader.register("tests/math.spec", |s| s.test("adds", |env| env.expect(1 + 1).to_be(2)));
/// ```
#[derive(Default)]
pub struct NativeLoader {
    entries: Vec<(PathBuf, Entry)>,
}

impl NativeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, path: impl Into<PathBuf>, suite: impl Fn(&mut Session) + 'static) -> &mut Self {
        self.entries.push((path.into(), Entry::Suite(Rc::new(suite))));
        self
    }

    /// Register a factory for a customised module (extra imports, missing exports, memory limits).
    pub fn register_module(
        &mut self,
        path: impl Into<PathBuf>,
        factory: impl Fn() -> NativeModule + 'static,
    ) -> &mut Self {
        self.entries.push((path.into(), Entry::Module(Box::new(factory))));
        self
    }

    /// Register an entry whose compilation fails with `message`.
    pub fn register_broken(&mut self, path: impl Into<PathBuf>, message: impl Into<String>) -> &mut Self {
        self.entries.push((path.into(), Entry::Broken(message.into())));
        self
    }

    /// Registered paths, in registration order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.entries.iter().map(|(path, _)| path.clone()).collect()
    }
}

impl ModuleLoader for NativeLoader {
    fn load(&mut self, entry: &Path) -> Result<LoadedModule, LoadError> {
        let (_, found) = self
            .entries
            .iter()
            .find(|(path, _)| path == entry)
            .ok_or_else(|| LoadError::NotFound(entry.to_path_buf()))?;

        let name = entry.display().to_string();
        let module = match found {
            Entry::Suite(suite) => NativeModule::from_suite(name, Rc::clone(suite)),
            Entry::Module(factory) => factory(),
            Entry::Broken(message) => return Err(LoadError::Compile(message.clone())),
        };
        let manifest = manifest(&module);
        Ok(LoadedModule {
            module: Box::new(module),
            artifacts: vec![Artifact::new("manifest", manifest.into_bytes())],
        })
    }
}

/// Plain-text listing of a module's imports and exports.
fn manifest(module: &NativeModule) -> String {
    let mut out = format!("module {}\n", module.name());
    for import in module.imports() {
        out.push_str(&format!("import {import}\n"));
    }
    for export in module.exports() {
        out.push_str(&format!("export {export}\n"));
    }
    out
}
