//! Provide the shared vocabulary of the host/guest test-execution boundary.
//!
//! Both sides of the harness depend on this crate:
//! - the host (`probe`) implements [`HostImports`] and drives modules through [`GuestModule`], and
//! - the guest runtime (`probe_guest`) implements [`GuestModule`] / [`Invoke`] and calls back through
//!   [`HostImports`].
//!
//! ## Notes
//!
//! - This is a “boundary” crate: **no IO**, no global state, and no host- or guest-specific policy.
//! - Guest callables never cross the boundary as Rust closures. They are referenced by an opaque [`FnHandle`] and
//!   can only be executed through the guest's own [`Invoke`] capability.
//! - Strings and byte ranges cross the boundary as [`Pointer`]s into the guest's [`LinearMemory`].

#![forbid(unsafe_code)]

pub mod handle;
pub mod imports;
pub mod memory;
pub mod module;
pub mod trap;

pub use handle::FnHandle;
pub use imports::{Caller, HostImports, ImportName, PerfOverride};
pub use memory::{LinearMemory, MemoryError, Pointer};
pub use module::{Artifact, GuestModule, Invoke, LoadError, LoadedModule, ModuleLoader};
pub use trap::{Frame, Trap, TrapCode};

/// Import namespace that carries the harness primitives.
pub const IMPORT_NAMESPACE: &str = "__aspect";

/// Import namespace of the guest runtime's abort handler.
pub const ENV_NAMESPACE: &str = "env";

/// Names of every primitive in the [`IMPORT_NAMESPACE`] namespace.
///
/// Kept in the same order as the methods of [`HostImports`].
pub const STANDARD_IMPORTS: &[&str] = &[
    "createGroup",
    "createTestResult",
    "reportTodo",
    "now",
    "finish",
    "tryCall",
    "collectSample",
    "testEnd",
    "groupEnd",
    "reportActualNull",
    "reportExpectedNull",
    "reportActualValue",
    "reportExpectedValue",
    "reportActualString",
    "reportExpectedString",
    "reportActualReference",
    "reportExpectedReference",
    "reportExpectedTruthy",
    "reportExpectedFalsy",
    "reportExpectedFinite",
    "clearExpected",
    "logNull",
    "logValue",
    "logString",
    "logReference",
    "overridePerformance",
    "debug",
];

/// Exports every loadable module must provide.
///
/// - `__run`: run registration code, then the guest runner, to completion.
/// - `__call`: invoke a guest callable by [`FnHandle`].
/// - `__getString`: decode a string at a guest address.
pub const REQUIRED_EXPORTS: &[&str] = &["__run", "__call", "__getString"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_imports_are_unique() {
        let mut names = STANDARD_IMPORTS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), STANDARD_IMPORTS.len());
    }

    #[test]
    fn test_required_exports() {
        assert!(REQUIRED_EXPORTS.contains(&"__call"));
        assert_eq!(REQUIRED_EXPORTS.len(), 3);
    }
}
