//! The guest import surface: primitives the guest calls, by name, into the host.
//!
//! The guest runner drives a module's lifecycle entirely through these primitives:
//!
//! ```text
//! createGroup ─► reportTodo* ─► tryCall(beforeAll)* ─► { createTestResult ─► tryCall(beforeEach)*
//!     ─► now ─► tryCall(test) ─► now ─► collectSample* ─► testEnd ─► tryCall(afterEach)* }* ─► tryCall(afterAll)*
//!     ─► groupEnd
//! ```
//!
//! Assertion helpers running inside a test body use the reporting primitives. Primitives that read guest memory
//! receive a [`Caller`] view because the guest is mid-call when it reports.

use std::fmt;

use crate::handle::FnHandle;
use crate::memory::{LinearMemory, MemoryError, Pointer};
use crate::module::Invoke;
use crate::trap::Frame;

/// Fully qualified import name (`module.name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImportName {
    pub module: String,
    pub name: String,
}

impl ImportName {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ImportName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.name)
    }
}

/// Read-only view of the calling guest, handed to primitives that need guest memory or its call stack.
#[derive(Debug, Clone, Copy)]
pub struct Caller<'a> {
    memory: &'a LinearMemory,
    frames: &'a [Frame],
}

impl<'a> Caller<'a> {
    pub fn new(memory: &'a LinearMemory, frames: &'a [Frame]) -> Self {
        Self { memory, frames }
    }

    pub fn memory(&self) -> &'a LinearMemory {
        self.memory
    }

    /// Shadow call stack of the guest, outermost frame first.
    pub fn frames(&self) -> &'a [Frame] {
        self.frames
    }

    pub fn read_string(&self, ptr: Pointer) -> Result<String, MemoryError> {
        self.memory.read_string(ptr)
    }

    pub fn read_bytes(&self, ptr: Pointer, len: usize) -> Result<Vec<u8>, MemoryError> {
        self.memory.read_bytes(ptr, len).map(<[u8]>::to_vec)
    }
}

/// Per-test performance override issued by guest code for the in-flight test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PerfOverride {
    Enabled(bool),
    MaxSamples(u32),
    /// Milliseconds.
    MaxTestRunTime(f64),
    RoundDecimalPlaces(u32),
    ReportAverage(bool),
    ReportMedian(bool),
    ReportStdDev(bool),
    ReportMax(bool),
    ReportMin(bool),
    ReportVariance(bool),
}

/// Host primitives available to guest code.
///
/// Implemented by the host's test context. Every method is synchronous; none of them may unwind into the guest.
pub trait HostImports {
    // ---- lifecycle -------------------------------------------------------

    /// Announce a group. Returns whether it matches the group filter; `false` means skip it entirely.
    fn create_group(&mut self, name: &str) -> bool;

    /// Announce a test in the current group. Returns whether it matches the test filter.
    fn create_test_result(&mut self, name: &str) -> bool;

    /// Record a placeholder test of the current group.
    fn report_todo(&mut self, description: &str);

    /// Monotonic timestamp in milliseconds.
    fn now(&mut self) -> f64;

    /// Mark the end of the module run; returns the final timestamp.
    fn finish(&mut self) -> f64;

    /// Invoke `handle` through `guest` behind a crash-isolation boundary.
    ///
    /// Returns `true` when the callable completed, `false` when it trapped or panicked.
    fn try_call(&mut self, guest: &mut dyn Invoke, handle: FnHandle) -> bool;

    /// Offer the duration of one more run of the in-flight test. Returns whether another sample is wanted.
    fn collect_sample(&mut self, elapsed: f64) -> bool;

    fn test_end(&mut self, call_succeeded: bool, pass: bool, negated: bool, start: f64, end: f64);

    fn group_end(&mut self);

    // ---- value reporting -------------------------------------------------

    fn report_actual_null(&mut self, caller: &Caller<'_>);
    fn report_expected_null(&mut self, caller: &Caller<'_>, negated: bool);
    fn report_actual_value(&mut self, caller: &Caller<'_>, value: f64);
    fn report_expected_value(&mut self, caller: &Caller<'_>, value: f64, negated: bool);
    fn report_actual_string(&mut self, caller: &Caller<'_>, ptr: Pointer);
    fn report_expected_string(&mut self, caller: &Caller<'_>, ptr: Pointer, negated: bool);
    fn report_actual_reference(&mut self, caller: &Caller<'_>, ptr: Pointer, offset: u32);
    fn report_expected_reference(&mut self, caller: &Caller<'_>, ptr: Pointer, offset: u32, negated: bool);
    fn report_expected_truthy(&mut self, caller: &Caller<'_>, negated: bool);
    fn report_expected_falsy(&mut self, caller: &Caller<'_>, negated: bool);
    fn report_expected_finite(&mut self, caller: &Caller<'_>, negated: bool);

    /// Drop pending actual/expected values after an assertion passed.
    fn clear_expected(&mut self);

    // ---- logging ---------------------------------------------------------

    fn log_null(&mut self, caller: &Caller<'_>);
    fn log_value(&mut self, caller: &Caller<'_>, value: f64);
    fn log_string(&mut self, caller: &Caller<'_>, ptr: Pointer);
    fn log_reference(&mut self, caller: &Caller<'_>, ptr: Pointer, offset: u32);

    // ---- misc ------------------------------------------------------------

    fn override_performance(&mut self, option: PerfOverride);

    /// Breakpoint hook.
    fn debug(&mut self);

    /// `env.abort`: record why the guest is about to trap.
    fn abort(&mut self, caller: &Caller<'_>, message: Pointer, file: Pointer, line: u32, column: u32);

    /// Call a custom (per-suite) import. `None` when no such import was linked.
    fn call_import(&mut self, import: &ImportName, args: &[f64]) -> Option<f64>;
}
