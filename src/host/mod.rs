//! The host side of a module run.
//!
//! A [`TestContext`] is created per module. It validates the module's import and export surface, implements the
//! primitives the guest runner calls ([`HostImports`]), and accumulates the [`GroupResult`] tree while the guest runs.
//!
//! ## Crash isolation
//!
//! [`HostImports::try_call`] is the only place guest code runs on behalf of a test or hook. A trap comes back as an
//! `Err`, a guest panic is caught with `catch_unwind`; both become `false` plus a recorded [`Failure`]. Nothing the
//! guest does inside `try_call` unwinds into the host.
//!
//! ## Diagnostics
//!
//! At most one actual and one expected value are live. A passing assertion clears both (`clearExpected`); a failing
//! test takes whatever is live when it ends.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod filter;
pub mod imports;
pub mod performance;
pub mod result;
pub mod value;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use probe_core::{
    Caller, ENV_NAMESPACE, FnHandle, GuestModule, HostImports, IMPORT_NAMESPACE, ImportName, Invoke, PerfOverride,
    Pointer, REQUIRED_EXPORTS, STANDARD_IMPORTS, Trap, TrapCode,
};

pub use filter::NameFilter;
pub use imports::{CustomImports, ImportConstants, ImportFn};
pub use performance::{PerformanceConfig, PerformanceStats, Sampler};
pub use result::{Failure, GroupResult, ModuleResult, TestResult};
pub use value::{ActualValue, ValueKind};

use crate::error::StructuralError;
use value::{format_number, render_error_stack, render_stack};

struct PendingTest {
    result: TestResult,
    sampler: Sampler,
}

/// Host state for one module.
pub struct TestContext {
    file: String,
    group_filter: NameFilter,
    test_filter: NameFilter,
    performance: PerformanceConfig,
    imports: CustomImports,
    clock: Instant,
    start: f64,
    end: f64,
    groups: Vec<GroupResult>,
    current_group: Option<GroupResult>,
    pending: Option<PendingTest>,
    actual: Option<ActualValue>,
    expected: Option<ActualValue>,
    abort_message: Option<String>,
    failure: Option<Failure>,
    errors: Vec<StructuralError>,
}

impl TestContext {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            group_filter: NameFilter::all(),
            test_filter: NameFilter::all(),
            performance: PerformanceConfig::default(),
            imports: CustomImports::default(),
            clock: Instant::now(),
            start: 0.0,
            end: 0.0,
            groups: Vec::new(),
            current_group: None,
            pending: None,
            actual: None,
            expected: None,
            abort_message: None,
            failure: None,
            errors: Vec::new(),
        }
    }

    pub fn with_group_filter(mut self, filter: NameFilter) -> Self {
        self.group_filter = filter;
        self
    }

    pub fn with_test_filter(mut self, filter: NameFilter) -> Self {
        self.test_filter = filter;
        self
    }

    pub fn with_performance(mut self, performance: PerformanceConfig) -> Self {
        self.performance = performance.clamped();
        self
    }

    pub fn with_imports(mut self, imports: CustomImports) -> Self {
        self.imports = imports;
        self
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn groups(&self) -> &[GroupResult] {
        &self.groups
    }

    pub fn errors(&self) -> &[StructuralError] {
        &self.errors
    }

    /// Check that every import the module requires is provided and that the required exports exist.
    ///
    /// Returns `false` (with the problems recorded as structural errors) when the module cannot be run.
    #[tracing::instrument(skip_all, fields(file = %self.file))]
    pub fn instantiate(&mut self, module: &dyn GuestModule) -> bool {
        let before = self.errors.len();

        for import in module.imports() {
            if !self.provides(&import) {
                tracing::debug!(%import, "unresolved import");
                self.errors.push(StructuralError::MissingImport {
                    file: self.file.clone(),
                    import: import.to_string(),
                });
            }
        }

        let exports = module.exports();
        for required in REQUIRED_EXPORTS {
            if !exports.iter().any(|export| export == required) {
                self.errors.push(StructuralError::MissingExport {
                    file: self.file.clone(),
                    export: (*required).to_string(),
                });
            }
        }

        self.errors.len() == before
    }

    fn provides(&self, import: &ImportName) -> bool {
        (import.module == IMPORT_NAMESPACE && STANDARD_IMPORTS.contains(&import.name.as_str()))
            || (import.module == ENV_NAMESPACE && import.name == "abort")
            || self.imports.contains(import)
    }

    /// Run the module's `__run` export to completion.
    ///
    /// A trap or panic that escapes the guest runner is recorded as a structural error.
    pub fn run(&mut self, module: &mut dyn GuestModule) {
        self.start = self.now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| module.run(&mut *self)));
        let escaped = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(trap)) => Some(trap),
            Err(payload) => Some(Trap::new(TrapCode::Panic, panic_message(payload.as_ref()))),
        };

        if let Some(trap) = escaped {
            tracing::warn!(file = %self.file, %trap, "guest trapped outside of tryCall");
            self.errors.push(StructuralError::Runtime {
                file: self.file.clone(),
                message: trap.message().to_string(),
                stack: render_error_stack(&trap),
            });
        }
        if self.current_group.is_some() {
            self.group_end();
        }
        if self.end < self.start {
            self.end = self.now();
        }
    }

    /// Finish the module: its result tree and any structural errors.
    pub fn into_result(self) -> (ModuleResult, Vec<StructuralError>) {
        let result = ModuleResult {
            file: self.file,
            groups: self.groups,
            start: self.start,
            end: self.end,
        };
        (result, self.errors)
    }

    fn record_failure(&mut self, trap: &Trap) {
        let message = self
            .abort_message
            .take()
            .unwrap_or_else(|| trap.message().to_string());
        self.failure = Some(Failure {
            message,
            stack: render_error_stack(trap),
        });
    }

    fn logs(&mut self) -> Option<&mut Vec<ActualValue>> {
        if let Some(pending) = self.pending.as_mut() {
            Some(&mut pending.result.logs)
        } else {
            self.current_group.as_mut().map(|group| &mut group.logs)
        }
    }

    fn push_log(&mut self, value: ActualValue) {
        match self.logs() {
            Some(logs) => logs.push(value),
            None => tracing::debug!(message = %value.message, "log outside of any group dropped"),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "guest panicked".to_string()
    }
}

fn read_string(caller: &Caller<'_>, ptr: Pointer) -> String {
    caller.read_string(ptr).unwrap_or_else(|err| {
        tracing::warn!(%err, "could not read guest string");
        format!("<unreadable string at {ptr:#x}>")
    })
}

fn read_bytes(caller: &Caller<'_>, ptr: Pointer, len: u32) -> Vec<u8> {
    caller.read_bytes(ptr, len as usize).unwrap_or_else(|err| {
        tracing::warn!(%err, "could not read guest reference");
        Vec::new()
    })
}

impl HostImports for TestContext {
    fn create_group(&mut self, name: &str) -> bool {
        if !self.group_filter.matches(name) {
            tracing::debug!(group = name, "group does not match filter");
            return false;
        }
        let start = self.now();
        self.current_group = Some(GroupResult::new(name, start));
        self.failure = None;
        self.abort_message = None;
        self.actual = None;
        self.expected = None;
        true
    }

    fn create_test_result(&mut self, name: &str) -> bool {
        if !self.test_filter.matches(name) {
            tracing::debug!(test = name, "test does not match filter");
            return false;
        }
        self.pending = Some(PendingTest {
            result: TestResult::new(name),
            sampler: Sampler::new(self.performance.clone()),
        });
        self.failure = None;
        self.abort_message = None;
        self.actual = None;
        self.expected = None;
        true
    }

    fn report_todo(&mut self, description: &str) {
        if let Some(group) = self.current_group.as_mut() {
            group.todos.push(description.to_string());
        }
    }

    fn now(&mut self) -> f64 {
        self.clock.elapsed().as_secs_f64() * 1_000.0
    }

    fn finish(&mut self) -> f64 {
        self.end = self.now();
        self.end
    }

    fn try_call(&mut self, guest: &mut dyn Invoke, handle: FnHandle) -> bool {
        if handle.is_none() {
            return true;
        }
        self.abort_message = None;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| guest.invoke(handle, &mut *self)));
        match outcome {
            Ok(Ok(())) => true,
            Ok(Err(trap)) => {
                tracing::debug!(%handle, %trap, "guest call failed");
                self.record_failure(&trap);
                false
            }
            Err(payload) => {
                let trap = Trap::new(TrapCode::Panic, panic_message(payload.as_ref()));
                tracing::debug!(%handle, %trap, "guest call panicked");
                self.record_failure(&trap);
                false
            }
        }
    }

    fn collect_sample(&mut self, elapsed: f64) -> bool {
        self.pending
            .as_mut()
            .is_some_and(|pending| pending.sampler.collect(elapsed))
    }

    fn test_end(&mut self, call_succeeded: bool, pass: bool, negated: bool, start: f64, end: f64) {
        let Some(PendingTest { mut result, sampler }) = self.pending.take() else {
            tracing::warn!("testEnd without a matching createTestResult");
            return;
        };
        result.pass = pass;
        result.negated = negated;
        result.call_succeeded = call_succeeded;
        result.start = start;
        result.end = end;

        if call_succeeded {
            self.failure = None;
        } else {
            result.failure = self.failure.take();
            result.actual = self.actual.take();
            result.expected = self.expected.take();
        }
        if pass && !negated {
            result.performance = sampler.finish();
        }

        self.actual = None;
        self.expected = None;
        self.abort_message = None;

        match self.current_group.as_mut() {
            Some(group) => group.tests.push(result),
            None => tracing::warn!(test = %result.name, "test ended outside of a group"),
        }
    }

    fn group_end(&mut self) {
        let Some(mut group) = self.current_group.take() else {
            return;
        };
        if let Some(pending) = self.pending.take() {
            tracing::debug!(test = %pending.result.name, "test never ran to completion");
        }
        group.hook_failure = self.failure.take();
        if group.hook_failure.is_some() {
            group.hook_actual = self.actual.take();
            group.hook_expected = self.expected.take();
        }
        group.end = self.now();
        group.pass = group.hook_failure.is_none() && group.tests.iter().all(|test| test.pass);
        self.actual = None;
        self.expected = None;
        self.abort_message = None;
        self.groups.push(group);
    }

    fn report_actual_null(&mut self, caller: &Caller<'_>) {
        self.actual = Some(ActualValue::new(ValueKind::Null, "null", render_stack(caller.frames())));
    }

    fn report_expected_null(&mut self, caller: &Caller<'_>, negated: bool) {
        self.expected =
            Some(ActualValue::new(ValueKind::Null, "null", render_stack(caller.frames())).with_negated(negated));
    }

    fn report_actual_value(&mut self, caller: &Caller<'_>, value: f64) {
        self.actual = Some(
            ActualValue::new(ValueKind::Number, format_number(value), render_stack(caller.frames())).with_value(value),
        );
    }

    fn report_expected_value(&mut self, caller: &Caller<'_>, value: f64, negated: bool) {
        self.expected = Some(
            ActualValue::new(ValueKind::Number, format_number(value), render_stack(caller.frames()))
                .with_value(value)
                .with_negated(negated),
        );
    }

    fn report_actual_string(&mut self, caller: &Caller<'_>, ptr: Pointer) {
        self.actual = Some(
            ActualValue::new(ValueKind::String, read_string(caller, ptr), render_stack(caller.frames()))
                .with_pointer(ptr),
        );
    }

    fn report_expected_string(&mut self, caller: &Caller<'_>, ptr: Pointer, negated: bool) {
        self.expected = Some(
            ActualValue::new(ValueKind::String, read_string(caller, ptr), render_stack(caller.frames()))
                .with_pointer(ptr)
                .with_negated(negated),
        );
    }

    fn report_actual_reference(&mut self, caller: &Caller<'_>, ptr: Pointer, offset: u32) {
        self.actual = Some(
            ActualValue::new(ValueKind::Reference, "Reference Value", render_stack(caller.frames()))
                .with_reference(ptr, read_bytes(caller, ptr, offset)),
        );
    }

    fn report_expected_reference(&mut self, caller: &Caller<'_>, ptr: Pointer, offset: u32, negated: bool) {
        self.expected = Some(
            ActualValue::new(ValueKind::Reference, "Reference Value", render_stack(caller.frames()))
                .with_reference(ptr, read_bytes(caller, ptr, offset))
                .with_negated(negated),
        );
    }

    fn report_expected_truthy(&mut self, caller: &Caller<'_>, negated: bool) {
        self.expected = Some(
            ActualValue::new(ValueKind::Truthy, "Truthy Value", render_stack(caller.frames())).with_negated(negated),
        );
    }

    fn report_expected_falsy(&mut self, caller: &Caller<'_>, negated: bool) {
        self.expected = Some(
            ActualValue::new(ValueKind::Falsy, "Falsy Value", render_stack(caller.frames())).with_negated(negated),
        );
    }

    fn report_expected_finite(&mut self, caller: &Caller<'_>, negated: bool) {
        self.expected = Some(
            ActualValue::new(ValueKind::Finite, "Finite Value", render_stack(caller.frames())).with_negated(negated),
        );
    }

    fn clear_expected(&mut self) {
        self.actual = None;
        self.expected = None;
        self.abort_message = None;
    }

    fn log_null(&mut self, caller: &Caller<'_>) {
        self.push_log(ActualValue::new(ValueKind::Null, "null", render_stack(caller.frames())));
    }

    fn log_value(&mut self, caller: &Caller<'_>, value: f64) {
        let message = format!("Value {}", format_number(value));
        self.push_log(ActualValue::new(ValueKind::Number, message, render_stack(caller.frames())).with_value(value));
    }

    fn log_string(&mut self, caller: &Caller<'_>, ptr: Pointer) {
        self.push_log(
            ActualValue::new(ValueKind::String, read_string(caller, ptr), render_stack(caller.frames()))
                .with_pointer(ptr),
        );
    }

    fn log_reference(&mut self, caller: &Caller<'_>, ptr: Pointer, offset: u32) {
        self.push_log(
            ActualValue::new(ValueKind::Reference, "Reference Type", render_stack(caller.frames()))
                .with_reference(ptr, read_bytes(caller, ptr, offset)),
        );
    }

    fn override_performance(&mut self, option: PerfOverride) {
        match self.pending.as_mut() {
            Some(pending) => pending.sampler.apply(option),
            None => tracing::debug!(?option, "performance override outside of a test ignored"),
        }
    }

    fn debug(&mut self) {
        tracing::debug!(file = %self.file, "guest breakpoint");
    }

    fn abort(&mut self, caller: &Caller<'_>, message: Pointer, file: Pointer, line: u32, column: u32) {
        let text = read_string(caller, message);
        let location = caller.read_string(file).unwrap_or_default();
        tracing::debug!(message = %text, %location, line, column, "guest abort");
        self.abort_message = Some(text);
    }

    fn call_import(&mut self, import: &ImportName, args: &[f64]) -> Option<f64> {
        self.imports.call(import, args)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use probe_core::{Frame, LinearMemory};

    /// Guest stand-in whose single callable runs `body`.
    struct Scripted<F>(F);

    impl<F: FnMut(&mut dyn HostImports) -> Result<(), Trap>> Invoke for Scripted<F> {
        fn invoke(&mut self, _handle: FnHandle, host: &mut dyn HostImports) -> Result<(), Trap> {
            (self.0)(host)
        }
    }

    fn open_test(ctx: &mut TestContext) {
        assert!(ctx.create_group("g"));
        assert!(ctx.create_test_result("t"));
    }

    // ========================================
    // Crash isolation
    // ========================================

    #[test]
    fn test_none_handle_succeeds_without_invoking() {
        let mut ctx = TestContext::new("m");
        let mut guest = Scripted(|_: &mut dyn HostImports| -> Result<(), Trap> { panic!("must not run") });
        assert!(ctx.try_call(&mut guest, FnHandle::NONE));
    }

    #[test]
    fn test_trap_becomes_failure() {
        let mut ctx = TestContext::new("m");
        open_test(&mut ctx);
        let mut guest = Scripted(|_: &mut dyn HostImports| -> Result<(), Trap> {
            Err(Trap::unreachable().with_frames(vec![Frame::internal("~run"), Frame::guest("g t")]))
        });
        assert!(!ctx.try_call(&mut guest, FnHandle::new(0)));
        ctx.test_end(false, false, false, 0.0, 1.0);
        ctx.group_end();

        let test = &ctx.groups()[0].tests[0];
        let failure = test.failure.as_ref().unwrap();
        assert_eq!(failure.message, "unreachable code executed");
        assert_eq!(failure.stack, "unreachable: unreachable code executed\n    at g t");
    }

    #[test]
    fn test_panic_is_contained() {
        let mut ctx = TestContext::new("m");
        open_test(&mut ctx);
        let mut guest = Scripted(|_: &mut dyn HostImports| -> Result<(), Trap> { panic!("guest blew up") });
        assert!(!ctx.try_call(&mut guest, FnHandle::new(0)));
        ctx.test_end(false, true, true, 0.0, 1.0);
        ctx.group_end();
        let test = &ctx.groups()[0].tests[0];
        assert!(test.pass);
        assert_eq!(test.failure.as_ref().unwrap().message, "guest blew up");
    }

    #[test]
    fn test_abort_message_wins_over_trap_message() {
        let mut ctx = TestContext::new("m");
        open_test(&mut ctx);
        let mut memory = LinearMemory::new();
        let message = memory.alloc_string("Expected values to be equal.").unwrap();
        let mut guest = Scripted(move |host: &mut dyn HostImports| -> Result<(), Trap> {
            host.abort(&Caller::new(&memory, &[]), message, 0, 1, 1);
            Err(Trap::abort("ignored"))
        });
        assert!(!ctx.try_call(&mut guest, FnHandle::new(0)));
        ctx.test_end(false, false, false, 0.0, 1.0);
        ctx.group_end();
        assert_eq!(
            ctx.groups()[0].tests[0].failure.as_ref().unwrap().message,
            "Expected values to be equal."
        );
    }

    // ========================================
    // Diagnostics
    // ========================================

    #[test]
    fn test_cleared_values_do_not_leak_into_later_failure() {
        let mut ctx = TestContext::new("m");
        open_test(&mut ctx);
        let memory = LinearMemory::new();
        let caller = Caller::new(&memory, &[]);

        ctx.report_actual_value(&caller, 1.0);
        ctx.report_expected_value(&caller, 1.0, false);
        ctx.clear_expected();
        ctx.report_actual_null(&caller);

        ctx.test_end(false, false, false, 0.0, 1.0);
        ctx.group_end();
        let test = &ctx.groups()[0].tests[0];
        assert_eq!(test.actual.as_ref().unwrap().kind, ValueKind::Null);
        assert!(test.expected.is_none());
    }

    #[test]
    fn test_passing_test_carries_no_diagnostics() {
        let mut ctx = TestContext::new("m");
        open_test(&mut ctx);
        let memory = LinearMemory::new();
        ctx.report_actual_value(&Caller::new(&memory, &[]), 3.0);
        ctx.test_end(true, true, false, 0.0, 1.0);
        ctx.group_end();
        assert!(ctx.groups()[0].tests[0].actual.is_none());
    }

    #[test]
    fn test_string_and_reference_are_read_from_memory() {
        let mut ctx = TestContext::new("m");
        open_test(&mut ctx);
        let mut memory = LinearMemory::new();
        let text = memory.alloc_string("hello").unwrap();
        let bytes = memory.alloc_bytes(&[1, 2, 3]).unwrap();
        let frames = vec![Frame::guest("g t")];
        let caller = Caller::new(&memory, &frames);

        ctx.report_actual_string(&caller, text);
        ctx.report_expected_reference(&caller, bytes, 3, true);
        ctx.test_end(false, false, false, 0.0, 1.0);
        ctx.group_end();

        let test = &ctx.groups()[0].tests[0];
        let actual = test.actual.as_ref().unwrap();
        assert_eq!(actual.message, "hello");
        assert_eq!(actual.stack, "    at g t");
        let expected = test.expected.as_ref().unwrap();
        assert_eq!(expected.bytes.as_deref(), Some(&[1u8, 2, 3][..]));
        assert!(expected.negated);
    }

    #[test]
    fn test_logs_attach_to_test_or_group() {
        let mut ctx = TestContext::new("m");
        let memory = LinearMemory::new();
        let caller = Caller::new(&memory, &[]);
        ctx.create_group("g");
        ctx.log_value(&caller, 2.0);
        ctx.create_test_result("t");
        ctx.log_null(&caller);
        ctx.test_end(true, true, false, 0.0, 1.0);
        ctx.group_end();

        let group = &ctx.groups()[0];
        assert_eq!(group.logs[0].message, "Value 2");
        assert_eq!(group.tests[0].logs[0].message, "null");
    }

    // ========================================
    // Groups and filters
    // ========================================

    #[test]
    fn test_hook_failure_fails_group() {
        let mut ctx = TestContext::new("m");
        ctx.create_group("g");
        let mut guest = Scripted(|_: &mut dyn HostImports| -> Result<(), Trap> { Err(Trap::abort("setup")) });
        assert!(!ctx.try_call(&mut guest, FnHandle::new(0)));
        ctx.group_end();
        let group = &ctx.groups()[0];
        assert!(!group.pass);
        assert_eq!(group.hook_failure.as_ref().unwrap().message, "setup");
    }

    #[test]
    fn test_hook_failure_keeps_reported_values() {
        let mut ctx = TestContext::new("m");
        ctx.create_group("g");
        let mut guest = Scripted(|host: &mut dyn HostImports| -> Result<(), Trap> {
            let memory = LinearMemory::new();
            let caller = Caller::new(&memory, &[]);
            host.report_actual_value(&caller, 3.0);
            host.report_expected_value(&caller, 4.0, false);
            Err(Trap::abort("Expected values to be equal."))
        });
        assert!(!ctx.try_call(&mut guest, FnHandle::new(0)));
        ctx.group_end();

        let group = &ctx.groups()[0];
        assert_eq!(group.hook_actual.as_ref().unwrap().message, "3");
        assert_eq!(group.hook_expected.as_ref().unwrap().message, "4");
    }

    #[test]
    fn test_passing_group_has_no_hook_values() {
        let mut ctx = TestContext::new("m");
        ctx.create_group("g");
        let memory = LinearMemory::new();
        ctx.report_actual_value(&Caller::new(&memory, &[]), 3.0);
        ctx.group_end();
        assert!(ctx.groups()[0].hook_actual.is_none());
    }

    #[test]
    fn test_unfinished_test_is_dropped() {
        let mut ctx = TestContext::new("m");
        open_test(&mut ctx);
        ctx.group_end();
        assert!(ctx.groups()[0].tests.is_empty());
        assert!(ctx.groups()[0].pass);
    }

    #[test]
    fn test_filters() {
        let mut ctx = TestContext::new("m")
            .with_group_filter(NameFilter::new("^math").unwrap())
            .with_test_filter(NameFilter::new("adds").unwrap());
        assert!(!ctx.create_group("strings"));
        assert!(ctx.create_group("math basics"));
        assert!(!ctx.create_test_result("subtracts"));
        assert!(ctx.create_test_result("ADDS numbers"));
    }

    #[test]
    fn test_sampling_follows_performance_config() {
        let performance = PerformanceConfig::new().with_enabled(true).with_max_samples(2);
        let mut ctx = TestContext::new("m").with_performance(performance);
        open_test(&mut ctx);
        assert!(ctx.collect_sample(1.0));
        assert!(!ctx.collect_sample(3.0));
        ctx.test_end(true, true, false, 0.0, 1.0);
        ctx.group_end();
        let stats = ctx.groups()[0].tests[0].performance.as_ref().unwrap();
        assert_eq!(stats.samples, 2);
        assert_eq!(stats.average, Some(2.0));
    }

    #[test]
    fn test_guest_override_applies_to_in_flight_test() {
        let mut ctx = TestContext::new("m");
        open_test(&mut ctx);
        ctx.override_performance(PerfOverride::Enabled(true));
        assert!(ctx.collect_sample(1.0));
        ctx.test_end(true, true, false, 0.0, 1.0);
        assert!(ctx.create_test_result("next"));
        assert!(!ctx.collect_sample(1.0));
    }

    #[test]
    fn test_custom_import_is_called() {
        let mut imports = CustomImports::new();
        imports.insert_constant("env", "seed", 5.0);
        let mut ctx = TestContext::new("m").with_imports(imports);
        assert_eq!(ctx.call_import(&ImportName::new("env", "seed"), &[]), Some(5.0));
        assert_eq!(ctx.call_import(&ImportName::new("env", "other"), &[]), None);
    }
}
