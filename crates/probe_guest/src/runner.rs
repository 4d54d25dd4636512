//! Drives a registered context tree through the host primitives.
//!
//! Every guest callable runs behind [`HostImports::try_call`]; a failing hook aborts the rest of its group but the
//! group is always closed with `group_end`.

use probe_core::{FnHandle, HostImports, Invoke};

use crate::context::{HookPhase, NodeId, Registry, TestEntry};

pub struct GuestRunner<'r> {
    registry: &'r Registry,
}

impl<'r> GuestRunner<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Run every group in registry order, then call `finish`.
    pub fn run(&self, guest: &mut dyn Invoke, host: &mut dyn HostImports) {
        let start = host.now();
        for &id in self.registry.order() {
            let node = self.registry.node(id);
            // An empty root would only produce a nameless, empty group.
            if node.is_root() && node.tests().is_empty() && node.todos().is_empty() {
                continue;
            }
            self.run_group(id, guest, host);
        }
        let end = host.finish();
        tracing::debug!(groups = self.registry.order().len(), elapsed_ms = end - start, "guest run finished");
    }

    fn run_group(&self, id: NodeId, guest: &mut dyn Invoke, host: &mut dyn HostImports) {
        let node = self.registry.node(id);
        if !host.create_group(node.name()) {
            tracing::trace!(group = node.name(), "group filtered out");
            return;
        }

        for todo in node.todos() {
            host.report_todo(todo);
        }

        if let Err(phase) = self.run_group_body(id, guest, host) {
            tracing::debug!(group = node.name(), phase = phase.as_str(), "hook failed; skipping rest of group");
        }

        host.group_end();
    }

    fn run_group_body(&self, id: NodeId, guest: &mut dyn Invoke, host: &mut dyn HostImports) -> Result<(), HookPhase> {
        self.run_hooks(id, HookPhase::BeforeAll, guest, host)?;

        let each = EachHooks {
            before: self.registry.hooks(id, HookPhase::BeforeEach),
            after: self.registry.hooks(id, HookPhase::AfterEach),
        };
        for test in self.registry.node(id).tests() {
            if !host.create_test_result(&test.name) {
                continue;
            }
            call_all(&each.before, HookPhase::BeforeEach, guest, host)?;
            run_test(test, &each, guest, host)?;
            call_all(&each.after, HookPhase::AfterEach, guest, host)?;
        }

        self.run_hooks(id, HookPhase::AfterAll, guest, host)
    }

    fn run_hooks(
        &self,
        id: NodeId,
        phase: HookPhase,
        guest: &mut dyn Invoke,
        host: &mut dyn HostImports,
    ) -> Result<(), HookPhase> {
        call_all(&self.registry.hooks(id, phase), phase, guest, host)
    }
}

/// Effective `beforeEach` and `afterEach` chains of one group.
struct EachHooks {
    before: Vec<FnHandle>,
    after: Vec<FnHandle>,
}

fn call_all(
    hooks: &[FnHandle],
    phase: HookPhase,
    guest: &mut dyn Invoke,
    host: &mut dyn HostImports,
) -> Result<(), HookPhase> {
    for &handle in hooks {
        if !host.try_call(guest, handle) {
            return Err(phase);
        }
    }
    Ok(())
}

/// Run one test body, then re-run it for as long as the host wants samples. Every extra sample is wrapped in the
/// group's `afterEach`/`beforeEach` chains so it starts from the same state as the first run. A failing hook
/// abandons the test and aborts the group.
fn run_test(
    test: &TestEntry,
    each: &EachHooks,
    guest: &mut dyn Invoke,
    host: &mut dyn HostImports,
) -> Result<(), HookPhase> {
    let start = host.now();
    let mut call_succeeded = host.try_call(guest, test.body);
    let end = host.now();

    // Further samples are only taken for passing, non-negated tests.
    if call_succeeded && !test.negated {
        let mut elapsed = end - start;
        while host.collect_sample(elapsed) {
            call_all(&each.after, HookPhase::AfterEach, guest, host)?;
            call_all(&each.before, HookPhase::BeforeEach, guest, host)?;
            let sample_start = host.now();
            if !host.try_call(guest, test.body) {
                call_succeeded = false;
                break;
            }
            elapsed = host.now() - sample_start;
        }
    }

    let pass = call_succeeded != test.negated;
    host.test_end(call_succeeded, pass, test.negated, start, end);
    Ok(())
}
